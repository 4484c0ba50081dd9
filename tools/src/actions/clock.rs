use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::calendar::CalendarService;
use crate::errors::ActionError;
use crate::registry::{parse_args, Action};

/// Formats `now` in `zone` as `datetime`, `date` or `time`
pub fn current_date_time(now: DateTime<Utc>, zone: Tz, format: &str) -> Result<String, ActionError> {
    let local = now.with_timezone(&zone);
    let rendered = match format {
        "datetime" => local.format("%A, %Y-%m-%dT%H:%M:%S%:z").to_string(),
        "date" => local.format("%A, %Y-%m-%d").to_string(),
        "time" => local.format("%H:%M:%S%:z").to_string(),
        other => {
            return Err(ActionError::InvalidArguments(format!(
                "Unknown format '{}'; use datetime, date or time",
                other
            )))
        }
    };
    Ok(format!("{} ({})", rendered, zone.name()))
}

#[derive(Deserialize)]
struct CurrentDateTimeArgs {
    #[serde(default)]
    format: Option<String>,
}

/// `get_current_date_time`: the current time in the calendar's zone
pub struct CurrentDateTime {
    calendar: Arc<dyn CalendarService>,
}

impl CurrentDateTime {
    pub fn new(calendar: Arc<dyn CalendarService>) -> Self {
        Self { calendar }
    }
}

#[async_trait]
impl Action for CurrentDateTime {
    fn name(&self) -> &str {
        "get_current_date_time"
    }

    fn description(&self) -> &str {
        "Returns the current date and/or time in the user's calendar timezone."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "format": {
                    "type": "string",
                    "enum": ["datetime", "date", "time"],
                    "description": "What to return. Defaults to datetime."
                }
            }
        })
    }

    async fn invoke(&self, args: Value) -> Result<Value, ActionError> {
        let args: CurrentDateTimeArgs = parse_args(args)?;
        let zone = self.calendar.timezone().await?;
        let format = args.format.as_deref().unwrap_or("datetime");
        Ok(Value::String(current_date_time(Utc::now(), zone, format)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::InMemoryCalendar;
    use chrono::TimeZone;

    #[test]
    fn test_formats() {
        let now = Utc.with_ymd_and_hms(2025, 9, 13, 4, 30, 0).unwrap();
        let zone = chrono_tz::Asia::Kolkata;

        assert_eq!(
            current_date_time(now, zone, "datetime").unwrap(),
            "Saturday, 2025-09-13T10:00:00+05:30 (Asia/Kolkata)"
        );
        assert_eq!(
            current_date_time(now, zone, "date").unwrap(),
            "Saturday, 2025-09-13 (Asia/Kolkata)"
        );
        assert_eq!(
            current_date_time(now, zone, "time").unwrap(),
            "10:00:00+05:30 (Asia/Kolkata)"
        );
        assert!(current_date_time(now, zone, "epoch").is_err());
    }

    #[tokio::test]
    async fn test_action_defaults_to_datetime() {
        let action = CurrentDateTime::new(Arc::new(InMemoryCalendar::new(Tz::UTC)));
        let out = action.invoke(Value::Null).await.unwrap();
        let text = out.as_str().unwrap();
        assert!(text.ends_with("(UTC)"));
        assert!(text.contains('T'));
    }
}
