use async_trait::async_trait;
use scheduler_core::types::{
    Content, FunctionDeclaration, FunctionDef, GenerateContentRequest, Part, Tool,
};
use scheduler_core::{GeminiClient, GeminiResult};
use scheduler_memory::{ActionRequest, Role, Turn};
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

/// One assistant reply: text and zero or more action requests
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelReply {
    pub text: String,
    pub action_requests: Vec<ActionRequest>,
}

impl ModelReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action_requests: Vec::new(),
        }
    }

    pub fn with_actions(text: impl Into<String>, action_requests: Vec<ActionRequest>) -> Self {
        Self {
            text: text.into(),
            action_requests,
        }
    }
}

/// Hosted language model endpoint
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Next assistant reply for the conversation so far
    async fn respond(
        &self,
        system_instruction: &str,
        turns: &[Turn],
        actions: &[FunctionDef],
    ) -> GeminiResult<ModelReply>;

    /// Plain completion without tools, used for condensation
    async fn complete(&self, prompt: &str) -> GeminiResult<String>;
}

/// [`LanguageModel`] backed by the Gemini generateContent API
#[derive(Debug, Clone)]
pub struct GeminiModelAdapter {
    client: GeminiClient,
}

impl GeminiModelAdapter {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LanguageModel for GeminiModelAdapter {
    async fn respond(
        &self,
        system_instruction: &str,
        turns: &[Turn],
        actions: &[FunctionDef],
    ) -> GeminiResult<ModelReply> {
        let request = GenerateContentRequest {
            contents: turns_to_contents(turns),
            system_instruction: Some(Content::new(
                "system",
                vec![Part::text(merge_system_turns(system_instruction, turns))],
            )),
            tools: generate_tool_declarations(actions),
            generation_config: Some(self.client.generation_config()),
        };

        let response = self.client.generate_content(request).await?;
        let text = self.client.extract_text_from_response(&response)?;
        let action_requests = self
            .client
            .extract_function_calls_from_response(&response)
            .into_iter()
            .map(|call| ActionRequest::new(Uuid::new_v4().to_string(), call.name, call.arguments))
            .collect();

        Ok(ModelReply {
            text,
            action_requests,
        })
    }

    async fn complete(&self, prompt: &str) -> GeminiResult<String> {
        self.client.complete(prompt).await
    }
}

/// System turns (the running summary) ride along in the system instruction
pub(crate) fn merge_system_turns(system_instruction: &str, turns: &[Turn]) -> String {
    let mut merged = system_instruction.to_string();
    for turn in turns.iter().filter(|t| t.role() == Role::System) {
        merged.push_str("\n\n");
        merged.push_str(turn.content());
    }
    merged
}

/// Maps transcript turns to Gemini contents.
///
/// Consecutive tool results are grouped into one `user` content so every
/// batch of function calls is answered by a single message.
pub(crate) fn turns_to_contents(turns: &[Turn]) -> Vec<Content> {
    let mut contents: Vec<Content> = Vec::new();

    for turn in turns {
        match turn.role() {
            Role::System => {}
            Role::User => contents.push(Content::new(
                "user",
                vec![Part::text(turn.content().to_string())],
            )),
            Role::Assistant => {
                let mut parts = Vec::new();
                if !turn.content().is_empty() || !turn.has_action_requests() {
                    parts.push(Part::text(turn.content().to_string()));
                }
                for request in turn.action_requests() {
                    parts.push(Part::function_call(
                        request.name.clone(),
                        request.arguments.clone(),
                    ));
                }
                contents.push(Content::new("model", parts));
            }
            Role::Tool => {
                let part = Part::function_response(
                    turn.tool_name().unwrap_or_default().to_string(),
                    json!({ "content": turn.content() }),
                );
                let previous_is_tool = contents.last().is_some_and(|c| {
                    c.parts.iter().all(|p| p.function_response.is_some())
                });
                match contents.last_mut() {
                    Some(last) if previous_is_tool => last.parts.push(part),
                    _ => contents.push(Content::new("user", vec![part])),
                }
            }
        }
    }

    contents
}

/// Declares the actions to Gemini, skipping names the API would reject
pub(crate) fn generate_tool_declarations(actions: &[FunctionDef]) -> Option<Vec<Tool>> {
    let function_declarations: Vec<FunctionDeclaration> = actions
        .iter()
        .filter_map(|action| {
            if !is_valid_function_name(&action.name) {
                warn!("Skipping tool with invalid name: {}", action.name);
                return None;
            }

            let mut declaration = FunctionDeclaration::from(action.clone());
            match declaration.parameters.as_object_mut() {
                Some(obj) => {
                    obj.entry("type").or_insert_with(|| json!("object"));
                }
                None => {
                    declaration.parameters = json!({"type": "object", "properties": {}});
                }
            }
            Some(declaration)
        })
        .collect();

    if function_declarations.is_empty() {
        None
    } else {
        Some(vec![Tool {
            function_declarations,
        }])
    }
}

/// Starts with a letter or underscore; then alphanumerics, `_`, `.` or `-`; at most 64 chars
fn is_valid_function_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    name.len() <= 64
        && (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scheduler_core::SchedulerConfig;
    use serde_json::Value;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn def(name: &str, parameters: Value) -> FunctionDef {
        FunctionDef {
            name: name.to_string(),
            description: None,
            parameters,
        }
    }

    #[test]
    fn test_function_name_validation() {
        assert!(is_valid_function_name("set_calender_event"));
        assert!(is_valid_function_name("_calendar.v2-list"));
        assert!(!is_valid_function_name(""));
        assert!(!is_valid_function_name("9lives"));
        assert!(!is_valid_function_name("has space"));
        assert!(!is_valid_function_name(&"a".repeat(65)));
    }

    #[test]
    fn test_declarations_fill_missing_type() {
        let tools = generate_tool_declarations(&[
            def("a", json!({"properties": {}})),
            def("b", Value::Null),
            def("bad name", json!({})),
        ])
        .unwrap();
        let declarations = &tools[0].function_declarations;
        assert_eq!(declarations.len(), 2);
        assert_eq!(declarations[0].parameters["type"], "object");
        assert_eq!(declarations[1].parameters, json!({"type": "object", "properties": {}}));

        assert!(generate_tool_declarations(&[]).is_none());
    }

    #[test]
    fn test_contents_group_tool_results() {
        let first = ActionRequest::new("1", "find_event_by_name", json!({"name": "sync"}));
        let second = ActionRequest::new("2", "get_current_date_time", json!({}));
        let turns = vec![
            Turn::summary("User is Sarah's manager."),
            Turn::user("Move my sync"),
            Turn::assistant_with_actions("", vec![first.clone(), second.clone()]),
            Turn::tool_result(&first, "[]"),
            Turn::tool_result(&second, "Saturday"),
            Turn::assistant("I couldn't find it."),
        ];

        let contents = turns_to_contents(&turns);
        assert_eq!(contents.len(), 4);
        assert_eq!(contents[0].role.as_deref(), Some("user"));

        assert_eq!(contents[1].role.as_deref(), Some("model"));
        assert_eq!(contents[1].parts.len(), 2);
        assert!(contents[1].parts.iter().all(|p| p.function_call.is_some()));

        assert_eq!(contents[2].role.as_deref(), Some("user"));
        assert_eq!(contents[2].parts.len(), 2);
        let response = contents[2].parts[1].function_response.as_ref().unwrap();
        assert_eq!(response.name, "get_current_date_time");
        assert_eq!(response.response, json!({"content": "Saturday"}));

        assert_eq!(contents[3].parts[0].text.as_deref(), Some("I couldn't find it."));

        let system = merge_system_turns("Base prompt", &turns);
        assert!(system.starts_with("Base prompt\n\nSummary of the conversation so far:"));
    }

    #[tokio::test]
    async fn test_respond_assigns_correlation_ids() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "tools": [{"functionDeclarations": [{"name": "delete_event"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"role": "model", "parts": [
                    {"functionCall": {"name": "delete_event", "args": {"event_id": "e1"}}},
                    {"functionCall": {"name": "delete_event", "args": {"event_id": "e2"}}}
                ]}}]
            })))
            .mount(&server)
            .await;

        let config = SchedulerConfig {
            api_key: Some("k".to_string()),
            ..SchedulerConfig::default()
        };
        let client = GeminiClient::new(&config).unwrap().with_base_url(server.uri());
        let model = GeminiModelAdapter::new(client);

        let reply = model
            .respond(
                "system",
                &[Turn::user("clear my day")],
                &[def("delete_event", json!({"type": "object"}))],
            )
            .await
            .unwrap();

        assert_eq!(reply.text, "");
        assert_eq!(reply.action_requests.len(), 2);
        assert_ne!(reply.action_requests[0].id, reply.action_requests[1].id);
        assert_eq!(reply.action_requests[1].arguments, json!({"event_id": "e2"}));
    }
}
