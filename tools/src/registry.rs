use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use scheduler_core::types::FunctionDef;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use crate::errors::ActionError;

/// A named operation the model may invoke
#[async_trait]
pub trait Action: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the argument object
    fn parameters(&self) -> Value;

    async fn invoke(&self, args: Value) -> Result<Value, ActionError>;

    fn declaration(&self) -> FunctionDef {
        FunctionDef {
            name: self.name().to_string(),
            description: Some(self.description().to_string()),
            parameters: self.parameters(),
        }
    }
}

/// Deserializes an action's argument object; a missing object counts as `{}`.
pub fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ActionError> {
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args).map_err(|e| ActionError::InvalidArguments(e.to_string()))
}

/// Fixed set of actions, in registration order
#[derive(Default, Clone)]
pub struct ActionRegistry {
    actions: Vec<Arc<dyn Action>>,
    index: HashMap<String, usize>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an action, replacing any previous action with the same name
    pub fn register(&mut self, action: Arc<dyn Action>) {
        let name = action.name().to_string();
        match self.index.get(&name) {
            Some(&slot) => self.actions[slot] = action,
            None => {
                self.index.insert(name, self.actions.len());
                self.actions.push(action);
            }
        }
    }

    pub fn with(mut self, action: Arc<dyn Action>) -> Self {
        self.register(action);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Action>> {
        self.index.get(name).map(|&slot| Arc::clone(&self.actions[slot]))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.actions.iter().map(|a| a.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Schemas advertised to the model
    pub fn declarations(&self) -> Vec<FunctionDef> {
        self.actions.iter().map(|a| a.declaration()).collect()
    }

    /// Runs `name` and renders its return value as text.
    ///
    /// Names outside the registry fail with [`ActionError::Unknown`].
    pub async fn execute(&self, name: &str, args: Value) -> Result<String, ActionError> {
        let action = self
            .get(name)
            .ok_or_else(|| ActionError::Unknown(name.to_string()))?;

        debug!(tool = name, args = %args, "Executing action");
        let output = action.invoke(args).await?;
        Ok(render_output(output))
    }
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.names())
            .finish()
    }
}

fn render_output(output: Value) -> String {
    match output {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    struct Echo {
        name: &'static str,
    }

    #[derive(Deserialize)]
    struct EchoArgs {
        text: String,
    }

    #[async_trait]
    impl Action for Echo {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "Echoes its input"
        }

        fn parameters(&self) -> Value {
            json!({
                "type": "object",
                "properties": {"text": {"type": "string"}},
                "required": ["text"]
            })
        }

        async fn invoke(&self, args: Value) -> Result<Value, ActionError> {
            let args: EchoArgs = parse_args(args)?;
            if args.text == "structured" {
                return Ok(json!({"echo": args.text}));
            }
            Ok(Value::String(args.text))
        }
    }

    fn registry() -> ActionRegistry {
        ActionRegistry::new()
            .with(Arc::new(Echo { name: "echo" }))
            .with(Arc::new(Echo { name: "shout" }))
    }

    #[tokio::test]
    async fn test_execute_renders_strings_raw() {
        let out = registry()
            .execute("echo", json!({"text": "hello"}))
            .await
            .unwrap();
        assert_eq!(out, "hello");
    }

    #[tokio::test]
    async fn test_execute_renders_structured_as_json() {
        let out = registry()
            .execute("echo", json!({"text": "structured"}))
            .await
            .unwrap();
        assert_eq!(out, r#"{"echo":"structured"}"#);
    }

    #[tokio::test]
    async fn test_unknown_action() {
        let err = registry().execute("teleport", json!({})).await.unwrap_err();
        assert!(matches!(err, ActionError::Unknown(ref name) if name == "teleport"));
        assert_eq!(err.to_string(), "Tool 'teleport' not found.");
    }

    #[tokio::test]
    async fn test_invalid_arguments() {
        let err = registry().execute("echo", json!({"txt": 1})).await.unwrap_err();
        assert!(matches!(err, ActionError::InvalidArguments(_)));
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = registry();
        registry.register(Arc::new(Echo { name: "echo" }));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["echo", "shout"]);
        assert!(registry.contains("shout"));
    }

    #[test]
    fn test_declarations_follow_registration_order() {
        let declarations = registry().declarations();
        assert_eq!(declarations.len(), 2);
        assert_eq!(declarations[0].name, "echo");
        assert_eq!(declarations[1].description.as_deref(), Some("Echoes its input"));
        assert_eq!(declarations[0].parameters["required"], json!(["text"]));
    }
}
