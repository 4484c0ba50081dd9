use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Prefix carried by every summary turn produced by condensation
pub const SUMMARY_PREFIX: &str = "Summary of the conversation so far:\n";

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
            Role::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named action the model asked to run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Correlation id echoed by the matching tool turn
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

impl ActionRequest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// One message in a conversation.
///
/// Fields are private so a turn cannot change once it is in a transcript;
/// build turns with the role constructors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    role: Role,
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    action_requests: Vec<ActionRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_name: Option<String>,
}

impl Turn {
    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            action_requests: Vec::new(),
            tool_call_id: None,
            tool_name: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    /// Assistant turn that asks for one or more actions
    pub fn assistant_with_actions(
        content: impl Into<String>,
        action_requests: Vec<ActionRequest>,
    ) -> Self {
        Self {
            action_requests,
            ..Self::plain(Role::Assistant, content)
        }
    }

    /// Result of running the action identified by `request`
    pub fn tool_result(request: &ActionRequest, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(request.id.clone()),
            tool_name: Some(request.name.clone()),
            ..Self::plain(Role::Tool, content)
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    /// System turn standing in for a condensed prefix
    pub fn summary(summary_text: &str) -> Self {
        Self::plain(Role::System, format!("{}{}", SUMMARY_PREFIX, summary_text.trim()))
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn action_requests(&self) -> &[ActionRequest] {
        &self.action_requests
    }

    pub fn has_action_requests(&self) -> bool {
        !self.action_requests.is_empty()
    }

    pub fn tool_call_id(&self) -> Option<&str> {
        self.tool_call_id.as_deref()
    }

    pub fn tool_name(&self) -> Option<&str> {
        self.tool_name.as_deref()
    }

    pub fn is_summary(&self) -> bool {
        self.role == Role::System && self.content.starts_with(SUMMARY_PREFIX)
    }
}

impl fmt::Display for Turn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.role, self.content)?;
        for request in &self.action_requests {
            write!(f, " [calls {}({})]", request.name, request.arguments)?;
        }
        Ok(())
    }
}
