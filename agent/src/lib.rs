//! Conversation controller for the scheduling assistant.
//!
//! [`ConversationController`] owns one transcript, condenses it into a
//! running summary when it grows past the token threshold, and drives the
//! model through rounds of action calls until it produces a final answer.

pub mod controller;
pub mod errors;
pub mod model;
pub mod prompt;

pub use controller::{CondenseOutcome, ControllerSettings, ConversationController};
pub use errors::{AgentError, AgentResult};
pub use model::{GeminiModelAdapter, LanguageModel, ModelReply};
pub use prompt::{condensation_prompt, render_system_prompt, FALLBACK_REPLY};
