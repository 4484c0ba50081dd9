use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use scheduler_core::config::SchedulerConfig;
use scheduler_memory::{ActionRequest, Tokenizer, Transcript, Turn};
use scheduler_tools::{ActionError, ActionRegistry};
use tracing::{debug, error, info, warn};

use crate::errors::{AgentError, AgentResult};
use crate::model::LanguageModel;
use crate::prompt::{condensation_prompt, FALLBACK_REPLY};

/// Limits that keep the conversation and each call bounded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    /// Condense once the transcript exceeds this many tokens
    pub summarization_threshold: usize,
    /// Most recent turns always kept verbatim
    pub messages_to_retain: usize,
    /// Model submissions allowed per user turn
    pub max_rounds: usize,
    /// Deadline for each model call and each action
    pub call_timeout: Duration,
}

impl ControllerSettings {
    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self {
            summarization_threshold: config.summarization_threshold(),
            messages_to_retain: config.messages_to_retain(),
            max_rounds: config.max_rounds(),
            call_timeout: Duration::from_secs(config.request_timeout_secs()),
        }
    }
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self::from_config(&SchedulerConfig::default())
    }
}

/// What `maybe_condense` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CondenseOutcome {
    Skipped,
    Condensed { removed: usize, retained: usize },
    /// The summary would not have shrunk the transcript and was discarded
    Rejected { before: usize, after: usize },
}

/// Owns one conversation's transcript and drives the model over it.
///
/// Calls take `&mut self`, so a controller serves one `run_turn` at a time.
pub struct ConversationController {
    model: Arc<dyn LanguageModel>,
    registry: ActionRegistry,
    tokenizer: Arc<dyn Tokenizer>,
    system_instruction: String,
    settings: ControllerSettings,
    transcript: Transcript,
}

impl ConversationController {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        registry: ActionRegistry,
        tokenizer: Arc<dyn Tokenizer>,
        system_instruction: impl Into<String>,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            model,
            registry,
            tokenizer,
            system_instruction: system_instruction.into(),
            settings,
            transcript: Transcript::new(),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Starts a fresh conversation with the same configuration
    pub fn reset(&mut self) {
        self.transcript.clear();
    }

    pub fn append(&mut self, turn: Turn) {
        self.transcript.append(turn);
    }

    pub fn size_estimate(&self) -> usize {
        self.transcript.size_estimate(self.tokenizer.as_ref())
    }

    /// Replaces everything but the retained window with a model-written
    /// summary once the transcript is over the threshold.
    ///
    /// On failure the transcript is left exactly as it was.
    pub async fn maybe_condense(&mut self) -> AgentResult<CondenseOutcome> {
        let token_count = self.size_estimate();
        debug!(token_count, "Current token count");

        if token_count <= self.settings.summarization_threshold {
            return Ok(CondenseOutcome::Skipped);
        }

        let split = self.transcript.split_for_condensation(self.retain_window());
        if split == 0 {
            debug!(token_count, "Over threshold but nothing outside the retained window");
            return Ok(CondenseOutcome::Skipped);
        }

        info!(
            token_count,
            threshold = self.settings.summarization_threshold,
            condensing = split,
            "Token count exceeds threshold, summarizing memory"
        );

        let prompt = condensation_prompt(&self.transcript.turns()[..split]);
        let summary = with_deadline(
            "Condensation",
            self.settings.call_timeout,
            self.model.complete(&prompt),
        )
        .await?
        .map_err(|e| {
            error!(error = %e, "Condensation call failed, keeping transcript unchanged");
            AgentError::Condensation(e)
        })?;

        let mut condensed = self.transcript.clone();
        let removed = condensed.replace_prefix(split, Turn::summary(&summary));
        let condensed_count = condensed.size_estimate(self.tokenizer.as_ref());
        if condensed_count >= token_count {
            warn!(
                token_count,
                condensed_count, "Summary would not shrink the transcript, keeping it unchanged"
            );
            return Ok(CondenseOutcome::Rejected {
                before: token_count,
                after: condensed_count,
            });
        }

        self.transcript = condensed;
        let retained = self.transcript.len() - 1;
        info!(
            removed,
            retained,
            token_count = condensed_count,
            "Memory has been summarized"
        );

        Ok(CondenseOutcome::Condensed { removed, retained })
    }

    /// Turns kept verbatim; never zero so the current user turn survives
    fn retain_window(&self) -> usize {
        self.settings.messages_to_retain.max(1)
    }

    /// Handles one user message and returns the assistant's final answer.
    ///
    /// Action failures are fed back to the model as tool results. A failed
    /// model call ends the turn with an error; turns appended before it stay.
    pub async fn run_turn(&mut self, user_text: &str) -> AgentResult<String> {
        self.transcript.append(Turn::user(user_text));
        self.maybe_condense().await?;

        let declarations = self.registry.declarations();

        for round in 1..=self.settings.max_rounds {
            debug!(round, turns = self.transcript.len(), "Invoking model");

            let reply = with_deadline(
                "Model call",
                self.settings.call_timeout,
                self.model.respond(
                    &self.system_instruction,
                    self.transcript.turns(),
                    &declarations,
                ),
            )
            .await?
            .map_err(|e| {
                error!(error = %e, round, "Failed to get response from model");
                AgentError::Model(e)
            })?;

            if reply.action_requests.is_empty() {
                debug!(round, "Model produced a final answer");
                self.transcript.append(Turn::assistant(reply.text.clone()));
                return Ok(reply.text);
            }

            let requests = reply.action_requests.clone();
            self.transcript
                .append(Turn::assistant_with_actions(reply.text, reply.action_requests));

            for request in &requests {
                let result = self.execute_action(request).await;
                self.transcript.append(Turn::tool_result(request, result));
            }
        }

        warn!(
            max_rounds = self.settings.max_rounds,
            "Model kept requesting actions, giving up on this turn"
        );
        self.transcript.append(Turn::assistant(FALLBACK_REPLY));
        Ok(FALLBACK_REPLY.to_string())
    }

    /// Runs one requested action; every outcome becomes tool-result text
    async fn execute_action(&self, request: &ActionRequest) -> String {
        info!(tool = %request.name, call_id = %request.id, "Executing tool");

        let outcome = tokio::time::timeout(
            self.settings.call_timeout,
            self.registry
                .execute(&request.name, request.arguments.clone()),
        )
        .await;

        match outcome {
            Ok(Ok(output)) => output,
            Ok(Err(ActionError::Unknown(name))) => {
                warn!(tool = %name, "Model requested an unknown tool");
                format!("Error: Tool '{}' not found.", name)
            }
            Ok(Err(e)) => {
                warn!(tool = %request.name, error = %e, "Tool execution failed");
                format!("Error executing tool {}: {}", request.name, e)
            }
            Err(_) => {
                warn!(tool = %request.name, "Tool execution timed out");
                format!(
                    "Error executing tool {}: timed out after {:?}",
                    request.name, self.settings.call_timeout
                )
            }
        }
    }
}

async fn with_deadline<F: Future>(
    operation: &'static str,
    limit: Duration,
    future: F,
) -> AgentResult<F::Output> {
    tokio::time::timeout(limit, future)
        .await
        .map_err(|_| AgentError::Timeout {
            operation,
            elapsed: limit,
        })
}
