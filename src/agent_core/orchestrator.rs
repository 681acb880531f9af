//! OrchestrationLoop — one user turn from utterance to final answer.
//!
//! The loop appends the user message, seeds the system prompt, then (under
//! the session deadline) fetches the tool catalog, asks the model, runs any
//! tool calls it directs, feeds the results back and appends the answer.
//! Every failure is converted into exactly one assistant message, so the
//! conversation is always left in a presentable state.

use std::sync::Arc;

use futures::future::join_all;

use crate::config::OrchestratorConfig;
use crate::inference::types::{ModelReply, RawToolCall, ToolDefinition};
use crate::inference::ChatModel;
use crate::tool_backend::{ToolCallRequest, ToolCatalog, ToolInvoker};

use super::conversation::ConversationStore;
use super::errors::AgentError;
use super::types::{LoopState, Message, RunOutcome, RunStatus};

// ─── Constants ──────────────────────────────────────────────────────────────

/// Interim text when the model directs tools without saying anything.
const LOOKUP_PLACEHOLDER: &str = "I need to look that up for you...";

/// Final text when a direct answer has no content.
const NO_RESPONSE_PLACEHOLDER: &str = "I'm sorry, I couldn't generate a response.";

/// Final text when the follow-up after tool results has no content.
const NO_FOLLOW_UP_PLACEHOLDER: &str = "I'm sorry, I couldn't process that information.";

// ─── Run bookkeeping ────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct RunStats {
    rounds: u32,
    tool_calls: usize,
}

// ─── OrchestrationLoop ──────────────────────────────────────────────────────

/// Drives the model ↔ tool exchange for one conversation.
pub struct OrchestrationLoop {
    model: Arc<dyn ChatModel>,
    catalog: Arc<ToolCatalog>,
    invoker: ToolInvoker,
    config: OrchestratorConfig,
    state: LoopState,
}

impl OrchestrationLoop {
    /// A `max_tool_rounds` of zero is raised to one.
    pub fn new(
        model: Arc<dyn ChatModel>,
        catalog: Arc<ToolCatalog>,
        invoker: ToolInvoker,
        mut config: OrchestratorConfig,
    ) -> Self {
        if config.max_tool_rounds == 0 {
            tracing::warn!("max_tool_rounds is 0, using 1");
            config.max_tool_rounds = 1;
        }
        Self {
            model,
            catalog,
            invoker,
            config,
            state: LoopState::AwaitingUserInput,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn catalog(&self) -> &Arc<ToolCatalog> {
        &self.catalog
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Process one user utterance.
    ///
    /// Never fails: errors and timeouts end up as an assistant message and
    /// are reflected in the returned [`RunOutcome`].
    pub async fn run(&mut self, store: &mut ConversationStore, utterance: &str) -> RunOutcome {
        if !matches!(self.state, LoopState::AwaitingUserInput | LoopState::Failed) {
            // A previous run was dropped by its caller mid-turn.
            tracing::warn!(state = ?self.state, "resetting loop state left by an abandoned run");
            self.state = LoopState::AwaitingUserInput;
        }

        store.append(Message::user(utterance));
        store.ensure_system_message(&self.config.system_prompt);

        let deadline = self.config.session_deadline();
        let mut stats = RunStats::default();

        let result = match tokio::time::timeout(deadline, self.drive(store, &mut stats)).await {
            Ok(result) => result,
            Err(_) => Err(AgentError::Timeout {
                duration_secs: deadline.as_secs(),
            }),
        };

        let status = match result {
            Ok(()) => {
                self.state = LoopState::AwaitingUserInput;
                RunStatus::Completed
            }
            Err(e) => {
                tracing::warn!(error = %e, rounds = stats.rounds, "agent turn failed");
                store.append(Message::assistant(e.user_message()));
                self.state = LoopState::Failed;
                if e.is_timeout() {
                    RunStatus::TimedOut
                } else {
                    RunStatus::Failed
                }
            }
        };

        let outcome = RunOutcome {
            status,
            rounds: stats.rounds,
            tool_calls: stats.tool_calls,
        };
        tracing::info!(
            status = ?outcome.status,
            rounds = outcome.rounds,
            tool_calls = outcome.tool_calls,
            message_count = store.len(),
            "=== AGENT TURN COMPLETE ==="
        );
        outcome
    }

    /// Everything that runs under the session deadline.
    async fn drive(&mut self, store: &mut ConversationStore, stats: &mut RunStats) -> Result<(), AgentError> {
        self.transition(LoopState::ModelCallPending)?;

        let declarations = self.catalog.fetch().await;
        let tools: Option<Vec<ToolDefinition>> = if declarations.is_empty() {
            None
        } else {
            Some(declarations.iter().map(ToolDefinition::from).collect())
        };

        let mut reply = self.call_model(store, &tools, stats.rounds).await?;

        loop {
            let (interim_text, calls) = match reply {
                ModelReply::DirectResponse { text } => {
                    let fallback = if stats.rounds == 0 {
                        NO_RESPONSE_PLACEHOLDER
                    } else {
                        NO_FOLLOW_UP_PLACEHOLDER
                    };
                    store.append(Message::assistant(text.unwrap_or_else(|| fallback.to_string())));
                    self.transition(LoopState::ResponseReady)?;
                    return Ok(());
                }
                ModelReply::ToolDirective { interim_text, calls } => (interim_text, calls),
            };

            if stats.rounds >= self.config.max_tool_rounds {
                tracing::warn!(
                    rounds = stats.rounds,
                    ignored_calls = calls.len(),
                    "tool round limit reached, ignoring further tool directive"
                );
                let text = interim_text.unwrap_or_else(|| NO_FOLLOW_UP_PLACEHOLDER.to_string());
                store.append(Message::assistant(text));
                self.transition(LoopState::ResponseReady)?;
                return Ok(());
            }

            store.append(Message::assistant(
                interim_text.unwrap_or_else(|| LOOKUP_PLACEHOLDER.to_string()),
            ));
            self.transition(LoopState::ToolCallPending)?;
            stats.rounds += 1;

            let requests = parse_tool_calls(calls);
            stats.tool_calls += requests.len();
            self.execute_tool_calls(store, requests).await;

            self.transition(LoopState::ModelCallPending)?;
            reply = self.call_model(store, &tools, stats.rounds).await?;
        }
    }

    async fn call_model(
        &self,
        store: &ConversationStore,
        tools: &Option<Vec<ToolDefinition>>,
        round: u32,
    ) -> Result<ModelReply, AgentError> {
        let messages = store.to_chat_messages(self.config.include_function_names);
        tracing::info!(
            round,
            message_count = messages.len(),
            tool_count = tools.as_ref().map(Vec::len).unwrap_or(0),
            "=== AGENT LOOP ROUND START ==="
        );
        Ok(self.model.complete(messages, tools.clone()).await?)
    }

    /// Run one directive's calls and record their results in the model's order.
    async fn execute_tool_calls(&self, store: &mut ConversationStore, requests: Vec<ToolCallRequest>) {
        if self.config.parallel_tool_calls && requests.len() > 1 {
            let results = join_all(requests.iter().map(|req| self.invoker.execute(req))).await;
            for (request, result) in requests.iter().zip(results) {
                store.record_function_result(&request.name, result.raw);
            }
        } else {
            for request in &requests {
                let result = self.invoker.execute(request).await;
                store.record_function_result(&request.name, result.raw);
            }
        }
    }

    fn transition(&mut self, target: LoopState) -> Result<(), AgentError> {
        if !self.state.can_transition_to(&target) {
            tracing::error!(
                from = ?self.state,
                to = ?target,
                allowed = ?self.state.valid_transitions(),
                "invalid loop state transition"
            );
            return Err(AgentError::InvalidTransition {
                from: self.state,
                to: target,
            });
        }
        tracing::debug!(from = ?self.state, to = ?target, "loop state transition");
        self.state = target;
        Ok(())
    }
}

// ─── Tool call validation ───────────────────────────────────────────────────

/// Keep the calls that have a name and a JSON-object argument string.
fn parse_tool_calls(calls: Vec<RawToolCall>) -> Vec<ToolCallRequest> {
    calls.into_iter().filter_map(parse_tool_call).collect()
}

fn parse_tool_call(call: RawToolCall) -> Option<ToolCallRequest> {
    let name = call.name.filter(|n| !n.trim().is_empty());
    let arguments = call.arguments.filter(|a| !a.trim().is_empty());

    let (Some(name), Some(arguments)) = (name, arguments) else {
        tracing::warn!("skipping tool call with missing name or arguments");
        return None;
    };

    match serde_json::from_str::<serde_json::Value>(&arguments) {
        Ok(serde_json::Value::Object(map)) => Some(ToolCallRequest::new(name, map)),
        Ok(other) => {
            tracing::warn!(tool = %name, arguments = %other, "skipping tool call with non-object arguments");
            None
        }
        Err(e) => {
            tracing::warn!(tool = %name, error = %e, "skipping tool call with malformed arguments");
            None
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
