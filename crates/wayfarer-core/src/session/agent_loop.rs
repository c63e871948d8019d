//! Agent Loop - the model/tool state machine for one conversation turn
//!
//! The loop handles:
//! - Calling the model with the system prompt prepended
//! - Executing requested tool calls and appending their results
//! - Counting failed tool passes and producing the fallback plan
//! - Emitting progress events for display

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use tracing::{debug, info, warn};

use super::types::{AgentEvent, EventSender};
use crate::config::AgentConfig;
use crate::error::{Error, Result};
use crate::orchestration::{
    Conversation, ExecutionReport, Message, SystemPrompt, ToolCallRequest, ToolExecutor, fallback_request,
};
use crate::provider::ModelClient;

/// Failed tool passes tolerated before the fallback plan is produced
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Tool-failure bookkeeping, kept apart from the conversation
///
/// The counter is cumulative: it is never reset between turns, and counts
/// tool passes with at least one failure rather than individual failures.
/// Clones share the same counter.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    failures: Arc<AtomicU32>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failures(&self) -> u32 {
        self.failures.load(Ordering::SeqCst)
    }

    /// Start over from zero (used when a thread is deleted)
    pub fn reset(&self) {
        self.failures.store(0, Ordering::SeqCst);
    }

    /// Record one tool pass and return the resulting count
    pub fn record_pass(&self, had_failure: bool) -> u32 {
        if had_failure {
            self.failures.fetch_add(1, Ordering::SeqCst) + 1
        } else {
            self.failures()
        }
    }
}

/// Where the loop is within a turn
#[derive(Debug, Clone, PartialEq)]
pub enum AgentState {
    AwaitingModel,
    AwaitingTools(Vec<ToolCallRequest>),
    Done,
}

/// Runs turns of the model → tools → model cycle
pub struct AgentLoop {
    model: Arc<dyn ModelClient>,
    executor: ToolExecutor,
    system_prompt: SystemPrompt,
    max_retries: u32,
    max_iterations: Option<usize>,
    events: Option<EventSender>,
}

impl AgentLoop {
    pub fn new(model: Arc<dyn ModelClient>, executor: ToolExecutor) -> Self {
        Self {
            model,
            executor,
            system_prompt: SystemPrompt::new(),
            max_retries: DEFAULT_MAX_RETRIES,
            max_iterations: None,
            events: None,
        }
    }

    /// Apply the retry threshold and iteration cap from configuration
    pub fn with_config(mut self, config: &AgentConfig) -> Self {
        self.max_retries = config.max_retries;
        self.max_iterations = config.max_iterations;
        self
    }

    pub fn with_system_prompt(mut self, prompt: SystemPrompt) -> Self {
        self.system_prompt = prompt;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Cap the number of model calls in one turn
    pub fn with_max_iterations(mut self, max_iterations: Option<usize>) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Run one turn until the model answers without tool calls or the
    /// fallback plan is produced. The final assistant message is the last
    /// message of `conversation` on success.
    ///
    /// Model-call errors are returned as-is and leave whatever was appended
    /// before the failure in place.
    pub async fn run_turn(&self, conversation: &mut Conversation, run_state: &RunState) -> Result<()> {
        let mut state = AgentState::AwaitingModel;
        let mut iterations = 0usize;

        loop {
            state = match state {
                AgentState::AwaitingModel => {
                    iterations += 1;
                    if let Some(limit) = self.max_iterations
                        && iterations > limit
                    {
                        warn!(thread = %conversation.thread_id, limit, "Iteration limit reached");
                        return Err(Error::IterationLimit(limit));
                    }

                    self.emit(&conversation.thread_id, AgentEvent::ModelCall { iteration: iterations })
                        .await;
                    let response = self.call_model(conversation.messages()).await?;
                    let tool_calls = response.tool_calls().to_vec();
                    conversation.push(response)?;

                    if tool_calls.is_empty() {
                        AgentState::Done
                    } else {
                        debug!(count = tool_calls.len(), "Model requested tools");
                        AgentState::AwaitingTools(tool_calls)
                    }
                }
                AgentState::AwaitingTools(tool_calls) => {
                    let report = self.run_tools(&conversation.thread_id, &tool_calls).await;
                    conversation.extend(report.messages())?;
                    let failures = run_state.record_pass(report.has_failures());

                    if report.has_failures() {
                        info!(
                            thread = %conversation.thread_id,
                            failed = ?report.failed_tools,
                            failures,
                            "Tool pass had failures"
                        );
                    }

                    if failures >= self.max_retries {
                        let fallback = self.fallback_plan(conversation, &report, failures).await?;
                        conversation.push(fallback)?;
                        AgentState::Done
                    } else {
                        AgentState::AwaitingModel
                    }
                }
                AgentState::Done => {
                    if let Some(last) = conversation.last() {
                        self.emit(
                            &conversation.thread_id,
                            AgentEvent::FinalAnswer {
                                content: last.content().to_string(),
                            },
                        )
                        .await;
                    }
                    return Ok(());
                }
            };
        }
    }

    /// System prompt first, then the history
    async fn call_model(&self, history: &[Message]) -> Result<Message> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(Message::system(self.system_prompt.build()));
        messages.extend_from_slice(history);
        self.invoke_model(&messages).await
    }

    async fn invoke_model(&self, messages: &[Message]) -> Result<Message> {
        let response = self.model.invoke(messages).await?;
        if !response.is_assistant() {
            return Err(Error::Provider(format!(
                "Model returned a '{}' message instead of an assistant message",
                response.role()
            )));
        }
        Ok(response)
    }

    async fn run_tools(&self, thread_id: &str, tool_calls: &[ToolCallRequest]) -> ExecutionReport {
        for call in tool_calls {
            self.emit(
                thread_id,
                AgentEvent::ToolStarted {
                    call_id: call.id.clone(),
                    name: call.name.clone(),
                },
            )
            .await;
        }

        let report = self.executor.execute(tool_calls).await;

        for outcome in &report.outcomes {
            self.emit(
                thread_id,
                AgentEvent::ToolFinished {
                    call_id: outcome.call_id.clone(),
                    name: outcome.name.clone(),
                    success: outcome.success,
                },
            )
            .await;
        }
        report
    }

    /// One-shot call with only the system prompt and the fallback request.
    /// Tool calls in the response are dropped; the loop never re-enters the
    /// tool cycle from here.
    async fn fallback_plan(
        &self,
        conversation: &Conversation,
        report: &ExecutionReport,
        failures: u32,
    ) -> Result<Message> {
        warn!(
            thread = %conversation.thread_id,
            failures,
            failed = ?report.failed_tools,
            "Failure threshold reached, generating fallback plan"
        );
        self.emit(
            &conversation.thread_id,
            AgentEvent::FallbackTriggered {
                failed_tools: report.failed_tools.clone(),
                failures,
            },
        )
        .await;

        let original_request = conversation.first_human_content().unwrap_or_default();
        let messages = [
            Message::system(self.system_prompt.build()),
            Message::human(fallback_request(&report.failed_tools, original_request)),
        ];
        let response = self.invoke_model(&messages).await?;

        if response.has_tool_calls() {
            warn!(
                count = response.tool_calls().len(),
                "Fallback response requested tools; ignoring them"
            );
        }
        Ok(Message::assistant(response.content()))
    }

    async fn emit(&self, thread_id: &str, event: AgentEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send((thread_id.to_string(), event)).await;
        }
    }
}
