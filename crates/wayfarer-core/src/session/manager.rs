//! Agent facade - thread-keyed invocation over the agent loop
//!
//! Loads or creates the thread's conversation, appends the caller's
//! messages, runs one turn, persists, and returns the full history.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use super::agent_loop::{AgentLoop, RunState};
use super::persistence::{ConversationStore, MemoryStore};
use super::types::{AgentInput, AgentOutput, EventSender, InvokeConfig, ThreadId};
use crate::config::{Config, FailureScope};
use crate::error::{Error, Result};
use crate::orchestration::{Conversation, Message, SystemPrompt, ToolExecutor, create_travel_tool_registry};
use crate::provider::{ModelClient, create_provider_from_config};
use crate::tools::ToolRegistry;

/// Per-thread session: serializes turns and carries the thread's counter
struct ThreadSession {
    turn_lock: tokio::sync::Mutex<()>,
    run_state: RunState,
}

/// The travel agent
///
/// Calls for the same thread run one after another; different threads run
/// concurrently.
pub struct Agent {
    agent_loop: AgentLoop,
    store: Arc<dyn ConversationStore>,
    failure_scope: FailureScope,
    /// Counter shared by every thread when the scope is `Agent`
    shared_run_state: RunState,
    sessions: Mutex<HashMap<ThreadId, Arc<ThreadSession>>>,
}

impl Agent {
    pub fn new(model: Arc<dyn ModelClient>, registry: Arc<ToolRegistry>) -> Self {
        let executor = ToolExecutor::new(registry);
        Self::from_loop(AgentLoop::new(model, executor))
    }

    /// Wrap a configured loop (in-memory store, per-thread counters)
    pub fn from_loop(agent_loop: AgentLoop) -> Self {
        Self {
            agent_loop,
            store: Arc::new(MemoryStore::new()),
            failure_scope: FailureScope::Thread,
            shared_run_state: RunState::new(),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Build the production agent: genai model client, travel tools, and
    /// the policy from `config`
    pub fn from_config(config: &Config, store: Arc<dyn ConversationStore>) -> Result<Self> {
        let registry = Arc::new(create_travel_tool_registry(&config.tools)?);
        let model = create_provider_from_config(&config.provider, registry.list())?;
        let executor = ToolExecutor::new(registry).with_parallel(config.agent.parallel_tools);
        let agent_loop = AgentLoop::new(Arc::new(model), executor)
            .with_config(&config.agent)
            .with_system_prompt(SystemPrompt::new());

        info!(
            model = %config.provider.effective_model(),
            scope = ?config.agent.failure_scope,
            "Agent ready"
        );
        Ok(Self::from_loop(agent_loop)
            .with_store(store)
            .with_failure_scope(config.agent.failure_scope))
    }

    pub fn with_store(mut self, store: Arc<dyn ConversationStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_failure_scope(mut self, scope: FailureScope) -> Self {
        self.failure_scope = scope;
        self
    }

    /// Send progress events for every turn to `events`
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.agent_loop = self.agent_loop.with_events(events);
        self
    }

    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.store
    }

    /// Failure count for a thread (the shared count in `Agent` scope)
    pub fn failure_count(&self, thread_id: &str) -> u32 {
        match self.failure_scope {
            FailureScope::Agent => self.shared_run_state.failures(),
            FailureScope::Thread => self
                .sessions
                .lock()
                .get(thread_id)
                .map(|s| s.run_state.failures())
                .unwrap_or(0),
        }
    }

    /// Run one turn on the selected thread
    pub async fn invoke(&self, input: AgentInput, config: InvokeConfig) -> Result<AgentOutput> {
        if input.messages.is_empty() {
            return Err(Error::Agent("No input messages".to_string()));
        }

        let session = self.session(&config.thread_id);
        let result = self.run_locked(&session, &config.thread_id, input).await;
        drop(session);
        self.evict_idle_sessions();

        Ok(AgentOutput {
            thread_id: config.thread_id,
            messages: result?,
        })
    }

    async fn run_locked(&self, session: &ThreadSession, thread_id: &str, input: AgentInput) -> Result<Vec<Message>> {
        let _turn = session.turn_lock.lock().await;

        let mut conversation = self
            .store
            .load(thread_id)?
            .unwrap_or_else(|| Conversation::new(thread_id));
        debug!(thread = %thread_id, existing = conversation.len(), "Starting turn");

        conversation.extend(input.messages)?;
        let result = self.agent_loop.run_turn(&mut conversation, &session.run_state).await;

        // Keep whatever the turn appended, even when the model call failed
        self.store.save(&conversation)?;
        result?;

        Ok(conversation.messages().to_vec())
    }

    /// Shortcut for a single human message
    pub async fn ask(&self, thread_id: &str, content: impl Into<String>) -> Result<AgentOutput> {
        self.invoke(AgentInput::human(content), InvokeConfig::new(thread_id))
            .await
    }

    /// Forget a thread's history and counter
    ///
    /// Waits for a running turn on the thread to finish first, so the turn
    /// cannot write the thread back afterwards.
    pub async fn delete_thread(&self, thread_id: &str) -> Result<bool> {
        let session = self.session(thread_id);
        let deleted = {
            let _turn = session.turn_lock.lock().await;
            if self.failure_scope == FailureScope::Thread {
                session.run_state.reset();
            }
            self.store.delete(thread_id)
        };
        drop(session);
        self.evict_idle_sessions();
        deleted
    }

    /// Number of threads holding an in-memory session
    pub fn tracked_threads(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Drop sessions that no caller holds and that carry no state worth
    /// keeping. In `Agent` scope the counter lives outside the sessions.
    fn evict_idle_sessions(&self) {
        let keep_counters = self.failure_scope == FailureScope::Thread;
        self.sessions
            .lock()
            .retain(|_, s| Arc::strong_count(s) > 1 || (keep_counters && s.run_state.failures() > 0));
    }

    fn session(&self, thread_id: &str) -> Arc<ThreadSession> {
        let mut sessions = self.sessions.lock();
        sessions
            .entry(thread_id.to_string())
            .or_insert_with(|| {
                let run_state = match self.failure_scope {
                    FailureScope::Agent => self.shared_run_state.clone(),
                    FailureScope::Thread => RunState::new(),
                };
                Arc::new(ThreadSession {
                    turn_lock: tokio::sync::Mutex::new(()),
                    run_state,
                })
            })
            .clone()
    }
}
