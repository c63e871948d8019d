//! Session module - thread-keyed agent invocation
//!
//! - `Agent`: the entry point; one turn per `invoke`, history per thread
//! - `AgentLoop`: the model → tools → model state machine
//! - `ConversationStore`: where thread histories live between turns
//! - `AgentInput`/`AgentOutput`/`AgentEvent`: the front-end boundary
//!
//! # Example Usage
//!
//! ```ignore
//! use wayfarer_core::session::{Agent, AgentInput, FileStore, InvokeConfig};
//!
//! let agent = Agent::from_config(&config, Arc::new(FileStore::new(dir)))?;
//! let output = agent
//!     .invoke(AgentInput::human("Plan Sydney to Melbourne"), InvokeConfig::new("trip-1"))
//!     .await?;
//! println!("{}", output.final_text());
//! ```

mod agent_loop;
mod manager;
mod persistence;
mod types;

pub use agent_loop::{AgentLoop, AgentState, DEFAULT_MAX_RETRIES, RunState};
pub use manager::Agent;
pub use persistence::{ConversationStore, FileStore, MemoryStore};
pub use types::{AgentEvent, AgentInput, AgentOutput, EventReceiver, EventSender, InvokeConfig, ThreadId};
