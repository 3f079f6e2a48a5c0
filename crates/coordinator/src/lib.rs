//! Hospital coordinator: decides which sub-agent handles each request.
//!
//! # Architecture
//!
//! ```text
//! User message
//!      │
//!      ▼
//! ┌─────────────────┐   decision    ┌─────────┐
//! │     Session     │──────────────▶│   LLM   │
//! │ (state+reducer) │◀──────────────│         │
//! └────────┬────────┘  confirmation └─────────┘
//!          │ ToolCall
//!    ┌─────┴─────┬──────────┬──────────┬──────────┐
//!    ▼           ▼          ▼          ▼          ▼
//! [Patient] [Scheduler] [Records] [Billing] [Support]
//! ```

pub mod config;
pub mod mediator;
pub mod prompt;
pub mod session;

pub use config::{CoordinatorConfig, SessionConfig};
pub use mediator::{Exchange, Mediator, ToolRun};
pub use session::{FailureKind, Reply, Session, SessionEvent, SessionState};
