//! Mock hospital sub-agents.
//!
//! The coordinator advertises [`tool_catalog`] to the model, turns the
//! model's tool invocation into a [`ToolCall`] and hands it to
//! [`execute`]. Each sub-agent lives in its own module:
//!
//! - **patient**: registration and contact updates
//! - **scheduler**: doctor appointments
//! - **records**: medical record summaries
//! - **billing**: invoices, payments and insurance claims
//! - **support**: IT tickets
//!
//! ```text
//! ToolInvocation ──parse──▶ ToolCall ──execute──▶ ToolOutcome
//!                                        │
//!                                   &HospitalDb (read-only)
//! ```
//!
//! Handlers never mutate the database. A handler that creates a record
//! returns it in [`ToolOutcome::record`] and the caller applies it.

pub mod billing;
pub mod call;
pub mod dashboard;
pub mod db;
pub mod dispatch;
pub mod patient;
pub mod records;
pub mod registry;
pub mod scheduler;
pub mod support;

pub use call::{BillingArgs, PatientArgs, RecordsArgs, ScheduleArgs, SupportArgs, ToolCall};
pub use dashboard::{Dashboard, Panel};
pub use db::{HospitalDb, NewRecord};
pub use dispatch::{GENERIC_RESULT, ToolOutcome, execute, execute_invocation};
pub use registry::{find_tool, tool_catalog};
