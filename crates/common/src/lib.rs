//! Common types shared across the hospital coordinator crates.
//!
//! Everything here is plain data: conversation turns, the agent kinds a
//! turn can be attributed to, tool descriptors advertised to the model, and
//! the mock hospital records the sub-agents fabricate.

pub mod error;
pub mod message;
pub mod records;
pub mod tool;

pub use error::{MedcoordError, Result};
pub use message::{AgentKind, Turn, TurnRole};
pub use records::{Appointment, AppointmentStatus, Invoice, InvoiceStatus, MedicalRecord, Patient, Vitals};
pub use tool::{ParamKind, ParamSpec, ToolDescriptor, ToolInvocation};
