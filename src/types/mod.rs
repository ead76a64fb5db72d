pub mod entry;
pub mod error;
pub mod ticket;

pub use entry::{ErrorLogEntry, LogLevel};
pub use error::{
    ErrorCategory, ErrorClassifier, LlmError, Result, ResultExt, WardenError,
};
pub use ticket::{GeneratedTicket, IssueCategory, Severity, TicketContent, TicketSource};
