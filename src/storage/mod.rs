pub mod database;
pub mod issues;

pub use database::{Database, PoolConfig, SharedDatabase};
pub use issues::{Issue, IssueLog, IssueStatus, IssueStore, RecordOutcome};
