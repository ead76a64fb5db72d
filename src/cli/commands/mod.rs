pub mod config;
pub mod generate;
pub mod issues;
pub mod monitor;
pub mod scan;
