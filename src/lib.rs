pub mod config;
pub mod error;
pub mod runner;
pub mod workflow;
pub mod workspace;
