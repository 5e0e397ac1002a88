pub mod aider;
pub mod branch;
pub mod config;
pub mod deps;
pub mod error;
pub mod remote;
pub mod templates;
pub mod vcs;
pub mod workflow;
