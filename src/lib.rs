//! Farming assistant session core: settings with safe defaults, prompt
//! assembly from those settings, a generation backend call with classified
//! failures, and the chat transcript.

pub mod attachment;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod errors;
pub mod harvest;
pub mod log;
pub mod orchestrator;
pub mod prompt;
pub mod provider;
pub mod session;
pub mod settings;
pub mod transcript;
pub mod ux;
