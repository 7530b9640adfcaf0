//! AI incident triage and staff assignment daemon.
//!
//! Accepts a free-text incident description, classifies it through a chat
//! completion call, and deterministically assigns an available staff member
//! by skill and department, with multi-level fallbacks so every incident
//! ends up with a non-null assignment decision even when the model output
//! is malformed or the suggested department does not exist.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod llm;
pub mod parser;
pub mod prompt;
pub mod response;
pub mod selector;
pub mod server;
pub mod skill_index;
pub mod staff;
pub mod validator;

pub use config::TriagedConfig;
pub use engine::{ClassificationEngine, Phase, RegeneratedText};
pub use error::TriagedError;
pub use response::{Assignment, ClassificationResponse, Severity};
pub use staff::{StaffDirectory, StaffRecord};
