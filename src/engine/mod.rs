// src/engine/mod.rs

//! Quiz progress and scoring engine.
//!
//! Everything in here talks to the store through `sqlx` and reports failures
//! as [`EngineError`]; raw storage errors are classified before they leave
//! this module.

pub mod aggregate;
pub mod catalog;
pub mod completion;
pub mod error;
pub mod progress;
pub mod recorder;
pub mod service;
pub mod tx;

pub use error::EngineError;
pub use service::{SubmitOutcome, submit_answer};
pub use tx::UnitOfWork;
