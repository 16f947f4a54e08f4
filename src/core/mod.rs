//! Core domain models
//!
//! This module defines the pipeline document, the validated pipeline
//! model, the predicate language and the trigger context.

pub mod condition;
pub mod config;
pub mod context;
pub mod deploy;
pub mod env;
pub mod error;
pub mod job;
pub mod pipeline;
pub mod state;

pub use context::*;
pub use error::*;
pub use job::*;
pub use pipeline::*;
pub use state::*;
