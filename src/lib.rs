//! WriteGPT - a writing assistant on top of hosted language and image models
//!
//! Prompts are assembled from free text, task presets or writer/genre/quality
//! selections, sent to an OpenAI-compatible API, and the replies collected in
//! an output buffer.

pub mod ai;
pub mod catalog;
pub mod compose;
pub mod config;
pub mod credentials;
pub mod dispatch;
pub mod error;
pub mod repl;
pub mod session;

pub use error::{DispatchError, Error, Result};
