//! `linetrace-runtime` - line-level execution tracer and script runtime.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

/// Runtime and tracer configuration.
pub mod config;
/// Line tracing, breakpoints, and the suspend/resume rendezvous.
pub mod debug;
/// Runtime errors.
pub mod error;
/// Expression and statement evaluation.
pub mod eval;
/// Call frames and local variables.
pub mod memory;
/// Script lexer, parser, and engine.
pub mod script;
/// Value types.
pub mod value;

pub use config::{EngineConfig, RuntimeConfig, TracerConfig};
pub use debug::Tracer;
pub use error::{ParseError, RuntimeError};
pub use script::{RunOutcome, ScriptEngine};
