//! Runtime and tracer configuration loading.

#![allow(missing_docs)]

use std::path::Path;

use serde::Deserialize;

use crate::error::RuntimeError;

/// Default limit on nested script calls.
pub const DEFAULT_MAX_CALL_DEPTH: u32 = 256;

/// Tracer behavior switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TracerConfig {
    /// Whether code compiled from a string may suspend and appear in stacks.
    pub show_dynamic_code: bool,
    /// Whether an uncaught script exception suspends before unwinding.
    pub suspend_on_exception: bool,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            show_dynamic_code: false,
            suspend_on_exception: true,
        }
    }
}

/// Script engine limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub max_call_depth: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

/// Combined configuration, usually loaded from `linetrace.toml`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub tracer: TracerConfig,
    pub engine: EngineConfig,
}

impl RuntimeConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RuntimeError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| {
            RuntimeError::InvalidConfig(format!("{}: {err}", path.display()).into())
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, RuntimeError> {
        let raw: ConfigToml = toml::from_str(text)
            .map_err(|err| RuntimeError::InvalidConfig(err.to_string().into()))?;
        raw.into_config()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigToml {
    #[serde(default)]
    tracer: TracerSection,
    #[serde(default)]
    engine: EngineSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TracerSection {
    show_dynamic_code: Option<bool>,
    suspend_on_exception: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct EngineSection {
    max_call_depth: Option<u32>,
}

impl ConfigToml {
    fn into_config(self) -> Result<RuntimeConfig, RuntimeError> {
        let tracer_defaults = TracerConfig::default();
        let tracer = TracerConfig {
            show_dynamic_code: self
                .tracer
                .show_dynamic_code
                .unwrap_or(tracer_defaults.show_dynamic_code),
            suspend_on_exception: self
                .tracer
                .suspend_on_exception
                .unwrap_or(tracer_defaults.suspend_on_exception),
        };
        let max_call_depth = self
            .engine
            .max_call_depth
            .unwrap_or(DEFAULT_MAX_CALL_DEPTH);
        if max_call_depth == 0 {
            return Err(RuntimeError::InvalidConfig(
                "engine.max_call_depth must be greater than zero".into(),
            ));
        }
        Ok(RuntimeConfig {
            tracer,
            engine: EngineConfig { max_call_depth },
        })
    }
}
