//! Observability
//!
//! Every component logs through `tracing` under the `reqscope::*` targets
//! (`reqscope::http`, `reqscope::retry`, `reqscope::scope`). Libraries never
//! install a subscriber on their own; binaries and tests may call
//! [`init_tracing`] once.
//!
//! ## Example
//!
//! ```rust,ignore
//! use reqscope::observability::{init_tracing, OutputFormat, TracingConfig};
//!
//! init_tracing(&TracingConfig::default().with_format(OutputFormat::Json))?;
//! ```

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::defaults;
use crate::error::{RequestError, Result};

/// Output format for tracing logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Multi-line, human-readable
    #[default]
    Pretty,
    /// Single-line text
    Compact,
    /// One JSON object per event
    Json,
}

/// Configuration for the global tracing subscriber
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracingConfig {
    /// Filter directive used when `RUST_LOG` is not set, e.g. `"reqscope=debug"`.
    pub level: String,
    pub format: OutputFormat,
    /// Include the event target in every line
    pub with_target: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: defaults::tracing::DEFAULT_DIRECTIVE.to_string(),
            format: OutputFormat::default(),
            with_target: true,
        }
    }
}

impl TracingConfig {
    /// Debug-level output for this crate only.
    pub fn debug() -> Self {
        Self {
            level: "reqscope=debug".to_string(),
            ..Self::default()
        }
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub const fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub const fn with_target(mut self, with_target: bool) -> Self {
        self.with_target = with_target;
        self
    }

    /// `RUST_LOG` wins over [`level`](Self::level).
    pub fn env_filter(&self) -> Result<EnvFilter> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.level).map_err(|e| {
                RequestError::Configuration(format!(
                    "Invalid tracing directive '{}': {e}",
                    self.level
                ))
            }),
        }
    }
}

/// Install a global `tracing-subscriber` fmt subscriber.
///
/// Fails with [`RequestError::Configuration`] when the directive is invalid or
/// a global subscriber is already set.
pub fn init_tracing(config: &TracingConfig) -> Result<()> {
    let filter = config.env_filter()?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target);

    let init_result = match config.format {
        OutputFormat::Pretty => builder.pretty().try_init(),
        OutputFormat::Compact => builder.compact().try_init(),
        OutputFormat::Json => builder.json().try_init(),
    };

    init_result.map_err(|e| {
        RequestError::Configuration(format!("Failed to initialize tracing subscriber: {e}"))
    })
}
