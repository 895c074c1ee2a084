//! Runtime configuration.
//!
//! Environment overrides:
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `SPARK_FIBER_SLICE_MS` | work-loop budget per tick | `5` |
//! | `SPARK_FIBER_POLL_MS` | input poll timeout per tick | `16` |
//! | `SPARK_FIBER_RENDER_MODE` | `fullscreen` or `inline` | `fullscreen` |

use std::str::FromStr;
use std::time::Duration;

pub const SLICE_ENV: &str = "SPARK_FIBER_SLICE_MS";
pub const POLL_ENV: &str = "SPARK_FIBER_POLL_MS";
pub const RENDER_MODE_ENV: &str = "SPARK_FIBER_RENDER_MODE";

/// How the terminal runtime uses the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Alternate screen buffer, full terminal control.
    #[default]
    Fullscreen,
    /// Draws below the cursor in the normal buffer, updating in place.
    Inline,
}

impl FromStr for RenderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fullscreen" => Ok(RenderMode::Fullscreen),
            "inline" => Ok(RenderMode::Inline),
            other => Err(format!("unknown render mode `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Time budget handed to the work loop each tick.
    pub slice_budget: Duration,
    /// How long a tick waits for input.
    pub poll_interval: Duration,
    pub render_mode: RenderMode,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            slice_budget: Duration::from_millis(5),
            poll_interval: Duration::from_millis(16),
            render_mode: RenderMode::Fullscreen,
        }
    }
}

impl RuntimeConfig {
    pub fn with_slice_budget(mut self, budget: Duration) -> Self {
        self.slice_budget = budget;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_render_mode(mut self, mode: RenderMode) -> Self {
        self.render_mode = mode;
        self
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults with overrides from `lookup`. Unparseable values are logged
    /// and skipped.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(ms) = parse_millis(&lookup, SLICE_ENV) {
            config.slice_budget = ms;
        }
        if let Some(ms) = parse_millis(&lookup, POLL_ENV) {
            config.poll_interval = ms;
        }
        if let Some(raw) = lookup(RENDER_MODE_ENV) {
            match raw.parse() {
                Ok(mode) => config.render_mode = mode,
                Err(err) => tracing::warn!(var = RENDER_MODE_ENV, %err, "ignoring"),
            }
        }

        config
    }
}

fn parse_millis(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<Duration> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(ms) => Some(Duration::from_millis(ms)),
        Err(err) => {
            tracing::warn!(var = key, value = %raw, %err, "ignoring");
            None
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
