use serde::{Deserialize, Serialize};

/// Default numeric editor range: what a 32-bit signed spin box can hold.
pub const DEFAULT_INT_RANGE: (i64, i64) = (-(1 << 31), (1 << 31) - 1);
pub const DEFAULT_FLOAT_RANGE: (f64, f64) = (-2_147_483_648.0, 2_147_483_647.0);
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Knobs the dispatcher and the form driver read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormSettings {
    /// Window / dialog title.
    pub title: String,
    pub int_range: (i64, i64),
    pub float_range: (f64, f64),
    /// Hard limit on nesting while building the editor tree.
    pub max_depth: usize,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            title: "Input Dialog".to_string(),
            int_range: DEFAULT_INT_RANGE,
            float_range: DEFAULT_FLOAT_RANGE,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl FormSettings {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
