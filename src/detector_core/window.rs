//! Lookback horizons and trailing-window statistics

use serde::{Deserialize, Serialize};

/// Fewest valid points a window needs before it yields a statistic
pub const MIN_WINDOW_POINTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Horizon {
    Short,
    Medium,
    Long,
}

impl Horizon {
    pub fn as_str(&self) -> &'static str {
        match self {
            Horizon::Short => "short",
            Horizon::Medium => "medium",
            Horizon::Long => "long",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "short" => Some(Horizon::Short),
            "medium" => Some(Horizon::Medium),
            "long" => Some(Horizon::Long),
            _ => None,
        }
    }

    pub fn all() -> [Horizon; 3] {
        [Horizon::Short, Horizon::Medium, Horizon::Long]
    }
}

/// Window length, in observations, of each horizon
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HorizonLengths {
    pub short: usize,
    pub medium: usize,
    pub long: usize,
}

impl HorizonLengths {
    pub fn length(&self, horizon: Horizon) -> usize {
        match horizon {
            Horizon::Short => self.short,
            Horizon::Medium => self.medium,
            Horizon::Long => self.long,
        }
    }
}

impl Default for HorizonLengths {
    fn default() -> Self {
        Self {
            short: 5,
            medium: 20,
            long: 252,
        }
    }
}

/// Count, mean and sample standard deviation of one window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStats {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
}

impl WindowStats {
    /// Two-pass mean and sample (n - 1) standard deviation. None for an
    /// empty window; a single point has a standard deviation of zero.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;

        let std_dev = if values.len() > 1 {
            let sq_diff: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (sq_diff / (n - 1.0)).sqrt()
        } else {
            0.0
        };

        Some(Self {
            count: values.len(),
            mean,
            std_dev,
        })
    }

    /// Standardized deviation of `value`, floored to 0.0 when the window is
    /// too short or its spread is zero or not finite
    pub fn z_score(&self, value: f64) -> f64 {
        if self.count < MIN_WINDOW_POINTS || !self.std_dev.is_finite() || self.std_dev <= 0.0 {
            return 0.0;
        }
        let z = (value - self.mean) / self.std_dev;
        if z.is_finite() {
            z
        } else {
            0.0
        }
    }
}

/// Valid values of the window of at most `len` slots ending just before `end`
pub fn trailing(values: &[Option<f64>], end: usize, len: usize) -> Vec<f64> {
    let end = end.min(values.len());
    let start = end.saturating_sub(len);
    values[start..end]
        .iter()
        .filter_map(|v| *v)
        .filter(|v| v.is_finite())
        .collect()
}
