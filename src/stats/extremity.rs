use serde_derive::{Deserialize, Serialize};

/// Running minimum and maximum of a scalar series.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
#[serde(from = "ExtremitySpan", into = "ExtremitySpan")]
pub struct ExtremityMonitor {
    min: f64,
    max: f64,
}

/// Wire form of a monitor; infinities have no JSON representation so an
/// untouched bound travels as `None`.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct ExtremitySpan {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Default for ExtremityMonitor {
    fn default() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl ExtremityMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when `value` extended the span.
    pub fn update(&mut self, value: f64) -> bool {
        let mut changed = false;
        if value < self.min {
            self.min = value;
            changed = true;
        }
        if value > self.max {
            self.max = value;
            changed = true;
        }
        changed
    }

    pub fn set(&mut self, min: f64, max: f64) {
        self.min = min;
        self.max = max;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn has_data(&self) -> bool {
        self.min != f64::INFINITY && self.max != f64::NEG_INFINITY
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Folds another monitor's span into this one.
    pub fn absorb(&mut self, other: &ExtremityMonitor) {
        if other.has_data() {
            self.update(other.min);
            self.update(other.max);
        }
    }
}

impl From<ExtremitySpan> for ExtremityMonitor {
    fn from(span: ExtremitySpan) -> Self {
        Self {
            min: span.min.unwrap_or(f64::INFINITY),
            max: span.max.unwrap_or(f64::NEG_INFINITY),
        }
    }
}

impl From<ExtremityMonitor> for ExtremitySpan {
    fn from(monitor: ExtremityMonitor) -> Self {
        Self {
            min: monitor.min.is_finite().then_some(monitor.min),
            max: monitor.max.is_finite().then_some(monitor.max),
        }
    }
}
