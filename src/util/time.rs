use std::{fmt::Display, time::Instant};

use crate::logln;

/// Wall-clock timer that reports its label and elapsed time when dropped.
pub struct Benchmark {
    time: Instant,
    label: &'static str,
}

impl Benchmark {
    const CC: &str = "Benchmark";

    pub fn start(label: &'static str) -> Self {
        Self {
            label,
            time: Instant::now(),
        }
    }

    pub fn label(&self) -> &str {
        self.label
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.time.elapsed().as_millis()
    }

    pub fn reset(&mut self) {
        self.time = Instant::now();
    }

    /// Runs `f` under a benchmark named `label` and hands back its result.
    pub fn measure<T, F: FnOnce() -> T>(label: &'static str, f: F) -> T {
        let _benchmark = Benchmark::start(label);
        f()
    }
}

impl Drop for Benchmark {
    fn drop(&mut self) {
        logln!("{}: {}", self.label, self);
    }
}

impl Display for Benchmark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let duration = self.time.elapsed();

        if duration.as_secs() > 60 {
            write!(f, "{:0>2}:{:0>2}min", duration.as_secs() / 60, duration.as_secs() % 60)
        } else {
            write!(f, "{}ms", duration.as_millis())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_returns_result() {
        let sum = Benchmark::measure("sum", || (1..=10).sum::<i32>());
        assert_eq!(sum, 55);
    }

    #[test]
    fn test_display_in_millis() {
        let benchmark = Benchmark::start("fresh");
        assert_eq!(benchmark.label(), "fresh");
        assert!(benchmark.to_string().ends_with("ms"));
    }
}
