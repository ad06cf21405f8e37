use crate::util::ring_buffer::RingBuffer;

/// Mean of the last `window` readings of a noisy signal.
#[derive(Debug, Clone, PartialEq)]
pub struct MovingAverage {
    readings: RingBuffer<f64>,
}

impl MovingAverage {
    pub fn new(window: usize) -> Self {
        Self {
            readings: RingBuffer::new(window),
        }
    }

    pub fn push(&mut self, value: f64) {
        self.readings.push(value);
    }

    /// 0 before the first reading.
    pub fn average(&self) -> f64 {
        self.average_if_any().unwrap_or_default()
    }

    pub fn average_if_any(&self) -> Option<f64> {
        if self.readings.is_empty() {
            return None;
        }

        Some(self.readings.iter().sum::<f64>() / self.readings.len() as f64)
    }

    pub fn is_full(&self) -> bool {
        self.readings.is_full()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn reset(&mut self) {
        self.readings.clear();
    }
}
