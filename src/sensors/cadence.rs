use crate::util::ring_buffer::RingBuffer;

/// Rolling stride cadence from a small wrapping hardware stride counter.
///
/// The counter is unwrapped into a cumulative total, and cadence is taken
/// across the whole retained window rather than the last two samples.
#[derive(Debug, Clone)]
pub struct CadenceAverager {
    /// (time in ms, cumulative strides)
    history: RingBuffer<(i64, u64)>,
    modulus: u64,
    last_raw: Option<u64>,
    rollovers: u64,
}

impl Default for CadenceAverager {
    fn default() -> Self {
        Self::new(CadenceAverager::DEFAULT_WINDOW, CadenceAverager::STRIDE_COUNTER_MODULUS)
    }
}

impl CadenceAverager {
    pub const STRIDE_COUNTER_MODULUS: u64 = 128;
    pub const DEFAULT_WINDOW: usize = 10;

    pub fn new(window: usize, modulus: u64) -> Self {
        Self {
            history: RingBuffer::new(window),
            modulus: modulus.max(1),
            last_raw: None,
            rollovers: 0,
        }
    }

    pub fn update(&mut self, raw_count: u64, time_ms: i64) {
        let raw = raw_count % self.modulus;
        if self.last_raw.is_some_and(|last| raw < last) {
            self.rollovers += 1;
        }
        self.last_raw = Some(raw);

        self.history.push((time_ms, raw + self.rollovers * self.modulus));
    }

    /// Strides per minute across the retained window, `None` before the first
    /// sample and 0 while the window spans no time.
    pub fn cadence(&self) -> Option<f64> {
        let (first_time, first_count) = *self.history.front()?;
        let (last_time, last_count) = *self.history.back()?;

        let elapsed_ms = last_time - first_time;
        if elapsed_ms <= 0 {
            return Some(0.0);
        }

        Some((last_count - first_count) as f64 * 60_000.0 / elapsed_ms as f64)
    }

    pub fn reset(&mut self) {
        self.history.clear();
        self.last_raw = None;
        self.rollovers = 0;
    }
}
