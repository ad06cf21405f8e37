use crate::util::{counters::WrapAwareCounter, ring_buffer::RingBuffer};

#[derive(Debug, Clone, Copy)]
struct HistoryEntry {
    system_time_ms: i64,
    counter: u16,
    sensor_time: u16,
}

/// Events per minute from a cumulative 16-bit event counter and a 16-bit
/// event timer in 1/1024 s, as sent by ANT+ cadence and wheel sensors.
///
/// When the counter stops changing the last rate is kept until it becomes
/// implausibly old, then it decays towards 0 based on recent history.
#[derive(Debug, Clone)]
pub struct RevolutionRateCounter {
    counter: Option<u16>,
    events_per_minute: f64,
    history: RingBuffer<HistoryEntry>,
}

impl Default for RevolutionRateCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl RevolutionRateCounter {
    const HISTORY_LENGTH_MS: i64 = 5_000;
    const HISTORY_MAX_LENGTH: usize = 100;
    const ONE_MINUTE_MS: f64 = 60_000.0;
    pub const SENSOR_TIME_RESOLUTION: f64 = 1024.0;

    pub fn new() -> Self {
        Self {
            counter: None,
            events_per_minute: 0.0,
            history: RingBuffer::new(RevolutionRateCounter::HISTORY_MAX_LENGTH),
        }
    }

    pub fn events_per_minute(&mut self, new_counter: u16, sensor_time: u16, now_ms: i64) -> f64 {
        let Some(previous) = self.counter.replace(new_counter) else {
            self.events_per_minute = 0.0;
            return 0.0;
        };

        if WrapAwareCounter::diff_u16(new_counter, previous) != 0 {
            if self.drop_old_history(now_ms) {
                if let Some(last) = self.history.back() {
                    let sensor_change = WrapAwareCounter::diff_u16(sensor_time, last.sensor_time);
                    if sensor_change > 0 {
                        let counter_change = WrapAwareCounter::diff_u16(new_counter, last.counter);
                        self.events_per_minute = counter_change as f64
                            * RevolutionRateCounter::SENSOR_TIME_RESOLUTION
                            * 60.0
                            / sensor_change as f64;
                    }
                }
            }
            self.history.push(HistoryEntry {
                system_time_ms: now_ms,
                counter: new_counter,
                sensor_time,
            });
        } else if let Some(last) = self.history.back() {
            let idle_ms = (now_ms - last.system_time_ms) as f64;
            if idle_ms * self.events_per_minute > RevolutionRateCounter::ONE_MINUTE_MS {
                // Overdue for the next event: estimate from what is left
                return self.value_from_history(now_ms);
            }
        } else {
            self.events_per_minute = 0.0;
        }

        self.events_per_minute
    }

    fn value_from_history(&mut self, now_ms: i64) -> f64 {
        if !self.drop_old_history(now_ms) {
            self.events_per_minute = 0.0;
            return 0.0;
        }

        let (Some(first), Some(last)) = (self.history.front(), self.history.back()) else {
            return 0.0;
        };
        let counter = self.counter.unwrap_or(last.counter);

        let sensor_change = WrapAwareCounter::diff_u16(last.sensor_time, first.sensor_time);
        let counter_change = WrapAwareCounter::diff_u16(counter, first.counter);
        let system_change_ms = (now_ms - last.system_time_ms) as f64
            + sensor_change as f64 * 1000.0 / RevolutionRateCounter::SENSOR_TIME_RESOLUTION;
        if system_change_ms <= 0.0 {
            return self.events_per_minute;
        }

        let estimate = counter_change as f64 * RevolutionRateCounter::ONE_MINUTE_MS / system_change_ms;
        estimate.min(self.events_per_minute)
    }

    /// Returns whether any history is left.
    fn drop_old_history(&mut self, now_ms: i64) -> bool {
        self.history.drop_front_while(|entry| {
            now_ms - entry.system_time_ms > RevolutionRateCounter::HISTORY_LENGTH_MS
        });
        !self.history.is_empty()
    }
}
