/// Delta computation for fixed-width hardware counters that wrap back to zero
/// once they reach their maximum.
pub struct WrapAwareCounter;

impl WrapAwareCounter {
    pub const UINT8_MAX: u64 = u8::MAX as u64;
    pub const UINT16_MAX: u64 = u16::MAX as u64;
    pub const UINT32_MAX: u64 = u32::MAX as u64;

    /// Returns `current - previous`, assuming at most one wrap of a counter
    /// whose largest value is `max_value`.
    ///
    /// Readings above `max_value` are reduced modulo `max_value + 1` first,
    /// so out-of-range input gives a delta in range instead of overflowing.
    pub fn diff(current: u64, previous: u64, max_value: u64) -> u64 {
        let modulus = max_value as u128 + 1;
        let current = current as u128 % modulus;
        let previous = previous as u128 % modulus;

        ((current + modulus - previous) % modulus) as u64
    }

    pub fn diff_u8(current: u8, previous: u8) -> u64 {
        Self::diff(current as u64, previous as u64, Self::UINT8_MAX)
    }

    pub fn diff_u16(current: u16, previous: u16) -> u64 {
        Self::diff(current as u64, previous as u64, Self::UINT16_MAX)
    }

    pub fn diff_u32(current: u32, previous: u32) -> u64 {
        Self::diff(current as u64, previous as u64, Self::UINT32_MAX)
    }
}
