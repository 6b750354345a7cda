//! The RTP-MIDI sample clock (AppleMIDI's "CK" timestamps run at 10kHz by convention, but any
//! participant can choose another rate during the handshake). A session keeps one clock, anchored
//! to the instant the session started, and derives every outgoing timestamp from it.

use std::time::Instant;
use zerocopy::network_endian::U32;

/// Default AppleMIDI sample rate: 10kHz, i.e. a tick every 100 microseconds.
pub const DEFAULT_RATE_HZ: u32 = 10_000;

#[derive(Debug, Clone, Copy)]
pub struct Clock {
    epoch: Instant,
    rate_hz: u32,
}

impl Clock {
    pub fn new(rate_hz: u32) -> Self {
        Clock { epoch: Instant::now(), rate_hz }
    }

    /// The current time, in clock ticks since the session started. This is a plain `i64` rather
    /// than the wire's `U64`/`U32` so callers can do signed arithmetic (e.g. round-trip latency)
    /// without worrying about wraparound.
    pub fn now(&self) -> i64 {
        let elapsed = self.epoch.elapsed();
        let ticks = elapsed.as_secs_f64() * f64::from(self.rate_hz);
        ticks as i64
    }

    /// The low 32 bits of `now()`, as used in the RTP-MIDI packet header's timestamp field.
    pub fn now_u32(&self) -> U32 {
        U32::new(self.now() as u32)
    }
}

impl Default for Clock {
    fn default() -> Self {
        Clock::new(DEFAULT_RATE_HZ)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn now_starts_near_zero() {
        let clock = Clock::new(DEFAULT_RATE_HZ);
        assert!(clock.now() < 100);
    }

    #[test]
    fn now_advances_monotonically() {
        let clock = Clock::new(DEFAULT_RATE_HZ);
        let first = clock.now();
        sleep(Duration::from_millis(5));
        let second = clock.now();
        assert!(second > first);
    }

    #[test]
    fn now_u32_matches_now_low_bits() {
        let clock = Clock::new(DEFAULT_RATE_HZ);
        assert_eq!(clock.now_u32().get(), clock.now() as u32);
    }
}
