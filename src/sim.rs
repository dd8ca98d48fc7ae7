//! Host-side stand-ins for the timer and PWM hardware.
//!
//! Lets the control loop run against a virtual clock, e.g. in tests or a
//! desktop simulation, with the same `tick()` the firmware calls from its
//! timer context.

use crate::actuation::PwmOutput;
use crate::channel::{Channel, ChannelMap};

/// Converts elapsed virtual time into the number of control ticks that fell due.
pub struct SimulatedTimer {
    period_ms: u64,
    now_ms: u64,
    next_due_ms: u64,
}

impl SimulatedTimer {
    pub fn new(period_ms: u64) -> Self {
        Self {
            period_ms: period_ms.max(1),
            now_ms: 0,
            next_due_ms: period_ms.max(1),
        }
    }

    /// Advance the clock; returns how many ticks are now due.
    pub fn advance(&mut self, elapsed_ms: u64) -> u32 {
        self.now_ms += elapsed_ms;
        let mut due = 0;
        while self.next_due_ms <= self.now_ms {
            self.next_due_ms += self.period_ms;
            due += 1;
        }
        due
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }
}

/// PWM sink that remembers the last width written per channel.
#[derive(Clone, Debug)]
pub struct RecordingOutput {
    last: ChannelMap<Option<u16>>,
    writes: usize,
}

impl RecordingOutput {
    pub fn new() -> Self {
        Self {
            last: ChannelMap::splat(None),
            writes: 0,
        }
    }

    pub fn last(&self, channel: Channel) -> Option<u16> {
        self.last[channel]
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl Default for RecordingOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl PwmOutput for RecordingOutput {
    fn write_pulse(&mut self, channel: Channel, width: u16) {
        self.last[channel] = Some(width);
        self.writes += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_counts_whole_periods() {
        let mut t = SimulatedTimer::new(10);
        assert_eq!(t.advance(9), 0);
        assert_eq!(t.advance(1), 1);
        assert_eq!(t.advance(35), 3);
        assert_eq!(t.advance(5), 1);
        assert_eq!(t.now_ms(), 50);
    }
}
