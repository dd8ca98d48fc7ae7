//! State shared between execution contexts.
//!
//! The link receiver writes the setpoint pair while the control tick, which
//! runs at a higher interrupt priority, reads it. Both sides go through a
//! critical section, so the tick always sees X and Y from the same frame.
//! Diagnostic counters are single atomics and need no lock.

use core::cell::Cell;

use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex as RawMutex, Mutex};
use portable_atomic::{AtomicU32, Ordering};

use crate::config::PULSE_NEUTRAL;
use crate::control::{Axis, TelemetrySnapshot};
use crate::protocol::{Displacement, FrameError};

/// Externally commanded targets, in pulse units.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Setpoints {
    pub x: f32,
    pub y: f32,
}

impl Setpoints {
    pub const NEUTRAL: Self = Self {
        x: PULSE_NEUTRAL as f32,
        y: PULSE_NEUTRAL as f32,
    };

    #[inline]
    pub fn axis(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }
}

/// Setpoint accumulators written by the frame receiver, read by the control tick.
///
/// Values are not clamped here; the reader saturates them to the actuation range.
pub struct SetpointRegisters {
    inner: Mutex<RawMutex, Cell<Setpoints>>,
}

impl SetpointRegisters {
    pub const fn new(initial: Setpoints) -> Self {
        Self {
            inner: Mutex::new(Cell::new(initial)),
        }
    }

    /// Add a decoded displacement onto both accumulators as one update.
    pub fn accumulate(&self, d: Displacement) {
        self.inner.lock(|cell| {
            let mut sp = cell.get();
            sp.x += d.dx as f32;
            sp.y += d.dy as f32;
            cell.set(sp);
        });
    }

    pub fn store(&self, setpoints: Setpoints) {
        self.inner.lock(|cell| cell.set(setpoints));
    }

    pub fn snapshot(&self) -> Setpoints {
        self.inner.lock(|cell| cell.get())
    }
}

/// Latest control-loop snapshot for display and telemetry readers.
pub struct TelemetryCell {
    inner: Mutex<RawMutex, Cell<TelemetrySnapshot>>,
}

impl TelemetryCell {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Cell::new(TelemetrySnapshot::INITIAL)),
        }
    }

    pub fn publish(&self, snapshot: TelemetrySnapshot) {
        self.inner.lock(|cell| cell.set(snapshot));
    }

    pub fn latest(&self) -> TelemetrySnapshot {
        self.inner.lock(|cell| cell.get())
    }
}

impl Default for TelemetryCell {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkCounters {
    pub frames: u32,
    pub checksum_failures: u32,
    pub terminator_failures: u32,
}

/// Frame receiver diagnostics.
pub struct LinkStats {
    frames: AtomicU32,
    checksum_failures: AtomicU32,
    terminator_failures: AtomicU32,
}

impl LinkStats {
    pub const fn new() -> Self {
        Self {
            frames: AtomicU32::new(0),
            checksum_failures: AtomicU32::new(0),
            terminator_failures: AtomicU32::new(0),
        }
    }

    pub fn record_frame(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self, error: FrameError) {
        let counter = match error {
            FrameError::BadChecksum => &self.checksum_failures,
            FrameError::BadTerminator => &self.terminator_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> LinkCounters {
        LinkCounters {
            frames: self.frames.load(Ordering::Relaxed),
            checksum_failures: self.checksum_failures.load(Ordering::Relaxed),
            terminator_failures: self.terminator_failures.load(Ordering::Relaxed),
        }
    }
}

impl Default for LinkStats {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LoopCounters {
    pub ticks: u32,
    pub overruns: u32,
    pub max_exec_us: u32,
}

/// Control tick timing diagnostics. Overruns are counted, not acted on.
pub struct LoopStats {
    ticks: AtomicU32,
    overruns: AtomicU32,
    max_exec_us: AtomicU32,
}

impl LoopStats {
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU32::new(0),
            overruns: AtomicU32::new(0),
            max_exec_us: AtomicU32::new(0),
        }
    }

    /// Record one tick; returns `true` if it blew its budget.
    pub fn record(&self, exec_us: u32, budget_us: u32) -> bool {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        self.max_exec_us.fetch_max(exec_us, Ordering::Relaxed);
        let overrun = exec_us > budget_us;
        if overrun {
            self.overruns.fetch_add(1, Ordering::Relaxed);
        }
        overrun
    }

    pub fn snapshot(&self) -> LoopCounters {
        LoopCounters {
            ticks: self.ticks.load(Ordering::Relaxed),
            overruns: self.overruns.load(Ordering::Relaxed),
            max_exec_us: self.max_exec_us.load(Ordering::Relaxed),
        }
    }

    /// Reset the worst-case window, like a stats period rollover.
    pub fn reset_max(&self) -> u32 {
        self.max_exec_us.swap(0, Ordering::Relaxed)
    }
}

impl Default for LoopStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulate_is_relative() {
        let regs = SetpointRegisters::new(Setpoints::NEUTRAL);
        regs.accumulate(Displacement::new(10, 5));
        regs.accumulate(Displacement::new(-20, 0));
        assert_eq!(regs.snapshot(), Setpoints { x: 2990.0, y: 3005.0 });

        regs.store(Setpoints { x: 0.0, y: 1.0 });
        assert_eq!(regs.snapshot().axis(Axis::Y), 1.0);
    }

    #[test]
    fn accumulators_are_not_clamped() {
        let regs = SetpointRegisters::new(Setpoints::NEUTRAL);
        for _ in 0..10 {
            regs.accumulate(Displacement::new(1000, -1000));
        }
        assert_eq!(regs.snapshot(), Setpoints { x: 13_000.0, y: -7_000.0 });
    }

    #[test]
    fn concurrent_reader_never_sees_a_torn_pair() {
        // Writer keeps x + y constant; any torn read would break the sum.
        static REGS: SetpointRegisters = SetpointRegisters::new(Setpoints { x: 0.0, y: 0.0 });

        let writer = std::thread::spawn(|| {
            for i in 0..20_000 {
                let d = if i % 2 == 0 { 7 } else { -7 };
                REGS.accumulate(Displacement::new(d, -d));
            }
        });
        for _ in 0..20_000 {
            let sp = REGS.snapshot();
            assert_eq!(sp.x + sp.y, 0.0);
        }
        writer.join().unwrap();
    }

    #[test]
    fn link_counters() {
        let stats = LinkStats::new();
        stats.record_frame();
        stats.record_rejected(FrameError::BadChecksum);
        stats.record_rejected(FrameError::BadTerminator);
        stats.record_rejected(FrameError::BadTerminator);

        assert_eq!(
            stats.snapshot(),
            LinkCounters {
                frames: 1,
                checksum_failures: 1,
                terminator_failures: 2,
            }
        );
    }

    #[test]
    fn loop_overruns_are_counted() {
        let stats = LoopStats::new();
        assert!(!stats.record(800, 10_000));
        assert!(stats.record(12_000, 10_000));
        assert!(!stats.record(900, 10_000));

        let c = stats.snapshot();
        assert_eq!(c.ticks, 3);
        assert_eq!(c.overruns, 1);
        assert_eq!(c.max_exec_us, 12_000);
        assert_eq!(stats.reset_max(), 12_000);
        assert_eq!(stats.snapshot().max_exec_us, 0);
    }

    #[test]
    fn telemetry_cell_returns_latest() {
        let cell = TelemetryCell::new();
        assert_eq!(cell.latest(), TelemetrySnapshot::INITIAL);

        let mut snap = TelemetrySnapshot::INITIAL;
        snap.tick = 9;
        cell.publish(snap);
        assert_eq!(cell.latest().tick, 9);
    }
}
