// Centralize all configuration constants
use crate::actuation::PulseRange;
use crate::channel::{Channel, ChannelMap};
use crate::control::{Axis, ControlMode, TargetSource};
use crate::pid::{IntegralPolicy, PidGains};

pub const CHANNEL_COUNT: usize = 6;

// Control loop timing
pub const CONTROL_PERIOD_MS: u64 = 10;
pub const CONTROL_BUDGET_US: u32 = CONTROL_PERIOD_MS as u32 * 1000;

// Pulse widths, in timer counts of 0.5us (3000 = 1.5ms)
pub const PULSE_NEUTRAL: u16 = 3000;
pub const TARGET_RANGE: PulseRange = PulseRange::new(2000, 4000);
pub const HW_RANGE: PulseRange = PulseRange::new(1500, 4000);

// Servo PWM: 50Hz frame, 40_000 counts per 20ms period
pub const PWM_FREQUENCY_HZ: u32 = 50;
pub const PWM_PERIOD_TICKS: u32 = 40_000;

// Sensor link
pub const LINK_BAUDRATE: u32 = 115_200;
pub const LINK_ECHO: bool = true;
pub const LINK_RX_BUFFER_SIZE: usize = 64;
pub const LINK_TX_BUFFER_SIZE: usize = 64;

// Converts gains expressed in percent into a per-tick position delta
pub const PID_OUTPUT_SCALE: f32 = 100.0;

pub const DEFAULT_GAINS: [PidGains; CHANNEL_COUNT] = [
    PidGains::new(2.5, 0.0, 15.0),
    PidGains::new(2.5, 0.0, 15.0),
    PidGains::new(1.0, 0.0, 0.0),
    PidGains::new(1.0, 0.0, 0.0),
    PidGains::new(1.0, 0.0, 0.0),
    PidGains::new(1.0, 0.0, 0.0),
];

// Diagnostics
pub const STATS_REPORT_INTERVAL_MS: u64 = 1000;
pub const ALERT_CHANNEL_SIZE: usize = 8;

/// Runtime configuration of the control loop.
///
/// `Default` reproduces the baseline rig: S1 follows the X setpoint, S2 the Y
/// setpoint, the remaining channels hold neutral, and the integral term is
/// left unbounded.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LoopConfig {
    pub gains: ChannelMap<PidGains>,
    pub integral: IntegralPolicy,
    pub mode: ControlMode,
    pub sources: ChannelMap<TargetSource>,
    pub target_range: PulseRange,
    pub hold_targets: ChannelMap<f32>,
}

impl LoopConfig {
    /// Route `channel` to one of the setpoint axes.
    pub fn with_axis(mut self, channel: Channel, axis: Axis) -> Self {
        self.sources[channel] = TargetSource::Setpoint(axis);
        self
    }

    pub fn with_integral_policy(mut self, policy: IntegralPolicy) -> Self {
        self.integral = policy;
        self
    }

    pub fn with_mode(mut self, mode: ControlMode) -> Self {
        self.mode = mode;
        self
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        let mut sources = ChannelMap::splat(TargetSource::Hold);
        sources[Channel::S1] = TargetSource::Setpoint(Axis::X);
        sources[Channel::S2] = TargetSource::Setpoint(Axis::Y);

        Self {
            gains: ChannelMap::new(DEFAULT_GAINS),
            integral: IntegralPolicy::Unbounded,
            mode: ControlMode::Pid,
            sources,
            target_range: TARGET_RANGE,
            hold_targets: ChannelMap::splat(PULSE_NEUTRAL as f32),
        }
    }
}
