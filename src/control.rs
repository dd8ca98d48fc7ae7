//! Periodic control step tying setpoints, PID and actuation together.
//!
//! [`ControlScheduler::tick`] is meant to be called once per control period
//! from a single context (a timer interrupt or a high-priority task). It owns
//! every PID and channel state; the only thing it shares is the setpoint pair,
//! which it reads once per tick.
//!
//! Typical usage pattern:
//!
//! ```no_run
//! # use servo_rig::{actuation::Actuator, config::LoopConfig, control::ControlScheduler};
//! # use servo_rig::{shared::{SetpointRegisters, Setpoints}, sim::RecordingOutput};
//! static SETPOINTS: SetpointRegisters = SetpointRegisters::new(Setpoints::NEUTRAL);
//!
//! let mut scheduler =
//!     ControlScheduler::new(LoopConfig::default(), &SETPOINTS, Actuator::new(RecordingOutput::new()));
//! loop {
//!     // wait for the next 10ms tick
//!     scheduler.tick();
//! }
//! ```

use crate::actuation::{Actuator, PwmOutput};
use crate::channel::{Channel, ChannelMap};
use crate::config::{LoopConfig, PULSE_NEUTRAL};
use crate::pid::PidBank;
use crate::shared::{SetpointRegisters, Setpoints};

/// Setpoint register axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    X,
    Y,
}

/// Where a channel takes its target from each tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TargetSource {
    /// Follow one of the link-driven setpoint registers.
    Setpoint(Axis),
    /// Hold the locally configured target.
    Hold,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlMode {
    /// Closed loop: PID output is integrated onto the position.
    Pid,
    /// Jump straight to the clamped target; used to find the servo end stops.
    Passthrough,
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelState {
    pub current_position: f32,
    pub target_position: f32,
    pub velocity: f32,
}

impl ChannelState {
    pub const NEUTRAL: Self = Self {
        current_position: PULSE_NEUTRAL as f32,
        target_position: PULSE_NEUTRAL as f32,
        velocity: 0.0,
    };
}

/// Read-only view of the loop handed to display/telemetry collaborators.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TelemetrySnapshot {
    pub tick: u32,
    pub setpoints: Setpoints,
    pub channels: ChannelMap<ChannelState>,
}

impl TelemetrySnapshot {
    pub const INITIAL: Self = Self {
        tick: 0,
        setpoints: Setpoints::NEUTRAL,
        channels: ChannelMap::splat(ChannelState::NEUTRAL),
    };
}

pub struct ControlScheduler<'a, P> {
    config: LoopConfig,
    pids: PidBank,
    channels: ChannelMap<ChannelState>,
    setpoints: &'a SetpointRegisters,
    last_setpoints: Setpoints,
    actuator: Actuator<P>,
    ticks: u32,
}

impl<'a, P: PwmOutput> ControlScheduler<'a, P> {
    pub fn new(config: LoopConfig, setpoints: &'a SetpointRegisters, actuator: Actuator<P>) -> Self {
        info!(
            "control loop: mode={:?} range=[{}, {}]",
            config.mode,
            config.target_range.min,
            config.target_range.max
        );
        Self {
            pids: PidBank::new(&config.gains, config.integral),
            config,
            channels: ChannelMap::splat(ChannelState::NEUTRAL),
            setpoints,
            last_setpoints: Setpoints::NEUTRAL,
            actuator,
            ticks: 0,
        }
    }

    /// Run one control period for every channel.
    pub fn tick(&mut self) {
        // One snapshot per tick so both axes come from the same frame.
        let setpoints = self.setpoints.snapshot();
        let range = self.config.target_range;

        for channel in Channel::ALL {
            let raw = match self.config.sources[channel] {
                TargetSource::Setpoint(axis) => setpoints.axis(axis),
                TargetSource::Hold => self.config.hold_targets[channel],
            };
            let target = range.clamp_f32(raw);

            let state = &mut self.channels[channel];
            state.target_position = target;
            state.velocity = match self.config.mode {
                ControlMode::Pid => self.pids.compute(channel, target, state.current_position),
                ControlMode::Passthrough => target - state.current_position,
            };
            state.current_position += state.velocity;

            let width = range.clamp_f32(state.current_position) as i32;
            self.actuator.drive(channel, width);
        }

        self.last_setpoints = setpoints;
        self.ticks = self.ticks.wrapping_add(1);
    }

    /// Change the target of a channel routed to [`TargetSource::Hold`].
    pub fn set_hold_target(&mut self, channel: Channel, target: f32) {
        self.config.hold_targets[channel] = target;
    }

    /// Switch modes; PID history is discarded so the new mode starts clean.
    pub fn set_mode(&mut self, mode: ControlMode) {
        if mode != self.config.mode {
            debug!("control mode {:?} -> {:?}", self.config.mode, mode);
            self.config.mode = mode;
            self.pids.reset();
        }
    }

    pub fn mode(&self) -> ControlMode {
        self.config.mode
    }

    pub fn state(&self, channel: Channel) -> ChannelState {
        self.channels[channel]
    }

    pub fn pids(&self) -> &PidBank {
        &self.pids
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn actuator(&self) -> &Actuator<P> {
        &self.actuator
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            tick: self.ticks,
            setpoints: self.last_setpoints,
            channels: self.channels,
        }
    }
}
