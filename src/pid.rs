//! Per-channel PID control law.
//!
//! The controller is positional: it takes a target and the current position
//! and returns a position delta for this tick. There is no `dt` argument; the
//! integral and derivative terms assume the caller runs it at a fixed cadence.
//! Works in `no_std` and does not allocate memory.

use crate::channel::{Channel, ChannelMap};
use crate::config::PID_OUTPUT_SCALE;

/// Tuning constants, expressed in percent of the error per tick.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PidGains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

impl PidGains {
    pub const fn new(kp: f32, ki: f32, kd: f32) -> Self {
        Self { kp, ki, kd }
    }
}

/// What happens to the integral accumulator after each tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IntegralPolicy {
    /// Accumulate without limit (baseline rig behaviour, winds up).
    #[default]
    Unbounded,
    /// Saturate the accumulator to `[min, max]`.
    Clamped { min: f32, max: f32 },
}

/// Single-axis PID controller.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pid {
    gains: PidGains,
    policy: IntegralPolicy,

    /// Error of the most recent tick
    error: f32,
    /// Error of the tick before, for the derivative term
    previous_error: f32,
    /// Integrator state
    integral: f32,
    /// Last computed delta
    last_output: f32,
}

impl Pid {
    pub const fn new(gains: PidGains) -> Self {
        Self {
            gains,
            policy: IntegralPolicy::Unbounded,
            error: 0.0,
            previous_error: 0.0,
            integral: 0.0,
            last_output: 0.0,
        }
    }

    /// Set the anti-windup policy.
    pub fn with_integral_policy(mut self, policy: IntegralPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Reset integrator and derivative history.
    pub fn reset(&mut self) {
        self.error = 0.0;
        self.previous_error = 0.0;
        self.integral = 0.0;
        self.last_output = 0.0;
    }

    /// Run one tick and return the position delta.
    ///
    /// `output = (kp * e + ki * sum(e) + kd * (e - e_prev)) / 100`
    pub fn compute(&mut self, target: f32, current: f32) -> f32 {
        self.error = target - current;

        self.integral += self.error;
        if let IntegralPolicy::Clamped { min, max } = self.policy {
            self.integral = self.integral.clamp(min, max);
        }

        let p = self.gains.kp * self.error;
        let i = self.gains.ki * self.integral;
        let d = self.gains.kd * (self.error - self.previous_error);
        self.last_output = (p + i + d) / PID_OUTPUT_SCALE;

        self.previous_error = self.error;
        self.last_output
    }

    #[inline]
    pub fn error(&self) -> f32 {
        self.error
    }

    #[inline]
    pub fn previous_error(&self) -> f32 {
        self.previous_error
    }

    #[inline]
    pub fn integral(&self) -> f32 {
        self.integral
    }

    #[inline]
    pub fn last_output(&self) -> f32 {
        self.last_output
    }
}

/// One [`Pid`] per servo channel.
#[derive(Clone, Debug)]
pub struct PidBank {
    channels: ChannelMap<Pid>,
}

impl PidBank {
    pub fn new(gains: &ChannelMap<PidGains>, policy: IntegralPolicy) -> Self {
        Self {
            channels: gains.map(|g| Pid::new(g).with_integral_policy(policy)),
        }
    }

    #[inline]
    pub fn compute(&mut self, channel: Channel, target: f32, current: f32) -> f32 {
        self.channels[channel].compute(target, current)
    }

    pub fn channel(&self, channel: Channel) -> &Pid {
        &self.channels[channel]
    }

    pub fn reset(&mut self) {
        for (_, pid) in self.channels.iter_mut() {
            pid.reset();
        }
    }
}
