//! Pulse-width output boundary.
//!
//! The control loop never touches timer registers directly: it hands a width
//! and a channel to an [`Actuator`], which validates the channel, saturates the
//! width to the hardware-safe range and forwards it to a [`PwmOutput`].

use crate::channel::Channel;
use crate::config::HW_RANGE;

/// Inclusive pulse-width window. `min` must not exceed `max`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PulseRange {
    pub min: u16,
    pub max: u16,
}

impl PulseRange {
    pub const fn new(min: u16, max: u16) -> Self {
        debug_assert!(min <= max, "inverted pulse range");
        Self { min, max }
    }

    #[inline]
    pub fn clamp(&self, width: i32) -> u16 {
        width.clamp(self.min as i32, self.max as i32) as u16
    }

    #[inline]
    pub fn clamp_f32(&self, value: f32) -> f32 {
        value.clamp(self.min as f32, self.max as f32)
    }

    #[inline]
    pub fn contains(&self, width: i32) -> bool {
        (self.min as i32..=self.max as i32).contains(&width)
    }
}

/// Hardware sink for one pulse width on one channel.
pub trait PwmOutput {
    fn write_pulse(&mut self, channel: Channel, width: u16);
}

impl<T: PwmOutput + ?Sized> PwmOutput for &mut T {
    fn write_pulse(&mut self, channel: Channel, width: u16) {
        (**self).write_pulse(channel, width)
    }
}

pub struct Actuator<P> {
    output: P,
    limits: PulseRange,
}

impl<P: PwmOutput> Actuator<P> {
    pub fn new(output: P) -> Self {
        Self {
            output,
            limits: HW_RANGE,
        }
    }

    pub fn with_limits(mut self, limits: PulseRange) -> Self {
        self.limits = limits;
        self
    }

    /// Set the pulse for a one-based channel number. Unknown channels are ignored.
    pub fn set_pulse(&mut self, number: u8, width: i32) {
        match Channel::from_number(number) {
            Some(channel) => self.drive(channel, width),
            None => trace!("set_pulse: no channel {}", number),
        }
    }

    #[inline]
    pub fn drive(&mut self, channel: Channel, width: i32) {
        self.output.write_pulse(channel, self.limits.clamp(width));
    }

    pub fn limits(&self) -> PulseRange {
        self.limits
    }

    pub fn output(&self) -> &P {
        &self.output
    }
}
