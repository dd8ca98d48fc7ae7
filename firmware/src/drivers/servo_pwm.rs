//! Six hobby-servo outputs on two general-purpose timers.
//! ===========================================================
//!
//! Widths arrive in 0.5us counts of a 20ms frame (`PWM_PERIOD_TICKS`) and are
//! rescaled to whatever resolution the timer ended up with after embassy
//! picked a prescaler for 50Hz.

use embassy_stm32::peripherals::{TIM3, TIM4};
use embassy_stm32::timer::simple_pwm::SimplePwm;
use embassy_stm32::timer::{Channel as TimChannel, GeneralInstance4Channel};

use servo_rig::config::{PULSE_NEUTRAL, PWM_PERIOD_TICKS};
use servo_rig::{Channel, PwmOutput};

pub struct ServoPwm {
    tim3: SimplePwm<'static, TIM3>,
    tim4: SimplePwm<'static, TIM4>,
}

impl ServoPwm {
    /// Enable all six outputs at the neutral pulse.
    pub fn new(tim3: SimplePwm<'static, TIM3>, tim4: SimplePwm<'static, TIM4>) -> Self {
        let mut pwm = Self { tim3, tim4 };
        for channel in Channel::ALL {
            pwm.write_pulse(channel, PULSE_NEUTRAL);
            match Self::route(channel) {
                (ch, true) => pwm.tim3.channel(ch).enable(),
                (ch, false) => pwm.tim4.channel(ch).enable(),
            }
        }
        pwm
    }

    /// Timer channel for a servo and whether it lives on TIM3.
    fn route(channel: Channel) -> (TimChannel, bool) {
        match channel {
            Channel::S1 => (TimChannel::Ch1, true),
            Channel::S2 => (TimChannel::Ch2, true),
            Channel::S3 => (TimChannel::Ch3, true),
            Channel::S4 => (TimChannel::Ch4, true),
            Channel::S5 => (TimChannel::Ch1, false),
            Channel::S6 => (TimChannel::Ch2, false),
        }
    }

    fn set<T: GeneralInstance4Channel>(pwm: &mut SimplePwm<'static, T>, ch: TimChannel, width: u16) {
        let mut out = pwm.channel(ch);
        let max = out.max_duty_cycle() as u32;
        out.set_duty_cycle(Self::duty_for(width, max));
    }

    /// Scale a width in frame counts to a compare value on a timer with `max` steps.
    #[inline]
    fn duty_for(width: u16, max: u32) -> u16 {
        (width as u32 * max / PWM_PERIOD_TICKS).min(max - 1) as u16
    }
}

impl PwmOutput for ServoPwm {
    fn write_pulse(&mut self, channel: Channel, width: u16) {
        let (ch, on_tim3) = Self::route(channel);
        if on_tim3 {
            Self::set(&mut self.tim3, ch, width);
        } else {
            Self::set(&mut self.tim4, ch, width);
        }
    }
}
