#![cfg_attr(not(test), no_std)]

// must come first so the logging macros are visible to the other modules
mod fmt;

pub mod actuation;
pub mod channel;
pub mod config;
pub mod control;
pub mod pid;
pub mod protocol;
pub mod shared;
pub mod sim;

pub use actuation::{Actuator, PulseRange, PwmOutput};
pub use channel::{Channel, ChannelMap};
pub use config::LoopConfig;
pub use control::{ControlMode, ControlScheduler, TelemetrySnapshot};
pub use pid::{Pid, PidBank, PidGains};
pub use protocol::{Displacement, FrameDecoder, FrameReceiver};
pub use shared::{LinkStats, LoopStats, SetpointRegisters, Setpoints, TelemetryCell};
