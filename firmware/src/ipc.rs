use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex as RawMutex, channel::Channel};

use servo_rig::config::ALERT_CHANNEL_SIZE;
use servo_rig::shared::{LinkStats, LoopStats, SetpointRegisters, Setpoints, TelemetryCell};

use crate::tasks::SystemAlert;

/* Link RX task -> control tick */
pub static SETPOINTS: SetpointRegisters = SetpointRegisters::new(Setpoints::NEUTRAL);

/* Control tick -> telemetry readers (display, stats) */
pub static TELEMETRY: TelemetryCell = TelemetryCell::new();

/* diagnostics */
pub static LINK_STATS: LinkStats = LinkStats::new();
pub static LOOP_STATS: LoopStats = LoopStats::new();
pub static SYSTEM_CH: Channel<RawMutex, SystemAlert, ALERT_CHANNEL_SIZE> = Channel::new();
