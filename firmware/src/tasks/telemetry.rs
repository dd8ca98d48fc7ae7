use defmt::{info, warn};
use embassy_executor::task;
use embassy_time::{Duration, Ticker};

use servo_rig::config::STATS_REPORT_INTERVAL_MS;
use servo_rig::Channel;

use crate::ipc::{LINK_STATS, LOOP_STATS, SYSTEM_CH, TELEMETRY};

/// Periodic status report; stands in for the display path.
#[task]
pub async fn telemetry_task() {
    info!("Telemetry task started");
    let mut ticker = Ticker::every(Duration::from_millis(STATS_REPORT_INTERVAL_MS));
    let mut last_ticks = 0u32;

    loop {
        ticker.next().await;

        while let Ok(alert) = SYSTEM_CH.try_receive() {
            warn!("Alert: {:?}", alert);
        }

        let snap = TELEMETRY.latest();
        let link = LINK_STATS.snapshot();
        let timing = LOOP_STATS.snapshot();
        let max_exec_us = LOOP_STATS.reset_max();

        info!(
            "Control: {} Hz, max_exec={}us, overruns={} | link frames={} bad_sum={} bad_end={}",
            timing.ticks.wrapping_sub(last_ticks),
            max_exec_us,
            timing.overruns,
            link.frames,
            link.checksum_failures,
            link.terminator_failures
        );
        last_ticks = timing.ticks;

        let s1 = snap.channels[Channel::S1];
        let s2 = snap.channels[Channel::S2];
        info!(
            "Setpoint x={} y={} | S1 pos={} tgt={} | S2 pos={} tgt={}",
            snap.setpoints.x,
            snap.setpoints.y,
            s1.current_position,
            s1.target_position,
            s2.current_position,
            s2.target_position
        );
    }
}
