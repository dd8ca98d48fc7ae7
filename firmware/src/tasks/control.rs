use defmt::{info, warn};
use embassy_executor::task;
use embassy_time::{Duration, Instant, Ticker};

use servo_rig::config::{CONTROL_BUDGET_US, CONTROL_PERIOD_MS};
use servo_rig::ControlScheduler;

use super::SystemAlert;
use crate::drivers::ServoPwm;
use crate::ipc::{LOOP_STATS, SYSTEM_CH, TELEMETRY};

/// 100Hz control tick. Runs on the interrupt executor so it preempts link decoding.
#[task]
pub async fn control_task(mut scheduler: ControlScheduler<'static, ServoPwm>) {
    info!("Control task started - {}ms period", CONTROL_PERIOD_MS);
    let mut ticker = Ticker::every(Duration::from_millis(CONTROL_PERIOD_MS));

    loop {
        ticker.next().await;
        let cycle_start = Instant::now();

        scheduler.tick();
        TELEMETRY.publish(scheduler.snapshot());

        let exec_us = cycle_start.elapsed().as_micros() as u32;
        if LOOP_STATS.record(exec_us, CONTROL_BUDGET_US) {
            warn!("Control tick overran: {}us", exec_us);
            SYSTEM_CH
                .try_send(SystemAlert::ControlOverrun { exec_us })
                .ok();
        }
    }
}
