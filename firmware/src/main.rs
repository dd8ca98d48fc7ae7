#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_stm32::interrupt;
use embassy_stm32::interrupt::{InterruptExt, Priority};
use {defmt_rtt as _, panic_probe as _};

use servo_rig::{Actuator, ControlScheduler, LoopConfig};

mod board;
mod drivers;
mod ipc;
mod tasks;

use board::Board;
use drivers::ServoPwm;
use ipc::SETPOINTS;
use tasks::{control_task, link_rx_task, telemetry_task};

static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

// SPI1 is unused on this board; its vector drives the control executor.
#[interrupt]
unsafe fn SPI1() {
    EXECUTOR_HIGH.on_interrupt()
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Starting servo rig controller");
    let board = Board::init();
    let servos = ServoPwm::new(board.servo_pwm_a, board.servo_pwm_b);
    let scheduler = ControlScheduler::new(LoopConfig::default(), &SETPOINTS, Actuator::new(servos));

    // Control tick above thread mode so it preempts link decoding
    interrupt::SPI1.set_priority(Priority::P6);
    let spawner_high_priority = EXECUTOR_HIGH.start(interrupt::SPI1);
    spawner_high_priority.spawn(control_task(scheduler)).unwrap();
    info!("Control task spawned on high-priority executor");

    spawner
        .spawn(link_rx_task(board.link_rx, board.link_tx))
        .unwrap();
    spawner.spawn(telemetry_task()).unwrap();
    info!("Link and telemetry tasks spawned on main executor");

    core::future::pending::<()>().await;
}
