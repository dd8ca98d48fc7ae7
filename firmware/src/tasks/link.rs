use defmt::{debug, info, warn};
use embassy_executor::task;
use embassy_stm32::usart::{BufferedUartRx, BufferedUartTx};
use embedded_io_async::{Read, Write};

use servo_rig::config::{LINK_ECHO, LINK_RX_BUFFER_SIZE};
use servo_rig::FrameReceiver;

use super::SystemAlert;
use crate::ipc::{LINK_STATS, SETPOINTS, SYSTEM_CH};

/// Drain the USART3 ring buffer into the frame decoder, echoing every byte.
#[task]
pub async fn link_rx_task(mut rx: BufferedUartRx<'static>, mut tx: BufferedUartTx<'static>) {
    info!("Link task started");
    let mut receiver = FrameReceiver::new(&SETPOINTS, &LINK_STATS);
    let mut buf = [0u8; LINK_RX_BUFFER_SIZE];

    loop {
        let n = match rx.read(&mut buf).await {
            Ok(n) => n,
            Err(e) => {
                warn!("Link read error: {:?}", e);
                SYSTEM_CH.try_send(SystemAlert::LinkFault).ok();
                continue;
            }
        };

        for &byte in &buf[..n] {
            if let Some(d) = receiver.push(byte) {
                debug!("Setpoint move dx={} dy={}", d.dx, d.dy);
            }
        }

        if LINK_ECHO {
            if let Err(e) = tx.write_all(&buf[..n]).await {
                warn!("Link echo failed: {:?}", e);
            }
        }
    }
}
