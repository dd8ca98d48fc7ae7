use defmt::Format;

pub mod control;
pub mod link;
pub mod telemetry;

pub use control::control_task;
pub use link::link_rx_task;
pub use telemetry::telemetry_task;

/// Raised by the real-time tasks, drained and reported by the telemetry task.
#[derive(Debug, Format, Clone, Copy)]
pub enum SystemAlert {
    ControlOverrun { exec_us: u32 },
    LinkFault,
}
