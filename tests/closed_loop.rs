use servo_rig::config::{CONTROL_PERIOD_MS, PULSE_NEUTRAL};
use servo_rig::protocol::{encode_frame, FrameReceiver};
use servo_rig::shared::{LinkStats, SetpointRegisters, Setpoints, TelemetryCell};
use servo_rig::sim::{RecordingOutput, SimulatedTimer};
use servo_rig::{Actuator, Channel, ControlScheduler, Displacement, LoopConfig};

static SETPOINTS: SetpointRegisters = SetpointRegisters::new(Setpoints::NEUTRAL);
static LINK_STATS: LinkStats = LinkStats::new();
static TELEMETRY: TelemetryCell = TelemetryCell::new();

#[test]
fn link_bytes_drive_servo_pulses() {
    let mut rx = FrameReceiver::new(&SETPOINTS, &LINK_STATS);
    let mut scheduler = ControlScheduler::new(
        LoopConfig::default(),
        &SETPOINTS,
        Actuator::new(RecordingOutput::new()),
    );
    let mut timer = SimulatedTimer::new(CONTROL_PERIOD_MS);

    // line noise, one corrupted frame, then two good relative moves
    let mut stream = vec![0x13, 0x55, 0xAA, 0x00, 0x10, 0x00, 0x10, 0x99, 0x55];
    stream.extend_from_slice(&encode_frame(Displacement::new(300, -200)));
    stream.extend_from_slice(&encode_frame(Displacement::new(100, 50)));

    // bytes trickle in between ticks, like a 115200 baud link at 100 Hz
    for chunk in stream.chunks(3) {
        rx.extend(chunk);
        for _ in 0..timer.advance(CONTROL_PERIOD_MS) {
            scheduler.tick();
            TELEMETRY.publish(scheduler.snapshot());
        }
    }
    for _ in 0..timer.advance(20_000) {
        scheduler.tick();
        TELEMETRY.publish(scheduler.snapshot());
    }

    let counters = LINK_STATS.snapshot();
    assert_eq!(counters.frames, 2);
    assert_eq!(counters.checksum_failures, 1);
    assert_eq!(SETPOINTS.snapshot(), Setpoints { x: 3400.0, y: 2850.0 });

    let out = scheduler.actuator().output();
    let s1 = out.last(Channel::S1).unwrap();
    let s2 = out.last(Channel::S2).unwrap();
    assert!((3399..=3400).contains(&s1), "s1={s1}");
    assert!((2849..=2850).contains(&s2), "s2={s2}");
    assert_eq!(out.last(Channel::S3), Some(PULSE_NEUTRAL));

    let snap = TELEMETRY.latest();
    assert_eq!(snap.tick, scheduler.ticks());
    assert_eq!(snap.setpoints, SETPOINTS.snapshot());
    assert_eq!(snap.channels[Channel::S1], scheduler.state(Channel::S1));
}
