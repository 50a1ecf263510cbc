//! Dispatcher integration tests: decoder output routed through a bank
//! of recording outputs.

use std::cell::RefCell;
use std::rc::Rc;

use crate::mock_hw::{ActuatorCall, CallLog, MockOutput, frame};

use irontrack::app::dispatcher::Dispatcher;
use irontrack::app::ports::ActuatorBank;
use irontrack::config::{ControlConfig, PulseLimits};
use irontrack::error::DispatchError;
use irontrack::protocol::{Command, FrameDecoder, FrameEvent};

fn drive_bank(log: &CallLog) -> ActuatorBank<MockOutput> {
    let mut bank = ActuatorBank::new();
    bank.insert(Command::Motor, MockOutput::new(Command::Motor, Rc::clone(log)));
    bank.insert(Command::Wheels, MockOutput::new(Command::Wheels, Rc::clone(log)));
    bank
}

/// Feed `bytes` and dispatch every completed frame.
fn pump(bytes: &[u8], dispatcher: &Dispatcher, bank: &mut ActuatorBank<MockOutput>) -> Vec<Result<i32, DispatchError>> {
    let mut decoder = FrameDecoder::new();
    bytes
        .iter()
        .filter_map(|&b| match decoder.feed(b) {
            FrameEvent::FrameReady { command, value } => Some(dispatcher.dispatch(command, value, bank)),
            _ => None,
        })
        .collect()
}

#[test]
fn one_write_per_completed_frame() {
    let log: CallLog = Rc::new(RefCell::new(Vec::new()));
    let mut bank = drive_bank(&log);
    let d = Dispatcher::new(&ControlConfig::default());

    let mut bytes = frame(b'M', 1510.0).to_vec();
    bytes.extend_from_slice(&frame(b'W', 1490.0));
    bytes.extend_from_slice(&frame(b'M', 1520.0));

    assert_eq!(pump(&bytes, &d, &mut bank), vec![Ok(1510), Ok(1490), Ok(1520)]);
    assert_eq!(
        log.borrow().as_slice(),
        &[
            ActuatorCall::SetPulse { command: Command::Motor, micros: 1510 },
            ActuatorCall::SetPulse { command: Command::Wheels, micros: 1490 },
            ActuatorCall::SetPulse { command: Command::Motor, micros: 1520 },
        ]
    );
}

#[test]
fn fractional_and_negative_values_truncate() {
    let log: CallLog = Rc::new(RefCell::new(Vec::new()));
    let mut bank = drive_bank(&log);
    let d = Dispatcher::new(&ControlConfig::default());

    assert_eq!(d.dispatch(Command::Motor, 1499.99, &mut bank), Ok(1499));
    assert_eq!(d.dispatch(Command::Wheels, -0.5, &mut bank), Ok(0));
    assert_eq!(d.dispatch(Command::Wheels, -12.7, &mut bank), Ok(-12));
}

#[test]
fn non_finite_values_are_forwarded_saturated() {
    let log: CallLog = Rc::new(RefCell::new(Vec::new()));
    let mut bank = drive_bank(&log);
    let d = Dispatcher::new(&ControlConfig::default());

    assert_eq!(d.dispatch(Command::Motor, f32::NAN, &mut bank), Ok(0));
    assert_eq!(d.dispatch(Command::Motor, f32::INFINITY, &mut bank), Ok(i32::MAX));
}

#[test]
fn closed_channel_is_unmapped() {
    let log: CallLog = Rc::new(RefCell::new(Vec::new()));
    let mut bank = drive_bank(&log);
    let d = Dispatcher::new(&ControlConfig::default());

    assert_eq!(
        d.dispatch(Command::Tilt, 1500.0, &mut bank),
        Err(DispatchError::Unmapped(Command::Tilt))
    );
    assert!(log.borrow().is_empty());
}

#[test]
fn configured_limits_clamp_before_write() {
    let log: CallLog = Rc::new(RefCell::new(Vec::new()));
    let mut bank = drive_bank(&log);
    let mut cfg = ControlConfig::default();
    cfg.channels[Command::Wheels.index()].limits = Some(PulseLimits { min_us: 1100, max_us: 1900 });
    let d = Dispatcher::new(&cfg);

    assert_eq!(d.dispatch(Command::Wheels, 900.0, &mut bank), Ok(1100));
    assert_eq!(d.dispatch(Command::Motor, 900.0, &mut bank), Ok(900));
    assert_eq!(
        log.borrow().first(),
        Some(&ActuatorCall::SetPulse { command: Command::Wheels, micros: 1100 })
    );
}
