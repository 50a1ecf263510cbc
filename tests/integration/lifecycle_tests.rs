//! Lifecycle notices delivered from another thread while a session runs.

use std::time::Duration;

use crate::mock_hw::{MockPort, RecordingSink, frame};

use irontrack::app::control_loop::ControlLoop;
use irontrack::app::events::{AppEvent, SessionEnd};
use irontrack::app::lifecycle::SessionNotices;
use irontrack::config::ControlConfig;
use irontrack::error::SessionError;
use irontrack::protocol::{Command, DecoderState};

fn endless_port(bytes: &[u8]) -> MockPort {
    let mut port = MockPort::new().with_session(bytes);
    port.endless = true;
    port
}

#[test]
fn shutdown_from_another_thread_stops_the_loop() {
    let mut port = endless_port(&frame(b'M', 1600.0));
    let mut control = ControlLoop::new(ControlConfig::default());
    let mut sink = RecordingSink::default();
    let notices = SessionNotices::new();

    let end = std::thread::scope(|s| {
        s.spawn(|| {
            std::thread::sleep(Duration::from_millis(30));
            notices.request_shutdown();
        });
        control.run(&mut port, &notices, &mut sink)
    });

    assert_eq!(end, Ok(SessionEnd::Shutdown));
    assert_eq!(port.pulses_for(Command::Motor), vec![1500, 1600]);
    assert_eq!(port.released().len(), 4);
    assert_eq!(sink.events.last(), Some(&AppEvent::SessionLost(SessionEnd::Shutdown)));
}

#[test]
fn loss_notice_mid_frame_discards_it() {
    let mut port = MockPort::new().with_session(&[b'/', b'M', 1, 2, 3, 4]);
    let mut control = ControlLoop::new(ControlConfig::default());
    let mut sink = RecordingSink::default();
    let notices = SessionNotices::new();

    let mut session = control.on_session_established(&mut port).unwrap();
    for _ in 0..4 {
        control.step(&mut session, &mut sink).unwrap();
    }
    assert_eq!(
        control.decoder().state(),
        DecoderState::Collecting { command: Command::Motor }
    );

    std::thread::scope(|s| {
        s.spawn(|| notices.notify_lost());
    });
    assert_eq!(
        control.run_session(&mut session, &notices, &mut sink),
        SessionEnd::LostNotice
    );
    control.on_session_lost(session);

    assert_eq!(control.decoder().state(), DecoderState::Idle);
    assert_eq!(control.decoder().buffered(), 0);
    assert_eq!(control.stats().bytes, 4);
    assert_eq!(port.released().len(), 4);
}

#[test]
fn stale_loss_notice_does_not_end_next_session() {
    let mut port = MockPort::new()
        .with_session(&[])
        .with_session(&frame(b'M', 1600.0));
    let mut control = ControlLoop::new(ControlConfig::default());
    let mut sink = RecordingSink::default();
    let notices = SessionNotices::new();

    assert_eq!(control.run(&mut port, &notices, &mut sink), Ok(SessionEnd::LinkLost));
    // The session manager reports the same drop after the loop saw it.
    notices.notify_lost();

    assert_eq!(control.run(&mut port, &notices, &mut sink), Ok(SessionEnd::LinkLost));
    assert_eq!(port.sources_opened, 2);
    assert_eq!(port.pulses_for(Command::Motor), vec![1500, 1500, 1600]);
    assert_eq!(control.stats().frames, 1);
}

#[test]
fn shutdown_is_honoured_while_link_is_down() {
    let mut port = MockPort::new();
    port.link_down = true;
    let mut control = ControlLoop::new(ControlConfig::default());
    let mut sink = RecordingSink::default();
    let notices = SessionNotices::new();

    assert_eq!(
        control.run(&mut port, &notices, &mut sink),
        Err(SessionError::LinkUnavailable)
    );
    notices.request_shutdown();

    assert_eq!(control.run(&mut port, &notices, &mut sink), Ok(SessionEnd::Shutdown));
    assert_eq!(port.sources_opened, 0);
    assert!(port.calls().is_empty());
    assert!(notices.try_take().is_none());
}

#[test]
fn shutdown_behind_loss_notice_is_kept() {
    let mut port = MockPort::new().with_session(&frame(b'W', 1300.0));
    let mut control = ControlLoop::new(ControlConfig::default());
    let notices = SessionNotices::new();
    notices.notify_lost();
    notices.request_shutdown();

    let end = control.run(&mut port, &notices, &mut RecordingSink::default());

    assert_eq!(end, Ok(SessionEnd::Shutdown));
    assert_eq!(port.sources_opened, 0);
    assert!(port.pulses_for(Command::Wheels).is_empty());
}
