//! Integration tests: ConnectionController → worker → shared cells.

use std::thread;
use std::time::Duration;

use tankgauge::ConnectionController;
use tankgauge::acquisition::LinkLostReason;
use tankgauge::app::events::AppEvent;
use tankgauge::error::{ConnectError, ReadError};
use tankgauge::fsm::ConnectionState;
use tankgauge::sensors::LevelPercentage;

use crate::mock_link::{MockTransport, RecordingSink, WAIT, fast_config, lines, wait_until};

fn pct(value: f32) -> Option<LevelPercentage> {
    LevelPercentage::clamped(value)
}

#[test]
fn failed_open_then_retry_starts_one_worker() {
    let transport = MockTransport::new(lines(&[])).failing_first(1);
    let probe = transport.probe();
    let mut sink = RecordingSink::new();
    let mut c = ConnectionController::new(transport, fast_config());

    let err = c.connect("COM3", &mut sink).unwrap_err();
    assert_eq!(err, ConnectError::NotFound { port: "COM3".into() });
    assert_eq!(c.state(), ConnectionState::Failed);
    assert_eq!(c.state().status_text(), "Connection Failed");
    assert_eq!(c.diagnostics().sessions_started, 0);

    c.connect("COM3", &mut sink).unwrap();
    assert_eq!(c.state(), ConnectionState::Connected);
    assert_eq!(c.connected_port(), Some("COM3"));
    assert_eq!(c.diagnostics().sessions_started, 1);
    assert_eq!(probe.opens(), 2);

    assert_eq!(sink.count(|e| matches!(e, AppEvent::ConnectFailed { .. })), 1);
    c.stop(&mut sink);
}

#[test]
fn connect_while_connected_is_ignored() {
    let transport = MockTransport::new(lines(&[]));
    let probe = transport.probe();
    let mut sink = RecordingSink::new();
    let mut c = ConnectionController::new(transport, fast_config());

    c.connect("COM3", &mut sink).unwrap();
    c.connect("COM4", &mut sink).unwrap();

    assert_eq!(probe.opens(), 1);
    assert_eq!(c.connected_port(), Some("COM3"));
    assert_eq!(c.diagnostics().sessions_started, 1);
    c.stop(&mut sink);
}

#[test]
fn stop_closes_link_and_halts_reads() {
    let transport = MockTransport::new(lines(&[]));
    let probe = transport.probe();
    let mut sink = RecordingSink::new();
    let mut c = ConnectionController::new(transport, fast_config());

    c.connect("COM3", &mut sink).unwrap();
    assert!(wait_until(WAIT, || probe.polls() > 0), "worker never polled");

    c.stop(&mut sink);
    assert_eq!(c.state(), ConnectionState::Disconnected);
    assert_eq!(c.connected_port(), None);
    assert!(probe.is_closed());
    assert_eq!(probe.closes(), 1);

    let polls = probe.polls();
    thread::sleep(Duration::from_millis(30));
    assert_eq!(probe.polls(), polls, "worker kept reading after stop");
}

#[test]
fn stop_when_idle_is_harmless() {
    let mut sink = RecordingSink::new();
    let mut c = ConnectionController::new(MockTransport::new(lines(&[])), fast_config());
    c.stop(&mut sink);
    assert_eq!(c.state(), ConnectionState::Disconnected);
    assert!(sink.events.is_empty());
}

#[test]
fn readings_flow_through_to_poll() {
    let transport = MockTransport::new(lines(&["150", "bad", "50"]));
    let mut sink = RecordingSink::new();
    let mut c = ConnectionController::new(transport, fast_config());
    c.set_tank_height("200", &mut sink).unwrap();

    c.connect("COM3", &mut sink).unwrap();
    assert!(wait_until(WAIT, || c.diagnostics().frames_received == 3));

    assert_eq!(c.level(), pct(75.0));
    let diag = c.diagnostics();
    assert_eq!(diag.levels_published, 2);
    assert_eq!(diag.parse_failures, 1);

    // The latest level is reported exactly once.
    assert_eq!(c.poll(&mut sink), pct(75.0));
    assert_eq!(c.poll(&mut sink), None);
    assert_eq!(c.state(), ConnectionState::Connected);
    c.stop(&mut sink);
}

#[test]
fn fatal_read_error_drops_the_link() {
    let transport = MockTransport::new(vec![Err(ReadError::DeviceRemoved)]);
    let probe = transport.probe();
    let mut sink = RecordingSink::new();
    let mut c = ConnectionController::new(transport, fast_config());

    c.connect("COM3", &mut sink).unwrap();
    assert!(wait_until(WAIT, || {
        c.poll(&mut sink);
        c.state() == ConnectionState::Disconnected
    }));

    assert!(probe.is_closed());
    assert_eq!(c.diagnostics().links_lost, 1);
    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::LinkLost {
            reason: LinkLostReason::Fatal(ReadError::DeviceRemoved),
            ..
        }
    )));
}

#[test]
fn repeated_garbage_drops_the_link() {
    let transport = MockTransport::new(lines(&["x"; 5]));
    let mut sink = RecordingSink::new();
    let mut c = ConnectionController::new(transport, fast_config());

    c.connect("COM3", &mut sink).unwrap();
    assert!(wait_until(WAIT, || {
        c.poll(&mut sink);
        c.state() == ConnectionState::Disconnected
    }));

    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::LinkLost {
            reason: LinkLostReason::ConsecutiveFailures { count: 5, .. },
            ..
        }
    )));
}

#[test]
fn reconnect_after_link_loss() {
    let transport = MockTransport::with_scripts(vec![
        vec![Err(ReadError::Closed)],
        lines(&["500"]),
    ]);
    let probe = transport.probe();
    let mut sink = RecordingSink::new();
    let mut c = ConnectionController::new(transport, fast_config());

    c.connect("COM3", &mut sink).unwrap();
    assert!(wait_until(WAIT, || {
        c.poll(&mut sink);
        c.state() == ConnectionState::Disconnected
    }));

    c.connect("COM3", &mut sink).unwrap();
    assert!(wait_until(WAIT, || c.poll(&mut sink).is_some()));
    assert_eq!(c.level(), pct(50.0));
    assert_eq!(probe.opens(), 2);
    assert_eq!(c.diagnostics().sessions_started, 2);
    c.stop(&mut sink);
}

#[test]
fn disabled_height_keeps_previous_level() {
    let transport = MockTransport::new(lines(&["100"]));
    let mut sink = RecordingSink::new();
    let mut c = ConnectionController::new(transport, fast_config());
    assert!(c.set_tank_height("-5", &mut sink).is_err());

    c.connect("COM3", &mut sink).unwrap();
    assert!(wait_until(WAIT, || c.diagnostics().frames_skipped_disabled == 1));
    assert_eq!(c.level(), None);
    assert_eq!(c.poll(&mut sink), None);
    assert_eq!(c.state(), ConnectionState::Connected);
    c.stop(&mut sink);
}

#[test]
fn dropping_controller_closes_link() {
    let transport = MockTransport::new(lines(&[]));
    let probe = transport.probe();
    {
        let mut c = ConnectionController::new(transport, fast_config());
        c.connect("COM3", &mut RecordingSink::new()).unwrap();
    }
    assert!(probe.is_closed());
}

#[test]
fn state_reader_follows_transitions() {
    let mut sink = RecordingSink::new();
    let mut c = ConnectionController::new(MockTransport::new(lines(&[])), fast_config());
    let reader = c.state_reader();

    c.connect("COM3", &mut sink).unwrap();
    assert_eq!(reader.get(), ConnectionState::Connected);
    c.stop(&mut sink);
    assert_eq!(reader.get(), ConnectionState::Disconnected);

    let transitions: Vec<_> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::StateChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        transitions,
        vec![
            (ConnectionState::Disconnected, ConnectionState::Connecting),
            (ConnectionState::Connecting, ConnectionState::Connected),
            (ConnectionState::Connected, ConnectionState::Disconnected),
        ]
    );
}
