//! Integration tests: AcquisitionLoop::run on its own thread.

use std::sync::mpsc;
use std::thread;

use tankgauge::acquisition::{AcquisitionLoop, ExitReason, LinkLostReason};
use tankgauge::app::ports::SerialTransport;
use tankgauge::config::{LinkSettings, TankConfig};
use tankgauge::error::ReadError;
use tankgauge::publish::SharedState;
use tankgauge::sensors::LevelPercentage;

use crate::mock_link::{MockLink, MockTransport, Script, WAIT, fast_config, lines, wait_until};

fn open(script: Script) -> MockLink {
    MockTransport::new(script)
        .open("COM3", &LinkSettings::default())
        .unwrap()
}

#[test]
fn stop_signal_returns_the_link() {
    let shared = SharedState::new(TankConfig::new(200.0));
    let acquisition = AcquisitionLoop::new(open(lines(&["150"])), shared.clone(), &fast_config());
    let (stop_tx, stop_rx) = mpsc::channel();
    let worker = thread::spawn(move || acquisition.run(&stop_rx));

    assert!(wait_until(WAIT, || shared.level.level().is_some()));
    stop_tx.send(()).unwrap();

    let exit = worker.join().unwrap();
    assert_eq!(exit.reason, ExitReason::Stopped);
    assert_eq!(shared.level.level(), LevelPercentage::clamped(25.0));
}

#[test]
fn dropped_sender_also_stops() {
    let shared = SharedState::new(TankConfig::default());
    let acquisition = AcquisitionLoop::new(open(lines(&[])), shared, &fast_config());
    let (stop_tx, stop_rx) = mpsc::channel::<()>();
    let worker = thread::spawn(move || acquisition.run(&stop_rx));

    drop(stop_tx);
    assert_eq!(worker.join().unwrap().reason, ExitReason::Stopped);
}

#[test]
fn fatal_error_ends_run_without_stop() {
    let shared = SharedState::new(TankConfig::default());
    let link = open(vec![Ok(b"250".to_vec()), Err(ReadError::DeviceRemoved)]);
    let acquisition = AcquisitionLoop::new(link, shared.clone(), &fast_config());
    let (_stop_tx, stop_rx) = mpsc::channel();

    let exit = thread::spawn(move || acquisition.run(&stop_rx)).join().unwrap();
    assert_eq!(
        exit.reason,
        ExitReason::LinkLost(LinkLostReason::Fatal(ReadError::DeviceRemoved))
    );
    // The level published before the loss survives it.
    assert_eq!(shared.level.level(), LevelPercentage::clamped(75.0));
    assert_eq!(shared.diagnostics.snapshot().read_failures, 1);
}

#[test]
fn timeouts_count_toward_threshold() {
    let config = tankgauge::config::MonitorConfig {
        max_consecutive_failures: 3,
        ..fast_config()
    };
    let link = open(vec![
        Err(ReadError::Timeout),
        Ok(b"oops".to_vec()),
        Err(ReadError::Timeout),
    ]);
    let acquisition = AcquisitionLoop::new(link, SharedState::new(TankConfig::default()), &config);
    let (_stop_tx, stop_rx) = mpsc::channel();

    let exit = thread::spawn(move || acquisition.run(&stop_rx)).join().unwrap();
    match exit.reason {
        ExitReason::LinkLost(LinkLostReason::ConsecutiveFailures { count, .. }) => {
            assert_eq!(count, 3);
        }
        other => panic!("unexpected exit: {other:?}"),
    }
}
