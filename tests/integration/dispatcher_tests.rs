//! Integration tests for the Dispatcher → Worker → device pipeline.
//!
//! The inline spawner runs the worker inside `start`, so every test sees
//! a deterministic device history.  The deferred spawner holds the worker
//! back to exercise the windows between `start` and the worker's run.

use rovercontrol::app::dispatcher::{Dispatcher, EXIT_FAILURE, EXIT_OK, Report};
use rovercontrol::app::events::AppEvent;
use rovercontrol::config::RoverConfig;
use rovercontrol::error::DeviceOp;
use rovercontrol::fsm::WorkerPhase;

use super::mock_hw::{DeviceCall, InlineSpawner, MockDevice, RecordingSink, SpawnMode};

type TestDispatcher = Dispatcher<MockDevice, InlineSpawner, RecordingSink>;

fn make(mode: SpawnMode) -> (TestDispatcher, MockDevice, InlineSpawner, RecordingSink) {
    let device = MockDevice::new();
    let spawner = InlineSpawner::new(mode);
    let sink = RecordingSink::new();
    let dispatcher = Dispatcher::new(
        RoverConfig::default(),
        device.clone(),
        spawner.clone(),
        sink.clone(),
    );
    (dispatcher, device, spawner, sink)
}

fn drive_sequence(pulse: u16) -> Vec<DeviceCall> {
    let mut calls = vec![DeviceCall::Open, DeviceCall::SetArmOk, DeviceCall::Arm];
    calls.extend((0..8).map(|ch| DeviceCall::Set(ch, pulse)));
    // a completed run leaves the outputs armed
    calls.push(DeviceCall::Close);
    calls
}

// ── start ─────────────────────────────────────────────────────

#[test]
fn start_arms_then_drives_all_channels_in_order() {
    let (mut d, device, spawner, sink) = make(SpawnMode::Inline);

    assert_eq!(d.dispatch(&["start"]), EXIT_OK);

    assert_eq!(device.calls(), drive_sequence(1700));
    assert_eq!(d.state().phase(), WorkerPhase::Done);
    assert_eq!(
        spawner.spawned(),
        vec![("rover_control".to_owned(), 235, 2000)]
    );
    assert!(sink.contains(&AppEvent::PassCompleted {
        pass: 1,
        channels: 8,
        pulse_us: 1700,
    }));
    assert!(sink.contains(&AppEvent::WorkerSpawned {
        task: 1,
        generation: 1,
    }));
    assert!(!sink.events().iter().any(|e| matches!(e, AppEvent::Fault(_))));
}

#[test]
fn start_publishes_every_phase_in_order() {
    let (mut d, _device, _spawner, sink) = make(SpawnMode::Inline);
    d.dispatch(&["start"]);

    let phases: Vec<_> = sink
        .events()
        .into_iter()
        .filter_map(|e| match e {
            AppEvent::PhaseChanged { to, .. } => Some(to),
            _ => None,
        })
        .collect();
    assert_eq!(
        phases,
        vec![
            WorkerPhase::DeviceOpen,
            WorkerPhase::ArmOkSet,
            WorkerPhase::Armed,
            WorkerPhase::Actuating,
            WorkerPhase::Done,
        ]
    );
}

#[test]
fn pulse_parameter_overrides_drive_value() {
    let (mut d, device, _spawner, _sink) = make(SpawnMode::Inline);
    assert_eq!(d.dispatch(&["start", "-p", "1600"]), EXIT_OK);
    assert_eq!(device.calls(), drive_sequence(1600));
}

#[test]
fn unknown_start_parameters_are_ignored() {
    let (mut d, device, _spawner, _sink) = make(SpawnMode::Inline);
    assert_eq!(d.dispatch(&["start", "--turbo"]), EXIT_OK);
    assert_eq!(device.calls(), drive_sequence(1700));
}

#[test]
fn second_start_while_running_spawns_nothing() {
    let (mut d, _device, spawner, sink) = make(SpawnMode::Deferred);

    assert_eq!(d.dispatch(&["start"]), EXIT_OK);
    assert_eq!(d.dispatch(&["start"]), EXIT_OK);

    assert_eq!(spawner.spawned().len(), 1);
    assert!(sink.contains(&AppEvent::AlreadyRunning(WorkerPhase::Spawned)));
    assert_eq!(spawner.run_pending(), 1);
    assert_eq!(d.state().phase(), WorkerPhase::Done);
}

#[test]
fn start_after_completion_spawns_new_generation() {
    let (mut d, _device, spawner, _sink) = make(SpawnMode::Inline);
    d.dispatch(&["start"]);
    let report = d
        .execute(rovercontrol::app::commands::Command::Start { params: vec![] })
        .unwrap();

    assert_eq!(
        report,
        Report::Spawned {
            task: 2,
            generation: 2
        }
    );
    assert_eq!(spawner.spawned().len(), 2);
}

#[test]
fn rejected_spawn_fails_and_frees_the_cell() {
    let (mut d, device, _spawner, _sink) = make(SpawnMode::Reject);

    assert_eq!(d.dispatch(&["start"]), EXIT_FAILURE);
    assert_eq!(d.state().phase(), WorkerPhase::Failed);
    assert!(!d.state().is_running());
    assert!(!device.touched());
}

#[test]
fn worker_open_failure_writes_nothing() {
    let (mut d, device, _spawner, sink) = make(SpawnMode::Inline);
    device.fail(DeviceOp::Open, 2);

    // The spawn itself succeeded; the worker reports its own fault.
    assert_eq!(d.dispatch(&["start"]), EXIT_OK);
    assert_eq!(device.calls(), vec![DeviceCall::Open]);
    assert_eq!(d.state().phase(), WorkerPhase::Failed);
    assert!(
        sink.events()
            .iter()
            .any(|e| matches!(e, AppEvent::Fault(err) if err.op == DeviceOp::Open))
    );
}

#[test]
fn arm_failure_releases_handle_without_driving() {
    let (mut d, device, _spawner, _sink) = make(SpawnMode::Inline);
    device.fail(DeviceOp::Arm, 5);

    d.dispatch(&["start"]);
    assert_eq!(
        device.calls(),
        vec![
            DeviceCall::Open,
            DeviceCall::SetArmOk,
            DeviceCall::Arm,
            DeviceCall::Close
        ]
    );
    assert_eq!(d.state().phase(), WorkerPhase::Failed);
}

#[test]
fn worker_channel_failure_stops_writes_and_disarms() {
    let (mut d, device, _spawner, _sink) = make(SpawnMode::Inline);
    device.fail(DeviceOp::SetChannel(3), 5);

    d.dispatch(&["start"]);
    assert_eq!(
        device.channel_writes(),
        vec![(0, 1700), (1, 1700), (2, 1700), (3, 1700)]
    );
    let calls = device.calls();
    assert_eq!(&calls[calls.len() - 2..], &[DeviceCall::Disarm, DeviceCall::Close]);
    assert_eq!(d.state().phase(), WorkerPhase::Failed);
}

// ── stop ──────────────────────────────────────────────────────

#[test]
fn stop_commands_neutral_then_disarms_once() {
    let (mut d, device, _spawner, sink) = make(SpawnMode::Inline);

    assert_eq!(d.dispatch(&["stop"]), EXIT_OK);

    let mut expected = vec![DeviceCall::Open];
    expected.extend((0..8).map(|ch| DeviceCall::Set(ch, 1500)));
    expected.extend([DeviceCall::Disarm, DeviceCall::Close]);
    assert_eq!(device.calls(), expected);
    assert_eq!(device.count(DeviceCall::SetArmOk), 0);
    assert_eq!(d.state().phase(), WorkerPhase::ExitRequested);
    assert!(sink.contains(&AppEvent::SafeStateCommanded {
        channels: 8,
        pulse_us: 1500,
    }));
}

#[test]
fn stop_open_failure_fails_before_any_write() {
    let (mut d, device, _spawner, _sink) = make(SpawnMode::Inline);
    device.fail(DeviceOp::Open, 2);

    assert_eq!(d.dispatch(&["stop"]), EXIT_FAILURE);
    assert_eq!(device.calls(), vec![DeviceCall::Open]);
    assert_eq!(d.state().phase(), WorkerPhase::NotStarted);
}

#[test]
fn stop_channel_failure_skips_remaining_writes_and_disarm() {
    let (mut d, device, _spawner, _sink) = make(SpawnMode::Inline);
    device.fail(DeviceOp::SetChannel(2), 5);

    assert_eq!(d.dispatch(&["stop"]), EXIT_FAILURE);
    assert_eq!(device.channel_writes(), vec![(0, 1500), (1, 1500), (2, 1500)]);
    assert_eq!(device.count(DeviceCall::Disarm), 0);
}

#[test]
fn stop_disarm_failure_is_reported() {
    let (mut d, device, _spawner, _sink) = make(SpawnMode::Inline);
    device.fail(DeviceOp::Disarm, 5);

    assert_eq!(d.dispatch(&["stop"]), EXIT_FAILURE);
    assert_eq!(device.channel_writes().len(), 8);
}

#[test]
fn stop_before_worker_runs_keeps_it_from_arming() {
    let (mut d, device, spawner, _sink) = make(SpawnMode::Deferred);

    d.dispatch(&["start"]);
    assert_eq!(d.dispatch(&["stop"]), EXIT_OK);
    let after_stop = device.calls().len();

    spawner.run_pending();
    assert_eq!(device.calls().len(), after_stop, "cancelled worker must not touch the device");
    assert_eq!(device.count(DeviceCall::Arm), 0);
    assert_eq!(d.state().phase(), WorkerPhase::Done);
}

#[test]
fn repeated_stop_reports_exit_request_once() {
    let (mut d, device, _spawner, sink) = make(SpawnMode::Inline);

    assert_eq!(d.dispatch(&["stop"]), EXIT_OK);
    assert_eq!(d.dispatch(&["stop"]), EXIT_OK);

    let exit_requests = sink
        .events()
        .into_iter()
        .filter(|e| matches!(e, AppEvent::PhaseChanged { to: WorkerPhase::ExitRequested, .. }))
        .count();
    assert_eq!(exit_requests, 1);
    assert!(!sink.contains(&AppEvent::PhaseChanged {
        from: WorkerPhase::ExitRequested,
        to: WorkerPhase::ExitRequested,
    }));
    // both stops still drive the outputs to neutral
    assert_eq!(device.count(DeviceCall::Disarm), 2);
}

#[test]
fn start_after_stop_is_allowed() {
    let (mut d, _device, spawner, _sink) = make(SpawnMode::Inline);
    d.dispatch(&["stop"]);
    assert_eq!(d.dispatch(&["start"]), EXIT_OK);
    assert_eq!(spawner.spawned().len(), 1);
    assert_eq!(d.state().phase(), WorkerPhase::Done);
}

// ── status ────────────────────────────────────────────────────

#[test]
fn status_reads_without_touching_device_or_state() {
    let (mut d, device, _spawner, sink) = make(SpawnMode::Inline);
    let before = d.state().snapshot();

    assert_eq!(d.dispatch(&["status"]), EXIT_OK);

    assert!(!device.touched());
    assert_eq!(d.state().snapshot(), before);
    assert_eq!(sink.events(), vec![AppEvent::Status(WorkerPhase::NotStarted)]);
}

#[test]
fn status_right_after_start_sees_a_legal_phase() {
    // Racy by nature: whatever the worker has published by now.
    let (mut d, _device, _spawner, _sink) = make(SpawnMode::Deferred);
    d.dispatch(&["start"]);

    match d.execute(rovercontrol::app::commands::Command::Status) {
        Ok(Report::Status(report)) => {
            assert!(report.phase.is_running() || report.phase.is_terminal());
            assert_eq!(report.running, report.phase.is_running());
        }
        other => panic!("unexpected {:?}", other),
    }
}

// ── usage ─────────────────────────────────────────────────────

#[test]
fn missing_command_is_usage_error_without_hardware() {
    let (mut d, device, spawner, sink) = make(SpawnMode::Inline);
    let args: [&str; 0] = [];

    assert_eq!(d.dispatch(&args), EXIT_FAILURE);
    assert!(!device.touched());
    assert!(spawner.spawned().is_empty());
    assert!(sink.events().is_empty());
}

#[test]
fn unknown_command_is_usage_error() {
    let (mut d, device, _spawner, _sink) = make(SpawnMode::Inline);
    assert_eq!(d.dispatch(&["drive"]), EXIT_FAILURE);
    assert!(!device.touched());
}
