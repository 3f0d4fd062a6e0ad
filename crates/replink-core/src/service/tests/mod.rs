use crate::{
    error::ErrorClass,
    event::{LinkEvent, OperationError},
    gateway::LinkGateway,
    model::{ActiveProcess, Link, Operation, State},
    obs::sink::{metrics_report, metrics_reset_all},
    session::LinkSession,
    test_support::{MemoryLinkGateway, RecordedEvents, identifier, identifiers, snapshot},
};


///
/// EntityConfig
/// One persisted configuration of a single entity, as the gateway fixture
/// loads it.
///

#[derive(Clone, Copy, Debug)]
pub(super) struct EntityConfig {
    pub state: State,
    pub process: Option<ActiveProcess>,
    pub tainted: bool,
}

impl EntityConfig {
    pub(super) const fn new(state: State, process: Option<ActiveProcess>, tainted: bool) -> Self {
        Self {
            state,
            process,
            tainted,
        }
    }
}

/// Every reachable single-entity configuration.
pub(super) const CONFIGS: [EntityConfig; 12] = [
    EntityConfig::new(State::Idle, None, false),
    EntityConfig::new(State::Activated, Some(ActiveProcess::Pull), false),
    EntityConfig::new(State::Activated, Some(ActiveProcess::Delete), false),
    EntityConfig::new(State::Activated, Some(ActiveProcess::Pull), true),
    EntityConfig::new(State::Activated, Some(ActiveProcess::Delete), true),
    EntityConfig::new(State::Received, Some(ActiveProcess::Pull), false),
    EntityConfig::new(State::Received, Some(ActiveProcess::Delete), false),
    EntityConfig::new(State::Received, Some(ActiveProcess::Pull), true),
    EntityConfig::new(State::Received, Some(ActiveProcess::Delete), true),
    EntityConfig::new(State::Pulled, None, false),
    EntityConfig::new(State::Tainted, None, true),
    EntityConfig::new(State::Deprecated, None, true),
];

/// End states after a PULL drain, indexed like [`CONFIGS`].
const PULL_END: [State; 12] = [
    State::Pulled,
    State::Pulled,
    State::Pulled,
    State::Deprecated,
    State::Deprecated,
    State::Pulled,
    State::Pulled,
    State::Tainted,
    State::Deprecated,
    State::Pulled,
    State::Tainted,
    State::Deprecated,
];

/// End states after a DELETE drain, indexed like [`CONFIGS`].
const DELETE_END: [State; 12] = [
    State::Idle,
    State::Idle,
    State::Idle,
    State::Deprecated,
    State::Deprecated,
    State::Idle,
    State::Idle,
    State::Deprecated,
    State::Deprecated,
    State::Idle,
    State::Deprecated,
    State::Deprecated,
];

/// Whether a PULL of the configuration reports a refusal.
const PULL_ERRORS: [bool; 12] = [
    false, false, false, true, true, false, false, false, true, false, false, true,
];

/// Load a gateway holding the identifiers `0..n`, one per configuration.
pub(super) fn gateway_from_configs(configs: &[EntityConfig]) -> MemoryLinkGateway {
    let mut source = Vec::new();
    let mut outbound = Vec::new();
    let mut local = Vec::new();
    let mut flagged = Vec::new();
    let mut pulling = Vec::new();
    let mut deleting = Vec::new();

    for (index, config) in configs.iter().enumerate() {
        let id = index.to_string();
        source.push(id.clone());
        match config.state {
            State::Idle => {}
            State::Activated | State::Deprecated => outbound.push(id.clone()),
            State::Received | State::Pulled | State::Tainted => {
                outbound.push(id.clone());
                local.push(id.clone());
            }
        }
        if config.tainted {
            flagged.push(id.clone());
        }
        match config.process {
            Some(ActiveProcess::Pull) => pulling.push(id.clone()),
            Some(ActiveProcess::Delete) => deleting.push(id.clone()),
            None => {}
        }
    }

    snapshot()
        .source(source)
        .outbound(outbound)
        .local(local)
        .flagged(flagged)
        .processing_pull(pulling)
        .processing_delete(deleting)
        .gateway()
}

fn state_of(gateway: &MemoryLinkGateway, text: &str) -> State {
    let snapshot = gateway.snapshot().expect("snapshot should succeed");
    let link = Link::from_snapshot(&snapshot).expect("snapshot should project");
    link.entity(&identifier(text))
        .expect("entity should be present")
        .state()
}

#[test]
fn pulled_entity_ends_in_correct_state() {
    for (index, expected) in PULL_END.iter().enumerate() {
        let mut session = LinkSession::new(gateway_from_configs(&[CONFIGS[index]]));
        session
            .pull(identifiers(["0"]))
            .expect("pull should succeed");
        assert_eq!(
            state_of(session.gateway(), "0"),
            *expected,
            "pull from configuration {index} ({:?})",
            CONFIGS[index]
        );
    }
}

#[test]
fn deleted_entity_ends_in_correct_state() {
    for (index, expected) in DELETE_END.iter().enumerate() {
        let mut session = LinkSession::new(gateway_from_configs(&[CONFIGS[index]]));
        session
            .delete(identifiers(["0"]))
            .expect("delete should succeed");
        assert_eq!(
            state_of(session.gateway(), "0"),
            *expected,
            "delete from configuration {index} ({:?})",
            CONFIGS[index]
        );
    }
}

#[test]
fn pull_reports_refusals_for_deprecated_endings() {
    for (index, produces_error) in PULL_ERRORS.iter().enumerate() {
        let mut session = LinkSession::new(gateway_from_configs(&[CONFIGS[index]]));
        let response = session
            .pull(identifiers(["0"]))
            .expect("pull should succeed");
        assert_eq!(response.requested, identifiers(["0"]));
        let expected: std::collections::BTreeSet<OperationError> = if *produces_error {
            [OperationError::InvalidOperationRequested {
                operation: Operation::StartPull,
                identifier: identifier("0"),
                state: State::Deprecated,
            }]
            .into_iter()
            .collect()
        } else {
            std::collections::BTreeSet::new()
        };
        assert_eq!(
            response.errors, expected,
            "pull from configuration {index} ({:?})",
            CONFIGS[index]
        );
    }
}

#[test]
fn deleting_idle_entity_is_refused_and_changes_nothing() {
    let mut session = LinkSession::new(snapshot().source(["1"]).gateway());
    let before = session.gateway().snapshot().expect("snapshot should succeed");
    let response = session
        .delete(identifiers(["1"]))
        .expect("delete should succeed");
    assert!(response.errors.contains(&OperationError::InvalidOperationRequested {
        operation: Operation::StartDelete,
        identifier: identifier("1"),
        state: State::Idle,
    }));
    let after = session.gateway().snapshot().expect("snapshot should succeed");
    assert_eq!(before, after, "assignments should be unchanged");
}

#[test]
fn unknown_identifier_is_refused_and_the_rest_proceeds() {
    let mut session = LinkSession::new(snapshot().source(["1"]).gateway());
    let response = session
        .pull(identifiers(["1", "9"]))
        .expect("pull should succeed");
    assert_eq!(
        response.errors,
        [OperationError::UnknownIdentifier {
            operation: Operation::StartPull,
            identifier: identifier("9"),
        }]
        .into_iter()
        .collect()
    );
    assert_eq!(state_of(session.gateway(), "1"), State::Pulled);
}

#[test]
fn pull_is_idempotent_at_the_fixed_point() {
    let mut session = LinkSession::new(snapshot().source(["1"]).gateway());
    session
        .pull(identifiers(["1"]))
        .expect("first pull should succeed");
    let settled = session.gateway().snapshot().expect("snapshot should succeed");
    let response = session
        .pull(identifiers(["1"]))
        .expect("second pull should succeed");
    assert!(response.errors.is_empty());
    let after = session.gateway().snapshot().expect("snapshot should succeed");
    assert_eq!(settled, after, "a settled pull should be a no-op");
}

#[test]
fn pull_then_delete_returns_to_idle() {
    let mut session = LinkSession::new(snapshot().source(["1"]).gateway());
    let initial = session.gateway().snapshot().expect("snapshot should succeed");
    session.pull(identifiers(["1"])).expect("pull should succeed");
    assert_eq!(state_of(session.gateway(), "1"), State::Pulled);
    session
        .delete(identifiers(["1"]))
        .expect("delete should succeed");
    assert_eq!(state_of(session.gateway(), "1"), State::Idle);
    let after = session.gateway().snapshot().expect("snapshot should succeed");
    assert_eq!(initial, after, "a full pull/delete cycle should round-trip");
}

#[test]
fn process_drains_requested_in_flight_work() {
    let mut session = LinkSession::new(
        snapshot()
            .source(["1"])
            .outbound(["1"])
            .processing_pull(["1"])
            .gateway(),
    );
    let response = session
        .process(identifiers(["1"]))
        .expect("process should succeed");
    assert_eq!(response.requested, identifiers(["1"]));
    assert_eq!(state_of(session.gateway(), "1"), State::Pulled);
}

#[test]
fn process_with_empty_request_drains_everything_in_flight() {
    let mut session = LinkSession::new(
        snapshot()
            .source(["1", "2", "3"])
            .outbound(["1", "2"])
            .local(["2"])
            .processing_pull(["1"])
            .processing_delete(["2"])
            .gateway(),
    );
    let response = session.process([]).expect("process should succeed");
    assert_eq!(response.requested, identifiers(["1", "2"]));
    assert_eq!(state_of(session.gateway(), "1"), State::Pulled);
    assert_eq!(state_of(session.gateway(), "2"), State::Idle);
    assert_eq!(state_of(session.gateway(), "3"), State::Idle);
}

#[test]
fn process_never_originates_new_work() {
    let mut session = LinkSession::new(snapshot().source(["1"]).gateway());
    let response = session.process([]).expect("process should succeed");
    assert!(response.requested.is_empty());
    assert_eq!(state_of(session.gateway(), "1"), State::Idle);
}

#[test]
fn list_idle_reports_source_only_entities() {
    let mut session = LinkSession::new(
        snapshot()
            .source(["1", "2"])
            .outbound(["2"])
            .local(["2"])
            .gateway(),
    );
    let response = session.list_idle().expect("list_idle should succeed");
    assert_eq!(response.identifiers, identifiers(["1"]));
}

#[test]
fn events_reach_subscribers_after_commit() {
    let events = RecordedEvents::new();
    let mut session = LinkSession::new(snapshot().source(["1"]).gateway());
    session.subscribe(Box::new(events.clone()));
    session.pull(identifiers(["1"])).expect("pull should succeed");
    let published = events.take();
    assert_eq!(published.len(), 1);
    assert!(matches!(published[0], LinkEvent::EntitiesPulled(_)));
}

#[test]
fn local_commit_failure_rolls_back_and_publishes_nothing() {
    let events = RecordedEvents::new();
    let mut session = LinkSession::new(snapshot().source(["1"]).gateway());
    session.subscribe(Box::new(events.clone()));
    session.gateway_mut().local_mut().fail_next_commit();

    let err = session
        .pull(identifiers(["1"]))
        .expect_err("pull should fail on commit");
    assert_eq!(err.class, ErrorClass::Io);
    assert!(events.is_empty(), "no events should escape a rollback");
    assert_eq!(state_of(session.gateway(), "1"), State::Idle);
}

#[test]
fn source_commit_failure_after_local_commit_is_partial() {
    let mut session = LinkSession::new(snapshot().source(["1"]).gateway());
    session.gateway_mut().source_mut().fail_next_commit();

    let err = session
        .pull(identifiers(["1"]))
        .expect_err("pull should fail on the second commit phase");
    assert!(err.is_partial_commit());

    // The local side kept its rows; the source side lost the hand-out.
    let drifted = session.gateway().snapshot().expect("snapshot should succeed");
    assert!(Link::from_snapshot(&drifted).is_err(), "hosts should disagree");

    // The next reconciliation pass restores the invariants.
    let plan = session.reconcile().expect("reconcile should succeed");
    assert!(!plan.is_empty());
    assert_eq!(state_of(session.gateway(), "1"), State::Idle);
}

#[test]
fn pull_records_metrics() {
    metrics_reset_all();
    let mut session = LinkSession::new(snapshot().source(["1"]).gateway());
    session.pull(identifiers(["1"])).expect("pull should succeed");
    let report = metrics_report();
    assert_eq!(report.ops.pull_calls, 1);
    assert_eq!(report.ops.rounds_total, 3, "start, add, finish");
    assert_eq!(report.ops.commands_applied, 3);
    assert_eq!(report.ops.operation_errors, 0);
    metrics_reset_all();
}
