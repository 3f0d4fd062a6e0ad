use crate::{
    error::ErrorClass,
    model::{Command, Link, State, Transition, Update, UpdateBatch},
    test_support::{SnapshotBuilder, identifier, snapshot},
};

fn project(builder: SnapshotBuilder) -> Link {
    Link::from_snapshot(&builder.build()).expect("snapshot should project into a link")
}

fn one_entity_link(builder: SnapshotBuilder) -> Link {
    let link = project(builder);
    assert_eq!(link.len(), 1, "test link should hold exactly one entity");
    link
}

#[test]
fn every_state_is_derived_from_its_configuration() {
    let link = project(
        snapshot()
            .source(["1", "2", "3", "4", "5", "6"])
            .outbound(["2", "3", "4", "5", "6"])
            .local(["3", "4", "5"])
            .flagged(["5", "6"])
            .processing_pull(["2", "3"]),
    );
    let state_of = |text: &str| {
        link.entity(&identifier(text))
            .expect("entity should be present")
            .state()
    };
    assert_eq!(state_of("1"), State::Idle);
    assert_eq!(state_of("2"), State::Activated);
    assert_eq!(state_of("3"), State::Received);
    assert_eq!(state_of("4"), State::Pulled);
    assert_eq!(state_of("5"), State::Tainted);
    assert_eq!(state_of("6"), State::Deprecated);
}

#[test]
fn unsupported_operations_produce_empty_updates() {
    let link = project(
        snapshot()
            .source(["1", "2", "3", "4", "5", "6"])
            .outbound(["2", "3", "4", "5", "6"])
            .local(["3", "4", "5"])
            .flagged(["5", "6"])
            .processing_pull(["2", "3"]),
    );
    let updates_of = |text: &str| {
        let entity = link.entity(&identifier(text)).expect("entity should be present");
        [entity.pull(), entity.delete(), entity.process()]
    };

    // (state, operations that must be no-ops: pull / delete / process)
    let expectations = [
        ("1", [false, true, true]),  // Idle: only pull starts work
        ("2", [true, true, false]),  // Activated: only process advances
        ("3", [true, true, false]),  // Received: only process advances
        ("4", [true, false, true]),  // Pulled: only delete starts work
        ("5", [true, false, true]),  // Tainted: only delete starts work
        ("6", [true, true, true]),   // Deprecated: terminal
    ];
    for (text, noop) in expectations {
        let updates = updates_of(text);
        for (update, must_be_noop) in updates.iter().zip(noop) {
            assert_eq!(
                !update.is_state_changing(),
                must_be_noop,
                "entity {text} produced unexpected update {update:?}"
            );
        }
    }
}

#[test]
fn pulling_idle_entity_returns_start_pull() {
    let link = one_entity_link(snapshot().source(["1"]));
    let entity = link.entity(&identifier("1")).expect("entity should be present");
    assert_eq!(
        entity.pull(),
        Update::new(
            identifier("1"),
            Transition::new(State::Idle, State::Activated),
            [Command::StartPullProcess],
        )
    );
}

#[test]
fn processing_activated_entity_returns_correct_commands() {
    let cases = [
        (false, false, State::Received, Command::AddToLocal),
        (false, true, State::Deprecated, Command::Deprecate),
        (true, false, State::Idle, Command::FinishDeleteProcess),
        (true, true, State::Deprecated, Command::Deprecate),
    ];
    for (deleting, tainted, expected_state, expected_command) in cases {
        let mut builder = snapshot().source(["1"]).outbound(["1"]);
        builder = if deleting {
            builder.processing_delete(["1"])
        } else {
            builder.processing_pull(["1"])
        };
        if tainted {
            builder = builder.flagged(["1"]);
        }
        let link = one_entity_link(builder);
        let entity = link.entity(&identifier("1")).expect("entity should be present");
        assert_eq!(
            entity.process(),
            Update::new(
                identifier("1"),
                Transition::new(State::Activated, expected_state),
                [expected_command],
            ),
            "activated entity (deleting={deleting}, tainted={tainted})"
        );
    }
}

#[test]
fn processing_received_entity_returns_correct_commands() {
    let cases = [
        (false, false, State::Pulled, Command::FinishPullProcess),
        (false, true, State::Tainted, Command::FinishPullProcess),
        (true, false, State::Activated, Command::RemoveFromLocal),
        (true, true, State::Activated, Command::RemoveFromLocal),
    ];
    for (deleting, tainted, expected_state, expected_command) in cases {
        let mut builder = snapshot().source(["1"]).outbound(["1"]).local(["1"]);
        builder = if deleting {
            builder.processing_delete(["1"])
        } else {
            builder.processing_pull(["1"])
        };
        if tainted {
            builder = builder.flagged(["1"]);
        }
        let link = one_entity_link(builder);
        let entity = link.entity(&identifier("1")).expect("entity should be present");
        assert_eq!(
            entity.process(),
            Update::new(
                identifier("1"),
                Transition::new(State::Received, expected_state),
                [expected_command],
            ),
            "received entity (deleting={deleting}, tainted={tainted})"
        );
    }
}

#[test]
fn deleting_pulled_entity_starts_delete() {
    let link = one_entity_link(snapshot().source(["1"]).outbound(["1"]).local(["1"]));
    let entity = link.entity(&identifier("1")).expect("entity should be present");
    assert_eq!(
        entity.delete(),
        Update::new(
            identifier("1"),
            Transition::new(State::Pulled, State::Received),
            [Command::StartDeleteProcess],
        )
    );
}

#[test]
fn deleting_tainted_entity_starts_delete() {
    let link = one_entity_link(
        snapshot()
            .source(["1"])
            .outbound(["1"])
            .local(["1"])
            .flagged(["1"]),
    );
    let entity = link.entity(&identifier("1")).expect("entity should be present");
    assert_eq!(
        entity.delete(),
        Update::new(
            identifier("1"),
            Transition::new(State::Tainted, State::Received),
            [Command::StartDeleteProcess],
        )
    );
}

#[test]
fn stale_hand_out_fails_projection() {
    let err = Link::from_snapshot(&snapshot().source(["1"]).outbound(["1"]).build())
        .expect_err("stale hand-out should not project");
    assert_eq!(err.class, ErrorClass::InvariantViolation);
}

#[test]
fn nesting_violation_fails_projection() {
    let err = Link::from_snapshot(&snapshot().source(["1"]).local(["1"]).build())
        .expect_err("local row without outbound row should not project");
    assert_eq!(err.class, ErrorClass::InvariantViolation);
}

#[test]
fn flag_without_hand_out_fails_projection() {
    let err = Link::from_snapshot(&snapshot().source(["1"]).flagged(["1"]).build())
        .expect_err("flag without outbound row should not project");
    assert_eq!(err.class, ErrorClass::InvariantViolation);
}

#[test]
fn process_without_hand_out_fails_projection() {
    let err = Link::from_snapshot(&snapshot().source(["1"]).processing_pull(["1"]).build())
        .expect_err("process without outbound row should not project");
    assert_eq!(err.class, ErrorClass::InvariantViolation);
}

#[test]
fn batch_commands_apply_in_canonical_order() {
    let batch = UpdateBatch::new(vec![
        Update::new(
            identifier("a"),
            Transition::new(State::Activated, State::Idle),
            [Command::FinishDeleteProcess],
        ),
        Update::new(
            identifier("b"),
            Transition::new(State::Activated, State::Received),
            [Command::AddToLocal],
        ),
        Update::new(
            identifier("c"),
            Transition::new(State::Idle, State::Activated),
            [Command::StartPullProcess],
        ),
        Update::new(
            identifier("d"),
            Transition::new(State::Activated, State::Deprecated),
            [Command::Deprecate],
        ),
        Update::new(
            identifier("e"),
            Transition::new(State::Received, State::Activated),
            [Command::RemoveFromLocal],
        ),
    ]);
    let order: Vec<Command> = batch
        .commands_in_apply_order()
        .into_iter()
        .map(|(command, _)| command)
        .collect();
    assert_eq!(
        order,
        vec![
            Command::StartPullProcess,
            Command::AddToLocal,
            Command::RemoveFromLocal,
            Command::FinishDeleteProcess,
            Command::Deprecate,
        ]
    );
}

#[test]
fn same_command_orders_by_identifier_hash() {
    let ids = ["x", "y", "z"].map(identifier);
    let batch = UpdateBatch::new(
        ids.iter()
            .map(|id| {
                Update::new(
                    id.clone(),
                    Transition::new(State::Idle, State::Activated),
                    [Command::StartPullProcess],
                )
            })
            .collect(),
    );
    let order: Vec<u64> = batch
        .commands_in_apply_order()
        .into_iter()
        .map(|(_, id)| id.key_hash())
        .collect();
    let mut sorted = order.clone();
    sorted.sort_unstable();
    assert_eq!(order, sorted, "ties should break on the key hash");
}
