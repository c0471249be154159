// SPDX-License-Identifier: Apache-2.0
//! Reference resolution and learning status.
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use atelier_program::{
    BlockId, EngineError, ItemId, LearnStatus, PayloadField, Pose, PoseStamped, ProgramEngine,
    ResolveError,
};
use common::{
    block, item, pick_feeder, pick_polygon, place, program, registry, taught_pose,
};

#[test]
fn own_payload_wins_over_references() {
    let registry = registry();
    let mut own = taught_pose();
    own.pose.position = [9.0, 9.0, 9.0];
    let mut put = place(2, &[1]);
    put.pose = vec![own.clone()];
    let prog = program(vec![block(1, 0, 0, vec![pick_feeder(1), put])]);
    let engine = ProgramEngine::load(prog, &registry).unwrap();

    let (poses, source) = engine.pose(BlockId(1), ItemId(2)).unwrap();
    // Locality precedence: the item's own pose is returned and the source
    // is the item itself, so the reference was never consulted.
    assert_eq!(source, ItemId(2));
    assert_eq!(poses, &[own]);
}

#[test]
fn references_resolve_in_declaration_order() {
    let registry = registry();
    let mut first = pick_feeder(1);
    first.pose[0].pose.position = [1.0, 0.0, 0.0];
    let mut second = pick_feeder(2);
    second.pose[0].pose.position = [2.0, 0.0, 0.0];
    let mut put = place(3, &[2, 1]);
    put.pose.clear();
    let prog = program(vec![block(1, 0, 0, vec![first, second, put])]);
    let engine = ProgramEngine::load(prog, &registry).unwrap();

    let (poses, source) = engine.pose(BlockId(1), ItemId(3)).unwrap();
    assert_eq!(source, ItemId(2));
    assert_eq!(poses[0].pose.position, [2.0, 0.0, 0.0]);
}

#[test]
fn resolution_follows_chains_transitively() {
    let registry = registry();
    let head = pick_feeder(1);
    let mut middle = pick_feeder(2);
    middle.pose.clear();
    middle.ref_id = vec![ItemId(1)];
    let mut tail = pick_feeder(3);
    tail.pose.clear();
    tail.ref_id = vec![ItemId(2)];
    let prog = program(vec![block(1, 0, 0, vec![head, middle, tail])]);
    let engine = ProgramEngine::load(prog, &registry).unwrap();

    let (_, source) = engine.pose(BlockId(1), ItemId(3)).unwrap();
    assert_eq!(source, ItemId(1));
}

#[test]
fn cyclic_reference_chains_terminate() {
    let registry = registry();
    // 1 and 2 reference each other; only 2 carries a pose. Resolution from
    // either side must terminate, finding 2's pose.
    let mut a = pick_feeder(1);
    a.pose.clear();
    a.ref_id = vec![ItemId(2)];
    let mut b = pick_feeder(2);
    b.ref_id = vec![ItemId(1)];
    let prog = program(vec![block(1, 0, 0, vec![a, b])]);
    let engine = ProgramEngine::load(prog, &registry).unwrap();

    assert_eq!(engine.pose(BlockId(1), ItemId(1)).unwrap().1, ItemId(2));
    assert_eq!(engine.pose(BlockId(1), ItemId(2)).unwrap().1, ItemId(2));
}

#[test]
fn cyclic_chains_with_no_value_fail_validation_finitely() {
    let registry = registry();
    let mut a = pick_feeder(1);
    a.pose.clear();
    a.ref_id = vec![ItemId(2)];
    let mut b = pick_feeder(2);
    b.pose.clear();
    b.ref_id = vec![ItemId(1)];
    let prog = program(vec![block(1, 0, 0, vec![a, b])]);
    // The cycle yields no pose: validation reports it rather than hanging.
    let err = ProgramEngine::load(prog, &registry).unwrap_err();
    assert_eq!(
        err,
        atelier_program::ValidationError::MissingPayload {
            block: BlockId(1),
            item: ItemId(1),
            field: PayloadField::Pose,
        }
    );
}

#[test]
fn unused_fields_are_refused() {
    let registry = registry();
    let prog = program(vec![block(1, 0, 0, vec![item(1, "GetReady")])]);
    let engine = ProgramEngine::load(prog, &registry).unwrap();
    assert_eq!(
        engine.polygon(BlockId(1), ItemId(1)).unwrap_err(),
        ResolveError::FieldNotUsed {
            instruction: "GetReady".to_owned(),
            field: PayloadField::Polygon,
        }
    );
}

#[test]
fn emptied_payload_reads_as_not_found_and_not_learned() {
    let registry = registry();
    let engine_prog = common::pick_place_program();
    let mut engine = ProgramEngine::load(engine_prog, &registry).unwrap();
    assert_eq!(
        engine.item_learned(BlockId(1), ItemId(2)).unwrap(),
        LearnStatus::Learned
    );

    // `set_item` is a precondition-only write; emptying the pose list is
    // the caller's way of asking for the step to be re-taught.
    let mut put = engine.item(BlockId(1), ItemId(2)).unwrap().clone();
    put.pose.clear();
    engine.set_item(BlockId(1), ItemId(2), put).unwrap();

    assert_eq!(
        engine.pose(BlockId(1), ItemId(2)).unwrap_err(),
        ResolveError::NotFound {
            field: PayloadField::Pose,
            block: BlockId(1),
            item: ItemId(2),
        }
    );
    assert_eq!(
        engine.item_learned(BlockId(1), ItemId(2)).unwrap(),
        LearnStatus::NotLearned
    );
}

#[test]
fn learning_status_tracks_taught_values() {
    let registry = registry();
    let mut untaught = pick_polygon(1);
    untaught.object = vec![String::new()];
    untaught.on_success = ItemId(2);
    let prog = program(vec![block(
        1,
        0,
        0,
        vec![untaught, place(2, &[1]), item(3, "GetReady")],
    )]);
    let engine = ProgramEngine::load(prog, &registry).unwrap();

    // Empty object string: resolvable but untaught.
    assert_eq!(
        engine.item_learned(BlockId(1), ItemId(1)).unwrap(),
        LearnStatus::NotLearned
    );
    assert_eq!(
        engine.item_learned(BlockId(1), ItemId(2)).unwrap(),
        LearnStatus::Learned
    );
    // GetReady has nothing to teach.
    assert_eq!(
        engine.item_learned(BlockId(1), ItemId(3)).unwrap(),
        LearnStatus::NotApplicable
    );
    assert!(!engine.item_requires_learning(BlockId(1), ItemId(3)).unwrap());

    assert!(!engine.block_learned(BlockId(1)).unwrap());
    assert!(!engine.program_learned());
}

#[test]
fn program_learned_needs_every_block_and_at_least_one_item() {
    let registry = registry();

    let engine = ProgramEngine::load(common::trolley_program(), &registry).unwrap();
    assert!(engine.block_learned(BlockId(1)).unwrap());
    assert!(engine.program_learned());

    // A program whose blocks are all empty is never learned.
    let empty = program(vec![block(1, 1, 0, vec![])]);
    let engine = ProgramEngine::load(empty, &registry).unwrap();
    assert!(engine.block_learned(BlockId(1)).unwrap());
    assert!(!engine.program_learned());
}

#[test]
fn ref_parameter_queries() {
    let registry = registry();
    let mut put = place(2, &[1]);
    put.pose.clear();
    let mut pick = pick_feeder(1);
    pick.on_success = ItemId(2);
    let prog = program(vec![block(1, 0, 0, vec![pick, put])]);
    let engine = ProgramEngine::load(prog, &registry).unwrap();

    // The place inherits its pose from the pick.
    assert!(engine
        .item_takes_params_from_ref(BlockId(1), ItemId(2))
        .unwrap());
    assert!(engine.ref_params_learned(BlockId(1), ItemId(2)).unwrap());
    assert!(!engine
        .item_takes_params_from_ref(BlockId(1), ItemId(1))
        .unwrap());
    assert_eq!(
        engine.ref_params_learned(BlockId(1), ItemId(1)).unwrap_err(),
        EngineError::NotRefParametrized {
            block: BlockId(1),
            item: ItemId(1),
        }
    );

    assert_eq!(
        engine.ref_pick_learned(BlockId(1), ItemId(2)).unwrap(),
        (LearnStatus::Learned, ItemId(1))
    );
    assert_eq!(
        engine.ref_pick_learned(BlockId(1), ItemId(1)).unwrap_err(),
        EngineError::NotPickReferencing {
            block: BlockId(1),
            item: ItemId(1),
        }
    );

    assert!(engine
        .item_has_nothing_to_set(BlockId(1), ItemId(2))
        .unwrap());
    assert!(!engine
        .item_has_nothing_to_set(BlockId(1), ItemId(1))
        .unwrap());
}

#[test]
fn untaught_pose_is_the_all_zero_default() {
    let pose = PoseStamped {
        frame_id: "marker".to_owned(),
        pose: Pose::default(),
    };
    assert!(!pose.pose.is_set());
    assert!(taught_pose().pose.is_set());
}
