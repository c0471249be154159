// SPDX-License-Identifier: Apache-2.0
//! Shared fixtures: a small instruction catalog and ready-made programs.
#![allow(dead_code, clippy::unwrap_used)]

use atelier_instructions::{InstructionRegistry, InstructionsConfig};
use atelier_program::{
    Block, BlockId, Item, ItemId, PolygonStamped, Pose, PoseStamped, Program, ProgramHeader,
    ProgramId,
};

/// Catalog used across the suites; shapes and names follow the tabletop
/// teaching setup the engine was built for.
pub fn registry() -> InstructionRegistry {
    let config: InstructionsConfig = serde_json::from_value(serde_json::json!({
        "instructions": {
            "PickFromPolygon": {
                "gui": {"module": "core_gui", "learn": "PickFromPolygonLearn", "run": "PickFromPolygonRun"},
                "brain": {"module": "core_brain", "fsm": "PickFromPolygonFsm"}
            },
            "PickFromFeeder": {
                "gui": {"module": "core_gui", "learn": "PickFromFeederLearn", "run": "PickFromFeederRun"},
                "brain": {"module": "core_brain", "fsm": "PickFromFeederFsm"}
            },
            "PlaceToPose": {
                "gui": {"module": "core_gui", "learn": "PlaceToPoseLearn", "run": "PlaceToPoseRun", "visualize": "PlaceToPoseVis"},
                "brain": {"module": "core_brain", "fsm": "PlaceToPoseFsm"}
            },
            "PlaceToGrid": {
                "gui": {"module": "core_gui", "learn": "PlaceToGridLearn", "run": "PlaceToGridRun", "params": {"objects": 2}},
                "brain": {"module": "core_brain", "fsm": "PlaceToGridFsm"}
            },
            "VisualInspection": {
                "gui": {"module": "inspection_gui", "learn": "VisualInspectionLearn", "run": "VisualInspectionRun"},
                "brain": {"module": "inspection_brain", "fsm": "VisualInspectionFsm"}
            },
            "WaitUntilUserFinishes": {
                "gui": {"module": "core_gui", "learn": "WaitLearn", "run": "WaitRun"},
                "brain": {"module": "core_brain", "fsm": "WaitFsm"}
            },
            "GetReady": {
                "gui": {"module": "core_gui", "learn": "GetReadyLearn", "run": "GetReadyRun"},
                "brain": {"module": "core_brain", "fsm": "GetReadyFsm"}
            }
        },
        "using_object": ["PickFromPolygon", "PickFromFeeder", "PlaceToGrid"],
        "using_pose": ["PickFromFeeder", "PlaceToPose", "PlaceToGrid", "VisualInspection"],
        "using_polygon": ["PickFromPolygon"],
        "pick": ["PickFromPolygon", "PickFromFeeder"],
        "place": ["PlaceToPose", "PlaceToGrid"],
        "ref_to_pick": ["VisualInspection"],
        "runnable_during_learning": ["GetReady"]
    }))
    .unwrap();
    InstructionRegistry::load(config).unwrap()
}

/// A taught pose (identity orientation, somewhere over the table).
pub fn taught_pose() -> PoseStamped {
    PoseStamped {
        frame_id: "marker".to_owned(),
        pose: Pose {
            position: [0.45, 0.25, 0.1],
            orientation: [0.0, 0.0, 0.0, 1.0],
        },
    }
}

/// A taught rectangular pick area.
pub fn taught_polygon() -> PolygonStamped {
    PolygonStamped {
        frame_id: "marker".to_owned(),
        points: vec![[0.2, 0.2], [0.8, 0.2], [0.8, 0.6], [0.2, 0.6]],
    }
}

/// Bare item of the given type; edges default to the fall-through sentinel.
pub fn item(id: u32, instruction: &str) -> Item {
    Item {
        id: ItemId(id),
        instruction: instruction.to_owned(),
        name: format!("{instruction} {id}"),
        ..Item::default()
    }
}

/// A fully taught polygon pick.
pub fn pick_polygon(id: u32) -> Item {
    Item {
        object: vec!["profile_20_60".to_owned()],
        polygon: vec![taught_polygon()],
        ..item(id, "PickFromPolygon")
    }
}

/// A fully taught feeder pick.
pub fn pick_feeder(id: u32) -> Item {
    Item {
        object: vec!["profile_20_60".to_owned()],
        pose: vec![taught_pose()],
        ..item(id, "PickFromFeeder")
    }
}

/// A fully taught place referencing the given picks.
pub fn place(id: u32, refs: &[u32]) -> Item {
    Item {
        ref_id: refs.iter().map(|&r| ItemId(r)).collect(),
        pose: vec![taught_pose()],
        ..item(id, "PlaceToPose")
    }
}

/// Block with the given edges and items.
pub fn block(id: u32, on_success: u32, on_failure: u32, items: Vec<Item>) -> Block {
    Block {
        id: BlockId(id),
        name: format!("Program block {id}"),
        on_success: BlockId(on_success),
        on_failure: BlockId(on_failure),
        items,
    }
}

/// Program with the given blocks.
pub fn program(blocks: Vec<Block>) -> Program {
    Program {
        header: ProgramHeader {
            id: ProgramId(1),
            name: "Training".to_owned(),
            readonly: false,
        },
        blocks,
    }
}

/// One block: a taught pick chained to a place that references it.
pub fn pick_place_program() -> Program {
    let mut pick = pick_polygon(1);
    pick.on_success = ItemId(2);
    program(vec![block(1, 0, 0, vec![pick, place(2, &[1])])])
}

/// The single-block training program: pick, place, get ready, wait, loop.
pub fn trolley_program() -> Program {
    let mut pick = pick_polygon(1);
    pick.on_success = ItemId(2);
    let mut put = place(2, &[1]);
    put.on_success = ItemId(3);
    let mut ready = item(3, "GetReady");
    ready.on_success = ItemId(4);
    let mut wait = item(4, "WaitUntilUserFinishes");
    wait.ref_id = vec![ItemId(2)];
    wait.on_success = ItemId(1);
    program(vec![block(1, 1, 0, vec![pick, put, ready, wait])])
}
