// SPDX-License-Identifier: Apache-2.0
//! The registry configuration document, end to end: deserialize, compile,
//! query.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use atelier_instructions::{InstructionRegistry, InstructionsConfig, RegistryError};

const CONFIG: &str = r#"{
    "instructions": {
        "PickFromFeeder": {
            "gui": {
                "module": "core_gui",
                "learn": "PickFromFeederLearn",
                "run": "PickFromFeederRun"
            },
            "brain": {
                "module": "core_brain",
                "fsm": "PickFromFeederFsm",
                "params": {"feeder_count": 2}
            }
        },
        "PlaceToPose": {
            "gui": {
                "module": "core_gui",
                "learn": "PlaceToPoseLearn",
                "run": "PlaceToPoseRun",
                "visualize": "PlaceToPoseVis"
            },
            "brain": {
                "module": "core_brain",
                "fsm": "PlaceToPoseFsm"
            }
        }
    },
    "using_object": ["PickFromFeeder"],
    "using_pose": ["PickFromFeeder", "PlaceToPose", "DrillPoints"],
    "pick": ["PickFromFeeder"],
    "place": ["PlaceToPose"]
}"#;

#[test]
fn a_document_compiles_into_a_queryable_catalog() {
    let config: InstructionsConfig = serde_json::from_str(CONFIG).unwrap();
    let registry = InstructionRegistry::load(config).unwrap();

    assert_eq!(
        registry.names().collect::<Vec<_>>(),
        vec!["PickFromFeeder", "PlaceToPose"]
    );
    assert!(registry.modules().any(|m| m == "core_gui"));

    let feeder = registry.get("PickFromFeeder").unwrap();
    assert_eq!(feeder.gui.learn, "PickFromFeederLearn");
    assert!(feeder.gui.visualize.is_none());
    assert_eq!(feeder.brain.fsm, "PickFromFeederFsm");

    let place = registry.get("PlaceToPose").unwrap();
    assert_eq!(place.gui.visualize.as_deref(), Some("PlaceToPoseVis"));

    // The stale "DrillPoints" entry was dropped; the rest of the pose set
    // survived. Absent lists (polygon, ref_to_pick, ...) are empty.
    assert!(registry.uses_pose("PickFromFeeder"));
    assert!(registry.uses_pose("PlaceToPose"));
    assert!(!registry.uses_pose("DrillPoints"));
    assert!(!registry.uses_polygon("PickFromFeeder"));
    assert!(!registry.ref_to_pick("PlaceToPose"));

    assert!(registry.requires_learning("PickFromFeeder"));
    assert!(registry.requires_learning("PlaceToPose"));
}

#[test]
fn a_document_with_a_broken_role_is_rejected_whole() {
    let mut config: InstructionsConfig = serde_json::from_str(CONFIG).unwrap();
    config
        .instructions
        .get_mut("PlaceToPose")
        .unwrap()
        .gui
        .run = None;
    assert_eq!(
        InstructionRegistry::load(config).unwrap_err(),
        RegistryError::MissingHandler {
            instruction: "PlaceToPose".to_owned(),
            role: "gui",
            handler: "run",
        }
    );
}
