// SPDX-License-Identifier: Apache-2.0
//! The compiled instruction catalog.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;
use tracing::warn;

use crate::config::{BrainRoleConfig, GuiRoleConfig, InstructionsConfig};
use crate::roles::{BrainRole, GuiRole};

/// Error raised while compiling or querying the registry.
///
/// Every load-time variant is fatal: a partially loaded catalog is never
/// handed out. Stale capability entries are *not* errors — they are dropped
/// with a warning during load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A role configuration omitted its hosting module.
    #[error("module not defined for instruction `{instruction}` role `{role}`")]
    MissingModule {
        /// Instruction whose role is misconfigured.
        instruction: String,
        /// Role name (`gui` or `brain`).
        role: &'static str,
    },
    /// A mandatory handler is missing from a role configuration.
    #[error("instruction `{instruction}` role `{role}`: handler `{handler}` is mandatory")]
    MissingHandler {
        /// Instruction whose role is misconfigured.
        instruction: String,
        /// Role name (`gui` or `brain`).
        role: &'static str,
        /// The missing handler key.
        handler: &'static str,
    },
    /// A name was looked up that the catalog does not contain.
    #[error("unknown instruction: {0}")]
    UnknownInstruction(String),
}

/// One compiled instruction type: its name and both role descriptors.
///
/// Capability membership lives on the registry (the sets are defined across
/// types, not per type); query it via [`InstructionRegistry::uses_object`]
/// and friends.
#[derive(Debug, Clone, PartialEq)]
pub struct InstructionType {
    /// Catalog key.
    pub name: String,
    /// Interactive role descriptor.
    pub gui: GuiRole,
    /// Execution role descriptor.
    pub brain: BrainRole,
}

impl InstructionType {
    /// Payload slot count requested by the instruction's gui `params` blob
    /// under `key`, or `default` when absent or malformed.
    ///
    /// Used when a default item is instantiated: e.g. a grid-place type may
    /// request `"objects": 2`.
    #[must_use]
    pub fn slot_count(&self, key: &str, default: usize) -> usize {
        self.gui
            .params
            .as_ref()
            .and_then(|p| p.get(key))
            .and_then(serde_json::Value::as_u64)
            .map_or(default, |n| usize::try_from(n).unwrap_or(default))
    }
}

/// The seven capability sets, compiled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct CapabilitySets {
    using_object: BTreeSet<String>,
    using_pose: BTreeSet<String>,
    using_polygon: BTreeSet<String>,
    pick: BTreeSet<String>,
    place: BTreeSet<String>,
    ref_to_pick: BTreeSet<String>,
    runnable_during_learning: BTreeSet<String>,
}

/// The authoritative catalog of instruction types.
///
/// Loaded once at startup from an [`InstructionsConfig`]; immutable
/// afterwards. Loading is all-or-nothing for instruction entries (a
/// misconfigured type aborts the load) but lenient for capability lists
/// (stale entries are dropped with a warning). That asymmetry mirrors the
/// operational reality: a broken type can never run, while a stale property
/// reference merely lags a catalog edit.
#[derive(Debug, Clone)]
pub struct InstructionRegistry {
    instructions: BTreeMap<String, InstructionType>,
    capabilities: CapabilitySets,
    modules: BTreeSet<String>,
}

impl InstructionRegistry {
    /// Compiles a raw configuration into a registry.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistryError`] if any instruction entry omits a role
    /// module or a mandatory handler. No partial catalog is returned.
    pub fn load(config: InstructionsConfig) -> Result<Self, RegistryError> {
        let mut instructions = BTreeMap::new();
        let mut modules = BTreeSet::new();

        for (name, entry) in &config.instructions {
            let gui = compile_gui(name, &entry.gui)?;
            let brain = compile_brain(name, &entry.brain)?;
            modules.insert(gui.module.clone());
            modules.insert(brain.module.clone());
            instructions.insert(
                name.clone(),
                InstructionType {
                    name: name.clone(),
                    gui,
                    brain,
                },
            );
        }

        let capabilities = CapabilitySets {
            using_object: compile_set("using_object", config.using_object, &instructions),
            using_pose: compile_set("using_pose", config.using_pose, &instructions),
            using_polygon: compile_set("using_polygon", config.using_polygon, &instructions),
            pick: compile_set("pick", config.pick, &instructions),
            place: compile_set("place", config.place, &instructions),
            ref_to_pick: compile_set("ref_to_pick", config.ref_to_pick, &instructions),
            runnable_during_learning: compile_set(
                "runnable_during_learning",
                config.runnable_during_learning,
                &instructions,
            ),
        };

        Ok(Self {
            instructions,
            capabilities,
            modules,
        })
    }

    /// Looks up an instruction type by name.
    ///
    /// # Errors
    ///
    /// [`RegistryError::UnknownInstruction`] when the catalog has no entry.
    pub fn get(&self, name: &str) -> Result<&InstructionType, RegistryError> {
        self.instructions
            .get(name)
            .ok_or_else(|| RegistryError::UnknownInstruction(name.to_owned()))
    }

    /// Returns `true` if the catalog contains `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.instructions.contains_key(name)
    }

    /// Iterates catalog keys in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.instructions.keys().map(String::as_str)
    }

    /// Distinct hosting modules named by the catalog.
    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(String::as_str)
    }

    /// True iff `name` must be taught before the program can run:
    /// membership in `using_object ∪ using_pose ∪ using_polygon`.
    #[must_use]
    pub fn requires_learning(&self, name: &str) -> bool {
        self.uses_object(name) || self.uses_pose(name) || self.uses_polygon(name)
    }

    /// True iff items of this type consume an `object` payload.
    #[must_use]
    pub fn uses_object(&self, name: &str) -> bool {
        self.capabilities.using_object.contains(name)
    }

    /// True iff items of this type consume a `pose` payload.
    #[must_use]
    pub fn uses_pose(&self, name: &str) -> bool {
        self.capabilities.using_pose.contains(name)
    }

    /// True iff items of this type consume a `polygon` payload.
    #[must_use]
    pub fn uses_polygon(&self, name: &str) -> bool {
        self.capabilities.using_polygon.contains(name)
    }

    /// True iff items of this type pick an object up.
    #[must_use]
    pub fn is_pick(&self, name: &str) -> bool {
        self.capabilities.pick.contains(name)
    }

    /// True iff items of this type place a previously picked object.
    #[must_use]
    pub fn is_place(&self, name: &str) -> bool {
        self.capabilities.place.contains(name)
    }

    /// True iff items of this type must reference a pick item.
    #[must_use]
    pub fn ref_to_pick(&self, name: &str) -> bool {
        self.capabilities.ref_to_pick.contains(name)
    }

    /// True iff items of this type may execute while teaching is underway.
    #[must_use]
    pub fn runnable_during_learning(&self, name: &str) -> bool {
        self.capabilities.runnable_during_learning.contains(name)
    }
}

fn compile_gui(name: &str, raw: &GuiRoleConfig) -> Result<GuiRole, RegistryError> {
    let module = raw
        .module
        .clone()
        .ok_or_else(|| RegistryError::MissingModule {
            instruction: name.to_owned(),
            role: "gui",
        })?;
    let learn = raw
        .learn
        .clone()
        .ok_or_else(|| RegistryError::MissingHandler {
            instruction: name.to_owned(),
            role: "gui",
            handler: "learn",
        })?;
    let run = raw.run.clone().ok_or_else(|| RegistryError::MissingHandler {
        instruction: name.to_owned(),
        role: "gui",
        handler: "run",
    })?;
    Ok(GuiRole {
        module,
        learn,
        run,
        visualize: raw.visualize.clone(),
        params: raw.params.clone(),
    })
}

fn compile_brain(name: &str, raw: &BrainRoleConfig) -> Result<BrainRole, RegistryError> {
    let module = raw
        .module
        .clone()
        .ok_or_else(|| RegistryError::MissingModule {
            instruction: name.to_owned(),
            role: "brain",
        })?;
    let fsm = raw.fsm.clone().ok_or_else(|| RegistryError::MissingHandler {
        instruction: name.to_owned(),
        role: "brain",
        handler: "fsm",
    })?;
    Ok(BrainRole {
        module,
        fsm,
        params: raw.params.clone(),
    })
}

/// Compiles one capability list, dropping entries that name unknown
/// instructions. Soft failures only.
fn compile_set(
    property: &str,
    raw: Option<Vec<String>>,
    instructions: &BTreeMap<String, InstructionType>,
) -> BTreeSet<String> {
    let Some(raw) = raw else {
        warn!(property, "capability set not defined");
        return BTreeSet::new();
    };
    let mut set = BTreeSet::new();
    for name in raw {
        if instructions.contains_key(&name) {
            set.insert(name);
        } else {
            warn!(property, instruction = %name, "capability set names unknown instruction; dropped");
        }
    }
    set
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::config::InstructionConfig;

    fn gui(module: &str) -> GuiRoleConfig {
        GuiRoleConfig {
            module: Some(module.to_owned()),
            learn: Some("Learn".to_owned()),
            run: Some("Run".to_owned()),
            visualize: None,
            params: None,
        }
    }

    fn brain(module: &str) -> BrainRoleConfig {
        BrainRoleConfig {
            module: Some(module.to_owned()),
            fsm: Some("Fsm".to_owned()),
            params: None,
        }
    }

    fn entry() -> InstructionConfig {
        InstructionConfig {
            gui: gui("pick_gui"),
            brain: brain("pick_brain"),
        }
    }

    fn config_with(names: &[&str]) -> InstructionsConfig {
        InstructionsConfig {
            instructions: names
                .iter()
                .map(|n| ((*n).to_owned(), entry()))
                .collect(),
            ..InstructionsConfig::default()
        }
    }

    #[test]
    fn missing_module_is_fatal() {
        let mut config = config_with(&["PickFromPolygon"]);
        config
            .instructions
            .get_mut("PickFromPolygon")
            .unwrap()
            .gui
            .module = None;
        let err = InstructionRegistry::load(config).unwrap_err();
        assert_eq!(
            err,
            RegistryError::MissingModule {
                instruction: "PickFromPolygon".to_owned(),
                role: "gui",
            }
        );
    }

    #[test]
    fn missing_mandatory_handler_is_fatal() {
        let mut config = config_with(&["PickFromPolygon"]);
        config
            .instructions
            .get_mut("PickFromPolygon")
            .unwrap()
            .brain
            .fsm = None;
        let err = InstructionRegistry::load(config).unwrap_err();
        assert_eq!(
            err,
            RegistryError::MissingHandler {
                instruction: "PickFromPolygon".to_owned(),
                role: "brain",
                handler: "fsm",
            }
        );
    }

    #[test]
    fn missing_visualize_is_not_fatal() {
        let config = config_with(&["GetReady"]);
        let registry = InstructionRegistry::load(config).unwrap();
        assert!(registry.get("GetReady").unwrap().gui.visualize.is_none());
    }

    #[test]
    fn stale_capability_entry_is_dropped_not_fatal() {
        let mut config = config_with(&["PickFromPolygon"]);
        config.using_object = Some(vec![
            "PickFromPolygon".to_owned(),
            "RetiredInstruction".to_owned(),
        ]);
        let registry = InstructionRegistry::load(config).unwrap();
        assert!(registry.uses_object("PickFromPolygon"));
        assert!(!registry.uses_object("RetiredInstruction"));
        assert!(!registry.contains("RetiredInstruction"));
    }

    #[test]
    fn requires_learning_is_the_payload_union() {
        let mut config = config_with(&["PickFromPolygon", "PlaceToPose", "GetReady"]);
        config.using_object = Some(vec!["PickFromPolygon".to_owned()]);
        config.using_polygon = Some(vec!["PickFromPolygon".to_owned()]);
        config.using_pose = Some(vec!["PlaceToPose".to_owned()]);
        let registry = InstructionRegistry::load(config).unwrap();
        assert!(registry.requires_learning("PickFromPolygon"));
        assert!(registry.requires_learning("PlaceToPose"));
        assert!(!registry.requires_learning("GetReady"));
    }

    #[test]
    fn unknown_lookup_errors() {
        let registry = InstructionRegistry::load(config_with(&["GetReady"])).unwrap();
        assert_eq!(
            registry.get("Nope").unwrap_err(),
            RegistryError::UnknownInstruction("Nope".to_owned())
        );
    }

    #[test]
    fn slot_count_reads_the_params_blob() {
        let mut config = config_with(&["PlaceToGrid"]);
        config
            .instructions
            .get_mut("PlaceToGrid")
            .unwrap()
            .gui
            .params = Some(serde_json::json!({ "objects": 2 }));
        let registry = InstructionRegistry::load(config).unwrap();
        let ty = registry.get("PlaceToGrid").unwrap();
        assert_eq!(ty.slot_count("objects", 1), 2);
        assert_eq!(ty.slot_count("poses", 1), 1);
    }
}
