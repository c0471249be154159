// SPDX-License-Identifier: Apache-2.0
//! Raw, serde-deserializable registry configuration.
//!
//! Everything here is optional-by-field so that a malformed document still
//! deserializes; the hard/soft failure split is applied when the raw
//! structure is compiled by [`crate::InstructionRegistry::load`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Raw configuration for one role of one instruction.
///
/// `module` names the component that hosts the handlers; the handler fields
/// name entry points within it. Which fields are mandatory depends on the
/// role (gui: `learn` + `run`; brain: `fsm`) and is enforced at compile
/// time into [`crate::GuiRole`] / [`crate::BrainRole`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuiRoleConfig {
    /// Hosting component for the interactive handlers.
    pub module: Option<String>,
    /// Entry point invoked while the step is being taught.
    pub learn: Option<String>,
    /// Entry point invoked while the step runs.
    pub run: Option<String>,
    /// Optional entry point for passive visualization.
    pub visualize: Option<String>,
    /// Free-form per-instruction parameters.
    pub params: Option<serde_json::Value>,
}

/// Raw configuration for the execution ("brain") role of one instruction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrainRoleConfig {
    /// Hosting component for the state machine.
    pub module: Option<String>,
    /// Entry point for the instruction state machine.
    pub fsm: Option<String>,
    /// Free-form per-instruction parameters.
    pub params: Option<serde_json::Value>,
}

/// Raw configuration for one instruction type: both roles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstructionConfig {
    /// Interactive role.
    #[serde(default)]
    pub gui: GuiRoleConfig,
    /// Execution role.
    #[serde(default)]
    pub brain: BrainRoleConfig,
}

/// The full registry configuration document.
///
/// The seven capability lists are optional: an absent list compiles to the
/// empty set (with a warning), while an entry naming an unknown instruction
/// is dropped (with a warning). Instruction entries themselves are checked
/// strictly — see [`crate::InstructionRegistry::load`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstructionsConfig {
    /// Instruction name → role configuration.
    pub instructions: BTreeMap<String, InstructionConfig>,
    /// Types that consume an `object` payload.
    pub using_object: Option<Vec<String>>,
    /// Types that consume a `pose` payload.
    pub using_pose: Option<Vec<String>>,
    /// Types that consume a `polygon` payload.
    pub using_polygon: Option<Vec<String>>,
    /// Types that pick an object up.
    pub pick: Option<Vec<String>>,
    /// Types that place a previously picked object.
    pub place: Option<Vec<String>>,
    /// Types that must reference a pick without being a place themselves.
    pub ref_to_pick: Option<Vec<String>>,
    /// Types that may execute while the program is still being taught.
    pub runnable_during_learning: Option<Vec<String>>,
}
