// SPDX-License-Identifier: Apache-2.0
//! Compiled role descriptors.
//!
//! The raw configuration ([`crate::GuiRoleConfig`], [`crate::BrainRoleConfig`])
//! models every handler as optional; these types are what survives
//! compilation. Required members are plain `String`s, so a registry that
//! loaded successfully cannot hand out a role with a missing mandatory
//! handler.

use serde_json::Value;

/// Interactive role: drives teaching and supervised execution of one step.
#[derive(Debug, Clone, PartialEq)]
pub struct GuiRole {
    /// Hosting component for the handlers.
    pub module: String,
    /// Teaching entry point (mandatory).
    pub learn: String,
    /// Supervised-run entry point (mandatory).
    pub run: String,
    /// Passive visualization entry point.
    pub visualize: Option<String>,
    /// Free-form per-instruction parameters.
    pub params: Option<Value>,
}

/// Execution role: the per-instruction state machine run by the brain.
#[derive(Debug, Clone, PartialEq)]
pub struct BrainRole {
    /// Hosting component for the state machine.
    pub module: String,
    /// State machine entry point (mandatory).
    pub fsm: String,
    /// Free-form per-instruction parameters.
    pub params: Option<Value>,
}
