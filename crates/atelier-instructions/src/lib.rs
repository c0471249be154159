// SPDX-License-Identifier: Apache-2.0
//! atelier-instructions: the instruction capability catalog.
//!
//! A program step is typed by name ("PickFromPolygon", "PlaceToPose", ...).
//! This crate loads, once at startup, the configuration that says which
//! instruction types exist, which capability sets each belongs to, and which
//! role handlers (interactive gui, executing brain) each provides. The
//! program engine consumes only the compiled catalog; it never resolves
//! handlers by name at runtime.

mod config;
mod fsm;
mod registry;
mod roles;

pub use config::{BrainRoleConfig, GuiRoleConfig, InstructionConfig, InstructionsConfig};
pub use fsm::{
    DispatchError, DispatchTable, FaultCode, FsmFactory, GuiHandlers, InstructionFsm, Severity,
    Signal, SignalSink, VecSink,
};
pub use registry::{InstructionRegistry, InstructionType, RegistryError};
pub use roles::{BrainRole, GuiRole};
