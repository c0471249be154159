// SPDX-License-Identifier: Apache-2.0
//! Role dispatch interface: the shape every instruction handler plugs into.
//!
//! The program engine never schedules these machines; it only supplies the
//! catalog metadata and program data they read. Each machine talks back
//! through exactly two outward signals, [`Signal::Done`] and
//! [`Signal::Error`].

use std::collections::BTreeMap;

use thiserror::Error;

use crate::registry::InstructionRegistry;

/// How bad a fault is, from the caller's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational; execution may continue.
    Info,
    /// Recoverable; the step may be retried.
    Warning,
    /// The step failed; the failure edge should be taken.
    Error,
    /// Execution cannot continue at all.
    Severe,
}

/// Fault catalog shared by all instruction machines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum FaultCode {
    /// The robot reported an emergency halt.
    RobotHalted,
    /// No instance of the requested object type is visible.
    ObjectMissing,
    /// No instance of the requested object type lies inside the polygon.
    ObjectMissingInPolygon,
    /// The step needs a pose that was never selected.
    PickPoseNotSelected,
    /// The gripper lost (or never had) the selected object.
    GripperNotHoldingObject,
}

/// The two outward signals an instruction machine may emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// The step finished; `success` selects the outgoing edge.
    Done {
        /// Whether the success or the failure edge should be taken.
        success: bool,
    },
    /// The step faulted.
    Error {
        /// Fault severity.
        severity: Severity,
        /// Fault code.
        code: FaultCode,
    },
}

/// Receiver for outward signals.
pub trait SignalSink {
    /// Accepts one signal.
    fn emit(&mut self, signal: Signal);
}

/// A [`SignalSink`] that records everything; handy in tests and simulations.
#[derive(Debug, Default)]
pub struct VecSink {
    /// Signals in emission order.
    pub signals: Vec<Signal>,
}

impl SignalSink for VecSink {
    fn emit(&mut self, signal: Signal) {
        self.signals.push(signal);
    }
}

/// The uniform state-machine shape of the execution role.
///
/// One armed state runs the instruction against the live robot and world;
/// teaching adds three sub-states: passive (nothing to do), active-run
/// (execute once for feedback without touching shared state), and activated
/// (finalize a visual/confirmation step).
pub trait InstructionFsm {
    /// Armed execution during a program run.
    fn run(&mut self, sink: &mut dyn SignalSink);
    /// Passive teaching state.
    fn learn(&mut self, sink: &mut dyn SignalSink);
    /// One-shot feedback execution during teaching.
    fn learn_run(&mut self, sink: &mut dyn SignalSink);
    /// Finalizing confirmation after a teaching interaction.
    fn learn_activated(&mut self, sink: &mut dyn SignalSink);
}

/// The uniform shape of the interactive role.
///
/// `learn` and `run` are mandatory for every gui handler; `visualize` is
/// optional and defaults to "not supported".
pub trait GuiHandlers {
    /// Drives the teaching interaction for the step.
    fn learn(&mut self, sink: &mut dyn SignalSink);
    /// Drives supervised execution of the step.
    fn run(&mut self, sink: &mut dyn SignalSink);
    /// Passive visualization; returns `false` when unsupported.
    fn visualize(&mut self) -> bool {
        false
    }
}

/// Constructor for a boxed instruction machine.
pub type FsmFactory = fn() -> Box<dyn InstructionFsm>;

/// Error raised while populating a [`DispatchTable`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The registered name is not in the catalog.
    #[error("unknown instruction: {0}")]
    UnknownInstruction(String),
    /// The name was registered twice.
    #[error("duplicate dispatch registration: {0}")]
    Duplicate(String),
}

/// Registration-time table binding instruction names to machine factories.
///
/// Handlers are bound once, at startup, against a loaded registry; there is
/// no runtime resolution of handlers by configuration string.
#[derive(Default)]
pub struct DispatchTable {
    factories: BTreeMap<String, FsmFactory>,
}

impl DispatchTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to `factory`.
    ///
    /// # Errors
    ///
    /// [`DispatchError::UnknownInstruction`] if the catalog has no such
    /// type; [`DispatchError::Duplicate`] if the name is already bound.
    pub fn register(
        &mut self,
        registry: &InstructionRegistry,
        name: &str,
        factory: FsmFactory,
    ) -> Result<(), DispatchError> {
        if !registry.contains(name) {
            return Err(DispatchError::UnknownInstruction(name.to_owned()));
        }
        if self.factories.contains_key(name) {
            return Err(DispatchError::Duplicate(name.to_owned()));
        }
        self.factories.insert(name.to_owned(), factory);
        Ok(())
    }

    /// Instantiates a machine for `name`, if one is bound.
    #[must_use]
    pub fn spawn(&self, name: &str) -> Option<Box<dyn InstructionFsm>> {
        self.factories.get(name).map(|factory| factory())
    }

    /// Names with a bound factory, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchTable")
            .field("names", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
