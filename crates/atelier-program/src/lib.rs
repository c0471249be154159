// SPDX-License-Identifier: Apache-2.0
//! atelier-program: the program graph engine.
//!
//! A program is a header plus ordered blocks of instruction items,
//! connected by conditional success/failure edges. This crate owns the
//! value structure, the structural validator and its derived position
//! index, inherited-parameter resolution across same-block references,
//! next-step control-flow resolution, and the structure-preserving edit
//! operations. It performs no I/O and no rendering; persistence and
//! instruction execution are the callers' collaborators.
//!
//! Cycles in the success/failure graph are legal by design — a step may
//! point back at itself or an ancestor to express a retry loop. Only
//! dangling edges are violations.

mod edit;
mod engine;
mod flow;
mod ident;
mod index;
mod program;
mod resolve;
mod validate;

pub use engine::{EngineError, ProgramEngine};
pub use flow::Transition;
pub use ident::{BlockId, ItemId, ProgramId};
pub use program::{
    Block, Item, Outcome, PayloadField, PolygonStamped, Pose, PoseStamped, Program, ProgramHeader,
};
pub use resolve::{LearnStatus, PayloadRef, ResolveError};
pub use validate::ValidationError;
