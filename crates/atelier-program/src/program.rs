// SPDX-License-Identifier: Apache-2.0
//! The serialized program value structure.
//!
//! Field meanings are part of the interchange contract: `on_success` /
//! `on_failure` hold the id of a sibling (or `0` for "fall through"),
//! `ref_id` is a same-block lookup relation, and `do_not_clear` lists the
//! payload fields a template copy retains. The engine treats a `Program` as
//! a plain owned value; all derived state lives in the index.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ident::{BlockId, ItemId, ProgramId};

/// One of the three optional parameter payloads an item can carry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PayloadField {
    /// Object type names.
    Object,
    /// Stamped poses.
    Pose,
    /// Stamped polygons.
    Polygon,
}

impl fmt::Display for PayloadField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Object => "object",
            Self::Pose => "pose",
            Self::Polygon => "polygon",
        })
    }
}

/// A 6-DOF pose. The all-zero default is the "never taught" marker, so a
/// pose counts as set only when it differs from `Pose::default()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Cartesian position (x, y, z).
    pub position: [f64; 3],
    /// Orientation quaternion (x, y, z, w).
    pub orientation: [f64; 4],
}

impl Pose {
    /// Returns `true` once the pose has been taught.
    #[must_use]
    pub fn is_set(&self) -> bool {
        *self != Self::default()
    }
}

/// A pose tagged with the coordinate frame it is expressed in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseStamped {
    /// Coordinate frame identifier.
    pub frame_id: String,
    /// The pose itself.
    pub pose: Pose,
}

/// A planar polygon tagged with its coordinate frame. An empty point list
/// is the "never taught" marker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolygonStamped {
    /// Coordinate frame identifier.
    pub frame_id: String,
    /// Polygon vertices (x, y).
    pub points: Vec<[f64; 2]>,
}

impl PolygonStamped {
    /// Returns `true` once the polygon has been taught.
    #[must_use]
    pub fn is_set(&self) -> bool {
        !self.points.is_empty()
    }
}

/// One instruction step inside a block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Id, unique and non-zero within the owning block.
    pub id: ItemId,
    /// Instruction type name; a key into the capability registry.
    #[serde(rename = "type")]
    pub instruction: String,
    /// Human-readable label.
    pub name: String,
    /// Item to run next on success, or `0` to fall through to the block.
    pub on_success: ItemId,
    /// Item to run next on failure, or `0` to fall through to the block.
    pub on_failure: ItemId,
    /// Same-block items this one inherits parameters from.
    #[serde(default)]
    pub ref_id: Vec<ItemId>,
    /// Object type names.
    #[serde(default)]
    pub object: Vec<String>,
    /// Stamped pose payload.
    #[serde(default)]
    pub pose: Vec<PoseStamped>,
    /// Stamped polygon payload.
    #[serde(default)]
    pub polygon: Vec<PolygonStamped>,
    /// Payload fields retained when a template copy is instantiated.
    #[serde(default)]
    pub do_not_clear: BTreeSet<PayloadField>,
}

impl Item {
    /// The item's outgoing edge for `outcome`.
    #[must_use]
    pub fn edge(&self, outcome: Outcome) -> ItemId {
        match outcome {
            Outcome::Success => self.on_success,
            Outcome::Failure => self.on_failure,
        }
    }
}

/// A named group of items with its own fall-through targets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Id, unique and non-zero within the program.
    pub id: BlockId,
    /// Human-readable label.
    pub name: String,
    /// Block to enter when the last item succeeds, or `0` for program end.
    pub on_success: BlockId,
    /// Block to enter when an item fails through, or `0` for program end.
    pub on_failure: BlockId,
    /// Steps, in display order.
    #[serde(default)]
    pub items: Vec<Item>,
}

impl Block {
    /// The block's outgoing edge for `outcome`.
    #[must_use]
    pub fn edge(&self, outcome: Outcome) -> BlockId {
        match outcome {
            Outcome::Success => self.on_success,
            Outcome::Failure => self.on_failure,
        }
    }
}

/// Program header: identity and the advisory read-only flag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgramHeader {
    /// Storage id in `[1, 65535)`.
    pub id: ProgramId,
    /// Human-readable title.
    pub name: String,
    /// Advisory flag; enforcement is up to the callers sharing the store.
    #[serde(default)]
    pub readonly: bool,
}

/// The full task definition: header plus ordered blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Identity and flags.
    pub header: ProgramHeader,
    /// Blocks, in display order. A valid program has at least one.
    pub blocks: Vec<Block>,
}

impl Program {
    /// The canonical empty program: one default block that loops to itself
    /// on success and ends the program on failure.
    #[must_use]
    pub fn seed(id: ProgramId) -> Self {
        Self {
            header: ProgramHeader {
                id,
                name: format!("Program {id}"),
                readonly: false,
            },
            blocks: vec![Block {
                id: BlockId(1),
                name: "Program block 1".to_owned(),
                on_success: BlockId(1),
                on_failure: BlockId::END,
                items: Vec::new(),
            }],
        }
    }
}

/// Which conditional edge a transition follows.
///
/// Doubles as the edge field selector in diagnostics; `Display` therefore
/// renders the wire field name (`on_success` / `on_failure`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Follow `on_success`.
    Success,
    /// Follow `on_failure`.
    Failure,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "on_success",
            Self::Failure => "on_failure",
        })
    }
}
