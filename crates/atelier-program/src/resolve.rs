// SPDX-License-Identifier: Apache-2.0
//! Inherited-parameter resolution.
//!
//! An item that carries its own payload wins outright; otherwise its
//! `ref_id` entries are tried in declaration order, recursively, first hit
//! wins. The traversal carries a visited set: reference graphs are not
//! proven acyclic by the validator, and a cycle must read as "not found"
//! rather than hang.

use std::collections::BTreeSet;

use thiserror::Error;

use atelier_instructions::InstructionRegistry;

use crate::engine::{EngineError, ProgramEngine};
use crate::ident::{BlockId, ItemId};
use crate::index::GraphIndex;
use crate::program::{Item, PayloadField, PolygonStamped, PoseStamped, Program};

/// Error raised by payload resolution. Recoverable per item: a caller
/// treats the item as not learned and asks the operator for more input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The item's instruction type does not use the field at all.
    #[error("instruction type `{instruction}` does not use `{field}`")]
    FieldNotUsed {
        /// The offending type name.
        instruction: String,
        /// The requested field.
        field: PayloadField,
    },
    /// Neither the item nor anything reachable through `ref_id` has a value.
    #[error("`{field}` not found in item, nor in any referenced item (block id: {block}, item id: {item})")]
    NotFound {
        /// The requested field.
        field: PayloadField,
        /// Owning block.
        block: BlockId,
        /// Starting item.
        item: ItemId,
    },
    /// The starting item does not exist.
    #[error("unknown item (block id: {block}, item id: {item})")]
    UnknownItem {
        /// Looked-up block.
        block: BlockId,
        /// Looked-up item.
        item: ItemId,
    },
}

/// A borrowed view of one resolved payload list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PayloadRef<'p> {
    /// Object type names.
    Object(&'p [String]),
    /// Stamped poses.
    Pose(&'p [PoseStamped]),
    /// Stamped polygons.
    Polygon(&'p [PolygonStamped]),
}

impl<'p> PayloadRef<'p> {
    /// Number of entries in the list.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Object(v) => v.len(),
            Self::Pose(v) => v.len(),
            Self::Polygon(v) => v.len(),
        }
    }

    /// `true` when the list has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The field this payload belongs to.
    #[must_use]
    pub fn field(&self) -> PayloadField {
        match self {
            Self::Object(_) => PayloadField::Object,
            Self::Pose(_) => PayloadField::Pose,
            Self::Polygon(_) => PayloadField::Polygon,
        }
    }

    /// The object list, if that is what was resolved.
    #[must_use]
    pub fn into_object(self) -> Option<&'p [String]> {
        match self {
            Self::Object(v) => Some(v),
            _ => None,
        }
    }

    /// The pose list, if that is what was resolved.
    #[must_use]
    pub fn into_pose(self) -> Option<&'p [PoseStamped]> {
        match self {
            Self::Pose(v) => Some(v),
            _ => None,
        }
    }

    /// The polygon list, if that is what was resolved.
    #[must_use]
    pub fn into_polygon(self) -> Option<&'p [PolygonStamped]> {
        match self {
            Self::Polygon(v) => Some(v),
            _ => None,
        }
    }

    /// `true` when every entry has been taught a real value.
    #[must_use]
    pub fn all_set(&self) -> bool {
        match self {
            Self::Object(v) => v.iter().all(|o| !o.is_empty()),
            Self::Pose(v) => v.iter().all(|p| p.pose.is_set()),
            Self::Polygon(v) => v.iter().all(PolygonStamped::is_set),
        }
    }
}

/// Learning status of one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearnStatus {
    /// The type requires no taught parameters.
    NotApplicable,
    /// Every required parameter resolves to a taught value.
    Learned,
    /// At least one required parameter is missing or untaught.
    NotLearned,
}

impl LearnStatus {
    /// `true` unless the item is positively unlearned; "nothing to teach"
    /// counts as satisfied.
    #[must_use]
    pub fn is_satisfied(self) -> bool {
        !matches!(self, Self::NotLearned)
    }
}

fn uses(registry: &InstructionRegistry, field: PayloadField, instruction: &str) -> bool {
    match field {
        PayloadField::Object => registry.uses_object(instruction),
        PayloadField::Pose => registry.uses_pose(instruction),
        PayloadField::Polygon => registry.uses_polygon(instruction),
    }
}

fn payload_of(item: &Item, field: PayloadField) -> PayloadRef<'_> {
    match field {
        PayloadField::Object => PayloadRef::Object(&item.object),
        PayloadField::Pose => PayloadRef::Pose(&item.pose),
        PayloadField::Polygon => PayloadRef::Polygon(&item.polygon),
    }
}

pub(crate) fn item_of<'p>(
    program: &'p Program,
    index: &GraphIndex,
    block: BlockId,
    item: ItemId,
) -> Option<&'p Item> {
    let bpos = index.block_pos(block)?;
    let ipos = index.item_pos(block, item)?;
    program.blocks.get(bpos)?.items.get(ipos)
}

/// Resolves `field` for `(block, item)` against an already-built index.
///
/// Also used by the validation pass for the "required payload resolvable"
/// invariant, which is why it does not go through the engine.
pub(crate) fn resolve_payload<'p>(
    program: &'p Program,
    index: &GraphIndex,
    registry: &InstructionRegistry,
    field: PayloadField,
    block: BlockId,
    item: ItemId,
) -> Result<(PayloadRef<'p>, ItemId), ResolveError> {
    let top = item_of(program, index, block, item)
        .ok_or(ResolveError::UnknownItem { block, item })?;
    if !uses(registry, field, &top.instruction) {
        return Err(ResolveError::FieldNotUsed {
            instruction: top.instruction.clone(),
            field,
        });
    }
    let mut visited = BTreeSet::new();
    walk(program, index, registry, field, block, item, &mut visited)
        .ok_or(ResolveError::NotFound { block, item, field })
}

/// Depth-first search over the reference graph. Locality wins: an item's
/// own non-empty payload is returned without looking at `ref_id`.
fn walk<'p>(
    program: &'p Program,
    index: &GraphIndex,
    registry: &InstructionRegistry,
    field: PayloadField,
    block: BlockId,
    item: ItemId,
    visited: &mut BTreeSet<ItemId>,
) -> Option<(PayloadRef<'p>, ItemId)> {
    if !visited.insert(item) {
        return None;
    }
    let msg = item_of(program, index, block, item)?;
    if !uses(registry, field, &msg.instruction) {
        return None;
    }
    let payload = payload_of(msg, field);
    if !payload.is_empty() {
        return Some((payload, item));
    }
    for &reference in &msg.ref_id {
        if let Some(hit) = walk(program, index, registry, field, block, reference, visited) {
            return Some(hit);
        }
    }
    None
}

/// Resolves and then checks that every entry carries a taught value.
pub(crate) fn payload_set(
    program: &Program,
    index: &GraphIndex,
    registry: &InstructionRegistry,
    field: PayloadField,
    block: BlockId,
    item: ItemId,
) -> Result<bool, ResolveError> {
    let (payload, _) = resolve_payload(program, index, registry, field, block, item)?;
    Ok(payload.all_set())
}

const FIELDS: [PayloadField; 3] = [
    PayloadField::Polygon,
    PayloadField::Pose,
    PayloadField::Object,
];

impl<'r> ProgramEngine<'r> {
    /// Resolves `field` for `(block, item)`: the item's own payload, or the
    /// first hit found through `ref_id` in declaration order.
    ///
    /// # Errors
    ///
    /// See [`ResolveError`].
    pub fn resolve(
        &self,
        field: PayloadField,
        block: BlockId,
        item: ItemId,
    ) -> Result<(PayloadRef<'_>, ItemId), ResolveError> {
        resolve_payload(self.program(), self.index(), self.registry(), field, block, item)
    }

    /// Resolved object list and its source item.
    pub fn object(&self, block: BlockId, item: ItemId) -> Result<(&[String], ItemId), ResolveError> {
        let (payload, source) = self.resolve(PayloadField::Object, block, item)?;
        payload
            .into_object()
            .map(|v| (v, source))
            .ok_or(ResolveError::NotFound {
                field: PayloadField::Object,
                block,
                item,
            })
    }

    /// Resolved pose list and its source item.
    pub fn pose(&self, block: BlockId, item: ItemId) -> Result<(&[PoseStamped], ItemId), ResolveError> {
        let (payload, source) = self.resolve(PayloadField::Pose, block, item)?;
        payload
            .into_pose()
            .map(|v| (v, source))
            .ok_or(ResolveError::NotFound {
                field: PayloadField::Pose,
                block,
                item,
            })
    }

    /// Resolved polygon list and its source item.
    pub fn polygon(
        &self,
        block: BlockId,
        item: ItemId,
    ) -> Result<(&[PolygonStamped], ItemId), ResolveError> {
        let (payload, source) = self.resolve(PayloadField::Polygon, block, item)?;
        payload
            .into_polygon()
            .map(|v| (v, source))
            .ok_or(ResolveError::NotFound {
                field: PayloadField::Polygon,
                block,
                item,
            })
    }

    /// Whether every resolved entry of `field` carries a taught value.
    pub fn payload_set(
        &self,
        field: PayloadField,
        block: BlockId,
        item: ItemId,
    ) -> Result<bool, ResolveError> {
        payload_set(self.program(), self.index(), self.registry(), field, block, item)
    }

    /// Learning status of one item.
    ///
    /// `NotApplicable` when the type requires no taught parameters;
    /// otherwise `Learned` only if every required field resolves to taught
    /// values. A resolution failure reads as `NotLearned`.
    pub fn item_learned(&self, block: BlockId, item: ItemId) -> Result<LearnStatus, EngineError> {
        let msg = self.item(block, item)?;
        if !self.registry().requires_learning(&msg.instruction) {
            return Ok(LearnStatus::NotApplicable);
        }
        for field in FIELDS {
            if !uses(self.registry(), field, &msg.instruction) {
                continue;
            }
            match self.payload_set(field, block, item) {
                Ok(true) => {}
                Ok(false) | Err(_) => return Ok(LearnStatus::NotLearned),
            }
        }
        Ok(LearnStatus::Learned)
    }

    /// `true` once every item of the block is learned (or has nothing to
    /// learn).
    pub fn block_learned(&self, block: BlockId) -> Result<bool, EngineError> {
        for item in self.item_ids(block)?.collect::<Vec<_>>() {
            if !self.item_learned(block, item)?.is_satisfied() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// `true` once the program is non-empty and every block is learned.
    #[must_use]
    pub fn program_learned(&self) -> bool {
        if self.is_empty() {
            return false;
        }
        self.block_ids()
            .collect::<Vec<_>>()
            .into_iter()
            .all(|block| self.block_learned(block).unwrap_or(false))
    }

    /// `true` if the item would inherit at least one required parameter
    /// from its references (it has refs and an own payload list is empty).
    pub fn item_takes_params_from_ref(
        &self,
        block: BlockId,
        item: ItemId,
    ) -> Result<bool, EngineError> {
        let msg = self.item(block, item)?;
        if msg.ref_id.is_empty() {
            return Ok(false);
        }
        Ok((self.registry().uses_object(&msg.instruction) && msg.object.is_empty())
            || (self.registry().uses_polygon(&msg.instruction) && msg.polygon.is_empty())
            || (self.registry().uses_pose(&msg.instruction) && msg.pose.is_empty()))
    }

    /// Whether every parameter the item inherits from its references has
    /// been taught.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotRefParametrized`] when the item inherits nothing.
    pub fn ref_params_learned(&self, block: BlockId, item: ItemId) -> Result<bool, EngineError> {
        if !self.item_takes_params_from_ref(block, item)? {
            return Err(EngineError::NotRefParametrized { block, item });
        }
        let msg = self.item(block, item)?;
        for field in FIELDS {
            let own_empty = payload_of(msg, field).is_empty();
            if uses(self.registry(), field, &msg.instruction) && own_empty {
                match self.payload_set(field, block, item) {
                    Ok(true) => {}
                    Ok(false) | Err(_) => return Ok(false),
                }
            }
        }
        Ok(true)
    }

    /// Learning status of the pick this item references, with the pick's
    /// id.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotPickReferencing`] when the type is neither a
    /// place nor ref-to-pick; [`EngineError::NoPickReference`] when no
    /// referenced item is a pick.
    pub fn ref_pick_learned(
        &self,
        block: BlockId,
        item: ItemId,
    ) -> Result<(LearnStatus, ItemId), EngineError> {
        let msg = self.item(block, item)?;
        if !self.registry().is_place(&msg.instruction)
            && !self.registry().ref_to_pick(&msg.instruction)
        {
            return Err(EngineError::NotPickReferencing { block, item });
        }
        let refs = msg.ref_id.clone();
        for reference in refs {
            let ref_type = self.item_type(block, reference)?;
            if self.registry().is_pick(ref_type) {
                return Ok((self.item_learned(block, reference)?, reference));
            }
        }
        Err(EngineError::NoPickReference { block, item })
    }

    /// `true` when the item carries no payload lists at all.
    pub fn item_has_nothing_to_set(&self, block: BlockId, item: ItemId) -> Result<bool, EngineError> {
        let msg = self.item(block, item)?;
        Ok(msg.object.is_empty() && msg.pose.is_empty() && msg.polygon.is_empty())
    }
}
