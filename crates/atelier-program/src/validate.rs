// SPDX-License-Identifier: Apache-2.0
//! Structural validation and index construction.
//!
//! One logical load pass, two document-order sweeps: the first builds the
//! position index while checking id well-formedness and type existence,
//! the second checks every edge, reference and required payload. The first
//! violation found is returned, tagged with the offending block, item and
//! field; a program that fails here must not be executed or edited.

use thiserror::Error;

use atelier_instructions::InstructionRegistry;

use crate::ident::{BlockId, ItemId};
use crate::index::GraphIndex;
use crate::program::{Outcome, PayloadField, Pose, Program};
use crate::resolve;

/// A structural invariant violation, naming the offending entity.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// The program has no blocks at all.
    #[error("program with zero blocks")]
    EmptyProgram,
    /// A block id is the reserved sentinel `0`.
    #[error("invalid block id: {block}")]
    InvalidBlockId {
        /// The offending id.
        block: BlockId,
    },
    /// Two blocks share an id.
    #[error("duplicate block id: {block}")]
    DuplicateBlockId {
        /// The duplicated id.
        block: BlockId,
    },
    /// An item names an instruction type the registry does not know.
    #[error("unknown instruction: {instruction} (block id: {block}, item id: {item})")]
    UnknownInstruction {
        /// Owning block.
        block: BlockId,
        /// Offending item.
        item: ItemId,
        /// The unknown type name.
        instruction: String,
    },
    /// An item id is the reserved sentinel `0`.
    #[error("invalid item id: {item} (block id: {block})")]
    InvalidItemId {
        /// Owning block.
        block: BlockId,
        /// The offending id.
        item: ItemId,
    },
    /// Two items of one block share an id.
    #[error("duplicate item id: {item} (block id: {block})")]
    DuplicateItemId {
        /// Owning block.
        block: BlockId,
        /// The duplicated id.
        item: ItemId,
    },
    /// A non-zero block edge names a block that does not exist.
    #[error("block id: {block} has invalid {field}: {target}")]
    DanglingBlockEdge {
        /// The offending block.
        block: BlockId,
        /// Which edge field dangles.
        field: Outcome,
        /// The missing target.
        target: BlockId,
    },
    /// A non-zero item edge names an item outside its block.
    #[error("block id: {block}, item id: {item} has invalid {field}: {target}")]
    DanglingItemEdge {
        /// Owning block.
        block: BlockId,
        /// The offending item.
        item: ItemId,
        /// Which edge field dangles.
        field: Outcome,
        /// The missing target.
        target: ItemId,
    },
    /// A reference names an item outside its block.
    #[error("block id: {block}, item id: {item} has invalid ref_id: {target}")]
    DanglingRef {
        /// Owning block.
        block: BlockId,
        /// The offending item.
        item: ItemId,
        /// The missing target.
        target: ItemId,
    },
    /// A required payload is resolvable neither locally nor through refs.
    #[error("no {field} for block id: {block}, item id: {item}")]
    MissingPayload {
        /// Owning block.
        block: BlockId,
        /// The offending item.
        item: ItemId,
        /// The unresolvable field.
        field: PayloadField,
    },
    /// A place / ref-to-pick item carries no references at all.
    #[error("block id: {block}, item id: {item} has no ref_id")]
    NoReference {
        /// Owning block.
        block: BlockId,
        /// The offending item.
        item: ItemId,
    },
    /// A place / ref-to-pick item references something that is not a pick.
    #[error("block id: {block}, item id: {item} has ref_id {target} which is not a pick")]
    RefNotPick {
        /// Owning block.
        block: BlockId,
        /// The offending item.
        item: ItemId,
        /// The non-pick reference.
        target: ItemId,
    },
}

/// Whether the load instantiates a template copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TemplateMode {
    /// Leave payloads as stored.
    Keep,
    /// Clear payload values not listed in `do_not_clear`, keeping list
    /// shape and stamped frame ids.
    Instantiate,
}

/// Runs the full load pass. On success the program satisfies every
/// structural invariant and the returned index is current.
pub(crate) fn run(
    program: &mut Program,
    registry: &InstructionRegistry,
    template: TemplateMode,
) -> Result<GraphIndex, ValidationError> {
    if program.blocks.is_empty() {
        return Err(ValidationError::EmptyProgram);
    }

    let mut index = GraphIndex::default();
    for (bpos, block) in program.blocks.iter().enumerate() {
        if index.contains_block(block.id) {
            return Err(ValidationError::DuplicateBlockId { block: block.id });
        }
        if block.id.is_end() {
            return Err(ValidationError::InvalidBlockId { block: block.id });
        }
        index.insert_block(block.id, bpos);
        for (ipos, item) in block.items.iter().enumerate() {
            if !registry.contains(&item.instruction) {
                return Err(ValidationError::UnknownInstruction {
                    block: block.id,
                    item: item.id,
                    instruction: item.instruction.clone(),
                });
            }
            if index.contains_item(block.id, item.id) {
                return Err(ValidationError::DuplicateItemId {
                    block: block.id,
                    item: item.id,
                });
            }
            if item.id.is_end() {
                return Err(ValidationError::InvalidItemId {
                    block: block.id,
                    item: item.id,
                });
            }
            index.insert_item(block.id, item.id, ipos);
        }
    }

    for bpos in 0..program.blocks.len() {
        let block_id = program.blocks[bpos].id;
        for outcome in [Outcome::Success, Outcome::Failure] {
            let target = program.blocks[bpos].edge(outcome);
            if !target.is_end() && !index.contains_block(target) {
                return Err(ValidationError::DanglingBlockEdge {
                    block: block_id,
                    field: outcome,
                    target,
                });
            }
        }
        for ipos in 0..program.blocks[bpos].items.len() {
            check_item(program, &index, registry, bpos, ipos)?;
            if template == TemplateMode::Instantiate {
                instantiate_item(program, bpos, ipos);
            }
        }
    }

    Ok(index)
}

fn check_item(
    program: &Program,
    index: &GraphIndex,
    registry: &InstructionRegistry,
    bpos: usize,
    ipos: usize,
) -> Result<(), ValidationError> {
    let block_id = program.blocks[bpos].id;
    let item = &program.blocks[bpos].items[ipos];

    for outcome in [Outcome::Success, Outcome::Failure] {
        let target = item.edge(outcome);
        if !target.is_end() && !index.contains_item(block_id, target) {
            return Err(ValidationError::DanglingItemEdge {
                block: block_id,
                item: item.id,
                field: outcome,
                target,
            });
        }
    }

    for &reference in &item.ref_id {
        if !index.contains_item(block_id, reference) {
            return Err(ValidationError::DanglingRef {
                block: block_id,
                item: item.id,
                target: reference,
            });
        }
    }

    for field in [PayloadField::Object, PayloadField::Pose, PayloadField::Polygon] {
        let required = match field {
            PayloadField::Object => registry.uses_object(&item.instruction),
            PayloadField::Pose => registry.uses_pose(&item.instruction),
            PayloadField::Polygon => registry.uses_polygon(&item.instruction),
        };
        if required
            && resolve::resolve_payload(program, index, registry, field, block_id, item.id)
                .is_err()
        {
            return Err(ValidationError::MissingPayload {
                block: block_id,
                item: item.id,
                field,
            });
        }
    }

    if registry.is_place(&item.instruction) || registry.ref_to_pick(&item.instruction) {
        if item.ref_id.is_empty() {
            return Err(ValidationError::NoReference {
                block: block_id,
                item: item.id,
            });
        }
        for &reference in &item.ref_id {
            let referenced = resolve::item_of(program, index, block_id, reference);
            if !referenced.is_some_and(|r| registry.is_pick(&r.instruction)) {
                return Err(ValidationError::RefNotPick {
                    block: block_id,
                    item: item.id,
                    target: reference,
                });
            }
        }
    }

    Ok(())
}

/// Clears payload values for a template copy. Stamped entries keep their
/// frame id so the editable copy opens in the right coordinate frame.
fn instantiate_item(program: &mut Program, bpos: usize, ipos: usize) {
    let item = &mut program.blocks[bpos].items[ipos];
    if !item.do_not_clear.contains(&PayloadField::Object) {
        for object in &mut item.object {
            object.clear();
        }
    }
    if !item.do_not_clear.contains(&PayloadField::Polygon) {
        for polygon in &mut item.polygon {
            polygon.points.clear();
        }
    }
    if !item.do_not_clear.contains(&PayloadField::Pose) {
        for pose in &mut item.pose {
            pose.pose = Pose::default();
        }
    }
}
