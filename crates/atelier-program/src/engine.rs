// SPDX-License-Identifier: Apache-2.0
//! The validated program engine.
//!
//! A `ProgramEngine` owns one program value and the index derived from it.
//! Construction runs the full validation pass, and every mutation re-runs
//! it before committing, so a caller can never observe the engine wrapped
//! around an invalid program. Single-threaded and fully synchronous by
//! design: no operation blocks, suspends, or takes locks.

use thiserror::Error;

use atelier_instructions::InstructionRegistry;

use crate::ident::{BlockId, ItemId, ProgramId};
use crate::index::GraphIndex;
use crate::program::{Block, Item, Program};
use crate::validate::{self, TemplateMode, ValidationError};

/// Error raised by engine accessors and mutations.
///
/// Apart from [`EngineError::Invalid`], every variant is a contract
/// violation: the caller operated on an id it never obtained from this
/// engine, or skipped a required guard such as
/// [`ProgramEngine::item_can_be_deleted`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// No block with this id.
    #[error("unknown block id: {0}")]
    UnknownBlock(BlockId),
    /// No item with this id in the block.
    #[error("unknown item id: {item} (block id: {block})")]
    UnknownItem {
        /// Looked-up block.
        block: BlockId,
        /// Looked-up item.
        item: ItemId,
    },
    /// The instruction type is not in the registry.
    #[error("unknown instruction: {0}")]
    UnknownInstruction(String),
    /// The sole block of a program cannot be deleted.
    #[error("cannot delete the only block of a program")]
    LastBlock,
    /// A place / ref-to-pick item was added with no pick before it.
    #[error("no pick item precedes the insertion point (block id: {block})")]
    NoPickBefore {
        /// The block edited.
        block: BlockId,
    },
    /// `set_item` attempted to change the item's id.
    #[error("set_item must not change the item id (block id: {block}, item id: {expected}, got: {got})")]
    ItemIdChanged {
        /// Owning block.
        block: BlockId,
        /// The id addressed.
        expected: ItemId,
        /// The id found in the replacement.
        got: ItemId,
    },
    /// The item inherits no parameter from its references.
    #[error("item does not take any param from reference (block id: {block}, item id: {item})")]
    NotRefParametrized {
        /// Owning block.
        block: BlockId,
        /// The item queried.
        item: ItemId,
    },
    /// The item's type neither places nor refs-to-pick.
    #[error("item does not use ref_to_pick (block id: {block}, item id: {item})")]
    NotPickReferencing {
        /// Owning block.
        block: BlockId,
        /// The item queried.
        item: ItemId,
    },
    /// No referenced item is a pick.
    #[error("could not find pick item in references (block id: {block}, item id: {item})")]
    NoPickReference {
        /// Owning block.
        block: BlockId,
        /// The item queried.
        item: ItemId,
    },
    /// A mutation produced a structurally invalid program and was rolled
    /// back; the engine state is unchanged.
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Owns one validated program and answers every query about it.
#[derive(Debug)]
pub struct ProgramEngine<'r> {
    registry: &'r InstructionRegistry,
    program: Program,
    index: GraphIndex,
}

impl<'r> ProgramEngine<'r> {
    /// Validates `program` and wraps it.
    ///
    /// # Errors
    ///
    /// The first structural violation found, as a [`ValidationError`].
    pub fn load(
        program: Program,
        registry: &'r InstructionRegistry,
    ) -> Result<Self, ValidationError> {
        Self::load_inner(program, registry, TemplateMode::Keep)
    }

    /// Validates `program` and instantiates it as a template copy:
    /// payload values not listed in `do_not_clear` are cleared, keeping
    /// list shape and stamped frame ids.
    ///
    /// # Errors
    ///
    /// The first structural violation found, as a [`ValidationError`].
    pub fn load_template(
        program: Program,
        registry: &'r InstructionRegistry,
    ) -> Result<Self, ValidationError> {
        Self::load_inner(program, registry, TemplateMode::Instantiate)
    }

    fn load_inner(
        mut program: Program,
        registry: &'r InstructionRegistry,
        template: TemplateMode,
    ) -> Result<Self, ValidationError> {
        let index = validate::run(&mut program, registry, template)?;
        Ok(Self {
            registry,
            program,
            index,
        })
    }

    /// Re-validates a draft and swaps it in; on failure the engine keeps
    /// its previous state untouched.
    pub(crate) fn commit(&mut self, mut draft: Program) -> Result<(), EngineError> {
        let index = validate::run(&mut draft, self.registry, TemplateMode::Keep)?;
        self.program = draft;
        self.index = index;
        Ok(())
    }

    /// The registry this engine validates against.
    #[must_use]
    pub fn registry(&self) -> &'r InstructionRegistry {
        self.registry
    }

    /// The owned program value.
    #[must_use]
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Consumes the engine, returning the program for persistence.
    #[must_use]
    pub fn into_program(self) -> Program {
        self.program
    }

    /// Storage id from the header.
    #[must_use]
    pub fn program_id(&self) -> ProgramId {
        self.program.header.id
    }

    pub(crate) fn index(&self) -> &GraphIndex {
        &self.index
    }

    /// `true` when no block has any item.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.program.blocks.iter().all(|b| b.items.is_empty())
    }

    /// Block ids in document order.
    pub fn block_ids(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.index.block_order().iter().copied()
    }

    /// Item ids of `block` in document order.
    pub fn item_ids(
        &self,
        block: BlockId,
    ) -> Result<impl Iterator<Item = ItemId> + '_, EngineError> {
        let slot = self
            .index
            .block(block)
            .ok_or(EngineError::UnknownBlock(block))?;
        Ok(slot.item_order.iter().copied())
    }

    /// The first block in document order.
    #[must_use]
    pub fn first_block_id(&self) -> BlockId {
        self.program.blocks.first().map_or(BlockId::END, |b| b.id)
    }

    /// First item of `block` by position; if the block has no items, or no
    /// block was given, the first block in document order that has any
    /// item. `None` when the given block is unknown or no item exists.
    #[must_use]
    pub fn first_item_id(&self, block: Option<BlockId>) -> Option<(BlockId, ItemId)> {
        if let Some(given) = block {
            let slot = self.index.block(given)?;
            if let Some(&first) = slot.item_order.first() {
                return Some((given, first));
            }
        }
        self.index.block_order().iter().find_map(|&candidate| {
            self.index
                .block(candidate)
                .and_then(|slot| slot.item_order.first().map(|&first| (candidate, first)))
        })
    }

    /// Bounds-checked block lookup.
    pub fn block(&self, block: BlockId) -> Result<&Block, EngineError> {
        let pos = self
            .index
            .block_pos(block)
            .ok_or(EngineError::UnknownBlock(block))?;
        Ok(&self.program.blocks[pos])
    }

    /// Bounds-checked item lookup.
    pub fn item(&self, block: BlockId, item: ItemId) -> Result<&Item, EngineError> {
        let bpos = self
            .index
            .block_pos(block)
            .ok_or(EngineError::UnknownBlock(block))?;
        let ipos = self
            .index
            .item_pos(block, item)
            .ok_or(EngineError::UnknownItem { block, item })?;
        Ok(&self.program.blocks[bpos].items[ipos])
    }

    /// Instruction type name of one item.
    pub fn item_type(&self, block: BlockId, item: ItemId) -> Result<&str, EngineError> {
        Ok(self.item(block, item)?.instruction.as_str())
    }

    /// Human-readable name of one item.
    pub fn item_name(&self, block: BlockId, item: ItemId) -> Result<&str, EngineError> {
        Ok(self.item(block, item)?.name.as_str())
    }

    /// `true` if the item's type must be taught before running.
    pub fn item_requires_learning(
        &self,
        block: BlockId,
        item: ItemId,
    ) -> Result<bool, EngineError> {
        let instruction = self.item_type(block, item)?;
        Ok(self.registry.requires_learning(instruction))
    }

    /// Replaces the item addressed by `(block, item)` with `replacement`.
    ///
    /// Precondition-only write: the replacement must keep the item's id
    /// ([`EngineError::ItemIdChanged`] otherwise). The structure is not
    /// re-validated here; edits that touch edges belong in the mutation
    /// operations.
    pub fn set_item(
        &mut self,
        block: BlockId,
        item: ItemId,
        replacement: Item,
    ) -> Result<(), EngineError> {
        let bpos = self
            .index
            .block_pos(block)
            .ok_or(EngineError::UnknownBlock(block))?;
        let ipos = self
            .index
            .item_pos(block, item)
            .ok_or(EngineError::UnknownItem { block, item })?;
        if replacement.id != item {
            return Err(EngineError::ItemIdChanged {
                block,
                expected: item,
                got: replacement.id,
            });
        }
        self.program.blocks[bpos].items[ipos] = replacement;
        Ok(())
    }
}
