// SPDX-License-Identifier: Apache-2.0
//! Next-step resolution over the success/failure graph.
//!
//! The central control-flow rule, two-level fallthrough: an item's own
//! edge wins when non-zero; otherwise the owning block's edge decides, and
//! a zero block edge ends the program. A block target is entered at its
//! first item by position.

use crate::engine::{EngineError, ProgramEngine};
use crate::ident::{BlockId, ItemId};
use crate::program::Outcome;

/// Where execution goes after an item finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Run this item next.
    Step(BlockId, ItemId),
    /// The program is over.
    End,
}

impl Transition {
    /// `true` for [`Transition::End`].
    #[must_use]
    pub fn is_end(self) -> bool {
        matches!(self, Self::End)
    }

    /// The wire encoding: `(0, 0)` means program end.
    #[must_use]
    pub fn into_pair(self) -> (BlockId, ItemId) {
        match self {
            Self::Step(block, item) => (block, item),
            Self::End => (BlockId::END, ItemId::END),
        }
    }
}

impl ProgramEngine<'_> {
    /// Resolves the next step after `(block, item)` finishes with
    /// `outcome`.
    ///
    /// Item-level edge if non-zero (stays in the same block); else the
    /// block-level edge; else [`Transition::End`]. Entering a block means
    /// entering its first item by position — an empty target block falls
    /// back to the first item-bearing block in document order.
    pub fn next_on(
        &self,
        outcome: Outcome,
        block: BlockId,
        item: ItemId,
    ) -> Result<Transition, EngineError> {
        let target = self.item(block, item)?.edge(outcome);
        if !target.is_end() {
            return Ok(Transition::Step(block, target));
        }
        let next_block = self.block(block)?.edge(outcome);
        if next_block.is_end() {
            return Ok(Transition::End);
        }
        Ok(self
            .first_item_id(Some(next_block))
            .map_or(Transition::End, |(b, i)| Transition::Step(b, i)))
    }

    /// [`ProgramEngine::next_on`] for the success edge.
    pub fn next_on_success(
        &self,
        block: BlockId,
        item: ItemId,
    ) -> Result<Transition, EngineError> {
        self.next_on(Outcome::Success, block, item)
    }

    /// [`ProgramEngine::next_on`] for the failure edge.
    pub fn next_on_failure(
        &self,
        block: BlockId,
        item: ItemId,
    ) -> Result<Transition, EngineError> {
        self.next_on(Outcome::Failure, block, item)
    }

    /// The block-level success edge.
    pub fn block_on_success(&self, block: BlockId) -> Result<BlockId, EngineError> {
        Ok(self.block(block)?.edge(Outcome::Success))
    }

    /// The block-level failure edge.
    pub fn block_on_failure(&self, block: BlockId) -> Result<BlockId, EngineError> {
        Ok(self.block(block)?.edge(Outcome::Failure))
    }
}
