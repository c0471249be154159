// SPDX-License-Identifier: Apache-2.0
//! Derived position index over a program.
//!
//! Built by the validation pass and rebuilt after every mutation; never
//! persisted. `BTreeMap` keeps iteration deterministic; the separate order
//! vectors preserve document (load) order, which is what "first" means
//! throughout the engine.

use std::collections::BTreeMap;

use crate::ident::{BlockId, ItemId};

/// Index entry for one block.
#[derive(Debug, Clone, Default)]
pub(crate) struct BlockSlot {
    /// Position of the block within `program.blocks`.
    pub pos: usize,
    /// Item id → position within `block.items`.
    pub items: BTreeMap<ItemId, usize>,
    /// Item ids in document order.
    pub item_order: Vec<ItemId>,
}

/// Block id → position, (block id, item id) → position.
#[derive(Debug, Clone, Default)]
pub(crate) struct GraphIndex {
    blocks: BTreeMap<BlockId, BlockSlot>,
    order: Vec<BlockId>,
}

impl GraphIndex {
    /// Registers a block at `pos`. The caller checks for duplicates first.
    pub fn insert_block(&mut self, id: BlockId, pos: usize) {
        self.blocks.insert(
            id,
            BlockSlot {
                pos,
                items: BTreeMap::new(),
                item_order: Vec::new(),
            },
        );
        self.order.push(id);
    }

    /// Registers an item of `block` at `pos`. The caller indexes the block
    /// first and checks for duplicates.
    pub fn insert_item(&mut self, block: BlockId, id: ItemId, pos: usize) {
        if let Some(slot) = self.blocks.get_mut(&block) {
            slot.items.insert(id, pos);
            slot.item_order.push(id);
        }
    }

    /// Slot for `block`, if indexed.
    pub fn block(&self, block: BlockId) -> Option<&BlockSlot> {
        self.blocks.get(&block)
    }

    /// Position of `block`, if indexed.
    pub fn block_pos(&self, block: BlockId) -> Option<usize> {
        self.blocks.get(&block).map(|slot| slot.pos)
    }

    /// Position of `item` within `block`, if indexed.
    pub fn item_pos(&self, block: BlockId, item: ItemId) -> Option<usize> {
        self.blocks
            .get(&block)
            .and_then(|slot| slot.items.get(&item))
            .copied()
    }

    /// `true` if `block` is indexed.
    pub fn contains_block(&self, block: BlockId) -> bool {
        self.blocks.contains_key(&block)
    }

    /// `true` if `item` of `block` is indexed.
    pub fn contains_item(&self, block: BlockId, item: ItemId) -> bool {
        self.item_pos(block, item).is_some()
    }

    /// Block ids in document order.
    pub fn block_order(&self) -> &[BlockId] {
        &self.order
    }
}
