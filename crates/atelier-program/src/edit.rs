// SPDX-License-Identifier: Apache-2.0
//! Structure-preserving edits.
//!
//! Every operation works on a draft copy of the program, applies one local
//! transformation, then re-runs the full validation pass before swapping
//! the draft in — all-or-nothing, so a failed edit leaves the engine
//! exactly as it was. All id and pointer renumbering funnels through the
//! `excise_edge` / `clear_edge` primitives and the `chain_swap` helper;
//! no operation does its own index arithmetic.

use std::collections::BTreeSet;

use atelier_instructions::{InstructionRegistry, InstructionType};

use crate::engine::{EngineError, ProgramEngine};
use crate::ident::{BlockId, ItemId};
use crate::program::{Block, Item, PolygonStamped, PoseStamped};

/// Smallest positive id not in `used`.
fn smallest_unused(used: impl IntoIterator<Item = u32>) -> u32 {
    let used: BTreeSet<u32> = used.into_iter().collect();
    (1..=u32::MAX).find(|id| !used.contains(id)).unwrap_or(u32::MAX)
}

/// Renumbers one edge after `removed` left the id space: a pointer at
/// `removed` retargets to `succ` (the removed entry's own successor), and
/// pointers above `removed` shift down to keep ids dense. `succ` is a
/// pre-renumbering id; the shift applies to it too.
fn excise_edge(edge: &mut u32, removed: u32, succ: u32) {
    if *edge == removed {
        *edge = succ;
    }
    if *edge > removed {
        *edge -= 1;
    }
}

/// Like `excise_edge`, but a pointer at `removed` is cleared to the
/// sentinel instead of retargeted. Used for failure edges, which are
/// never auto-repaired.
fn clear_edge(edge: &mut u32, removed: u32) {
    if *edge == removed {
        *edge = 0;
    }
    if *edge > removed {
        *edge -= 1;
    }
}

/// Swaps `entries[pos]` with its positional successor and repairs exactly
/// the neighboring success pointers — the pair itself and the positional
/// predecessor of the pair — so the chain visits the same steps reordered.
/// A successor edge that pointed back at the moved entry keeps the pair's
/// cycle intact instead of degenerating into a self-loop.
fn chain_swap<T>(
    entries: &mut [T],
    pos: usize,
    id_of: fn(&T) -> u32,
    succ_of: fn(&mut T) -> &mut u32,
) {
    let moved_id = id_of(&entries[pos]);
    let next_id = id_of(&entries[pos + 1]);
    let next_succ = *succ_of(&mut entries[pos + 1]);
    if pos > 0 {
        *succ_of(&mut entries[pos - 1]) = next_id;
    }
    *succ_of(&mut entries[pos]) = if next_succ == moved_id { next_id } else { next_succ };
    *succ_of(&mut entries[pos + 1]) = moved_id;
    entries.swap(pos, pos + 1);
}

/// A fresh item for `instruction`, payload slots sized from the
/// capability flags and the type's `params` slot counts.
fn default_item(registry: &InstructionRegistry, ty: &InstructionType, id: ItemId) -> Item {
    let name = ty.name.clone();
    Item {
        id,
        name: format!("{name} {id}"),
        instruction: name,
        on_success: ItemId::END,
        on_failure: ItemId::END,
        ref_id: Vec::new(),
        object: if registry.uses_object(&ty.name) {
            vec![String::new(); ty.slot_count("objects", 1)]
        } else {
            Vec::new()
        },
        pose: if registry.uses_pose(&ty.name) {
            vec![PoseStamped::default(); ty.slot_count("poses", 1)]
        } else {
            Vec::new()
        },
        polygon: if registry.uses_polygon(&ty.name) {
            vec![PolygonStamped::default(); ty.slot_count("polygons", 1)]
        } else {
            Vec::new()
        },
        do_not_clear: BTreeSet::new(),
    }
}

impl ProgramEngine<'_> {
    /// Appends a new block with the smallest unused id, positioned after
    /// `after` (or last), splicing it into the success chain: the new
    /// block inherits the predecessor's `on_success` and exactly that one
    /// predecessor pointer retargets to the new block. Returns the new id.
    pub fn add_block(&mut self, after: Option<BlockId>) -> Result<BlockId, EngineError> {
        let insert_pos = match after {
            Some(a) => {
                self.index()
                    .block_pos(a)
                    .ok_or(EngineError::UnknownBlock(a))?
                    + 1
            }
            None => self.program().blocks.len(),
        };
        let mut draft = self.program().clone();
        let id = BlockId(smallest_unused(draft.blocks.iter().map(|b| b.id.0)));
        // A validated program has at least one block, so insert_pos >= 1.
        let prev = &mut draft.blocks[insert_pos - 1];
        let on_success = prev.on_success;
        prev.on_success = id;
        draft.blocks.insert(
            insert_pos,
            Block {
                id,
                name: format!("Program block {id}"),
                on_success,
                on_failure: BlockId::END,
                items: Vec::new(),
            },
        );
        self.commit(draft)?;
        Ok(id)
    }

    /// Deletes a block. Pointers at it retarget to its own successor (a
    /// self-successor collapses to the end sentinel); ids above it shift
    /// down with every dependent pointer renumbered.
    ///
    /// # Errors
    ///
    /// [`EngineError::LastBlock`] — the sole block cannot go.
    pub fn delete_block(&mut self, block: BlockId) -> Result<(), EngineError> {
        let pos = self
            .index()
            .block_pos(block)
            .ok_or(EngineError::UnknownBlock(block))?;
        if self.program().blocks.len() == 1 {
            return Err(EngineError::LastBlock);
        }
        let mut draft = self.program().clone();
        let removed = draft.blocks.remove(pos);
        let succ = if removed.on_success == block {
            BlockId::END
        } else {
            removed.on_success
        };
        for b in &mut draft.blocks {
            excise_edge(&mut b.on_success.0, block.0, succ.0);
            excise_edge(&mut b.on_failure.0, block.0, succ.0);
            if b.id.0 > block.0 {
                b.id.0 -= 1;
            }
        }
        self.commit(draft)
    }

    /// Adds an item of type `instruction` to `block`, positioned after
    /// `after` (or last), spliced into the item success chain like
    /// [`ProgramEngine::add_block`]. Place and ref-to-pick types
    /// auto-reference the nearest preceding pick by position. Returns the
    /// new id (item ids stay dense).
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownInstruction`] for a type not in the
    /// registry; [`EngineError::NoPickBefore`] when a place /
    /// ref-to-pick type has no pick to bind to —
    /// [`ProgramEngine::allowed_new_items`] is the caller-side guard.
    pub fn add_item(
        &mut self,
        block: BlockId,
        instruction: &str,
        after: Option<ItemId>,
    ) -> Result<ItemId, EngineError> {
        let ty = self
            .registry()
            .get(instruction)
            .map_err(|_| EngineError::UnknownInstruction(instruction.to_owned()))?;
        let bpos = self
            .index()
            .block_pos(block)
            .ok_or(EngineError::UnknownBlock(block))?;
        let insert_pos = match after {
            Some(a) => {
                self.index()
                    .item_pos(block, a)
                    .ok_or(EngineError::UnknownItem { block, item: a })?
                    + 1
            }
            None => self.program().blocks[bpos].items.len(),
        };
        let mut draft = self.program().clone();
        let items = &mut draft.blocks[bpos].items;
        let id = ItemId(smallest_unused(items.iter().map(|i| i.id.0)));
        let mut item = default_item(self.registry(), ty, id);

        if self.registry().is_place(instruction) || self.registry().ref_to_pick(instruction) {
            let pick = items[..insert_pos]
                .iter()
                .rev()
                .find(|i| self.registry().is_pick(&i.instruction))
                .map(|i| i.id);
            match pick {
                Some(p) => item.ref_id.push(p),
                None => return Err(EngineError::NoPickBefore { block }),
            }
        }

        if insert_pos > 0 {
            let prev = &mut items[insert_pos - 1];
            item.on_success = prev.on_success;
            prev.on_success = id;
        }
        items.insert(insert_pos, item);
        self.commit(draft)?;
        Ok(id)
    }

    /// Deletes an item. Success pointers at it retarget to its own
    /// successor; failure pointers at it are cleared to the sentinel (not
    /// retargeted); ids above it shift down with edges and references
    /// renumbered; if it was positionally last, the positional
    /// predecessor's `on_success` becomes the block-complete sentinel.
    ///
    /// Callers must check [`ProgramEngine::item_can_be_deleted`] first:
    /// references *to* the deleted id are not repaired here.
    pub fn delete_item(&mut self, block: BlockId, item: ItemId) -> Result<(), EngineError> {
        let bpos = self
            .index()
            .block_pos(block)
            .ok_or(EngineError::UnknownBlock(block))?;
        let ipos = self
            .index()
            .item_pos(block, item)
            .ok_or(EngineError::UnknownItem { block, item })?;
        let mut draft = self.program().clone();
        let items = &mut draft.blocks[bpos].items;
        let removed = items.remove(ipos);
        let succ = if removed.on_success == item {
            ItemId::END
        } else {
            removed.on_success
        };
        for it in items.iter_mut() {
            excise_edge(&mut it.on_success.0, item.0, succ.0);
            clear_edge(&mut it.on_failure.0, item.0);
            for reference in &mut it.ref_id {
                if reference.0 > item.0 {
                    reference.0 -= 1;
                }
            }
            if it.id.0 > item.0 {
                it.id.0 -= 1;
            }
        }
        if ipos == items.len() && !items.is_empty() {
            items[ipos - 1].on_success = ItemId::END;
        }
        self.commit(draft)
    }

    /// Swaps a block with its positional successor, repairing the
    /// neighboring success pointers. A no-op at the bottom.
    pub fn move_block_down(&mut self, block: BlockId) -> Result<(), EngineError> {
        let pos = self
            .index()
            .block_pos(block)
            .ok_or(EngineError::UnknownBlock(block))?;
        if pos + 1 >= self.program().blocks.len() {
            return Ok(());
        }
        let mut draft = self.program().clone();
        chain_swap(&mut draft.blocks, pos, |b| b.id.0, |b| &mut b.on_success.0);
        self.commit(draft)
    }

    /// Swaps a block with its positional predecessor. A no-op at the top.
    pub fn move_block_up(&mut self, block: BlockId) -> Result<(), EngineError> {
        let pos = self
            .index()
            .block_pos(block)
            .ok_or(EngineError::UnknownBlock(block))?;
        if pos == 0 {
            return Ok(());
        }
        let mut draft = self.program().clone();
        chain_swap(&mut draft.blocks, pos - 1, |b| b.id.0, |b| &mut b.on_success.0);
        self.commit(draft)
    }

    /// Swaps an item with its positional successor, repairing the
    /// neighboring success pointers. A no-op at the bottom.
    pub fn move_item_down(&mut self, block: BlockId, item: ItemId) -> Result<(), EngineError> {
        let (bpos, ipos) = self.item_position(block, item)?;
        if ipos + 1 >= self.program().blocks[bpos].items.len() {
            return Ok(());
        }
        let mut draft = self.program().clone();
        chain_swap(
            &mut draft.blocks[bpos].items,
            ipos,
            |i| i.id.0,
            |i| &mut i.on_success.0,
        );
        self.commit(draft)
    }

    /// Swaps an item with its positional predecessor. A no-op at the top.
    pub fn move_item_up(&mut self, block: BlockId, item: ItemId) -> Result<(), EngineError> {
        let (bpos, ipos) = self.item_position(block, item)?;
        if ipos == 0 {
            return Ok(());
        }
        let mut draft = self.program().clone();
        chain_swap(
            &mut draft.blocks[bpos].items,
            ipos - 1,
            |i| i.id.0,
            |i| &mut i.on_success.0,
        );
        self.commit(draft)
    }

    /// Retargets an item's success edge, then re-validates.
    pub fn set_on_success(
        &mut self,
        block: BlockId,
        item: ItemId,
        target: ItemId,
    ) -> Result<(), EngineError> {
        let (bpos, ipos) = self.item_position(block, item)?;
        let mut draft = self.program().clone();
        draft.blocks[bpos].items[ipos].on_success = target;
        self.commit(draft)
    }

    /// Retargets an item's failure edge, then re-validates.
    pub fn set_on_failure(
        &mut self,
        block: BlockId,
        item: ItemId,
        target: ItemId,
    ) -> Result<(), EngineError> {
        let (bpos, ipos) = self.item_position(block, item)?;
        let mut draft = self.program().clone();
        draft.blocks[bpos].items[ipos].on_failure = target;
        self.commit(draft)
    }

    /// `true` iff no item in the block (the item itself included) lists
    /// the item in `ref_id`. Deleting an item for which this returns
    /// `false` would dangle a reference and must be refused by the caller.
    pub fn item_can_be_deleted(&self, block: BlockId, item: ItemId) -> Result<bool, EngineError> {
        let (bpos, _) = self.item_position(block, item)?;
        Ok(!self.program().blocks[bpos]
            .items
            .iter()
            .any(|i| i.ref_id.contains(&item)))
    }

    /// Instruction types that may be inserted after `after` (or at the
    /// end): all known types, minus place / ref-to-pick types when no pick
    /// precedes the insertion point.
    pub fn allowed_new_items(
        &self,
        block: BlockId,
        after: Option<ItemId>,
    ) -> Result<Vec<&str>, EngineError> {
        let bpos = self
            .index()
            .block_pos(block)
            .ok_or(EngineError::UnknownBlock(block))?;
        let items = &self.program().blocks[bpos].items;
        let scan_end = match after {
            Some(a) => {
                self.index()
                    .item_pos(block, a)
                    .ok_or(EngineError::UnknownItem { block, item: a })?
                    + 1
            }
            None => items.len(),
        };
        let pick_available = items[..scan_end]
            .iter()
            .any(|i| self.registry().is_pick(&i.instruction));
        Ok(self
            .registry()
            .names()
            .filter(|name| {
                pick_available
                    || !(self.registry().is_place(name) || self.registry().ref_to_pick(name))
            })
            .collect())
    }

    fn item_position(&self, block: BlockId, item: ItemId) -> Result<(usize, usize), EngineError> {
        let bpos = self
            .index()
            .block_pos(block)
            .ok_or(EngineError::UnknownBlock(block))?;
        let ipos = self
            .index()
            .item_pos(block, item)
            .ok_or(EngineError::UnknownItem { block, item })?;
        Ok((bpos, ipos))
    }
}
