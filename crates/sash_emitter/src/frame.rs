//! Storage-class bookkeeping for the emitter.
//!
//! A `Frame` holds the local slots of one function activation as a stack of
//! block scopes, plus the free variables the function captures from its
//! enclosing frames. The root frame is the program itself: while it has no
//! open block, declarations there are globals.

use sash_binder::SymbolId;
use sash_bytecode::{Capture, EmitError};
use sash_core::{FxIndexMap, FxIndexSet};

/// Slots are addressed with u16 operands.
const MAX_SLOTS: usize = u16::MAX as usize + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Local {
    pub index: u16,
    /// Referenced from a nested function, so the slot must be closed
    /// rather than popped when its block ends.
    pub captured: bool,
}

/// Where a symbol lives at the point of reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    Local(u16),
    Free(u16),
    Global(u16),
}

#[derive(Debug, Default)]
struct Frame {
    blocks: Vec<FxIndexMap<SymbolId, Local>>,
    free: FxIndexSet<Capture>,
}

impl Frame {
    fn local_count(&self) -> usize {
        self.blocks.iter().map(|block| block.len()).sum()
    }

    fn local_mut(&mut self, symbol: SymbolId) -> Option<&mut Local> {
        self.blocks.iter_mut().rev().find_map(|block| block.get_mut(&symbol))
    }

    /// Index of `capture` in this frame's free list, adding it if new.
    fn intern_free(&mut self, capture: Capture) -> Result<u16, EmitError> {
        if let Some(index) = self.free.get_index_of(&capture) {
            return Ok(index as u16);
        }
        if self.free.len() >= MAX_SLOTS {
            return Err(EmitError::SlotOverflow { kind: "free" });
        }
        let (index, _) = self.free.insert_full(capture);
        Ok(index as u16)
    }
}

/// The chain of frames, innermost last.
#[derive(Debug)]
pub(crate) struct FrameStack {
    frames: Vec<Frame>,
}

impl FrameStack {
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::default()],
        }
    }

    /// True at the top level of the program, outside every block.
    pub fn is_global(&self) -> bool {
        self.frames.len() == 1 && self.frames[0].blocks.is_empty()
    }

    pub fn push_frame(&mut self) {
        self.frames.push(Frame::default());
    }

    /// Leave the current function. Returns what it captured, in free-slot order.
    pub fn pop_frame(&mut self) -> Vec<Capture> {
        debug_assert!(self.frames.len() > 1, "the root frame is never popped");
        self.frames
            .pop()
            .map(|frame| frame.free.into_iter().collect())
            .unwrap_or_default()
    }

    pub fn start_block(&mut self) {
        self.current_mut().blocks.push(FxIndexMap::default());
    }

    /// Close the innermost block. Returns its locals, highest slot first.
    pub fn end_block(&mut self) -> Vec<Local> {
        let mut locals: Vec<Local> = self
            .current_mut()
            .blocks
            .pop()
            .map(|block| block.into_values().collect())
            .unwrap_or_default();
        locals.sort_by(|a, b| b.index.cmp(&a.index));
        locals
    }

    /// Number of local slots in use in the current frame.
    pub fn local_count(&self) -> usize {
        self.current().local_count()
    }

    /// Locals of the current frame at slot `base` or above, highest first.
    pub fn locals_from(&self, base: usize) -> Vec<Local> {
        let mut locals: Vec<Local> = self
            .current()
            .blocks
            .iter()
            .flat_map(|block| block.values().copied())
            .filter(|local| local.index as usize >= base)
            .collect();
        locals.sort_by(|a, b| b.index.cmp(&a.index));
        locals
    }

    /// Give `symbol` the next slot of the current frame.
    pub fn put_local(&mut self, symbol: SymbolId) -> Result<u16, EmitError> {
        let frame = self.current_mut();
        let index = frame.local_count();
        if index >= MAX_SLOTS {
            return Err(EmitError::SlotOverflow { kind: "local" });
        }
        let index = index as u16;
        if frame.blocks.is_empty() {
            frame.blocks.push(FxIndexMap::default());
        }
        if let Some(block) = frame.blocks.last_mut() {
            block.insert(symbol, Local { index, captured: false });
        }
        Ok(index)
    }

    /// Resolve `symbol` as a local or free variable of the current frame.
    pub fn resolve(&mut self, symbol: SymbolId) -> Result<Option<Slot>, EmitError> {
        let depth = self.frames.len() - 1;
        if let Some(local) = self.frames[depth].local_mut(symbol) {
            return Ok(Some(Slot::Local(local.index)));
        }
        Ok(self.resolve_free(depth, symbol)?.map(Slot::Free))
    }

    /// Look `symbol` up in the frames enclosing `depth`, capturing it into
    /// every frame in between.
    fn resolve_free(&mut self, depth: usize, symbol: SymbolId) -> Result<Option<u16>, EmitError> {
        if depth == 0 {
            return Ok(None);
        }
        let parent = depth - 1;
        let capture = match self.frames[parent].local_mut(symbol) {
            Some(local) => {
                local.captured = true;
                Capture {
                    is_local: true,
                    index: local.index,
                }
            }
            None => match self.resolve_free(parent, symbol)? {
                Some(index) => Capture { is_local: false, index },
                None => return Ok(None),
            },
        };
        self.frames[depth].intern_free(capture).map(Some)
    }

    fn current(&self) -> &Frame {
        &self.frames[self.frames.len() - 1]
    }

    fn current_mut(&mut self) -> &mut Frame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }
}

/// Global slots, numbered in declaration order.
#[derive(Debug, Default)]
pub(crate) struct GlobalSlots {
    slots: FxIndexSet<SymbolId>,
}

impl GlobalSlots {
    pub fn put(&mut self, symbol: SymbolId) -> Result<u16, EmitError> {
        if self.slots.len() >= MAX_SLOTS - 1 && !self.slots.contains(&symbol) {
            return Err(EmitError::SlotOverflow { kind: "global" });
        }
        let (index, _) = self.slots.insert_full(symbol);
        Ok(index as u16)
    }

    pub fn get(&self, symbol: SymbolId) -> Option<u16> {
        self.slots.get_index_of(&symbol).map(|index| index as u16)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }
}
