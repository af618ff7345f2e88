//! Audio Block Pool
//!
//! A fixed set of reusable sample buffers shared by every node in the
//! graph. Acquisition never blocks and never allocates: when the pool is
//! exhausted the caller gets `None` and drops its frame for that quantum.
//!
//! Slots are reference counted. A producer acquires a block (one holder),
//! the runtime `share`s it once per consumer while transmitting, and every
//! holder releases exactly once. [`BlockRef`] is neither `Clone` nor `Copy`,
//! and `release` consumes it, so a handle cannot be used after release.

use crate::config::BLOCK_POOL_CAPACITY;
use crate::types::{AudioBlock, SILENT_BLOCK};

/// Handle to one pool slot
///
/// Holding a `BlockRef` means holding one reference on the slot.
#[must_use = "a block must be released back to its pool"]
#[derive(Debug, PartialEq, Eq)]
pub struct BlockRef {
    index: u8,
}

impl BlockRef {
    /// Slot index inside the pool
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index as usize
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for BlockRef {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Block#{}", self.index);
    }
}

/// Fixed-capacity pool of audio blocks
pub struct BlockPool<const N: usize = BLOCK_POOL_CAPACITY> {
    blocks: [AudioBlock; N],
    /// Holders per slot, zero means free
    refs: [u8; N],
    in_use: usize,
    peak_in_use: usize,
}

impl<const N: usize> BlockPool<N> {
    /// Create a pool with every slot free
    #[must_use]
    pub const fn new() -> Self {
        assert!(N <= u8::MAX as usize, "pool index must fit in u8");
        Self {
            blocks: [SILENT_BLOCK; N],
            refs: [0; N],
            in_use: 0,
            peak_in_use: 0,
        }
    }

    /// Take exclusive ownership of a free block
    ///
    /// Contents are whatever the previous holder left; producers overwrite
    /// the whole block. Returns `None` when the pool is exhausted.
    pub fn acquire(&mut self) -> Option<BlockRef> {
        let slot = self.refs.iter().position(|&r| r == 0)?;
        let index = u8::try_from(slot).ok()?;
        self.refs[slot] = 1;
        self.in_use += 1;
        self.peak_in_use = self.peak_in_use.max(self.in_use);
        Some(BlockRef { index })
    }

    /// Add a holder to a block, used when transmitting to a consumer
    ///
    /// Returns `None` if the slot's holder count is saturated or the handle
    /// belongs to no slot of this pool.
    pub fn share(&mut self, block: &BlockRef) -> Option<BlockRef> {
        let refs = self.refs.get_mut(block.index())?;
        debug_assert!(*refs > 0, "sharing a released block");
        *refs = refs.checked_add(1)?;
        Some(BlockRef { index: block.index })
    }

    /// Drop one hold on a block, freeing the slot when it was the last
    ///
    /// A handle from a larger pool is ignored.
    pub fn release(&mut self, block: BlockRef) {
        let Some(refs) = self.refs.get_mut(block.index()) else {
            return;
        };
        debug_assert!(*refs > 0, "double release");
        if *refs == 0 {
            return;
        }
        *refs -= 1;
        if *refs == 0 {
            self.in_use -= 1;
        }
    }

    /// Read a block's samples, silence for a handle this pool never issued
    #[must_use]
    pub fn data(&self, block: &BlockRef) -> &AudioBlock {
        self.blocks.get(block.index()).unwrap_or(&SILENT_BLOCK)
    }

    /// Write access, granted only to a sole holder
    ///
    /// A shared block is read-only so that no consumer observes another
    /// consumer's edits.
    pub fn data_mut(&mut self, block: &BlockRef) -> Option<&mut AudioBlock> {
        if self.holders(block) == 1 {
            self.blocks.get_mut(block.index())
        } else {
            None
        }
    }

    /// Number of holders on a block
    #[must_use]
    pub fn holders(&self, block: &BlockRef) -> u8 {
        self.refs.get(block.index()).copied().unwrap_or(0)
    }

    /// Pool capacity
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Blocks currently held
    #[must_use]
    pub const fn in_use(&self) -> usize {
        self.in_use
    }

    /// Free blocks
    #[must_use]
    pub const fn available(&self) -> usize {
        N - self.in_use
    }

    /// Highest number of blocks held at once since the last reset
    #[must_use]
    pub const fn peak_in_use(&self) -> usize {
        self.peak_in_use
    }

    /// Restart peak tracking from the current usage
    pub fn reset_peak(&mut self) {
        self.peak_in_use = self.in_use;
    }
}

impl<const N: usize> Default for BlockPool<N> {
    fn default() -> Self {
        Self::new()
    }
}
