//! Streaming node contract
//!
//! Every component the scheduler drives consumes and/or produces at most
//! one block per quantum. Port arity is declared as associated constants so
//! the runtime can wire nodes without inspecting them.

use crate::block::{BlockPool, BlockRef};

/// A node in the audio graph, updated once per quantum
pub trait AudioNode {
    /// Number of input ports (0 or 1)
    const INPUTS: usize;

    /// Number of output ports (0 or 1)
    const OUTPUTS: usize;

    /// Run one quantum.
    ///
    /// The node takes over the caller's hold on `input` and must release it
    /// (or hand it back as output). A returned block carries one hold that
    /// now belongs to the caller. Must not block; on pool exhaustion the node
    /// skips its output for this quantum.
    fn update<const N: usize>(
        &mut self,
        pool: &mut BlockPool<N>,
        input: Option<BlockRef>,
    ) -> Option<BlockRef>;
}
