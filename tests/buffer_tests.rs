//! Block Pool Tests
//!
//! Acquisition, sharing and release of the fixed audio block pool.
//! Run with: cargo test --test buffer_tests

use avna_dsp::block::BlockPool;
use avna_dsp::config::{AUDIO_BLOCK_SAMPLES, BLOCK_POOL_CAPACITY};

// =============================================================================
// Acquire / Release
// =============================================================================

#[test]
fn test_default_capacity() {
    let pool: BlockPool = BlockPool::new();
    assert_eq!(pool.capacity(), BLOCK_POOL_CAPACITY);
    assert_eq!(pool.available(), BLOCK_POOL_CAPACITY);
    assert_eq!(pool.in_use(), 0);
}

#[test]
fn test_exhaustion_returns_none() {
    let mut pool: BlockPool<3> = BlockPool::new();
    let a = pool.acquire().expect("slot 0");
    let b = pool.acquire().expect("slot 1");
    let c = pool.acquire().expect("slot 2");
    assert!(pool.acquire().is_none());
    assert_eq!(pool.available(), 0);

    pool.release(b);
    let d = pool.acquire().expect("freed slot");
    assert_eq!(d.index(), 1, "freed slot is reused");

    for block in [a, c, d] {
        pool.release(block);
    }
    assert_eq!(pool.in_use(), 0);
}

#[test]
fn test_blocks_are_distinct() {
    let mut pool: BlockPool<2> = BlockPool::new();
    let a = pool.acquire().expect("a");
    let b = pool.acquire().expect("b");
    assert_ne!(a.index(), b.index());

    pool.data_mut(&a).expect("sole holder").fill(1);
    pool.data_mut(&b).expect("sole holder").fill(-1);
    assert!(pool.data(&a).iter().all(|&s| s == 1));
    assert!(pool.data(&b).iter().all(|&s| s == -1));
    assert_eq!(pool.data(&a).len(), AUDIO_BLOCK_SAMPLES);

    pool.release(a);
    pool.release(b);
}

// =============================================================================
// Sharing
// =============================================================================

#[test]
fn test_share_keeps_block_alive() {
    let mut pool: BlockPool<1> = BlockPool::new();
    let block = pool.acquire().expect("block");
    pool.data_mut(&block).expect("sole holder").fill(42);

    let copy = pool.share(&block).expect("share");
    assert_eq!(pool.holders(&block), 2);
    assert_eq!(copy.index(), block.index());

    pool.release(block);
    assert_eq!(pool.in_use(), 1, "still held by the second holder");
    assert!(pool.acquire().is_none());
    assert!(pool.data(&copy).iter().all(|&s| s == 42));

    pool.release(copy);
    assert_eq!(pool.in_use(), 0);
    let again = pool.acquire().expect("slot freed");
    pool.release(again);
}

#[test]
fn test_shared_block_is_read_only() {
    let mut pool: BlockPool<2> = BlockPool::new();
    let block = pool.acquire().expect("block");
    let other = pool.share(&block).expect("share");
    assert!(pool.data_mut(&block).is_none());
    assert!(pool.data_mut(&other).is_none());

    pool.release(other);
    assert!(pool.data_mut(&block).is_some());
    pool.release(block);
}

#[test]
fn test_handle_from_larger_pool_is_ignored() {
    let mut large: BlockPool<8> = BlockPool::new();
    let mut small: BlockPool<2> = BlockPool::new();
    let mut held = Vec::new();
    for _ in 0..5 {
        held.push(large.acquire().expect("block"));
    }
    let foreign = held.pop().expect("block");
    assert_eq!(foreign.index(), 4);

    let local = small.acquire().expect("block");
    assert!(small.data_mut(&foreign).is_none());
    assert!(small.share(&foreign).is_none());
    assert!(small.data(&foreign).iter().all(|&s| s == 0));
    assert_eq!(small.holders(&foreign), 0);
    small.release(foreign);
    assert_eq!(small.in_use(), 1, "foreign release must not free a local slot");

    small.release(local);
    for block in held {
        large.release(block);
    }
}

// =============================================================================
// Usage Statistics
// =============================================================================

#[test]
fn test_peak_usage() {
    let mut pool: BlockPool<4> = BlockPool::new();
    let a = pool.acquire().expect("a");
    let b = pool.acquire().expect("b");
    let c = pool.acquire().expect("c");
    pool.release(b);
    pool.release(c);
    assert_eq!(pool.in_use(), 1);
    assert_eq!(pool.peak_in_use(), 3);

    pool.reset_peak();
    assert_eq!(pool.peak_in_use(), 1);
    pool.release(a);
    assert_eq!(pool.peak_in_use(), 1);
}

#[test]
fn test_share_does_not_count_as_new_block() {
    let mut pool: BlockPool<2> = BlockPool::new();
    let a = pool.acquire().expect("a");
    let b = pool.share(&a).expect("share");
    assert_eq!(pool.in_use(), 1);
    assert_eq!(pool.available(), 1);
    pool.release(a);
    pool.release(b);
}
