//! Binary Merkle tree over ordered chunk hashes.
//!
//! The root of the tree is the file's [`ContentId`]. Construction rules,
//! which the store must reproduce to reconcile identifiers:
//!
//! - Level 0 holds the chunk hashes in chunk order.
//! - Adjacent nodes are paired left to right; a parent is
//!   `SHA-256(left ‖ right)` over the raw 32-byte digests.
//! - On a level with an odd node count the last node is paired with itself.
//! - A single leaf is its own root (height 0).
//! - Zero leaves (empty file) yield `SHA-256("")`.

use crate::digest::{ContentId, HashValue, hash_bytes, hash_pair};

/// A fully materialized Merkle tree, all levels kept.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    /// `levels[0]` are the leaves; the last level holds exactly one node.
    levels: Vec<Vec<HashValue>>,
}

impl MerkleTree {
    /// Builds the tree bottom-up from ordered leaf hashes.
    pub fn build(leaves: &[HashValue]) -> Self {
        if leaves.is_empty() {
            return Self {
                levels: vec![vec![hash_bytes(&[])]],
            };
        }

        let mut levels = vec![leaves.to_vec()];
        while let Some(level) = levels.last() {
            if level.len() == 1 {
                break;
            }
            let next = next_level(level);
            levels.push(next);
        }
        Self { levels }
    }

    /// The root hash.
    pub fn root(&self) -> HashValue {
        // Every constructor leaves a non-empty top level.
        self.levels[self.levels.len() - 1][0]
    }

    /// The root as a content identifier.
    pub fn content_id(&self) -> ContentId {
        ContentId::new(self.root())
    }

    /// Number of parent levels above the leaves.
    pub fn height(&self) -> usize {
        self.levels.len() - 1
    }

    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// All levels, leaves first.
    pub fn levels(&self) -> &[Vec<HashValue>] {
        &self.levels
    }
}

/// Computes only the root, folding level by level without keeping history.
pub fn compute_root(leaves: &[HashValue]) -> HashValue {
    match leaves.len() {
        0 => hash_bytes(&[]),
        1 => leaves[0],
        _ => {
            let mut level = next_level(leaves);
            while level.len() > 1 {
                level = next_level(&level);
            }
            level[0]
        }
    }
}

fn next_level(level: &[HashValue]) -> Vec<HashValue> {
    level
        .chunks(2)
        .map(|pair| match pair {
            [left, right] => hash_pair(left, right),
            [lone] => hash_pair(lone, lone),
            _ => unreachable!("chunks(2) yields one or two nodes"),
        })
        .collect()
}
