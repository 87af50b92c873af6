use sha1::{Digest, Sha1};
use std::collections::{HashMap, HashSet};

/// Folds a string into a 32-bit ring slot.
///
/// The slot is the first four bytes of the SHA-1 digest of the UTF-8 input,
/// interpreted big-endian. This derivation is part of the inter-node
/// contract: `hash_slot("")` is `0xda39a3e4`.
pub fn hash_slot(input: &str) -> u32 {
    let digest = Sha1::digest(input.as_bytes());
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// Consistent hash ring with virtual nodes.
///
/// Holds a slot-to-owner map plus the sorted sequence of occupied slots,
/// which together form a logical circular array. The ring itself is a plain
/// data structure; shared access goes through an outer `RwLock` so lookups
/// observe a consistent snapshot and updates are exclusive.
pub struct HashRing {
    slots: HashMap<u32, String>,
    sorted_slots: Vec<u32>,
    virtual_nodes: usize,
}

impl HashRing {
    pub fn new(virtual_nodes: usize) -> Self {
        Self {
            slots: HashMap::new(),
            sorted_slots: Vec::new(),
            virtual_nodes,
        }
    }

    /// Builds a ring pre-populated with the given peers.
    pub fn with_peers<I, S>(peers: I, virtual_nodes: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ring = Self::new(virtual_nodes);
        for peer in peers {
            ring.add(peer.as_ref());
        }
        ring
    }

    /// Inserts all virtual slots for `peer`. Re-adding an existing peer
    /// replaces its identical entries, so the operation is idempotent.
    pub fn add(&mut self, peer: &str) {
        for i in 0..self.virtual_nodes {
            let slot = hash_slot(&format!("{}#{}", peer, i));
            self.slots.insert(slot, peer.to_string());
        }
        self.rebuild_sorted();
        tracing::debug!("Added {} to hash ring ({} slots)", peer, self.slots.len());
    }

    /// Removes all virtual slots for `peer`. Removing an absent peer is a
    /// no-op.
    pub fn remove(&mut self, peer: &str) {
        for i in 0..self.virtual_nodes {
            let slot = hash_slot(&format!("{}#{}", peer, i));
            self.slots.remove(&slot);
        }
        self.rebuild_sorted();
        tracing::debug!("Removed {} from hash ring ({} slots)", peer, self.slots.len());
    }

    /// True iff any of `peer`'s virtual slots are present.
    pub fn contains(&self, peer: &str) -> bool {
        (0..self.virtual_nodes)
            .any(|i| self.slots.contains_key(&hash_slot(&format!("{}#{}", peer, i))))
    }

    /// Returns up to `n` distinct peers responsible for `key`, in ring walk
    /// order starting from the key's slot. Empty if the ring is empty.
    pub fn replicas_for(&self, key: &str, n: usize) -> Vec<String> {
        if self.sorted_slots.is_empty() || n == 0 {
            return Vec::new();
        }

        let hash = hash_slot(key);
        let start = self.find_slot_index(hash);

        let mut result = Vec::new();
        let mut seen = HashSet::new();
        for i in 0..self.sorted_slots.len() {
            if result.len() == n {
                break;
            }
            let slot = self.sorted_slots[(start + i) % self.sorted_slots.len()];
            if let Some(owner) = self.slots.get(&slot) {
                if seen.insert(owner.clone()) {
                    result.push(owner.clone());
                }
            }
        }
        result
    }

    /// The set of peers with at least one slot, sorted for stable output.
    pub fn all_peers(&self) -> Vec<String> {
        let mut peers: Vec<String> = self
            .slots
            .values()
            .collect::<HashSet<_>>()
            .into_iter()
            .cloned()
            .collect();
        peers.sort();
        peers
    }

    /// Total number of occupied slots.
    pub fn slot_count(&self) -> usize {
        self.sorted_slots.len()
    }

    /// Index of the smallest slot >= hash, wrapping to 0 past the end.
    fn find_slot_index(&self, hash: u32) -> usize {
        let idx = self.sorted_slots.partition_point(|&slot| slot < hash);
        if idx == self.sorted_slots.len() { 0 } else { idx }
    }

    fn rebuild_sorted(&mut self) {
        self.sorted_slots = self.slots.keys().copied().collect();
        self.sorted_slots.sort_unstable();
    }
}
