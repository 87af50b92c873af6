#[cfg(test)]
mod tests {
    use crate::routing::ring::{HashRing, hash_slot};

    fn three_peers() -> Vec<String> {
        vec![
            "http://a:1".to_string(),
            "http://b:2".to_string(),
            "http://c:3".to_string(),
        ]
    }

    // ============================================================
    // HASH CONTRACT
    // ============================================================

    #[test]
    fn test_hash_slot_empty_string_contract() {
        // SHA-1("") starts with da 39 a3 e4; the fold is part of the
        // inter-node contract and must never change.
        assert_eq!(hash_slot(""), 0xda39a3e4);
    }

    #[test]
    fn test_hash_slot_is_deterministic() {
        assert_eq!(hash_slot("apple"), hash_slot("apple"));
        assert_ne!(hash_slot("apple"), hash_slot("banana"));
    }

    // ============================================================
    // REPLICA SELECTION
    // ============================================================

    #[test]
    fn test_replicas_for_is_deterministic() {
        let ring1 = HashRing::with_peers(three_peers(), 1);
        let ring2 = HashRing::with_peers(three_peers(), 1);

        let replicas1 = ring1.replicas_for("apple", 2);
        let replicas2 = ring2.replicas_for("apple", 2);

        assert_eq!(replicas1.len(), 2);
        assert_eq!(replicas1, replicas2);
        for replica in &replicas1 {
            assert!(three_peers().contains(replica));
        }
    }

    #[test]
    fn test_replicas_for_wraps_around() {
        let ring = HashRing::with_peers(three_peers(), 1);

        // Whatever slot the key lands on, a full-ring request must walk
        // past the end and still produce every distinct peer.
        let replicas = ring.replicas_for("zzzz", 3);
        assert_eq!(replicas.len(), 3);

        let mut sorted = replicas.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), 3, "replicas must be distinct");
    }

    #[test]
    fn test_replicas_for_has_no_duplicates_with_virtual_nodes() {
        let ring = HashRing::with_peers(three_peers(), 100);

        for key in ["apple", "banana", "carrot", "dog", "elephant"] {
            let replicas = ring.replicas_for(key, 3);
            assert_eq!(replicas.len(), 3);
            let mut sorted = replicas.clone();
            sorted.sort();
            sorted.dedup();
            assert_eq!(sorted.len(), 3, "duplicates for key {}", key);
        }
    }

    #[test]
    fn test_replicas_capped_by_distinct_peers() {
        let ring = HashRing::with_peers(three_peers(), 1);
        assert_eq!(ring.replicas_for("apple", 10).len(), 3);
    }

    #[test]
    fn test_replicas_for_empty_ring() {
        let ring = HashRing::new(1);
        assert!(ring.replicas_for("apple", 3).is_empty());
    }

    #[test]
    fn test_first_replica_matches_single_lookup() {
        // The walk order is stable: asking for fewer replicas returns a
        // prefix of the longer answer.
        let ring = HashRing::with_peers(three_peers(), 100);

        for key in ["apple", "myKey", "criticalKey"] {
            let one = ring.replicas_for(key, 1);
            let three = ring.replicas_for(key, 3);
            assert_eq!(one[0], three[0]);
            assert_eq!(&three[..1], &one[..]);
        }
    }

    // ============================================================
    // MEMBERSHIP OPERATIONS
    // ============================================================

    #[test]
    fn test_contains_and_all_peers_agree() {
        let ring = HashRing::with_peers(three_peers(), 3);

        for peer in three_peers() {
            assert!(ring.contains(&peer));
        }
        assert!(!ring.contains("http://d:4"));
        assert_eq!(ring.all_peers(), three_peers());
    }

    #[test]
    fn test_remove_is_complete() {
        let mut ring = HashRing::with_peers(three_peers(), 100);
        ring.remove("http://b:2");

        assert!(!ring.contains("http://b:2"));
        assert_eq!(ring.all_peers().len(), 2);
        assert_eq!(ring.slot_count(), 200);

        // No lookup may observe the removed peer.
        for i in 0..200 {
            let key = format!("key_{}", i);
            for replica in ring.replicas_for(&key, 3) {
                assert_ne!(replica, "http://b:2");
            }
        }
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut ring = HashRing::with_peers(three_peers(), 10);
        let before = ring.replicas_for("apple", 3);

        ring.add("http://b:2");

        assert_eq!(ring.slot_count(), 30);
        assert_eq!(ring.all_peers().len(), 3);
        assert_eq!(ring.replicas_for("apple", 3), before);
    }

    #[test]
    fn test_remove_absent_peer_is_noop() {
        let mut ring = HashRing::with_peers(three_peers(), 10);
        ring.remove("http://unknown:9");
        assert_eq!(ring.slot_count(), 30);
        assert_eq!(ring.all_peers().len(), 3);
    }

    #[test]
    fn test_key_distribution_covers_all_peers() {
        let ring = HashRing::with_peers(three_peers(), 100);

        let mut counts = std::collections::HashMap::new();
        for i in 0..1000 {
            let key = format!("key_{}", i);
            let primary = ring.replicas_for(&key, 1).remove(0);
            *counts.entry(primary).or_insert(0usize) += 1;
        }

        assert_eq!(counts.len(), 3, "every peer should own some keys");
        for (peer, count) in counts {
            assert!(count > 100, "peer {} owns only {} of 1000 keys", peer, count);
        }
    }
}
