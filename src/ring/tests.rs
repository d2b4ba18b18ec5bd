use super::hashring::{HashFn, HashRing};

/// Numeric hash that turns "23" into 23, which makes ring placement easy to
/// reason about in fixtures.
fn numeric_hash() -> Option<HashFn> {
    Some(Box::new(|data: &[u8]| {
        std::str::from_utf8(data)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    }))
}

#[test]
fn test_ring_placement_and_wrap() {
    let mut ring = HashRing::new(3, numeric_hash());

    // Peers "6", "4", "2" with 3 replicas each produce the positions
    // 2, 4, 6, 12, 14, 16, 22, 24, 26.
    ring.add(&["6", "4", "2"]);

    let cases = [("2", "2"), ("11", "2"), ("23", "4"), ("27", "2")];
    for (key, owner) in cases {
        assert_eq!(ring.get(key), Some(owner), "key {} misplaced", key);
    }

    // Adding "8" contributes positions 8, 18, 28; key 27 now lands on it.
    ring.add(&["8"]);
    assert_eq!(ring.get("27"), Some("8"));

    // The other placements are untouched.
    for (key, owner) in [("2", "2"), ("11", "2"), ("23", "4")] {
        assert_eq!(ring.get(key), Some(owner));
    }
}

#[test]
fn test_empty_ring_has_no_owner() {
    let ring = HashRing::new(3, None);
    assert!(ring.is_empty());
    assert_eq!(ring.get("anything"), None);
}

#[test]
fn test_lookup_is_stable() {
    let mut ring = HashRing::new(50, None);
    ring.add(&["peer-a", "peer-b", "peer-c"]);

    for i in 0..200 {
        let key = format!("key-{}", i);
        let first = ring.get(&key).map(str::to_string);
        let second = ring.get(&key).map(str::to_string);
        assert_eq!(first, second, "ownership of {} changed between lookups", key);
        assert!(first.is_some());
    }
}

#[test]
fn test_adding_a_peer_moves_some_keys() {
    let mut ring = HashRing::new(50, None);
    ring.add(&["peer-a", "peer-b", "peer-c"]);

    let keys: Vec<String> = (0..500).map(|i| format!("key-{}", i)).collect();
    let before: Vec<String> = keys
        .iter()
        .map(|k| ring.get(k).unwrap().to_string())
        .collect();

    ring.add(&["peer-d"]);

    let mut moved = 0;
    let mut moved_elsewhere = 0;
    for (key, old_owner) in keys.iter().zip(&before) {
        let new_owner = ring.get(key).unwrap();
        if new_owner != old_owner {
            moved += 1;
            // Reassignments may only flow to the new peer.
            if new_owner != "peer-d" {
                moved_elsewhere += 1;
            }
        }
    }

    assert!(moved > 0, "a new peer should take over at least one key");
    assert_eq!(moved_elsewhere, 0);
    // Roughly 1/(n+1) of the keys should move; anything above half signals a
    // broken ring.
    assert!(moved < keys.len() / 2, "{} of {} keys moved", moved, keys.len());
}

#[test]
fn test_duplicate_positions_resolve_to_last_added() {
    // Both peers hash every virtual node to the same positions.
    let mut ring = HashRing::new(2, Some(Box::new(|_: &[u8]| 7)));
    ring.add(&["first"]);
    ring.add(&["second"]);

    assert_eq!(ring.get("any"), Some("second"));
}
