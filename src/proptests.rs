use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Check parent/child agreement, key order under the tree's comparator and
/// that the reachable node count matches `len`.
fn validate_tree<K, V, C: Compare<K>>(t: &Tree<K, V, C>) {
    let cmp = t.comparator();
    let mut stack = Vec::new();
    if let Some(root) = t.root_id() {
        assert!(t.node(root).parent.is_none(), "root must not have a parent");
        stack.push((root, None, None));
    } else {
        assert_eq!(t.len(), 0, "rootless tree must be empty");
    }

    let mut reachable = 0usize;
    while let Some((id, lower, upper)) = stack.pop() {
        reachable += 1;
        let node = t.node(id);
        let key = node.payload.key();
        if let Some(lower) = lower {
            assert_eq!(cmp.compare(lower, key), Ordering::Less, "right subtree key out of order");
        }
        if let Some(upper) = upper {
            assert_eq!(cmp.compare(key, upper), Ordering::Less, "left subtree key out of order");
        }

        if let Some(left) = node.left {
            assert_eq!(t.node(left).parent, Some(id), "left child must link back");
            stack.push((left, lower, Some(key)));
        }
        if let Some(right) = node.right {
            assert_eq!(t.node(right).parent, Some(id), "right child must link back");
            stack.push((right, Some(key), upper));
        }
    }

    assert_eq!(reachable, t.len(), "reachable nodes must match Tree::len");
    assert_eq!(t.live_nodes(), t.len(), "no node may leak out of the structure");
}

fn handle_walk<K: Clone, V, C: Compare<K>>(t: &Tree<K, V, C>) -> (Vec<K>, Vec<K>) {
    let mut forward = Vec::new();
    let mut h = t.first();
    while h != t.stop() {
        forward.push(t.current(h).expect("live handle").key().clone());
        h = t.next(h);
    }

    let mut backward = Vec::new();
    let mut h = t.last();
    while h != t.stop() {
        backward.push(t.current(h).expect("live handle").key().clone());
        h = t.prev(h);
    }
    (forward, backward)
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 50)]
    Insert(#[proptest(strategy = "0u16..512")] u16, u32),
    #[proptest(weight = 25)]
    Remove(#[proptest(strategy = "0u16..512")] u16),
    #[proptest(weight = 15)]
    Get(#[proptest(strategy = "0u16..512")] u16),
    #[proptest(weight = 4)]
    EraseFirst,
    #[proptest(weight = 4)]
    EraseLast,
    #[proptest(weight = 1)]
    Clear,
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in prop::collection::vec(any::<Op>(), 0..=2000)) {
        let mut t: Tree<u16, u32> = Tree::new();
        let mut m: BTreeMap<u16, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    let (slot, created) = t.insert(key).unwrap();
                    prop_assert_eq!(created, !m.contains_key(&key));
                    if created {
                        prop_assert_eq!(*slot, 0);
                        *slot = value;
                        m.insert(key, value);
                    } else {
                        prop_assert_eq!(Some(*slot), m.get(&key).copied());
                    }
                }
                Op::Remove(key) => {
                    let got = t.remove(&key).map(Item::into_parts);
                    prop_assert_eq!(got, m.remove_entry(&key));
                }
                Op::Get(key) => {
                    prop_assert_eq!(t.get(&key), m.get(&key));
                }
                Op::EraseFirst => {
                    let next = t.erase(t.first());
                    m.pop_first();
                    prop_assert_eq!(t.current(next).map(|i| *i.key()), m.keys().next().copied());
                }
                Op::EraseLast => {
                    let next = t.erase(t.last());
                    m.pop_last();
                    prop_assert!(next.is_stop());
                }
                Op::Clear => {
                    t.clear();
                    m.clear();
                }
            }

            prop_assert_eq!(t.len(), m.len());
        }

        validate_tree(&t);
        let got: Vec<(u16, u32)> = t.iter().map(|(k, v)| (*k, *v)).collect();
        let expected: Vec<(u16, u32)> = m.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(got, expected);

        let (forward, mut backward) = handle_walk(&t);
        backward.reverse();
        prop_assert_eq!(&forward, &backward);
        prop_assert_eq!(forward, m.keys().copied().collect::<Vec<_>>());
        if t.is_empty() {
            prop_assert_eq!(t.first(), t.stop());
        }
    }

    #[test]
    fn prop_handles_follow_removal(
        keys in prop::collection::btree_set(any::<i32>(), 1..200),
        victims in prop::collection::vec(any::<prop::sample::Index>(), 1..50),
    ) {
        let keys: Vec<i32> = keys.into_iter().collect();
        let mut t: Tree<i32, ()> = Tree::new();
        for k in &keys {
            t.insert(*k).unwrap();
        }

        for victim in victims {
            let key = keys[victim.index(keys.len())];
            let h = t.find(&key);
            let was_present = t.remove(&key).is_some();
            prop_assert_eq!(was_present, !h.is_stop());
            prop_assert!(t.current(h).is_none());
            prop_assert!(t.find(&key).is_stop());
        }

        validate_tree(&t);
        for (k, _) in t.iter() {
            let h = t.find(k);
            prop_assert_eq!(t.current(h).map(Item::key), Some(k));
        }
    }

    #[test]
    fn prop_reverse_comparator(keys in prop::collection::vec(any::<u8>(), 0..300)) {
        let mut t = Tree::with_comparator(|a: &u8, b: &u8| b.cmp(a));
        for k in &keys {
            *t.insert(*k).unwrap().0 = u32::from(*k);
        }
        validate_tree(&t);

        let mut expected: Vec<u8> = keys.clone();
        expected.sort_unstable_by(|a, b| b.cmp(a));
        expected.dedup();
        let got: Vec<u8> = t.iter().map(|(k, _)| *k).collect();
        prop_assert_eq!(got, expected);
    }
}

/// Every ordering of `items`, generated in place by Heap's algorithm.
fn permutations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    let mut perm = items.to_vec();
    let mut counters = vec![0usize; perm.len()];
    let mut all = vec![perm.clone()];
    let mut i = 1;
    while i < perm.len() {
        if counters[i] < i {
            perm.swap(if i % 2 == 0 { 0 } else { counters[i] }, i);
            all.push(perm.clone());
            counters[i] += 1;
            i = 1;
        } else {
            counters[i] = 0;
            i += 1;
        }
    }
    all
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys: Vec<u32> = vec![1, 2, 3, 4, 5, 6, 7];
    let perms = permutations(&keys);
    let distinct: std::collections::BTreeSet<&Vec<u32>> = perms.iter().collect();
    assert_eq!((perms.len(), distinct.len()), (5040, 5040));

    for perm in perms {
        let mut t: Tree<u32, u32> = Tree::new();
        for (i, k) in perm.into_iter().enumerate() {
            let (slot, created) = t.insert(k).unwrap();
            assert!(created);
            *slot = i as u32;
        }

        validate_tree(&t);
        let (forward, mut backward) = handle_walk(&t);
        assert_eq!(forward, keys);
        backward.reverse();
        assert_eq!(backward, keys);
    }
}

#[test]
fn exhaustive_remove_order_small_set() {
    let keys: Vec<u32> = vec![4, 2, 6, 1, 3, 5, 7];

    // Insert in a fixed order, then remove in all permutations.
    let mut base_tree: Tree<u32, u32> = Tree::new();
    for k in &keys {
        *base_tree.insert(*k).unwrap().0 = k * 10;
    }

    for perm in permutations(&keys) {
        let mut t = base_tree.clone();
        let mut m: BTreeMap<u32, u32> = keys.iter().map(|k| (*k, k * 10)).collect();

        for k in perm {
            assert_eq!(t.remove(&k).map(Item::into_parts), m.remove_entry(&k));
            assert_eq!(t.len(), m.len());
            validate_tree(&t);
            let got: Vec<u32> = t.iter().map(|(k, _)| *k).collect();
            assert_eq!(got, m.keys().copied().collect::<Vec<_>>());
        }
        assert_eq!(t.len(), 0);
        assert!(t.root_id().is_none());
        assert_eq!(t.first(), t.stop());
    }
}

#[test]
fn raw_tree_matches_typed_tree() {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn by_be_u32(a: &[u8], b: &[u8]) -> Ordering {
        a.cmp(b)
    }

    let mut rng = StdRng::seed_from_u64(7);
    let mut raw = RawTree::create(4, 8, Some(by_be_u32)).unwrap();
    let mut typed: Tree<u32, u64> = Tree::new();

    for _ in 0..20_000 {
        let key: u32 = rng.gen_range(0..2_000);
        match rng.gen_range(0..100) {
            0..=59 => {
                let v: u64 = rng.gen();
                let (slot, created) = raw.insert(&key.to_be_bytes()).unwrap();
                if created {
                    slot.copy_from_slice(&v.to_be_bytes());
                }
                let (typed_slot, typed_created) = typed.insert_with(key, || v).unwrap();
                assert_eq!(created, typed_created);
                assert_eq!(u64::from_be_bytes((&*slot).try_into().unwrap()), *typed_slot);
            }
            _ => {
                raw.remove(&key.to_be_bytes(), None);
                typed.remove(&key);
            }
        }
        assert_eq!(raw.count(), typed.len());
    }

    let mut h = raw.first();
    for (k, v) in &typed {
        let item = raw.current(h).unwrap();
        assert_eq!(&**item.key(), &k.to_be_bytes());
        assert_eq!(&**item.value(), &v.to_be_bytes());
        h = raw.next(h);
    }
    assert_eq!(h, raw.stop());
}
