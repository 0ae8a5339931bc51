//! # Storage Property Tests
//!
//! Drives sets, maps and the allocator through long seeded operation
//! sequences and checks them against a plain `HashMap` model:
//!
//! 1. **Membership**: insert then contains, erase then !contains
//! 2. **Size**: len == inserted - erased
//! 3. **Swap-remove locality**: an erase moves at most one other handle
//! 4. **Parallelism**: `data()[index_of(h)]` is always `h`'s value
//! 5. **Paging**: k distinct pages touched => k pages allocated
//!
//! Run with: cargo test --test storage_properties

use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strata_core::{
    Handle32, HandleAllocator, SparseMap, SparseSet, StorageConfig, PAGE_SIZE,
};

const OPERATIONS: usize = 20_000;

fn positions(set: &SparseSet<Handle32>) -> HashMap<Handle32, usize> {
    set.entities()
        .iter()
        .map(|&handle| (handle, set.index_of(handle)))
        .collect()
}

#[test]
fn set_matches_model_under_random_operations() {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    let mut set: SparseSet<Handle32> = SparseSet::new();
    let mut model: HashSet<Handle32> = HashSet::new();

    for _ in 0..OPERATIONS {
        let handle = Handle32::new(rng.gen_range(0..50_000), 0);
        if model.contains(&handle) {
            set.erase(handle);
            model.remove(&handle);
            assert!(!set.contains(handle));
        } else {
            set.insert(handle);
            model.insert(handle);
            assert!(set.contains(handle));
        }
        assert_eq!(set.len(), model.len());
        assert_eq!(set.is_empty(), model.is_empty());
    }

    for &handle in &model {
        assert_eq!(set.entities()[set.index_of(handle)], handle);
    }
}

#[test]
fn erase_moves_at_most_the_last_handle() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut set: SparseSet<Handle32> = (0..500).map(|i| Handle32::new(i * 3, 0)).collect();

    while !set.is_empty() {
        let before = positions(&set);
        let last = *set.entities().last().unwrap();
        let victim = set.entities()[rng.gen_range(0..set.len())];

        set.erase(victim);

        let after = positions(&set);
        let moved: Vec<Handle32> = after
            .iter()
            .filter(|&(handle, position)| before[handle] != *position)
            .map(|(&handle, _)| handle)
            .collect();

        assert!(moved.len() <= 1);
        if let Some(&handle) = moved.first() {
            assert_eq!(handle, last);
            assert_eq!(after[&handle], before[&victim]);
        }
    }
}

#[test]
fn map_values_stay_parallel_to_entities() {
    let mut rng = StdRng::seed_from_u64(0xDA7A);
    let mut map: SparseMap<Handle32, u64> = SparseMap::new();
    let mut model: HashMap<Handle32, u64> = HashMap::new();

    for step in 0..OPERATIONS as u64 {
        let handle = Handle32::new(rng.gen_range(0..2_000), rng.gen_range(0..2));
        let occupied = model.keys().any(|other| other.index() == handle.index());

        if model.contains_key(&handle) {
            if rng.gen_bool(0.5) {
                assert_eq!(map.remove(handle), model.remove(&handle).unwrap());
            } else {
                *map.get_mut(handle) = step;
                model.insert(handle, step);
            }
        } else if !occupied {
            map.insert(handle, step);
            model.insert(handle, step);
        } else {
            assert!(map.try_get(handle).is_none());
        }

        assert_eq!(map.entities().len(), map.data().len());
        assert_eq!(map.len(), model.len());
    }

    for (&handle, &value) in &model {
        assert_eq!(map.data()[map.index_of(handle)], value);
        assert_eq!(*map.get(handle), value);
    }
    for (handle, value) in map.iter() {
        assert_eq!(model[&handle], *value);
    }
}

#[test]
fn pages_allocated_only_for_touched_ranges() {
    let mut set: SparseSet<Handle32> = SparseSet::new();
    let touched = [0usize, 3, 17, 255];

    for &page in &touched {
        for offset in (0..PAGE_SIZE).step_by(97) {
            let index = u32::try_from(page * PAGE_SIZE + offset).unwrap();
            set.insert(Handle32::new(index, 0));
        }
    }

    assert_eq!(set.page_count(), touched.len());
}

#[test]
fn recycled_index_is_a_different_entity() {
    let mut allocator: HandleAllocator<Handle32> = HandleAllocator::new();
    let mut names: SparseMap<Handle32, &str> = SparseMap::new();

    let old = allocator.allocate().unwrap();
    names.insert(old, "old");
    names.erase(old);
    allocator.release(old).unwrap();

    let new = allocator.allocate().unwrap();
    assert_eq!(old.index(), new.index());
    names.insert(new, "new");

    assert!(names.contains(new));
    assert!(!names.contains(old));
    assert_eq!(names.try_get(old), None);
    assert_eq!(names[new], "new");
}

#[test]
fn config_drives_capacities() {
    let config = StorageConfig::from_toml_str(
        "dense_capacity = 256\nallocator_capacity = 3\n",
    )
    .unwrap();

    let set: SparseSet<Handle32> = SparseSet::from_config(&config);
    let map: SparseMap<Handle32, u8> = SparseMap::from_config(&config);
    let mut allocator: HandleAllocator<Handle32> = HandleAllocator::from_config(&config);

    assert!(set.capacity() >= 256);
    assert!(map.capacity() >= 256);
    assert_eq!(set.page_count(), 0);

    for _ in 0..3 {
        allocator.allocate().unwrap();
    }
    assert!(allocator.allocate().is_err());
}
