//! Generation-checked handle table for objects owned across the C boundary.
//!
//! A handle packs a slot index (high 32 bits) and the slot's generation
//! (low 32 bits). Removing a value bumps the generation, so a handle kept
//! after destroy resolves to `None` instead of aliasing a newer value.

enum Entry<T> {
    Live { generation: u32, value: T },
    Free { generation: u32 },
}

impl<T> Entry<T> {
    fn generation(&self) -> u32 {
        match self {
            Entry::Live { generation, .. } | Entry::Free { generation } => *generation,
        }
    }
}

fn pack(index: u32, generation: u32) -> u64 {
    (u64::from(index) << 32) | u64::from(generation)
}

fn unpack(handle: u64) -> (usize, u32) {
    ((handle >> 32) as usize, handle as u32)
}

/// Owns values on behalf of C callers, addressed by `u64` handles.
///
/// Handle `0` is never issued, so C code can use it as "no manager".
pub(crate) struct HandleTable<T> {
    entries: Vec<Entry<T>>,
    vacant: Vec<u32>,
}

impl<T> HandleTable<T> {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            vacant: Vec::new(),
        }
    }

    /// Store `value`, reusing a vacant slot when one is available.
    pub fn insert(&mut self, value: T) -> u64 {
        match self.vacant.pop() {
            Some(index) => {
                let entry = &mut self.entries[index as usize];
                let generation = entry.generation();
                *entry = Entry::Live { generation, value };
                pack(index, generation)
            }
            None => {
                let index = self.entries.len() as u32;
                // Generations start at 1 so that no handle packs to 0.
                self.entries.push(Entry::Live {
                    generation: 1,
                    value,
                });
                pack(index, 1)
            }
        }
    }

    pub fn get(&self, handle: u64) -> Option<&T> {
        let (index, generation) = unpack(handle);
        match self.entries.get(index)? {
            Entry::Live {
                generation: g,
                value,
            } if *g == generation => Some(value),
            _ => None,
        }
    }

    /// Take the value out and invalidate `handle`.
    ///
    /// A slot whose generation would wrap is retired rather than reused,
    /// so old handles can never match it again.
    pub fn remove(&mut self, handle: u64) -> Option<T> {
        let (index, generation) = unpack(handle);
        let entry = self.entries.get_mut(index)?;
        if !matches!(entry, Entry::Live { generation: g, .. } if *g == generation) {
            return None;
        }
        let next = generation.wrapping_add(1);
        let old = std::mem::replace(entry, Entry::Free { generation: next });
        if next != 0 {
            self.vacant.push(index as u32);
        }
        match old {
            Entry::Live { value, .. } => Some(value),
            Entry::Free { .. } => None,
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, Entry::Live { .. }))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_never_zero() {
        let mut table = HandleTable::new();
        for i in 0..8 {
            let h = table.insert(i);
            assert_ne!(h, 0);
            table.remove(h);
        }
    }

    #[test]
    fn removed_handle_is_stale() {
        let mut table = HandleTable::new();
        let h = table.insert("a");
        assert_eq!(table.get(h), Some(&"a"));
        assert_eq!(table.remove(h), Some("a"));
        assert_eq!(table.get(h), None);
        assert_eq!(table.remove(h), None);
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn reused_slot_gets_a_new_handle() {
        let mut table = HandleTable::new();
        let first = table.insert(1);
        table.remove(first);
        let second = table.insert(2);
        assert_eq!(unpack(first).0, unpack(second).0);
        assert_ne!(first, second);
        assert_eq!(table.get(first), None);
        assert_eq!(table.get(second), Some(&2));
    }

    #[test]
    fn unknown_slot_is_none() {
        let table: HandleTable<u8> = HandleTable::new();
        assert_eq!(table.get(pack(7, 1)), None);
        assert_eq!(table.get(0), None);
    }

    #[test]
    fn wrapping_slot_is_retired() {
        let mut table = HandleTable::new();
        let h = table.insert(1);
        table.remove(h);
        table.entries[0] = Entry::Free {
            generation: u32::MAX,
        };
        let last = table.insert(2);
        assert_eq!(unpack(last), (0, u32::MAX));
        table.remove(last);
        assert!(table.vacant.is_empty());
        let fresh = table.insert(3);
        assert_eq!(unpack(fresh).0, 1);
        assert_eq!(table.get(pack(0, 0)), None);
    }

    proptest::proptest! {
        #[test]
        fn matches_a_map_model(ops in proptest::collection::vec((proptest::bool::ANY, 0usize..8), 1..200)) {
            use std::collections::HashMap;
            let mut table = HandleTable::new();
            let mut model: HashMap<u64, usize> = HashMap::new();
            let mut issued: Vec<u64> = Vec::new();
            for (i, (insert, pick)) in ops.into_iter().enumerate() {
                if insert || issued.is_empty() {
                    let h = table.insert(i);
                    proptest::prop_assert!(!model.contains_key(&h));
                    model.insert(h, i);
                    issued.push(h);
                } else {
                    let h = issued[pick % issued.len()];
                    proptest::prop_assert_eq!(table.remove(h), model.remove(&h));
                }
                for h in &issued {
                    proptest::prop_assert_eq!(table.get(*h), model.get(h));
                }
            }
            proptest::prop_assert_eq!(table.len(), model.len());
        }
    }
}

