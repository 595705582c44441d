//! Arena - Generational slot storage.
//!
//! Slots are reused through a free list. Every reuse bumps the slot's
//! generation, so an [`Index`] handed out before a removal never resolves to
//! the record that later takes its slot.

/// Index into an [`Arena`]: slot plus generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Index {
    slot: u32,
    generation: u32,
}

impl Index {
    #[inline]
    pub fn slot(self) -> u32 {
        self.slot
    }

    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Generational arena.
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Store `value`, reusing a freed slot when one is available.
    pub fn insert(&mut self, value: T) -> Index {
        self.len += 1;
        if let Some(slot) = self.free.pop() {
            let entry = &mut self.slots[slot as usize];
            entry.generation = entry.generation.wrapping_add(1);
            entry.value = Some(value);
            return Index {
                slot,
                generation: entry.generation,
            };
        }
        let slot = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        Index {
            slot,
            generation: 0,
        }
    }

    /// Remove and return the value. Stale indices return `None`.
    pub fn remove(&mut self, index: Index) -> Option<T> {
        let entry = self.slots.get_mut(index.slot as usize)?;
        if entry.generation != index.generation {
            return None;
        }
        let value = entry.value.take()?;
        self.free.push(index.slot);
        self.len -= 1;
        Some(value)
    }

    pub fn get(&self, index: Index) -> Option<&T> {
        self.slots
            .get(index.slot as usize)
            .filter(|entry| entry.generation == index.generation)
            .and_then(|entry| entry.value.as_ref())
    }

    pub fn get_mut(&mut self, index: Index) -> Option<&mut T> {
        self.slots
            .get_mut(index.slot as usize)
            .filter(|entry| entry.generation == index.generation)
            .and_then(|entry| entry.value.as_mut())
    }

    #[inline]
    pub fn contains(&self, index: Index) -> bool {
        self.get(index).is_some()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (Index, &T)> {
        self.slots.iter().enumerate().filter_map(|(slot, entry)| {
            entry.value.as_ref().map(|value| {
                (
                    Index {
                        slot: slot as u32,
                        generation: entry.generation,
                    },
                    value,
                )
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_remove() {
        let mut arena = Arena::new();
        let a = arena.insert("a");
        let b = arena.insert("b");

        assert_eq!(arena.get(a), Some(&"a"));
        assert_eq!(arena.len(), 2);

        assert_eq!(arena.remove(a), Some("a"));
        assert_eq!(arena.get(a), None);
        assert_eq!(arena.remove(a), None, "double remove is a no-op");
        assert_eq!(arena.get(b), Some(&"b"));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_reused_slot_gets_new_generation() {
        let mut arena = Arena::new();
        let a = arena.insert(1);
        arena.remove(a);
        let b = arena.insert(2);

        assert_eq!(a.slot(), b.slot(), "free slot should be reused");
        assert_ne!(a.generation(), b.generation());
        assert_eq!(arena.get(a), None, "stale index must not see the new value");
        assert_eq!(arena.get(b), Some(&2));
    }

    #[test]
    fn test_iter_skips_free_slots() {
        let mut arena = Arena::new();
        let a = arena.insert(1);
        arena.insert(2);
        arena.remove(a);
        let values: Vec<i32> = arena.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![2]);
    }
}
