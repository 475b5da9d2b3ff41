//! Holder registry: pins host storage that runtime instances point into.
//!
//! Each extension instance owns one holder for as long as the runtime keeps
//! the instance alive. The holder keeps the instance's [`Pointer`] (and so
//! the whole root storage it aliases) reachable from the host side; the
//! runtime's deallocation, not host scoping, ends that lifetime.
//!
//! Holders form a doubly linked list threaded through a slab, so both
//! pinning and unpinning are O(1).

use crate::logging::{fatal, trace};
use crate::value::Pointer;

/// Identifies one pinned holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HolderId {
    index: u32,
    generation: u32,
}

struct Entry {
    value: Pointer,
    prev: Option<u32>,
    next: Option<u32>,
}

struct Node {
    generation: u32,
    entry: Option<Entry>,
}

/// Doubly linked list of pinned host values, newest first.
#[derive(Default)]
pub struct HolderRegistry {
    nodes: Vec<Node>,
    free: Vec<u32>,
    head: Option<u32>,
    len: usize,
}

impl HolderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin `value` at the front of the list.
    pub fn pin(&mut self, value: Pointer) -> HolderId {
        let entry = Entry {
            value,
            prev: None,
            next: self.head,
        };
        let index = match self.free.pop() {
            Some(index) => {
                match self.nodes.get_mut(index as usize) {
                    Some(node) => node.entry = Some(entry),
                    None => fatal!("free list names missing holder {index}"),
                }
                index
            }
            None => {
                self.nodes.push(Node {
                    generation: 0,
                    entry: Some(entry),
                });
                (self.nodes.len() - 1) as u32
            }
        };
        if let Some(old_head) = self.head {
            if let Some(head) = self.entry_mut(old_head) {
                head.prev = Some(index);
            }
        }
        self.head = Some(index);
        self.len += 1;

        let id = HolderId {
            index,
            generation: self.nodes.get(index as usize).map_or(0, |node| node.generation),
        };
        trace!(holder = index, pinned = self.len, "pinned holder");
        id
    }

    /// Remove a pinned holder and return its value.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not currently pinned.
    pub fn unpin(&mut self, id: HolderId) -> Pointer {
        let Some(node) = self
            .nodes
            .get_mut(id.index as usize)
            .filter(|node| node.generation == id.generation)
        else {
            fatal!("holder {}.{} is not pinned", id.index, id.generation);
        };
        let Some(entry) = node.entry.take() else {
            fatal!("holder {}.{} is not pinned", id.index, id.generation);
        };
        node.generation = node.generation.wrapping_add(1);

        match entry.prev {
            Some(prev) => {
                if let Some(prev) = self.entry_mut(prev) {
                    prev.next = entry.next;
                }
            }
            None => self.head = entry.next,
        }
        if let Some(next) = entry.next {
            if let Some(next) = self.entry_mut(next) {
                next.prev = entry.prev;
            }
        }

        self.free.push(id.index);
        self.len -= 1;
        trace!(holder = id.index, pinned = self.len, "unpinned holder");
        entry.value
    }

    fn entry_mut(&mut self, index: u32) -> Option<&mut Entry> {
        self.nodes.get_mut(index as usize)?.entry.as_mut()
    }

    pub fn is_pinned(&self, id: HolderId) -> bool {
        self.nodes
            .get(id.index as usize)
            .is_some_and(|node| node.generation == id.generation && node.entry.is_some())
    }

    pub fn get(&self, id: HolderId) -> Option<&Pointer> {
        let node = self.nodes.get(id.index as usize)?;
        if node.generation != id.generation {
            return None;
        }
        node.entry.as_ref().map(|entry| &entry.value)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Pinned values, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &Pointer> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            let entry = self.nodes.get(cursor? as usize)?.entry.as_ref()?;
            cursor = entry.next;
            Some(&entry.value)
        })
    }

    /// Drop every holder. Outstanding ids become stale.
    pub fn clear(&mut self) {
        for (index, node) in self.nodes.iter_mut().enumerate() {
            if node.entry.take().is_some() {
                node.generation = node.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
        self.head = None;
        self.len = 0;
    }
}
