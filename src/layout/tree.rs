use std::ops::{Index, IndexMut};

use super::node::Container;

/// Generation-checked handle into a [`Tree`]. Handles to removed containers
/// stay invalid even after their slot is reused.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ContainerId {
    index: u32,
    generation: u32,
}

struct Slot {
    generation: u32,
    node: Option<Container>,
}

/// Arena holding one client's container tree. Every container is owned by
/// exactly one parent; the root is owned by the tree itself.
pub struct Tree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: ContainerId,
    len: usize,
}

impl Tree {
    pub fn new(root: Container) -> Self {
        let mut tree = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: ContainerId {
                index: 0,
                generation: 0,
            },
            len: 0,
        };
        tree.root = tree.alloc(root);
        tree
    }

    fn alloc(&mut self, container: Container) -> ContainerId {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(container);
            return ContainerId {
                index,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            node: Some(container),
        });
        ContainerId {
            index: (self.slots.len() - 1) as u32,
            generation: 0,
        }
    }

    pub fn root(&self) -> ContainerId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, id: ContainerId) -> Option<&Container> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_ref())
    }

    pub fn get_mut(&mut self, id: ContainerId) -> Option<&mut Container> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_mut())
    }

    pub fn contains(&self, id: ContainerId) -> bool {
        self.get(id).is_some()
    }

    /// Appends `container` as the last child of `parent`.
    pub fn add(&mut self, parent: ContainerId, container: Container) -> Option<ContainerId> {
        let at = self.get(parent)?.children.len();
        self.insert(parent, at, container)
    }

    pub fn insert(
        &mut self,
        parent: ContainerId,
        index: usize,
        mut container: Container,
    ) -> Option<ContainerId> {
        if !self.contains(parent) {
            return None;
        }
        container.parent = Some(parent);
        container.children.clear();
        let id = self.alloc(container);
        let siblings = &mut self.get_mut(parent)?.children;
        siblings.insert(index.min(siblings.len()), id);
        Some(id)
    }

    /// Removes `id` and its whole subtree. The root can't be removed.
    pub fn remove(&mut self, id: ContainerId) -> bool {
        if id == self.root {
            return false;
        }
        let Some(parent) = self.get(id).map(|c| c.parent) else {
            return false;
        };
        if let Some(p) = parent.and_then(|p| self.get_mut(p)) {
            p.children.retain(|c| *c != id);
        }
        self.free_subtree(id);
        true
    }

    pub fn clear_children(&mut self, id: ContainerId) {
        let Some(node) = self.get_mut(id) else {
            return;
        };
        for child in std::mem::take(&mut node.children) {
            self.free_subtree(child);
        }
    }

    fn free_subtree(&mut self, id: ContainerId) {
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let Some(slot) = self
                .slots
                .get_mut(next.index as usize)
                .filter(|s| s.generation == next.generation)
            else {
                continue;
            };
            if let Some(node) = slot.node.take() {
                stack.extend(node.children.iter().copied());
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(next.index);
                self.len -= 1;
            }
        }
    }

    pub fn parent(&self, id: ContainerId) -> Option<ContainerId> {
        self.get(id).and_then(|c| c.parent)
    }

    pub fn children(&self, id: ContainerId) -> &[ContainerId] {
        self.get(id).map_or(&[], |c| c.children.as_slice())
    }

    pub fn is_ancestor(&self, ancestor: ContainerId, id: ContainerId) -> bool {
        let mut cursor = self.parent(id);
        while let Some(p) = cursor {
            if p == ancestor {
                return true;
            }
            cursor = self.parent(p);
        }
        false
    }

    /// Children before their parent, siblings in stored order.
    pub fn post_order(&self, from: ContainerId) -> Vec<ContainerId> {
        let mut out = Vec::new();
        self.post_order_into(from, &mut out);
        out
    }

    fn post_order_into(&self, id: ContainerId, out: &mut Vec<ContainerId>) {
        let Some(node) = self.get(id) else {
            return;
        };
        for child in &node.children {
            self.post_order_into(*child, out);
        }
        out.push(id);
    }

    /// First container (pre-order) carrying the debug name `name`.
    pub fn find(&self, name: &str) -> Option<ContainerId> {
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = self.get(id)?;
            if node.name.as_deref() == Some(name) {
                return Some(id);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }
}

impl Index<ContainerId> for Tree {
    type Output = Container;

    fn index(&self, id: ContainerId) -> &Container {
        self.get(id).expect("stale container id")
    }
}

impl IndexMut<ContainerId> for Tree {
    fn index_mut(&mut self, id: ContainerId) -> &mut Container {
        self.get_mut(id).expect("stale container id")
    }
}
