// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Sharing groups of native contexts.
//!
//! Contexts that share objects, through a share target at creation or a later
//! `wglShareLists`, form one group. Groups are kept as a union-find forest
//! over node ids that are never reused. A destroyed context leaves its node in
//! place as a dead link, so the rest of its group stays connected.
//!
//! Each group's representative is its earliest-created live member.

use crate::native::NativeContext;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug)]
struct Node {
    parent: usize,
    rank: u8,
    context: NativeContext,
    created: u64,
    // Live members by creation order; only kept up to date on root nodes.
    members: BTreeMap<u64, NativeContext>,
}

/// Union-find over the sharing relation between native contexts.
#[derive(Debug, Default)]
pub struct SharingGroups {
    nodes: Vec<Node>,
    live: HashMap<NativeContext, usize>,
    next_created: u64,
}

impl SharingGroups {
    /// An empty forest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `context` as a group of its own.
    ///
    /// ## Returns
    /// `false` when the context was already known.
    pub fn insert(&mut self, context: NativeContext) -> bool {
        if self.live.contains_key(&context) {
            return false;
        }
        let id = self.nodes.len();
        let created = self.next_created;
        self.next_created += 1;
        self.nodes.push(Node {
            parent: id,
            rank: 0,
            context,
            created,
            members: BTreeMap::from([(created, context)]),
        });
        self.live.insert(context, id);
        true
    }

    /// `true` while `context` is registered.
    pub fn contains(&self, context: NativeContext) -> bool {
        self.live.contains_key(&context)
    }

    /// Number of live contexts.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// `true` when no context is registered.
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    fn find(&mut self, id: usize) -> usize {
        let mut root = id;
        while self.nodes[root].parent != root {
            root = self.nodes[root].parent;
        }
        let mut current = id;
        while self.nodes[current].parent != root {
            let next = self.nodes[current].parent;
            self.nodes[current].parent = root;
            current = next;
        }
        root
    }

    /// Merges the groups of `a` and `b`, registering either one if unknown.
    pub fn union(&mut self, a: NativeContext, b: NativeContext) {
        self.insert(a);
        self.insert(b);
        let (Some(&a), Some(&b)) = (self.live.get(&a), self.live.get(&b)) else {
            return;
        };
        let (mut root_a, mut root_b) = (self.find(a), self.find(b));
        if root_a == root_b {
            return;
        }
        if self.nodes[root_a].rank < self.nodes[root_b].rank {
            std::mem::swap(&mut root_a, &mut root_b);
        }
        let moved = std::mem::take(&mut self.nodes[root_b].members);
        let equal_rank = self.nodes[root_a].rank == self.nodes[root_b].rank;
        self.nodes[root_b].parent = root_a;
        let winner = &mut self.nodes[root_a];
        winner.members.extend(moved);
        if equal_rank {
            winner.rank += 1;
        }
    }

    /// The representative of `context`'s group.
    pub fn resolve_root(&mut self, context: NativeContext) -> Option<NativeContext> {
        let id = *self.live.get(&context)?;
        let root = self.find(id);
        self.nodes[root].members.values().next().copied()
    }

    /// Live members of `context`'s group, earliest-created first.
    pub fn members(&mut self, context: NativeContext) -> Vec<NativeContext> {
        let Some(&id) = self.live.get(&context) else {
            return Vec::new();
        };
        let root = self.find(id);
        self.nodes[root].members.values().copied().collect()
    }

    /// `true` when `a` and `b` are live members of the same group.
    pub fn same_group(&mut self, a: NativeContext, b: NativeContext) -> bool {
        match (self.live.get(&a).copied(), self.live.get(&b).copied()) {
            (Some(a), Some(b)) => self.find(a) == self.find(b),
            _ => false,
        }
    }

    /// Removes `context` from its group. The node stays behind as a link.
    pub fn remove(&mut self, context: NativeContext) -> bool {
        let Some(id) = self.live.remove(&context) else {
            return false;
        };
        let root = self.find(id);
        let created = self.nodes[id].created;
        self.nodes[root].members.remove(&created);
        debug_assert_eq!(self.nodes[id].context, context);
        true
    }

    /// Forgets every context.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.live.clear();
    }
}
