//! Trigger injection.
//!
//! Toolkit widgets ask for actions to run whenever a sensor changes (for
//! example refreshing a bar). The requests are collected into a [`TriggerMap`]
//! while the toolkit snippet is built and attached to the already-built
//! sensor declarations afterwards, as typed child nodes.

use crate::compiler::entities::{EntityKey, EntityKind};
use crate::compiler::ir::Node;

/// Trigger keyword for a declaration section.
pub const fn keyword_for(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Numeric | EntityKind::Text => "on_value",
        EntityKind::Binary => "on_state",
    }
}

/// A pending trigger: the actions to run when `key` changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerRecord {
    /// Source the actions react to
    pub key: EntityKey,
    /// Actions, in request order, without duplicates
    pub actions: Vec<Node>,
}

impl TriggerRecord {
    fn matches(&self, decl: &Node) -> bool {
        let id = decl.get("id").and_then(Node::as_scalar);
        if id.is_some_and(|id| {
            id == self.key.sensor_id(EntityKind::Numeric)
                || id == self.key.sensor_id(EntityKind::Text)
        }) {
            return true;
        }
        let entity = decl.get("entity_id").and_then(Node::as_scalar);
        let attribute = decl.get("attribute").and_then(Node::as_scalar);
        entity == Some(self.key.source.as_str()) && attribute == self.key.attribute.as_deref()
    }
}

/// Pending triggers of one compilation, keyed by source.
#[derive(Debug, Clone, Default)]
pub struct TriggerMap {
    records: Vec<TriggerRecord>,
}

impl TriggerMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests an action for a source. Identical requests collapse.
    pub fn add(&mut self, key: EntityKey, action: Node) {
        if let Some(record) = self.records.iter_mut().find(|r| r.key == key) {
            if !record.actions.contains(&action) {
                record.actions.push(action);
            }
        } else {
            self.records.push(TriggerRecord {
                key,
                actions: vec![action],
            });
        }
    }

    /// Moves every request of `other` into this map.
    pub fn extend(&mut self, other: TriggerMap) {
        for record in other.records {
            for action in record.actions {
                self.add(record.key.clone(), action);
            }
        }
    }

    /// Number of pending records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Pending records, in request order.
    pub fn pending(&self) -> &[TriggerRecord] {
        &self.records
    }

    /// Drains whatever was never matched.
    pub fn take_unmatched(&mut self) -> Vec<TriggerRecord> {
        std::mem::take(&mut self.records)
    }
}

/// Attaches pending triggers to matching declarations.
///
/// Only runs in toolkit mode. Each record is applied to the first declaration
/// it matches and then consumed. Returns the number of records injected.
pub fn inject(
    declarations: &mut [Node],
    triggers: &mut TriggerMap,
    toolkit_mode: bool,
    keyword: &str,
) -> usize {
    if !toolkit_mode || triggers.is_empty() {
        return 0;
    }

    let mut injected = 0;
    triggers.records.retain(|record| {
        let Some(decl) = declarations.iter_mut().find(|d| record.matches(d)) else {
            return true;
        };
        attach(decl, keyword, &record.actions);
        tracing::debug!(
            "Attached {} action(s) to {} under {}",
            record.actions.len(),
            record.key.raw_key(),
            keyword
        );
        injected += 1;
        false
    });
    injected
}

/// Adds actions under `keyword`, reusing an existing block.
///
/// Actions already present in the block are skipped.
pub fn attach(decl: &mut Node, keyword: &str, actions: &[Node]) {
    match decl.get_mut(keyword) {
        Some(slot) => {
            let block = std::mem::replace(slot, Node::map());
            *slot = merge_block(block, actions);
        }
        None => decl.insert(keyword, merge_block(Node::map(), actions)),
    }
}

fn merge_block(block: Node, actions: &[Node]) -> Node {
    match block {
        Node::List(mut items) => {
            extend_unique(&mut items, actions);
            Node::List(items)
        }
        Node::Map(mut entries) => {
            if let Some((_, then)) = entries.iter_mut().find(|(k, _)| k == "then") {
                let mut items = match std::mem::replace(then, Node::list()) {
                    Node::List(items) => items,
                    single => vec![single],
                };
                extend_unique(&mut items, actions);
                *then = Node::List(items);
                return Node::Map(entries);
            }
            // a single inline action becomes the first `then` item
            let mut items = if entries.is_empty() {
                Vec::new()
            } else {
                vec![Node::Map(entries)]
            };
            extend_unique(&mut items, actions);
            Node::map().with("then", Node::List(items))
        }
        other => {
            let mut items = vec![other];
            extend_unique(&mut items, actions);
            Node::map().with("then", Node::List(items))
        }
    }
}

fn extend_unique(items: &mut Vec<Node>, actions: &[Node]) {
    for action in actions {
        if !items.contains(action) {
            items.push(action.clone());
        }
    }
}
