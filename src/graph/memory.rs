// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use super::{Direction, Node, Plug};

/// One notification received on a node's error channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlugErrorRecord {
    pub plug: String,
    pub source: Option<String>,
    pub message: String,
}

/// In-memory node that owns its plugs and records every error it is told about.
pub struct MemoryNode {
    name: String,
    plugs: Mutex<Vec<Arc<MemoryPlug>>>,
    errors: Mutex<Vec<PlugErrorRecord>>,
}

impl MemoryNode {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            plugs: Mutex::new(Vec::new()),
            errors: Mutex::new(Vec::new()),
        })
    }

    /// Create a plug owned by this node. The plug is named `node.plug`.
    pub fn add_plug(self: &Arc<Self>, name: &str, direction: Direction) -> Arc<MemoryPlug> {
        let plug = Arc::new(MemoryPlug {
            name: format!("{}.{}", self.name, name),
            direction,
            node: Arc::downgrade(self),
            input: RwLock::new(None),
        });
        self.plugs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(plug.clone());
        plug
    }

    /// Snapshot of the errors received so far, in arrival order.
    pub fn errors(&self) -> Vec<PlugErrorRecord> {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear_errors(&self) {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl std::fmt::Debug for MemoryNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryNode")
            .field("name", &self.name)
            .field(
                "plug_count",
                &self.plugs.lock().unwrap_or_else(PoisonError::into_inner).len(),
            )
            .finish()
    }
}

impl Node for MemoryNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn plug_error(&self, plug: &Arc<dyn Plug>, source: Option<&Arc<dyn Plug>>, message: &str) {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(PlugErrorRecord {
                plug: plug.name().to_string(),
                source: source.map(|s| s.name().to_string()),
                message: message.to_string(),
            });
    }
}

/// In-memory plug. Nodeless plugs can be made with [`MemoryPlug::new`].
pub struct MemoryPlug {
    name: String,
    direction: Direction,
    node: Weak<MemoryNode>,
    input: RwLock<Option<Arc<dyn Plug>>>,
}

impl MemoryPlug {
    pub fn new(name: impl Into<String>, direction: Direction) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            direction,
            node: Weak::new(),
            input: RwLock::new(None),
        })
    }

    /// Connect (or disconnect, with `None`) this plug's input.
    pub fn set_input(&self, input: Option<Arc<dyn Plug>>) {
        *self.input.write().unwrap_or_else(PoisonError::into_inner) = input;
    }
}

impl std::fmt::Debug for MemoryPlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryPlug")
            .field("name", &self.name)
            .field("direction", &self.direction)
            .finish()
    }
}

impl Plug for MemoryPlug {
    fn name(&self) -> &str {
        &self.name
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn node(&self) -> Option<Arc<dyn Node>> {
        self.node.upgrade().map(|n| n as Arc<dyn Node>)
    }

    fn input(&self) -> Option<Arc<dyn Plug>> {
        self.input
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::same_plug;

    #[test]
    fn test_plug_names_are_qualified_by_node() {
        let node = MemoryNode::new("add");
        let plug = node.add_plug("sum", Direction::Out);
        assert_eq!(plug.name(), "add.sum");
        assert_eq!(plug.node().map(|n| n.name().to_string()), Some("add".to_string()));
    }

    #[test]
    fn test_nodeless_plug_has_no_node() {
        let plug = MemoryPlug::new("loose", Direction::In);
        assert!(plug.node().is_none());
        assert!(plug.input().is_none());
    }

    #[test]
    fn test_set_input_connects_and_disconnects() {
        let source: Arc<dyn Plug> = MemoryPlug::new("source", Direction::Out);
        let dest = MemoryPlug::new("dest", Direction::In);

        dest.set_input(Some(source.clone()));
        let connected = dest.input().expect("input should be connected");
        assert!(same_plug(&connected, &source));

        dest.set_input(None);
        assert!(dest.input().is_none());
    }

    #[test]
    fn test_plug_error_is_recorded() {
        let node = MemoryNode::new("n");
        let out: Arc<dyn Plug> = node.add_plug("out", Direction::Out);
        let origin: Arc<dyn Plug> = MemoryPlug::new("origin", Direction::In);

        node.plug_error(&out, Some(&origin), "boom");
        node.plug_error(&out, None, "again");

        assert_eq!(
            node.errors(),
            vec![
                PlugErrorRecord {
                    plug: "n.out".to_string(),
                    source: Some("origin".to_string()),
                    message: "boom".to_string(),
                },
                PlugErrorRecord {
                    plug: "n.out".to_string(),
                    source: None,
                    message: "again".to_string(),
                },
            ]
        );

        node.clear_errors();
        assert!(node.errors().is_empty());
    }
}
