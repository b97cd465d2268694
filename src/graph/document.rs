//! Graph documents: the persistence hook for a node graph.
//!
//! A document lists built-in operators (kind tag plus parameters) in table
//! order and connections as `(source, dest, slot)` triples of document
//! indices. Restoring clears the system, recreates the operators in file
//! order and then reconnects them.
//!
//! Plugin operators have no serialized form and are left out, together with
//! their connections.

use super::error::GraphError;
use super::id::NodeId;
use super::kind::OperatorKind;
use super::operator::BuiltinOperator;
use super::system::NodeSystem;
use crate::error::{PixelGraphError, Result, ResultExt};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Current document format version
pub const DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentConnection {
    pub source: usize,
    pub dest: usize,
    pub slot: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
    pub nodes: Vec<BuiltinOperator>,
    #[serde(default)]
    pub connections: Vec<DocumentConnection>,
}

fn default_version() -> u32 {
    DOCUMENT_VERSION
}

impl GraphDocument {
    /// Snapshot the built-in operators and connections of `system`.
    pub fn capture(system: &NodeSystem) -> Self {
        let mut index_of = HashMap::new();
        let mut nodes = Vec::new();

        for id in system.nodes() {
            let Some(operator) = system.operator(id) else {
                continue;
            };
            match operator.as_builtin() {
                Some(builtin) => {
                    index_of.insert(id, nodes.len());
                    nodes.push(builtin.clone());
                }
                None => tracing::debug!(?id, name = operator.name(), "Skipping plugin operator"),
            }
        }

        let connections = system
            .connections()
            .into_iter()
            .filter_map(|id| system.connection(id))
            .filter_map(|c| {
                Some(DocumentConnection {
                    source: *index_of.get(&c.source)?,
                    dest: *index_of.get(&c.dest)?,
                    slot: c.slot,
                })
            })
            .collect();

        Self {
            version: DOCUMENT_VERSION,
            saved_at: Some(Utc::now()),
            nodes,
            connections,
        }
    }

    /// Replace the contents of `system` with this document.
    ///
    /// Returns the handle assigned to each document node. Image sources whose
    /// file cannot be read are kept with an empty bitmap; scripts that fail to
    /// load are kept without slots and output the default color.
    pub fn restore(&self, system: &NodeSystem) -> Result<Vec<NodeId>> {
        system.clear();

        let mut handles = Vec::with_capacity(self.nodes.len());
        for (index, node) in self.nodes.iter().enumerate() {
            let id = match node {
                BuiltinOperator::Output(_) if !handles.contains(&system.output()) => {
                    system.output()
                }
                BuiltinOperator::ImageSource(source) => {
                    let mut source = source.clone();
                    if let Err(e) = source.reload() {
                        tracing::warn!("Image source {} kept empty: {}", index, e);
                    }
                    system
                        .try_create(source)
                        .with_context(|| format!("Restoring node {}", index))?
                }
                BuiltinOperator::Script(script) => {
                    let mut script = script.clone();
                    if let Err(e) = script.reload() {
                        tracing::warn!("Script {} falls back to the default color: {}", index, e);
                    }
                    system
                        .try_create(script)
                        .with_context(|| format!("Restoring node {}", index))?
                }
                other => system
                    .try_create(other.clone())
                    .with_context(|| format!("Restoring node {}", index))?,
            };
            handles.push(id);
        }

        for conn in &self.connections {
            let source = lookup(&handles, conn.source)?;
            let dest = lookup(&handles, conn.dest)?;
            system
                .try_connect(source, dest, conn.slot)
                .with_context(|| format!("Restoring connection {:?}", conn))?;
        }

        tracing::info!(
            nodes = handles.len(),
            connections = self.connections.len(),
            "Graph document restored"
        );
        Ok(handles)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let document: Self = serde_json::from_str(&content)
            .map_err(|e| PixelGraphError::Document(format!("Failed to parse document: {}", e)))?;
        if document.version > DOCUMENT_VERSION {
            return Err(PixelGraphError::Document(format!(
                "Unsupported document version {}",
                document.version
            )));
        }
        Ok(document)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| PixelGraphError::Serialization(e.to_string()))?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Number of document nodes of `kind`.
    pub fn count_kind(&self, kind: OperatorKind) -> usize {
        self.nodes.iter().filter(|n| n.kind() == kind).count()
    }
}

fn lookup(handles: &[NodeId], index: usize) -> Result<NodeId> {
    handles
        .get(index)
        .copied()
        .ok_or_else(|| GraphError::UnknownDocumentNode(index).into())
}
