//! Documents and their JSON persistence format.
//!
//! A saved graph lists each block type guid once (`guid_map`) and each block
//! uid once (`uid_map`). Blocks refer to their type by index into
//! `guid_map`; wires refer to their blocks by index into `uid_map` and to
//! ports by guid.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::EditorError;
use crate::model::block::{Block, BlockDefinition};
use crate::model::connector::Connector;
use crate::model::graph::{Graph, GraphKind};
use crate::model::math::{Vector2, Viewport};
use crate::model::port::{PortDefinition, PortId};
use crate::registry::block_registry::BlockRegistry;

pub const FORMAT_VERSION: u32 = 1;

/// A named set of graphs saved together.
#[derive(Clone, Debug)]
pub struct Document {
    pub uid: Uuid,
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
    pub graphs: Vec<Graph>,
}

#[derive(Serialize, Deserialize, Debug)]
struct SavedDocument {
    format_version: u32,
    uid: Uuid,
    name: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    graphs: Vec<SavedGraph>,
}

#[derive(Serialize, Deserialize, Debug)]
struct SavedGraph {
    uid: Uuid,
    name: String,
    #[serde(default, rename = "type")]
    kind: GraphKind,
    #[serde(default)]
    version: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    viewport: Viewport,
    guid_map: Vec<String>,
    uid_map: Vec<Uuid>,
    blocks: Vec<SavedBlock>,
    connectors: Vec<SavedConnector>,
}

#[derive(Serialize, Deserialize, Debug)]
struct SavedBlock {
    /// Index into `guid_map`.
    guid: usize,
    uid: Uuid,
    position: Vector2,
    #[serde(default)]
    custom_size: Vector2,
    #[serde(default)]
    options: Map<String, Value>,
    #[serde(default)]
    ports: Vec<SavedPort>,
}

#[derive(Serialize, Deserialize, Debug)]
struct SavedPort {
    guid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    initial_value: Option<Value>,
    #[serde(default)]
    dynamic_add: bool,
    /// Full definition, stored for dynamically added ports only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    define: Option<PortDefinition>,
}

#[derive(Serialize, Deserialize, Debug)]
struct SavedConnector {
    uid: Uuid,
    /// Index into `uid_map`.
    start_block: usize,
    start_port: String,
    end_block: usize,
    end_port: String,
}

impl Document {
    pub fn new(name: &str) -> Self {
        Self {
            uid: Uuid::new_v4(),
            name: name.to_string(),
            version: String::new(),
            description: String::new(),
            author: String::new(),
            graphs: Vec::new(),
        }
    }

    /// Adds a graph. A name already in use is refused with a warning.
    pub fn add_graph(&mut self, graph: Graph) -> bool {
        if self.graph_by_name(&graph.name).is_some() {
            warn!("Document '{}': graph '{}' already exists", self.name, graph.name);
            return false;
        }
        self.graphs.push(graph);
        true
    }

    pub fn remove_graph(&mut self, name: &str) -> Option<Graph> {
        let index = self.graphs.iter().position(|g| g.name == name)?;
        Some(self.graphs.remove(index))
    }

    pub fn graph_by_name(&self, name: &str) -> Option<&Graph> {
        self.graphs.iter().find(|g| g.name == name)
    }

    pub fn graph_by_name_mut(&mut self, name: &str) -> Option<&mut Graph> {
        self.graphs.iter_mut().find(|g| g.name == name)
    }

    pub fn is_file_changed(&self) -> bool {
        self.graphs.iter().any(|g| g.file_changed)
    }

    /// `base`, or `base` followed by the first free number.
    pub fn usable_graph_name(&self, base: &str) -> String {
        if self.graph_by_name(base).is_none() {
            return base.to_string();
        }
        (1..)
            .map(|i| format!("{}{}", base, i))
            .find(|name| self.graph_by_name(name).is_none())
            .unwrap_or_else(|| base.to_string())
    }

    pub fn save(&self) -> Result<String, EditorError> {
        let saved = SavedDocument {
            format_version: FORMAT_VERSION,
            uid: self.uid,
            name: self.name.clone(),
            version: self.version.clone(),
            description: self.description.clone(),
            author: self.author.clone(),
            graphs: self.graphs.iter().map(save_graph).collect(),
        };
        Ok(serde_json::to_string_pretty(&saved)?)
    }

    /// Rebuilds a document. Blocks of unknown types, unknown ports and
    /// dangling wires are skipped with a warning; the rest still loads.
    pub fn load(json: &str, registry: &BlockRegistry) -> Result<Document, EditorError> {
        let saved: SavedDocument = serde_json::from_str(json)?;
        if saved.format_version > FORMAT_VERSION {
            return Err(EditorError::Document(format!(
                "format version {} is newer than supported version {}",
                saved.format_version, FORMAT_VERSION
            )));
        }
        let graphs = saved
            .graphs
            .into_iter()
            .map(|g| load_graph(g, registry))
            .collect();
        Ok(Document {
            uid: saved.uid,
            name: saved.name,
            version: saved.version,
            description: saved.description,
            author: saved.author,
            graphs,
        })
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), EditorError> {
        fs::write(path, self.save()?)?;
        info!("Document '{}' saved to {}", self.name, path.display());
        Ok(())
    }

    pub fn load_from_file(path: &Path, registry: &BlockRegistry) -> Result<Document, EditorError> {
        let json = fs::read_to_string(path)?;
        let document = Self::load(&json, registry)?;
        info!("Document '{}' loaded from {}", document.name, path.display());
        Ok(document)
    }
}

fn save_graph(graph: &Graph) -> SavedGraph {
    let uid_map = graph.block_uids();
    let mut guid_map: Vec<String> = Vec::new();
    let mut blocks = Vec::with_capacity(uid_map.len());
    for uid in &uid_map {
        let Some(block) = graph.block(uid) else {
            continue;
        };
        let guid = match guid_map.iter().position(|g| g == block.guid()) {
            Some(index) => index,
            None => {
                guid_map.push(block.guid().to_string());
                guid_map.len() - 1
            }
        };
        blocks.push(SavedBlock {
            guid,
            uid: block.uid,
            position: block.position,
            custom_size: block.custom_size,
            options: block.options.clone(),
            ports: block
                .ports
                .iter()
                .map(|p| SavedPort {
                    guid: p.guid().to_string(),
                    initial_value: p.initial_value.clone(),
                    dynamic_add: p.dynamic_add,
                    define: p.dynamic_add.then(|| p.define.clone()),
                })
                .collect(),
        });
    }

    let connectors = graph
        .connectors()
        .iter()
        .filter_map(|c| {
            Some(SavedConnector {
                uid: c.uid,
                start_block: uid_map.iter().position(|u| u == &c.start.block_id)?,
                start_port: c.start.guid.clone(),
                end_block: uid_map.iter().position(|u| u == &c.end.block_id)?,
                end_port: c.end.guid.clone(),
            })
        })
        .collect();

    SavedGraph {
        uid: graph.uid,
        name: graph.name.clone(),
        kind: graph.kind,
        version: graph.version.clone(),
        description: graph.description.clone(),
        author: graph.author.clone(),
        viewport: graph.viewport,
        guid_map,
        uid_map,
        blocks,
        connectors,
    }
}

fn load_graph(saved: SavedGraph, registry: &BlockRegistry) -> Graph {
    let mut graph = Graph::new(&saved.name).with_kind(saved.kind);
    graph.uid = saved.uid;
    graph.version = saved.version;
    graph.description = saved.description;
    graph.author = saved.author;
    graph.viewport = saved.viewport;

    for data in saved.blocks {
        let Some(guid) = saved.guid_map.get(data.guid) else {
            warn!("Graph '{}': block {} has a bad type index {}", graph.name, data.uid, data.guid);
            continue;
        };
        let Some(define) = registry.get(guid) else {
            warn!("Graph '{}': block type {} is not registered, skipping {}", graph.name, guid, data.uid);
            continue;
        };
        graph.insert_block(load_block(define, data));
    }

    for data in saved.connectors {
        let (Some(start), Some(end)) = (saved.uid_map.get(data.start_block), saved.uid_map.get(data.end_block))
        else {
            warn!("Graph '{}': wire {} has a bad block index", graph.name, data.uid);
            continue;
        };
        let connector = Connector::with_uid(
            data.uid,
            PortId::new(*start, &data.start_port),
            PortId::new(*end, &data.end_port),
        );
        graph.link(connector);
    }
    graph.file_changed = false;
    graph
}

fn load_block(define: Arc<BlockDefinition>, data: SavedBlock) -> Block {
    let mut block = Block::bare(define, data.uid);
    block.position = data.position;
    block.custom_size = data.custom_size;
    block.options = data.options;

    let port_defines = block.define.ports.clone();
    for def in port_defines {
        let initial = data
            .ports
            .iter()
            .find(|p| p.guid == def.guid)
            .and_then(|p| p.initial_value.clone());
        block.add_port(def, false, initial);
    }
    block.notify_created();

    for saved in data.ports {
        if let Some(port) = block.port_mut(&saved.guid) {
            if saved.initial_value.is_some() {
                port.initial_value = saved.initial_value;
            }
            continue;
        }
        match saved.define {
            Some(def) if saved.dynamic_add => {
                block.add_port(def, true, saved.initial_value);
            }
            _ => warn!("{}: saved port {} no longer exists, skipping", block.name(), saved.guid),
        }
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usable_graph_name() {
        let mut doc = Document::new("doc");
        assert_eq!(doc.usable_graph_name("main"), "main");
        doc.add_graph(Graph::new("main"));
        doc.add_graph(Graph::new("main1"));
        assert_eq!(doc.usable_graph_name("main"), "main2");
        assert!(!doc.add_graph(Graph::new("main")));
    }

    #[test]
    fn test_rejects_newer_format() {
        let json = r#"{"format_version": 99, "uid": "00000000-0000-0000-0000-000000000000", "name": "x"}"#;
        let result = Document::load(json, &BlockRegistry::new());
        assert!(matches!(result, Err(EditorError::Document(_))));
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(matches!(
            Document::load("{", &BlockRegistry::new()),
            Err(EditorError::Json(_))
        ));
    }
}
