//! Graph container: blocks keyed by uid plus the wire list.
//!
//! Wires keep their insertion order and are indexed by uid. Ports and
//! blocks refer to wires by uid only. `link`/`unlink` are the only
//! places that touch those back-reference lists, so the graph stays
//! consistent as long as callers go through them.

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::model::block::Block;
use crate::model::connector::Connector;
use crate::model::math::Viewport;
use crate::model::port::{Port, PortDirection, PortId};
use crate::util::VecSetExt;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GraphKind {
    #[default]
    None,
    Static,
    Constructor,
    Function,
    Macro,
}

#[derive(Clone, Debug)]
pub struct Graph {
    pub uid: Uuid,
    pub name: String,
    pub kind: GraphKind,
    pub version: String,
    pub description: String,
    pub author: String,
    /// Canvas pan/zoom saved with the graph.
    pub viewport: Viewport,
    pub file_changed: bool,
    blocks: HashMap<Uuid, Block>,
    connectors: Vec<Connector>,
    /// Position of each wire in `connectors`.
    connector_index: HashMap<Uuid, usize>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("")
    }
}

impl Graph {
    pub fn new(name: &str) -> Self {
        Self {
            uid: Uuid::new_v4(),
            name: name.to_string(),
            kind: GraphKind::None,
            version: String::new(),
            description: String::new(),
            author: String::new(),
            viewport: Viewport::default(),
            file_changed: false,
            blocks: HashMap::new(),
            connectors: Vec::new(),
            connector_index: HashMap::new(),
        }
    }

    pub fn with_kind(mut self, kind: GraphKind) -> Self {
        self.kind = kind;
        self
    }

    // --- blocks ---

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    pub fn blocks_mut(&mut self) -> impl Iterator<Item = &mut Block> {
        self.blocks.values_mut()
    }

    /// Block uids in a stable order.
    pub fn block_uids(&self) -> Vec<Uuid> {
        let mut uids: Vec<Uuid> = self.blocks.keys().copied().collect();
        uids.sort();
        uids
    }

    pub fn block(&self, uid: &Uuid) -> Option<&Block> {
        self.blocks.get(uid)
    }

    pub fn block_mut(&mut self, uid: &Uuid) -> Option<&mut Block> {
        self.blocks.get_mut(uid)
    }

    pub fn contains_block(&self, uid: &Uuid) -> bool {
        self.blocks.contains_key(uid)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn blocks_by_guid<'a>(&'a self, guid: &'a str) -> impl Iterator<Item = &'a Block> + 'a {
        self.blocks.values().filter(move |b| b.guid() == guid)
    }

    /// Inserts a block. A uid already present keeps the existing block.
    pub fn insert_block(&mut self, block: Block) -> Uuid {
        let uid = block.uid;
        if self.blocks.contains_key(&uid) {
            warn!("Graph '{}': block {} is already present", self.name, uid);
            return uid;
        }
        self.blocks.insert(uid, block);
        self.file_changed = true;
        uid
    }

    /// Removes a block without touching wires. Callers detach the block's
    /// wires first.
    pub(crate) fn take_block(&mut self, uid: &Uuid) -> Option<Block> {
        let block = self.blocks.remove(uid);
        if block.is_some() {
            self.file_changed = true;
        }
        block
    }

    // --- ports ---

    pub fn port(&self, id: &PortId) -> Option<&Port> {
        self.blocks.get(&id.block_id)?.port(&id.guid)
    }

    pub fn port_mut(&mut self, id: &PortId) -> Option<&mut Port> {
        self.blocks.get_mut(&id.block_id)?.port_mut(&id.guid)
    }

    // --- connectors ---

    pub fn connectors(&self) -> &[Connector] {
        &self.connectors
    }

    pub fn connectors_mut(&mut self) -> impl Iterator<Item = &mut Connector> {
        self.connectors.iter_mut()
    }

    pub fn connector(&self, uid: &Uuid) -> Option<&Connector> {
        let index = *self.connector_index.get(uid)?;
        self.connectors.get(index)
    }

    pub fn connector_mut(&mut self, uid: &Uuid) -> Option<&mut Connector> {
        let index = *self.connector_index.get(uid)?;
        self.connectors.get_mut(index)
    }

    /// The wire from `start` to `end`, if there is one.
    pub fn find_connector(&self, start: &PortId, end: &PortId) -> Option<Uuid> {
        self.port(start)?
            .connected_to
            .iter()
            .filter_map(|uid| self.connector(uid))
            .find(|c| c.is_between(start, end))
            .map(|c| c.uid)
    }

    /// Adds a wire and registers it on both ports and both blocks.
    ///
    /// Returns `None`, with a warning, when an endpoint is missing, the
    /// directions are wrong, both ends sit on the same block or the uid is
    /// taken.
    pub fn link(&mut self, connector: Connector) -> Option<Uuid> {
        if let Err(e) = self.validate_link(&connector) {
            warn!("Graph '{}': cannot link {}: {}", self.name, connector.uid, e);
            return None;
        }
        let uid = connector.uid;
        for id in [&connector.start, &connector.end] {
            if let Some(block) = self.blocks.get_mut(&id.block_id) {
                block.connectors.add_unique(uid);
                if let Some(port) = block.port_mut(&id.guid) {
                    port.attach(uid);
                    port.refresh_state();
                }
            }
        }
        self.connector_index.insert(uid, self.connectors.len());
        self.connectors.push(connector);
        self.file_changed = true;
        Some(uid)
    }

    fn validate_link(&self, connector: &Connector) -> Result<(), String> {
        if self.connector(&connector.uid).is_some() {
            return Err("uid already in use".to_string());
        }
        if connector.start.block_id == connector.end.block_id {
            return Err("both ends are on the same block".to_string());
        }
        let start = self
            .port(&connector.start)
            .ok_or_else(|| format!("start port {} not found", connector.start.guid))?;
        let end = self
            .port(&connector.end)
            .ok_or_else(|| format!("end port {} not found", connector.end.guid))?;
        if start.direction != PortDirection::Output || end.direction != PortDirection::Input {
            return Err("wires run from an output port to an input port".to_string());
        }
        Ok(())
    }

    /// Removes a wire and every back-reference to it, then refreshes the
    /// state of both ports.
    pub fn unlink(&mut self, uid: &Uuid) -> Option<Connector> {
        let index = self.connector_index.remove(uid)?;
        let connector = self.connectors.remove(index);
        for c in &self.connectors[index..] {
            if let Some(i) = self.connector_index.get_mut(&c.uid) {
                *i -= 1;
            }
        }
        for id in [&connector.start, &connector.end] {
            if let Some(block) = self.blocks.get_mut(&id.block_id) {
                block.connectors.remove_value(uid);
                if let Some(port) = block.port_mut(&id.guid) {
                    port.detach(uid);
                    port.refresh_state();
                }
            }
        }
        self.file_changed = true;
        Some(connector)
    }

    /// Uids of every wire touching `block`.
    pub fn block_connectors(&self, block: &Uuid) -> Vec<Uuid> {
        self.blocks
            .get(block)
            .map(|b| b.connectors.clone())
            .unwrap_or_default()
    }

    /// Uids of every wire touching `port`.
    pub fn port_connectors(&self, port: &PortId) -> Vec<Uuid> {
        self.port(port)
            .map(|p| p.connected_from.iter().chain(&p.connected_to).copied().collect())
            .unwrap_or_default()
    }

    /// Checks that every wire's endpoints exist and that the port and block
    /// back-reference lists match the wire list exactly.
    pub fn check_consistency(&self) -> Result<(), String> {
        if self.connector_index.len() != self.connectors.len() {
            return Err("wire index is out of step with the wire list".to_string());
        }
        for (i, c) in self.connectors.iter().enumerate() {
            if self.connector_index.get(&c.uid) != Some(&i) {
                return Err(format!("wire {} is not indexed", c.uid));
            }
            self.validate_endpoints(c)?;
            for id in [&c.start, &c.end] {
                let block = self.blocks.get(&id.block_id).ok_or("missing block")?;
                if !block.connectors.contains(&c.uid) {
                    return Err(format!("block {} does not list wire {}", block.uid, c.uid));
                }
            }
        }
        for block in self.blocks.values() {
            for uid in &block.connectors {
                match self.connector(uid) {
                    Some(c) if c.touches_block(&block.uid) => {}
                    _ => return Err(format!("block {} lists stale wire {}", block.uid, uid)),
                }
            }
            for port in &block.ports {
                let id = block.port_id(port.guid());
                for uid in &port.connected_from {
                    match self.connector(uid) {
                        Some(c) if c.end == id => {}
                        _ => return Err(format!("port {} lists stale incoming wire {}", id.guid, uid)),
                    }
                }
                for uid in &port.connected_to {
                    match self.connector(uid) {
                        Some(c) if c.start == id => {}
                        _ => return Err(format!("port {} lists stale outgoing wire {}", id.guid, uid)),
                    }
                }
            }
        }
        Ok(())
    }

    fn validate_endpoints(&self, c: &Connector) -> Result<(), String> {
        let start = self
            .port(&c.start)
            .ok_or_else(|| format!("wire {} has no start port", c.uid))?;
        let end = self
            .port(&c.end)
            .ok_or_else(|| format!("wire {} has no end port", c.uid))?;
        if !start.connected_to.contains(&c.uid) || !end.connected_from.contains(&c.uid) {
            return Err(format!("wire {} is not registered on its ports", c.uid));
        }
        Ok(())
    }
}
