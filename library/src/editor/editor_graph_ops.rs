use log::{debug, warn};
use uuid::Uuid;

use super::editor_service::Editor;
use crate::model::block::Block;
use crate::model::connector::ConnectorCurve;
use crate::model::graph::Graph;
use crate::model::math::{Rect, Vector2};
use crate::model::port::PortId;
use crate::spatial::chunked_panel::ChunkTag;

/// Graph controller: opening graphs, adding and removing blocks, and
/// keeping the spatial index in step with block and wire geometry.
impl Editor {
    /// Opens `graph` in the editor and indexes all of its blocks and wires.
    /// Returns the previously open graph, if any.
    pub fn open_graph(&mut self, graph: Graph) -> Option<Graph> {
        let previous = self.close_graph();
        self.viewport = graph.viewport;
        let block_ids = graph.block_uids();
        let connector_ids: Vec<Uuid> = graph.connectors().iter().map(|c| c.uid).collect();
        debug!(
            "Opening graph '{}' ({} blocks, {} wires)",
            graph.name,
            block_ids.len(),
            connector_ids.len()
        );
        self.graph = Some(graph);

        for uid in &block_ids {
            if let Some(rect) = self.block_rect(uid) {
                self.panel.add_instance(*uid, rect, ChunkTag::Block);
            }
            self.notify_add_to_editor(uid);
        }
        for uid in &connector_ids {
            self.index_connector(uid);
        }
        previous
    }

    /// Closes the open graph, storing the current viewport on it, and
    /// clears the index, the selection and any gesture in progress.
    pub fn close_graph(&mut self) -> Option<Graph> {
        self.cancel_connect();
        let mut graph = self.graph.take()?;
        graph.viewport = self.viewport;
        self.panel.clear();
        self.selected_blocks.clear();
        self.selected_connectors.clear();
        self.hovered_connectors.clear();
        self.pending_regions.clear();
        self.marquee = None;
        Some(graph)
    }

    /// Creates a block from a registered definition, seeding every port
    /// without an initial value with its type's default.
    pub fn instantiate_block(&self, guid: &str) -> Option<Block> {
        let Some(define) = self.blocks.get(guid) else {
            warn!("instantiate_block: block {} is not registered", guid);
            return None;
        };
        let mut block = Block::new(define);
        for port in block.ports.iter_mut() {
            if port.initial_value.is_none() && !port.is_execute() {
                port.initial_value = self.types.default_value(port.param_type());
            }
        }
        Some(block)
    }

    /// Adds a block to the open graph and indexes it.
    ///
    /// The block is indexed with its current rect right away; the rect is
    /// computed again on the next [`Editor::tick`], once the host has had a
    /// chance to lay the block out.
    pub fn add_block(&mut self, block: Block) -> Option<Uuid> {
        let Some(graph) = self.graph.as_mut() else {
            warn!("add_block: no graph is open");
            return None;
        };
        let uid = block.uid;
        if graph.contains_block(&uid) {
            warn!("add_block: block {} is already in the graph", uid);
            return Some(uid);
        }
        graph.insert_block(block);
        if let Some(rect) = self.block_rect(&uid) {
            self.panel.add_instance(uid, rect, ChunkTag::Block);
        }
        self.pending_regions.push(uid);
        self.notify_add_to_editor(&uid);
        self.mark_graph_changed();
        Some(uid)
    }

    /// Removes a block, disconnecting every wire touching it first.
    pub fn remove_block(&mut self, uid: &Uuid) -> Option<Block> {
        if !self.graph.as_ref()?.contains_block(uid) {
            warn!("remove_block: block {} is not in the graph", uid);
            return None;
        }
        self.disconnect_block(uid);
        self.panel.remove_instance(uid);
        self.pending_regions.retain(|u| u != uid);
        self.unselect_block(uid);

        let block = self.graph.as_mut()?.take_block(uid)?;
        if let Some(hook) = &block.define.events.on_remove_from_editor {
            hook(&block);
        }
        self.mark_graph_changed();
        Some(block)
    }

    /// Runs the deferred region computation for recently added blocks.
    pub fn tick(&mut self) {
        for uid in std::mem::take(&mut self.pending_regions) {
            self.update_block_region(&uid);
        }
    }

    fn notify_add_to_editor(&self, uid: &Uuid) {
        let Some(block) = self.graph.as_ref().and_then(|g| g.block(uid)) else {
            return;
        };
        if let Some(hook) = &block.define.events.on_add_to_editor {
            hook(block);
        }
    }

    // --- geometry ---

    /// Rect of a block in viewport coordinates.
    pub fn block_rect(&self, uid: &Uuid) -> Option<Rect> {
        let block = self.graph.as_ref()?.block(uid)?;
        Some(Rect::from_pos_size(block.position, self.layout.block_size(block)))
    }

    /// Anchor of a port in viewport coordinates.
    pub fn port_position(&self, id: &PortId) -> Option<Vector2> {
        let block = self.graph.as_ref()?.block(&id.block_id)?;
        let offset = self.layout.port_offset(block, &id.guid)?;
        Some(block.position + offset)
    }

    pub fn connector_curve(&self, uid: &Uuid) -> Option<ConnectorCurve> {
        let connector = self.graph.as_ref()?.connector(uid)?;
        Some(ConnectorCurve::new(
            self.port_position(&connector.start)?,
            self.port_position(&connector.end)?,
        ))
    }

    /// Padding around wire bounds, in viewport units.
    fn connector_padding(&self) -> f32 {
        let scale = self.view_scale();
        self.config.connector_hit_tolerance / scale
    }

    pub(super) fn index_connector(&mut self, uid: &Uuid) {
        let Some(curve) = self.connector_curve(uid) else {
            warn!("index_connector: wire {} has no geometry", uid);
            return;
        };
        let rect = curve.bounds(self.connector_padding());
        self.panel.add_instance(*uid, rect, ChunkTag::Connector);
    }

    /// Re-indexes a block and every wire touching it.
    pub fn update_block_region(&mut self, uid: &Uuid) {
        let Some(rect) = self.block_rect(uid) else {
            return;
        };
        self.panel.update_instance(uid, rect);
        let connectors = self
            .graph
            .as_ref()
            .and_then(|g| g.block(uid))
            .map(|b| b.connectors.clone())
            .unwrap_or_default();
        for connector in &connectors {
            self.update_connector_region(connector);
        }
    }

    pub(super) fn refresh_connector_regions(&mut self) {
        let uids: Vec<Uuid> = self
            .graph
            .as_ref()
            .map(|g| g.connectors().iter().map(|c| c.uid).collect())
            .unwrap_or_default();
        for uid in &uids {
            self.update_connector_region(uid);
        }
    }

    pub fn update_connector_region(&mut self, uid: &Uuid) {
        if let Some(curve) = self.connector_curve(uid) {
            let rect = curve.bounds(self.connector_padding());
            self.panel.update_instance(uid, rect);
        }
    }

    /// Moves a block to `position` and refreshes its region.
    pub fn move_block(&mut self, uid: &Uuid, position: Vector2) -> bool {
        let Some(block) = self.graph.as_mut().and_then(|g| g.block_mut(uid)) else {
            return false;
        };
        block.position = position;
        self.update_block_region(uid);
        true
    }

    /// Moves every selected block by `delta`.
    pub fn move_selected_blocks(&mut self, delta: Vector2) {
        for uid in self.selected_blocks.clone() {
            if let Some(block) = self.graph.as_mut().and_then(|g| g.block_mut(&uid)) {
                block.position += delta;
                self.update_block_region(&uid);
            }
        }
    }

    /// Union of the rects of `uids`; `None` when none of them exist.
    pub fn blocks_region(&self, uids: &[Uuid]) -> Option<Rect> {
        uids.iter()
            .filter_map(|uid| self.block_rect(uid))
            .reduce(|acc, rect| acc.union(&rect))
    }
}
