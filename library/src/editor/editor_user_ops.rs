use log::{info, warn};
use uuid::Uuid;

use super::editor_service::Editor;
use crate::model::math::Vector2;
use crate::model::port::PortId;
use crate::registry::block_registry::BaseBlockRole;

/// Edge or axis to line blocks up on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    Left,
    Top,
    Right,
    Bottom,
    CenterX,
    CenterY,
}

/// Operations triggered directly by the user. Refusals come back as
/// messages for the UI.
impl Editor {
    /// Adds a block of the registered type `guid`.
    ///
    /// Placement: at `position` if given, else at the loose end of a
    /// pending connect-to-new wire (which is then connected), else at the
    /// centre of the view.
    pub fn user_add_block(&mut self, guid: &str, position: Option<Vector2>) -> Result<Uuid, String> {
        let graph = self.graph.as_ref().ok_or("No graph is open")?;
        let define = self
            .blocks
            .get(guid)
            .ok_or_else(|| format!("Block {} is not registered", guid))?;
        if define.one_block_only && graph.blocks_by_guid(guid).next().is_some() {
            return Err(format!("Only one {} block is allowed in a graph", define.name));
        }
        if let Some(hook) = &define.events.on_add_check {
            if let Some(message) = hook(&*define, graph) {
                return Err(message);
            }
        }

        let mut block = self
            .instantiate_block(guid)
            .ok_or_else(|| format!("Block {} is not registered", guid))?;
        let to_new = self.connecting.is_connecting_to_new;
        block.position = match position {
            Some(position) => position,
            None if to_new => self.connecting.end_pos,
            None => self
                .viewport
                .screen_to_viewport(self.view_size * 0.5),
        };
        let uid = self.add_block(block).ok_or("No graph is open")?;
        if to_new {
            self.end_connect_to_new(Some(uid));
        }
        Ok(uid)
    }

    /// Deletes a block unless it is protected or its delete check vetoes.
    pub fn user_delete_block(&mut self, uid: &Uuid) -> Result<(), String> {
        let graph = self.graph.as_ref().ok_or("No graph is open")?;
        let block = graph
            .block(uid)
            .ok_or_else(|| format!("Block {} not found", uid))?;
        if block.define.can_not_delete {
            return Err(format!("{} can not be deleted", block.name()));
        }
        if let Some(hook) = &block.define.events.on_delete_check {
            if let Some(message) = hook(block, graph) {
                return Err(message);
            }
        }
        self.remove_block(uid);
        Ok(())
    }

    /// Deletes the selected blocks, skipping the ones that refuse.
    /// Returns how many were deleted.
    pub fn delete_selected_blocks(&mut self) -> usize {
        let mut deleted = 0;
        for uid in self.selected_blocks.clone() {
            match self.user_delete_block(&uid) {
                Ok(()) => deleted += 1,
                Err(message) => warn!("Skipped deleting block {}: {}", uid, message),
            }
        }
        deleted
    }

    pub fn delete_selected_connectors(&mut self) -> usize {
        let uids = std::mem::take(&mut self.selected_connectors);
        uids.iter().filter(|uid| self.disconnect(uid).is_some()).count()
    }

    /// Removes every wire touching a selected block.
    pub fn unconnect_selected_block_connectors(&mut self) -> usize {
        self.selected_blocks
            .clone()
            .iter()
            .map(|uid| self.disconnect_block(uid))
            .sum()
    }

    /// Lines the selected blocks up on an edge or centre line of `base`.
    pub fn align_selected_blocks(&mut self, base: &Uuid, align: Align) {
        let Some(base_rect) = self.block_rect(base) else {
            warn!("align_selected_blocks: block {} not found", base);
            return;
        };
        for uid in self.selected_blocks.clone() {
            if &uid == base {
                continue;
            }
            let Some(rect) = self.block_rect(&uid) else {
                continue;
            };
            let mut position = rect.pos();
            match align {
                Align::Left => position.x = base_rect.left(),
                Align::Right => position.x = base_rect.right() - rect.width(),
                Align::Top => position.y = base_rect.top(),
                Align::Bottom => position.y = base_rect.bottom() - rect.height(),
                Align::CenterX => position.x = base_rect.center().x - rect.width() / 2.0,
                Align::CenterY => position.y = base_rect.center().y - rect.height() / 2.0,
            }
            self.move_block(&uid, position);
        }
        self.mark_graph_changed();
    }

    /// Moves the block at the other end of `connector` so the wire runs
    /// horizontally from `ref_port`.
    pub fn straighten_connector(&mut self, ref_port: &PortId, connector: &Uuid) -> bool {
        let Some(c) = self.graph.as_ref().and_then(|g| g.connector(connector)) else {
            return false;
        };
        let other = if &c.start == ref_port {
            c.end.clone()
        } else if &c.end == ref_port {
            c.start.clone()
        } else {
            warn!("straighten_connector: wire {} does not touch {:?}", connector, ref_port);
            return false;
        };
        let (Some(anchor), Some(other_anchor)) = (self.port_position(ref_port), self.port_position(&other))
        else {
            return false;
        };
        let Some(block) = self.graph.as_ref().and_then(|g| g.block(&other.block_id)) else {
            return false;
        };
        let mut position = block.position;
        position.y += anchor.y - other_anchor.y;
        self.move_block(&other.block_id, position);
        self.mark_graph_changed();
        true
    }

    /// Wraps the selected blocks in a comment block.
    pub fn gen_comment_for_selected_blocks(&mut self) -> Option<Uuid> {
        let region = self.blocks_region(&self.selected_blocks)?;
        let define = self.blocks.base_block(BaseBlockRole::Comment)?;
        let mut block = self.instantiate_block(&define.guid)?;
        block.position = Vector2::new(region.left() - 15.0, region.top() - 65.0);
        block.custom_size = Vector2::new(region.width() + 30.0, region.height() + 80.0);
        self.add_block(block)
    }

    /// Centres the view on a block.
    pub fn move_viewport_to_block(&mut self, uid: &Uuid) -> bool {
        let Some(rect) = self.block_rect(uid) else {
            return false;
        };
        let scale = self.view_scale();
        self.viewport.position = rect.center() - self.view_size * (0.5 / scale);
        true
    }

    /// Deletes a dynamically added port, disconnecting it first.
    pub fn delete_block_port(&mut self, id: &PortId) -> Result<(), String> {
        let port = self
            .graph
            .as_ref()
            .and_then(|g| g.port(id))
            .ok_or_else(|| format!("Port {} not found", id.guid))?;
        if !port.dynamic_add {
            return Err(format!("Port {} is not a dynamic port", id.guid));
        }
        self.disconnect_port(id);
        if let Some(block) = self.graph.as_mut().and_then(|g| g.block_mut(&id.block_id)) {
            block.remove_port(&id.guid);
            info!("Deleted port {} from block {}", id.guid, id.block_id);
        }
        self.update_block_region(&id.block_id);
        self.mark_graph_changed();
        Ok(())
    }
}
