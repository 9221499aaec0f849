use uuid::Uuid;

use super::editor_service::Editor;
use crate::model::math::{Rect, Vector2};
use crate::spatial::chunked_panel::ChunkTag;
use crate::util::VecSetExt;

/// Block and wire selection.
impl Editor {
    pub fn selected_blocks(&self) -> &[Uuid] {
        &self.selected_blocks
    }

    pub fn selected_connectors(&self) -> &[Uuid] {
        &self.selected_connectors
    }

    /// Current marquee rect in viewport coordinates, while one is dragged.
    pub fn marquee(&self) -> Option<Rect> {
        self.marquee
    }

    fn set_block_selected(&mut self, uid: &Uuid, selected: bool) -> bool {
        let Some(block) = self.graph.as_mut().and_then(|g| g.block_mut(uid)) else {
            return false;
        };
        block.selected = selected;
        if selected {
            self.selected_blocks.add_unique(*uid)
        } else {
            self.selected_blocks.remove_value(uid)
        }
    }

    fn set_connector_selected(&mut self, uid: &Uuid, selected: bool) -> bool {
        let Some(connector) = self.graph.as_mut().and_then(|g| g.connector_mut(uid)) else {
            return false;
        };
        connector.selected = selected;
        if selected {
            self.selected_connectors.add_unique(*uid)
        } else {
            self.selected_connectors.remove_value(uid)
        }
    }

    fn notify_block_selection(&self) {
        if let Some(hook) = &self.events.on_select_block_changed {
            hook(&self.selected_blocks);
        }
    }

    fn notify_connector_selection(&self) {
        if let Some(hook) = &self.events.on_select_connector_changed {
            hook(&self.selected_connectors);
        }
    }

    /// Selects a block. Without `append` everything else is unselected.
    pub fn select_block(&mut self, uid: &Uuid, append: bool) {
        if !append {
            self.clear_selection();
        }
        self.set_block_selected(uid, true);
        self.notify_block_selection();
    }

    pub fn unselect_block(&mut self, uid: &Uuid) {
        if self.set_block_selected(uid, false) {
            self.notify_block_selection();
        }
    }

    pub fn unselect_all_blocks(&mut self) {
        if self.selected_blocks.is_empty() {
            return;
        }
        for uid in std::mem::take(&mut self.selected_blocks) {
            self.set_block_selected(&uid, false);
        }
        self.notify_block_selection();
    }

    pub fn select_blocks(&mut self, uids: &[Uuid], append: bool) {
        if !append {
            self.clear_selection();
        }
        for uid in uids {
            self.set_block_selected(uid, true);
        }
        self.notify_block_selection();
    }

    pub fn select_all_blocks(&mut self) {
        let uids = self.graph.as_ref().map(|g| g.block_uids()).unwrap_or_default();
        self.select_blocks(&uids, false);
    }

    /// Selects a wire. Without `append` everything else is unselected.
    pub fn select_connector(&mut self, uid: &Uuid, append: bool) {
        if !append {
            self.clear_selection();
        }
        self.set_connector_selected(uid, true);
        self.notify_connector_selection();
    }

    pub fn unselect_connector(&mut self, uid: &Uuid) {
        if self.set_connector_selected(uid, false) {
            self.notify_connector_selection();
        }
    }

    pub fn unselect_all_connectors(&mut self) {
        if self.selected_connectors.is_empty() {
            return;
        }
        for uid in std::mem::take(&mut self.selected_connectors) {
            self.set_connector_selected(&uid, false);
        }
        self.notify_connector_selection();
    }

    pub fn unselect_all(&mut self) {
        self.unselect_all_blocks();
        self.unselect_all_connectors();
    }

    fn clear_selection(&mut self) {
        for uid in std::mem::take(&mut self.selected_blocks) {
            self.set_block_selected(&uid, false);
        }
        for uid in std::mem::take(&mut self.selected_connectors) {
            self.set_connector_selected(&uid, false);
        }
    }

    /// Applies a marquee spanning `from`..`to` (viewport coordinates, any
    /// drag direction).
    ///
    /// Blocks are diffed against the current selection. Wires are replaced
    /// wholesale. A zero-area marquee clears the selection.
    pub fn do_marquee_select(&mut self, from: Vector2, to: Vector2) {
        let rect = Rect::from_two_points(from, to).normalized();
        self.marquee = Some(rect);
        if rect.width() == 0.0 || rect.height() == 0.0 {
            self.unselect_all();
            return;
        }

        let blocks = self.panel.test_rect_cast_tag(&rect, Some(ChunkTag::Block));
        let stale: Vec<Uuid> = self
            .selected_blocks
            .iter()
            .filter(|uid| !blocks.contains(uid))
            .copied()
            .collect();
        let mut changed = !stale.is_empty();
        for uid in &stale {
            self.set_block_selected(uid, false);
        }
        for uid in &blocks {
            changed |= self.set_block_selected(uid, true);
        }
        if changed {
            self.notify_block_selection();
        }

        let connectors = self.panel.test_rect_cast_tag(&rect, Some(ChunkTag::Connector));
        for uid in std::mem::take(&mut self.selected_connectors) {
            self.set_connector_selected(&uid, false);
        }
        for uid in &connectors {
            self.set_connector_selected(uid, true);
        }
        self.notify_connector_selection();
    }

    /// Ends the marquee gesture, keeping the selection it produced.
    pub fn end_marquee(&mut self) {
        self.marquee = None;
    }
}
