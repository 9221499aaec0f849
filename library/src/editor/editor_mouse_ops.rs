use uuid::Uuid;

use super::editor_service::{Editor, EditorRequest};
use crate::model::math::{Rect, Vector2};
use crate::model::port::PortId;
use crate::spatial::chunked_panel::ChunkTag;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MouseButton {
    #[default]
    Left,
    Middle,
    Right,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    /// Modifiers that add to the selection instead of replacing it.
    pub fn append(&self) -> bool {
        self.shift || self.ctrl
    }
}

/// What the current press-and-drag is doing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DragMode {
    #[default]
    None,
    /// Panning the canvas.
    View,
    Marquee,
    /// Moving the selected blocks.
    Blocks,
    /// Dragging a wire from a port.
    Connect,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MouseInfo {
    pub down: bool,
    pub button: MouseButton,
    pub modifiers: Modifiers,
    pub down_screen: Vector2,
    pub down_viewport: Vector2,
    pub current_screen: Vector2,
    pub current_viewport: Vector2,
    /// Travelled further than the click threshold since the press.
    pub moved: bool,
    pub drag: DragMode,
    /// Block under the pointer at press time.
    pub pressed_block: Option<Uuid>,
    /// Viewport offset at press time, for panning.
    view_start: Vector2,
    last_viewport: Vector2,
}

/// Pointer handling. Positions are screen coordinates.
impl Editor {
    /// Nearest port anchor within `port_hit_radius` of `point` (viewport
    /// coordinates).
    pub fn find_port_at(&self, point: Vector2) -> Option<PortId> {
        let graph = self.graph.as_ref()?;
        let radius = self.config.port_hit_radius;
        let area = Rect::new(point.x - radius, point.y - radius, radius * 2.0, radius * 2.0);
        let mut best: Option<(PortId, f32)> = None;
        for uid in self.panel.test_rect_cast_tag(&area, Some(ChunkTag::Block)) {
            let Some(block) = graph.block(&uid) else {
                continue;
            };
            for port in &block.ports {
                let Some(offset) = self.layout.port_offset(block, port.guid()) else {
                    continue;
                };
                let distance = (block.position + offset).distance(point);
                if distance <= radius && best.as_ref().is_none_or(|(_, d)| distance < *d) {
                    best = Some((block.port_id(port.guid()), distance));
                }
            }
        }
        best.map(|(id, _)| id)
    }

    /// Topmost block containing `point` (viewport coordinates).
    pub fn find_block_at(&self, point: Vector2) -> Option<Uuid> {
        let graph = self.graph.as_ref()?;
        let mut hits = self.panel.test_point_cast_tag(point, Some(ChunkTag::Block));
        hits.retain(|uid| graph.contains_block(uid));
        // selected blocks are drawn on top
        hits.sort_by_key(|uid| (self.selected_blocks.contains(uid), *uid));
        hits.last().copied()
    }

    /// Wire whose curve passes closest to `point`, within the hit tolerance.
    pub fn find_connector_at(&self, point: Vector2) -> Option<Uuid> {
        let scale = self.view_scale();
        let tolerance = self.config.connector_hit_tolerance / scale;
        let samples = self.config.connector_curve_samples;
        self.panel
            .test_point_cast_tag(point, Some(ChunkTag::Connector))
            .into_iter()
            .filter_map(|uid| {
                let curve = self.connector_curve(&uid)?;
                curve
                    .hit_test(point, tolerance, samples)
                    .then(|| (uid, curve.distance_to(point, samples)))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(uid, _)| uid)
    }

    pub fn mouse_down(&mut self, screen: Vector2, button: MouseButton, modifiers: Modifiers) {
        if self.connecting.is_connecting_to_new {
            self.end_connect_to_new(None);
            self.push_request(EditorRequest::CloseAddBlockPanel);
        }
        let point = self.viewport.screen_to_viewport(screen);
        self.mouse = MouseInfo {
            down: true,
            button,
            modifiers,
            down_screen: screen,
            down_viewport: point,
            current_screen: screen,
            current_viewport: point,
            view_start: self.viewport.position,
            last_viewport: point,
            ..Default::default()
        };

        if button != MouseButton::Left {
            self.mouse.drag = DragMode::View;
            return;
        }
        if let Some(port) = self.find_port_at(point) {
            if self.start_connect(&port) {
                self.mouse.drag = DragMode::Connect;
                return;
            }
        }
        if let Some(uid) = self.find_block_at(point) {
            let selected = self.selected_blocks.contains(&uid);
            if !selected {
                self.select_block(&uid, modifiers.append());
            }
            self.mouse.pressed_block = Some(uid);
            self.mouse.drag = DragMode::Blocks;
            return;
        }
        self.mouse.drag = DragMode::Marquee;
    }

    pub fn mouse_move(&mut self, screen: Vector2) {
        let point = self.viewport.screen_to_viewport(screen);
        self.mouse.current_screen = screen;
        self.mouse.current_viewport = point;

        if !self.mouse.down {
            self.update_connector_hover(point);
            return;
        }
        if !self.mouse.moved && screen.distance(self.mouse.down_screen) > self.config.click_threshold {
            self.mouse.moved = true;
        }

        match self.mouse.drag {
            DragMode::Connect => {
                self.update_connect_end(screen);
                let hover = self.find_port_at(point);
                self.update_hover_port(hover);
            }
            DragMode::View if self.mouse.moved => {
                let scale = self.view_scale();
                let travel = (screen - self.mouse.down_screen) * (1.0 / scale);
                self.viewport.position = self.mouse.view_start - travel;
            }
            DragMode::Blocks if self.mouse.moved => {
                let delta = point - self.mouse.last_viewport;
                self.move_selected_blocks(delta);
                self.mouse.last_viewport = point;
            }
            DragMode::Marquee if self.mouse.moved => {
                self.do_marquee_select(self.mouse.down_viewport, point);
            }
            _ => {}
        }
    }

    pub fn mouse_up(&mut self, screen: Vector2) {
        if !self.mouse.down {
            return;
        }
        let point = self.viewport.screen_to_viewport(screen);
        let info = std::mem::take(&mut self.mouse);
        self.mouse.current_screen = screen;
        self.mouse.current_viewport = point;

        match info.drag {
            DragMode::Connect => {
                self.update_connect_end(screen);
                let hover = self.find_port_at(point);
                self.update_hover_port(hover);
                self.end_connect();
            }
            DragMode::Blocks => {
                if info.moved {
                    self.mark_graph_changed();
                } else if let Some(uid) = info.pressed_block {
                    if !info.modifiers.append() {
                        self.select_block(&uid, false);
                    }
                }
            }
            DragMode::Marquee | DragMode::View if !info.moved => {
                self.click_canvas(point, info.button, info.modifiers);
            }
            DragMode::Marquee => self.end_marquee(),
            _ => {}
        }
    }

    /// A click that hit no port or block. Shift or Ctrl keeps the current
    /// selection and adds a clicked wire to it.
    fn click_canvas(&mut self, point: Vector2, button: MouseButton, modifiers: Modifiers) {
        let append = modifiers.append();
        if !append {
            self.unselect_all();
        }
        if let Some(uid) = self.find_connector_at(point) {
            if modifiers.alt {
                self.disconnect(&uid);
            } else {
                self.select_connector(&uid, append);
            }
            return;
        }
        if button == MouseButton::Right {
            self.push_request(EditorRequest::ShowAddBlockPanel {
                position: point,
                filter: None,
            });
        }
    }

    fn update_connector_hover(&mut self, point: Vector2) {
        let hovered: Vec<Uuid> = self.find_connector_at(point).into_iter().collect();
        if hovered == self.hovered_connectors {
            return;
        }
        let previous = std::mem::replace(&mut self.hovered_connectors, hovered.clone());
        let Some(graph) = self.graph.as_mut() else {
            return;
        };
        for uid in previous {
            if let Some(c) = graph.connector_mut(&uid) {
                c.hover = false;
            }
        }
        for uid in hovered {
            if let Some(c) = graph.connector_mut(&uid) {
                c.hover = true;
            }
        }
    }

    pub fn hovered_connectors(&self) -> &[Uuid] {
        &self.hovered_connectors
    }
}
