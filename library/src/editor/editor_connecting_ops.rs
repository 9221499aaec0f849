use log::{debug, warn};
use uuid::Uuid;

use super::editor_connection_ops::{ConnectCheck, ConnectOutcome};
use super::editor_service::{Editor, EditorRequest};
use crate::model::math::Vector2;
use crate::model::param_type::ParamType;
use crate::model::port::{PortDirection, PortId, PortState};

/// State of the wire-dragging gesture.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConnectingInfo {
    pub is_connecting: bool,
    /// Released over empty canvas; waiting for the user to pick a block.
    pub is_connecting_to_new: bool,
    pub start_port: Option<PortId>,
    pub hover_port: Option<PortId>,
    /// Loose end of the wire, in viewport coordinates.
    pub end_pos: Vector2,
    /// Evaluation of `start_port` against `hover_port`.
    pub check: Option<ConnectCheck>,
    pub required_type: Option<ParamType>,
    pub required_direction: Option<PortDirection>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectState {
    Idle,
    Dragging,
    Hovering,
    ConnectingToNew,
}

impl ConnectingInfo {
    pub fn state(&self) -> ConnectState {
        if self.is_connecting_to_new {
            ConnectState::ConnectingToNew
        } else if !self.is_connecting {
            ConnectState::Idle
        } else if self.hover_port.is_some() {
            ConnectState::Hovering
        } else {
            ConnectState::Dragging
        }
    }
}

/// Connecting gesture: drag from a port, hover candidates, release.
impl Editor {
    /// Starts dragging a wire from `port`. Any gesture in progress is
    /// cancelled first.
    pub fn start_connect(&mut self, port: &PortId) -> bool {
        if self.connecting.is_connecting || self.connecting.is_connecting_to_new {
            self.cancel_connect();
        }
        let Some(anchor) = self.port_position(port) else {
            warn!("start_connect: port {:?} not found", port);
            return false;
        };
        if let Some(p) = self.graph.as_mut().and_then(|g| g.port_mut(port)) {
            p.state = PortState::Active;
        }
        self.connecting = ConnectingInfo {
            is_connecting: true,
            start_port: Some(port.clone()),
            end_pos: anchor,
            ..Default::default()
        };
        true
    }

    /// Sets the port under the pointer, or clears it. The candidate is
    /// evaluated against the start port and marked success or error.
    ///
    /// Hovering the start port itself is tracked without a check, so a
    /// release there cancels instead of prompting for a new block.
    pub fn update_hover_port(&mut self, port: Option<PortId>) {
        if !self.connecting.is_connecting || self.connecting.hover_port == port {
            return;
        }
        let Some(start) = self.connecting.start_port.clone() else {
            return;
        };
        if let Some(previous) = self.connecting.hover_port.take() {
            if previous != start {
                self.refresh_port_state(&previous);
            }
        }
        self.connecting.check = None;

        let Some(port) = port else {
            return;
        };
        if port == start {
            self.connecting.hover_port = Some(port);
            return;
        }
        let check = self.check_compatibility(&start, &port);
        let state = if check.allowed {
            PortState::Success
        } else {
            PortState::Error
        };
        if let Some(p) = self.graph.as_mut().and_then(|g| g.port_mut(&port)) {
            p.state = state;
        }
        self.connecting.hover_port = Some(port);
        self.connecting.check = Some(check);
    }

    /// Moves the loose end of the wire to a screen position.
    pub fn update_connect_end(&mut self, screen: Vector2) {
        if self.connecting.is_connecting {
            self.connecting.end_pos = self.viewport.screen_to_viewport(screen);
        }
    }

    /// Releases the wire.
    ///
    /// Over an accepted port the wire is committed. Over a rejected port,
    /// or back over the start port, the gesture is cancelled. Over empty canvas the editor asks for the
    /// add-block prompt, filtered to blocks that can take the other end,
    /// and waits for [`Editor::end_connect_to_new`].
    pub fn end_connect(&mut self) -> Option<ConnectOutcome> {
        if !self.connecting.is_connecting {
            return None;
        }
        let start = self.connecting.start_port.clone()?;

        if let Some(hover) = self.connecting.hover_port.clone() {
            let allowed = self.connecting.check.as_ref().is_some_and(|c| c.allowed);
            self.cancel_connect();
            if !allowed {
                return None;
            }
            return match self.connect_checked(&start, &hover) {
                Ok(outcome) => Some(outcome),
                Err(message) => {
                    debug!("end_connect: {}", message);
                    None
                }
            };
        }

        let Some(start_port) = self.graph.as_ref().and_then(|g| g.port(&start)) else {
            self.cancel_connect();
            return None;
        };
        let required_type = start_port.param_type().clone();
        let required_direction = start_port.direction.opposite();
        self.connecting.is_connecting = false;
        self.connecting.is_connecting_to_new = true;
        self.connecting.required_type = Some(required_type.clone());
        self.connecting.required_direction = Some(required_direction);
        self.push_request(EditorRequest::ShowAddBlockPanel {
            position: self.connecting.end_pos,
            filter: Some((required_type, required_direction)),
        });
        None
    }

    /// Finishes a connect-to-new gesture with the block the user added, or
    /// abandons it with `None`.
    ///
    /// The first port of `block` that can take the wire is connected and
    /// the block is moved so that port sits at the wire's loose end.
    pub fn end_connect_to_new(&mut self, block: Option<Uuid>) -> Option<PortId> {
        if !self.connecting.is_connecting_to_new {
            return None;
        }
        let info = std::mem::take(&mut self.connecting);
        if let Some(start) = &info.start_port {
            self.refresh_port_state(start);
        }
        let block_id = block?;
        let (start, required_type, required_direction) =
            (info.start_port?, info.required_type?, info.required_direction?);

        let guid = self
            .graph
            .as_ref()?
            .block(&block_id)?
            .port_by_type_and_direction(&required_type, required_direction, true)?
            .guid()
            .to_string();
        let port = PortId::new(block_id, &guid);
        if let Err(message) = self.connect_checked(&start, &port) {
            debug!("end_connect_to_new: {}", message);
            return None;
        }

        if let Some(anchor) = self.port_position(&port) {
            let position = self.graph.as_ref()?.block(&block_id)?.position;
            let target = position + (info.end_pos - anchor);
            self.move_block(&block_id, target);
        }
        Some(port)
    }

    /// Drops the gesture and restores the states of the ports involved.
    pub fn cancel_connect(&mut self) {
        let info = std::mem::take(&mut self.connecting);
        for port in [info.start_port, info.hover_port].into_iter().flatten() {
            self.refresh_port_state(&port);
        }
        if info.is_connecting_to_new {
            self.push_request(EditorRequest::CloseAddBlockPanel);
        }
    }

    fn refresh_port_state(&mut self, id: &PortId) {
        if let Some(port) = self.graph.as_mut().and_then(|g| g.port_mut(id)) {
            port.refresh_state();
        }
    }
}
