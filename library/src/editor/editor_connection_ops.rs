use log::{debug, warn};
use uuid::Uuid;

use super::editor_service::Editor;
use crate::model::block::Block;
use crate::model::connector::Connector;
use crate::model::math::Vector2;
use crate::model::port::{PortDirection, PortId};
use crate::registry::block_registry::BaseBlockRole;
use crate::registry::builtin::{CONVERT_FROM_OPTION, CONVERT_INPUT, CONVERT_OUTPUT, CONVERT_TO_OPTION};
use crate::registry::type_registry::TypeConverter;

/// Result of evaluating a candidate wire.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConnectCheck {
    pub allowed: bool,
    /// Set when the wire has to go through a `Convert` block.
    pub converter: Option<TypeConverter>,
    /// Committing will replace a wire the exclusivity rules forbid keeping.
    pub replaces_existing: bool,
    /// Whether the same pair is already wired; committing removes the wire.
    pub toggles_existing: bool,
    /// Text for the UI, set for both outcomes.
    pub message: String,
}

impl ConnectCheck {
    fn reject(message: impl Into<String>) -> Self {
        Self {
            allowed: false,
            message: message.into(),
            ..Default::default()
        }
    }

    fn allow(message: impl Into<String>) -> Self {
        Self {
            allowed: true,
            message: message.into(),
            ..Default::default()
        }
    }
}

/// What a committed connection did to the graph.
#[derive(Clone, Debug, PartialEq)]
pub enum ConnectOutcome {
    Connected(Uuid),
    /// The pair was already wired and the wire was removed.
    Disconnected(Uuid),
    /// A `Convert` block was inserted between the two ports.
    Converted { block: Uuid, input: Uuid, output: Uuid },
}

/// Connection engine: compatibility, commit and disconnect.
impl Editor {
    /// Returns `(output, input)` for two ports of opposite direction.
    fn orient(&self, a: &PortId, b: &PortId) -> Option<(PortId, PortId)> {
        let graph = self.graph.as_ref()?;
        let pa = graph.port(a)?;
        let pb = graph.port(b)?;
        match (pa.direction, pb.direction) {
            (PortDirection::Output, PortDirection::Input) => Some((a.clone(), b.clone())),
            (PortDirection::Input, PortDirection::Output) => Some((b.clone(), a.clone())),
            _ => None,
        }
    }

    /// Evaluates whether `a` and `b` may be wired, in either order.
    ///
    /// Rejections are ordinary results carrying a message for the UI.
    pub fn check_compatibility(&self, a: &PortId, b: &PortId) -> ConnectCheck {
        let Some(graph) = self.graph.as_ref() else {
            return ConnectCheck::reject("No graph is open");
        };
        let (Some(pa), Some(pb)) = (graph.port(a), graph.port(b)) else {
            return ConnectCheck::reject("Port not found");
        };
        if a.block_id == b.block_id {
            return ConnectCheck::reject("Cannot connect ports on the same block");
        }
        if pa.direction == pb.direction {
            return ConnectCheck::reject("Cannot connect two ports of the same direction");
        }
        let (out_id, in_id) = if pa.direction == PortDirection::Output {
            (a, b)
        } else {
            (b, a)
        };
        let (out_port, in_port) = if pa.direction == PortDirection::Output {
            (pa, pb)
        } else {
            (pb, pa)
        };

        let mut check = if in_port.is_execute() || out_port.is_execute() {
            if in_port.is_execute() && out_port.is_execute() {
                ConnectCheck::allow("")
            } else {
                return ConnectCheck::reject(format!(
                    "{} is not compatible with {}",
                    self.types.display_name(out_port.param_type()),
                    self.types.display_name(in_port.param_type())
                ));
            }
        } else if in_port.check_type_allow(out_port) {
            ConnectCheck::allow("")
        } else {
            match self.types.converter(out_port.param_type(), in_port.param_type()) {
                Some(converter) => ConnectCheck {
                    allowed: true,
                    converter: Some(converter.clone()),
                    message: format!(
                        "Convert {} to {}",
                        self.types.display_name(out_port.param_type()),
                        self.types.display_name(in_port.param_type())
                    ),
                    ..Default::default()
                },
                None => {
                    return ConnectCheck::reject(format!(
                        "{} is not compatible with {}",
                        self.types.display_name(out_port.param_type()),
                        self.types.display_name(in_port.param_type())
                    ));
                }
            }
        };

        if check.converter.is_none() {
            if let Some(in_block) = graph.block(&in_id.block_id) {
                if let Some(hook) = &in_block.define.events.on_port_connect_check {
                    if let Some(message) = hook(in_block, out_port, in_port) {
                        return ConnectCheck::reject(message);
                    }
                }
            }
        }

        if graph.find_connector(out_id, in_id).is_some() {
            check.toggles_existing = true;
            check.message = "Will remove the existing connection".to_string();
        } else if check.converter.is_none()
            && ((out_port.is_execute() && !out_port.connected_to.is_empty())
                || (!in_port.is_execute() && !in_port.connected_from.is_empty()))
        {
            check.replaces_existing = true;
            check.message = "Will replace the existing connection".to_string();
        }
        check
    }

    /// Wires two ports without a compatibility check, in either order.
    ///
    /// Wiring a pair that is already wired removes the wire instead and
    /// returns `None`. An execute output keeps at most one outgoing wire
    /// and a data input at most one incoming wire; the older wire goes.
    pub fn connect(&mut self, a: &PortId, b: &PortId) -> Option<Uuid> {
        let Some((out_id, in_id)) = self.orient(a, b) else {
            warn!("connect: {:?} and {:?} are not an output/input pair", a, b);
            return None;
        };
        let graph = self.graph.as_ref()?;
        if let Some(existing) = graph.find_connector(&out_id, &in_id) {
            self.disconnect(&existing);
            return None;
        }

        let out_port = graph.port(&out_id)?;
        let in_port = graph.port(&in_id)?;
        let stale: Vec<Uuid> = if out_port.is_execute() {
            out_port.connected_to.clone()
        } else {
            in_port.connected_from.clone()
        };
        for uid in &stale {
            self.disconnect(uid);
        }

        let uid = self
            .graph
            .as_mut()?
            .link(Connector::new(out_id.clone(), in_id.clone()))?;
        self.index_connector(&uid);
        debug!("Connected {}.{} -> {}.{}", out_id.block_id, out_id.guid, in_id.block_id, in_id.guid);

        self.notify_port_connect(&out_id, &in_id);
        self.resolve_flex_port(&out_id, &in_id);
        self.mark_graph_changed();
        Some(uid)
    }

    fn notify_port_connect(&self, out_id: &PortId, in_id: &PortId) {
        if let Some(hook) = &self.events.on_port_connect {
            hook(out_id, in_id);
        }
        let Some(graph) = self.graph.as_ref() else {
            return;
        };
        for id in [out_id, in_id] {
            let Some(block) = graph.block(&id.block_id) else {
                continue;
            };
            if let (Some(hook), Some(port)) = (&block.define.events.on_port_connect, block.port(&id.guid)) {
                hook(block, port);
            }
        }
    }

    /// Lets a flexible `any` port adopt the type found on the other end.
    /// Only the first flexible side is resolved, output first.
    fn resolve_flex_port(&mut self, out_id: &PortId, in_id: &PortId) {
        let Some(graph) = self.graph.as_ref() else {
            return;
        };
        let (Some(out_port), Some(in_port)) = (graph.port(out_id), graph.port(in_id)) else {
            return;
        };
        if out_port.param_type() == in_port.param_type() {
            return;
        }
        let side = if out_port.define.flexible && out_port.param_type().is_any() {
            Some((out_id, in_port.param_type().clone()))
        } else if in_port.define.flexible && in_port.param_type().is_any() {
            Some((in_id, out_port.param_type().clone()))
        } else {
            None
        };
        let Some((id, other_type)) = side else {
            return;
        };
        let Some(block) = self.graph.as_mut().and_then(|g| g.block_mut(&id.block_id)) else {
            return;
        };
        if let Some(hook) = block.define.events.on_flex_port_connect.clone() {
            hook(block, &id.guid, &other_type);
            self.update_block_region(&id.block_id);
        }
    }

    /// Removes a wire: index entry, port and block references, selection.
    pub fn disconnect(&mut self, uid: &Uuid) -> Option<Connector> {
        if self.panel.contains(uid) {
            self.panel.remove_instance(uid);
        }
        self.selected_connectors.retain(|u| u != uid);
        self.hovered_connectors.retain(|u| u != uid);
        let Some(connector) = self.graph.as_mut()?.unlink(uid) else {
            warn!("disconnect: wire {} is not in the graph", uid);
            return None;
        };

        if let Some(hook) = &self.events.on_port_unconnect {
            hook(&connector.start, &connector.end);
        }
        if let Some(graph) = self.graph.as_ref() {
            for id in [&connector.start, &connector.end] {
                let Some(block) = graph.block(&id.block_id) else {
                    continue;
                };
                if let (Some(hook), Some(port)) =
                    (&block.define.events.on_port_unconnect, block.port(&id.guid))
                {
                    hook(block, port);
                }
            }
        }
        self.mark_graph_changed();
        Some(connector)
    }

    /// Removes every wire touching a port. Returns how many went.
    pub fn disconnect_port(&mut self, id: &PortId) -> usize {
        let uids = match self.graph.as_ref() {
            Some(graph) => graph.port_connectors(id),
            None => return 0,
        };
        uids.iter().filter(|uid| self.disconnect(uid).is_some()).count()
    }

    /// Removes every wire touching a block. Returns how many went.
    pub fn disconnect_block(&mut self, uid: &Uuid) -> usize {
        let uids = match self.graph.as_ref() {
            Some(graph) => graph.block_connectors(uid),
            None => return 0,
        };
        uids.iter().filter(|c| self.disconnect(c).is_some()).count()
    }

    /// Inserts a hidden `Convert` block centred on the midpoint of the two
    /// port anchors and wires `out -> convert -> in`. The block's options
    /// record the types of the two ports it joins.
    pub fn connect_with_converter(
        &mut self,
        out_id: &PortId,
        in_id: &PortId,
        converter: &TypeConverter,
    ) -> Option<ConnectOutcome> {
        let Some(define) = self.blocks.base_block(BaseBlockRole::Convert) else {
            warn!("connect_with_converter: no Convert block is registered");
            return None;
        };
        let graph = self.graph.as_ref()?;
        let from_type = graph.port(out_id)?.param_type().clone();
        let to_type = graph.port(in_id)?.param_type().clone();
        let midpoint = self
            .port_position(out_id)?
            .midpoint(self.port_position(in_id)?);

        let mut block = Block::new(define);
        block.change_port_type(CONVERT_INPUT, &from_type, true, true);
        block.change_port_type(CONVERT_OUTPUT, &to_type, true, true);
        // port types rather than the converter row; loading rebuilds the
        // ports from these
        block.options.insert(
            CONVERT_FROM_OPTION.to_string(),
            serde_json::to_value(&from_type).ok()?,
        );
        block.options.insert(
            CONVERT_TO_OPTION.to_string(),
            serde_json::to_value(&to_type).ok()?,
        );
        debug!(
            "Inserting converter {} -> {} between {} and {}",
            converter.from.type_name(),
            converter.to.type_name(),
            from_type.type_name(),
            to_type.type_name()
        );
        let size = self.layout.block_size(&block);
        block.position = midpoint - size * 0.5;

        let block_id = self.add_block(block)?;
        let convert_in = PortId::new(block_id, CONVERT_INPUT);
        let convert_out = PortId::new(block_id, CONVERT_OUTPUT);
        let input = self.connect(out_id, &convert_in)?;
        let output = self.connect(&convert_out, in_id)?;
        Some(ConnectOutcome::Converted {
            block: block_id,
            input,
            output,
        })
    }

    /// Checks and commits a wire between `a` and `b`, in either order.
    pub fn connect_checked(&mut self, a: &PortId, b: &PortId) -> Result<ConnectOutcome, String> {
        let check = self.check_compatibility(a, b);
        if !check.allowed {
            return Err(check.message);
        }
        let (out_id, in_id) = self
            .orient(a, b)
            .ok_or_else(|| "Cannot connect two ports of the same direction".to_string())?;

        if let Some(existing) = self.graph.as_ref().and_then(|g| g.find_connector(&out_id, &in_id)) {
            self.disconnect(&existing);
            return Ok(ConnectOutcome::Disconnected(existing));
        }
        if let Some(converter) = &check.converter {
            return self
                .connect_with_converter(&out_id, &in_id, converter)
                .ok_or_else(|| format!("Failed to insert a converter: {}", check.message));
        }
        self.connect(&out_id, &in_id)
            .map(ConnectOutcome::Connected)
            .ok_or_else(|| "Connection failed".to_string())
    }

    /// Anchor positions of a wire's two ends, in viewport coordinates.
    pub fn connector_endpoints(&self, uid: &Uuid) -> Option<(Vector2, Vector2)> {
        let curve = self.connector_curve(uid)?;
        Some((curve.start, curve.end))
    }
}
