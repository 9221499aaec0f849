//! Typed connection points on a block.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::model::param_type::ParamType;
use crate::util::VecSetExt;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    Input,
    Output,
}

impl PortDirection {
    pub fn opposite(&self) -> PortDirection {
        match self {
            PortDirection::Input => PortDirection::Output,
            PortDirection::Output => PortDirection::Input,
        }
    }
}

/// Visual state of a port, read by the renderer.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PortState {
    #[default]
    Normal,
    /// Connected, or the origin of a connection drag
    Active,
    /// Hovered during a drag and rejected
    Error,
    /// Hovered during a drag and accepted
    Success,
}

/// Static description of a port, shared by every block built from the same
/// definition. Dynamically added ports carry their own copy.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PortDefinition {
    pub guid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub direction: PortDirection,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    /// Listed first on the block and preferred by "connect to new block".
    #[serde(default)]
    pub default_connect_port: bool,
    /// An `any` port that adopts the concrete type of its first connection.
    #[serde(default)]
    pub flexible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_value: Option<Value>,
}

impl PortDefinition {
    pub fn new(guid: &str, direction: PortDirection, param_type: ParamType) -> Self {
        Self {
            guid: guid.to_string(),
            name: guid.to_string(),
            description: String::new(),
            direction,
            param_type,
            default_connect_port: false,
            flexible: false,
            initial_value: None,
        }
    }

    pub fn input(guid: &str, param_type: ParamType) -> Self {
        Self::new(guid, PortDirection::Input, param_type)
    }

    pub fn output(guid: &str, param_type: ParamType) -> Self {
        Self::new(guid, PortDirection::Output, param_type)
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_initial_value(mut self, value: Value) -> Self {
        self.initial_value = Some(value);
        self
    }

    pub fn default_connect(mut self) -> Self {
        self.default_connect_port = true;
        self
    }

    pub fn flexible(mut self) -> Self {
        self.flexible = true;
        self
    }
}

/// Address of a port inside a graph.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PortId {
    pub block_id: Uuid,
    pub guid: String,
}

impl PortId {
    pub fn new(block_id: Uuid, guid: &str) -> Self {
        Self {
            block_id,
            guid: guid.to_string(),
        }
    }
}

/// A port instance on a block.
///
/// `connected_from` holds the uids of wires ending here (input side) and
/// `connected_to` the uids of wires starting here (output side). Both are
/// kept in sync with the graph's connector list by [`crate::model::graph::Graph`].
#[derive(Clone, Debug)]
pub struct Port {
    pub define: PortDefinition,
    pub direction: PortDirection,
    pub dynamic_add: bool,
    pub initial_value: Option<Value>,
    pub connected_from: Vec<Uuid>,
    pub connected_to: Vec<Uuid>,
    pub state: PortState,
}

impl Port {
    pub fn new(define: PortDefinition, dynamic_add: bool, initial_value: Option<Value>) -> Self {
        let initial_value = initial_value.or_else(|| define.initial_value.clone());
        Self {
            direction: define.direction,
            define,
            dynamic_add,
            initial_value,
            connected_from: Vec::new(),
            connected_to: Vec::new(),
            state: PortState::Normal,
        }
    }

    pub fn guid(&self) -> &str {
        &self.define.guid
    }

    pub fn param_type(&self) -> &ParamType {
        &self.define.param_type
    }

    pub fn is_execute(&self) -> bool {
        self.define.param_type.is_execute()
    }

    /// Wires on the side that matters for this port's direction.
    pub fn connections(&self) -> &[Uuid] {
        match self.direction {
            PortDirection::Input => &self.connected_from,
            PortDirection::Output => &self.connected_to,
        }
    }

    pub fn is_connected(&self) -> bool {
        !self.connections().is_empty()
    }

    /// Whether a value from `source` can flow into this port directly.
    pub fn check_type_allow(&self, source: &Port) -> bool {
        self.define.param_type.accepts(&source.define.param_type)
    }

    pub(crate) fn attach(&mut self, connector: Uuid) {
        match self.direction {
            PortDirection::Input => self.connected_from.add_unique(connector),
            PortDirection::Output => self.connected_to.add_unique(connector),
        };
    }

    pub(crate) fn detach(&mut self, connector: &Uuid) {
        self.connected_from.remove_value(connector);
        self.connected_to.remove_value(connector);
    }

    /// Active while connected, normal otherwise.
    pub fn refresh_state(&mut self) {
        self.state = if self.is_connected() {
            PortState::Active
        } else {
            PortState::Normal
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::param_type::BaseType;

    #[test]
    fn test_state_follows_connections() {
        let mut port = Port::new(
            PortDefinition::input("IN", ParamType::new(BaseType::Number)),
            false,
            None,
        );
        let wire = Uuid::new_v4();
        port.attach(wire);
        port.attach(wire);
        assert_eq!(port.connected_from.len(), 1);
        port.refresh_state();
        assert_eq!(port.state, PortState::Active);
        port.detach(&wire);
        port.refresh_state();
        assert_eq!(port.state, PortState::Normal);
    }

    #[test]
    fn test_check_type_allow_uses_both_types() {
        let input = Port::new(PortDefinition::input("IN", ParamType::new(BaseType::String)), false, None);
        let number = Port::new(PortDefinition::output("OUT", ParamType::new(BaseType::Number)), false, None);
        let string = Port::new(PortDefinition::output("OUT", ParamType::new(BaseType::String)), false, None);
        assert!(!input.check_type_allow(&number));
        assert!(input.check_type_allow(&string));
    }

    #[test]
    fn test_initial_value_falls_back_to_definition() {
        let def = PortDefinition::input("IN", ParamType::new(BaseType::Number))
            .with_initial_value(serde_json::json!(3));
        assert_eq!(Port::new(def.clone(), false, None).initial_value, Some(serde_json::json!(3)));
        assert_eq!(
            Port::new(def, false, Some(serde_json::json!(7))).initial_value,
            Some(serde_json::json!(7))
        );
    }
}
