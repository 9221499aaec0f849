//! Block definitions and block instances.

use log::warn;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::model::graph::Graph;
use crate::model::math::Vector2;
use crate::model::param_type::ParamType;
use crate::model::port::{Port, PortDefinition, PortDirection, PortId};

pub type OnAddCheck = Arc<dyn Fn(&BlockDefinition, &Graph) -> Option<String> + Send + Sync>;
pub type OnDeleteCheck = Arc<dyn Fn(&Block, &Graph) -> Option<String> + Send + Sync>;
/// Arguments are the input block, the output port and the input port.
pub type OnPortConnectCheck = Arc<dyn Fn(&Block, &Port, &Port) -> Option<String> + Send + Sync>;
/// Arguments are the block, the guid of its flexible port and the concrete
/// type found on the other end of the new wire.
pub type OnFlexPortConnect = Arc<dyn Fn(&mut Block, &str, &ParamType) + Send + Sync>;
pub type OnPortEvent = Arc<dyn Fn(&Block, &Port) + Send + Sync>;
pub type OnBlockEvent = Arc<dyn Fn(&Block) + Send + Sync>;
pub type OnBlockCreate = Arc<dyn Fn(&mut Block) + Send + Sync>;

/// Optional per-definition hooks. Each one is invoked only when set.
///
/// Check hooks return `Some(message)` to veto the user action.
#[derive(Clone, Default)]
pub struct BlockEvents {
    pub on_add_check: Option<OnAddCheck>,
    pub on_delete_check: Option<OnDeleteCheck>,
    pub on_port_connect_check: Option<OnPortConnectCheck>,
    pub on_flex_port_connect: Option<OnFlexPortConnect>,
    pub on_port_connect: Option<OnPortEvent>,
    pub on_port_unconnect: Option<OnPortEvent>,
    pub on_create: Option<OnBlockCreate>,
    pub on_add_to_editor: Option<OnBlockEvent>,
    pub on_remove_from_editor: Option<OnBlockEvent>,
    pub on_port_add: Option<OnPortEvent>,
    pub on_port_remove: Option<OnPortEvent>,
}

impl fmt::Debug for BlockEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = Vec::new();
        let hooks = [
            ("on_add_check", self.on_add_check.is_some()),
            ("on_delete_check", self.on_delete_check.is_some()),
            ("on_port_connect_check", self.on_port_connect_check.is_some()),
            ("on_flex_port_connect", self.on_flex_port_connect.is_some()),
            ("on_port_connect", self.on_port_connect.is_some()),
            ("on_port_unconnect", self.on_port_unconnect.is_some()),
            ("on_create", self.on_create.is_some()),
            ("on_add_to_editor", self.on_add_to_editor.is_some()),
            ("on_remove_from_editor", self.on_remove_from_editor.is_some()),
            ("on_port_add", self.on_port_add.is_some()),
            ("on_port_remove", self.on_port_remove.is_some()),
        ];
        for (name, present) in hooks {
            if present {
                set.push(name);
            }
        }
        f.debug_struct("BlockEvents").field("set", &set).finish()
    }
}

/// A block "type": everything shared by the instances created from it.
#[derive(Clone, Debug)]
pub struct BlockDefinition {
    pub guid: String,
    pub name: String,
    /// `/`-separated category path, e.g. `Base/Script`.
    pub category: String,
    pub description: String,
    pub version: u32,
    pub ports: Vec<PortDefinition>,
    pub hide_in_add_panel: bool,
    pub one_block_only: bool,
    pub can_not_delete: bool,
    pub events: BlockEvents,
}

impl BlockDefinition {
    pub fn new(guid: &str, name: &str) -> Self {
        Self {
            guid: guid.to_string(),
            name: name.to_string(),
            category: String::new(),
            description: String::new(),
            version: 0,
            ports: Vec::new(),
            hide_in_add_panel: false,
            one_block_only: false,
            can_not_delete: false,
            events: BlockEvents::default(),
        }
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_port(mut self, port: PortDefinition) -> Self {
        self.ports.push(port);
        self
    }

    pub fn with_events(mut self, events: BlockEvents) -> Self {
        self.events = events;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hide_in_add_panel = true;
        self
    }

    pub fn one_only(mut self) -> Self {
        self.one_block_only = true;
        self
    }

    pub fn undeletable(mut self) -> Self {
        self.can_not_delete = true;
        self
    }

    /// Whether the definition declares a port in `direction` that a wire of
    /// `param_type` could attach to.
    pub fn has_port_for(&self, param_type: &ParamType, direction: PortDirection) -> bool {
        self.ports
            .iter()
            .any(|p| p.direction == direction && port_type_matches(&p.param_type, param_type, true))
    }
}

/// Whether a port typed `port_type` can take a wire of type `wanted`.
/// Execute only matches execute.
pub fn port_type_matches(port_type: &ParamType, wanted: &ParamType, include_any: bool) -> bool {
    if wanted.is_execute() || port_type.is_execute() {
        return wanted.is_execute() && port_type.is_execute();
    }
    if include_any && wanted.is_any() {
        return true;
    }
    if port_type.is_dictionary() && wanted.is_dictionary() {
        let key_any = port_type.dictionary_key.as_ref().is_none_or(|k| k.is_any());
        if include_any && port_type.is_any() && key_any {
            return true;
        }
        let keys_equal = match (&port_type.dictionary_key, &wanted.dictionary_key) {
            (Some(a), Some(b)) => a.equals(b, false),
            (None, None) => true,
            _ => false,
        };
        return port_type.equals(wanted, true) && keys_equal;
    }
    port_type.equals(wanted, true)
        || (include_any && port_type.is_any() && port_type.container == wanted.container)
}

/// A node instance in a graph.
#[derive(Clone, Debug)]
pub struct Block {
    pub uid: Uuid,
    pub define: Arc<BlockDefinition>,
    pub position: Vector2,
    /// User-resized size. Zero means "use the layout size".
    pub custom_size: Vector2,
    /// Free-form per-instance storage persisted with the document.
    pub options: Map<String, Value>,
    pub ports: Vec<Port>,
    /// Uids of every wire touching one of this block's ports.
    pub connectors: Vec<Uuid>,
    pub selected: bool,
    pub hover: bool,
}

impl Block {
    /// Creates a block with the definition's ports and runs `on_create`.
    pub fn new(define: Arc<BlockDefinition>) -> Self {
        let mut block = Self::bare(define, Uuid::new_v4());
        let ports = block.define.ports.clone();
        for def in ports {
            block.add_port(def, false, None);
        }
        block.notify_created();
        block
    }

    /// A block with no ports and no hooks run, for loaders that rebuild the
    /// port list themselves.
    pub(crate) fn bare(define: Arc<BlockDefinition>, uid: Uuid) -> Self {
        Self {
            uid,
            define,
            position: Vector2::ZERO,
            custom_size: Vector2::ZERO,
            options: Map::new(),
            ports: Vec::new(),
            connectors: Vec::new(),
            selected: false,
            hover: false,
        }
    }

    pub(crate) fn notify_created(&mut self) {
        if let Some(hook) = self.define.events.on_create.clone() {
            hook(self);
        }
    }

    pub fn guid(&self) -> &str {
        &self.define.guid
    }

    pub fn name(&self) -> &str {
        &self.define.name
    }

    /// Adds a port. A duplicate guid logs a warning and returns the existing
    /// port unchanged.
    pub fn add_port(
        &mut self,
        define: PortDefinition,
        dynamic_add: bool,
        initial_value: Option<Value>,
    ) -> &Port {
        if let Some(index) = self.port_index(&define.guid) {
            warn!(
                "{}.add_port: {:?} port {} ({}) already exists",
                self.name(),
                define.direction,
                define.name,
                define.guid
            );
            return &self.ports[index];
        }

        let front = define.default_connect_port;
        let port = Port::new(define, dynamic_add, initial_value);
        let index = if front {
            self.ports.insert(0, port);
            0
        } else {
            self.ports.push(port);
            self.ports.len() - 1
        };

        if let Some(hook) = self.define.events.on_port_add.clone() {
            hook(self, &self.ports[index]);
        }
        &self.ports[index]
    }

    /// Removes a port from the block. Wires must already be detached; the
    /// editor's `delete_block_port` takes care of that.
    pub fn remove_port(&mut self, guid: &str) -> Option<Port> {
        let Some(index) = self.port_index(guid) else {
            warn!("{}.remove_port: port {} does not exist", self.name(), guid);
            return None;
        };
        let port = self.ports.remove(index);
        if let Some(hook) = self.define.events.on_port_remove.clone() {
            hook(self, &port);
        }
        Some(port)
    }

    fn port_index(&self, guid: &str) -> Option<usize> {
        self.ports.iter().position(|p| p.guid() == guid)
    }

    pub fn port(&self, guid: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.guid() == guid)
    }

    pub fn port_mut(&mut self, guid: &str) -> Option<&mut Port> {
        self.ports.iter_mut().find(|p| p.guid() == guid)
    }

    pub fn port_id(&self, guid: &str) -> PortId {
        PortId::new(self.uid, guid)
    }

    pub fn input_ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.iter().filter(|p| p.direction == PortDirection::Input)
    }

    pub fn output_ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.iter().filter(|p| p.direction == PortDirection::Output)
    }

    /// First port in `direction` that a wire of `param_type` could attach to.
    ///
    /// With `include_any`, `any` on either side matches.
    pub fn port_by_type_and_direction(
        &self,
        param_type: &ParamType,
        direction: PortDirection,
        include_any: bool,
    ) -> Option<&Port> {
        self.ports.iter().find(|p| {
            p.direction == direction && port_type_matches(p.param_type(), param_type, include_any)
        })
    }

    /// Retypes a port, typically a flexible `any` port resolving to the type
    /// of its first connection. Returns `false` when the port is unknown.
    pub fn change_port_type(
        &mut self,
        guid: &str,
        new_type: &ParamType,
        change_container: bool,
        change_key: bool,
    ) -> bool {
        let name = self.define.name.clone();
        let Some(port) = self.port_mut(guid) else {
            warn!("{}.change_port_type: port {} does not exist", name, guid);
            return false;
        };
        let current = &mut port.define.param_type;
        current.base_type = new_type.base_type;
        current.custom_type = new_type.custom_type.clone();
        if change_container {
            current.container = new_type.container;
        }
        if change_key {
            current.dictionary_key = new_type.dictionary_key.clone();
        }
        true
    }
}
