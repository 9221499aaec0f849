//! The `Editor` service object and the hooks and requests it exposes.

use std::sync::Arc;
use uuid::Uuid;

use crate::config::EditorConfig;
use crate::editor::editor_connecting_ops::ConnectingInfo;
use crate::editor::editor_mouse_ops::MouseInfo;
use crate::editor::layout::{BlockLayout, FixedBlockLayout};
use crate::model::graph::Graph;
use crate::model::math::{Rect, Vector2, Viewport};
use crate::model::param_type::ParamType;
use crate::model::port::{PortDirection, PortId};
use crate::registry::block_registry::BlockRegistry;
use crate::registry::type_registry::TypeRegistry;
use crate::spatial::chunked_panel::ChunkedPanel;

pub type OnEditorPortEvent = Arc<dyn Fn(&PortId, &PortId) + Send + Sync>;
pub type OnGraphChanged = Arc<dyn Fn(&Graph) + Send + Sync>;
pub type OnSelectionChanged = Arc<dyn Fn(&[Uuid]) + Send + Sync>;

/// Editor-wide hooks. Port hooks receive the output side first.
#[derive(Clone, Default)]
pub struct EditorEvents {
    pub on_port_connect: Option<OnEditorPortEvent>,
    pub on_port_unconnect: Option<OnEditorPortEvent>,
    pub on_graph_changed: Option<OnGraphChanged>,
    pub on_select_block_changed: Option<OnSelectionChanged>,
    pub on_select_connector_changed: Option<OnSelectionChanged>,
}

/// Something the editor asks the host UI to do.
#[derive(Clone, Debug, PartialEq)]
pub enum EditorRequest {
    /// Open the add-block prompt at `position` (viewport coordinates). With
    /// a filter, only blocks owning a port of that type and direction fit.
    ShowAddBlockPanel {
        position: Vector2,
        filter: Option<(ParamType, PortDirection)>,
    },
    CloseAddBlockPanel,
}

pub struct Editor {
    pub(super) graph: Option<Graph>,
    pub(super) panel: ChunkedPanel<Uuid>,
    pub(super) types: Arc<TypeRegistry>,
    pub(super) blocks: Arc<BlockRegistry>,
    pub(super) config: EditorConfig,
    pub(super) layout: Box<dyn BlockLayout>,
    pub(super) events: EditorEvents,
    pub(super) viewport: Viewport,
    /// Size of the visible canvas in screen pixels.
    pub(super) view_size: Vector2,
    pub(super) connecting: ConnectingInfo,
    pub(super) selected_blocks: Vec<Uuid>,
    pub(super) selected_connectors: Vec<Uuid>,
    pub(super) hovered_connectors: Vec<Uuid>,
    pub(super) marquee: Option<Rect>,
    pub(super) mouse: MouseInfo,
    /// Blocks whose region is recomputed on the next `tick`.
    pub(super) pending_regions: Vec<Uuid>,
    pub(super) requests: Vec<EditorRequest>,
}

impl Editor {
    pub fn new(types: Arc<TypeRegistry>, blocks: Arc<BlockRegistry>, config: EditorConfig) -> Self {
        Self {
            graph: None,
            panel: ChunkedPanel::new(config.chunk_width, config.chunk_height),
            types,
            blocks,
            config,
            layout: Box::new(FixedBlockLayout::default()),
            events: EditorEvents::default(),
            viewport: Viewport::default(),
            view_size: Vector2::new(1280.0, 720.0),
            connecting: ConnectingInfo::default(),
            selected_blocks: Vec::new(),
            selected_connectors: Vec::new(),
            hovered_connectors: Vec::new(),
            marquee: None,
            mouse: MouseInfo::default(),
            pending_regions: Vec::new(),
            requests: Vec::new(),
        }
    }

    pub fn with_layout(mut self, layout: Box<dyn BlockLayout>) -> Self {
        self.layout = layout;
        self
    }

    pub fn set_events(&mut self, events: EditorEvents) {
        self.events = events;
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn type_registry(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn block_registry(&self) -> &BlockRegistry {
        &self.blocks
    }

    pub fn panel(&self) -> &ChunkedPanel<Uuid> {
        &self.panel
    }

    pub fn graph(&self) -> Option<&Graph> {
        self.graph.as_ref()
    }

    pub fn graph_mut(&mut self) -> Option<&mut Graph> {
        self.graph.as_mut()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Pans or zooms the canvas. A zoom change re-indexes every wire, since
    /// wire regions are padded by the hit tolerance in viewport units.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        let previous_scale = self.view_scale();
        self.viewport = viewport;
        if self.view_scale() != previous_scale {
            self.refresh_connector_regions();
        }
    }

    pub fn set_view_size(&mut self, size: Vector2) {
        self.view_size = size;
    }

    /// Zoom factor, treating a non-positive scale as 1.
    pub(super) fn view_scale(&self) -> f32 {
        if self.viewport.scale > 0.0 {
            self.viewport.scale
        } else {
            1.0
        }
    }

    pub fn connecting_info(&self) -> &ConnectingInfo {
        &self.connecting
    }

    pub fn mouse_info(&self) -> &MouseInfo {
        &self.mouse
    }

    /// Drains the pending UI requests.
    pub fn take_requests(&mut self) -> Vec<EditorRequest> {
        std::mem::take(&mut self.requests)
    }

    pub(crate) fn push_request(&mut self, request: EditorRequest) {
        self.requests.push(request);
    }

    /// Flags the open graph as modified and notifies `on_graph_changed`.
    pub fn mark_graph_changed(&mut self) {
        if let Some(graph) = self.graph.as_mut() {
            graph.file_changed = true;
            if let Some(hook) = &self.events.on_graph_changed {
                hook(graph);
            }
        }
    }
}
