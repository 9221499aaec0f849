//! The editor service: owns the open graph and its spatial index, and
//! implements the graph controller, the connection engine, the connecting
//! gesture, selection, mouse handling and user operations on top of them.

mod editor_connecting_ops;
mod editor_connection_ops;
mod editor_graph_ops;
mod editor_mouse_ops;
mod editor_selection_ops;
pub mod editor_service;
mod editor_user_ops;
pub mod layout;

pub use editor_connecting_ops::{ConnectState, ConnectingInfo};
pub use editor_connection_ops::{ConnectCheck, ConnectOutcome};
pub use editor_mouse_ops::{DragMode, Modifiers, MouseButton, MouseInfo};
pub use editor_service::{Editor, EditorEvents, EditorRequest};
pub use editor_user_ops::Align;
pub use layout::{BlockLayout, FixedBlockLayout};
