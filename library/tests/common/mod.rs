//! Shared fixtures for the editor integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use blueprint::editor::Editor;
use blueprint::model::block::BlockDefinition;
use blueprint::model::graph::Graph;
use blueprint::model::math::Vector2;
use blueprint::model::param_type::{BaseType, ParamType};
use blueprint::model::port::{PortDefinition, PortId};
use blueprint::registry::block_registry::{BlockPackage, BlockRegistry};
use blueprint::registry::builtin::register_builtin;
use blueprint::registry::type_registry::TypeRegistry;
use blueprint::EditorConfig;
use uuid::Uuid;

pub const NUM_OUT: &str = "TEST_NUM_OUT";
pub const NUM_IN: &str = "TEST_NUM_IN";
pub const STR_IN: &str = "TEST_STR_IN";
pub const BOOL_OUT: &str = "TEST_BOOL_OUT";
pub const FLOW: &str = "TEST_FLOW";
pub const ANY_IN: &str = "TEST_ANY_IN";

/// Blocks used across the tests. Ports sit in the first layout row, so
/// with the default layout an input anchor is at `position + (0, 42)` and
/// an output anchor at `position + (150, 42)`.
pub struct TestPackage;

impl BlockPackage for TestPackage {
    fn package_name(&self) -> &str {
        "Test"
    }

    fn version(&self) -> u32 {
        1
    }

    fn register(&self, _types: &mut TypeRegistry) -> Vec<BlockDefinition> {
        let number = ParamType::new(BaseType::Number);
        vec![
            BlockDefinition::new(NUM_OUT, "Number source")
                .with_category("Test")
                .with_port(PortDefinition::output("OUT", number.clone())),
            BlockDefinition::new(NUM_IN, "Number sink")
                .with_category("Test")
                .with_port(PortDefinition::input("IN", number.clone())),
            BlockDefinition::new(STR_IN, "String sink")
                .with_category("Test")
                .with_port(PortDefinition::input("IN", ParamType::new(BaseType::String))),
            BlockDefinition::new(BOOL_OUT, "Boolean source")
                .with_category("Test")
                .with_port(PortDefinition::output("OUT", ParamType::new(BaseType::Boolean))),
            BlockDefinition::new(FLOW, "Flow")
                .with_category("Test/Flow")
                .with_port(PortDefinition::input("EXEC_IN", ParamType::execute()))
                .with_port(PortDefinition::input("VAL_IN", number.clone()))
                .with_port(PortDefinition::output("EXEC_OUT", ParamType::execute()))
                .with_port(PortDefinition::output("VAL_OUT", number)),
            BlockDefinition::new(ANY_IN, "Any sink")
                .with_category("Test")
                .with_port(PortDefinition::input("IN", ParamType::any())),
        ]
    }
}

pub fn registries(extra: Vec<BlockDefinition>) -> (Arc<TypeRegistry>, Arc<BlockRegistry>) {
    let mut types = TypeRegistry::new();
    let mut blocks = BlockRegistry::new();
    register_builtin(&mut blocks, &mut types);
    blocks.register_package(Arc::new(TestPackage), &mut types);
    for define in extra {
        blocks.register_block(define);
    }
    (Arc::new(types), Arc::new(blocks))
}

/// An editor with the built-in and test blocks and an empty graph open.
pub fn setup_editor() -> Editor {
    setup_editor_with(Vec::new())
}

pub fn setup_editor_with(extra: Vec<BlockDefinition>) -> Editor {
    let (types, blocks) = registries(extra);
    let mut editor = Editor::new(types, blocks, EditorConfig::default());
    editor.open_graph(Graph::new("main"));
    editor
}

/// Adds a block through the user path and settles its region.
pub fn add(editor: &mut Editor, guid: &str, x: f32, y: f32) -> Uuid {
    let uid = editor.user_add_block(guid, Some(Vector2::new(x, y))).unwrap();
    editor.tick();
    uid
}

/// Adds a block with an explicit size.
pub fn add_sized(editor: &mut Editor, guid: &str, x: f32, y: f32, w: f32, h: f32) -> Uuid {
    let mut block = editor.instantiate_block(guid).unwrap();
    block.position = Vector2::new(x, y);
    block.custom_size = Vector2::new(w, h);
    let uid = editor.add_block(block).unwrap();
    editor.tick();
    uid
}

pub fn port(block: Uuid, guid: &str) -> PortId {
    PortId::new(block, guid)
}

pub fn wire_count(editor: &Editor) -> usize {
    editor.graph().unwrap().connectors().len()
}

pub fn assert_close(a: Vector2, b: Vector2) {
    assert!(
        (a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3,
        "{} != {}",
        a,
        b
    );
}
