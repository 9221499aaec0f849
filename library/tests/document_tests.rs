//! Integration tests for document persistence.

mod common;

use blueprint::editor::{ConnectOutcome, Editor};
use blueprint::model::block::BlockDefinition;
use blueprint::model::document::Document;
use blueprint::model::graph::Graph;
use blueprint::model::math::Vector2;
use blueprint::model::param_type::{BaseType, ParamType};
use blueprint::model::port::PortDefinition;
use blueprint::registry::builtin::{CONVERT_INPUT, CONVERT_OUTPUT};
use blueprint::{EditorConfig, EditorError};
use serde_json::json;
use uuid::Uuid;

use common::*;

struct Fixture {
    graph: Graph,
    source: Uuid,
    flow: Uuid,
    convert: Uuid,
}

/// A graph with a converter, a plain wire, block options and a dynamic port.
fn build_graph() -> Fixture {
    let mut editor = setup_editor();
    let source = add(&mut editor, NUM_OUT, 0.0, 0.0);
    let sink = add(&mut editor, STR_IN, 400.0, 200.0);
    let flow = add(&mut editor, FLOW, 400.0, 0.0);

    let outcome = editor.connect_checked(&port(source, "OUT"), &port(sink, "IN")).unwrap();
    let ConnectOutcome::Converted { block: convert, .. } = outcome else {
        panic!("expected a converter, got {:?}", outcome);
    };
    editor.connect(&port(source, "OUT"), &port(flow, "VAL_IN")).unwrap();

    let block = editor.graph_mut().unwrap().block_mut(&flow).unwrap();
    block.options.insert("label".to_string(), json!("step"));
    block.add_port(
        PortDefinition::output("EXTRA", ParamType::new(BaseType::String)),
        true,
        Some(json!("x")),
    );

    Fixture {
        graph: editor.close_graph().unwrap(),
        source,
        flow,
        convert,
    }
}

fn document_with(graph: Graph) -> Document {
    let mut document = Document::new("doc");
    document.author = "tests".to_string();
    assert!(document.add_graph(graph));
    document
}

#[test]
fn test_save_load_save_is_stable() {
    let fixture = build_graph();
    let document = document_with(fixture.graph);
    let json = document.save().unwrap();

    let (_, blocks) = registries(Vec::new());
    let loaded = Document::load(&json, &blocks).unwrap();
    assert_eq!(loaded.save().unwrap(), json);
    assert_eq!(loaded.uid, document.uid);
    assert_eq!(loaded.author, "tests");
    assert!(!loaded.is_file_changed());

    let graph = loaded.graph_by_name("main").unwrap();
    assert_eq!(graph.block_count(), 4);
    assert_eq!(graph.connectors().len(), 3);
    assert!(graph.check_consistency().is_ok());
}

#[test]
fn test_load_restores_block_state() {
    let fixture = build_graph();
    let json = document_with(fixture.graph).save().unwrap();
    let (_, blocks) = registries(Vec::new());
    let loaded = Document::load(&json, &blocks).unwrap();
    let graph = loaded.graph_by_name("main").unwrap();

    let flow = graph.block(&fixture.flow).unwrap();
    assert_eq!(flow.options.get("label"), Some(&json!("step")));
    let extra = flow.port("EXTRA").unwrap();
    assert!(extra.dynamic_add);
    assert_eq!(extra.initial_value, Some(json!("x")));
    assert_eq!(extra.param_type().base_type, BaseType::String);

    let source = graph.block(&fixture.source).unwrap();
    assert_eq!(source.port("OUT").unwrap().initial_value, Some(json!(0)));
    assert_eq!(source.port("OUT").unwrap().connected_to.len(), 2);

    let convert = graph.block(&fixture.convert).unwrap();
    assert_eq!(convert.port(CONVERT_INPUT).unwrap().param_type().base_type, BaseType::Number);
    assert_eq!(convert.port(CONVERT_OUTPUT).unwrap().param_type().base_type, BaseType::String);
}

#[test]
fn test_unknown_block_type_is_skipped_with_its_wires() {
    let gadget = BlockDefinition::new("GADGET", "Gadget")
        .with_port(PortDefinition::input("IN", ParamType::new(BaseType::Number)));
    let mut editor = setup_editor_with(vec![gadget]);
    let a = add(&mut editor, NUM_OUT, 0.0, 0.0);
    let g = add(&mut editor, "GADGET", 300.0, 0.0);
    let n = add(&mut editor, NUM_IN, 300.0, 200.0);
    editor.connect(&port(a, "OUT"), &port(g, "IN")).unwrap();
    let kept = editor.connect(&port(a, "OUT"), &port(n, "IN")).unwrap();
    let json = document_with(editor.close_graph().unwrap()).save().unwrap();

    let (_, blocks) = registries(Vec::new());
    let loaded = Document::load(&json, &blocks).unwrap();
    let graph = loaded.graph_by_name("main").unwrap();
    assert_eq!(graph.block_count(), 2);
    assert!(graph.block(&g).is_none());
    assert_eq!(graph.connectors().len(), 1);
    assert_eq!(graph.connectors()[0].uid, kept);
    assert!(graph.check_consistency().is_ok());
}

#[test]
fn test_loaded_graph_opens_in_editor() {
    let fixture = build_graph();
    let json = document_with(fixture.graph).save().unwrap();
    let (types, blocks) = registries(Vec::new());
    let mut loaded = Document::load(&json, &blocks).unwrap();
    let graph = loaded.remove_graph("main").unwrap();
    let wires: Vec<Uuid> = graph.connectors().iter().map(|c| c.uid).collect();

    let mut editor = Editor::new(types, blocks, EditorConfig::default());
    assert!(editor.open_graph(graph).is_none());
    editor.tick();
    assert_eq!(editor.find_block_at(Vector2::new(10.0, 10.0)), Some(fixture.source));
    for wire in &wires {
        assert!(editor.connector_endpoints(wire).is_some());
    }
    let region = editor.blocks_region(&editor.graph().unwrap().block_uids()).unwrap();
    assert!(region.contains_point(Vector2::new(0.0, 0.0)));
}

#[test]
fn test_file_round_trip() {
    let fixture = build_graph();
    let document = document_with(fixture.graph);
    let path = std::env::temp_dir().join(format!("blueprint-{}.json", Uuid::new_v4()));

    document.save_to_file(&path).unwrap();
    let (_, blocks) = registries(Vec::new());
    let loaded = Document::load_from_file(&path, &blocks).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(loaded.name, "doc");
    assert_eq!(loaded.save().unwrap(), document.save().unwrap());
}

#[test]
fn test_missing_file_is_an_io_error() {
    let path = std::env::temp_dir().join(format!("blueprint-missing-{}.json", Uuid::new_v4()));
    let (_, blocks) = registries(Vec::new());
    assert!(matches!(
        Document::load_from_file(&path, &blocks),
        Err(EditorError::Io(_))
    ));
}

#[test]
fn test_convert_through_any_row_keeps_port_types() {
    let callback = BlockDefinition::new("FN_OUT", "Callback source")
        .with_port(PortDefinition::output("OUT", ParamType::new(BaseType::Function)));
    let mut editor = setup_editor_with(vec![callback]);
    let source = add(&mut editor, "FN_OUT", 0.0, 0.0);
    let sink = add(&mut editor, STR_IN, 400.0, 200.0);

    let outcome = editor.connect_checked(&port(source, "OUT"), &port(sink, "IN")).unwrap();
    let ConnectOutcome::Converted { block: convert, .. } = outcome else {
        panic!("expected a converter, got {:?}", outcome);
    };
    let input_type = |graph: &Graph| {
        graph
            .block(&convert)
            .unwrap()
            .port(CONVERT_INPUT)
            .unwrap()
            .param_type()
            .base_type
    };
    assert_eq!(input_type(editor.graph().unwrap()), BaseType::Function);

    let json = document_with(editor.close_graph().unwrap()).save().unwrap();
    let (_, blocks) = registries(vec![BlockDefinition::new("FN_OUT", "Callback source")
        .with_port(PortDefinition::output("OUT", ParamType::new(BaseType::Function)))]);
    let loaded = Document::load(&json, &blocks).unwrap();
    let graph = loaded.graph_by_name("main").unwrap();
    assert_eq!(input_type(graph), BaseType::Function);
    assert_eq!(
        graph.block(&convert).unwrap().port(CONVERT_OUTPUT).unwrap().param_type().base_type,
        BaseType::String
    );
    assert_eq!(graph.connectors().len(), 2);
    assert!(graph.check_consistency().is_ok());
}
