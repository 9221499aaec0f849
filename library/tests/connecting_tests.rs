//! Integration tests for the wire-dragging gesture.

mod common;

use blueprint::editor::{ConnectOutcome, ConnectState, EditorRequest, Modifiers, MouseButton};
use blueprint::model::math::Vector2;
use blueprint::model::param_type::{BaseType, ParamType};
use blueprint::model::port::{PortDirection, PortState};

use common::*;

#[test]
fn test_drag_to_compatible_port_commits() {
    let mut editor = setup_editor();
    let a = add(&mut editor, NUM_OUT, 0.0, 0.0);
    let b = add(&mut editor, NUM_IN, 300.0, 0.0);

    assert!(editor.start_connect(&port(a, "OUT")));
    assert_eq!(editor.connecting_info().state(), ConnectState::Dragging);
    assert_eq!(
        editor.graph().unwrap().port(&port(a, "OUT")).unwrap().state,
        PortState::Active
    );

    editor.update_hover_port(Some(port(b, "IN")));
    assert_eq!(editor.connecting_info().state(), ConnectState::Hovering);
    assert_eq!(
        editor.graph().unwrap().port(&port(b, "IN")).unwrap().state,
        PortState::Success
    );

    let outcome = editor.end_connect();
    assert!(matches!(outcome, Some(ConnectOutcome::Connected(_))));
    assert_eq!(editor.connecting_info().state(), ConnectState::Idle);
    assert_eq!(wire_count(&editor), 1);
}

#[test]
fn test_drag_to_incompatible_port_cancels() {
    let mut editor = setup_editor();
    let a = add(&mut editor, FLOW, 0.0, 0.0);
    let b = add(&mut editor, NUM_IN, 300.0, 0.0);

    editor.start_connect(&port(a, "EXEC_OUT"));
    editor.update_hover_port(Some(port(b, "IN")));
    assert_eq!(
        editor.graph().unwrap().port(&port(b, "IN")).unwrap().state,
        PortState::Error
    );
    let check = editor.connecting_info().check.clone().unwrap();
    assert!(!check.allowed);

    assert!(editor.end_connect().is_none());
    let graph = editor.graph().unwrap();
    assert_eq!(graph.port(&port(a, "EXEC_OUT")).unwrap().state, PortState::Normal);
    assert_eq!(graph.port(&port(b, "IN")).unwrap().state, PortState::Normal);
    assert_eq!(wire_count(&editor), 0);
}

#[test]
fn test_leaving_a_port_restores_its_state() {
    let mut editor = setup_editor();
    let a = add(&mut editor, NUM_OUT, 0.0, 0.0);
    let b = add(&mut editor, NUM_IN, 300.0, 0.0);

    editor.start_connect(&port(a, "OUT"));
    editor.update_hover_port(Some(port(b, "IN")));
    editor.update_hover_port(None);
    assert_eq!(editor.connecting_info().state(), ConnectState::Dragging);
    assert!(editor.connecting_info().check.is_none());
    assert_eq!(
        editor.graph().unwrap().port(&port(b, "IN")).unwrap().state,
        PortState::Normal
    );

    editor.cancel_connect();
    assert_eq!(
        editor.graph().unwrap().port(&port(a, "OUT")).unwrap().state,
        PortState::Normal
    );
}

#[test]
fn test_release_on_canvas_connects_to_new_block() {
    let mut editor = setup_editor();
    let a = add(&mut editor, NUM_OUT, 0.0, 0.0);

    editor.start_connect(&port(a, "OUT"));
    editor.update_connect_end(Vector2::new(600.0, 300.0));
    assert!(editor.end_connect().is_none());
    assert_eq!(editor.connecting_info().state(), ConnectState::ConnectingToNew);
    assert_eq!(
        editor.take_requests(),
        vec![EditorRequest::ShowAddBlockPanel {
            position: Vector2::new(600.0, 300.0),
            filter: Some((ParamType::new(BaseType::Number), PortDirection::Input)),
        }]
    );

    let sink = editor.user_add_block(NUM_IN, None).unwrap();
    assert_eq!(editor.connecting_info().state(), ConnectState::Idle);
    let graph = editor.graph().unwrap();
    assert!(graph.find_connector(&port(a, "OUT"), &port(sink, "IN")).is_some());
    assert_close(
        editor.port_position(&port(sink, "IN")).unwrap(),
        Vector2::new(600.0, 300.0),
    );
}

#[test]
fn test_connect_to_new_can_be_abandoned() {
    let mut editor = setup_editor();
    let a = add(&mut editor, NUM_OUT, 0.0, 0.0);

    editor.start_connect(&port(a, "OUT"));
    editor.update_connect_end(Vector2::new(600.0, 300.0));
    editor.end_connect();
    assert!(editor.end_connect_to_new(None).is_none());
    assert_eq!(editor.connecting_info().state(), ConnectState::Idle);
    assert_eq!(
        editor.graph().unwrap().port(&port(a, "OUT")).unwrap().state,
        PortState::Normal
    );

    // a later add is placed normally and left unconnected
    editor.user_add_block(NUM_IN, Some(Vector2::new(900.0, 0.0))).unwrap();
    assert_eq!(wire_count(&editor), 0);
}

#[test]
fn test_press_elsewhere_abandons_connect_to_new() {
    let mut editor = setup_editor();
    let a = add(&mut editor, NUM_OUT, 0.0, 0.0);
    editor.start_connect(&port(a, "OUT"));
    editor.end_connect();
    editor.take_requests();

    editor.mouse_down(Vector2::new(1000.0, 1000.0), MouseButton::Left, Modifiers::default());
    assert_eq!(editor.connecting_info().state(), ConnectState::Idle);
    assert_eq!(editor.take_requests(), vec![EditorRequest::CloseAddBlockPanel]);
}

#[test]
fn test_mouse_drag_between_ports() {
    let mut editor = setup_editor();
    let a = add(&mut editor, NUM_OUT, 0.0, 0.0);
    let b = add(&mut editor, NUM_IN, 300.0, 0.0);

    editor.mouse_down(Vector2::new(149.0, 43.0), MouseButton::Left, Modifiers::default());
    assert_eq!(editor.connecting_info().start_port, Some(port(a, "OUT")));
    editor.mouse_move(Vector2::new(250.0, 40.0));
    assert_eq!(editor.connecting_info().state(), ConnectState::Dragging);
    editor.mouse_move(Vector2::new(302.0, 41.0));
    assert_eq!(editor.connecting_info().hover_port, Some(port(b, "IN")));
    editor.mouse_up(Vector2::new(302.0, 41.0));

    assert!(editor.graph().unwrap().find_connector(&port(a, "OUT"), &port(b, "IN")).is_some());
    assert_eq!(editor.connecting_info().state(), ConnectState::Idle);
}

#[test]
fn test_click_on_port_without_drag_cancels() {
    let mut editor = setup_editor();
    let a = add(&mut editor, NUM_OUT, 0.0, 0.0);
    let anchor = editor.port_position(&port(a, "OUT")).unwrap();

    editor.mouse_down(anchor, MouseButton::Left, Modifiers::default());
    assert_eq!(editor.connecting_info().state(), ConnectState::Dragging);
    editor.mouse_up(anchor);

    assert_eq!(editor.connecting_info().state(), ConnectState::Idle);
    assert!(!editor.connecting_info().is_connecting_to_new);
    assert!(editor.take_requests().is_empty());
    assert_eq!(
        editor.graph().unwrap().port(&port(a, "OUT")).unwrap().state,
        PortState::Normal
    );
    assert_eq!(wire_count(&editor), 0);
}

#[test]
fn test_drag_back_to_start_port_cancels() {
    let mut editor = setup_editor();
    let a = add(&mut editor, NUM_OUT, 0.0, 0.0);
    let anchor = editor.port_position(&port(a, "OUT")).unwrap();

    editor.mouse_down(anchor, MouseButton::Left, Modifiers::default());
    editor.mouse_move(Vector2::new(400.0, 300.0));
    assert_eq!(editor.connecting_info().state(), ConnectState::Dragging);
    editor.mouse_move(anchor);
    assert_eq!(editor.connecting_info().state(), ConnectState::Hovering);
    // the start port keeps its active state while hovered
    assert_eq!(
        editor.graph().unwrap().port(&port(a, "OUT")).unwrap().state,
        PortState::Active
    );
    editor.mouse_move(Vector2::new(400.0, 300.0));
    assert_eq!(
        editor.graph().unwrap().port(&port(a, "OUT")).unwrap().state,
        PortState::Active
    );
    editor.mouse_move(anchor);
    editor.mouse_up(anchor);

    assert_eq!(editor.connecting_info().state(), ConnectState::Idle);
    assert!(editor.take_requests().is_empty());
    assert_eq!(wire_count(&editor), 0);
}
