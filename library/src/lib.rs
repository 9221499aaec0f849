pub mod config;
pub mod editor;
pub mod error;
pub mod model;
pub mod registry;
pub mod spatial;
pub mod util;

use log::info;
use std::path::Path;
use std::sync::Arc;

pub use config::EditorConfig;
pub use editor::Editor;
pub use error::EditorError;
pub use model::document::Document;

use model::graph::Graph;
use registry::block_registry::BlockRegistry;
use registry::builtin::register_builtin;
use registry::type_registry::TypeRegistry;

/// Type and block registries with the built-in package registered.
pub fn create_registries() -> (Arc<TypeRegistry>, Arc<BlockRegistry>) {
    let mut types = TypeRegistry::new();
    let mut blocks = BlockRegistry::new();
    register_builtin(&mut blocks, &mut types);
    (Arc::new(types), Arc::new(blocks))
}

/// Entry point of `blueprint-inspect`: loads a document and prints a
/// summary of each graph.
///
/// Usage: `blueprint-inspect <document.json> [editor.toml]`
pub fn run(args: Vec<String>) -> Result<(), EditorError> {
    let Some(path) = args.get(1) else {
        return Err(EditorError::InvalidArgument(
            "usage: blueprint-inspect <document.json> [editor.toml]".to_string(),
        ));
    };
    let config = args
        .get(2)
        .map(|p| EditorConfig::load_or_default(Path::new(p)))
        .unwrap_or_default();

    let (types, blocks) = create_registries();
    let document = Document::load_from_file(Path::new(path), &blocks)?;
    println!("{} ({} graphs)", document.name, document.graphs.len());

    let mut editor = Editor::new(types, blocks, config);
    for graph in document.graphs {
        println!("{}", summarize_graph(&graph));
        if let Err(e) = graph.check_consistency() {
            println!("  inconsistent: {}", e);
        }
        editor.open_graph(graph);
        editor.tick();
        info!("Indexed {} instances", editor.panel().len());
        if let Some(region) = editor.graph().and_then(|g| editor.blocks_region(&g.block_uids())) {
            println!("  region {}", region);
        }
    }
    Ok(())
}

fn summarize_graph(graph: &Graph) -> String {
    let mut types: Vec<&str> = graph.blocks().map(|b| b.name()).collect();
    types.sort_unstable();
    types.dedup();
    format!(
        "- {} [{:?}]: {} blocks, {} wires, types: {}",
        graph.name,
        graph.kind,
        graph.block_count(),
        graph.connectors().len(),
        types.join(", ")
    )
}
