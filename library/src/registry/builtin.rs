//! The built-in `Base` package: base converters, the script entry block, the
//! comment block and the hidden `Convert` block.

use std::sync::Arc;

use crate::model::block::{Block, BlockDefinition, BlockEvents};
use crate::model::param_type::{BaseType, ContainerKind, ParamType};
use crate::model::port::PortDefinition;
use crate::registry::block_registry::{BaseBlockRole, BlockPackage, BlockRegistry};
use crate::registry::type_registry::{CustomTypeDefinition, TypeConverter, TypeRegistry};

pub const ENTRY_BLOCK_GUID: &str = "00000000-0000-0000-0000-000000000001";
pub const COMMENT_BLOCK_GUID: &str = "43608F6C-666A-AAB6-D052-694DD7001B5B";
pub const CONVERT_BLOCK_GUID: &str = "73929771-B979-C45F-141E-1A906958CB1A";

pub const CONVERT_INPUT: &str = "INPUT";
pub const CONVERT_OUTPUT: &str = "OUTPUT";
/// Option keys holding the serialized source and target types of a
/// `Convert` block.
pub const CONVERT_FROM_OPTION: &str = "converter_from";
pub const CONVERT_TO_OPTION: &str = "converter_to";

pub struct BasePackage;

impl BlockPackage for BasePackage {
    fn package_name(&self) -> &str {
        "Base"
    }

    fn version(&self) -> u32 {
        1
    }

    fn register(&self, types: &mut TypeRegistry) -> Vec<BlockDefinition> {
        register_base_converters(types);
        types.register_custom_type(CustomTypeDefinition::enumeration(
            "DebugLogLevel",
            &["log", "info", "warn", "error"],
            "rgb(112,30,112)",
        ));

        vec![
            BlockDefinition::new(ENTRY_BLOCK_GUID, "Script entry")
                .with_category("Base/Script")
                .with_description("Execution starts here.")
                .with_port(PortDefinition::output("ENTRY", ParamType::execute()).with_name("Entry"))
                .with_port(
                    PortDefinition::output(
                        "ARGS",
                        ParamType::new(BaseType::String).with_container(ContainerKind::Array),
                    )
                    .with_name("Arguments"),
                )
                .one_only()
                .undeletable(),
            BlockDefinition::new(COMMENT_BLOCK_GUID, "Comment")
                .with_category("Base")
                .with_description("A free text note on the canvas."),
            BlockDefinition::new(CONVERT_BLOCK_GUID, "Convert")
                .with_category("Base")
                .with_description("Converts a value from one type to another.")
                .with_port(
                    PortDefinition::input(CONVERT_INPUT, ParamType::any())
                        .with_name("Input")
                        .default_connect(),
                )
                .with_port(PortDefinition::output(CONVERT_OUTPUT, ParamType::any()).with_name("Output"))
                .with_events(BlockEvents {
                    on_create: Some(Arc::new(restore_convert_types)),
                    ..Default::default()
                })
                .hidden(),
        ]
    }
}

/// A loaded `Convert` block gets its port types back from its options.
fn restore_convert_types(block: &mut Block) {
    for (option, port) in [(CONVERT_FROM_OPTION, CONVERT_INPUT), (CONVERT_TO_OPTION, CONVERT_OUTPUT)] {
        let Some(value) = block.options.get(option) else {
            continue;
        };
        if let Ok(param_type) = serde_json::from_value::<ParamType>(value.clone()) {
            block.change_port_type(port, &param_type, true, true);
        }
    }
}

fn register_base_converters(types: &mut TypeRegistry) {
    let string = ParamType::new(BaseType::String);
    for from in [BaseType::Number, BaseType::Bigint, BaseType::Boolean, BaseType::Object] {
        types.register_converter(TypeConverter::new(ParamType::new(from), string.clone()));
    }
    types.register_converter(TypeConverter::new(string.clone(), ParamType::new(BaseType::Number)));
    types.register_converter(TypeConverter::new(string.clone(), ParamType::new(BaseType::Boolean)));
    types.register_converter(TypeConverter::new(ParamType::any(), string));
}

/// Registers the `Base` package and its block roles.
pub fn register_builtin(blocks: &mut BlockRegistry, types: &mut TypeRegistry) {
    blocks.register_package(Arc::new(BasePackage), types);
    blocks.set_base_block(BaseBlockRole::Entry, ENTRY_BLOCK_GUID);
    blocks.set_base_block(BaseBlockRole::Comment, COMMENT_BLOCK_GUID);
    blocks.set_base_block(BaseBlockRole::Convert, CONVERT_BLOCK_GUID);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registration() {
        let mut blocks = BlockRegistry::new();
        let mut types = TypeRegistry::new();
        register_builtin(&mut blocks, &mut types);

        let convert = blocks.base_block(BaseBlockRole::Convert).unwrap();
        assert!(convert.hide_in_add_panel);
        assert!(convert.ports[0].default_connect_port);
        let entry = blocks.base_block(BaseBlockRole::Entry).unwrap();
        assert!(entry.one_block_only && entry.can_not_delete);

        let string = ParamType::new(BaseType::String);
        assert!(types.converter(&ParamType::new(BaseType::Number), &string).is_some());
        assert!(types.converter(&string, &ParamType::new(BaseType::Boolean)).is_some());
        // function has no row of its own and goes through any -> string
        assert!(types.converter(&ParamType::new(BaseType::Function), &string).is_some());
        assert!(types.converter(&string, &ParamType::new(BaseType::Bigint)).is_none());
    }
}
