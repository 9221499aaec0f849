pub mod block_registry;
pub mod builtin;
pub mod type_registry;

pub use block_registry::{BaseBlockRole, BlockPackage, BlockRegistry, CategoryNode};
pub use type_registry::{CustomTypeDefinition, EnumValue, TypeConverter, TypeRegistry};
