//! Block definitions, packages and the add-panel category tree.

use log::{info, warn};
use std::collections::HashMap;
use std::sync::Arc;

use crate::model::block::BlockDefinition;
use crate::model::param_type::ParamType;
use crate::model::port::PortDirection;
use crate::registry::type_registry::TypeRegistry;

/// A named group of block definitions registered together.
pub trait BlockPackage: Send + Sync {
    fn package_name(&self) -> &str;
    fn version(&self) -> u32;
    /// Registers the types and converters the package needs and returns its
    /// block definitions.
    fn register(&self, types: &mut TypeRegistry) -> Vec<BlockDefinition>;
}

/// Roles the editor looks blocks up by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BaseBlockRole {
    Entry,
    Comment,
    Convert,
}

/// A node of the category tree. The root has an empty name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CategoryNode {
    pub name: String,
    pub children: Vec<CategoryNode>,
    /// Guids of the blocks filed directly under this category.
    pub blocks: Vec<String>,
}

impl CategoryNode {
    fn child_mut(&mut self, name: &str) -> &mut CategoryNode {
        let index = match self.children.iter().position(|c| c.name == name) {
            Some(index) => index,
            None => {
                self.children.push(CategoryNode {
                    name: name.to_string(),
                    ..Default::default()
                });
                self.children.len() - 1
            }
        };
        &mut self.children[index]
    }

    /// Finds the node at a `/`-separated path.
    pub fn find(&self, path: &str) -> Option<&CategoryNode> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .try_fold(self, |node, part| node.children.iter().find(|c| c.name == part))
    }
}

struct PackageEntry {
    package: Arc<dyn BlockPackage>,
    guids: Vec<String>,
}

#[derive(Default)]
pub struct BlockRegistry {
    blocks: HashMap<String, Arc<BlockDefinition>>,
    /// Registration order, for stable listing.
    order: Vec<String>,
    packages: HashMap<String, PackageEntry>,
    roles: HashMap<BaseBlockRole, String>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one definition. A guid already taken logs a warning and
    /// keeps the first definition.
    pub fn register_block(&mut self, define: BlockDefinition) -> Arc<BlockDefinition> {
        if let Some(old) = self.blocks.get(&define.guid) {
            warn!("Block guid {} already registered", define.guid);
            return old.clone();
        }
        let define = Arc::new(define);
        self.order.push(define.guid.clone());
        self.blocks.insert(define.guid.clone(), define.clone());
        define
    }

    pub fn unregister_block(&mut self, guid: &str) -> Option<Arc<BlockDefinition>> {
        let removed = self.blocks.remove(guid);
        if removed.is_some() {
            self.order.retain(|g| g != guid);
            self.roles.retain(|_, g| g != guid);
        }
        removed
    }

    pub fn get(&self, guid: &str) -> Option<Arc<BlockDefinition>> {
        self.blocks.get(guid).cloned()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Definitions in registration order.
    pub fn definitions(&self) -> impl Iterator<Item = &Arc<BlockDefinition>> {
        self.order.iter().filter_map(|g| self.blocks.get(g))
    }

    pub fn register_package(&mut self, package: Arc<dyn BlockPackage>, types: &mut TypeRegistry) {
        let name = package.package_name().to_string();
        if self.packages.contains_key(&name) {
            warn!("Block package {} already registered", name);
            return;
        }
        let mut guids = Vec::new();
        for define in package.register(types) {
            guids.push(define.guid.clone());
            self.register_block(define);
        }
        info!(
            "Registered block package {} v{} ({} blocks)",
            name,
            package.version(),
            guids.len()
        );
        self.packages.insert(name, PackageEntry { package, guids });
    }

    pub fn unregister_package(&mut self, name: &str) {
        let Some(entry) = self.packages.remove(name) else {
            info!("Unregister block package {} failed: not registered", name);
            return;
        };
        for guid in &entry.guids {
            self.unregister_block(guid);
        }
        info!("Unregistered block package {}", name);
    }

    pub fn package(&self, name: &str) -> Option<Arc<dyn BlockPackage>> {
        self.packages.get(name).map(|e| e.package.clone())
    }

    // --- base blocks ---

    pub fn set_base_block(&mut self, role: BaseBlockRole, guid: &str) {
        self.roles.insert(role, guid.to_string());
    }

    pub fn base_block(&self, role: BaseBlockRole) -> Option<Arc<BlockDefinition>> {
        self.roles.get(&role).and_then(|guid| self.get(guid))
    }

    // --- add panel ---

    /// Category tree of the registered blocks. Hidden blocks are left out
    /// unless `include_hidden` is set.
    pub fn category_tree(&self, include_hidden: bool) -> CategoryNode {
        let mut root = CategoryNode::default();
        for define in self.definitions() {
            if define.hide_in_add_panel && !include_hidden {
                continue;
            }
            let mut node = &mut root;
            for part in define.category.split('/').filter(|s| !s.is_empty()) {
                node = node.child_mut(part);
            }
            node.blocks.push(define.guid.clone());
        }
        root
    }

    /// Blocks the user may add, optionally only those with a port able to
    /// take a wire of `param_type` in `direction`.
    pub fn addable_blocks(&self, filter: Option<(&ParamType, PortDirection)>) -> Vec<Arc<BlockDefinition>> {
        self.definitions()
            .filter(|d| !d.hide_in_add_panel)
            .filter(|d| filter.is_none_or(|(t, dir)| d.has_port_for(t, dir)))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::param_type::BaseType;
    use crate::model::port::PortDefinition;
    use crate::registry::type_registry::TypeConverter;

    struct MathPackage;

    impl BlockPackage for MathPackage {
        fn package_name(&self) -> &str {
            "Math"
        }

        fn version(&self) -> u32 {
            1
        }

        fn register(&self, types: &mut TypeRegistry) -> Vec<BlockDefinition> {
            types.register_converter(TypeConverter::new(
                ParamType::new(BaseType::Bigint),
                ParamType::new(BaseType::Number),
            ));
            vec![
                BlockDefinition::new("ADD", "Add")
                    .with_category("Math/Arithmetic")
                    .with_port(PortDefinition::input("A", ParamType::new(BaseType::Number)))
                    .with_port(PortDefinition::output("R", ParamType::new(BaseType::Number))),
                BlockDefinition::new("NOT", "Not")
                    .with_category("Math/Logic")
                    .with_port(PortDefinition::input("A", ParamType::new(BaseType::Boolean))),
                BlockDefinition::new("HIDDEN", "Hidden").with_category("Math").hidden(),
            ]
        }
    }

    #[test]
    fn test_package_register_and_unregister() {
        let mut types = TypeRegistry::new();
        let mut reg = BlockRegistry::new();
        reg.register_package(Arc::new(MathPackage), &mut types);
        assert_eq!(reg.len(), 3);
        assert!(reg.package("Math").is_some());
        assert!(types
            .converter(&ParamType::new(BaseType::Bigint), &ParamType::new(BaseType::Number))
            .is_some());

        reg.unregister_package("Math");
        assert!(reg.is_empty());
        assert!(reg.package("Math").is_none());
    }

    #[test]
    fn test_duplicate_guid_keeps_first() {
        let mut reg = BlockRegistry::new();
        reg.register_block(BlockDefinition::new("X", "First"));
        let kept = reg.register_block(BlockDefinition::new("X", "Second"));
        assert_eq!(kept.name, "First");
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_category_tree() {
        let mut types = TypeRegistry::new();
        let mut reg = BlockRegistry::new();
        reg.register_package(Arc::new(MathPackage), &mut types);
        let tree = reg.category_tree(false);
        assert_eq!(tree.children.len(), 1);
        let math = tree.find("Math").unwrap();
        assert_eq!(math.children.len(), 2);
        assert!(math.blocks.is_empty());
        assert_eq!(tree.find("Math/Arithmetic").unwrap().blocks, vec!["ADD".to_string()]);
        assert!(tree.find("Math/Nope").is_none());
        assert_eq!(reg.category_tree(true).find("Math").unwrap().blocks, vec!["HIDDEN".to_string()]);
    }

    #[test]
    fn test_addable_blocks_filter() {
        let mut types = TypeRegistry::new();
        let mut reg = BlockRegistry::new();
        reg.register_package(Arc::new(MathPackage), &mut types);
        assert_eq!(reg.addable_blocks(None).len(), 2);
        let number = ParamType::new(BaseType::Number);
        let takes_number: Vec<String> = reg
            .addable_blocks(Some((&number, PortDirection::Input)))
            .iter()
            .map(|d| d.guid.clone())
            .collect();
        assert_eq!(takes_number, vec!["ADD".to_string()]);
    }
}
