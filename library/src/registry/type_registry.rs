//! Custom types, enum types and type converters.

use log::{debug, warn};
use serde_json::Value;
use std::collections::HashMap;

use crate::model::param_type::{BaseType, ContainerKind, ParamType};

/// One allowed value of an enum type.
#[derive(Clone, Debug, PartialEq)]
pub struct EnumValue {
    pub value: String,
    pub description: String,
}

impl EnumValue {
    pub fn new(value: &str) -> Self {
        Self {
            value: value.to_string(),
            description: String::new(),
        }
    }
}

/// A registered custom or enum type.
#[derive(Clone, Debug, PartialEq)]
pub struct CustomTypeDefinition {
    pub name: String,
    /// `Enum` or `Custom`, or a builtin base the type specializes.
    pub prototype: BaseType,
    pub color: String,
    /// User-facing name. Falls back to `name` when empty.
    pub display_name: String,
    pub enum_values: Vec<EnumValue>,
    /// Enum types get a `string -> enum` converter on registration.
    pub auto_create_enum_converter: bool,
    /// Values can be hashed, so the type may key a dictionary.
    pub hashable: bool,
    pub default_value: Option<Value>,
}

impl CustomTypeDefinition {
    pub fn custom(name: &str, color: &str) -> Self {
        Self {
            name: name.to_string(),
            prototype: BaseType::Custom,
            color: color.to_string(),
            display_name: String::new(),
            enum_values: Vec::new(),
            auto_create_enum_converter: false,
            hashable: false,
            default_value: None,
        }
    }

    pub fn enumeration(name: &str, values: &[&str], color: &str) -> Self {
        Self {
            prototype: BaseType::Enum,
            enum_values: values.iter().map(|v| EnumValue::new(v)).collect(),
            auto_create_enum_converter: true,
            hashable: true,
            default_value: values.first().map(|v| Value::String(v.to_string())),
            ..Self::custom(name, color)
        }
    }

    pub fn with_display_name(mut self, display_name: &str) -> Self {
        self.display_name = display_name.to_string();
        self
    }

    pub fn param_type(&self) -> ParamType {
        ParamType::custom(self.prototype, &self.name)
    }
}

/// A registered conversion between two types, for one container kind.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeConverter {
    pub from: ParamType,
    pub to: ParamType,
    pub container: ContainerKind,
}

impl TypeConverter {
    pub fn new(from: ParamType, to: ParamType) -> Self {
        Self {
            from,
            to,
            container: ContainerKind::Variable,
        }
    }

    pub fn with_container(mut self, container: ContainerKind) -> Self {
        self.container = container;
        self
    }
}

const ANY_ROW: &str = "any";
const DEFAULT_COLOR: &str = "rgb(250,250,250)";

#[derive(Clone, Debug, Default)]
pub struct TypeRegistry {
    custom_types: HashMap<String, CustomTypeDefinition>,
    /// from type name -> (to type name -> converter)
    converters: HashMap<String, HashMap<String, TypeConverter>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // --- custom types ---

    /// Registers a custom type. A name already taken logs a warning and
    /// returns the earlier definition.
    pub fn register_custom_type(&mut self, def: CustomTypeDefinition) -> &CustomTypeDefinition {
        if self.custom_types.contains_key(&def.name) {
            warn!("Type {} already registered", def.name);
        } else {
            debug!("Registering custom type {}", def.name);
            if def.prototype == BaseType::Enum && def.auto_create_enum_converter {
                self.register_converter(TypeConverter::new(
                    ParamType::new(BaseType::String),
                    def.param_type(),
                ));
            }
            self.custom_types.insert(def.name.clone(), def.clone());
        }
        &self.custom_types[&def.name]
    }

    pub fn unregister_custom_type(&mut self, name: &str) -> Option<CustomTypeDefinition> {
        let removed = self.custom_types.remove(name);
        if removed.is_none() {
            warn!("Type {} is not registered", name);
        }
        removed
    }

    pub fn custom_type(&self, name: &str) -> Option<&CustomTypeDefinition> {
        self.custom_types.get(name)
    }

    pub fn custom_types(&self) -> impl Iterator<Item = &CustomTypeDefinition> {
        self.custom_types.values()
    }

    /// Base type for a type name: itself for builtins, the prototype for
    /// registered types, `Any` for unknown names.
    pub fn base_type_for(&self, name: &str) -> BaseType {
        if BaseType::is_builtin(name) {
            if let Some(base) = BaseType::from_name(name) {
                return base;
            }
        }
        self.custom_types
            .get(name)
            .map(|t| t.prototype)
            .unwrap_or(BaseType::Any)
    }

    /// Builds a variable `ParamType` from a builtin or registered name.
    pub fn resolve(&self, name: &str) -> ParamType {
        let base = self.base_type_for(name);
        if BaseType::is_builtin(name) {
            ParamType::new(base)
        } else if self.custom_types.contains_key(name) {
            ParamType::custom(base, name)
        } else {
            ParamType::any()
        }
    }

    // --- converters ---

    pub fn register_converter(&mut self, converter: TypeConverter) {
        let from = converter.from.type_name().to_string();
        let to = converter.to.type_name().to_string();
        debug!("Registering converter {} -> {}", from, to);
        self.converters.entry(from).or_default().insert(to, converter);
    }

    pub fn unregister_converter(&mut self, from: &ParamType, to: &ParamType) -> Option<TypeConverter> {
        self.converters
            .get_mut(from.type_name())
            .and_then(|row| row.remove(to.type_name()))
    }

    /// Converter from `from` to `to`. Falls back to the `any` source row,
    /// and requires both types to use the converter's container kind.
    pub fn converter(&self, from: &ParamType, to: &ParamType) -> Option<&TypeConverter> {
        let lookup = |row: &str| {
            self.converters
                .get(row)
                .and_then(|targets| targets.get(to.type_name()))
        };
        let converter = lookup(from.type_name()).or_else(|| lookup(ANY_ROW))?;
        (converter.container == from.container && converter.container == to.container)
            .then_some(converter)
    }

    // --- type information ---

    pub fn can_be_dictionary_key(&self, param_type: &ParamType) -> bool {
        match param_type.base_type {
            BaseType::Any | BaseType::Number | BaseType::Bigint | BaseType::Enum | BaseType::String => true,
            BaseType::Custom => self
                .custom_types
                .get(&param_type.custom_type)
                .is_some_and(|t| t.hashable),
            _ => false,
        }
    }

    pub fn type_color(&self, param_type: &ParamType) -> String {
        let color = match param_type.base_type {
            BaseType::Execute => "rgb(246,246,246)",
            BaseType::Boolean => "rgb(180,0,0)",
            BaseType::Bigint => "rgb(0,168,243)",
            BaseType::Number => "rgb(158,250,68)",
            BaseType::String => "rgb(255,20,147)",
            BaseType::Function => "rgb(247,196,33)",
            BaseType::Object => "rgb(0,160,232)",
            BaseType::Any => DEFAULT_COLOR,
            BaseType::Enum | BaseType::Custom => {
                return self
                    .custom_types
                    .get(&param_type.custom_type)
                    .map(|t| t.color.clone())
                    .unwrap_or_else(|| DEFAULT_COLOR.to_string());
            }
        };
        color.to_string()
    }

    /// Value a fresh port of this type starts with.
    pub fn default_value(&self, param_type: &ParamType) -> Option<Value> {
        if param_type.container != ContainerKind::Variable {
            return match param_type.container {
                ContainerKind::Dictionary => Some(Value::Object(Default::default())),
                _ => Some(Value::Array(Vec::new())),
            };
        }
        match param_type.base_type {
            BaseType::Execute => None,
            BaseType::Boolean => Some(Value::Bool(false)),
            BaseType::Bigint | BaseType::Number => Some(Value::from(0)),
            BaseType::String => Some(Value::String(String::new())),
            _ => self
                .custom_types
                .get(&param_type.custom_type)
                .and_then(|t| t.default_value.clone()),
        }
    }

    /// User-facing name of a single type, ignoring its container.
    pub fn type_display_name(&self, param_type: &ParamType) -> String {
        match param_type.base_type {
            BaseType::Execute => "Execute".to_string(),
            BaseType::Any => "Any".to_string(),
            BaseType::Boolean => "Boolean".to_string(),
            BaseType::Bigint => "BigInt".to_string(),
            BaseType::Number => "Number".to_string(),
            BaseType::String => "String".to_string(),
            BaseType::Function => "Function".to_string(),
            BaseType::Object => "Object".to_string(),
            BaseType::Enum | BaseType::Custom => match self.custom_types.get(&param_type.custom_type) {
                Some(t) if !t.display_name.is_empty() => t.display_name.clone(),
                _ if !param_type.custom_type.is_empty() => param_type.custom_type.clone(),
                _ if param_type.base_type == BaseType::Enum => "Enum".to_string(),
                _ => "Custom".to_string(),
            },
        }
    }

    /// User-facing name including the container, e.g. `Number Array` or
    /// `Map of String to Number`.
    pub fn display_name(&self, param_type: &ParamType) -> String {
        let name = self.type_display_name(param_type);
        match param_type.container {
            ContainerKind::Variable => name,
            ContainerKind::Array => format!("{} Array", name),
            ContainerKind::Set => format!("{} Set", name),
            ContainerKind::Dictionary => {
                let key = param_type
                    .dictionary_key
                    .as_ref()
                    .map(|k| self.type_display_name(k))
                    .unwrap_or_else(|| "Unknown".to_string());
                format!("Map of {} to {}", key, name)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number() -> ParamType {
        ParamType::new(BaseType::Number)
    }

    fn string() -> ParamType {
        ParamType::new(BaseType::String)
    }

    #[test]
    fn test_converter_lookup_and_any_fallback() {
        let mut reg = TypeRegistry::new();
        reg.register_converter(TypeConverter::new(number(), string()));
        reg.register_converter(TypeConverter::new(ParamType::any(), string()));
        assert!(reg.converter(&number(), &string()).is_some());
        // no boolean row, falls back to any -> string
        let fallback = reg.converter(&ParamType::new(BaseType::Boolean), &string()).unwrap();
        assert!(fallback.from.is_any());
        assert!(reg.converter(&string(), &number()).is_none());
    }

    #[test]
    fn test_converter_requires_container() {
        let mut reg = TypeRegistry::new();
        reg.register_converter(TypeConverter::new(number(), string()));
        let arr = number().with_container(ContainerKind::Array);
        let arr_s = string().with_container(ContainerKind::Array);
        assert!(reg.converter(&arr, &arr_s).is_none());
    }

    #[test]
    fn test_unregister_converter() {
        let mut reg = TypeRegistry::new();
        reg.register_converter(TypeConverter::new(number(), string()));
        assert!(reg.unregister_converter(&number(), &string()).is_some());
        assert!(reg.converter(&number(), &string()).is_none());
        assert!(reg.unregister_converter(&number(), &string()).is_none());
    }

    #[test]
    fn test_enum_registers_string_converter() {
        let mut reg = TypeRegistry::new();
        reg.register_custom_type(CustomTypeDefinition::enumeration(
            "LogLevel",
            &["log", "info", "warn", "error"],
            "rgb(0,0,255)",
        ));
        let level = reg.resolve("LogLevel");
        assert_eq!(level, ParamType::custom(BaseType::Enum, "LogLevel"));
        assert!(reg.converter(&string(), &level).is_some());
        assert_eq!(reg.default_value(&level), Some(Value::String("log".into())));
        assert!(reg.can_be_dictionary_key(&level));
        assert_eq!(reg.type_color(&level), "rgb(0,0,255)");
    }

    #[test]
    fn test_duplicate_custom_type_keeps_first() {
        let mut reg = TypeRegistry::new();
        reg.register_custom_type(CustomTypeDefinition::custom("Vec3", "red"));
        let kept = reg.register_custom_type(CustomTypeDefinition::custom("Vec3", "blue"));
        assert_eq!(kept.color, "red");
        assert!(reg.unregister_custom_type("Vec3").is_some());
        assert!(reg.unregister_custom_type("Vec3").is_none());
        assert_eq!(reg.base_type_for("Vec3"), BaseType::Any);
    }

    #[test]
    fn test_display_names() {
        let mut reg = TypeRegistry::new();
        reg.register_custom_type(CustomTypeDefinition::custom("Vec3", "red").with_display_name("Vector 3"));
        assert_eq!(reg.display_name(&number()), "Number");
        assert_eq!(
            reg.display_name(&string().with_container(ContainerKind::Array)),
            "String Array"
        );
        assert_eq!(
            reg.display_name(&number().with_dictionary_key(string())),
            "Map of String to Number"
        );
        assert_eq!(reg.display_name(&reg.resolve("Vec3")), "Vector 3");
    }

    #[test]
    fn test_default_values() {
        let reg = TypeRegistry::new();
        assert_eq!(reg.default_value(&ParamType::execute()), None);
        assert_eq!(reg.default_value(&number()), Some(Value::from(0)));
        assert_eq!(
            reg.default_value(&number().with_container(ContainerKind::Set)),
            Some(Value::Array(vec![]))
        );
        assert!(!reg.can_be_dictionary_key(&ParamType::new(BaseType::Object)));
    }
}
