//! Port parameter types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Base family of a port type.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BaseType {
    /// Control flow
    Execute,
    Bigint,
    Number,
    String,
    Boolean,
    Function,
    Object,
    /// Wildcard, matches every data type
    Any,
    /// Named enum registered in the type registry
    Enum,
    /// Named custom type registered in the type registry
    Custom,
}

impl BaseType {
    /// Types that exist without registration.
    pub const BUILTIN: [BaseType; 8] = [
        BaseType::Execute,
        BaseType::Boolean,
        BaseType::Bigint,
        BaseType::Number,
        BaseType::String,
        BaseType::Function,
        BaseType::Object,
        BaseType::Any,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BaseType::Execute => "execute",
            BaseType::Bigint => "bigint",
            BaseType::Number => "number",
            BaseType::String => "string",
            BaseType::Boolean => "boolean",
            BaseType::Function => "function",
            BaseType::Object => "object",
            BaseType::Any => "any",
            BaseType::Enum => "enum",
            BaseType::Custom => "custom",
        }
    }

    pub fn from_name(name: &str) -> Option<BaseType> {
        match name {
            "execute" => Some(BaseType::Execute),
            "bigint" => Some(BaseType::Bigint),
            "number" => Some(BaseType::Number),
            "string" => Some(BaseType::String),
            "boolean" => Some(BaseType::Boolean),
            "function" => Some(BaseType::Function),
            "object" => Some(BaseType::Object),
            "any" => Some(BaseType::Any),
            "enum" => Some(BaseType::Enum),
            "custom" => Some(BaseType::Custom),
            _ => None,
        }
    }

    pub fn is_builtin(name: &str) -> bool {
        BaseType::BUILTIN.iter().any(|t| t.name() == name)
    }
}

/// How many values of the type a port carries.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    #[default]
    Variable,
    Array,
    Set,
    Dictionary,
}

impl ContainerKind {
    pub fn name(&self) -> &'static str {
        match self {
            ContainerKind::Variable => "variable",
            ContainerKind::Array => "array",
            ContainerKind::Set => "set",
            ContainerKind::Dictionary => "dictionary",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ParamType {
    pub base_type: BaseType,
    /// Registered name for `Enum`/`Custom`, empty otherwise.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub custom_type: String,
    #[serde(default)]
    pub container: ContainerKind,
    /// Key type when `container` is `Dictionary`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dictionary_key: Option<Box<ParamType>>,
}

impl Default for ParamType {
    fn default() -> Self {
        ParamType::any()
    }
}

impl ParamType {
    pub fn new(base_type: BaseType) -> Self {
        Self {
            base_type,
            custom_type: String::new(),
            container: ContainerKind::Variable,
            dictionary_key: None,
        }
    }

    pub fn any() -> Self {
        Self::new(BaseType::Any)
    }

    pub fn execute() -> Self {
        Self::new(BaseType::Execute)
    }

    /// A registered custom or enum type.
    pub fn custom(base_type: BaseType, name: &str) -> Self {
        Self {
            custom_type: name.to_string(),
            ..Self::new(base_type)
        }
    }

    pub fn with_container(mut self, container: ContainerKind) -> Self {
        self.container = container;
        if container != ContainerKind::Dictionary {
            self.dictionary_key = None;
        }
        self
    }

    /// Turns the type into a dictionary keyed by `key`.
    pub fn with_dictionary_key(mut self, key: ParamType) -> Self {
        self.container = ContainerKind::Dictionary;
        self.dictionary_key = Some(Box::new(key));
        self
    }

    pub fn is_execute(&self) -> bool {
        self.base_type == BaseType::Execute
    }

    pub fn is_any(&self) -> bool {
        self.base_type == BaseType::Any
    }

    pub fn is_custom(&self) -> bool {
        matches!(self.base_type, BaseType::Custom | BaseType::Enum)
    }

    pub fn is_dictionary(&self) -> bool {
        self.container == ContainerKind::Dictionary
    }

    /// The name types are registered and looked up under: the custom name
    /// for custom/enum types, the base name otherwise.
    pub fn type_name(&self) -> &str {
        if self.is_custom() {
            &self.custom_type
        } else {
            self.base_type.name()
        }
    }

    /// Same base and custom type, container compared only when asked.
    pub fn equals(&self, other: &ParamType, compare_container: bool) -> bool {
        self.base_type == other.base_type
            && self.custom_type == other.custom_type
            && (!compare_container || self.container == other.container)
    }

    /// Whether a value of type `source` may flow into a port of this type
    /// without conversion.
    ///
    /// Execute only pairs with execute. `any` pairs with every data type.
    /// Otherwise the containers must match, and for dictionaries the key
    /// and value types must each match or be `any`.
    pub fn accepts(&self, source: &ParamType) -> bool {
        if self.is_execute() || source.is_execute() {
            return self.is_execute() && source.is_execute();
        }
        if self.is_any() || source.is_any() {
            return true;
        }
        if self.container != source.container {
            return false;
        }
        if self.is_dictionary() {
            let keys_match = match (&self.dictionary_key, &source.dictionary_key) {
                (Some(a), Some(b)) => a.is_any() || b.is_any() || a.equals(b, false),
                // an unspecified key behaves like `any`
                _ => true,
            };
            return keys_match && self.equals(source, false);
        }
        self.equals(source, true)
    }
}

impl PartialEq for ParamType {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other, true)
            && match (&self.dictionary_key, &other.dictionary_key) {
                (Some(a), Some(b)) => a == b,
                (None, None) => true,
                _ => false,
            }
    }
}

impl Eq for ParamType {}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.container {
            ContainerKind::Variable => write!(f, "{}", self.type_name()),
            ContainerKind::Array => write!(f, "array<{}>", self.type_name()),
            ContainerKind::Set => write!(f, "set<{}>", self.type_name()),
            ContainerKind::Dictionary => match &self.dictionary_key {
                Some(key) => write!(f, "dictionary<{},{}>", key, self.type_name()),
                None => write!(f, "dictionary<?,{}>", self.type_name()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execute_only_accepts_execute() {
        let exec = ParamType::execute();
        assert!(exec.accepts(&ParamType::execute()));
        assert!(!exec.accepts(&ParamType::new(BaseType::Number)));
        assert!(!exec.accepts(&ParamType::any()));
        assert!(!ParamType::any().accepts(&exec));
    }

    #[test]
    fn test_any_accepts_data() {
        let number = ParamType::new(BaseType::Number);
        assert!(ParamType::any().accepts(&number));
        assert!(number.accepts(&ParamType::any()));
        let arr = ParamType::new(BaseType::String).with_container(ContainerKind::Array);
        assert!(ParamType::any().accepts(&arr));
    }

    #[test]
    fn test_container_mismatch_rejected() {
        let a = ParamType::new(BaseType::Number).with_container(ContainerKind::Array);
        let b = ParamType::new(BaseType::Number);
        assert!(!a.accepts(&b));
        assert!(a.equals(&b, false));
    }

    #[test]
    fn test_distinct_types_rejected() {
        let number = ParamType::new(BaseType::Number);
        let string = ParamType::new(BaseType::String);
        assert!(!string.accepts(&number));
        assert!(number.accepts(&ParamType::new(BaseType::Number)));
    }

    #[test]
    fn test_dictionary_keys_and_values() {
        let string = ParamType::new(BaseType::String);
        let number = ParamType::new(BaseType::Number);
        let dict = number.clone().with_dictionary_key(string.clone());
        let any_key = number.clone().with_dictionary_key(ParamType::any());
        let number_key = number.clone().with_dictionary_key(number.clone());
        let string_values = string.clone().with_dictionary_key(string.clone());

        assert!(dict.accepts(&dict.clone()));
        assert!(dict.accepts(&any_key));
        assert!(!dict.accepts(&number_key));
        assert!(!dict.accepts(&string_values));
    }

    #[test]
    fn test_custom_types_compare_by_name() {
        let a = ParamType::custom(BaseType::Enum, "LogLevel");
        let b = ParamType::custom(BaseType::Enum, "Color");
        assert!(!a.accepts(&b));
        assert!(a.accepts(&ParamType::custom(BaseType::Enum, "LogLevel")));
        assert_eq!(a.type_name(), "LogLevel");
    }

    #[test]
    fn test_display() {
        let dict = ParamType::new(BaseType::Number).with_dictionary_key(ParamType::new(BaseType::String));
        assert_eq!(dict.to_string(), "dictionary<string,number>");
        let arr = ParamType::new(BaseType::Boolean).with_container(ContainerKind::Array);
        assert_eq!(arr.to_string(), "array<boolean>");
    }
}
