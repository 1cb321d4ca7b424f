//! Parameters — ordered name/value lists attached to devices, events, and actions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single named value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub value: Value,
}

impl Param {
    /// Create a new parameter.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl std::fmt::Display for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// Template describing one parameter a device class expects.
///
/// A `default` of `None` means the parameter is required but has no preset;
/// callers must always supply a value for every declared parameter either way
/// (type compatibility is not enforced).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamType {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParamType {
    /// Create a parameter template without a default value.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    /// Create a parameter template with a default value.
    #[must_use]
    pub fn with_default(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            default: Some(default.into()),
        }
    }
}

/// Look up a parameter value by name in an ordered parameter list.
#[must_use]
pub fn value_of<'a>(params: &'a [Param], name: &str) -> Option<&'a Value> {
    params.iter().find(|p| p.name == name).map(|p| &p.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_find_param_by_name() {
        let params = vec![Param::new("power", true), Param::new("brightness", 128)];
        assert_eq!(value_of(&params, "power"), Some(&Value::Bool(true)));
        assert_eq!(value_of(&params, "brightness"), Some(&Value::from(128)));
    }

    #[test]
    fn should_return_none_for_unknown_param_name() {
        let params = vec![Param::new("power", true)];
        assert_eq!(value_of(&params, "color"), None);
    }

    #[test]
    fn should_preserve_param_order_through_serde() {
        let params = vec![
            Param::new("b", 2),
            Param::new("a", 1),
            Param::new("c", 3),
        ];
        let json = serde_json::to_string(&params).unwrap();
        let parsed: Vec<Param> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, params);
    }

    #[test]
    fn should_display_param_as_name_value_pair() {
        let param = Param::new("power", true);
        assert_eq!(param.to_string(), "power=true");
    }

    #[test]
    fn should_roundtrip_param_type_with_default() {
        let pt = ParamType::with_default("interval", 15);
        let json = serde_json::to_string(&pt).unwrap();
        let parsed: ParamType = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, pt);
    }

    #[test]
    fn should_omit_missing_default_when_serializing_param_type() {
        let pt = ParamType::new("host");
        let json = serde_json::to_value(&pt).unwrap();
        assert!(json.get("default").is_none());
    }
}
