//! Tagged, opaque encoding of configured modules.
//!
//! An encoded module is a JSON object holding the module's own fields plus
//! one discriminator key naming the module inside its namespace:
//!
//! ```text
//! {"wrapper": "proxy_protocol", "timeout": 2000000000, "allow": ["10.0.0.0/8"]}
//! ```

use serde::ser::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Module;

/// An encoded module, decoded later by tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawModule(Map<String, Value>);

impl RawModule {
    /// Encode `module`, recording its name under `inline_key`.
    pub fn encode(module: &dyn Module, inline_key: &str) -> serde_json::Result<Self> {
        let mut fields = match module.encode()? {
            Value::Object(fields) => fields,
            Value::Null => Map::new(),
            other => {
                return Err(serde_json::Error::custom(format!(
                    "module {} must encode to an object, got {other}",
                    module.id()
                )))
            }
        };
        fields.insert(
            inline_key.to_string(),
            Value::String(module.id().name().to_string()),
        );
        Ok(Self(fields))
    }

    /// The module name stored under `inline_key`.
    pub fn tag(&self, inline_key: &str) -> Option<&str> {
        self.0.get(inline_key).and_then(Value::as_str)
    }

    /// The module's own fields, without the tag.
    pub fn payload(&self, inline_key: &str) -> Value {
        let mut fields = self.0.clone();
        fields.remove(inline_key);
        Value::Object(fields)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::ModuleId;

    #[derive(Debug, Serialize)]
    struct Sample {
        limit: u32,
    }

    impl Module for Sample {
        fn id(&self) -> ModuleId {
            ModuleId::new("listeners.sample")
        }

        fn encode(&self) -> serde_json::Result<Value> {
            serde_json::to_value(self)
        }
    }

    #[derive(Debug)]
    struct Scalar;

    impl Module for Scalar {
        fn id(&self) -> ModuleId {
            ModuleId::new("listeners.scalar")
        }

        fn encode(&self) -> serde_json::Result<Value> {
            Ok(Value::from(3))
        }
    }

    #[test]
    fn test_encode_inlines_tag() {
        let raw = RawModule::encode(&Sample { limit: 4 }, "wrapper").unwrap();
        assert_eq!(
            serde_json::to_value(&raw).unwrap(),
            serde_json::json!({"wrapper": "sample", "limit": 4})
        );
        assert_eq!(raw.tag("wrapper"), Some("sample"));
        assert_eq!(raw.payload("wrapper"), serde_json::json!({"limit": 4}));
    }

    #[test]
    fn test_encode_rejects_non_objects() {
        let err = RawModule::encode(&Scalar, "wrapper").unwrap_err();
        assert!(err.to_string().contains("listeners.scalar"));
    }
}
