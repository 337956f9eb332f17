//! Thin wrapper types used to disambiguate handler argument/return shapes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Wraps a tool/prompt handler's parsed parameter type.
///
/// `Parameters<T>(pub T)` tells [`crate::handler::server::tool::CallToolHandler`]
/// (and the matching prompt-handler machinery) that the inbound call's
/// `arguments` object should be deserialized into `T` before the handler
/// runs, rather than passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Parameters<T>(pub T);

impl<T> Parameters<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: JsonSchema> JsonSchema for Parameters<T> {
    fn schema_name() -> std::borrow::Cow<'static, str> {
        T::schema_name()
    }

    fn schema_id() -> std::borrow::Cow<'static, str> {
        T::schema_id()
    }

    fn json_schema(generator: &mut schemars::generate::SchemaGenerator) -> schemars::Schema {
        T::json_schema(generator)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Parameters<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Parameters)
    }
}

impl<T: Serialize> Serialize for Parameters<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

/// Wraps a tool handler's return value, signaling that it should be
/// serialized into both `content` (as a text/JSON block) and
/// `structured_content` of the resulting [`crate::model::CallToolResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}
