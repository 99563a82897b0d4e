use std::collections::HashMap;

use schemars::{JsonSchema, Schema, SchemaGenerator};

/// Headers are configured as a plain map of names to values
pub(super) fn header_map(generator: &mut SchemaGenerator) -> Schema {
    HashMap::<String, String>::json_schema(generator)
}

pub(super) fn level(generator: &mut SchemaGenerator) -> Schema {
    /// Log level
    #[derive(JsonSchema)]
    #[schemars(rename_all = "lowercase")]
    // This is just an intermediate type to auto create schema information for,
    // so it is OK if it is never used
    #[allow(dead_code)]
    enum Level {
        Trace,
        Debug,
        Info,
        Warn,
        Error,
    }

    Level::json_schema(generator)
}
