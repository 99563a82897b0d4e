//! Mapping between database table names and the GraphQL names generated for them
//!
//! PostgreSQL GraphQL layers expose each table as a paginated collection whose names
//! follow a suffix convention (`users` → `usersCollection`). This is a naming heuristic
//! rather than a schema contract, so every tool goes through this one type to translate
//! names and a deployment with a different convention only needs different suffixes.

use schemars::JsonSchema;
use serde::Deserialize;

/// The default suffix for both collection types and collection query fields
pub const DEFAULT_COLLECTION_SUFFIX: &str = "Collection";

/// Naming convention for collections
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CollectionNaming {
    /// Suffix of the GraphQL object type describing a table
    pub type_suffix: String,

    /// Suffix of the root query field used to page through a table
    pub field_suffix: String,
}

impl Default for CollectionNaming {
    fn default() -> Self {
        Self {
            type_suffix: DEFAULT_COLLECTION_SUFFIX.to_string(),
            field_suffix: DEFAULT_COLLECTION_SUFFIX.to_string(),
        }
    }
}

impl CollectionNaming {
    /// The GraphQL type name describing `table`
    pub fn type_name(&self, table: &str) -> String {
        format!("{table}{}", self.type_suffix)
    }

    /// The table described by a GraphQL type, if the type follows the convention.
    ///
    /// Only an exact, case-sensitive suffix match counts, and a type named just the
    /// suffix has no table.
    pub fn table_name<'a>(&self, type_name: &'a str) -> Option<&'a str> {
        if type_name.starts_with("__") || self.type_suffix.is_empty() {
            return None;
        }
        type_name
            .strip_suffix(self.type_suffix.as_str())
            .filter(|table| !table.is_empty())
    }

    /// The root query field that pages through `table`
    pub fn collection_field(&self, table: &str) -> String {
        format!("{table}{}", self.field_suffix)
    }
}
