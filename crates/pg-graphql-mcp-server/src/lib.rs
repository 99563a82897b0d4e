#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod errors;
pub mod graphql;
pub(crate) mod json_schema;
pub mod naming;
pub mod server;
pub mod tools;
