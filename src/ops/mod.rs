//! Operation registration, built-in handlers, and group manifests.

mod handlers;
mod manifest;
mod registry;

pub use handlers::builtin_registry;
pub use manifest::export_group_manifests;
pub use registry::{Handler, Operation, OperationRegistry};
