// src/tools/mod.rs

pub mod definitions;
pub mod dispatcher;

pub use definitions::tool_schema;
pub use dispatcher::{ToolDispatcher, ToolKind};
