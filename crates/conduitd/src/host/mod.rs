//! In-memory graph host and its command set.
//!
//! The bridge core is host-agnostic; this module supplies a concrete host so
//! the daemon can be driven end to end. A real host binding would replace
//! [`GraphHost`] and keep the same registration pattern.

mod catalog;
mod commands;
mod graph;

pub use self::catalog::{Catalog, NodeDefinition, PropertySpec};
pub use self::commands::register_graph_commands;
pub use self::graph::{GraphError, GraphHost, Node, Property};
