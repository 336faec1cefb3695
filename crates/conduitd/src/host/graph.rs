//! In-memory node graph standing in for a single-threaded host application.
//!
//! `GraphHost` is only ever touched from the host loop thread. Values reach
//! [`GraphHost::apply`] after coercion; a wrongly-typed value is still refused
//! there so a missed coercion shows up as an error rather than bad state.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::coercion::{
    CoercionError, PropertyIntrospection, PropertyKind, PropertyRef, PropertyTypeDescriptor,
    PropertyValue,
};
use crate::dispatch::DispatchError;

use super::catalog::{Catalog, NodeDefinition};

/// Failures raised by graph operations.
#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("unknown definition '{0}'")]
    UnknownDefinition(String),
    #[error("unknown node '{0}'")]
    UnknownNode(String),
    #[error("node '{0}' already exists")]
    DuplicateNode(String),
    #[error("node '{node_id}' has no property '{property_id}'")]
    UnknownProperty {
        node_id: String,
        property_id: String,
    },
    #[error("value {value:?} does not fit {property} (declared {declared})")]
    WrongValueType {
        property: String,
        declared: PropertyKind,
        value: PropertyValue,
    },
}

impl From<GraphError> for DispatchError {
    fn from(error: GraphError) -> Self {
        match error {
            GraphError::UnknownNode(node_id) => {
                Self::Coercion(CoercionError::UnknownNode { node_id })
            }
            GraphError::UnknownProperty {
                node_id,
                property_id,
            } => Self::Coercion(CoercionError::UnknownProperty {
                property: PropertyRef::new(node_id, property_id),
            }),
            other => Self::host(other.to_string()),
        }
    }
}

/// One property slot on a node.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub kind: PropertyKind,
    pub value: PropertyValue,
}

/// A node instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub definition_id: String,
    pub position: [f64; 2],
    pub properties: BTreeMap<String, Property>,
}

/// The host's node graph.
#[derive(Debug, Clone)]
pub struct GraphHost {
    catalog: Catalog,
    nodes: BTreeMap<String, Node>,
    next_id: u64,
}

impl Default for GraphHost {
    fn default() -> Self {
        Self::new(Catalog::builtin())
    }
}

impl GraphHost {
    /// Creates an empty graph over `catalog`.
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            nodes: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    /// Nodes in identifier order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Instantiates `definition_id`.
    ///
    /// Without an explicit `node_id` the host assigns `node<N>`. Properties
    /// start at the zero value of their declared kind.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownDefinition`] before touching the graph,
    /// or [`GraphError::DuplicateNode`] for a taken id.
    pub fn create_node(
        &mut self,
        definition_id: &str,
        node_id: Option<&str>,
        position: [f64; 2],
    ) -> Result<&Node, GraphError> {
        let definition = self
            .catalog
            .get(definition_id)
            .ok_or_else(|| GraphError::UnknownDefinition(definition_id.to_owned()))?;
        let id = match node_id {
            Some(requested) if self.nodes.contains_key(requested) => {
                return Err(GraphError::DuplicateNode(requested.to_owned()));
            }
            Some(requested) => requested.to_owned(),
            None => allocate_id(&mut self.next_id, &self.nodes),
        };
        let node = instantiate(definition, id.clone(), position);
        Ok(self.nodes.entry(id).or_insert(node))
    }

    /// Removes a node.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] when it does not exist.
    pub fn delete_node(&mut self, node_id: &str) -> Result<Node, GraphError> {
        self.nodes
            .remove(node_id)
            .ok_or_else(|| GraphError::UnknownNode(node_id.to_owned()))
    }

    /// Stores `value` on a property.
    ///
    /// # Errors
    ///
    /// Returns a lookup error, or [`GraphError::WrongValueType`] when the value
    /// does not match the declared kind.
    pub fn apply(&mut self, property: &PropertyRef, value: PropertyValue) -> Result<(), GraphError> {
        let slot = self.slot_mut(property)?;
        if !slot.kind.accepts(&value) {
            return Err(GraphError::WrongValueType {
                property: property.to_string(),
                declared: slot.kind.clone(),
                value,
            });
        }
        slot.value = value;
        Ok(())
    }

    /// Changes a property's declared kind, resetting its value, the way a
    /// host rebuilds a node with a different layout between commands.
    #[cfg(test)]
    pub(crate) fn redeclare(&mut self, property: &PropertyRef, kind: PropertyKind) -> Result<(), GraphError> {
        let slot = self.slot_mut(property)?;
        slot.value = kind.default_value();
        slot.kind = kind;
        Ok(())
    }

    fn slot_mut(&mut self, property: &PropertyRef) -> Result<&mut Property, GraphError> {
        let node = self
            .nodes
            .get_mut(&property.node_id)
            .ok_or_else(|| GraphError::UnknownNode(property.node_id.clone()))?;
        node.properties
            .get_mut(&property.property_id)
            .ok_or_else(|| GraphError::UnknownProperty {
                node_id: property.node_id.clone(),
                property_id: property.property_id.clone(),
            })
    }
}

impl PropertyIntrospection for GraphHost {
    fn describe(&self, property: &PropertyRef) -> Result<PropertyTypeDescriptor, CoercionError> {
        let node = self
            .nodes
            .get(&property.node_id)
            .ok_or_else(|| CoercionError::UnknownNode {
                node_id: property.node_id.clone(),
            })?;
        let slot = node
            .properties
            .get(&property.property_id)
            .ok_or_else(|| CoercionError::UnknownProperty {
                property: property.clone(),
            })?;
        Ok(PropertyTypeDescriptor {
            property_id: property.property_id.clone(),
            declared_kind: slot.kind.clone(),
        })
    }
}

fn allocate_id(next_id: &mut u64, nodes: &BTreeMap<String, Node>) -> String {
    loop {
        let candidate = format!("node{next_id}");
        *next_id += 1;
        if !nodes.contains_key(&candidate) {
            return candidate;
        }
    }
}

fn instantiate(definition: &NodeDefinition, id: String, position: [f64; 2]) -> Node {
    let properties = definition
        .properties
        .iter()
        .map(|spec| {
            (
                spec.id.to_owned(),
                Property {
                    kind: spec.kind.clone(),
                    value: spec.kind.default_value(),
                },
            )
        })
        .collect();
    Node {
        id,
        definition_id: definition.id.to_owned(),
        position,
        properties,
    }
}
