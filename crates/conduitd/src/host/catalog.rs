//! Built-in node definitions for the in-memory graph host.

use crate::coercion::PropertyKind;

/// One property declared by a node definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySpec {
    pub id: &'static str,
    pub kind: PropertyKind,
}

/// A node type that can be instantiated in the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDefinition {
    pub id: &'static str,
    pub label: &'static str,
    pub properties: Vec<PropertySpec>,
}

impl NodeDefinition {
    fn new(id: &'static str, label: &'static str, properties: Vec<PropertySpec>) -> Self {
        Self {
            id,
            label,
            properties,
        }
    }
}

/// Set of definitions the host knows how to instantiate.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    definitions: Vec<NodeDefinition>,
}

impl Catalog {
    /// Builds a catalog from explicit definitions.
    pub fn new(definitions: Vec<NodeDefinition>) -> Self {
        Self { definitions }
    }

    /// Catalog of compositing nodes covering every property kind.
    pub fn builtin() -> Self {
        Self::new(vec![
            NodeDefinition::new(
                "sbs::compositing::uniform",
                "Uniform Color",
                vec![
                    prop("outputcolor", PropertyKind::ColorRgba),
                    prop("colorswitch", PropertyKind::Bool),
                ],
            ),
            NodeDefinition::new(
                "sbs::compositing::blend",
                "Blend",
                vec![
                    prop("opacitymult", PropertyKind::Float),
                    prop("blendingmode", enumeration("sbs::compositing::blendingmode")),
                    prop("maskrectangle", PropertyKind::Float4),
                ],
            ),
            NodeDefinition::new(
                "sbs::compositing::transformation",
                "Transformation 2D",
                vec![
                    prop("matrix22", PropertyKind::Float4),
                    prop("offset", PropertyKind::Float2),
                    prop("scale", PropertyKind::Float3),
                    prop("mode", enumeration("sbs::compositing::filtering")),
                    prop("tiling", PropertyKind::Int),
                ],
            ),
            NodeDefinition::new(
                "sbs::compositing::levels",
                "Levels",
                vec![
                    prop("levelinlow", PropertyKind::ColorRgba),
                    prop("levelinhigh", PropertyKind::ColorRgba),
                    prop("levelinmid", PropertyKind::ColorRgb),
                    prop("clamp", PropertyKind::Bool),
                ],
            ),
            NodeDefinition::new(
                "sbs::compositing::pixelprocessor",
                "Pixel Processor",
                vec![
                    prop("cellindex", PropertyKind::Int3),
                    prop("bounds", PropertyKind::Int4),
                    prop("tint", PropertyKind::ColorRgb),
                ],
            ),
            NodeDefinition::new(
                "sbs::compositing::output",
                "Output",
                vec![
                    prop("identifier", PropertyKind::String),
                    prop("outputsize", PropertyKind::Int2),
                    prop("format", enumeration("sbs::compositing::format")),
                ],
            ),
        ])
    }

    /// Looks up a definition by id.
    pub fn get(&self, id: &str) -> Option<&NodeDefinition> {
        self.definitions.iter().find(|definition| definition.id == id)
    }

    /// All definitions, in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &NodeDefinition> {
        self.definitions.iter()
    }

    /// Definitions whose id or label contains `filter`, case-insensitively.
    pub fn matching<'a>(&'a self, filter: &str) -> impl Iterator<Item = &'a NodeDefinition> {
        let needle = filter.to_lowercase();
        self.definitions.iter().filter(move |definition| {
            needle.is_empty()
                || definition.id.to_lowercase().contains(&needle)
                || definition.label.to_lowercase().contains(&needle)
        })
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

const fn prop(id: &'static str, kind: PropertyKind) -> PropertySpec {
    PropertySpec { id, kind }
}

fn enumeration(type_id: &str) -> PropertyKind {
    PropertyKind::Enum {
        type_id: type_id.to_owned(),
    }
}
