//! Type coercion for host property writes.
//!
//! The host does not validate the values it is handed: a value of the wrong
//! type applied to a property takes the whole host process down without an
//! error. Every write therefore goes through [`coerce`], which asks the host
//! for the property's declared kind at the moment of the write and converts
//! the raw JSON value to exactly that kind, or refuses.
//!
//! Rules:
//!
//! - The declared kind is re-read on every call. Nothing is cached, because a
//!   node can be rebuilt with a different layout between two commands.
//! - Numeric arrays for float vector kinds always become float vectors, even
//!   when every element is integral.
//! - Integer and enum kinds accept only integer-shaped JSON numbers inside
//!   the 32-bit range. `1.0` is refused rather than truncated.
//! - Everything else gets the narrowest conversion that loses nothing.

mod coerce;
mod kind;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use conduit_protocol::ErrorKind;

pub use self::coerce::{coerce, coerce_to_kind};
pub use self::kind::{PropertyKind, PropertyValue};

/// Address of one property on one node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyRef {
    pub node_id: String,
    pub property_id: String,
}

impl PropertyRef {
    pub fn new(node_id: impl Into<String>, property_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            property_id: property_id.into(),
        }
    }
}

impl fmt::Display for PropertyRef {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}.{}", self.node_id, self.property_id)
    }
}

impl FromStr for PropertyRef {
    type Err = CoercionError;

    /// Parses `node.property`, splitting at the first dot.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        input
            .split_once('.')
            .filter(|(node, property)| !node.is_empty() && !property.is_empty())
            .map(|(node, property)| Self::new(node, property))
            .ok_or_else(|| CoercionError::InvalidReference(input.to_owned()))
    }
}

/// Declared type of a property as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyTypeDescriptor {
    pub property_id: String,
    pub declared_kind: PropertyKind,
}

/// Host facility reporting the declared kind of a property.
///
/// Implementations must answer from the live host object every time.
pub trait PropertyIntrospection {
    /// Describes `property`.
    ///
    /// # Errors
    ///
    /// Returns [`CoercionError::UnknownNode`] or
    /// [`CoercionError::UnknownProperty`] when the target does not exist.
    fn describe(&self, property: &PropertyRef) -> Result<PropertyTypeDescriptor, CoercionError>;
}

/// Failures raised while coercing a value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoercionError {
    #[error("unknown node '{node_id}'")]
    UnknownNode { node_id: String },

    #[error("node '{}' has no property '{}'", .property.node_id, .property.property_id)]
    UnknownProperty { property: PropertyRef },

    #[error("invalid property reference '{0}'; expected node.property")]
    InvalidReference(String),

    #[error("cannot set {property} (declared {declared}): {reason}")]
    TypeMismatch {
        property: PropertyRef,
        declared: PropertyKind,
        reason: String,
    },
}

impl CoercionError {
    /// Wire classification: only a genuine mismatch is a type error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatchError,
            Self::UnknownNode { .. } | Self::UnknownProperty { .. } | Self::InvalidReference(_) => {
                ErrorKind::InvalidArgumentError
            }
        }
    }
}
