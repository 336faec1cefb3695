//! Domain commands operating on the graph host.

use std::sync::Arc;

use crate::coercion::{PropertyRef, coerce};
use crate::dispatch::{
    ArgShape, ArgumentContract, CommandArgs, CommandRegistry, DispatchError, QueueStats,
    RegistryError, ResultValue,
};

use super::graph::{GraphError, GraphHost, Node};

/// Registers the graph command set.
///
/// `stats` feeds the queue counters reported by `diagnostic`.
///
/// # Errors
///
/// Returns [`RegistryError`] when a name is already taken.
pub fn register_graph_commands(
    registry: &mut CommandRegistry<GraphHost>,
    stats: Arc<QueueStats>,
) -> Result<(), RegistryError> {
    registry.register("ping", ArgumentContract::none(), |_, _| {
        Ok(ResultValue::object([("pong", true)]))
    })?;
    registry.register("diagnostic", ArgumentContract::none(), move |host, _| {
        Ok(diagnostic(host, &stats))
    })?;
    registry.register(
        "list_node_definitions",
        ArgumentContract::none().optional("filter_text", ArgShape::String),
        list_node_definitions,
    )?;
    registry.register(
        "create_node",
        ArgumentContract::none()
            .required("definition_id", ArgShape::String)
            .optional("node_id", ArgShape::String)
            .optional("position", ArgShape::Array),
        create_node,
    )?;
    registry.register(
        "delete_node",
        ArgumentContract::none().required("node_id", ArgShape::String),
        delete_node,
    )?;
    registry.register(
        "get_node_info",
        ArgumentContract::none().required("node_id", ArgShape::String),
        get_node_info,
    )?;
    registry.register(
        "set_parameter",
        ArgumentContract::none()
            .optional("node_id", ArgShape::String)
            .required("parameter_id", ArgShape::String)
            .required("value", ArgShape::Any),
        set_parameter,
    )?;
    registry.register("get_scene_info", ArgumentContract::none(), |host, _| {
        Ok(scene_info(host))
    })?;
    Ok(())
}

fn diagnostic(host: &GraphHost, stats: &QueueStats) -> ResultValue {
    ResultValue::object([
        ("version", ResultValue::from(env!("CARGO_PKG_VERSION"))),
        ("node_count", ResultValue::from(host.node_count())),
        ("definition_count", ResultValue::from(host.catalog().len())),
        (
            "queue",
            ResultValue::object([
                ("submitted", stats.submitted()),
                ("completed", stats.completed()),
                ("panicked", stats.panicked()),
                ("pending", stats.pending()),
            ]),
        ),
    ])
}

fn list_node_definitions(
    host: &mut GraphHost,
    args: CommandArgs<'_>,
) -> Result<ResultValue, DispatchError> {
    let filter = args.optional_str("filter_text")?.unwrap_or_default();
    let ids: Vec<&str> = host
        .catalog()
        .matching(filter)
        .map(|definition| definition.id)
        .collect();
    Ok(ResultValue::from(ids))
}

fn create_node(host: &mut GraphHost, args: CommandArgs<'_>) -> Result<ResultValue, DispatchError> {
    let definition_id = args.str("definition_id")?;
    let node_id = args.optional_str("node_id")?;
    let position = args.optional_numbers::<2>("position")?.unwrap_or_default();
    let node = host.create_node(definition_id, node_id, position)?;
    Ok(ResultValue::object([
        ("node_id", ResultValue::from(node.id.as_str())),
        ("definition_id", ResultValue::from(node.definition_id.as_str())),
        ("position", position_value(node)),
    ]))
}

fn delete_node(host: &mut GraphHost, args: CommandArgs<'_>) -> Result<ResultValue, DispatchError> {
    host.delete_node(args.str("node_id")?)?;
    Ok(ResultValue::Null)
}

fn get_node_info(host: &mut GraphHost, args: CommandArgs<'_>) -> Result<ResultValue, DispatchError> {
    let node_id = args.str("node_id")?;
    let node = host
        .node(node_id)
        .ok_or_else(|| GraphError::UnknownNode(node_id.to_owned()))?;
    let properties: Vec<ResultValue> = node
        .properties
        .iter()
        .map(|(id, property)| {
            ResultValue::object([
                ("id", ResultValue::from(id.as_str())),
                ("type", ResultValue::from(property.kind.type_id())),
                ("value", property.value.to_result()),
            ])
        })
        .collect();
    Ok(ResultValue::object([
        ("node_id", ResultValue::from(node.id.as_str())),
        ("definition_id", ResultValue::from(node.definition_id.as_str())),
        ("position", position_value(node)),
        ("properties", ResultValue::Array(properties)),
    ]))
}

fn set_parameter(host: &mut GraphHost, args: CommandArgs<'_>) -> Result<ResultValue, DispatchError> {
    let property = property_ref(args)?;
    let value = coerce(&*host, &property, args.value("value")?)?;
    host.apply(&property, value)?;
    Ok(ResultValue::Null)
}

/// Target of `set_parameter`: `node_id` plus `parameter_id`, or a dotted
/// `node.parameter` reference alone.
fn property_ref(args: CommandArgs<'_>) -> Result<PropertyRef, DispatchError> {
    let parameter_id = args.str("parameter_id")?;
    match args.optional_str("node_id")? {
        Some(node_id) => Ok(PropertyRef::new(node_id, parameter_id)),
        None => Ok(parameter_id.parse::<PropertyRef>()?),
    }
}

fn scene_info(host: &GraphHost) -> ResultValue {
    let ids: Vec<&str> = host.nodes().map(|node| node.id.as_str()).collect();
    ResultValue::object([
        ("node_count", ResultValue::from(host.node_count())),
        ("nodes", ResultValue::from(ids)),
    ])
}

fn position_value(node: &Node) -> ResultValue {
    ResultValue::from(node.position.to_vec())
}
