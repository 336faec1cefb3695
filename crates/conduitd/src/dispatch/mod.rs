//! Command dispatch from sockets to the host thread.
//!
//! [`BridgeConnectionHandler`] reads one framed request per connection and
//! submits it to the [`DispatchQueue`]. The single [`HostLoop`] consumer runs
//! each request against the [`CommandRegistry`] on the host thread, sanitizes
//! the result, and hands the reply back to the waiting connection.
//!
//! ## Protocol
//!
//! Request payload:
//!
//! ```json
//! {"command":"set_parameter","args":{"node_id":"nodeA","parameter_id":"scale","value":[2,2,2]}}
//! ```
//!
//! A success reply is the sanitized result itself (`{}` when the handler
//! returned nothing). A failure reply names the error kind:
//!
//! ```json
//! {"error":"TypeMismatchError","detail":"cannot set nodeA.mode (declared sbs::compositing::blendingmode): float-shaped number 1.0 is not an integer"}
//! ```

mod contract;
mod errors;
mod handler;
mod queue;
mod registry;
mod sanitize;
mod value;

pub use self::contract::{ArgShape, ArgumentContract, CommandArgs};
pub use self::errors::DispatchError;
pub use self::handler::BridgeConnectionHandler;
pub use self::queue::{
    DispatchQueue, HostLoop, LoopSummary, PumpStatus, QueueStats, dispatch_queue,
};
pub use self::registry::{CommandRegistry, HandlerFn, RegistryError};
pub use self::sanitize::{INFINITY_SENTINEL, sanitize};
pub use self::value::ResultValue;
