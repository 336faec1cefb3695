//! Behavioural tests for the client request layer and the CLI runtime.

mod cli_behaviour;
mod client_behaviour;
mod support;
