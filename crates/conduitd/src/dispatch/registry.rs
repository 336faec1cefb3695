//! Name-to-handler command registry.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

use super::contract::{ArgumentContract, CommandArgs};
use super::errors::DispatchError;
use super::value::ResultValue;

/// Boxed handler operating on host state `H`.
pub type HandlerFn<H> =
    dyn Fn(&mut H, CommandArgs<'_>) -> Result<ResultValue, DispatchError> + Send + 'static;

/// Errors raised while building a registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A second handler was registered under an existing name.
    #[error("command '{0}' is already registered")]
    Duplicate(String),
    /// Command names must be non-empty and free of surrounding whitespace.
    #[error("invalid command name '{0}'")]
    InvalidName(String),
}

struct Registration<H> {
    contract: ArgumentContract,
    handler: Box<HandlerFn<H>>,
}

/// Registry mapping command names to handlers and their argument contracts.
///
/// The registry is only ever invoked from the host loop, so handlers receive
/// exclusive access to the host state.
pub struct CommandRegistry<H> {
    commands: BTreeMap<String, Registration<H>>,
}

impl<H> CommandRegistry<H> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            commands: BTreeMap::new(),
        }
    }

    /// Registers `handler` under `name` with the given argument contract.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] for blank or duplicate names.
    pub fn register<F>(
        &mut self,
        name: &str,
        contract: ArgumentContract,
        handler: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(&mut H, CommandArgs<'_>) -> Result<ResultValue, DispatchError> + Send + 'static,
    {
        if name.is_empty() || name.trim() != name {
            return Err(RegistryError::InvalidName(name.to_owned()));
        }
        if self.commands.contains_key(name) {
            return Err(RegistryError::Duplicate(name.to_owned()));
        }
        self.commands.insert(
            name.to_owned(),
            Registration {
                contract,
                handler: Box::new(handler),
            },
        );
        Ok(())
    }

    /// Returns true when `name` has a handler.
    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Registered command names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns true when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Looks up, validates, and runs a command against `host`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownCommand`] for unregistered names, an
    /// argument error when the contract is violated, and whatever the handler
    /// itself reports.
    pub fn invoke(
        &self,
        host: &mut H,
        name: &str,
        args: &Map<String, Value>,
    ) -> Result<ResultValue, DispatchError> {
        let registration = self
            .commands
            .get(name)
            .ok_or_else(|| DispatchError::unknown_command(name))?;
        registration.contract.validate(name, args)?;
        (registration.handler)(host, CommandArgs::new(name, args))
    }
}

impl<H> Default for CommandRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> fmt::Debug for CommandRegistry<H> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("CommandRegistry")
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .finish()
    }
}
