//! Command modelling for conduit CLI requests.
//!
//! Turns parsed CLI arguments into the command name, argument object, and
//! timeout handed to the client.

use std::time::Duration;

use serde_json::{Map, Value};

use crate::cli::Cli;
use crate::errors::AppError;

#[derive(Debug, PartialEq)]
pub(crate) struct CommandInvocation {
    pub(crate) command: String,
    pub(crate) args: Map<String, Value>,
    pub(crate) timeout: Option<Duration>,
}

impl TryFrom<Cli> for CommandInvocation {
    type Error = AppError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let command = cli.command.trim().to_owned();
        if command.is_empty() {
            return Err(AppError::MissingCommand);
        }

        let mut args = match cli.args_json.as_deref() {
            Some(text) => parse_args_object(text)?,
            None => Map::new(),
        };
        for pair in &cli.arg_pairs {
            let (key, value) = parse_arg_pair(pair)?;
            args.insert(key, value);
        }

        let timeout = match cli.timeout {
            Some(0) => return Err(AppError::ZeroTimeout),
            seconds => seconds.map(Duration::from_secs),
        };

        Ok(Self {
            command,
            args,
            timeout,
        })
    }
}

fn parse_args_object(text: &str) -> Result<Map<String, Value>, AppError> {
    match serde_json::from_str(text).map_err(AppError::ArgsJson)? {
        Value::Object(map) => Ok(map),
        other => Err(AppError::ArgsNotObject(other.to_string())),
    }
}

fn parse_arg_pair(pair: &str) -> Result<(String, Value), AppError> {
    let (key, raw) = pair
        .split_once('=')
        .ok_or_else(|| AppError::ArgPair(pair.to_owned()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(AppError::ArgPair(pair.to_owned()));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()));
    Ok((key.to_owned(), value))
}
