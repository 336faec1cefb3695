//! Argument contracts and typed argument access.
//!
//! Each registered command declares the named arguments it accepts. The
//! registry checks a request against that contract before the handler runs:
//! unknown names, missing required names, and values of the wrong JSON shape
//! are all rejected as argument errors.

use std::fmt;

use serde_json::{Map, Value};

use super::errors::DispatchError;

/// JSON shape an argument must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgShape {
    /// Any JSON value; the handler interprets it.
    Any,
    String,
    Number,
    /// A number without a fractional part.
    Integer,
    Bool,
    Array,
    Object,
}

impl ArgShape {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Any => true,
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Bool => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

impl fmt::Display for ArgShape {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Any => "any value",
            Self::String => "a string",
            Self::Number => "a number",
            Self::Integer => "an integer",
            Self::Bool => "a boolean",
            Self::Array => "an array",
            Self::Object => "an object",
        };
        formatter.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ParamSpec {
    name: &'static str,
    shape: ArgShape,
    required: bool,
}

/// Declared argument set for one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentContract {
    params: Vec<ParamSpec>,
}

impl ArgumentContract {
    /// Contract for a command that takes no arguments.
    pub fn none() -> Self {
        Self::default()
    }

    /// Adds a required argument.
    #[must_use]
    pub fn required(mut self, name: &'static str, shape: ArgShape) -> Self {
        self.params.push(ParamSpec {
            name,
            shape,
            required: true,
        });
        self
    }

    /// Adds an optional argument. An explicit `null` counts as absent.
    #[must_use]
    pub fn optional(mut self, name: &'static str, shape: ArgShape) -> Self {
        self.params.push(ParamSpec {
            name,
            shape,
            required: false,
        });
        self
    }

    /// Names of the declared arguments, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.params.iter().map(|param| param.name)
    }

    /// Checks `args` against the contract.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidArguments`] naming the first offending
    /// argument.
    pub fn validate(&self, command: &str, args: &Map<String, Value>) -> Result<(), DispatchError> {
        if let Some(unknown) = args
            .keys()
            .find(|key| !self.params.iter().any(|param| param.name == key.as_str()))
        {
            let accepted: Vec<&str> = self.names().collect();
            let hint = if accepted.is_empty() {
                "it takes no arguments".to_owned()
            } else {
                format!("expected one of: {}", accepted.join(", "))
            };
            return Err(DispatchError::invalid_arguments(
                command,
                format!("unexpected argument '{unknown}'; {hint}"),
            ));
        }
        for param in &self.params {
            match args.get(param.name) {
                None | Some(Value::Null) if param.required => {
                    return Err(DispatchError::invalid_arguments(
                        command,
                        format!("missing required argument '{}'", param.name),
                    ));
                }
                None | Some(Value::Null) => {}
                Some(value) if !param.shape.accepts(value) => {
                    return Err(DispatchError::invalid_arguments(
                        command,
                        format!("argument '{}' must be {}", param.name, param.shape),
                    ));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

/// Validated arguments handed to a handler.
///
/// Accessors assume the contract has already been checked, but still return
/// errors rather than panicking so a handler whose contract is out of step
/// with its body fails cleanly.
#[derive(Debug, Clone, Copy)]
pub struct CommandArgs<'a> {
    command: &'a str,
    values: &'a Map<String, Value>,
}

impl<'a> CommandArgs<'a> {
    pub(crate) const fn new(command: &'a str, values: &'a Map<String, Value>) -> Self {
        Self { command, values }
    }

    /// Returns the raw value of a required argument.
    ///
    /// # Errors
    ///
    /// Returns an argument error when the value is absent or `null`.
    pub fn value(&self, name: &str) -> Result<&'a Value, DispatchError> {
        self.optional_value(name).ok_or_else(|| {
            DispatchError::invalid_arguments(
                self.command,
                format!("missing required argument '{name}'"),
            )
        })
    }

    /// Returns the raw value of an optional argument; `null` reads as absent.
    pub fn optional_value(&self, name: &str) -> Option<&'a Value> {
        self.values.get(name).filter(|value| !value.is_null())
    }

    /// Returns a required string argument.
    ///
    /// # Errors
    ///
    /// Returns an argument error when the value is absent or not a string.
    pub fn str(&self, name: &str) -> Result<&'a str, DispatchError> {
        let value = self.value(name)?;
        value.as_str().ok_or_else(|| self.wrong_shape(name, ArgShape::String))
    }

    /// Returns an optional string argument.
    ///
    /// # Errors
    ///
    /// Returns an argument error when present but not a string.
    pub fn optional_str(&self, name: &str) -> Result<Option<&'a str>, DispatchError> {
        self.optional_value(name)
            .map(|value| {
                value
                    .as_str()
                    .ok_or_else(|| self.wrong_shape(name, ArgShape::String))
            })
            .transpose()
    }

    /// Returns an optional array of exactly `N` numbers.
    ///
    /// # Errors
    ///
    /// Returns an argument error when present with a different shape.
    pub fn optional_numbers<const N: usize>(
        &self,
        name: &str,
    ) -> Result<Option<[f64; N]>, DispatchError> {
        let Some(value) = self.optional_value(name) else {
            return Ok(None);
        };
        let invalid = || {
            DispatchError::invalid_arguments(
                self.command,
                format!("argument '{name}' must be an array of {N} numbers"),
            )
        };
        let items = value.as_array().filter(|items| items.len() == N).ok_or_else(invalid)?;
        let mut out = [0.0; N];
        for (slot, item) in out.iter_mut().zip(items) {
            *slot = item.as_f64().ok_or_else(invalid)?;
        }
        Ok(Some(out))
    }

    fn wrong_shape(&self, name: &str, shape: ArgShape) -> DispatchError {
        DispatchError::invalid_arguments(self.command, format!("argument '{name}' must be {shape}"))
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use serde_json::json;

    use conduit_protocol::ErrorKind;

    use super::*;

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[fixture]
    fn contract() -> ArgumentContract {
        ArgumentContract::none()
            .required("node_id", ArgShape::String)
            .optional("position", ArgShape::Array)
            .optional("count", ArgShape::Integer)
    }

    #[rstest]
    fn accepts_required_and_optional(contract: ArgumentContract) {
        let values = args(json!({"node_id": "n1", "position": [1, 2], "count": 3}));
        contract.validate("create", &values).expect("valid arguments");
    }

    #[rstest]
    fn explicit_null_optional_is_absent(contract: ArgumentContract) {
        let values = args(json!({"node_id": "n1", "position": null}));
        contract.validate("create", &values).expect("null optional accepted");
    }

    #[rstest]
    #[case(json!({}), "missing required argument 'node_id'")]
    #[case(json!({"node_id": null}), "missing required argument 'node_id'")]
    #[case(
        json!({"node_id": "n1", "colour": 1}),
        "unexpected argument 'colour'; expected one of: node_id, position, count"
    )]
    #[case(json!({"node_id": 7}), "argument 'node_id' must be a string")]
    #[case(json!({"node_id": "n1", "count": 1.5}), "argument 'count' must be an integer")]
    fn rejects_contract_violations(
        contract: ArgumentContract,
        #[case] input: Value,
        #[case] message: &str,
    ) {
        let error = contract
            .validate("create", &args(input))
            .expect_err("contract violation");
        assert_eq!(error.kind(), ErrorKind::InvalidArgumentError);
        assert!(
            error.to_string().ends_with(message),
            "unexpected message: {error}"
        );
    }

    #[test]
    fn argumentless_commands_say_so() {
        let error = ArgumentContract::none()
            .validate("ping", &args(json!({"verbose": true})))
            .expect_err("no arguments accepted");
        assert!(
            error.to_string().ends_with("unexpected argument 'verbose'; it takes no arguments"),
            "unexpected message: {error}"
        );
    }

    #[test]
    fn typed_accessors_read_values() {
        let values = args(json!({"node_id": "n1", "position": [4, 5.5]}));
        let command_args = CommandArgs::new("create", &values);
        assert_eq!(command_args.str("node_id").expect("node id"), "n1");
        assert_eq!(
            command_args.optional_numbers::<2>("position").expect("position"),
            Some([4.0, 5.5])
        );
        assert_eq!(command_args.optional_str("label").expect("label"), None);
    }

    #[test]
    fn numbers_accessor_checks_arity() {
        let values = args(json!({"position": [1, 2, 3]}));
        let command_args = CommandArgs::new("create", &values);
        let error = command_args
            .optional_numbers::<2>("position")
            .expect_err("wrong arity");
        assert_eq!(error.kind(), ErrorKind::InvalidArgumentError);
    }
}
