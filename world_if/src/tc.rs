//! # Telecommand module
//!
//! This module defines the textual command surface of the arm control
//! software and its parser. Commands arrive either from timed scripts or
//! from an interactive console; both produce `ArmTc` values.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use thiserror::Error;

// Internal
use crate::eqpt::Axis;

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// A telecommand, i.e. an instruction to the arm control software.
#[derive(Debug, Clone, PartialEq)]
pub enum ArmTc {
    /// `segment <name>` - select the active segment
    Segment(String),

    /// `store <name>` - store the current targets as a named pose
    Store(String),

    /// `go <name>` - start restoring a named pose
    Go(String),

    /// `toolmode on|off` - suppress unrelated vehicle controls
    ToolMode(bool),

    /// `pause` - manually pause the arm
    Pause,

    /// `unpause` - release a manual pause
    Unpause,

    /// `reload` - re-read the configuration
    Reload,

    /// `lock` / `unlock` - lock or unlock all rotary actuators
    Lock(bool),

    /// `input <axis> <value>` - set operator input on a logical axis, held
    /// until changed
    Input(Axis, f64),

    /// `input none` - clear all operator input
    InputClear,
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("Empty command")]
    Empty,

    #[error("\"{0}\" is not a recognised command")]
    UnknownCommand(String),

    #[error("Command \"{0}\" is missing its argument")]
    MissingArgument(String),

    #[error("\"{0}\" is not a valid argument for \"{1}\"")]
    InvalidArgument(String, String),
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl ArmTc {
    /// Parse a telecommand from a single command line.
    pub fn from_line(line: &str) -> Result<Self, TcParseError> {
        let mut tokens = line.split_whitespace();

        let keyword = match tokens.next() {
            Some(k) => k.to_lowercase(),
            None => return Err(TcParseError::Empty),
        };

        let tc = match keyword.as_str() {
            "segment" => ArmTc::Segment(name_arg(&keyword, tokens.next())?),
            "store" => ArmTc::Store(name_arg(&keyword, tokens.next())?),
            "go" => ArmTc::Go(name_arg(&keyword, tokens.next())?),
            "toolmode" => match name_arg(&keyword, tokens.next())?.as_str() {
                "on" => ArmTc::ToolMode(true),
                "off" => ArmTc::ToolMode(false),
                other => {
                    return Err(TcParseError::InvalidArgument(
                        other.to_string(),
                        keyword,
                    ))
                }
            },
            "pause" => ArmTc::Pause,
            "unpause" => ArmTc::Unpause,
            "reload" => ArmTc::Reload,
            "lock" => ArmTc::Lock(true),
            "unlock" => ArmTc::Lock(false),
            "input" => {
                let axis_str = name_arg(&keyword, tokens.next())?.to_lowercase();

                if axis_str == "none" {
                    ArmTc::InputClear
                } else {
                    let axis = match Axis::from_name(&axis_str) {
                        Some(a) => a,
                        None => {
                            return Err(TcParseError::InvalidArgument(axis_str, keyword))
                        }
                    };

                    let value_str = name_arg(&keyword, tokens.next())?;
                    let value: f64 = match value_str.parse() {
                        Ok(v) => v,
                        Err(_) => {
                            return Err(TcParseError::InvalidArgument(value_str, keyword))
                        }
                    };

                    ArmTc::Input(axis, value)
                }
            }
            _ => return Err(TcParseError::UnknownCommand(keyword)),
        };

        Ok(tc)
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Require an argument token for the given command keyword.
fn name_arg(keyword: &str, token: Option<&str>) -> Result<String, TcParseError> {
    match token {
        Some(t) => Ok(t.to_string()),
        None => Err(TcParseError::MissingArgument(keyword.to_string())),
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
