//! # Arm script interpreter module
//!
//! This module provides an interpreter for timed command scripts, allowing
//! telecommands to be fed into the executable without an operator present.
//!
//! Scripts are plain text files in which each command line has the form
//! `<exec_time_s>: <command>;`, for example:
//!
//! ```text
//! 0.5: segment Boom;
//! 1.0: input roty -1;
//! 4.0: input none;
//! 6.0: go park;
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use regex::RegexBuilder;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

// Internal
use crate::session::get_elapsed_seconds;
use world_if::tc::{ArmTc, TcParseError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A command which is scripted to occur at a specific time.
pub struct Command {
    /// The time the command is supposed to execute at
    exec_time_s: f64,

    /// The telecommand to run
    tc: ArmTc,
}

/// A script interpreter.
///
/// After initialising with the path to the script to run use
/// `.get_pending_tcs` to acquire a list of telecommands that need executing.
pub struct ScriptInterpreter {
    _script_path: PathBuf,
    cmds: VecDeque<Command>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0}")]
    ScriptNotFound(String),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error(
        "Script contains an invalid timestamp: {0}. \
        Should be a float (like 1.0)"
    )]
    InvalidTimestamp(String),

    #[error("Script contains an invalid command at {0} s: {1}")]
    InvalidTc(f64, TcParseError),
}

pub enum PendingTcs {
    None,
    Some(Vec<ArmTc>),
    EndOfScript,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptInterpreter {
    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {
        // Get the path in a buffer
        let path = PathBuf::from(script_path.as_ref());

        // Check that the script file exists.
        if !path.exists() {
            return Err(ScriptError::ScriptNotFound(
                path.to_string_lossy().to_string(),
            ));
        }

        // Load the script into a string
        let script = match fs::read_to_string(script_path) {
            Ok(s) => s,
            Err(e) => return Err(ScriptError::ScriptLoadError(e)),
        };

        // Empty queue of commands
        let mut tc_queue: VecDeque<Command> = VecDeque::new();

        // Each command line is `<time>: <command>;`
        let re = RegexBuilder::new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
            .multi_line(true)
            .build()
            .unwrap();

        let mut num_caps = 0;

        for cap in re.captures_iter(&script) {
            // Parse the exec time
            let exec_time_s: f64 = match cap.get(1).unwrap().as_str().parse() {
                Ok(t) => t,
                Err(e) => return Err(ScriptError::InvalidTimestamp(format!("{}", e))),
            };

            // Parse the command from the payload
            let tc = match ArmTc::from_line(cap.get(3).unwrap().as_str()) {
                Ok(c) => c,
                Err(e) => return Err(ScriptError::InvalidTc(exec_time_s, e)),
            };

            // Build command from the match
            tc_queue.push_back(Command { exec_time_s, tc });

            num_caps += 1;
        }

        if num_caps == 0 {
            return Err(ScriptError::ScriptEmpty);
        }

        Ok(ScriptInterpreter {
            _script_path: path,
            cmds: tc_queue,
        })
    }

    /// Return a vector of pending TCs, or `None` if no TCs need executing now.
    pub fn get_pending_tcs(&mut self) -> PendingTcs {
        // If the queue is empty the script is over and we return the end of
        // script variant
        if self.cmds.is_empty() {
            return PendingTcs::EndOfScript;
        }

        let mut tc_vec: Vec<ArmTc> = vec![];

        let current_time_s = get_elapsed_seconds();

        // Peek items from the queue, if the head's exec time is lower than
        // the current time add it to the vector, and keep adding TCs until
        // the exec times are larger than the current time.
        while self
            .cmds
            .front()
            .map(|c| c.exec_time_s < current_time_s)
            .unwrap_or(false)
        {
            if let Some(cmd) = self.cmds.pop_front() {
                tc_vec.push(cmd.tc);
            }
        }

        // If the vector is longer than 0 return Some, otherwise None
        if !tc_vec.is_empty() {
            PendingTcs::Some(tc_vec)
        } else {
            PendingTcs::None
        }
    }

    /// Get the number of TCs in the script
    pub fn get_num_tcs(&self) -> usize {
        self.cmds.len()
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        match self.cmds.back() {
            Some(c) => c.exec_time_s,
            None => 0f64,
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn write_script(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_script() {
        let path = write_script(
            "si_test_load.txt",
            "# comment lines are skipped\n\
             0.5: segment Boom;\n\
             1.0: input roty -1;\n\
             4.0: input none;\n\
             6.0: go park;\n",
        );

        let si = ScriptInterpreter::new(&path).unwrap();

        assert_eq!(si.get_num_tcs(), 4);
        assert!((si.get_duration() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_bad_scripts_rejected() {
        let path = write_script("si_test_empty.txt", "no commands here\n");
        assert!(matches!(
            ScriptInterpreter::new(&path),
            Err(ScriptError::ScriptEmpty)
        ));

        let path = write_script("si_test_bad_tc.txt", "1.0: dance;\n");
        assert!(matches!(
            ScriptInterpreter::new(&path),
            Err(ScriptError::InvalidTc(_, _))
        ));

        assert!(matches!(
            ScriptInterpreter::new("/nonexistent/script.txt"),
            Err(ScriptError::ScriptNotFound(_))
        ));
    }
}
