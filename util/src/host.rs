//! Host platform utility functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::env;
use std::path::PathBuf;
use thiserror::Error;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Name of the environment variable pointing at the software root directory.
pub const SW_ROOT_ENV_VAR: &str = "ARM_SW_ROOT";

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with locating the software root.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("The software root environment variable (ARM_SW_ROOT) is not set")]
    SwRootNotSet,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the root directory of the software installation.
///
/// The root is given by the `ARM_SW_ROOT` environment variable, and is the
/// directory which contains the `params`, `scripts` and `sessions`
/// directories.
pub fn get_arm_sw_root() -> Result<PathBuf, HostError> {
    match env::var(SW_ROOT_ENV_VAR) {
        Ok(v) => Ok(PathBuf::from(v)),
        Err(_) => Err(HostError::SwRootNotSet),
    }
}
