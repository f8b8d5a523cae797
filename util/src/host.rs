//! Host environment utility functions

use std::path::PathBuf;

/// Name of the environment variable which points at the software root
/// directory. Parameter files and session outputs are resolved against it.
pub const SW_ROOT_ENV_VAR: &str = "ROVER_SW_ROOT";

/// Get the rover software root directory from the environment.
pub fn get_rover_sw_root() -> Result<PathBuf, std::env::VarError> {
    Ok(PathBuf::from(std::env::var(SW_ROOT_ENV_VAR)?))
}
