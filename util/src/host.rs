//! Host platform utility functions

use std::env;
use std::path::PathBuf;

/// Environment variable pointing at the root of the software tree. Parameter
/// files and session directories are resolved relative to it.
pub const SW_ROOT_ENV_VAR: &str = "BALLPLATE_SW_ROOT";

/// Get the root directory of the software tree.
pub fn get_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
