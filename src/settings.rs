//! Layered settings for the transition managers.
//!
//! Values come from an optional file (any format the `config` crate
//! understands, picked by extension) and are then overridden by environment
//! variables such as `BITEMPORAL__TRANSITIONS__REQUIRE_LIVE_FOR_DELETE=false`.
//! Anything left unset keeps its default.

use std::collections::HashMap;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;

pub const ENV_PREFIX: &str = "BITEMPORAL";

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub transitions: TransitionPolicy,
}

/// Knobs on how strictly transitions are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransitionPolicy {
    /// Reject `delete` on a version that is not live. When off, any version
    /// that has not been closed may still be deleted.
    pub require_live_for_delete: bool,
}

impl Default for TransitionPolicy {
    fn default() -> Self {
        Self {
            require_live_for_delete: true,
        }
    }
}

impl Settings {
    /// Reads `file` if it exists, then the process environment.
    pub fn load(file: &str) -> Result<Self> {
        Self::build(file, environment())
    }

    /// Like [`Settings::load`], but reads `vars` in place of the process
    /// environment.
    pub fn load_with_vars(file: &str, vars: HashMap<String, String>) -> Result<Self> {
        Self::build(file, environment().source(Some(vars)))
    }

    fn build(file: &str, env: Environment) -> Result<Self> {
        let built = Config::builder()
            .add_source(File::with_name(file).required(false))
            .add_source(env)
            .build()?;
        Ok(built.try_deserialize()?)
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}
