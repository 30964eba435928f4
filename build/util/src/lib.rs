// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::env;
use std::path::{Path, PathBuf};

/// Asks cargo to re-run the build script whenever `var` changes.
pub fn rerun_if_env_changed(var: &str) {
    println!("cargo:rerun-if-env-changed={}", var);
}

///
/// Reads and parses a TOML configuration file.  As with the env-based
/// loaders below, `T` only needs to describe the parts of the file that the
/// caller cares about; whether unknown keys are rejected is up to `T`.
///
pub fn toml_from_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("could not read {}", path.display()))?;
    toml_from_str(&text)
        .with_context(|| format!("could not parse {}", path.display()))
}

/// Parses TOML text into `T`.
pub fn toml_from_str<T: DeserializeOwned>(text: &str) -> Result<T> {
    Ok(toml::from_str(text)?)
}

/// Pulls a configuration table out of the environment variable `var`, for
/// use from a `build.rs`. Uses `T::default()` if the variable is missing. If
/// the variable is present but fails to parse, this still fails with `Err`.
pub fn config_or_default<T: DeserializeOwned + Default>(
    var: &str,
) -> Result<T> {
    // We want to emit this whether or not the env var is present, so that we'll
    // be re-run if it becomes present.
    rerun_if_env_changed(var);

    let config = match env::var(var) {
        Ok(text) => {
            log::debug!("--- toml for ${} ---\n{}", var, text);
            text
        }
        Err(_) => {
            log::debug!("--- var ${} not present, using default ---", var);
            return Ok(T::default());
        }
    };
    toml_from_str(&config).with_context(|| format!("could not parse ${var}"))
}

/// Resolves `path` against the directory holding `file`, unless `path` is
/// already absolute. Board and version files name their inputs relative to
/// themselves.
pub fn relative_to(file: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_owned();
    }
    match file.parent() {
        Some(dir) => dir.join(path),
        None => path.to_owned(),
    }
}
