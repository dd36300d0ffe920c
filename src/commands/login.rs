// ABOUTME: Login command implementation.
// ABOUTME: Persists the resolved API key to the user configuration file.

use rokka::config::{self, Config};
use rokka::error::{Error, Result};
use rokka::output::Output;
use std::path::Path;

pub fn login(
    explicit: Option<&Path>,
    api_key: Option<String>,
    force: bool,
    output: &Output,
) -> Result<()> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => Config::default_path().ok_or_else(|| {
            Error::InvalidConfig("cannot locate the home directory; pass --config".into())
        })?,
    };

    let api_key = api_key.ok_or_else(|| {
        Error::InvalidArgument("pass the key with --api-key or ROKKA_API_KEY".into())
    })?;

    config::write_login(&path, &api_key, force)?;
    output.success(&format!("Configuration written to {}", path.display()));
    Ok(())
}
