// ABOUTME: Writes the user config file for `rokka login`.
// ABOUTME: Refuses to overwrite an existing file unless forced.

use std::path::Path;

use crate::error::{Error, Result};

use super::Config;

pub fn write_login(path: &Path, api_key: &str, force: bool) -> Result<()> {
    if api_key.trim().is_empty() {
        return Err(Error::InvalidArgument("API key cannot be empty".into()));
    }
    if path.exists() && !force {
        return Err(Error::AlreadyExists(path.to_path_buf()));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let yaml = generate_config_yaml(api_key, &Config::default())?;
    std::fs::write(path, yaml)?;
    restrict_permissions(path)?;

    tracing::debug!("wrote configuration to {}", path.display());
    Ok(())
}

fn generate_config_yaml(api_key: &str, defaults: &Config) -> Result<String> {
    let key = serde_yaml::to_string(api_key)?;
    Ok(format!(
        r#"api_key: {}
# api_address: {}
# api_version: "{}"
# timeout: {}
# retry:
#   max_retries: {}
#   max_delay: {}
"#,
        key.trim_end(),
        defaults.api_address,
        defaults.api_version,
        humantime_serde::re::humantime::format_duration(defaults.timeout),
        defaults.retry.max_retries,
        humantime_serde::re::humantime::format_duration(defaults.retry.max_delay),
    ))
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
