use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use oax_core::request::Credentials;

/// A connection profile in the external credential-store shape: `specUrl`,
/// optional `baseUrlOverride`, and the flat credential fields keyed by
/// `authType`.
#[derive(Debug, Clone, Default)]
pub struct Profile {
    pub spec_url: Option<String>,
    pub base_url_override: Option<String>,
    pub credentials: Credentials,
}

pub fn load_profile(path: &Path) -> Result<Profile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_profile(&content).with_context(|| format!("failed to parse profile {}", path.display()))
}

/// Parse a profile from YAML (or JSON) text. A missing `authType` means no
/// authentication.
pub fn parse_profile(content: &str) -> Result<Profile> {
    let raw: serde_json::Value = serde_yaml_ng::from_str(content)?;

    let credentials = if raw.get("authType").is_some() {
        serde_json::from_value(raw.clone())?
    } else {
        Credentials::None
    };

    Ok(Profile {
        spec_url: raw
            .get("specUrl")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        base_url_override: raw
            .get("baseUrlOverride")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        credentials,
    })
}
