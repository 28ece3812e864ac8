//! Send jobs loaded from JSON files.

use std::path::Path;

use anyhow::{Context, Result};
use ordermail_smtp::EmailData;

/// Environment variable that overrides the password stored in a job file.
pub const PASSWORD_ENV: &str = "ORDERMAIL_PASSWORD";

/// Reads an [`EmailData`] job from `path`.
///
/// A relative attachment path is resolved against the job file's directory.
pub fn load(path: &Path) -> Result<EmailData> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read job file {}", path.display()))?;
    let mut data: EmailData = serde_json::from_str(&text)
        .with_context(|| format!("invalid job file {}", path.display()))?;

    if let (Some(attachment), Some(dir)) = (data.attachment.as_mut(), path.parent())
        && attachment.path.is_relative()
    {
        attachment.path = dir.join(&attachment.path);
    }

    Ok(data)
}

/// Replaces the job password with `password` when one is given.
pub fn apply_password(data: &mut EmailData, password: Option<String>) {
    if let Some(password) = password.filter(|p| !p.is_empty()) {
        data.server.password = password;
    }
}
