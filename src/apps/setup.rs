use crate::config::{self, Config};
use crate::ui;
use dialoguer::Password;

/// Read a secret without echoing it; blank keeps `current`.
fn secret(prompt: &str, current: Option<&str>) -> crate::error::Result<Option<String>> {
    let value = Password::new()
        .with_prompt(prompt)
        .allow_empty_password(true)
        .interact()?;
    let value = value.trim();
    if value.is_empty() {
        Ok(current.map(str::to_string))
    } else {
        Ok(Some(value.to_string()))
    }
}

/// Entries to write, skipping anything still unset.
pub fn entries(values: Vec<(&'static str, Option<String>)>) -> Vec<(&'static str, String)> {
    values
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect()
}

pub fn main(current: &Config) -> anyhow::Result<()> {
    println!("Leave any field blank to keep its current value.");
    println!();

    let values = vec![
        (
            config::CANVAS_API_URL,
            ui::text_or_keep(
                &format!("Canvas URL [{}]", current.canvas_url),
                Some(&current.canvas_url),
            )?,
        ),
        (
            config::CANVAS_API_KEY,
            secret("Canvas API key", current.canvas_key.as_deref())?,
        ),
        (
            config::TH_AUTH_KEY,
            secret("Top Hat refresh token", current.tophat_refresh_token.as_deref())?,
        ),
        (
            config::LIGHTHOUSE_TOKEN,
            secret("Lighthouse bearer token", current.lighthouse_token.as_deref())?,
        ),
    ];

    let path = Config::env_file_path();
    config::write_env_file(&path, &entries(values))?;
    println!();
    println!("Saved credentials to {}.", path.display());
    println!("Restart LUGACH for the new values to take effect.");
    Ok(())
}
