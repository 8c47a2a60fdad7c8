// UI layer: dialoguer prompts, the interactive menu and the top-level error
// handler. Apps call into here for every piece of user input so the core
// modules never touch the terminal directly.

use crate::apps;
use crate::config::Config;
use crate::error::{LugachError, Result};
use crate::narrow::QuerySource;
use dialoguer::{Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::str::FromStr;
use std::time::Duration;

/// Reads narrowing queries from the terminal. Blank input is allowed so
/// the narrower can re-prompt instead of dialoguer.
pub struct DialoguerQueries;

impl QuerySource for DialoguerQueries {
    fn next_query(&mut self, prompt: &str) -> Result<String> {
        let query: String = Input::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?;
        Ok(query)
    }
}

/// Main interactive menu. Runs apps chosen from a keyboard-navigable list
/// until the user picks "Quit".
pub fn main_menu(config: &Config) -> anyhow::Result<()> {
    println!("Welcome to LUGACH! Please choose one of the following options:");
    let mut items: Vec<String> = apps::APPS
        .iter()
        .map(|(name, description)| Ok(format!("{} - {}", apps::title_from_app_name(name)?, description)))
        .collect::<Result<_>>()?;
    items.push("Quit application".to_string());

    loop {
        println!();
        let selection = Select::new().items(&items).default(0).interact()?;
        match apps::APPS.get(selection) {
            Some((name, _)) => run_app(name, config),
            None => break,
        }
    }
    Ok(())
}

/// Run one app and report anything that went wrong without letting the
/// error end the session.
pub fn run_app(name: &str, config: &Config) {
    tracing::info!(app = name, "starting app");
    if let Err(e) = apps::run(name, config) {
        if is_interrupt(&e) {
            println!();
            println!("Application terminated.");
        } else {
            handle_exception(&e);
        }
    }
}

/// True when the error chain bottoms out in a cancelled prompt.
pub fn is_interrupt(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        if let Some(e) = cause.downcast_ref::<LugachError>() {
            return e.is_interrupt();
        }
        let io_err = if let Some(dialoguer::Error::IO(e)) = cause.downcast_ref::<dialoguer::Error>() {
            Some(e)
        } else {
            cause.downcast_ref::<io::Error>()
        };
        io_err.is_some_and(|e| {
            matches!(e.kind(), io::ErrorKind::Interrupted | io::ErrorKind::UnexpectedEof)
        })
    })
}

/// Print a diagnostic for an app that failed and wait for acknowledgement.
pub fn handle_exception(err: &anyhow::Error) {
    tracing::error!(error = ?err, "app failed");
    println!();
    println!("Encountered exception ----------------------------------");
    println!("{err}");
    for cause in err.chain().skip(1) {
        println!("    caused by: {cause}");
    }
    println!("--------------------------------------------------------");
    if let Err(e) = wait_for_enter("Press ENTER to continue.") {
        tracing::debug!(error = %e, "acknowledgement prompt failed");
    }
}

pub fn wait_for_enter(prompt: &str) -> Result<()> {
    let _: String = Input::new().with_prompt(prompt).allow_empty(true).interact_text()?;
    Ok(())
}

/// Yes/no question, defaulting to no.
pub fn confirm(prompt: &str) -> Result<bool> {
    Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
}

/// Free text input; re-prompts while empty.
pub fn text(prompt: &str) -> Result<String> {
    Ok(Input::new().with_prompt(prompt).interact_text()?)
}

/// Free text input that may be left blank to keep `current`.
pub fn text_or_keep(prompt: &str, current: Option<&str>) -> Result<Option<String>> {
    let value: String = Input::new().with_prompt(prompt).allow_empty(true).interact_text()?;
    let value = value.trim();
    if value.is_empty() {
        Ok(current.map(str::to_string))
    } else {
        Ok(Some(value.to_string()))
    }
}

/// Parsed input; dialoguer re-prompts until the text parses as `T`.
pub fn number<T>(prompt: &str) -> Result<T>
where
    T: Clone + FromStr + ToString,
    <T as FromStr>::Err: ToString,
{
    Ok(Input::<T>::new().with_prompt(prompt).interact_text()?)
}

/// A spinner shown while a slow request runs. Call `finish_and_clear` on it.
pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
