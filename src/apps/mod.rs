// App registry. Each app is a `main(&Config)` function that drives one task
// end to end; `run` looks them up by snake_case name.

use crate::api::canvas::CanvasClient;
use crate::api::lighthouse::LighthouseClient;
use crate::api::tophat::TopHatClient;
use crate::api::ApiClient;
use crate::config::Config;
use crate::error::{LugachError, Result};

pub mod identify_absent_students;
pub mod identify_quiz_concerns;
pub mod modify_due_dates;
pub mod modify_time_limits;
pub mod post_final_grades;
pub mod search_student_by_name;
pub mod setup;

/// App names and one-line descriptions, in menu order.
pub const APPS: &[(&str, &str)] = &[
    ("setup", "Setup secret variables necessary for the other applications."),
    (
        "identify_absent_students",
        "Identify students who have missed an excessive number of classes.",
    ),
    (
        "identify_quiz_concerns",
        "Notify students who have failed to complete an excessive number of quizzes.",
    ),
    ("modify_due_dates", "Change due dates for a given student and assignment."),
    ("modify_time_limits", "Add percent time to all quizzes for a given student."),
    ("post_final_grades", "Post final grades for all students in a class."),
    ("search_student_by_name", "Search all classes for a given student."),
];

pub fn lint_app_name(name: &str) -> Result<()> {
    if APPS.iter().any(|(app, _)| *app == name) {
        Ok(())
    } else {
        Err(LugachError::UnknownApp {
            name: name.to_string(),
        })
    }
}

/// "modify_due_dates" -> "Modify Due Dates".
pub fn title_from_app_name(name: &str) -> Result<String> {
    lint_app_name(name)?;
    let words: Vec<String> = name
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();
    Ok(words.join(" "))
}

pub fn run(name: &str, config: &Config) -> anyhow::Result<()> {
    lint_app_name(name)?;
    match name {
        "setup" => setup::main(config),
        "identify_absent_students" => identify_absent_students::main(config),
        "identify_quiz_concerns" => identify_quiz_concerns::main(config),
        "modify_due_dates" => modify_due_dates::main(config),
        "modify_time_limits" => modify_time_limits::main(config),
        "post_final_grades" => post_final_grades::main(config),
        "search_student_by_name" => search_student_by_name::main(config),
        _ => Err(LugachError::UnknownApp {
            name: name.to_string(),
        }
        .into()),
    }
}

pub(crate) fn canvas_client(config: &Config) -> Result<CanvasClient> {
    let api = ApiClient::new(&config.canvas_url, config.retry_attempts)?.with_token(config.canvas_key()?);
    Ok(CanvasClient::new(api).with_max_pages(config.max_pages))
}

pub(crate) fn tophat_client(config: &Config) -> Result<TopHatClient> {
    let api = ApiClient::new(&config.tophat_url, config.retry_attempts)?;
    TopHatClient::login(api, config.tophat_refresh_token()?)
}

pub(crate) fn lighthouse_client(config: &Config) -> Result<LighthouseClient> {
    let api = ApiClient::new(&config.lighthouse_url, config.retry_attempts)?.with_token(config.lighthouse_token()?);
    Ok(LighthouseClient::new(api))
}
