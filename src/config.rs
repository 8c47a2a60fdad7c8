// Runtime configuration. Values come from the process environment after
// loading `~/.lugach.env` and then `./.env` (existing variables win), with
// defaults for everything except credentials.

use crate::api::lighthouse::LetterGrade;
use crate::error::{LugachError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const ENV_FILE_NAME: &str = ".lugach.env";

pub const CANVAS_API_URL: &str = "CANVAS_API_URL";
pub const CANVAS_API_KEY: &str = "CANVAS_API_KEY";
pub const TOPHAT_API_URL: &str = "TOPHAT_API_URL";
pub const TH_AUTH_KEY: &str = "TH_AUTH_KEY";
pub const LIGHTHOUSE_API_URL: &str = "LIGHTHOUSE_API_URL";
pub const LIGHTHOUSE_TOKEN: &str = "LIGHTHOUSE_TOKEN";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub canvas_url: String,
    pub canvas_key: Option<String>,
    pub tophat_url: String,
    pub tophat_refresh_token: Option<String>,
    pub lighthouse_url: String,
    pub lighthouse_token: Option<String>,
    pub retry_attempts: u32,
    pub page_size: usize,
    /// `None` disables the page cap.
    pub max_pages: Option<usize>,
    pub absence_tolerance: u32,
    pub quiz_tolerance: usize,
    pub chunk_size: usize,
    /// Lowest point total for each letter, highest letter first.
    pub grade_cutoffs: Vec<(LetterGrade, f64)>,
    /// Points of leeway subtracted from every cutoff.
    pub grade_tolerance: f64,
    pub inactivity_days: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            canvas_url: "https://canvas.liberty.edu".to_string(),
            canvas_key: None,
            tophat_url: "https://app.tophat.com".to_string(),
            tophat_refresh_token: None,
            lighthouse_url: "https://lighthouse.okd.liberty.edu".to_string(),
            lighthouse_token: None,
            retry_attempts: 10,
            page_size: 2000,
            max_pages: Some(500),
            absence_tolerance: 4,
            quiz_tolerance: 3,
            chunk_size: 20,
            grade_cutoffs: vec![
                (LetterGrade::A, 900.0),
                (LetterGrade::B, 800.0),
                (LetterGrade::C, 700.0),
                (LetterGrade::D, 600.0),
            ],
            grade_tolerance: 10.0,
            inactivity_days: 21,
        }
    }
}

impl Config {
    /// Path of the per-user env file written by the setup app.
    pub fn env_file_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(ENV_FILE_NAME)
    }

    /// Load env files into the process environment, then read the config.
    pub fn load() -> Result<Self> {
        let user_file = Self::env_file_path();
        ignore_missing(dotenv::from_path(&user_file), &user_file.display().to_string())?;
        ignore_missing(dotenv::dotenv(), ".env")?;
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; unset keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let max_pages = match parse_or(&get, "LUGACH_MAX_PAGES", defaults.max_pages.unwrap_or(0))? {
            0 => None,
            n => Some(n),
        };
        let grade_cutoffs = match get("LUGACH_GRADE_CUTOFFS") {
            Some(raw) => parse_cutoffs(&raw)?,
            None => defaults.grade_cutoffs,
        };

        let config = Self {
            canvas_url: get(CANVAS_API_URL).unwrap_or(defaults.canvas_url),
            canvas_key: get(CANVAS_API_KEY),
            tophat_url: get(TOPHAT_API_URL).unwrap_or(defaults.tophat_url),
            tophat_refresh_token: get(TH_AUTH_KEY),
            lighthouse_url: get(LIGHTHOUSE_API_URL).unwrap_or(defaults.lighthouse_url),
            lighthouse_token: get(LIGHTHOUSE_TOKEN),
            retry_attempts: parse_or(&get, "LUGACH_RETRY_ATTEMPTS", defaults.retry_attempts)?,
            page_size: parse_or(&get, "LUGACH_PAGE_SIZE", defaults.page_size)?,
            max_pages,
            absence_tolerance: parse_or(&get, "LUGACH_ABSENCE_TOLERANCE", defaults.absence_tolerance)?,
            quiz_tolerance: parse_or(&get, "LUGACH_QUIZ_TOLERANCE", defaults.quiz_tolerance)?,
            chunk_size: parse_or(&get, "LUGACH_CHUNK_SIZE", defaults.chunk_size)?,
            grade_cutoffs,
            grade_tolerance: parse_or(&get, "LUGACH_GRADE_TOLERANCE", defaults.grade_tolerance)?,
            inactivity_days: parse_or(&get, "LUGACH_INACTIVITY_DAYS", defaults.inactivity_days)?,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.retry_attempts == 0 {
            return Err(LugachError::config("LUGACH_RETRY_ATTEMPTS must be at least 1"));
        }
        if self.page_size == 0 || self.chunk_size == 0 {
            return Err(LugachError::config("page and chunk sizes must be positive"));
        }
        Ok(())
    }

    pub fn canvas_key(&self) -> Result<&str> {
        require(self.canvas_key.as_deref(), CANVAS_API_KEY)
    }

    pub fn tophat_refresh_token(&self) -> Result<&str> {
        require(self.tophat_refresh_token.as_deref(), TH_AUTH_KEY)
    }

    pub fn lighthouse_token(&self) -> Result<&str> {
        require(self.lighthouse_token.as_deref(), LIGHTHOUSE_TOKEN)
    }
}

/// A missing env file is fine; one that exists but cannot be read or
/// parsed is a config error.
fn ignore_missing<T>(result: dotenv::Result<T>, file: &str) -> Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(LugachError::config(format!("failed to read {file}: {e}"))),
    }
}

fn require<'a>(value: Option<&'a str>, key: &str) -> Result<&'a str> {
    value.ok_or_else(|| LugachError::config(format!("{key} is not set; run the setup app first")))
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| LugachError::config(format!("{key} has an invalid value: {raw}"))),
        None => Ok(default),
    }
}

/// Parse `A=900,B=800,...` into cutoffs sorted from highest to lowest.
pub fn parse_cutoffs(raw: &str) -> Result<Vec<(LetterGrade, f64)>> {
    let mut cutoffs = raw
        .split(',')
        .map(|pair| {
            let (grade, points) = pair
                .split_once('=')
                .ok_or_else(|| LugachError::config(format!("grade cutoff '{pair}' is not GRADE=POINTS")))?;
            let grade: LetterGrade = grade.parse().map_err(LugachError::config)?;
            let points: f64 = points
                .trim()
                .parse()
                .map_err(|_| LugachError::config(format!("grade cutoff '{pair}' has invalid points")))?;
            Ok((grade, points))
        })
        .collect::<Result<Vec<_>>>()?;
    cutoffs.sort_by(|a, b| b.1.total_cmp(&a.1));
    Ok(cutoffs)
}

/// Set `entries` in the env file at `path`, keeping any other lines.
pub fn write_env_file(path: &Path, entries: &[(&str, String)]) -> Result<()> {
    let existing = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };

    let updates: HashMap<&str, &String> = entries.iter().map(|(k, v)| (*k, v)).collect();
    let mut written = Vec::new();
    let mut lines: Vec<String> = existing
        .lines()
        .map(|line| {
            let key = line.split_once('=').map(|(k, _)| k.trim());
            match key.and_then(|k| updates.get_key_value(k)) {
                Some((k, v)) => {
                    written.push(*k);
                    format!("{k}={v}")
                }
                None => line.to_string(),
            }
        })
        .collect();
    for (k, v) in entries {
        if !written.contains(k) {
            lines.push(format!("{k}={v}"));
        }
    }

    std::fs::write(path, lines.join("\n") + "\n")?;
    Ok(())
}
