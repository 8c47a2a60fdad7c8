// Lighthouse endpoints for final grade posting. The bearer token is taken
// from configuration; obtaining it is outside this crate.

use super::ApiClient;
use crate::error::Result;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One student's enrollment in a Lighthouse course section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub status: String,
    #[serde(default)]
    pub days_since_last_activity: Option<u32>,
    #[serde(default)]
    pub points: f64,
    #[serde(default)]
    pub final_grade: Option<String>,
}

impl Enrollment {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_removed(&self) -> bool {
        self.status == "REMOVED"
    }

    /// The already posted grade, ignoring empty strings.
    pub fn posted_grade(&self) -> Option<&str> {
        self.final_grade.as_deref().filter(|g| !g.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LetterGrade {
    A,
    B,
    C,
    D,
    F,
}

impl fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LetterGrade::A => "A",
            LetterGrade::B => "B",
            LetterGrade::C => "C",
            LetterGrade::D => "D",
            LetterGrade::F => "F",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for LetterGrade {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(LetterGrade::A),
            "B" | "b" => Ok(LetterGrade::B),
            "C" | "c" => Ok(LetterGrade::C),
            "D" | "d" => Ok(LetterGrade::D),
            "F" | "f" => Ok(LetterGrade::F),
            other => Err(format!("expected a letter grade (A, B, C, D, or F), got '{other}'")),
        }
    }
}

#[derive(Debug, Serialize)]
struct GradeRequest {
    grade: LetterGrade,
}

pub struct LighthouseClient {
    api: ApiClient,
}

impl LighthouseClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    fn section_params(course_sis_id: &str) -> Vec<(&'static str, String)> {
        vec![
            ("courseSisId", course_sis_id.to_string()),
            ("sis", "banner".to_string()),
            ("lms", "canvas_lu".to_string()),
        ]
    }

    pub fn enrollments(&self, course_sis_id: &str) -> Result<Vec<Enrollment>> {
        self.api.get_json(
            &format!("/rest/courses/{course_sis_id}/enrollments"),
            &Self::section_params(course_sis_id),
        )
    }

    pub fn post_grade(&self, course_sis_id: &str, enrollment: &Enrollment, grade: LetterGrade) -> Result<()> {
        self.api.send_json(
            Method::POST,
            &format!("/rest/enrollments/{}/grade", enrollment.id),
            &Self::section_params(course_sis_id),
            &GradeRequest { grade },
            StatusCode::OK,
        )?;
        Ok(())
    }
}
