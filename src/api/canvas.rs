// Canvas LMS endpoints used by the apps. List endpoints paginate with
// `page`/`per_page` and advertise further pages through the `Link` header.

use super::{ApiClient, Params};
use crate::error::{LugachError, Result};
use crate::narrow::{Candidate, Query};
use crate::paginate::{Collector, Page};
use crate::retry::Success;
use chrono::{DateTime, Datelike, Utc};
use reqwest::blocking::Response;
use reqwest::header::LINK;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Canvas caps `per_page` at 100.
pub const PER_PAGE: usize = 100;

/// Fragment of the 400 body Canvas sends for a too-short `search_term`.
pub const SEARCH_TOO_SHORT: &str = "2 or more characters is required";

/// Statuses that end a search request: results, or a rejected term.
const SEARCH_STATUSES: &[StatusCode] = &[StatusCode::OK, StatusCode::BAD_REQUEST];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Course {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub start_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sis_course_id: Option<String>,
}

impl Course {
    /// "NAME (m-yyyy)" when the course has a start date, otherwise the name.
    pub fn name_with_date(&self) -> String {
        match self.start_at {
            Some(start) => format!("{} ({}-{})", self.name, start.month(), start.year()),
            None => self.name.clone(),
        }
    }
}

impl Candidate for Course {
    fn display_name(&self) -> String {
        self.name_with_date()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Student {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl Candidate for Student {
    fn display_name(&self) -> String {
        self.name.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Assignment {
    pub id: u64,
    pub name: String,
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub submission_types: Vec<String>,
    #[serde(default)]
    pub is_quiz_assignment: bool,
    #[serde(default)]
    pub quiz_id: Option<u64>,
}

impl Assignment {
    pub fn is_online_quiz(&self) -> bool {
        self.submission_types.iter().any(|t| t == "online_quiz")
    }
}

impl Candidate for Assignment {
    fn display_name(&self) -> String {
        self.name.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Quiz {
    pub id: u64,
    pub title: String,
    /// Minutes; absent for untimed quizzes.
    pub time_limit: Option<f64>,
    pub due_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Submission {
    pub user_id: u64,
    pub assignment_id: u64,
    #[serde(default)]
    pub missing: bool,
}

/// One student's submissions, as returned with `grouped=true`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubmissionGroup {
    pub user_id: u64,
    #[serde(default)]
    pub submissions: Vec<Submission>,
}

impl SubmissionGroup {
    pub fn missing_count(&self) -> usize {
        self.submissions.iter().filter(|s| s.missing).count()
    }
}

#[derive(Debug, Serialize)]
struct QuizExtension {
    user_id: u64,
    extra_time: f64,
}

#[derive(Debug, Serialize)]
struct QuizExtensions {
    quiz_extensions: Vec<QuizExtension>,
}

#[derive(Debug, Serialize)]
struct AssignmentOverride {
    student_ids: Vec<u64>,
    title: String,
    due_at: DateTime<Utc>,
    lock_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct OverrideRequest {
    assignment_override: AssignmentOverride,
}

#[derive(Debug, Serialize)]
pub struct Conversation {
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
    pub context_code: String,
}

/// True when the `Link` header advertises a `rel="next"` page.
pub fn has_next_page(response: &Response) -> bool {
    response
        .headers()
        .get_all(LINK)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|link| link.contains("rel=\"next\""))
}

pub struct CanvasClient {
    api: ApiClient,
    max_pages: Option<usize>,
}

impl CanvasClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api, max_pages: None }
    }

    pub fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Collect every page of a list endpoint.
    fn list<T: DeserializeOwned>(&self, path: &str, params: &Params) -> Result<Vec<T>> {
        self.collect_pages(params, |page_params| self.api.get(path, page_params))
    }

    /// Walk `page`/`per_page` until the `Link` header stops advertising a
    /// next page. `send` returns a response that is ready to decode.
    fn collect_pages<T, F>(&self, params: &Params, mut send: F) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
        F: FnMut(&Params) -> Result<Response>,
    {
        let mut fetch = |offset: usize, limit: usize| -> Result<Page<T>> {
            let mut page_params = params.clone();
            page_params.push(("page", (offset / limit + 1).to_string()));
            page_params.push(("per_page", limit.to_string()));

            let response = send(&page_params)?;
            let has_more = has_next_page(&response);
            Ok(Page {
                records: response.json()?,
                has_more,
            })
        };
        Collector::new(PER_PAGE)
            .with_max_pages(self.max_pages)
            .collect_all(&mut fetch)
    }

    pub fn courses(&self, enrollment_type: &str) -> Result<Vec<Course>> {
        tracing::info!(enrollment_type, "loading courses from Canvas");
        self.list("/api/v1/courses", &vec![("enrollment_type", enrollment_type.to_string())])
    }

    pub fn students(&self, course_id: u64) -> Result<Vec<Student>> {
        self.list(
            &format!("/api/v1/courses/{course_id}/users"),
            &vec![("enrollment_type[]", "student".to_string())],
        )
    }

    /// Server-side name search over every result page. A too-short term
    /// comes back as `QueryTooShort` without being retried; any other
    /// status except 200 is retried like a normal GET.
    pub fn search_students(&self, course_id: u64, query: &Query) -> Result<Vec<Student>> {
        let path = format!("/api/v1/courses/{course_id}/users");
        let params: Params = vec![
            ("enrollment_type[]", "student".to_string()),
            ("search_term", query.as_str().to_string()),
        ];
        self.collect_pages(&params, |page_params| {
            let response = self.api.get_until(&path, page_params, Success::AnyOf(SEARCH_STATUSES))?;
            if response.status() == StatusCode::OK {
                return Ok(response);
            }
            // Only a 400 gets here.
            let body = response.text()?;
            if body.contains(SEARCH_TOO_SHORT) {
                Err(LugachError::QueryTooShort {
                    message: SEARCH_TOO_SHORT.to_string(),
                })
            } else {
                Err(LugachError::UnexpectedStatus { status: 400, body })
            }
        })
    }

    pub fn assignments(&self, course_id: u64, bucket: Option<&str>) -> Result<Vec<Assignment>> {
        let mut params: Params = vec![("order_by", "due_at".to_string())];
        if let Some(bucket) = bucket {
            params.push(("bucket", bucket.to_string()));
        }
        self.list(&format!("/api/v1/courses/{course_id}/assignments"), &params)
    }

    pub fn quizzes(&self, course_id: u64) -> Result<Vec<Quiz>> {
        self.list(&format!("/api/v1/courses/{course_id}/quizzes"), &Vec::new())
    }

    pub fn quiz(&self, course_id: u64, quiz_id: u64) -> Result<Quiz> {
        self.api
            .get_json(&format!("/api/v1/courses/{course_id}/quizzes/{quiz_id}"), &[])
    }

    /// Due date of an assignment, looking at the quiz when the assignment
    /// wraps one.
    pub fn due_date(&self, course_id: u64, assignment: &Assignment) -> Result<Option<DateTime<Utc>>> {
        match (assignment.is_quiz_assignment, assignment.quiz_id) {
            (true, Some(quiz_id)) => Ok(self.quiz(course_id, quiz_id)?.due_at),
            _ => Ok(assignment.due_at),
        }
    }

    pub fn set_quiz_extra_time(&self, course_id: u64, quiz_id: u64, user_id: u64, extra_time: f64) -> Result<()> {
        let body = QuizExtensions {
            quiz_extensions: vec![QuizExtension { user_id, extra_time }],
        };
        self.api.send_json(
            Method::POST,
            &format!("/api/v1/courses/{course_id}/quizzes/{quiz_id}/extensions"),
            &[],
            &body,
            Success::Any2xx,
        )?;
        Ok(())
    }

    /// Give one student a personal due date (also used as the lock date).
    pub fn create_due_date_override(
        &self,
        course_id: u64,
        assignment_id: u64,
        student: &Student,
        due_at: DateTime<Utc>,
    ) -> Result<()> {
        let body = OverrideRequest {
            assignment_override: AssignmentOverride {
                student_ids: vec![student.id],
                title: student.name.clone(),
                due_at,
                lock_at: due_at,
            },
        };
        self.api.send_json(
            Method::POST,
            &format!("/api/v1/courses/{course_id}/assignments/{assignment_id}/overrides"),
            &[],
            &body,
            Success::Any2xx,
        )?;
        Ok(())
    }

    /// Submissions for `student_ids` x `assignment_ids`, grouped by student.
    pub fn grouped_submissions(
        &self,
        course_id: u64,
        student_ids: &[u64],
        assignment_ids: &[u64],
    ) -> Result<Vec<SubmissionGroup>> {
        let mut params: Params = vec![("grouped", "true".to_string())];
        params.extend(student_ids.iter().map(|id| ("student_ids[]", id.to_string())));
        params.extend(assignment_ids.iter().map(|id| ("assignment_ids[]", id.to_string())));
        self.list(&format!("/api/v1/courses/{course_id}/students/submissions"), &params)
    }

    pub fn create_conversation(&self, conversation: &Conversation) -> Result<()> {
        self.api
            .send_json(Method::POST, "/api/v1/conversations", &[], conversation, Success::Any2xx)?;
        Ok(())
    }
}
