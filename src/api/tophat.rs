// Top Hat endpoints: session token refresh, courses, students and the
// gradebook items that carry attendance totals.

use super::ApiClient;
use crate::attendance::{AttendanceRecord, AttendanceSource};
use crate::error::Result;
use crate::narrow::Candidate;
use crate::paginate::Page;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TopHatCourse {
    pub course_id: u64,
    pub course_name: String,
}

impl Candidate for TopHatCourse {
    fn display_name(&self) -> String {
        self.course_name.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TopHatStudent {
    pub id: u64,
    pub name: String,
}

impl Candidate for TopHatStudent {
    fn display_name(&self) -> String {
        self.name.clone()
    }
}

#[derive(Debug, Deserialize)]
struct CourseList {
    objects: Vec<TopHatCourse>,
}

#[derive(Debug, Deserialize)]
struct GradebookPage {
    #[serde(default)]
    results: Option<Vec<AttendanceRecord>>,
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    th_jwt_refresh: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    th_jwt: String,
}

pub struct TopHatClient {
    api: ApiClient,
}

impl TopHatClient {
    /// Exchange the long-lived refresh token for a session JWT and return a
    /// client that sends it on every request.
    pub fn login(mut api: ApiClient, refresh_token: &str) -> Result<Self> {
        let response = api.send_json(
            Method::POST,
            "/identity/v1/refresh_jwt/",
            &[],
            &RefreshRequest {
                th_jwt_refresh: refresh_token,
            },
            StatusCode::CREATED,
        )?;
        let body: RefreshResponse = response.json()?;
        api.set_token(&body.th_jwt);
        tracing::info!("Top Hat session token obtained");
        Ok(Self { api })
    }

    pub fn courses(&self) -> Result<Vec<TopHatCourse>> {
        let list: CourseList = self.api.get_json("/api/v2/courses/", &[])?;
        Ok(list.objects)
    }

    pub fn students(&self, course_id: u64) -> Result<Vec<TopHatStudent>> {
        self.api
            .get_json(&format!("/api/v3/course/{course_id}/students/"), &[])
    }
}

impl AttendanceSource for TopHatClient {
    fn attendance_page(&self, course_id: u64, student_id: u64, offset: usize, limit: usize) -> Result<Page<AttendanceRecord>> {
        let page: GradebookPage = self.api.get_json(
            &format!("/api/gradebook/v1/gradeable_items/{course_id}/"),
            &[
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
                ("student_ids", student_id.to_string()),
            ],
        )?;
        let has_more = page.next.as_deref().is_some_and(|next| !next.is_empty());
        Ok(Page {
            records: page.results.unwrap_or_default(),
            has_more,
        })
    }
}
