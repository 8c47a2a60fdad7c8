// Course, student and assignment pickers built on the narrower.

use crate::api::canvas::{Assignment, CanvasClient, Course, Student};
use crate::api::tophat::{TopHatClient, TopHatCourse};
use crate::error::{Result, SearchOutcome};
use crate::narrow::{name_matches, CandidateSource, Narrower, Query, QuerySource};
use std::io::Write;

/// Courses match on "NAME (m-yyyy)" so the same course from different
/// terms can be told apart.
pub fn match_course(query: &Query, course: &Course) -> bool {
    query.matches(&course.name_with_date())
}

/// Pick one of the courses the user designs. Courses without a start date
/// are not offered.
pub fn prompt_for_course<W: Write>(
    canvas: &CanvasClient,
    queries: &mut dyn QuerySource,
    out: W,
) -> Result<Course> {
    let courses: Vec<Course> = canvas
        .courses("designer")?
        .into_iter()
        .filter(|c| c.start_at.is_some())
        .collect();

    let mut narrower = Narrower::new(out, "course")
        .with_prompt("Choose one of the above options")
        .list_upfront(true);
    Ok(narrower.narrow(courses, queries, match_course)?.candidate)
}

/// Pick a student by searching the course roster on the server.
pub fn prompt_for_student<W: Write>(
    canvas: &CanvasClient,
    course: &Course,
    queries: &mut dyn QuerySource,
    out: W,
) -> Result<Student> {
    let mut search = |query: &Query| SearchOutcome::from_result(canvas.search_students(course.id, query));
    let source: &mut dyn CandidateSource<Student> = &mut search;
    let mut narrower = Narrower::new(out, "student");
    Ok(narrower.narrow_remote(source, queries, name_matches)?.candidate)
}

/// Pick an assignment, optionally only among those with a due date.
pub fn prompt_for_assignment<W: Write>(
    canvas: &CanvasClient,
    course: &Course,
    has_due_date: bool,
    queries: &mut dyn QuerySource,
    out: W,
) -> Result<Assignment> {
    let assignments: Vec<Assignment> = canvas
        .assignments(course.id, None)?
        .into_iter()
        .filter(|a| !has_due_date || a.due_at.is_some())
        .collect();

    let mut narrower = Narrower::new(out, "assignment")
        .with_prompt("Choose one of the above options")
        .list_upfront(true);
    Ok(narrower.narrow(assignments, queries, name_matches)?.candidate)
}

pub fn prompt_for_tophat_course<W: Write>(
    tophat: &TopHatClient,
    queries: &mut dyn QuerySource,
    out: W,
) -> Result<TopHatCourse> {
    let mut narrower = Narrower::new(out, "course")
        .with_prompt("Choose one of the above options")
        .list_upfront(true);
    Ok(narrower.narrow(tophat.courses()?, queries, name_matches)?.candidate)
}
