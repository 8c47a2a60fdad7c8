// Library root
// -----------
// LUGACH automates routine course-staff chores against Canvas, Top Hat and
// Lighthouse. The binary (`main.rs`) parses the command line and hands off
// to `ui` or straight to an app.
//
// Module responsibilities:
// - `retry`, `paginate`, `narrow`: the generic request/selection machinery
//   (bounded retries, offset pagination, interactive query narrowing).
// - `attendance`: absence counting over Top Hat gradebook records.
// - `api`: HTTP clients for the three services.
// - `select`: course/student/assignment pickers built on `narrow`.
// - `apps`: one module per user-facing task.
// - `config`, `error`: environment-driven settings and the shared error type.
// - `ui`: dialoguer prompts, the interactive menu and the top-level error
//   handler.
pub mod api;
pub mod apps;
pub mod attendance;
pub mod config;
pub mod error;
pub mod narrow;
pub mod paginate;
pub mod retry;
pub mod select;
pub mod ui;
