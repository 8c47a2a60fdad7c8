// Bounded retry around a single request. Any status other than the one the
// caller expects counts as a failure; there is no status-specific branching
// and no delay between attempts.

use crate::error::{LugachError, Result};
use reqwest::StatusCode;
use std::fmt::Display;

/// Anything that carries an HTTP status code.
pub trait StatusResponse {
    fn status_code(&self) -> StatusCode;
}

impl StatusResponse for reqwest::blocking::Response {
    fn status_code(&self) -> StatusCode {
        self.status()
    }
}

/// What counts as a successful response for one call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Success {
    Status(StatusCode),
    /// Any of the listed codes ends the loop; the caller sorts them out.
    AnyOf(&'static [StatusCode]),
    Any2xx,
}

impl Success {
    pub fn accepts(&self, status: StatusCode) -> bool {
        match self {
            Success::Status(expected) => status == *expected,
            Success::AnyOf(accepted) => accepted.contains(&status),
            Success::Any2xx => status.is_success(),
        }
    }
}

impl From<StatusCode> for Success {
    fn from(status: StatusCode) -> Self {
        Success::Status(status)
    }
}

/// Attempt counter for one logical remote operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    attempts: u32,
    max_attempts: u32,
}

impl RetryBudget {
    pub fn new(max_attempts: u32) -> Result<Self> {
        if max_attempts == 0 {
            return Err(LugachError::config("retry budget must allow at least one attempt"));
        }
        Ok(Self {
            attempts: 0,
            max_attempts,
        })
    }

    /// Count one attempt. Returns false once the budget is spent.
    fn try_consume(&mut self) -> bool {
        if self.attempts >= self.max_attempts {
            return false;
        }
        self.attempts += 1;
        true
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

/// Run `operation` until it answers with a status `expected` accepts, at
/// most `max_attempts` times. `label` names the request in progress messages
/// (usually the HTTP method).
pub fn call<R, E, F>(label: &str, max_attempts: u32, expected: impl Into<Success>, mut operation: F) -> Result<R>
where
    R: StatusResponse,
    E: Display,
    F: FnMut() -> std::result::Result<R, E>,
{
    let expected = expected.into();
    let mut budget = RetryBudget::new(max_attempts)?;

    while budget.try_consume() {
        let attempt = budget.attempts();
        match operation() {
            Ok(response) if expected.accepts(response.status_code()) => return Ok(response),
            Ok(response) => {
                let status = response.status_code();
                tracing::warn!(%status, attempt, max_attempts, "{label} request failed");
                println!(
                    "{label} request returned with code {}; retrying... ({attempt} of {max_attempts} attempts so far)",
                    status.as_u16()
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, attempt, max_attempts, "{label} request errored");
                println!("{label} request failed ({e}); retrying... ({attempt} of {max_attempts} attempts so far)");
            }
        }
    }

    Err(LugachError::RemoteUnavailable {
        attempts: budget.attempts(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Fake(StatusCode);

    impl StatusResponse for Fake {
        fn status_code(&self) -> StatusCode {
            self.0
        }
    }

    fn failing_then_ok(failures: u32, calls: &Cell<u32>) -> impl FnMut() -> std::result::Result<Fake, String> + '_ {
        move || {
            calls.set(calls.get() + 1);
            if calls.get() <= failures {
                Ok(Fake(StatusCode::TOO_MANY_REQUESTS))
            } else {
                Ok(Fake(StatusCode::OK))
            }
        }
    }

    #[test]
    fn fails_after_exactly_max_attempts() {
        let calls = Cell::new(0);
        let err = call("GET", 4, StatusCode::OK, failing_then_ok(u32::MAX, &calls))
            .err()
            .unwrap();
        assert!(matches!(err, LugachError::RemoteUnavailable { attempts: 4 }));
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn succeeds_on_last_attempt() {
        let calls = Cell::new(0);
        let res = call("GET", 4, StatusCode::OK, failing_then_ok(3, &calls)).unwrap();
        assert_eq!(res.0, StatusCode::OK);
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn stops_at_first_success() {
        let calls = Cell::new(0);
        call("POST", 10, StatusCode::OK, failing_then_ok(0, &calls)).unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn expected_status_is_caller_defined() {
        let calls = Cell::new(0);
        // 200 is a failure when the caller waits for 201.
        let err = call("POST", 2, StatusCode::CREATED, failing_then_ok(0, &calls))
            .err()
            .unwrap();
        assert!(matches!(err, LugachError::RemoteUnavailable { attempts: 2 }));
    }

    #[test]
    fn any_2xx_accepts_created() {
        let res = call("POST", 1, Success::Any2xx, || Ok::<_, String>(Fake(StatusCode::CREATED)));
        assert!(res.is_ok());
        assert!(!Success::Any2xx.accepts(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn listed_statuses_end_the_loop_without_retrying() {
        const OK_OR_BAD_REQUEST: &[StatusCode] = &[StatusCode::OK, StatusCode::BAD_REQUEST];
        let mut calls = 0;
        let res = call("GET", 5, Success::AnyOf(OK_OR_BAD_REQUEST), || {
            calls += 1;
            Ok::<_, String>(Fake(StatusCode::BAD_REQUEST))
        })
        .unwrap();
        assert_eq!(res.0, StatusCode::BAD_REQUEST);
        assert_eq!(calls, 1);
        assert!(!Success::AnyOf(OK_OR_BAD_REQUEST).accepts(StatusCode::SERVICE_UNAVAILABLE));
    }

    #[test]
    fn transport_errors_consume_attempts() {
        let mut calls = 0;
        let res = call("GET", 3, StatusCode::OK, || {
            calls += 1;
            if calls < 3 {
                Err("connection reset")
            } else {
                Ok(Fake(StatusCode::OK))
            }
        });
        assert!(res.is_ok());
        assert_eq!(calls, 3);
    }

    #[test]
    fn zero_budget_is_rejected() {
        let res = call("GET", 0, StatusCode::OK, || Ok::<_, String>(Fake(StatusCode::OK)));
        assert!(matches!(res, Err(LugachError::Config { .. })));
    }
}
