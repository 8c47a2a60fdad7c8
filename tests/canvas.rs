use lugach::api::canvas::{CanvasClient, Student};
use lugach::api::ApiClient;
use lugach::error::{ErrorClass, LugachError, SearchOutcome};
use lugach::narrow::{name_matches, CandidateSource, Narrower, Query, ScriptedQueries};
use mockito::{Matcher, Server};

fn client(server: &Server, attempts: u32) -> CanvasClient {
    let api = ApiClient::new(&server.url(), attempts).unwrap().with_token("canvas-key");
    CanvasClient::new(api)
}

#[test]
fn list_follows_link_header() {
    let mut server = Server::new();
    let next = format!("<{}/api/v1/courses?page=2&per_page=100>; rel=\"next\"", server.url());
    let first = server
        .mock("GET", "/api/v1/courses")
        .match_header("authorization", "Bearer canvas-key")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("enrollment_type".into(), "designer".into()),
            Matcher::UrlEncoded("page".into(), "1".into()),
            Matcher::UrlEncoded("per_page".into(), "100".into()),
        ]))
        .with_status(200)
        .with_header("link", &next)
        .with_body(r#"[{"id": 1, "name": "HIST 101", "start_at": "2024-01-15T05:00:00Z"}]"#)
        .create();
    let second = server
        .mock("GET", "/api/v1/courses")
        .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
        .with_status(200)
        .with_body(r#"[{"id": 2, "name": "HIST 201", "start_at": null, "sis_course_id": "HIST201_001"}]"#)
        .create();

    let courses = client(&server, 3).courses("designer").unwrap();

    first.assert();
    second.assert();
    assert_eq!(courses.len(), 2);
    assert_eq!(courses[0].name_with_date(), "HIST 101 (1-2024)");
    assert_eq!(courses[1].sis_course_id.as_deref(), Some("HIST201_001"));
}

#[test]
fn retries_run_out_on_persistent_errors() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/api/v1/courses/9/quizzes")
        .match_query(Matcher::Any)
        .with_status(503)
        .expect(3)
        .create();

    let err = client(&server, 3).quizzes(9).unwrap_err();

    mock.assert();
    assert!(matches!(err, LugachError::RemoteUnavailable { attempts: 3 }));
}

#[test]
fn short_search_terms_are_recoverable() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/api/v1/courses/3/users")
        .match_query(Matcher::UrlEncoded("search_term".into(), "a".into()))
        .with_status(400)
        .with_body(r#"{"errors":[{"message":"2 or more characters is required"}]}"#)
        .expect(1)
        .create();

    let err = client(&server, 10).search_students(3, &Query::new("A")).unwrap_err();

    mock.assert();
    assert!(matches!(err, LugachError::QueryTooShort { .. }));
    assert_eq!(
        err.classify(),
        ErrorClass::Recoverable("Too few characters, try again.".to_string())
    );
}

#[test]
fn other_search_failures_are_retried_then_fatal() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/api/v1/courses/3/users")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body("unauthorized")
        .expect(2)
        .create();

    let err = client(&server, 2).search_students(3, &Query::new("alice")).unwrap_err();

    mock.assert();
    assert!(matches!(err, LugachError::RemoteUnavailable { attempts: 2 }));
    assert_eq!(err.classify(), ErrorClass::Fatal);
}

#[test]
fn search_retries_a_busy_server() {
    let mut server = Server::new();
    // The 503 mock is served first; once its single hit is used up the 200
    // mock takes over.
    let busy = server
        .mock("GET", "/api/v1/courses/3/users")
        .match_query(Matcher::Any)
        .with_status(503)
        .expect(1)
        .create();
    let ok = server
        .mock("GET", "/api/v1/courses/3/users")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"[{"id": 7, "name": "Alice Smith"}]"#)
        .expect(1)
        .create();

    let found = client(&server, 3).search_students(3, &Query::new("alice")).unwrap();

    busy.assert();
    ok.assert();
    assert_eq!(found.len(), 1);
}

fn two_page_search(server: &mut Server) -> (mockito::Mock, mockito::Mock) {
    let next = format!(
        "<{}/api/v1/courses/3/users?search_term=alice&page=2&per_page=100>; rel=\"next\"",
        server.url()
    );
    let first = server
        .mock("GET", "/api/v1/courses/3/users")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("search_term".into(), "alice".into()),
            Matcher::UrlEncoded("page".into(), "1".into()),
        ]))
        .with_status(200)
        .with_header("link", &next)
        .with_body(r#"[{"id": 7, "name": "Alice Smith"}]"#)
        .expect(1)
        .create();
    let second = server
        .mock("GET", "/api/v1/courses/3/users")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("search_term".into(), "alice".into()),
            Matcher::UrlEncoded("page".into(), "2".into()),
        ]))
        .with_status(200)
        .with_body(r#"[{"id": 8, "name": "Alice Jones"}]"#)
        .expect(1)
        .create();
    (first, second)
}

#[test]
fn search_collects_every_page() {
    let mut server = Server::new();
    let (first, second) = two_page_search(&mut server);

    let found = client(&server, 3).search_students(3, &Query::new("Alice")).unwrap();

    first.assert();
    second.assert();
    let names: Vec<&str> = found.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Alice Smith", "Alice Jones"]);
}

#[test]
fn matches_on_a_later_page_keep_the_selection_ambiguous() {
    let mut server = Server::new();
    let _pages = two_page_search(&mut server);
    let canvas = client(&server, 3);

    let mut search = |query: &Query| SearchOutcome::from_result(canvas.search_students(3, query));
    let source: &mut dyn CandidateSource<Student> = &mut search;
    let mut queries = ScriptedQueries::new(["alice", "smith"]);
    let mut narrower = Narrower::new(Vec::<u8>::new(), "student");

    let selection = narrower.narrow_remote(source, &mut queries, name_matches).unwrap();

    assert_eq!(selection.candidate.id, 7);
    assert_eq!(selection.rounds, 2);
    let out = String::from_utf8(narrower.into_inner()).unwrap();
    assert!(out.contains("Your query returned 2 students."));
}

#[test]
fn quiz_extension_accepts_any_success_status() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/api/v1/courses/3/quizzes/8/extensions")
        .match_body(Matcher::Json(serde_json::json!({
            "quiz_extensions": [{"user_id": 42, "extra_time": 15.0}]
        })))
        .with_status(201)
        .expect(1)
        .create();

    client(&server, 3).set_quiz_extra_time(3, 8, 42, 15.0).unwrap();
    mock.assert();
}
