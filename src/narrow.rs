// Interactive disambiguation: keep asking for a query and filtering the
// working set until exactly one candidate is left.
//
// The working set is replaced every round. An empty result resets it to the
// original set, several results narrow the next round further, and a single
// result ends the loop. There is no round limit.

use crate::error::{LugachError, Result, SearchOutcome};
use std::collections::VecDeque;
use std::io::{self, Write};

/// Anything the user can pick by name.
pub trait Candidate {
    fn display_name(&self) -> String;
}

/// Trimmed, lowercased form used on both sides of every comparison.
pub fn sanitize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// A sanitized search term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query(String);

impl Query {
    pub fn new(raw: &str) -> Self {
        Query(sanitize(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Substring match against the sanitized form of `text`.
    pub fn matches(&self, text: &str) -> bool {
        sanitize(text).contains(&self.0)
    }
}

/// Default predicate: the query is a substring of the display name.
pub fn name_matches<C: Candidate>(query: &Query, candidate: &C) -> bool {
    query.matches(&candidate.display_name())
}

/// Result of evaluating one filtered set.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionOutcome<C> {
    Unique(C),
    Empty,
    Ambiguous(Vec<C>),
}

impl<C> SelectionOutcome<C> {
    pub fn evaluate(mut set: Vec<C>) -> Self {
        match set.len() {
            0 => Self::Empty,
            1 => Self::Unique(set.remove(0)),
            _ => Self::Ambiguous(set),
        }
    }
}

/// Produces one raw query per round.
pub trait QuerySource {
    fn next_query(&mut self, prompt: &str) -> Result<String>;
}

/// Replays a fixed list of queries; runs out with an end-of-input error.
#[derive(Debug, Default)]
pub struct ScriptedQueries {
    queries: VecDeque<String>,
}

impl ScriptedQueries {
    pub fn new<I, S>(queries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            queries: queries.into_iter().map(Into::into).collect(),
        }
    }
}

impl QuerySource for ScriptedQueries {
    fn next_query(&mut self, _prompt: &str) -> Result<String> {
        self.queries.pop_front().ok_or_else(|| {
            LugachError::Io(io::Error::new(io::ErrorKind::UnexpectedEof, "no more scripted queries"))
        })
    }
}

/// A live search, e.g. a server-side search-by-substring endpoint.
pub trait CandidateSource<C> {
    fn search(&mut self, query: &Query) -> SearchOutcome<C>;
}

impl<C, F> CandidateSource<C> for F
where
    F: FnMut(&Query) -> SearchOutcome<C>,
{
    fn search(&mut self, query: &Query) -> SearchOutcome<C> {
        self(query)
    }
}

/// The chosen candidate and how many rounds it took to get there.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<C> {
    pub candidate: C,
    pub rounds: usize,
}

enum Origin<'s, C> {
    Local(Vec<C>),
    Remote(&'s mut dyn CandidateSource<C>),
}

pub struct Narrower<W: Write> {
    out: W,
    noun: String,
    prompt: String,
    list_upfront: bool,
}

impl Narrower<io::Stdout> {
    pub fn stdout(noun: &str) -> Self {
        Self::new(io::stdout(), noun)
    }
}

impl<W: Write> Narrower<W> {
    pub fn new(out: W, noun: &str) -> Self {
        Self {
            out,
            noun: noun.to_string(),
            prompt: format!("Search for the {noun} by name"),
            list_upfront: false,
        }
    }

    pub fn with_prompt(mut self, prompt: &str) -> Self {
        self.prompt = prompt.to_string();
        self
    }

    /// Print the full option list before the first round and after every
    /// reset. Only applies to in-memory candidate sets.
    pub fn list_upfront(mut self, enabled: bool) -> Self {
        self.list_upfront = enabled;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Narrow an already fetched candidate set.
    pub fn narrow<C, Q, P>(&mut self, initial: Vec<C>, queries: &mut Q, predicate: P) -> Result<Selection<C>>
    where
        C: Candidate + Clone,
        Q: QuerySource + ?Sized,
        P: Fn(&Query, &C) -> bool,
    {
        if initial.is_empty() {
            return Err(LugachError::invalid_input(format!(
                "there are no {}s to choose from",
                self.noun
            )));
        }
        self.run(Origin::Local(initial), queries, predicate)
    }

    /// Narrow against a live search. Whenever the working set is the
    /// original one, the round asks `source` afresh; once results are
    /// ambiguous, later rounds filter them locally with `predicate`.
    pub fn narrow_remote<C, Q, P>(
        &mut self,
        source: &mut dyn CandidateSource<C>,
        queries: &mut Q,
        predicate: P,
    ) -> Result<Selection<C>>
    where
        C: Candidate + Clone,
        Q: QuerySource + ?Sized,
        P: Fn(&Query, &C) -> bool,
    {
        self.run(Origin::Remote(source), queries, predicate)
    }

    fn run<C, Q, P>(&mut self, mut origin: Origin<'_, C>, queries: &mut Q, predicate: P) -> Result<Selection<C>>
    where
        C: Candidate + Clone,
        Q: QuerySource + ?Sized,
        P: Fn(&Query, &C) -> bool,
    {
        let mut working: Option<Vec<C>> = None;
        let mut rounds = 0;

        if let Origin::Local(all) = &origin {
            if self.list_upfront {
                self.print_options(all)?;
            }
        }

        loop {
            let query = Query::new(&queries.next_query(&self.prompt)?);
            // A blank query is a typo, not a round.
            if query.is_empty() {
                writeln!(self.out, "Please enter a search term.")?;
                continue;
            }

            let keep = |set: &[C]| -> Vec<C> { set.iter().filter(|c| predicate(&query, c)).cloned().collect() };
            // Ambiguous results are filtered locally; otherwise start over
            // from the full set (or a fresh server search).
            let filtered = match (&working, &mut origin) {
                (Some(current), _) => keep(current),
                (None, Origin::Local(all)) => keep(all),
                (None, Origin::Remote(source)) => match source.search(&query) {
                    SearchOutcome::Candidates(found) => found,
                    SearchOutcome::Recoverable(message) => {
                        // Same round again; nothing was narrowed.
                        writeln!(self.out, "{message}")?;
                        continue;
                    }
                    SearchOutcome::Fatal(e) => return Err(e),
                },
            };
            rounds += 1;
            tracing::debug!(round = rounds, query = query.as_str(), matches = filtered.len(), "narrowing round");

            match SelectionOutcome::evaluate(filtered) {
                SelectionOutcome::Unique(candidate) => {
                    writeln!(self.out, "\nYou chose {}.", candidate.display_name())?;
                    return Ok(Selection { candidate, rounds });
                }
                SelectionOutcome::Empty => {
                    writeln!(self.out, "\nNo such {} was found.", self.noun)?;
                    // Reset: the next query searches everything again.
                    working = None;
                    if let Origin::Local(all) = &origin {
                        if self.list_upfront {
                            self.print_options(all)?;
                        }
                    }
                }
                SelectionOutcome::Ambiguous(set) => {
                    writeln!(self.out, "\nYour query returned {} {}s.", set.len(), self.noun)?;
                    writeln!(self.out, "Here are their names:\n")?;
                    for candidate in &set {
                        writeln!(self.out, "    {}", candidate.display_name())?;
                    }
                    writeln!(self.out)?;
                    working = Some(set);
                }
            }
        }
    }

    fn print_options<C: Candidate>(&mut self, set: &[C]) -> Result<()> {
        writeln!(self.out, "Which {} would you like to access?", self.noun)?;
        writeln!(self.out, "The options are:\n")?;
        for candidate in set {
            writeln!(self.out, "    {}", candidate.display_name())?;
        }
        writeln!(self.out)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Debug, Clone, PartialEq)]
    struct Named(&'static str);

    impl Candidate for Named {
        fn display_name(&self) -> String {
            self.0.to_string()
        }
    }

    fn people() -> Vec<Named> {
        vec![Named("Alice Smith"), Named("Alice Jones"), Named("Bob Lee")]
    }

    fn narrower() -> Narrower<Vec<u8>> {
        Narrower::new(Vec::new(), "student")
    }

    fn output(n: Narrower<Vec<u8>>) -> String {
        String::from_utf8(n.into_inner()).unwrap()
    }

    #[test]
    fn sanitize_is_idempotent_and_case_insensitive() {
        assert_eq!(sanitize("  Alice SMITH \t"), "alice smith");
        assert_eq!(sanitize(&sanitize("  Alice ")), sanitize("  Alice "));
        assert_eq!(Query::new(" ALICE "), Query::new("alice"));
    }

    #[test]
    fn evaluate_never_guesses() {
        assert_eq!(SelectionOutcome::<u8>::evaluate(vec![]), SelectionOutcome::Empty);
        assert_eq!(SelectionOutcome::evaluate(vec![4]), SelectionOutcome::Unique(4));
        assert_eq!(
            SelectionOutcome::evaluate(vec![4, 5]),
            SelectionOutcome::Ambiguous(vec![4, 5])
        );
    }

    #[test]
    fn ambiguous_then_unique_narrows_progressively() {
        let mut n = narrower();
        let mut queries = ScriptedQueries::new(["alice", "smith"]);
        let selection = n.narrow(people(), &mut queries, name_matches).unwrap();
        assert_eq!(selection.candidate, Named("Alice Smith"));
        assert_eq!(selection.rounds, 2);

        let out = output(n);
        assert!(out.contains("Your query returned 2 students."));
        let alice_smith = out.find("    Alice Smith").unwrap();
        let alice_jones = out.find("    Alice Jones").unwrap();
        assert!(alice_smith < alice_jones);
        assert!(!out.contains("    Bob Lee"));
        assert!(out.contains("You chose Alice Smith."));
    }

    #[test]
    fn narrowing_filters_the_narrowed_set_not_the_original() {
        // "lee" would match Bob Lee in the full set, but not among the Alices.
        let mut n = narrower();
        let mut queries = ScriptedQueries::new(["alice", "lee", "jones"]);
        let selection = n.narrow(people(), &mut queries, name_matches).unwrap();
        assert_eq!(selection.candidate, Named("Alice Jones"));
        // the empty round reset to the full set, so "jones" searched everyone
        assert_eq!(selection.rounds, 3);
        assert!(output(n).contains("No such student was found."));
    }

    #[test]
    fn empty_result_resets_to_original_set() {
        let mut n = narrower();
        let mut queries = ScriptedQueries::new(["zzz", "bob"]);
        let selection = n.narrow(vec![Named("Bob Lee")], &mut queries, name_matches).unwrap();
        assert_eq!(selection.candidate, Named("Bob Lee"));
        assert!(output(n).contains("No such student was found."));
    }

    #[test]
    fn reset_after_narrowing_brings_back_everyone() {
        let mut n = narrower();
        let mut queries = ScriptedQueries::new(["alice", "zzz", "bob"]);
        let selection = n.narrow(people(), &mut queries, name_matches).unwrap();
        assert_eq!(selection.candidate, Named("Bob Lee"));
    }

    #[test]
    fn case_and_whitespace_do_not_change_results() {
        for q in ["smith", "  SMITH ", "Smith\t"] {
            let mut n = narrower();
            let mut queries = ScriptedQueries::new([q]);
            let selection = n.narrow(people(), &mut queries, name_matches).unwrap();
            assert_eq!(selection.candidate, Named("Alice Smith"));
        }
    }

    #[test]
    fn blank_queries_do_not_count_as_rounds() {
        let mut n = narrower();
        let mut queries = ScriptedQueries::new(["   ", "", "bob"]);
        let selection = n.narrow(people(), &mut queries, name_matches).unwrap();
        assert_eq!(selection.rounds, 1);
        assert!(output(n).contains("Please enter a search term."));
    }

    #[test]
    fn no_selection_without_a_unique_round() {
        let mut n = narrower();
        let mut queries = ScriptedQueries::new(["alice", "e"]);
        let err = n.narrow(people(), &mut queries, name_matches).unwrap_err();
        assert!(err.is_interrupt());
    }

    #[test]
    fn empty_initial_set_is_rejected() {
        let mut n = narrower();
        let mut queries = ScriptedQueries::new(["x"]);
        let err = n.narrow(Vec::<Named>::new(), &mut queries, name_matches).unwrap_err();
        assert!(matches!(err, LugachError::InvalidInput { .. }));
    }

    #[test]
    fn list_upfront_prints_all_options() {
        let mut n = Narrower::new(Vec::new(), "course").list_upfront(true);
        let mut queries = ScriptedQueries::new(["bob"]);
        n.narrow(people(), &mut queries, name_matches).unwrap();
        let out = output(n);
        assert!(out.starts_with("Which course would you like to access?"));
        assert!(out.contains("    Bob Lee"));
    }

    #[test]
    fn remote_search_recovers_from_short_queries() {
        let searched = RefCell::new(Vec::new());
        let mut search = |q: &Query| {
            searched.borrow_mut().push(q.as_str().to_string());
            if q.as_str().len() < 2 {
                return SearchOutcome::from_result(Err(LugachError::QueryTooShort {
                    message: "2 or more characters is required".into(),
                }));
            }
            SearchOutcome::Candidates(people().into_iter().filter(|p| name_matches(q, p)).collect())
        };
        let source: &mut dyn CandidateSource<Named> = &mut search;

        let mut n = narrower();
        let mut queries = ScriptedQueries::new(["a", "alice", "jones"]);
        let selection = n.narrow_remote(source, &mut queries, name_matches).unwrap();
        assert_eq!(selection.candidate, Named("Alice Jones"));
        // the short query did not consume a round
        assert_eq!(selection.rounds, 2);
        // after ambiguity the narrowed set is filtered locally
        assert_eq!(*searched.borrow(), vec!["a", "alice"]);
        assert!(output(n).contains("Too few characters, try again."));
    }

    #[test]
    fn remote_search_requeries_after_reset() {
        let mut calls = 0;
        let mut search = |q: &Query| {
            calls += 1;
            SearchOutcome::Candidates(people().into_iter().filter(|p| name_matches(q, p)).collect())
        };
        let source: &mut dyn CandidateSource<Named> = &mut search;
        let mut n = narrower();
        let mut queries = ScriptedQueries::new(["zzz", "bob"]);
        let selection = n.narrow_remote(source, &mut queries, name_matches).unwrap();
        assert_eq!(selection.candidate, Named("Bob Lee"));
        assert_eq!(calls, 2);
    }

    #[test]
    fn remote_fatal_errors_propagate_unchanged() {
        let mut search =
            |_: &Query| SearchOutcome::<Named>::Fatal(LugachError::RemoteUnavailable { attempts: 10 });
        let source: &mut dyn CandidateSource<Named> = &mut search;
        let mut n = narrower();
        let mut queries = ScriptedQueries::new(["alice"]);
        let err = n.narrow_remote(source, &mut queries, name_matches).unwrap_err();
        assert!(matches!(err, LugachError::RemoteUnavailable { attempts: 10 }));
    }
}
