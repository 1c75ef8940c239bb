//! Boolean query parsing for recruiter-style search strings.
//!
//! `(Engineer OR Developer) AND Python -Senior` becomes
//! titles = [Engineer, Developer], skills = [Python], exclusions = [Senior].
//! Operators are only recognised in upper case so that "research and development"
//! stays a phrase.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::models::JobResult;

static GROUP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(([^()]*)\)").unwrap());
static OR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bOR\b").unwrap());
static AND_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bAND\b").unwrap());
static MINUS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?:^|\s)-("[^"]+"|[^\s()]+)"#).unwrap());
static NOT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\bNOT\s+("[^"]+"|[^\s()]+)"#).unwrap());
static TERM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""[^"]+"|\S+"#).unwrap());

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BooleanQuery {
    /// Alternate job titles; each one becomes its own sub-search.
    pub titles: Vec<String>,
    /// Required terms. A clause written as `A OR B` is satisfied by either side.
    pub skills: Vec<String>,
    /// Terms that must not appear in a job's title or description.
    pub exclusions: Vec<String>,
}

pub fn parse_boolean_query(input: &str) -> BooleanQuery {
    let mut query = BooleanQuery::default();

    for caps in MINUS_RE.captures_iter(input).chain(NOT_RE.captures_iter(input)) {
        push_term(&mut query.exclusions, &caps[1]);
    }
    let remaining = MINUS_RE.replace_all(input, " ");
    let remaining = NOT_RE.replace_all(&remaining, " ").into_owned();

    for caps in GROUP_RE.captures_iter(&remaining) {
        let inner = &caps[1];
        if OR_RE.is_match(inner) {
            let alternatives = split_alternatives(inner);
            if query.titles.is_empty() {
                query.titles = alternatives;
            } else if !alternatives.is_empty() {
                query.skills.push(alternatives.join(" OR "));
            }
        } else {
            push_and_clauses(&mut query.skills, inner);
        }
    }
    let remaining = GROUP_RE.replace_all(&remaining, " ").into_owned();

    for clause in AND_RE.split(&remaining) {
        if OR_RE.is_match(clause) {
            let alternatives = split_alternatives(clause);
            if query.titles.is_empty() {
                query.titles = alternatives;
            } else if !alternatives.is_empty() {
                query.skills.push(alternatives.join(" OR "));
            }
        } else {
            for term in TERM_RE.find_iter(clause) {
                push_term(&mut query.skills, term.as_str());
            }
        }
    }

    query
}

fn split_alternatives(text: &str) -> Vec<String> {
    OR_RE
        .split(text)
        .map(clean_term)
        .filter(|t| !t.is_empty())
        .collect()
}

fn push_and_clauses(target: &mut Vec<String>, text: &str) {
    for clause in AND_RE.split(text) {
        for term in TERM_RE.find_iter(clause) {
            push_term(target, term.as_str());
        }
    }
}

fn push_term(target: &mut Vec<String>, raw: &str) {
    let term = clean_term(raw);
    if !term.is_empty() && !target.contains(&term) {
        target.push(term);
    }
}

fn clean_term(raw: &str) -> String {
    raw.trim().trim_matches('"').trim().to_string()
}

impl BooleanQuery {
    pub fn is_empty(&self) -> bool {
        self.titles.is_empty() && self.skills.is_empty() && self.exclusions.is_empty()
    }

    /// The plain query sent to the provider for one title (or none).
    pub fn compose_query(&self, title: Option<&str>) -> String {
        title
            .into_iter()
            .map(str::to_string)
            .chain(self.skills.iter().map(|s| {
                if s.contains(' ') && !s.contains(" OR ") {
                    format!("\"{s}\"")
                } else {
                    s.clone()
                }
            }))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Every skill clause must appear in title + description and no exclusion may.
    pub fn matches(&self, job: &JobResult) -> bool {
        let text = job.search_text();
        let has_skills = self.skills.iter().all(|clause| {
            clause
                .split(" OR ")
                .any(|alt| text.contains(&alt.trim().to_lowercase()))
        });
        has_skills
            && !self
                .exclusions
                .iter()
                .any(|excluded| text.contains(&excluded.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn job(title: &str, description: &str) -> JobResult {
        let mut job = JobResult::new("google_1", title, "Acme", "Google Jobs", Utc::now());
        job.description = Some(description.to_string());
        job
    }

    #[test]
    fn test_titles_skills_and_exclusions() {
        let parsed = parse_boolean_query("(Engineer OR Developer) AND Python -Senior");
        assert_eq!(parsed.titles, vec!["Engineer", "Developer"]);
        assert!(parsed.skills.contains(&"Python".to_string()));
        assert!(parsed.exclusions.contains(&"Senior".to_string()));
        assert_eq!(parsed.skills.len(), 1);
    }

    #[test]
    fn test_not_keyword_and_quoted_phrases() {
        let parsed = parse_boolean_query(
            r#"("Software Engineer" OR "Backend Developer") AND "machine learning" NOT Manager"#,
        );
        assert_eq!(parsed.titles, vec!["Software Engineer", "Backend Developer"]);
        assert_eq!(parsed.skills, vec!["machine learning"]);
        assert_eq!(parsed.exclusions, vec!["Manager"]);
    }

    #[test]
    fn test_second_or_group_becomes_alternative_skill() {
        let parsed = parse_boolean_query("(Engineer OR Developer) AND (Rust OR Go) AND Kubernetes");
        assert_eq!(parsed.titles, vec!["Engineer", "Developer"]);
        assert_eq!(parsed.skills, vec!["Rust OR Go", "Kubernetes"]);
    }

    #[test]
    fn test_hyphenated_words_are_not_exclusions() {
        let parsed = parse_boolean_query("full-time AND Python");
        assert!(parsed.exclusions.is_empty());
        assert_eq!(parsed.skills, vec!["full-time", "Python"]);
    }

    #[test]
    fn test_lowercase_operators_are_words() {
        let parsed = parse_boolean_query("research and development");
        assert!(parsed.titles.is_empty());
        assert_eq!(parsed.skills, vec!["research", "and", "development"]);
    }

    #[test]
    fn test_compose_query_quotes_phrases() {
        let parsed = parse_boolean_query(r#"(Engineer OR Developer) AND "machine learning""#);
        assert_eq!(
            parsed.compose_query(Some("Engineer")),
            r#"Engineer "machine learning""#
        );
        assert_eq!(parsed.compose_query(None), r#""machine learning""#);
    }

    #[test]
    fn test_matches_requires_skills_and_rejects_exclusions() {
        let parsed = parse_boolean_query("(Engineer OR Developer) AND Python -Senior");
        assert!(parsed.matches(&job("Backend Engineer", "We use Python and Django")));
        assert!(!parsed.matches(&job("Senior Engineer", "Python everywhere")));
        assert!(!parsed.matches(&job("Engineer", "Go and Rust only")));
    }

    #[test]
    fn test_alternative_skill_clause_matches_either_side() {
        let parsed = parse_boolean_query("(Engineer OR Developer) AND (Rust OR Go)");
        assert!(parsed.matches(&job("Engineer", "Golang services")));
        assert!(!parsed.matches(&job("Engineer", "Java services")));
    }
}
