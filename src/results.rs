//! Verdicts and the expected-versus-actual warning matcher.
use crate::config::WarnPluginConfig;
use crate::warning::Warning;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

const ALL_EXPECTED: &str = "(ALL WARNINGS MATCHED):";
const MATCHED: &str = "(MATCHED WARNINGS):";
const MISSING: &str = "(MISSING WARNINGS):";
const UNEXPECTED: &str = "(UNEXPECTED WARNINGS):";

/// Outcome of one resource group. Both branches carry a short message for
/// summaries and a long one for detailed reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TestStatus {
    Pass { short: String, long: String },
    Fail { short: String, long: String },
}

impl TestStatus {
    pub fn pass(short: impl Into<String>, long: impl Into<String>) -> Self {
        TestStatus::Pass {
            short: short.into(),
            long: long.into(),
        }
    }

    pub fn fail(short: impl Into<String>, long: impl Into<String>) -> Self {
        TestStatus::Fail {
            short: short.into(),
            long: long.into(),
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, TestStatus::Pass { .. })
    }

    pub fn short(&self) -> &str {
        match self {
            TestStatus::Pass { short, .. } | TestStatus::Fail { short, .. } => short,
        }
    }

    pub fn long(&self) -> &str {
        match self {
            TestStatus::Pass { long, .. } | TestStatus::Fail { long, .. } => long,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CountWarnings {
    pub missing: usize,
    pub matched: usize,
    pub unexpected: usize,
}

/// What was run and what it printed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DebugInfo {
    pub command: String,
    pub stdout: String,
    pub stderr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count_warnings: Option<CountWarnings>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestResult {
    pub resources: Vec<PathBuf>,
    pub status: TestStatus,
    pub debug_info: DebugInfo,
}

/// How an expected message is compared with an actual one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOptions {
    pub exact_warnings_match: bool,
    pub partial_text_match: bool,
    pub open_delimiter: String,
    pub close_delimiter: String,
}

impl MatchOptions {
    pub fn from_config(config: &WarnPluginConfig) -> Self {
        let (open_delimiter, close_delimiter) = config.delimiters();
        Self {
            exact_warnings_match: config.exact_match(),
            partial_text_match: config.partial_match(),
            open_delimiter,
            close_delimiter,
        }
    }
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self::from_config(&WarnPluginConfig::default())
    }
}

/// Result of pairing expected warnings with actual ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    pub matched: Vec<Warning>,
    pub missing: Vec<Warning>,
    pub unexpected: Vec<Warning>,
}

impl MatchOutcome {
    pub fn counts(&self) -> CountWarnings {
        CountWarnings {
            missing: self.missing.len(),
            matched: self.matched.len(),
            unexpected: self.unexpected.len(),
        }
    }
}

pub fn group_by_file(warnings: Vec<Warning>) -> BTreeMap<String, Vec<Warning>> {
    let mut grouped: BTreeMap<String, Vec<Warning>> = BTreeMap::new();
    for warning in warnings {
        grouped
            .entry(warning.file_name.clone())
            .or_default()
            .push(warning);
    }
    grouped
}

/// Consume each expected warning at most once against a shrinking pool of
/// actual warnings with the same line and column and a matching message.
pub fn match_warnings(
    expected: &[Warning],
    actual: &[Warning],
    options: &MatchOptions,
) -> MatchOutcome {
    let mut pool: Vec<Warning> = actual.to_vec();
    let mut outcome = MatchOutcome::default();
    for wanted in expected {
        let matcher = MessageMatcher::new(&wanted.message, options);
        let found = pool.iter().position(|candidate| {
            candidate.line == wanted.line
                && candidate.column == wanted.column
                && matcher.matches(&candidate.message)
        });
        match found {
            Some(index) => {
                pool.remove(index);
                outcome.matched.push(wanted.clone());
            }
            None => outcome.missing.push(wanted.clone()),
        }
    }
    outcome.unexpected = pool;
    outcome
}

/// Verdict for one file from the warnings recorded for it on both sides.
pub fn check_results(
    file_name: &str,
    expected: &BTreeMap<String, Vec<Warning>>,
    actual: &BTreeMap<String, Vec<Warning>>,
    options: &MatchOptions,
) -> (TestStatus, CountWarnings) {
    let expected = expected.get(file_name).map(Vec::as_slice).unwrap_or_default();
    let actual = actual.get(file_name).map(Vec::as_slice).unwrap_or_default();
    let outcome = match_warnings(expected, actual, options);
    (verdict(&outcome, options.exact_warnings_match), outcome.counts())
}

pub fn verdict(outcome: &MatchOutcome, exact_warnings_match: bool) -> TestStatus {
    let missing = outcome.missing.len();
    let matched = outcome.matched.len();
    let unexpected = outcome.unexpected.len();
    match (outcome.missing.is_empty(), outcome.unexpected.is_empty()) {
        (true, true) => {
            let message = format!("{ALL_EXPECTED} ({matched})");
            TestStatus::pass(message.clone(), message)
        }
        (true, false) => {
            let short = format!("{UNEXPECTED} {}", render(&outcome.unexpected));
            let long = format!("{UNEXPECTED} ({unexpected}). {MATCHED} ({matched})");
            if exact_warnings_match {
                TestStatus::fail(short, long)
            } else {
                TestStatus::pass(short, long)
            }
        }
        (false, true) => TestStatus::fail(
            format!("{MISSING} {}", render(&outcome.missing)),
            format!("{MISSING} ({missing}). {MATCHED} ({matched})"),
        ),
        (false, false) => TestStatus::fail(
            format!(
                "{MISSING} {}. {UNEXPECTED} {}.",
                render(&outcome.missing),
                render(&outcome.unexpected)
            ),
            format!(
                "{MISSING} ({missing}). {UNEXPECTED} ({unexpected}). {MATCHED} ({matched})"
            ),
        ),
    }
}

fn render(warnings: &[Warning]) -> String {
    let items: Vec<String> = warnings.iter().map(ToString::to_string).collect();
    format!("[{}]", items.join(", "))
}

enum MessageMatcher<'a> {
    Exact(&'a str),
    Pattern(Regex),
}

impl<'a> MessageMatcher<'a> {
    fn new(expected: &'a str, options: &MatchOptions) -> Self {
        if !options.partial_text_match {
            return MessageMatcher::Exact(expected);
        }
        match partial_pattern(expected, &options.open_delimiter, &options.close_delimiter) {
            Some(regex) => MessageMatcher::Pattern(regex),
            None => MessageMatcher::Exact(expected),
        }
    }

    fn matches(&self, actual: &str) -> bool {
        match self {
            MessageMatcher::Exact(expected) => *expected == actual,
            MessageMatcher::Pattern(regex) => regex.is_match(actual),
        }
    }
}

/// Anchored regex for an expected message: text outside `open`/`close` is
/// literal, text between them is a regex. `None` when nothing is delimited
/// or the embedded regex does not compile.
fn partial_pattern(expected: &str, open: &str, close: &str) -> Option<Regex> {
    if open.is_empty() || close.is_empty() || !expected.contains(open) {
        return None;
    }
    let mut source = String::from("^");
    let mut rest = expected;
    while let Some(start) = rest.find(open) {
        source.push_str(&regex::escape(&rest[..start]));
        let inner = &rest[start + open.len()..];
        let Some(end) = inner.find(close) else {
            source.push_str(&regex::escape(&rest[start..]));
            rest = "";
            break;
        };
        source.push_str("(?:");
        source.push_str(&inner[..end]);
        source.push(')');
        rest = &inner[end + close.len()..];
    }
    source.push_str(&regex::escape(rest));
    source.push('$');
    match Regex::new(&source) {
        Ok(regex) => Some(regex),
        Err(err) => {
            tracing::warn!(expected, error = %err, "partial warning pattern does not compile; comparing literally");
            None
        }
    }
}
