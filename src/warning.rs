//! Structured diagnostics parsed from fixture markers and tool output.
use crate::config::WarnPluginConfig;
use crate::error::ConfigError;
use crate::util::file_name;
use regex::{Captures, Regex};
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// One reported diagnostic. Equal only when all four fields are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Warning {
    pub file_name: String,
    pub line: Option<i64>,
    pub column: Option<i64>,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name)?;
        if let Some(line) = self.line {
            write!(f, ":{line}")?;
        }
        if let Some(column) = self.column {
            write!(f, ":{column}")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Capture group indices used to build a [`Warning`] from one regex match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureGroups {
    pub file: Option<usize>,
    pub line: Option<usize>,
    pub column: Option<usize>,
    pub message: usize,
}

/// Where the text being parsed came from.
#[derive(Debug, Clone, Copy)]
pub struct Origin<'a> {
    /// File name used when no file group is configured.
    pub file_name: &'a str,
    /// 1-based physical line of the text inside a fixture; `None` for tool output.
    pub line_number: Option<i64>,
}

/// Parse one line of text into a warning.
///
/// A non-matching line, or a match without a usable message, yields `None`.
/// The line number comes from `groups.line` when set (an integer or the
/// placeholder with an optional `+N`/`-N`), otherwise from the origin's
/// own line, shifted by a placeholder token embedded in the message.
pub fn extract(
    text: &str,
    pattern: &Regex,
    groups: CaptureGroups,
    origin: Origin<'_>,
    placeholder: &str,
) -> Option<Warning> {
    let captures = pattern.captures(text)?;
    let mut message = group_text(&captures, Some(groups.message))?.trim().to_string();
    if message.is_empty() {
        return None;
    }
    let file_name = match group_text(&captures, groups.file) {
        Some(captured) => file_name(Path::new(captured.trim())),
        None => origin.file_name.to_string(),
    };
    let line = match groups.line {
        Some(_) => group_text(&captures, groups.line)
            .and_then(|captured| parse_line(captured, placeholder, origin.line_number)),
        None => match origin.line_number {
            Some(own_line) => {
                let (offset, stripped) = take_placeholder(&message, placeholder);
                message = stripped;
                Some(own_line + offset)
            }
            None => None,
        },
    };
    let column =
        group_text(&captures, groups.column).and_then(|captured| captured.trim().parse().ok());
    Some(Warning {
        file_name,
        line,
        column,
        message,
    })
}

fn group_text<'t>(captures: &Captures<'t>, group: Option<usize>) -> Option<&'t str> {
    group
        .and_then(|index| captures.get(index))
        .map(|matched| matched.as_str())
}

fn parse_line(captured: &str, placeholder: &str, own_line: Option<i64>) -> Option<i64> {
    let captured = captured.trim();
    if let Ok(line) = captured.parse() {
        return Some(line);
    }
    let rest = captured.strip_prefix(placeholder)?;
    let own_line = own_line?;
    if rest.is_empty() {
        return Some(own_line);
    }
    parse_offset(rest).map(|offset| own_line + offset)
}

fn parse_offset(text: &str) -> Option<i64> {
    let (sign, digits) = match text.as_bytes().first()? {
        b'+' => (1, &text[1..]),
        b'-' => (-1, &text[1..]),
        _ => return None,
    };
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    digits.parse::<i64>().ok().map(|value| sign * value)
}

/// Remove the first `placeholder[+N|-N]` token from `message`, returning the
/// offset it encoded (0 when absent) and the cleaned message.
fn take_placeholder(message: &str, placeholder: &str) -> (i64, String) {
    if placeholder.is_empty() {
        return (0, message.to_string());
    }
    let Some(start) = message.find(placeholder) else {
        return (0, message.to_string());
    };
    let after = &message[start + placeholder.len()..];
    let sign_len = usize::from(after.starts_with(['+', '-']));
    let digit_len = after[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    let (offset, token_len) = if sign_len == 1 && digit_len > 0 {
        let token = &after[..sign_len + digit_len];
        (parse_offset(token).unwrap_or(0), token.len())
    } else {
        (0, 0)
    };
    let before = message[..start].trim_end();
    let rest = after[token_len..].trim_start();
    let cleaned = if before.is_empty() || rest.is_empty() {
        format!("{before}{rest}")
    } else {
        format!("{before} {rest}")
    };
    (offset, cleaned.trim().to_string())
}

/// Group 1 of the first line matching `pattern`, trimmed; empty when no
/// line carries flags.
pub fn extra_flags(pattern: &Regex, lines: &[String]) -> String {
    lines
        .iter()
        .find_map(|line| pattern.captures(line))
        .and_then(|captures| captures.get(1))
        .map(|flags| flags.as_str().trim().to_string())
        .unwrap_or_default()
}

/// Compiled patterns and group layout of one validated warn section.
#[derive(Debug, Clone)]
pub struct WarningParser {
    input: Regex,
    output: Regex,
    extra_flags: Regex,
    input_groups: CaptureGroups,
    output_groups: CaptureGroups,
    placeholder: String,
}

impl WarningParser {
    pub fn from_config(config: &WarnPluginConfig) -> Result<Self, ConfigError> {
        let input = config
            .input_pattern()
            .checked("warn", "warningsInputPattern")?
            .clone();
        let output = config
            .output_pattern()
            .checked("warn", "warningsOutputPattern")?
            .clone();
        let extra_flags = config
            .extra_flags()
            .checked("warn", "extraFlagsPattern")?
            .clone();
        let message = config.message_group()?;
        Ok(Self {
            input,
            output,
            extra_flags,
            input_groups: CaptureGroups {
                file: None,
                line: config.line_capture_group,
                column: config.column_capture_group,
                message,
            },
            output_groups: CaptureGroups {
                file: config.file_name_capture_group_out,
                line: config.line_capture_group_out,
                column: config.column_capture_group_out,
                message: config.message_capture_group_out.unwrap_or(4),
            },
            placeholder: config.placeholder().to_string(),
        })
    }

    /// Warnings declared by markers in a fixture file.
    pub fn expected(&self, file_name: &str, lines: &[String]) -> Vec<Warning> {
        lines
            .iter()
            .zip(1_i64..)
            .filter_map(|(text, line_number)| {
                extract(
                    text,
                    &self.input,
                    self.input_groups,
                    Origin {
                        file_name,
                        line_number: Some(line_number),
                    },
                    &self.placeholder,
                )
            })
            .collect()
    }

    /// Warnings reported by the tool. Lines without a file group are
    /// attributed to `fallback_file`.
    pub fn actual(&self, lines: &[String], fallback_file: &str) -> Vec<Warning> {
        lines
            .iter()
            .filter_map(|text| {
                extract(
                    text,
                    &self.output,
                    self.output_groups,
                    Origin {
                        file_name: fallback_file,
                        line_number: None,
                    },
                    &self.placeholder,
                )
            })
            .collect()
    }

    /// Flags requested by the first `save-args` style marker, or empty.
    pub fn extra_flags(&self, lines: &[String]) -> String {
        extra_flags(&self.extra_flags, lines)
    }

    /// Fixture text with expectation marker lines removed.
    pub fn strip_markers(&self, lines: &[String]) -> Vec<String> {
        lines
            .iter()
            .filter(|line| !self.input.is_match(line))
            .cloned()
            .collect()
    }
}
