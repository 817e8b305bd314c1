//! Response sanitizer.
//!
//! Generative providers wrap their JSON in prose and code fences, use smart
//! quotes, leave trailing commas and sometimes stop mid-object. The sanitizer
//! applies three increasingly invasive repair stages and stops at the first
//! one that yields a recognizable assessment.

use std::fmt;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde_json::Value;
use tracing::debug;

use crate::domain::{ParseError, StructuredAssessment};

/// Repair stage that produced a successful parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairStage {
    /// Fences stripped and the object sliced out, content untouched.
    Extracted,
    /// Quotes, whitespace, trailing commas and contractions normalized.
    Normalized,
    /// Structural repair of bare values and unterminated containers.
    Repaired,
}

impl fmt::Display for RepairStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Extracted => "extracted",
            Self::Normalized => "normalized",
            Self::Repaired => "repaired",
        })
    }
}

/// Contractions whose apostrophe breaks single-quoted values.
const CONTRACTIONS: &[(&str, &str)] = &[
    ("can't", "cannot"),
    ("won't", "will not"),
    ("don't", "do not"),
    ("doesn't", "does not"),
    ("didn't", "did not"),
    ("isn't", "is not"),
    ("aren't", "are not"),
    ("wasn't", "was not"),
    ("weren't", "were not"),
    ("hasn't", "has not"),
    ("haven't", "have not"),
    ("shouldn't", "should not"),
    ("wouldn't", "would not"),
    ("couldn't", "could not"),
    ("it's", "it is"),
    ("that's", "that is"),
    ("there's", "there is"),
    ("you're", "you are"),
    ("you'll", "you will"),
    ("you've", "you have"),
    ("we're", "we are"),
    ("they're", "they are"),
    ("i'm", "I am"),
];

struct Patterns {
    fence: Regex,
    whitespace: Regex,
    trailing_comma: Regex,
    contraction: Regex,
    single_quoted: Regex,
    bare_key: Regex,
    bare_value: Regex,
}

#[allow(clippy::expect_used)]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static sanitizer pattern")
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let words: Vec<&str> = CONTRACTIONS.iter().map(|(from, _)| *from).collect();
        Patterns {
            fence: compile(r"```[A-Za-z]*"),
            whitespace: compile(r"\s+"),
            trailing_comma: compile(r",\s*([}\]])"),
            contraction: compile(&format!(r"(?i)\b(?:{})\b", words.join("|"))),
            single_quoted: compile(r#"([{\[,:]\s*)'([^'"]*)'(\s*[:,}\]])"#),
            bare_key: compile(r"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)\s*:"),
            bare_value: compile(r"(:\s*)([A-Za-z][A-Za-z0-9 _./-]*?)(\s*[,}\]])"),
        }
    })
}

/// Extracts and repairs assessment JSON from free-form model output.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseSanitizer;

impl ResponseSanitizer {
    /// Parses `raw` into an assessment.
    ///
    /// # Errors
    ///
    /// Returns the failure of the last stage when no stage produces a
    /// recognizable assessment.
    pub fn sanitize(raw: &str) -> Result<StructuredAssessment, ParseError> {
        Self::sanitize_with_stage(raw).map(|(assessment, _)| assessment)
    }

    /// Like [`Self::sanitize`], also reporting which stage succeeded.
    ///
    /// # Errors
    ///
    /// See [`Self::sanitize`].
    pub fn sanitize_with_stage(
        raw: &str,
    ) -> Result<(StructuredAssessment, RepairStage), ParseError> {
        let extracted = extract(raw)?;
        let err = match parse(&extracted.span) {
            Ok(assessment) => return Ok((assessment, RepairStage::Extracted)),
            Err(err) => err,
        };
        debug!("Stage 1 parse failed: {err}");

        let err = match parse(&normalize(&extracted.span)) {
            Ok(assessment) => return Ok((assessment, RepairStage::Normalized)),
            Err(err) => err,
        };
        debug!("Stage 2 parse failed: {err}");

        let repaired = repair(&normalize(&extracted.tail));
        parse(&repaired)
            .map(|assessment| (assessment, RepairStage::Repaired))
            .map_err(|last| {
                debug!("Stage 3 parse failed: {last} (after {err})");
                last
            })
    }
}

/// Candidate text located in a raw response.
struct Extracted {
    /// First `{` through last `}`.
    span: String,
    /// First `{` through the end of the response, for truncated output.
    tail: String,
}

fn parse(text: &str) -> Result<StructuredAssessment, ParseError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| ParseError::Syntax(e.to_string()))?;
    StructuredAssessment::from_value(value)
}

/// Stage 1: drops code fences and slices from the first `{` to the last `}`.
fn extract(raw: &str) -> Result<Extracted, ParseError> {
    let unfenced = patterns().fence.replace_all(raw, "");
    let start = unfenced.find('{').ok_or(ParseError::NoJson)?;
    let tail = unfenced[start..].trim();
    let span = match tail.rfind('}') {
        Some(end) => &tail[..=end],
        None => tail,
    };
    Ok(Extracted {
        span: span.to_string(),
        tail: tail.to_string(),
    })
}

/// Stage 2: lexical normalization.
fn normalize(text: &str) -> String {
    let p = patterns();
    let straight: String = text
        .chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{00AB}' | '\u{00BB}' => '"',
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{00B4}' => '\'',
            other => other,
        })
        .collect();
    let collapsed = p.whitespace.replace_all(&straight, " ");
    let no_trailing = outside_strings(&collapsed, |code| {
        p.trailing_comma.replace_all(code, "$1").into_owned()
    });
    let expanded = p.contraction.replace_all(&no_trailing, |caps: &Captures<'_>| {
        expand_contraction(&caps[0])
    });

    // Adjacent quoted items share a delimiter, so one pass can miss every
    // other item. Each pass removes at least two single quotes.
    let mut out = expanded.into_owned();
    loop {
        let next = outside_strings(&out, |code| {
            p.single_quoted
                .replace_all(code, "$1\"$2\"$3")
                .into_owned()
        });
        if next == out {
            break out;
        }
        out = next;
    }
}

/// Applies `rewrite` to the text between double-quoted literals and copies
/// the literals through untouched. An unterminated literal runs to the end.
fn outside_strings(text: &str, mut rewrite: impl FnMut(&str) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    let mut start = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => {
                    in_string = false;
                    out.push_str(&text[start..=i]);
                    start = i + 1;
                }
                _ => {}
            }
        } else if c == '"' {
            out.push_str(&rewrite(&text[start..i]));
            in_string = true;
            start = i;
        }
    }

    if in_string {
        out.push_str(&text[start..]);
    } else {
        out.push_str(&rewrite(&text[start..]));
    }
    out
}

fn expand_contraction(word: &str) -> String {
    let lower = word.to_lowercase();
    let expansion = CONTRACTIONS
        .iter()
        .find(|(from, _)| *from == lower)
        .map_or(word, |(_, to)| *to);
    if word.starts_with(char::is_uppercase) {
        let mut chars = expansion.chars();
        chars.next().map_or_else(String::new, |first| {
            first.to_uppercase().chain(chars).collect()
        })
    } else {
        expansion.to_string()
    }
}

/// Stage 3: structural repair.
fn repair(text: &str) -> String {
    let p = patterns();
    let printable: String = text.chars().filter(|c| !c.is_control()).collect();
    let quoted = outside_strings(&printable, |code| {
        let keyed = p.bare_key.replace_all(code, "$1\"$2\":");
        p.bare_value
            .replace_all(&keyed, |caps: &Captures<'_>| {
                let word = &caps[2];
                if matches!(word, "true" | "false" | "null") {
                    caps[0].to_string()
                } else {
                    format!("{}\"{}\"{}", &caps[1], word, &caps[3])
                }
            })
            .into_owned()
    });
    close_open_containers(&quoted)
}

/// Cuts the text where the outermost object closes, or terminates an open
/// string and closes every open array and object.
fn close_open_containers(text: &str) -> String {
    let mut closers = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => closers.push('}'),
            '[' => closers.push(']'),
            '}' | ']' => {
                closers.pop();
                if closers.is_empty() {
                    return text[..=i].to_string();
                }
            }
            _ => {}
        }
    }

    let mut out = text.trim_end().to_string();
    if in_string {
        if escaped {
            out.pop();
        }
        out.push('"');
    }
    let trimmed_len = out.trim_end_matches([',', ' ']).len();
    out.truncate(trimmed_len);
    if out.ends_with(':') {
        out.push_str(" null");
    }
    out.extend(closers.iter().rev());
    out
}
