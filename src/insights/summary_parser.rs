//! Section parser for summary replies
//!
//! The reply is split by its labels into three named sections:
//! - Summary (between "Summary:" and "Key Points:")
//! - KeyPoints (between "Key Points:" and "Study Questions:")
//! - StudyQuestions (after "Study Questions:")
//!
//! Labels are located first (first occurrence each). A missing or misordered
//! label is a `SummaryParseError`, never a slicing fault. Text ahead of the
//! "Summary:" label is chatter and is dropped.

use super::prompts::{KEY_POINTS_LABEL, STUDY_QUESTIONS_LABEL, SUMMARY_LABEL};
use super::types::SummaryResult;
use crate::utils::trimmed_lines;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Summary,
    KeyPoints,
    StudyQuestions,
}

impl Section {
    pub fn label(&self) -> &'static str {
        match self {
            Section::Summary => SUMMARY_LABEL,
            Section::KeyPoints => KEY_POINTS_LABEL,
            Section::StudyQuestions => STUDY_QUESTIONS_LABEL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SummaryParseError {
    #[error("missing '{}' label", .0.label())]
    MissingLabel(Section),

    #[error(
        "labels out of order, expected '{}', '{}', '{}'",
        SUMMARY_LABEL,
        KEY_POINTS_LABEL,
        STUDY_QUESTIONS_LABEL
    )]
    LabelsOutOfOrder,

    #[error("'{}' section is empty", .0.label())]
    EmptySection(Section),
}

/// Byte offsets of the three required labels
#[derive(Debug, Clone, Copy)]
struct Delimiters {
    summary: usize,
    key_points: usize,
    study_questions: usize,
}

impl Delimiters {
    fn locate(reply: &str) -> Result<Self, SummaryParseError> {
        let summary = reply
            .find(SUMMARY_LABEL)
            .ok_or(SummaryParseError::MissingLabel(Section::Summary))?;
        let key_points = reply
            .find(KEY_POINTS_LABEL)
            .ok_or(SummaryParseError::MissingLabel(Section::KeyPoints))?;
        let study_questions = reply
            .find(STUDY_QUESTIONS_LABEL)
            .ok_or(SummaryParseError::MissingLabel(Section::StudyQuestions))?;

        if !(summary < key_points && key_points < study_questions) {
            return Err(SummaryParseError::LabelsOutOfOrder);
        }

        Ok(Self {
            summary,
            key_points,
            study_questions,
        })
    }

    fn span<'a>(&self, reply: &'a str, section: Section) -> &'a str {
        match section {
            Section::Summary => &reply[self.summary + SUMMARY_LABEL.len()..self.key_points],
            Section::KeyPoints => {
                &reply[self.key_points + KEY_POINTS_LABEL.len()..self.study_questions]
            }
            Section::StudyQuestions => &reply[self.study_questions + STUDY_QUESTIONS_LABEL.len()..],
        }
    }
}

/// Parse a labelled reply into a fully populated `SummaryResult`
pub fn parse_summary(reply: &str) -> Result<SummaryResult, SummaryParseError> {
    let delimiters = Delimiters::locate(reply)?;

    let summary = strip_markup_residue(delimiters.span(reply, Section::Summary)).to_string();
    if summary.is_empty() {
        return Err(SummaryParseError::EmptySection(Section::Summary));
    }

    let key_points = section_lines(reply, &delimiters, Section::KeyPoints)?;
    let study_questions = section_lines(reply, &delimiters, Section::StudyQuestions)?;

    Ok(SummaryResult {
        summary,
        key_points,
        study_questions,
        failure: None,
    })
}

fn section_lines(
    reply: &str,
    delimiters: &Delimiters,
    section: Section,
) -> Result<Vec<String>, SummaryParseError> {
    let lines = trimmed_lines(strip_markup_residue(delimiters.span(reply, section)));
    if lines.is_empty() {
        Err(SummaryParseError::EmptySection(section))
    } else {
        Ok(lines)
    }
}

fn is_marker(c: char) -> bool {
    matches!(c, '*' | '#' | '_')
}

/// Drop whitespace and the emphasis/heading markers models wrap labels in
/// ("**Key Points:**", "## Summary:").
///
/// Only a marker run glued to a label and facing whitespace counts; emphasis
/// belonging to the content ("*Only one*") is kept.
fn strip_markup_residue(span: &str) -> &str {
    // closing half of a wrapped label: "**" right after the label
    let rest = span.trim_start_matches(is_marker);
    let span = if rest.len() < span.len() && rest.chars().next().map_or(true, char::is_whitespace) {
        rest
    } else {
        span
    };

    // opening half of the next label on the same line: " **" right before it
    let rest = span.trim_end_matches(is_marker);
    let span = if rest.len() < span.len() && rest.chars().last().map_or(true, char::is_whitespace) {
        rest
    } else {
        span
    };

    let span = span.trim();

    // opening half of the next label, left on its own line
    match span.rfind('\n') {
        Some(at) if span[at..].trim().chars().all(is_marker) => span[..at].trim_end(),
        None if span.chars().all(is_marker) => "",
        _ => span,
    }
}
