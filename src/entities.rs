//! Classname statistics over entity lump text.
//!
//! Matching is purely line-local: any line mentioning `classname` is split on single
//! spaces and the token right after the key is taken as the value. Entity boundaries are
//! not tracked, and a value containing spaces only contributes its first word.

use std::collections::HashMap;

use log::warn;

use crate::error::{Error, Result};

/// Lowercased classname to occurrence count
pub type ClassnameCounts = HashMap<String, u64>;

/// What to do with a `classname` line that has no quoted value token
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum MalformedLinePolicy {
    /// Log the line and keep counting
    #[default]
    Skip,
    /// Fail with [`Error::MalformedEntityLine`]
    Reject,
}

/// Counts classnames, skipping malformed lines.
pub fn count_classnames(text: &str) -> ClassnameCounts {
    let mut counts = ClassnameCounts::new();
    for (_, line) in classname_lines(text) {
        if let Some(classname) = classname_value(line) {
            *counts.entry(classname).or_default() += 1;
        } else {
            warn!("skipping malformed classname line {line:?}");
        }
    }
    counts
}

pub fn count_classnames_with(
    text: &str,
    policy: MalformedLinePolicy,
) -> Result<ClassnameCounts> {
    match policy {
        MalformedLinePolicy::Skip => Ok(count_classnames(text)),
        MalformedLinePolicy::Reject => {
            let mut counts = ClassnameCounts::new();
            for (number, line) in classname_lines(text) {
                let classname =
                    classname_value(line).ok_or_else(|| Error::MalformedEntityLine {
                        line: number,
                        content: line.to_owned(),
                    })?;
                *counts.entry(classname).or_default() += 1;
            }
            Ok(counts)
        }
    }
}

/// Lines mentioning `classname`, with 1-based line numbers
fn classname_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.split('\n')
        .enumerate()
        .map(|(i, line)| (i + 1, line))
        .filter(|(_, line)| line.contains("classname"))
}

/// Second space-separated token with its surrounding quotes removed, lowercased
fn classname_value(line: &str) -> Option<String> {
    let token = line.split(' ').nth(1)?;

    let mut chars = token.chars();
    chars.next()?;
    chars.next_back()?;
    Some(chars.as_str().to_lowercase())
}
