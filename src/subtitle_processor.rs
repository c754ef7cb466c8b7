use std::fmt;
use regex::Regex;
use once_cell::sync::Lazy;
use anyhow::Result;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::errors::SubtitleError;

// @module: SRT parsing and serialization around translatable lines

// @const: SRT timestamp range regex, e.g. "00:01:02,345 --> 00:01:04,000"
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{2}:\d{2}:\d{2},\d{3} --> \d{2}:\d{2}:\d{2},\d{3}$").unwrap()
});

// @struct: Single subtitle line with source and translated text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleLine {
    // @field: 1-based sequence number, stable for the life of a job
    pub index: usize,

    // @field: Raw timestamp range string, kept verbatim from the source file
    pub timestamp: String,

    // @field: Original English text
    pub source_text: String,

    // @field: Burmese translation, empty until a batch fills it in
    #[serde(default)]
    pub translated_text: String,
}

impl SubtitleLine {
    /// Creates a new untranslated line
    pub fn new(index: usize, timestamp: impl Into<String>, source_text: impl Into<String>) -> Self {
        SubtitleLine {
            index,
            timestamp: timestamp.into(),
            source_text: source_text.into(),
            translated_text: String::new(),
        }
    }

    /// The text to put in an exported file: the translation when present,
    /// the source text otherwise
    pub fn display_text(&self) -> &str {
        if self.translated_text.is_empty() {
            &self.source_text
        } else {
            &self.translated_text
        }
    }
}

impl fmt::Display for SubtitleLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.index)?;
        writeln!(f, "{}", self.timestamp)?;
        writeln!(f, "{}", self.display_text())?;
        writeln!(f)
    }
}

/// Parse SRT format content into subtitle lines
///
/// Sequence numbers from the file are discarded and lines are renumbered
/// 1-based in order of appearance, so indices stay dense and stable even
/// when the source file skips or repeats numbers.
pub fn parse_srt(content: &str) -> Result<Vec<SubtitleLine>> {
    let mut lines = Vec::new();

    // State for the entry currently being assembled
    let mut current_timestamp: Option<String> = None;
    let mut current_text = String::new();
    let mut awaiting_timestamp = false;
    let mut line_count = 0;

    let flush = |timestamp: &mut Option<String>, text: &mut String, out: &mut Vec<SubtitleLine>| {
        if let Some(ts) = timestamp.take() {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                warn!("Skipping subtitle entry with empty text at {}", ts);
            } else {
                out.push(SubtitleLine::new(out.len() + 1, ts, trimmed.to_string()));
            }
        }
        text.clear();
    };

    for raw_line in content.lines() {
        line_count += 1;
        let trimmed = raw_line.trim_start_matches('\u{feff}').trim();

        if trimmed.is_empty() {
            flush(&mut current_timestamp, &mut current_text, &mut lines);
            awaiting_timestamp = false;
            continue;
        }

        // A bare number between entries is a sequence counter
        if current_timestamp.is_none() && current_text.is_empty() && trimmed.parse::<usize>().is_ok() {
            awaiting_timestamp = true;
            continue;
        }

        if current_timestamp.is_none() {
            if TIMESTAMP_REGEX.is_match(trimmed) {
                current_timestamp = Some(trimmed.to_string());
                continue;
            }
            if awaiting_timestamp {
                warn!("Invalid timestamp at line {}: {}", line_count, trimmed);
                awaiting_timestamp = false;
            } else {
                warn!("Unexpected text at line {} before timestamp: {}", line_count, trimmed);
            }
            continue;
        }

        // Text belonging to the current entry, possibly multi-line
        if !current_text.is_empty() {
            current_text.push('\n');
        }
        current_text.push_str(trimmed);
    }

    // Flush the last entry if the file does not end with a blank line
    flush(&mut current_timestamp, &mut current_text, &mut lines);

    if lines.is_empty() {
        warn!("No valid subtitle lines found in content");
        return Err(SubtitleError::EmptyContent.into());
    }

    Ok(lines)
}

/// Serialize subtitle lines back to SRT format
///
/// Each line is written with its translation when one exists, falling back
/// to the source text, so partially translated jobs still export cleanly.
pub fn serialize_srt(lines: &[SubtitleLine]) -> String {
    let mut output = String::new();
    for line in lines {
        output.push_str(&line.to_string());
    }
    output
}

/// Build a safe download filename for an exported subtitle
pub fn export_filename(movie_title: &str) -> String {
    let sanitized: String = movie_title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect();

    let trimmed = sanitized.trim();
    if trimmed.is_empty() {
        "subtitles.srt".to_string()
    } else {
        format!("{}.srt", trimmed)
    }
}
