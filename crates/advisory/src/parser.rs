//! Segmentation of advisory text into four numbered sections.
//!
//! The generator is asked for a numbered list: `1.` opportunities, `2.`
//! alerts, `3.` recommendations, `4.` tips. Parsing never fails; anything
//! unrecognized leaves its section empty and `raw` keeps the full text.

use once_cell::sync::Lazy;
use perkfinder_model::InsightRecord;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A line that opens a numbered section (`12.` at line start).
static SECTION_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+\.").expect("section start regex"));

/// Same as `SECTION_START`, capturing the number and the rest of the line.
static SECTION_HEAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+)\.\s*(.*)$").expect("section head regex"));

const MARKERS: [&str; 4] = ["1.", "2.", "3.", "4."];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Each marker is searched anywhere in a line, independently from line 0.
    #[default]
    Lenient,
    /// Single pass; only lines starting with `N.` open section N.
    Sequential,
}

/// Parse with the lenient strategy.
pub fn parse(raw: &str) -> InsightRecord {
    parse_with(raw, ParseMode::Lenient)
}

pub fn parse_with(raw: &str, mode: ParseMode) -> InsightRecord {
    let lines = non_empty_lines(raw);
    let [opportunities, alerts, recommendations, tips] = match mode {
        ParseMode::Lenient => MARKERS.map(|marker| extract_section(&lines, marker)),
        ParseMode::Sequential => split_sequential(&lines),
    };

    InsightRecord {
        opportunities,
        alerts,
        recommendations,
        tips,
        raw: raw.to_string(),
    }
}

fn non_empty_lines(raw: &str) -> Vec<&str> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// First line containing `marker` (marker removed), plus the following lines
/// up to the next numbered line.
fn extract_section(lines: &[&str], marker: &str) -> String {
    let Some(start) = lines.iter().position(|line| line.contains(marker)) else {
        return String::new();
    };

    let head = lines[start].replacen(marker, "", 1);
    let head = head.trim();

    let mut parts: Vec<&str> = Vec::new();
    if !head.is_empty() {
        parts.push(head);
    }
    parts.extend(
        lines[start + 1..]
            .iter()
            .take_while(|line| !SECTION_START.is_match(line)),
    );
    parts.join(" ")
}

fn split_sequential(lines: &[&str]) -> [String; 4] {
    let mut sections: [Option<Vec<&str>>; 4] = Default::default();
    let mut current: Option<usize> = None;

    for &line in lines {
        if let Some(caps) = SECTION_HEAD.captures(line) {
            let slot = caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .filter(|i| *i < MARKERS.len());

            // First occurrence wins; repeated or unknown numbers close the open section.
            current = match slot {
                Some(i) if sections[i].is_none() => {
                    let body = caps.get(2).map_or("", |m| m.as_str()).trim();
                    sections[i] = Some(if body.is_empty() { Vec::new() } else { vec![body] });
                    Some(i)
                }
                _ => None,
            };
            continue;
        }

        if let Some(i) = current {
            if let Some(parts) = sections[i].as_mut() {
                parts.push(line);
            }
        }
    }

    sections.map(|parts| parts.map(|p| p.join(" ")).unwrap_or_default())
}
