use std::sync::OnceLock;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;

use crate::models::{iso, Priority, Tags, TaskDraft};

#[derive(Debug, PartialEq)]
pub struct QuickAdd {
    pub title: String,
    pub priority: Option<Priority>,
    pub tags: Vec<String>,
}

impl QuickAdd {
    pub fn into_draft(self) -> TaskDraft {
        let mut draft = TaskDraft::new(self.title);
        draft.priority = self.priority.unwrap_or_default();
        draft.tags = Tags::new(self.tags);
        draft
    }
}

fn priority_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)!(low|medium|high)\b\s*").expect("priority pattern"))
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#([\w-]+)\s*").expect("tag pattern"))
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern"))
}

/// Parses `Buy milk !high #errands` style input. The first priority marker wins.
pub fn parse_quick_add(input: &str) -> QuickAdd {
    let priority: Option<Priority> = priority_re()
        .captures_iter(input)
        .find_map(|caps| caps.get(1).and_then(|m| m.as_str().parse().ok()));

    let mut tags: Vec<String> = Vec::new();
    for caps in tag_re().captures_iter(input) {
        if let Some(tag) = caps.get(1) {
            if !tags.iter().any(|t| t == tag.as_str()) {
                tags.push(tag.as_str().to_string());
            }
        }
    }

    let title = priority_re().replace_all(input, "");
    let title = tag_re().replace_all(&title, "");
    let title = whitespace_re().replace_all(&title, " ").trim().to_string();

    QuickAdd {
        title,
        priority,
        tags,
    }
}

/// Reads a date typed by the user, in the local time zone.
pub fn parse_datetime_input(input: &str) -> Option<DateTime<Utc>> {
    parse_datetime_in(input, &Local)
}

/// Accepts `YYYY-MM-DD HH:MM`, `YYYY-MM-DD` (midnight) or RFC 3339.
pub fn parse_datetime_in<Tz: TimeZone>(input: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Some(parsed) = iso::parse(input) {
        return Some(parsed);
    }

    let naive = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// The inverse of `parse_datetime_input`, used to pre-fill form fields.
pub fn format_datetime_input(value: &DateTime<Utc>) -> String {
    value.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}
