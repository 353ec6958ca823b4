//! Terminal front end: argument types, rendering and the command handlers.

pub mod breakdown;
pub mod export;
pub mod insight;
pub mod list;
pub mod setup;
pub mod tags;
pub mod transactions;
pub mod ui;

use crate::core::catalog::TagCatalog;
use anyhow::{Context, Result, bail};
use chrono::{DateTime, Datelike, Local, NaiveDate, TimeZone, Utc};

/// A calendar month given as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Month {
    pub year: i32,
    pub month: u32,
}

impl Month {
    pub fn current() -> Self {
        let today = Local::now().date_naive();
        Month {
            year: today.year(),
            month: today.month(),
        }
    }

    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

impl std::str::FromStr for Month {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let first = NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
            .with_context(|| format!("Invalid month '{s}', expected YYYY-MM"))?;
        Ok(Month {
            year: first.year(),
            month: first.month(),
        })
    }
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{s}', expected YYYY-MM-DD"))
}

/// Noon of `date` in local time, so the stored instant stays on the same
/// local calendar day.
pub fn local_noon(date: NaiveDate) -> DateTime<Utc> {
    let noon = date.and_hms_opt(12, 0, 0).unwrap_or_default();
    Local
        .from_local_datetime(&noon)
        .single()
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&noon))
}

/// Finds a tag by id, or by name when the name is unique.
pub fn resolve_tag(catalog: &TagCatalog, key: &str) -> Result<String> {
    if let Some(tag) = catalog.tag(key) {
        return Ok(tag.id.clone());
    }
    let matches: Vec<_> = catalog.tags.iter().filter(|t| t.name == key).collect();
    match matches.as_slice() {
        [tag] => Ok(tag.id.clone()),
        [] => bail!("Unknown tag: {key}"),
        _ => bail!("Tag name '{key}' is ambiguous, use its id"),
    }
}

/// Finds a group by id, or by name when the name is unique.
pub fn resolve_group(catalog: &TagCatalog, key: &str) -> Result<String> {
    if let Some(group) = catalog.group(key) {
        return Ok(group.id.clone());
    }
    let matches: Vec<_> = catalog.groups.iter().filter(|g| g.name == key).collect();
    match matches.as_slice() {
        [group] => Ok(group.id.clone()),
        [] => bail!("Unknown tag group: {key}"),
        _ => bail!("Group name '{key}' is ambiguous, use its id"),
    }
}
