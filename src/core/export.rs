//! CSV export of transactions within a date range.
use crate::core::catalog::TagCatalog;
use crate::core::transaction::{Transaction, TransactionStore};
use anyhow::{Context, Result, anyhow, bail};
use chrono::{NaiveDate, TimeZone};
use tracing::debug;

const BOM: &str = "\u{feff}";
const HEADER: [&str; 4] = ["Date", "Description", "Amount", "TagDetail"];

/// `Name(NN%)` for every attached tag, joined by ` | `.
pub fn tag_detail(transaction: &Transaction, catalog: &TagCatalog) -> String {
    transaction
        .tag_weights
        .iter()
        .map(|tw| {
            let percent = (tw.weight * 100.0).round() as i64;
            format!("{}({percent}%)", catalog.tag_name(&tw.tag_id))
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Renders the transactions dated between `start` and `end` (inclusive, in
/// `tz`) as CSV text with a byte-order mark.
///
/// Refuses an inverted range and a range without transactions.
pub fn export_csv<Tz>(
    store: &TransactionStore,
    catalog: &TagCatalog,
    start: NaiveDate,
    end: NaiveDate,
    tz: &Tz,
) -> Result<String>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    if start > end {
        bail!("Export range is inverted: {start} is after {end}");
    }
    let transactions = store.in_range(start, end, tz);
    if transactions.is_empty() {
        bail!("No transactions between {start} and {end}");
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER)?;
    for t in &transactions {
        writer.write_record([
            t.date.with_timezone(tz).format("%Y-%m-%d").to_string(),
            t.description.clone(),
            t.amount.to_string(),
            tag_detail(t, catalog),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to flush CSV output: {}", e.error()))?;
    let body = String::from_utf8(bytes).context("CSV output is not valid UTF-8")?;

    debug!(rows = transactions.len(), %start, %end, "Exported transactions");
    Ok(format!("{BOM}{body}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::allocation::TagWeight;
    use crate::core::transaction::TransactionDraft;
    use chrono::{DateTime, Utc};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn store() -> TransactionStore {
        let mut store = TransactionStore::default();
        store.create(TransactionDraft {
            amount: 100.0,
            description: "dinner, with friends".to_string(),
            date: Some(DateTime::parse_from_rfc3339("2025-03-02T19:00:00Z").unwrap().with_timezone(&Utc)),
            tag_weights: vec![
                TagWeight::new("t_food", 1.0),
                TagWeight::new("t_me", 2.0 / 3.0),
                TagWeight::new("t_partner", 1.0 / 3.0),
            ],
            ..Default::default()
        });
        store.create(TransactionDraft {
            amount: 12.5,
            description: "bus".to_string(),
            date: Some(DateTime::parse_from_rfc3339("2025-03-05T08:00:00Z").unwrap().with_timezone(&Utc)),
            tag_weights: vec![TagWeight::new("t_gone", 1.0)],
            ..Default::default()
        });
        store.create(TransactionDraft {
            amount: 7.0,
            description: "later".to_string(),
            date: Some(DateTime::parse_from_rfc3339("2025-04-01T08:00:00Z").unwrap().with_timezone(&Utc)),
            ..Default::default()
        });
        store
    }

    #[test]
    fn test_export_rows_and_header() -> Result<()> {
        let csv = export_csv(
            &store(),
            &TagCatalog::default(),
            day(2025, 3, 1),
            day(2025, 3, 31),
            &Utc,
        )?;
        assert!(csv.starts_with('\u{feff}'));
        let lines: Vec<&str> = csv.trim_start_matches('\u{feff}').lines().collect();
        assert_eq!(
            lines,
            vec![
                "Date,Description,Amount,TagDetail",
                "2025-03-05,bus,12.5,Unknown(100%)",
                "2025-03-02,\"dinner, with friends\",100,餐饮美食(100%) | 我(67%) | 伴侣(33%)",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_export_range_is_inclusive() -> Result<()> {
        let csv = export_csv(
            &store(),
            &TagCatalog::default(),
            day(2025, 3, 5),
            day(2025, 4, 1),
            &Utc,
        )?;
        assert_eq!(csv.lines().count(), 3);
        Ok(())
    }

    #[test]
    fn test_export_refuses_inverted_range() {
        let store = store();
        let snapshot = store.clone();
        let err = export_csv(
            &store,
            &TagCatalog::default(),
            day(2025, 3, 31),
            day(2025, 3, 1),
            &Utc,
        )
        .unwrap_err();
        assert!(err.to_string().contains("inverted"));
        assert_eq!(store, snapshot);
    }

    #[test]
    fn test_export_refuses_empty_range() {
        let err = export_csv(
            &store(),
            &TagCatalog::default(),
            day(2024, 1, 1),
            day(2024, 12, 31),
            &Utc,
        )
        .unwrap_err();
        assert!(err.to_string().contains("No transactions"));
    }
}
