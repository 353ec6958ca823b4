use super::{Month, resolve_group, resolve_tag, ui};
use crate::core::analytics::{Breakdown, compute_breakdown, effective_filter};
use crate::core::Ledger;
use anyhow::{Result, bail};
use chrono::Local;
use clap::Args;
use comfy_table::Cell;
use tracing::debug;

#[derive(Debug, Clone, Args)]
pub struct BreakdownArgs {
    /// Month as YYYY-MM, defaults to the current month
    #[arg(short, long)]
    pub month: Option<String>,
    /// Use every transaction instead of a single month
    #[arg(long, conflicts_with = "month")]
    pub all: bool,
    /// Group id or name to break spending down by
    #[arg(short, long)]
    pub group: Option<String>,
    /// Only count the share of spending carried by this tag
    #[arg(short, long)]
    pub filter: Option<String>,
}

impl Breakdown {
    pub fn display_as_table(&self, currency_symbol: &str) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Tag"),
            ui::header_cell(&format!("Amount ({currency_symbol})")),
            ui::header_cell("Share (%)"),
        ]);
        for entry in &self.entries {
            table.add_row(vec![
                Cell::new(&entry.label),
                ui::amount_cell("", entry.amount),
                ui::share_cell(self.share(entry)),
            ]);
        }

        let mut output = table.to_string();
        output.push_str(&format!(
            "\n\nTotal: {}",
            ui::style_text(
                &format!("{currency_symbol}{:.2}", self.total),
                ui::StyleType::TotalValue
            )
        ));
        output
    }
}

pub fn run(ledger: &Ledger, args: BreakdownArgs, currency_symbol: &str) -> Result<Breakdown> {
    let catalog = ledger.catalog();
    let month = match &args.month {
        Some(m) => Some(m.parse::<Month>()?),
        None if args.all => None,
        None => Some(Month::current()),
    };
    let primary = match &args.group {
        Some(key) => resolve_group(catalog, key)?,
        None => match catalog.default_primary_group() {
            Some(group) => group.id.clone(),
            None => bail!("The catalog has no tag groups"),
        },
    };
    let filter = args
        .filter
        .as_deref()
        .map(|key| resolve_tag(catalog, key))
        .transpose()?;
    let applied = effective_filter(catalog, &primary, filter.as_deref());
    if filter.is_some() && applied.is_none() {
        debug!("Filter tag belongs to the primary group, ignoring it");
    }

    let breakdown = match month {
        Some(m) => compute_breakdown(
            ledger.transactions().filter_by_month(m.year, m.month, &Local),
            catalog,
            &primary,
            applied,
        ),
        None => compute_breakdown(ledger.transactions().all(), catalog, &primary, applied),
    };
    let period = month.map_or_else(|| "All time".to_string(), |m| m.label());

    let group_name = catalog.group(&primary).map_or(primary.as_str(), |g| g.name.as_str());
    let mut title = format!("{period} by {group_name}");
    if let Some(tag_id) = applied {
        title.push_str(&format!(" ({})", catalog.tag_name(tag_id)));
    }
    println!("{}\n", ui::style_text(&title, ui::StyleType::Title));

    if breakdown.entries.is_empty() {
        println!("No spending recorded for {period}.");
        return Ok(breakdown);
    }
    println!("{}", breakdown.display_as_table(currency_symbol));
    Ok(breakdown)
}
