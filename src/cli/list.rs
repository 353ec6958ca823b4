use super::{Month, ui};
use crate::core::catalog::TagCatalog;
use crate::core::transaction::{Transaction, TransactionKind};
use crate::core::Ledger;
use anyhow::Result;
use chrono::{Local, TimeZone};
use comfy_table::Cell;

/// Renders the month's transactions with their tags.
pub fn transactions_table<Tz: TimeZone>(
    transactions: &[&Transaction],
    catalog: &TagCatalog,
    currency_symbol: &str,
    tz: &Tz,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell("Description"),
        ui::header_cell("Amount"),
        ui::header_cell("Tags"),
        ui::header_cell("Id"),
    ]);

    for t in transactions {
        let tags = t
            .tag_weights
            .iter()
            .map(|tw| {
                let name = catalog.tag_name(&tw.tag_id);
                if tw.weight < 1.0 {
                    format!("{name} {:.0}%", tw.weight * 100.0)
                } else {
                    name.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        let amount = match t.kind {
            TransactionKind::Expense => ui::amount_cell(currency_symbol, t.amount),
            TransactionKind::Income => ui::amount_cell(&format!("+{currency_symbol}"), t.amount),
        };
        table.add_row(vec![
            Cell::new(t.date.with_timezone(tz).format("%Y-%m-%d")),
            Cell::new(&t.description),
            amount,
            ui::tag_cell(&tags, t.tag_weights.iter().all(|tw| catalog.tag(&tw.tag_id).is_some())),
            Cell::new(&t.id),
        ]);
    }
    table.to_string()
}

pub fn run(ledger: &Ledger, month: Option<Month>, currency_symbol: &str) -> Result<()> {
    let month = month.unwrap_or_else(Month::current);
    let transactions = ledger
        .transactions()
        .filter_by_month(month.year, month.month, &Local);

    println!(
        "Month: {}\n",
        ui::style_text(&month.label(), ui::StyleType::Title)
    );
    if transactions.is_empty() {
        println!("No transactions recorded for {}.", month.label());
        return Ok(());
    }

    println!(
        "{}",
        transactions_table(&transactions, ledger.catalog(), currency_symbol, &Local)
    );
    let total = ledger
        .transactions()
        .month_total(month.year, month.month, &Local);
    println!(
        "\nTotal ({}): {}",
        ui::style_text(&transactions.len().to_string(), ui::StyleType::TotalLabel),
        ui::style_text(&format!("{currency_symbol}{total:.2}"), ui::StyleType::TotalValue)
    );
    Ok(())
}
