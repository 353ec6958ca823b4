use super::{local_noon, parse_date, resolve_tag};
use crate::core::allocation::{
    TagWeight, WEIGHT_TOLERANCE, apply_suggestions, toggle_tag, update_weight,
};
use crate::core::catalog::TagCatalog;
use crate::core::export::tag_detail;
use crate::core::transaction::{TransactionDraft, TransactionKind};
use crate::core::{InsightService, Ledger};
use anyhow::{Context, Result, bail};
use clap::Args;
use tracing::debug;

#[derive(Debug, Clone, Args)]
pub struct AddArgs {
    /// Amount spent, greater than zero
    pub amount: f64,
    /// What the money was spent on
    #[arg(short, long, default_value = "")]
    pub description: String,
    /// Date as YYYY-MM-DD, defaults to now
    #[arg(long)]
    pub date: Option<String>,
    /// Tag id or name to attach, repeatable
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,
    /// Weight for an attached tag as TAG=VALUE, repeatable
    #[arg(short, long = "weight")]
    pub weights: Vec<String>,
    /// Record income instead of an expense
    #[arg(long)]
    pub income: bool,
    /// Ask the model for tags matching the description
    #[arg(long)]
    pub suggest: bool,
}

#[derive(Debug, Clone, Args)]
pub struct EditArgs {
    /// Transaction id
    pub id: String,
    #[arg(long)]
    pub amount: Option<f64>,
    #[arg(short, long)]
    pub description: Option<String>,
    /// Date as YYYY-MM-DD
    #[arg(long)]
    pub date: Option<String>,
    /// Tag id or name to toggle, repeatable
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,
    /// Weight for an attached tag as TAG=VALUE, repeatable
    #[arg(short, long = "weight")]
    pub weights: Vec<String>,
    /// Remove all tags before applying --tag
    #[arg(long)]
    pub clear_tags: bool,
    #[arg(long, conflicts_with = "expense")]
    pub income: bool,
    #[arg(long)]
    pub expense: bool,
}

#[derive(Debug, Clone, Args)]
pub struct DeleteArgs {
    /// Transaction id
    pub id: String,
    /// Confirm the deletion
    #[arg(long)]
    pub yes: bool,
}

fn parse_weight(assignment: &str) -> Result<(&str, f64)> {
    let (tag, value) = assignment
        .split_once('=')
        .with_context(|| format!("Invalid weight '{assignment}', expected TAG=VALUE"))?;
    let value: f64 = value
        .trim()
        .parse()
        .with_context(|| format!("Invalid weight value in '{assignment}'"))?;
    Ok((tag.trim(), value))
}

/// Toggles each of `tags` in order.
pub fn toggle_tags(
    catalog: &TagCatalog,
    mut selection: Vec<TagWeight>,
    tags: &[String],
) -> Result<Vec<TagWeight>> {
    for key in tags {
        let tag_id = resolve_tag(catalog, key)?;
        selection = toggle_tag(catalog, &tag_id, &selection);
    }
    Ok(selection)
}

/// Applies `TAG=VALUE` adjustments to already attached tags. Returns the
/// new selection and the ids of the adjusted tags.
pub fn apply_weights(
    catalog: &TagCatalog,
    mut selection: Vec<TagWeight>,
    weights: &[String],
) -> Result<(Vec<TagWeight>, Vec<String>)> {
    let mut adjusted = Vec::new();
    for assignment in weights {
        let (key, value) = parse_weight(assignment)?;
        let tag_id = resolve_tag(catalog, key)?;
        if !selection.iter().any(|tw| tw.tag_id == tag_id) {
            bail!("Tag {key} must be attached before setting its weight");
        }
        if catalog
            .group_of_tag(&tag_id)
            .is_some_and(|g| !g.allow_weight)
        {
            bail!("The group of tag {key} does not allow weights");
        }
        selection = update_weight(catalog, &tag_id, value, &selection);
        adjusted.push(tag_id);
    }
    Ok((selection, adjusted))
}

/// Toggles each of `tags` and then applies the `TAG=VALUE` adjustments.
pub fn build_selection(
    catalog: &TagCatalog,
    selection: Vec<TagWeight>,
    tags: &[String],
    weights: &[String],
) -> Result<Vec<TagWeight>> {
    let selection = toggle_tags(catalog, selection, tags)?;
    apply_weights(catalog, selection, weights).map(|(selection, _)| selection)
}

/// Groups whose existing weights differ between `before` and `after`,
/// ignoring the groups of `touched` tags.
pub fn rebalanced_groups(
    catalog: &TagCatalog,
    before: &[TagWeight],
    after: &[TagWeight],
    touched: &[String],
) -> Vec<String> {
    let touched_groups: Vec<&str> = touched
        .iter()
        .filter_map(|id| catalog.group_of_tag(id))
        .map(|g| g.id.as_str())
        .collect();
    let mut changed: Vec<String> = Vec::new();
    for old in before {
        let Some(group) = catalog.group_of_tag(&old.tag_id) else {
            continue;
        };
        if touched_groups.contains(&group.id.as_str()) || changed.contains(&group.id) {
            continue;
        }
        let moved = after
            .iter()
            .find(|tw| tw.tag_id == old.tag_id)
            .is_some_and(|tw| (tw.weight - old.weight).abs() > WEIGHT_TOLERANCE);
        if moved {
            changed.push(group.id.clone());
        }
    }
    changed
}

pub async fn add(ledger: &mut Ledger, insight: &InsightService, args: AddArgs) -> Result<()> {
    let mut selection = toggle_tags(ledger.catalog(), Vec::new(), &args.tags)?;

    if args.suggest {
        if !insight.is_available() {
            println!("{}", crate::core::Insight::Unavailable);
        } else if !args.description.trim().is_empty() {
            let spinner = super::ui::new_spinner("Suggesting tags...");
            let suggested = insight.suggest_tags(&args.description, ledger.catalog()).await;
            spinner.finish_and_clear();
            debug!(?suggested, "Applying suggested tags");
            selection = apply_suggestions(ledger.catalog(), &suggested, &selection);
        }
    }
    let (selection, _) = apply_weights(ledger.catalog(), selection, &args.weights)?;

    let draft = TransactionDraft {
        amount: args.amount,
        description: args.description,
        date: args.date.as_deref().map(parse_date).transpose()?.map(local_noon),
        tag_weights: selection,
        kind: if args.income {
            TransactionKind::Income
        } else {
            TransactionKind::Expense
        },
    };
    let id = ledger.add_transaction(draft)?;
    print_saved("Added", ledger, &id);
    Ok(())
}

pub fn edit(ledger: &mut Ledger, args: EditArgs) -> Result<()> {
    let Some(existing) = ledger.transactions().get(&args.id) else {
        bail!("No transaction with id {}", args.id);
    };
    let mut draft = TransactionDraft::from(existing);
    if let Some(amount) = args.amount {
        draft.amount = amount;
    }
    if let Some(description) = args.description {
        draft.description = description;
    }
    if let Some(date) = &args.date {
        draft.date = Some(local_noon(parse_date(date)?));
    }
    if args.income {
        draft.kind = TransactionKind::Income;
    } else if args.expense {
        draft.kind = TransactionKind::Expense;
    }
    let before = if args.clear_tags {
        Vec::new()
    } else {
        std::mem::take(&mut draft.tag_weights)
    };
    let catalog = ledger.catalog();
    let toggled = toggle_tags(catalog, before.clone(), &args.tags)?;
    let (selection, adjusted) = apply_weights(catalog, toggled, &args.weights)?;

    let mut touched = adjusted;
    for key in &args.tags {
        touched.push(resolve_tag(catalog, key)?);
    }
    let reset = rebalanced_groups(catalog, &before, &selection, &touched);
    for group_id in &reset {
        let group_name = catalog.group(group_id).map_or(group_id.as_str(), |g| g.name.as_str());
        let shares = selection
            .iter()
            .filter(|tw| catalog.group_of_tag(&tw.tag_id).is_some_and(|g| &g.id == group_id))
            .map(|tw| format!("{}({:.0}%)", catalog.tag_name(&tw.tag_id), tw.weight * 100.0))
            .collect::<Vec<_>>()
            .join(" | ");
        println!(
            "{}",
            super::ui::style_text(
                &format!("Split of {group_name} was reset to {shares}, use --weight to adjust"),
                super::ui::StyleType::Error
            )
        );
    }
    draft.tag_weights = selection;

    ledger.update_transaction(&args.id, draft)?;
    print_saved("Updated", ledger, &args.id);
    Ok(())
}

pub fn delete(ledger: &mut Ledger, args: DeleteArgs) -> Result<()> {
    if !args.yes {
        bail!("Deleting a transaction needs --yes to confirm");
    }
    if !ledger.delete_transaction(&args.id)? {
        bail!("No transaction with id {}", args.id);
    }
    println!("Deleted transaction {}", args.id);
    Ok(())
}

fn print_saved(action: &str, ledger: &Ledger, id: &str) {
    if let Some(t) = ledger.transactions().get(id) {
        println!(
            "{action} {} {:.2} {} [{}]",
            t.kind,
            t.amount,
            t.description,
            tag_detail(t, ledger.catalog())
        );
        println!("{}", super::ui::style_text(id, super::ui::StyleType::Subtle));
    }
}
