use super::ui;
use crate::core::config::InsightConfig;
use crate::core::{Insight, InsightProvider, InsightService, Ledger};
use crate::providers::GeminiProvider;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

/// Builds the insight service from config. Without an API key the service
/// has no provider and reports itself unavailable.
pub fn service_from_config(config: &InsightConfig) -> Result<InsightService> {
    let Some(api_key) = config.resolve_api_key() else {
        debug!("No API key configured, insight disabled");
        return Ok(InsightService::new(None));
    };
    let provider = GeminiProvider::new(&config.base_url, &config.model, &api_key, &config.language)?;
    Ok(InsightService::new(Some(
        Arc::new(provider) as Arc<dyn InsightProvider>
    )))
}

pub async fn run(ledger: &Ledger, service: &InsightService) -> Result<Insight> {
    let insight = if service.is_available() {
        let spinner = ui::new_spinner("Analyzing recent spending...");
        let insight = service
            .generate_insight(ledger.transactions(), ledger.catalog())
            .await;
        spinner.finish_and_clear();
        insight
    } else {
        Insight::Unavailable
    };

    let text = insight.to_string();
    match insight {
        Insight::Ready(_) => println!("{}", ui::style_text(&text, ui::StyleType::TotalLabel)),
        Insight::Failed => println!("{}", ui::style_text(&text, ui::StyleType::Error)),
        Insight::Unavailable | Insight::Busy => {
            println!("{}", ui::style_text(&text, ui::StyleType::Subtle))
        }
    }
    info!(available = service.is_available(), "Insight finished");
    Ok(insight)
}

pub async fn suggest(ledger: &Ledger, service: &InsightService, description: &str) -> Result<Vec<String>> {
    if !service.is_available() {
        println!(
            "{}",
            ui::style_text(&Insight::Unavailable.to_string(), ui::StyleType::Subtle)
        );
        return Ok(Vec::new());
    }

    let spinner = ui::new_spinner("Suggesting tags...");
    let suggested = service.suggest_tags(description, ledger.catalog()).await;
    spinner.finish_and_clear();

    if suggested.is_empty() {
        println!("No tags suggested.");
        return Ok(suggested);
    }
    let catalog = ledger.catalog();
    for tag_id in &suggested {
        let group = catalog.group_of_tag(tag_id).map_or("", |g| g.name.as_str());
        println!("{} ({tag_id}) {}", catalog.tag_name(tag_id), ui::style_text(group, ui::StyleType::Subtle));
    }
    Ok(suggested)
}
