pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::cli::breakdown::BreakdownArgs;
use crate::cli::export::ExportArgs;
use crate::cli::tags::TagsCommand;
use crate::cli::transactions::{AddArgs, DeleteArgs, EditArgs};
use crate::core::Ledger;
use crate::core::config::AppConfig;
use crate::store::{DiskStore, RecordStore};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    List { month: Option<String> },
    Add(AddArgs),
    Edit(EditArgs),
    Delete(DeleteArgs),
    Breakdown(BreakdownArgs),
    Export(ExportArgs),
    Tags(TagsCommand),
    Insight,
    Suggest { description: String },
}

fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("splitledger starting...");
    let config = load_config(config_path)?;

    let data_dir = config.data_dir()?;
    let store: Arc<dyn RecordStore> = Arc::new(DiskStore::open(&data_dir)?);
    let mut ledger = Ledger::open(store)?;
    for record in ledger.discarded_records() {
        eprintln!(
            "{}",
            cli::ui::style_text(
                &format!(
                    "Warning: stored {} could not be read and defaults are shown instead ({}). \
                     The next change will overwrite it.",
                    record.key, record.reason
                ),
                cli::ui::StyleType::Error
            )
        );
    }
    let symbol = config.currency_symbol.as_str();

    match command {
        AppCommand::List { month } => {
            let month: Option<cli::Month> = month.as_deref().map(str::parse).transpose()?;
            cli::list::run(&ledger, month, symbol)
        }
        AppCommand::Add(args) => {
            let service = cli::insight::service_from_config(&config.insight)?;
            cli::transactions::add(&mut ledger, &service, args).await
        }
        AppCommand::Edit(args) => cli::transactions::edit(&mut ledger, args),
        AppCommand::Delete(args) => cli::transactions::delete(&mut ledger, args),
        AppCommand::Breakdown(args) => cli::breakdown::run(&ledger, args, symbol).map(|_| ()),
        AppCommand::Export(args) => cli::export::run(&ledger, args).map(|_| ()),
        AppCommand::Tags(command) => cli::tags::run(&mut ledger, command),
        AppCommand::Insight => {
            let service = cli::insight::service_from_config(&config.insight)?;
            cli::insight::run(&ledger, &service).await.map(|_| ())
        }
        AppCommand::Suggest { description } => {
            let service = cli::insight::service_from_config(&config.insight)?;
            cli::insight::suggest(&ledger, &service, &description)
                .await
                .map(|_| ())
        }
    }
}
