use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use splitledger::cli::breakdown::BreakdownArgs;
use splitledger::cli::export::ExportArgs;
use splitledger::cli::tags::TagsCommand;
use splitledger::cli::transactions::{AddArgs, DeleteArgs, EditArgs};
use splitledger::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for splitledger::AppCommand {
    fn from(cmd: Commands) -> splitledger::AppCommand {
        match cmd {
            Commands::List { month } => splitledger::AppCommand::List { month },
            Commands::Add(args) => splitledger::AppCommand::Add(args),
            Commands::Edit(args) => splitledger::AppCommand::Edit(args),
            Commands::Delete(args) => splitledger::AppCommand::Delete(args),
            Commands::Breakdown(args) => splitledger::AppCommand::Breakdown(args),
            Commands::Export(args) => splitledger::AppCommand::Export(args),
            Commands::Tags { command } => splitledger::AppCommand::Tags(command),
            Commands::Insight => splitledger::AppCommand::Insight,
            Commands::Suggest { description } => splitledger::AppCommand::Suggest { description },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Show a month's transactions
    List {
        /// Month as YYYY-MM, defaults to the current month
        #[arg(short, long)]
        month: Option<String>,
    },
    /// Record a transaction
    Add(AddArgs),
    /// Change a transaction
    Edit(EditArgs),
    /// Delete a transaction
    Delete(DeleteArgs),
    /// Show weighted spending by tag group
    Breakdown(BreakdownArgs),
    /// Export a date range as CSV
    Export(ExportArgs),
    /// Manage tag groups and tags
    Tags {
        #[command(subcommand)]
        command: TagsCommand,
    },
    /// Summarize recent spending with the configured model
    Insight,
    /// Suggest tags for a description
    Suggest { description: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => splitledger::cli::setup::setup(),
        Some(cmd) => splitledger::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
