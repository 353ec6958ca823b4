use super::{resolve_group, resolve_tag, ui};
use crate::core::Ledger;
use crate::core::catalog::TagCatalog;
use anyhow::{Result, bail};
use clap::Subcommand;
use comfy_table::{Cell, Color};

#[derive(Debug, Clone, Subcommand)]
pub enum TagsCommand {
    /// Show all tag groups and their tags
    List,
    /// Create a tag group
    AddGroup {
        name: String,
        /// Allow several tags of this group on one transaction
        #[arg(long)]
        multi: bool,
        /// Disable weights for tags of this group
        #[arg(long)]
        no_weight: bool,
    },
    /// Delete a tag group and all of its tags
    DeleteGroup {
        /// Group id or name
        group: String,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Create a tag in a group
    Add {
        /// Group id or name
        group: String,
        name: String,
        /// Hex color such as #3b82f6
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete a tag
    Delete {
        /// Tag id or name
        tag: String,
    },
}

impl TagCatalog {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Group"),
            ui::header_cell("Mode"),
            ui::header_cell("Tag"),
            ui::header_cell("Id"),
        ]);
        for group in &self.groups {
            let mode = match (group.is_single_select, group.allow_weight) {
                (true, _) => "single",
                (false, true) => "multi, weighted",
                (false, false) => "multi",
            };
            let mut first = true;
            for tag in self.tags_in_group(&group.id) {
                let (group_name, group_mode) = if first {
                    (format!("{} ({})", group.name, group.id), mode)
                } else {
                    (String::new(), "")
                };
                first = false;
                table.add_row(vec![
                    Cell::new(group_name),
                    Cell::new(group_mode).fg(Color::DarkGrey),
                    Cell::new(&tag.name),
                    Cell::new(&tag.id),
                ]);
            }
            if first {
                table.add_row(vec![
                    Cell::new(format!("{} ({})", group.name, group.id)),
                    Cell::new(mode).fg(Color::DarkGrey),
                    Cell::new("-").fg(Color::DarkGrey),
                    Cell::new(""),
                ]);
            }
        }
        table.to_string()
    }
}

pub fn run(ledger: &mut Ledger, command: TagsCommand) -> Result<()> {
    match command {
        TagsCommand::List => println!("{}", ledger.catalog().display_as_table()),
        TagsCommand::AddGroup {
            name,
            multi,
            no_weight,
        } => {
            let id = ledger.add_group(&name, !multi, !no_weight)?;
            println!("Added group {name} ({id})");
        }
        TagsCommand::DeleteGroup { group, yes } => {
            let id = resolve_group(ledger.catalog(), &group)?;
            if !yes {
                bail!("Deleting a group removes all of its tags, pass --yes to confirm");
            }
            ledger.delete_group(&id)?;
            println!("Deleted group {id}");
        }
        TagsCommand::Add { group, name, color } => {
            let group_id = resolve_group(ledger.catalog(), &group)?;
            let id = ledger.add_tag(&group_id, &name, color.as_deref())?;
            println!("Added tag {name} ({id})");
        }
        TagsCommand::Delete { tag } => {
            let id = resolve_tag(ledger.catalog(), &tag)?;
            ledger.delete_tag(&id)?;
            println!("Deleted tag {id}");
        }
    }
    Ok(())
}
