//! Tag groups and tags, the classification dimensions transactions are
//! tagged against.
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Label shown for a tag id that no longer exists in the catalog.
pub const UNKNOWN_TAG_LABEL: &str = "Unknown";

pub const COLORS: [&str; 12] = [
    "#3b82f6", "#ef4444", "#10b981", "#f59e0b", "#8b5cf6", "#ec4899", "#06b6d4", "#84cc16",
    "#6366f1", "#14b8a6", "#f43f5e", "#d946ef",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagGroup {
    pub id: String,
    pub name: String,
    /// At most one tag of this group may be attached to a transaction.
    pub is_single_select: bool,
    /// Multiple attached tags of this group carry adjustable weights.
    #[serde(default)]
    pub allow_weight: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub color: String,
    pub group_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagCatalog {
    pub groups: Vec<TagGroup>,
    pub tags: Vec<Tag>,
}

fn group(id: &str, name: &str, is_single_select: bool, allow_weight: bool) -> TagGroup {
    TagGroup {
        id: id.to_string(),
        name: name.to_string(),
        is_single_select,
        allow_weight,
    }
}

fn tag(id: &str, name: &str, color: &str, group_id: &str) -> Tag {
    Tag {
        id: id.to_string(),
        name: name.to_string(),
        color: color.to_string(),
        group_id: group_id.to_string(),
    }
}

impl Default for TagCatalog {
    /// The built-in catalog: ledger scope, spending category and members.
    fn default() -> Self {
        TagCatalog {
            groups: vec![
                group("g_scope", "账本归属", false, true),
                group("g_cat", "消费类目", true, false),
                group("g_member", "成员/分摊", false, true),
            ],
            tags: vec![
                tag("t_family", "家庭公用", "#3b82f6", "g_scope"),
                tag("t_personal", "个人独享", "#8b5cf6", "g_scope"),
                tag("t_food", "餐饮美食", "#ef4444", "g_cat"),
                tag("t_shop", "日常购物", "#f59e0b", "g_cat"),
                tag("t_house", "居住物业", "#10b981", "g_cat"),
                tag("t_trans", "交通出行", "#06b6d4", "g_cat"),
                tag("t_play", "休闲娱乐", "#d946ef", "g_cat"),
                tag("t_me", "我", "#fcd34d", "g_member"),
                tag("t_partner", "伴侣", "#ec4899", "g_member"),
            ],
        }
    }
}

fn new_id(prefix: &str) -> String {
    format!("{prefix}_{}", &Uuid::new_v4().simple().to_string()[..12])
}

impl TagCatalog {
    pub fn group(&self, id: &str) -> Option<&TagGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn tag(&self, id: &str) -> Option<&Tag> {
        self.tags.iter().find(|t| t.id == id)
    }

    pub fn tags_in_group<'a>(&'a self, group_id: &'a str) -> impl Iterator<Item = &'a Tag> + 'a {
        self.tags.iter().filter(move |t| t.group_id == group_id)
    }

    /// Group a tag belongs to. `None` for unknown tags and for tags whose
    /// group has gone missing.
    pub fn group_of_tag(&self, tag_id: &str) -> Option<&TagGroup> {
        self.tag(tag_id).and_then(|t| self.group(&t.group_id))
    }

    pub fn tag_name(&self, tag_id: &str) -> &str {
        self.tag(tag_id).map_or(UNKNOWN_TAG_LABEL, |t| t.name.as_str())
    }

    /// Group used as the analytics pivot when none is chosen: the spending
    /// category group if present, else the first group.
    pub fn default_primary_group(&self) -> Option<&TagGroup> {
        self.groups
            .iter()
            .find(|g| g.name.contains("类目"))
            .or_else(|| self.groups.first())
    }

    pub fn add_group(&mut self, name: &str, is_single_select: bool, allow_weight: bool) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            bail!("Group name must not be empty");
        }
        let id = new_id("g");
        self.groups.push(TagGroup {
            id: id.clone(),
            name: name.to_string(),
            is_single_select,
            allow_weight,
        });
        debug!(group_id = %id, "Added tag group");
        Ok(id)
    }

    /// Removes a group together with all of its tags. Returns `false` when
    /// the group does not exist.
    pub fn delete_group(&mut self, id: &str) -> bool {
        let before = self.groups.len();
        self.groups.retain(|g| g.id != id);
        if self.groups.len() == before {
            return false;
        }
        let tags_before = self.tags.len();
        self.tags.retain(|t| t.group_id != id);
        debug!(
            group_id = %id,
            removed_tags = tags_before - self.tags.len(),
            "Deleted tag group"
        );
        true
    }

    pub fn add_tag(&mut self, group_id: &str, name: &str, color: Option<&str>) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            bail!("Tag name must not be empty");
        }
        if self.group(group_id).is_none() {
            bail!("Unknown tag group: {group_id}");
        }
        let color = color
            .map(str::to_string)
            .unwrap_or_else(|| COLORS[self.tags.len() % COLORS.len()].to_string());
        let id = new_id("t");
        self.tags.push(Tag {
            id: id.clone(),
            name: name.to_string(),
            color,
            group_id: group_id.to_string(),
        });
        debug!(tag_id = %id, group_id, "Added tag");
        Ok(id)
    }

    pub fn delete_tag(&mut self, id: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t.id != id);
        self.tags.len() != before
    }
}
