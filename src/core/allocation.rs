//! Weight allocation for a transaction's tag selection.
//!
//! Within every tag group that has at least one tag attached, the weights
//! of the attached tags sum to 1. Toggling membership re-splits a group
//! equally; adjusting one weight rebalances the siblings proportionally.
use crate::core::catalog::TagCatalog;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

pub const WEIGHT_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagWeight {
    pub tag_id: String,
    /// Fraction of the transaction amount attributed to this tag, 0..=1.
    pub weight: f64,
}

impl TagWeight {
    pub fn new(tag_id: &str, weight: f64) -> Self {
        Self {
            tag_id: tag_id.to_string(),
            weight,
        }
    }
}

/// Adds or removes `tag_id` from the selection, then splits every group
/// equally among its selected tags.
///
/// Adding a tag of a single-select group drops the other tags of that group
/// first. A tag id unknown to the catalog leaves the selection unchanged.
pub fn toggle_tag(catalog: &TagCatalog, tag_id: &str, current: &[TagWeight]) -> Vec<TagWeight> {
    let Some(group) = catalog.group_of_tag(tag_id) else {
        debug!(tag_id, "Ignoring toggle of unknown tag");
        return current.to_vec();
    };

    let mut weights = current.to_vec();
    if weights.iter().any(|tw| tw.tag_id == tag_id) {
        weights.retain(|tw| tw.tag_id != tag_id);
    } else {
        if group.is_single_select {
            weights.retain(|tw| {
                catalog
                    .tag(&tw.tag_id)
                    .is_none_or(|t| t.group_id != group.id)
            });
        }
        weights.push(TagWeight::new(tag_id, 1.0));
    }

    equalize(catalog, &mut weights);
    weights
}

fn equalize(catalog: &TagCatalog, weights: &mut [TagWeight]) {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for tw in weights.iter() {
        if let Some(tag) = catalog.tag(&tw.tag_id) {
            *counts.entry(tag.group_id.as_str()).or_default() += 1;
        }
    }
    for tw in weights.iter_mut() {
        if let Some(count) = catalog.tag(&tw.tag_id).and_then(|t| counts.get(t.group_id.as_str())) {
            tw.weight = 1.0 / *count as f64;
        }
    }
}

/// Sets the weight of one selected tag and hands the remainder to the other
/// selected tags of its group, in proportion to their current weights (or
/// equally when they are all zero).
///
/// No-op when the tag is not selected, is alone in its group, belongs to a
/// group without weights, or `value` is not a number. `value` is clamped
/// to 0..=1.
pub fn update_weight(
    catalog: &TagCatalog,
    tag_id: &str,
    value: f64,
    current: &[TagWeight],
) -> Vec<TagWeight> {
    let Some(group) = catalog.group_of_tag(tag_id) else {
        return current.to_vec();
    };
    if !group.allow_weight || !value.is_finite() || !current.iter().any(|tw| tw.tag_id == tag_id) {
        return current.to_vec();
    }

    let in_group = |tw: &TagWeight| {
        tw.tag_id != tag_id
            && catalog
                .tag(&tw.tag_id)
                .is_some_and(|t| t.group_id == group.id)
    };
    let siblings: Vec<&TagWeight> = current.iter().filter(|tw| in_group(*tw)).collect();
    if siblings.is_empty() {
        return current.to_vec();
    }

    let value = value.clamp(0.0, 1.0);
    let remaining = 1.0 - value;
    let sibling_sum: f64 = siblings.iter().map(|tw| tw.weight).sum();
    let sibling_count = siblings.len() as f64;

    current
        .iter()
        .map(|tw| {
            if tw.tag_id == tag_id {
                TagWeight::new(tag_id, value)
            } else if in_group(tw) {
                let ratio = if sibling_sum > 0.0 {
                    tw.weight / sibling_sum
                } else {
                    1.0 / sibling_count
                };
                TagWeight::new(&tw.tag_id, remaining * ratio)
            } else {
                tw.clone()
            }
        })
        .collect()
}

/// Sum of the weights of the selected tags that belong to `group_id`.
pub fn group_weight_sum(catalog: &TagCatalog, group_id: &str, weights: &[TagWeight]) -> f64 {
    weights
        .iter()
        .filter(|tw| catalog.tag(&tw.tag_id).is_some_and(|t| t.group_id == group_id))
        .map(|tw| tw.weight)
        .sum()
}

/// Whether every group with a selected tag sums to 1 within tolerance.
/// Tags unknown to the catalog are ignored.
pub fn is_balanced(catalog: &TagCatalog, weights: &[TagWeight]) -> bool {
    catalog.groups.iter().all(|g| {
        let present = weights
            .iter()
            .any(|tw| catalog.tag(&tw.tag_id).is_some_and(|t| t.group_id == g.id));
        !present || (group_weight_sum(catalog, &g.id, weights) - 1.0).abs() <= WEIGHT_TOLERANCE
    })
}

/// Toggles on each suggested tag that is not already selected, so that
/// single-select groups keep one tag and weights are split equally.
pub fn apply_suggestions(
    catalog: &TagCatalog,
    tag_ids: &[String],
    current: &[TagWeight],
) -> Vec<TagWeight> {
    tag_ids.iter().fold(current.to_vec(), |weights, tag_id| {
        if weights.iter().any(|tw| &tw.tag_id == tag_id) {
            weights
        } else {
            toggle_tag(catalog, tag_id, &weights)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weight_of(weights: &[TagWeight], tag_id: &str) -> Option<f64> {
        weights.iter().find(|tw| tw.tag_id == tag_id).map(|tw| tw.weight)
    }

    fn ids(weights: &[TagWeight]) -> Vec<&str> {
        weights.iter().map(|tw| tw.tag_id.as_str()).collect()
    }

    #[test]
    fn test_toggle_adds_with_full_weight() {
        let catalog = TagCatalog::default();
        let weights = toggle_tag(&catalog, "t_me", &[]);
        assert_eq!(weights, vec![TagWeight::new("t_me", 1.0)]);
    }

    #[test]
    fn test_toggle_splits_multi_select_group_equally() {
        let catalog = TagCatalog::default();
        let weights = toggle_tag(&catalog, "t_me", &[]);
        let weights = toggle_tag(&catalog, "t_partner", &weights);
        assert_eq!(weight_of(&weights, "t_me"), Some(0.5));
        assert_eq!(weight_of(&weights, "t_partner"), Some(0.5));
        assert!(is_balanced(&catalog, &weights));
    }

    #[test]
    fn test_toggle_single_select_replaces_previous_tag() {
        let catalog = TagCatalog::default();
        let weights = toggle_tag(&catalog, "t_food", &[]);
        let weights = toggle_tag(&catalog, "t_me", &weights);
        let weights = toggle_tag(&catalog, "t_shop", &weights);
        assert_eq!(ids(&weights), vec!["t_me", "t_shop"]);
        assert_eq!(weight_of(&weights, "t_shop"), Some(1.0));
    }

    #[test]
    fn test_toggle_twice_restores_selection() {
        let catalog = TagCatalog::default();
        let start = vec![
            TagWeight::new("t_me", 0.7),
            TagWeight::new("t_partner", 0.3),
            TagWeight::new("t_food", 1.0),
        ];
        let added = toggle_tag(&catalog, "t_family", &start);
        assert_eq!(added.len(), 4);
        let removed = toggle_tag(&catalog, "t_family", &added);
        assert_eq!(ids(&removed), ids(&start));
        // Membership is restored; weights come back equalized.
        assert_eq!(weight_of(&removed, "t_me"), Some(0.5));
        assert!(is_balanced(&catalog, &removed));
    }

    #[test]
    fn test_toggle_removing_last_tag_empties_group() {
        let catalog = TagCatalog::default();
        let weights = toggle_tag(&catalog, "t_me", &[]);
        let weights = toggle_tag(&catalog, "t_me", &weights);
        assert!(weights.is_empty());
    }

    #[test]
    fn test_toggle_unknown_tag_is_ignored() {
        let catalog = TagCatalog::default();
        let start = vec![TagWeight::new("t_me", 1.0)];
        assert_eq!(toggle_tag(&catalog, "t_nope", &start), start);
    }

    #[test]
    fn test_toggle_keeps_dangling_entries() {
        let catalog = TagCatalog::default();
        let start = vec![TagWeight::new("t_gone", 0.25)];
        let weights = toggle_tag(&catalog, "t_me", &start);
        assert_eq!(weight_of(&weights, "t_gone"), Some(0.25));
        assert_eq!(weight_of(&weights, "t_me"), Some(1.0));
    }

    #[test]
    fn test_toggle_three_way_split_balances() {
        let mut catalog = TagCatalog::default();
        let kid = catalog.add_tag("g_member", "Kid", None).unwrap();
        let weights = toggle_tag(&catalog, "t_me", &[]);
        let weights = toggle_tag(&catalog, "t_partner", &weights);
        let weights = toggle_tag(&catalog, &kid, &weights);
        assert!((weight_of(&weights, &kid).unwrap() - 1.0 / 3.0).abs() < 1e-12);
        assert!(is_balanced(&catalog, &weights));
    }

    #[test]
    fn test_update_weight_two_tags_sets_complement() {
        let catalog = TagCatalog::default();
        let start = vec![TagWeight::new("t_me", 0.5), TagWeight::new("t_partner", 0.5)];
        for v in [0.0, 0.25, 0.6, 0.73, 1.0] {
            let weights = update_weight(&catalog, "t_me", v, &start);
            assert_eq!(weight_of(&weights, "t_me"), Some(v));
            assert_eq!(weight_of(&weights, "t_partner"), Some(1.0 - v));
        }
    }

    #[test]
    fn test_update_weight_rebalances_proportionally() {
        let mut catalog = TagCatalog::default();
        let kid = catalog.add_tag("g_member", "Kid", None).unwrap();
        let start = vec![
            TagWeight::new("t_me", 0.2),
            TagWeight::new("t_partner", 0.6),
            TagWeight::new(&kid, 0.2),
        ];
        let weights = update_weight(&catalog, "t_me", 0.6, &start);
        assert_eq!(weight_of(&weights, "t_me"), Some(0.6));
        assert!((weight_of(&weights, "t_partner").unwrap() - 0.3).abs() < 1e-12);
        assert!((weight_of(&weights, &kid).unwrap() - 0.1).abs() < 1e-12);
        assert!(is_balanced(&catalog, &weights));
    }

    #[test]
    fn test_update_weight_zero_siblings_split_equally() {
        let mut catalog = TagCatalog::default();
        let kid = catalog.add_tag("g_member", "Kid", None).unwrap();
        let start = vec![
            TagWeight::new("t_me", 1.0),
            TagWeight::new("t_partner", 0.0),
            TagWeight::new(&kid, 0.0),
        ];
        let weights = update_weight(&catalog, "t_me", 0.5, &start);
        assert_eq!(weight_of(&weights, "t_partner"), Some(0.25));
        assert_eq!(weight_of(&weights, &kid), Some(0.25));
    }

    #[test]
    fn test_update_weight_leaves_other_groups_alone() {
        let catalog = TagCatalog::default();
        let start = vec![
            TagWeight::new("t_family", 0.5),
            TagWeight::new("t_personal", 0.5),
            TagWeight::new("t_me", 0.5),
            TagWeight::new("t_partner", 0.5),
        ];
        let weights = update_weight(&catalog, "t_family", 0.9, &start);
        assert_eq!(weight_of(&weights, "t_me"), Some(0.5));
        assert_eq!(weight_of(&weights, "t_partner"), Some(0.5));
        assert!(is_balanced(&catalog, &weights));
    }

    #[test]
    fn test_update_weight_no_op_cases() {
        let catalog = TagCatalog::default();
        let lone = vec![TagWeight::new("t_me", 1.0)];
        assert_eq!(update_weight(&catalog, "t_me", 0.3, &lone), lone);

        let pair = vec![TagWeight::new("t_me", 0.5), TagWeight::new("t_partner", 0.5)];
        assert_eq!(update_weight(&catalog, "t_family", 0.3, &pair), pair);
        assert_eq!(update_weight(&catalog, "t_gone", 0.3, &pair), pair);
        assert_eq!(update_weight(&catalog, "t_me", f64::NAN, &pair), pair);

        // Category group does not allow weights.
        let mut catalog = catalog;
        let extra = catalog.add_tag("g_cat", "Gifts", None).unwrap();
        let cats = vec![TagWeight::new("t_food", 0.5), TagWeight::new(&extra, 0.5)];
        assert_eq!(update_weight(&catalog, "t_food", 0.8, &cats), cats);
    }

    #[test]
    fn test_update_weight_clamps_value() {
        let catalog = TagCatalog::default();
        let pair = vec![TagWeight::new("t_me", 0.5), TagWeight::new("t_partner", 0.5)];
        let weights = update_weight(&catalog, "t_me", 1.5, &pair);
        assert_eq!(weight_of(&weights, "t_me"), Some(1.0));
        assert_eq!(weight_of(&weights, "t_partner"), Some(0.0));
    }

    #[test]
    fn test_repeated_updates_stay_balanced() {
        let mut catalog = TagCatalog::default();
        let kid = catalog.add_tag("g_member", "Kid", None).unwrap();
        let mut weights = toggle_tag(&catalog, "t_me", &[]);
        weights = toggle_tag(&catalog, "t_partner", &weights);
        weights = toggle_tag(&catalog, &kid, &weights);
        for (i, v) in [0.1, 0.45, 0.9, 0.33, 0.07].iter().enumerate() {
            let target = ["t_me", "t_partner", kid.as_str()][i % 3];
            weights = update_weight(&catalog, target, *v, &weights);
            assert!(is_balanced(&catalog, &weights));
            assert!(weights.iter().all(|tw| tw.weight >= 0.0));
        }
    }

    #[test]
    fn test_apply_suggestions_respects_single_select() {
        let catalog = TagCatalog::default();
        let suggested = vec![
            "t_food".to_string(),
            "t_shop".to_string(),
            "t_me".to_string(),
            "t_nope".to_string(),
        ];
        let weights = apply_suggestions(&catalog, &suggested, &[]);
        assert_eq!(ids(&weights), vec!["t_shop", "t_me"]);

        // Already selected tags are not toggled off.
        let again = apply_suggestions(&catalog, &["t_me".to_string()], &weights);
        assert_eq!(again, weights);
    }

    #[test]
    fn test_group_weight_sum() {
        let catalog = TagCatalog::default();
        let weights = vec![
            TagWeight::new("t_me", 0.6),
            TagWeight::new("t_partner", 0.4),
            TagWeight::new("t_food", 1.0),
        ];
        assert!((group_weight_sum(&catalog, "g_member", &weights) - 1.0).abs() < 1e-12);
        assert_eq!(group_weight_sum(&catalog, "g_scope", &weights), 0.0);
        assert!(!is_balanced(&catalog, &[TagWeight::new("t_me", 0.6)]));
    }
}
