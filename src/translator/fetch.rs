//! Fetch graph planning for the statement's result entity.
//!
//! For every association reachable from the result root, decide whether it
//! is fetched now (and whether by join) or later. Precedence per role:
//! explicit `join fetch` in the from-clause, then the applied fetch graph,
//! then enabled fetch profiles, then the association's declared defaults.
//! A max-depth cutoff demotes joined fetches to deferred ones, and a role
//! already on the current ancestry chain becomes a circular reference
//! instead of a re-fetch.

use std::collections::HashMap;

use crate::domain::path::NavigablePath;
use crate::domain::statement::{FetchGraphNode, FetchStyleHint};
use crate::metamodel::{
    AttributeKind, CollectionClassification, FetchStyle, FetchTiming, PluralElement,
};
use crate::relational::{Fetch, SqlJoinKind, TableGroupId};
use crate::translator::errors::TranslationError;
use crate::translator::Translator;

impl Translator<'_> {
    pub(crate) fn plan_fetches(
        &mut self,
        entity: &str,
        root_path: &NavigablePath,
        root_group: TableGroupId,
    ) -> Result<Vec<Fetch>, TranslationError> {
        let graph = self.fetch_graph.clone();
        let mut ancestry = Vec::new();
        let fetches = self.plan_children(
            entity,
            root_path,
            root_group,
            graph.as_ref().map(|g| &g.root),
            0,
            &mut ancestry,
        )?;
        if self.bag_join_fetch_roles.len() > 1 {
            return Err(TranslationError::MultipleBagFetch {
                roles: self.bag_join_fetch_roles.clone(),
            });
        }
        Ok(fetches)
    }

    fn plan_children(
        &mut self,
        entity: &str,
        parent_path: &NavigablePath,
        parent_group: TableGroupId,
        graph: Option<&FetchGraphNode>,
        depth: usize,
        ancestry: &mut Vec<(String, NavigablePath)>,
    ) -> Result<Vec<Fetch>, TranslationError> {
        let attributes = self.metamodel.entity(entity)?.attributes.clone();
        let mut fetches = Vec::new();
        for attribute in &attributes {
            if !attribute.is_joinable() {
                continue;
            }
            let role = format!("{}.{}", entity, attribute.name);
            let path = parent_path.append(&attribute.name);

            if let Some((_, ancestor)) = ancestry.iter().find(|(r, _)| r == &role) {
                // Re-fetching an ancestor role would recurse forever; emit
                // a back-reference to the already-planned occurrence.
                log::trace!("circular fetch of `{}`; referencing `{}`", role, ancestor);
                fetches.push(Fetch {
                    role,
                    path,
                    timing: FetchTiming::Delayed,
                    joined: false,
                    table_group: None,
                    circular_reference: Some(ancestor.clone()),
                    children: Vec::new(),
                });
                continue;
            }

            let graph_child = graph.and_then(|g| g.children.get(&attribute.name));
            let (mut timing, mut joined) = if self.fetched_join_paths.contains(&path) {
                (FetchTiming::Immediate, true)
            } else if let Some((style, _)) = graph_child {
                (FetchTiming::Immediate, *style == FetchStyleHint::Join)
            } else if let Some(style) = self.enabled_profile_style(attribute) {
                (FetchTiming::Immediate, style == FetchStyle::Join)
            } else {
                let defaults = attribute_fetch_defaults(attribute);
                let joined =
                    defaults.timing == FetchTiming::Immediate && defaults.style == FetchStyle::Join;
                (defaults.timing, joined)
            };

            if let Some(max) = self.config.max_fetch_depth {
                if joined && depth >= max {
                    log::debug!("fetch depth {} cuts off join fetch of `{}`", depth, role);
                    joined = false;
                    timing = FetchTiming::Delayed;
                }
            }

            let table_group = if joined {
                let group = match self.scopes.resolve(&path) {
                    Some(group) => group,
                    None => self.join_attribute(
                        parent_group,
                        &path,
                        attribute,
                        SqlJoinKind::Left,
                        None,
                    )?,
                };
                if is_bag(&attribute.kind) {
                    self.bag_join_fetch_roles.push(role.clone());
                }
                Some(group)
            } else {
                None
            };

            let children = match (table_group, fetched_entity(&attribute.kind)) {
                (Some(group), Some(child_entity)) => {
                    ancestry.push((role.clone(), path.clone()));
                    let children = self.plan_children(
                        &child_entity,
                        &path,
                        group,
                        graph_child.map(|(_, node)| node),
                        depth + 1,
                        ancestry,
                    )?;
                    ancestry.pop();
                    children
                }
                _ => Vec::new(),
            };

            fetches.push(Fetch {
                role,
                path,
                timing,
                joined,
                table_group,
                circular_reference: None,
                children,
            });
        }
        Ok(fetches)
    }

    /// The style of the first enabled profile mentioning this attribute.
    fn enabled_profile_style(&self, attribute: &crate::metamodel::Attribute) -> Option<FetchStyle> {
        let profiles: &HashMap<String, FetchStyle> = match &attribute.kind {
            AttributeKind::ToOne { fetch_profiles, .. } => fetch_profiles,
            AttributeKind::Plural { fetch_profiles, .. } => fetch_profiles,
            _ => return None,
        };
        self.config
            .enabled_fetch_profiles
            .iter()
            .find_map(|profile| profiles.get(profile).copied())
    }
}

fn attribute_fetch_defaults(attribute: &crate::metamodel::Attribute) -> crate::metamodel::FetchDefaults {
    match &attribute.kind {
        AttributeKind::ToOne { fetch, .. } => *fetch,
        AttributeKind::Plural { fetch, .. } => *fetch,
        _ => crate::metamodel::FetchDefaults::default(),
    }
}

fn is_bag(kind: &AttributeKind) -> bool {
    matches!(
        kind,
        AttributeKind::Plural {
            classification: CollectionClassification::Bag,
            ..
        }
    )
}

/// The entity fetched beneath this association, when there is one.
fn fetched_entity(kind: &AttributeKind) -> Option<String> {
    match kind {
        AttributeKind::ToOne { entity, .. } => Some(entity.clone()),
        AttributeKind::Plural {
            element: PluralElement::EntityElement { entity },
            ..
        } => Some(entity.clone()),
        _ => None,
    }
}
