use std::collections::HashMap;

use crate::filter::normalize_name_lookup;
use crate::models::{Group, GroupKind};

/// Read-only lookup table over the reference groups, passed to whoever needs names.
#[derive(Debug, Clone, Default)]
pub struct GroupDirectory {
    groups: Vec<Group>,
    index: HashMap<String, usize>,
}

impl GroupDirectory {
    pub fn new(groups: Vec<Group>) -> Self {
        let mut index = HashMap::with_capacity(groups.len());
        for (position, group) in groups.iter().enumerate() {
            index.entry(group.id.clone()).or_insert(position);
        }
        Self { groups, index }
    }

    pub fn get(&self, id: &str) -> Option<&Group> {
        self.index.get(id).map(|position| &self.groups[*position])
    }

    /// Resolved group name, or the raw id when the id is stale.
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).map(|group| group.name.as_str()).unwrap_or(id)
    }

    pub fn all_ids(&self) -> Vec<String> {
        self.groups.iter().map(|group| group.id.clone()).collect()
    }

    /// Picker options narrowed by name; a blank query keeps every option.
    pub fn search_options(&self, query: &str) -> Vec<&Group> {
        if query.trim().is_empty() {
            return self.groups.iter().collect();
        }
        let query = normalize_name_lookup(query);
        self.groups
            .iter()
            .filter(|group| normalize_name_lookup(&group.name).contains(&query))
            .collect()
    }

    /// Matching options split into Regions then Classes, empty sections omitted.
    pub fn option_sections(&self, query: &str) -> Vec<(GroupKind, Vec<&Group>)> {
        let options = self.search_options(query);
        [GroupKind::Region, GroupKind::Class]
            .into_iter()
            .map(|kind| {
                let section: Vec<&Group> = options
                    .iter()
                    .copied()
                    .filter(|group| group.kind == kind)
                    .collect();
                (kind, section)
            })
            .filter(|(_, section)| !section.is_empty())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }
}
