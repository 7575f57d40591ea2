use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::directory::GroupDirectory;
use crate::filter::{apply_group_filters, apply_student_filters, my_groups, online_count};
use crate::models::{
    FilterState, GroupFilterState, GroupTypeFilter, SchoolGroup, SortOption, SortSurface, Student,
};

/// The single mutation a chip's dismiss button performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterAction {
    ClearSearch,
    RemoveGroup(String),
    ResetSort,
    ResetType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveFilterKind {
    Search,
    Group(String),
    Sort,
    GroupType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveFilter {
    pub kind: ActiveFilterKind,
    pub label: String,
}

impl ActiveFilter {
    pub fn dismiss_action(&self) -> FilterAction {
        match &self.kind {
            ActiveFilterKind::Search => FilterAction::ClearSearch,
            ActiveFilterKind::Group(id) => FilterAction::RemoveGroup(id.clone()),
            ActiveFilterKind::Sort => FilterAction::ResetSort,
            ActiveFilterKind::GroupType => FilterAction::ResetType,
        }
    }
}

impl fmt::Display for ActiveFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ActiveFilterKind::Search => write!(f, "Search: \"{}\"", self.label),
            ActiveFilterKind::GroupType => write!(f, "Type: {}", self.label),
            ActiveFilterKind::Group(_) | ActiveFilterKind::Sort => f.write_str(&self.label),
        }
    }
}

pub fn student_active_filters(state: &FilterState, directory: &GroupDirectory) -> Vec<ActiveFilter> {
    let mut chips = Vec::new();

    if !state.search.is_empty() {
        chips.push(ActiveFilter {
            kind: ActiveFilterKind::Search,
            label: state.search.clone(),
        });
    }

    for id in &state.selected_groups {
        chips.push(ActiveFilter {
            kind: ActiveFilterKind::Group(id.clone()),
            label: directory.display_name(id).to_string(),
        });
    }

    if state.has_custom_sort() {
        chips.push(ActiveFilter {
            kind: ActiveFilterKind::Sort,
            label: state.sort.label().to_string(),
        });
    }

    chips
}

pub fn group_active_filters(state: &GroupFilterState) -> Vec<ActiveFilter> {
    let mut chips = Vec::new();

    if !state.search.is_empty() {
        chips.push(ActiveFilter {
            kind: ActiveFilterKind::Search,
            label: state.search.clone(),
        });
    }

    if state.group_type != GroupTypeFilter::All {
        chips.push(ActiveFilter {
            kind: ActiveFilterKind::GroupType,
            label: state.group_type.label().to_string(),
        });
    }

    chips
}

/// Owns the Students view filter state and keeps the derived list current.
#[derive(Debug, Clone)]
pub struct StudentFilters {
    students: Arc<[Student]>,
    directory: GroupDirectory,
    surface: SortSurface,
    state: FilterState,
    filtered: Vec<Student>,
}

impl StudentFilters {
    pub fn new(students: Vec<Student>, directory: GroupDirectory, surface: SortSurface) -> Self {
        let mut filters = Self {
            students: students.into(),
            directory,
            surface,
            state: FilterState::default(),
            filtered: Vec::new(),
        };
        filters.recompute();
        filters
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn filtered(&self) -> &[Student] {
        &self.filtered
    }

    pub fn directory(&self) -> &GroupDirectory {
        &self.directory
    }

    pub fn total_count(&self) -> usize {
        self.students.len()
    }

    pub fn online_count(&self) -> usize {
        online_count(&self.students)
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        let next = self.state.with_search(search);
        self.replace_state(next);
    }

    pub fn set_selected_groups(&mut self, ids: Vec<String>) {
        let next = self.state.with_selected_groups(ids);
        self.replace_state(next);
    }

    pub fn toggle_group(&mut self, id: &str) {
        let next = self.state.with_group_toggled(id);
        self.replace_state(next);
    }

    pub fn select_all_groups(&mut self) {
        let next = self.state.with_selected_groups(self.directory.all_ids());
        self.replace_state(next);
    }

    pub fn set_sort(&mut self, sort: SortOption) {
        let next = self.state.with_sort(sort);
        self.replace_state(next);
    }

    pub fn remove_group(&mut self, id: &str) {
        let next = self.state.without_group(id);
        self.replace_state(next);
    }

    pub fn clear_search(&mut self) {
        let next = self.state.without_search();
        self.replace_state(next);
    }

    pub fn reset_sort(&mut self) {
        let next = self.state.with_default_sort();
        self.replace_state(next);
    }

    pub fn clear_all(&mut self) {
        let next = self.state.cleared();
        self.replace_state(next);
    }

    pub fn dismiss(&mut self, chip: &ActiveFilter) {
        match chip.dismiss_action() {
            FilterAction::ClearSearch => self.clear_search(),
            FilterAction::RemoveGroup(id) => self.remove_group(&id),
            FilterAction::ResetSort => self.reset_sort(),
            FilterAction::ResetType => debug!("group type chip has no effect on students view"),
        }
    }

    /// Swaps in a fresh roster snapshot; the current filters are re-applied to it.
    pub fn replace_roster(&mut self, students: Vec<Student>, directory: GroupDirectory) {
        info!(students = students.len(), groups = directory.len(), "roster replaced");
        self.students = students.into();
        self.directory = directory;
        self.recompute();
    }

    pub fn active_filters(&self) -> Vec<ActiveFilter> {
        student_active_filters(&self.state, &self.directory)
    }

    /// Badge count shown on the filter panel: selected groups plus a non-default sort.
    pub fn active_filter_count(&self) -> usize {
        self.state.selected_groups.len() + usize::from(self.state.has_custom_sort())
    }

    pub fn has_active_filters(&self) -> bool {
        self.state.has_active_filters()
    }

    fn replace_state(&mut self, next: FilterState) {
        self.state = next;
        self.recompute();
    }

    fn recompute(&mut self) {
        self.filtered = apply_student_filters(&self.students, &self.state, self.surface);
        debug!(
            search = %self.state.search,
            groups = self.state.selected_groups.len(),
            sort = %self.state.sort,
            matched = self.filtered.len(),
            total = self.students.len(),
            "student filters applied"
        );
    }
}

/// Groups view equivalent of [`StudentFilters`].
#[derive(Debug, Clone)]
pub struct GroupFilters {
    groups: Arc<[SchoolGroup]>,
    state: GroupFilterState,
    filtered: Vec<SchoolGroup>,
}

impl GroupFilters {
    pub fn new(groups: Vec<SchoolGroup>) -> Self {
        let mut filters = Self {
            groups: groups.into(),
            state: GroupFilterState::default(),
            filtered: Vec::new(),
        };
        filters.recompute();
        filters
    }

    pub fn state(&self) -> &GroupFilterState {
        &self.state
    }

    pub fn filtered(&self) -> &[SchoolGroup] {
        &self.filtered
    }

    pub fn my_groups(&self) -> Vec<SchoolGroup> {
        my_groups(&self.groups)
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        let next = self.state.with_search(search);
        self.replace_state(next);
    }

    pub fn set_group_type(&mut self, group_type: GroupTypeFilter) {
        let next = self.state.with_group_type(group_type);
        self.replace_state(next);
    }

    pub fn clear_search(&mut self) {
        let next = self.state.with_search(String::new());
        self.replace_state(next);
    }

    pub fn reset_type(&mut self) {
        let next = self.state.with_group_type(GroupTypeFilter::All);
        self.replace_state(next);
    }

    pub fn clear_all(&mut self) {
        self.replace_state(GroupFilterState::default());
    }

    pub fn dismiss(&mut self, chip: &ActiveFilter) {
        match chip.dismiss_action() {
            FilterAction::ClearSearch => self.clear_search(),
            FilterAction::ResetType => self.reset_type(),
            FilterAction::RemoveGroup(_) | FilterAction::ResetSort => {
                debug!("student chip has no effect on groups view")
            }
        }
    }

    pub fn replace_groups(&mut self, groups: Vec<SchoolGroup>) {
        info!(groups = groups.len(), "school groups replaced");
        self.groups = groups.into();
        self.recompute();
    }

    pub fn active_filters(&self) -> Vec<ActiveFilter> {
        group_active_filters(&self.state)
    }

    pub fn has_active_filters(&self) -> bool {
        self.state.has_active_filters()
    }

    fn replace_state(&mut self, next: GroupFilterState) {
        self.state = next;
        self.recompute();
    }

    fn recompute(&mut self) {
        self.filtered = apply_group_filters(&self.groups, &self.state);
        debug!(
            search = %self.state.search,
            group_type = self.state.group_type.label(),
            matched = self.filtered.len(),
            total = self.groups.len(),
            "group filters applied"
        );
    }
}
