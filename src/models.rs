use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RosterError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    Region,
    Class,
}

impl GroupKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GroupKind::Region => "region",
            GroupKind::Class => "class",
        }
    }

    pub fn section_title(self) -> &'static str {
        match self {
            GroupKind::Region => "Regions",
            GroupKind::Class => "Classes",
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupKind {
    type Err = RosterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "region" => Ok(GroupKind::Region),
            "class" => Ok(GroupKind::Class),
            _ => Err(RosterError::UnknownGroupKind(value.to_string())),
        }
    }
}

/// Reference group a student can belong to (student roster context).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: GroupKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchoolGroupType {
    Studio,
    Anchor,
    Flex,
    Other,
}

impl SchoolGroupType {
    pub const ALL: [SchoolGroupType; 4] = [
        SchoolGroupType::Studio,
        SchoolGroupType::Anchor,
        SchoolGroupType::Flex,
        SchoolGroupType::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SchoolGroupType::Studio => "studio",
            SchoolGroupType::Anchor => "anchor",
            SchoolGroupType::Flex => "flex",
            SchoolGroupType::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SchoolGroupType::Studio => "Studio",
            SchoolGroupType::Anchor => "Anchor",
            SchoolGroupType::Flex => "Flex",
            SchoolGroupType::Other => "Other",
        }
    }
}

impl fmt::Display for SchoolGroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchoolGroupType {
    type Err = RosterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        SchoolGroupType::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| RosterError::UnknownGroupType(value.to_string()))
    }
}

/// Group as listed on the Groups page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolGroup {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub group_type: SchoolGroupType,
    #[serde(default)]
    pub student_count: u32,
    /// Preview of member display names; may be shorter than `student_count`.
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub is_mine: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub initials: String,
    #[serde(rename = "groups", default)]
    pub group_ids: Vec<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub is_online: bool,
    #[serde(default)]
    pub lessons_complete: u32,
    #[serde(default)]
    pub help_requests: u32,
    #[serde(default)]
    pub submissions: u32,
    #[serde(default)]
    pub tasks: u32,
    #[serde(rename = "lastSubmissionDate", default)]
    pub last_submission_at: Option<DateTime<Utc>>,
    #[serde(rename = "lastHelpRequestDate", default)]
    pub last_help_request_at: Option<DateTime<Utc>>,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn display_initials(&self) -> String {
        if !self.initials.trim().is_empty() {
            return self.initials.clone();
        }
        derive_initials(&self.first_name, &self.last_name)
    }

    pub fn belongs_to_any(&self, group_ids: &[String]) -> bool {
        self.group_ids.iter().any(|id| group_ids.contains(id))
    }
}

pub fn derive_initials(first_name: &str, last_name: &str) -> String {
    [first_name, last_name]
        .iter()
        .filter_map(|part| part.trim().chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOption {
    #[default]
    NameAsc,
    NameDesc,
    SubmissionRecent,
    SubmissionOldest,
    SubmissionHigh,
    SubmissionLow,
    HelpRecent,
    HelpOldest,
    HelpHigh,
    HelpLow,
    PresentFirst,
    AbsentFirst,
    TasksHigh,
    TasksLow,
}

impl SortOption {
    /// Canonical enumeration in menu order. Every sort surface filters this list.
    pub const ALL: [SortOption; 14] = [
        SortOption::NameAsc,
        SortOption::NameDesc,
        SortOption::SubmissionRecent,
        SortOption::SubmissionOldest,
        SortOption::SubmissionHigh,
        SortOption::SubmissionLow,
        SortOption::HelpRecent,
        SortOption::HelpOldest,
        SortOption::HelpHigh,
        SortOption::HelpLow,
        SortOption::PresentFirst,
        SortOption::AbsentFirst,
        SortOption::TasksHigh,
        SortOption::TasksLow,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortOption::NameAsc => "name-asc",
            SortOption::NameDesc => "name-desc",
            SortOption::SubmissionRecent => "submission-recent",
            SortOption::SubmissionOldest => "submission-oldest",
            SortOption::SubmissionHigh => "submission-high",
            SortOption::SubmissionLow => "submission-low",
            SortOption::HelpRecent => "help-recent",
            SortOption::HelpOldest => "help-oldest",
            SortOption::HelpHigh => "help-high",
            SortOption::HelpLow => "help-low",
            SortOption::PresentFirst => "present-first",
            SortOption::AbsentFirst => "absent-first",
            SortOption::TasksHigh => "tasks-high",
            SortOption::TasksLow => "tasks-low",
        }
    }

    /// Description used on the active-filter chip.
    pub fn label(self) -> &'static str {
        match self {
            SortOption::NameAsc => "Name A→Z",
            SortOption::NameDesc => "Name Z→A",
            SortOption::SubmissionRecent => "Recent Submissions",
            SortOption::SubmissionOldest => "Oldest Submissions",
            SortOption::SubmissionHigh => "Most Submissions",
            SortOption::SubmissionLow => "Fewest Submissions",
            SortOption::HelpRecent => "Recent Help Requests",
            SortOption::HelpOldest => "Oldest Help Requests",
            SortOption::HelpHigh => "Most Help Requests",
            SortOption::HelpLow => "Fewest Help Requests",
            SortOption::PresentFirst => "Present First",
            SortOption::AbsentFirst => "Absent First",
            SortOption::TasksHigh => "Most Tasks",
            SortOption::TasksLow => "Fewest Tasks",
        }
    }

    pub fn menu_label(self) -> &'static str {
        match self {
            SortOption::NameAsc => "A → Z",
            SortOption::NameDesc => "Z → A",
            SortOption::SubmissionRecent | SortOption::HelpRecent => "Most Recent",
            SortOption::SubmissionOldest | SortOption::HelpOldest => "Oldest First",
            SortOption::SubmissionHigh | SortOption::HelpHigh => "Most Count",
            SortOption::SubmissionLow | SortOption::HelpLow => "Least Count",
            SortOption::PresentFirst => "Present First",
            SortOption::AbsentFirst => "Absent First",
            SortOption::TasksHigh => "Most Tasks",
            SortOption::TasksLow => "Fewest Tasks",
        }
    }

    pub fn menu_section(self) -> &'static str {
        match self {
            SortOption::NameAsc | SortOption::NameDesc => "Student Name",
            SortOption::SubmissionRecent
            | SortOption::SubmissionOldest
            | SortOption::SubmissionHigh
            | SortOption::SubmissionLow => "Submissions",
            SortOption::HelpRecent
            | SortOption::HelpOldest
            | SortOption::HelpHigh
            | SortOption::HelpLow => "Help Requests",
            SortOption::PresentFirst | SortOption::AbsentFirst => "Presence",
            SortOption::TasksHigh | SortOption::TasksLow => "Tasks Count",
        }
    }

    pub fn is_count_based(self) -> bool {
        matches!(
            self,
            SortOption::SubmissionHigh
                | SortOption::SubmissionLow
                | SortOption::HelpHigh
                | SortOption::HelpLow
        )
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOption {
    type Err = RosterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        SortOption::ALL
            .into_iter()
            .find(|option| option.as_str() == value.trim())
            .ok_or_else(|| RosterError::UnknownSortOption(value.to_string()))
    }
}

/// Which subset of [`SortOption::ALL`] a sort control exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortSurface {
    #[default]
    Standard,
    Extended,
}

impl SortSurface {
    pub fn offers(self, option: SortOption) -> bool {
        match self {
            SortSurface::Standard => !option.is_count_based(),
            SortSurface::Extended => true,
        }
    }

    pub fn options(self) -> Vec<SortOption> {
        SortOption::ALL
            .into_iter()
            .filter(|option| self.offers(*option))
            .collect()
    }

    /// Menu sections in display order, each with the options this surface offers.
    pub fn sections(self) -> Vec<(&'static str, Vec<SortOption>)> {
        let mut sections: Vec<(&'static str, Vec<SortOption>)> = Vec::new();
        for option in self.options() {
            if let Some((title, options)) = sections.last_mut() {
                if *title == option.menu_section() {
                    options.push(option);
                    continue;
                }
            }
            sections.push((option.menu_section(), vec![option]));
        }
        sections
    }

    pub fn parse_option(self, value: &str) -> Result<SortOption, RosterError> {
        let option = value.parse::<SortOption>()?;
        if self.offers(option) {
            Ok(option)
        } else {
            Err(RosterError::SortNotOffered {
                option: option.to_string(),
                surface: self.to_string(),
            })
        }
    }
}

impl fmt::Display for SortSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortSurface::Standard => f.write_str("standard"),
            SortSurface::Extended => f.write_str("extended"),
        }
    }
}

impl FromStr for SortSurface {
    type Err = RosterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(SortSurface::Standard),
            "extended" => Ok(SortSurface::Extended),
            _ => Err(RosterError::UnknownSortSurface(value.to_string())),
        }
    }
}

/// Students view filter state. Every transition returns a new value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub search: String,
    pub selected_groups: Vec<String>,
    pub sort: SortOption,
}

impl FilterState {
    pub fn with_search(&self, search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            ..self.clone()
        }
    }

    pub fn with_selected_groups(&self, selected_groups: Vec<String>) -> Self {
        let mut deduped: Vec<String> = Vec::with_capacity(selected_groups.len());
        for id in selected_groups {
            if !deduped.contains(&id) {
                deduped.push(id);
            }
        }
        Self {
            selected_groups: deduped,
            ..self.clone()
        }
    }

    pub fn with_group_toggled(&self, group_id: &str) -> Self {
        if self.selected_groups.iter().any(|id| id == group_id) {
            self.without_group(group_id)
        } else {
            let mut selected_groups = self.selected_groups.clone();
            selected_groups.push(group_id.to_string());
            Self {
                selected_groups,
                ..self.clone()
            }
        }
    }

    pub fn without_group(&self, group_id: &str) -> Self {
        Self {
            selected_groups: self
                .selected_groups
                .iter()
                .filter(|id| *id != group_id)
                .cloned()
                .collect(),
            ..self.clone()
        }
    }

    pub fn with_sort(&self, sort: SortOption) -> Self {
        Self {
            sort,
            ..self.clone()
        }
    }

    pub fn without_search(&self) -> Self {
        self.with_search(String::new())
    }

    pub fn with_default_sort(&self) -> Self {
        self.with_sort(SortOption::default())
    }

    pub fn cleared(&self) -> Self {
        Self::default()
    }

    pub fn has_custom_sort(&self) -> bool {
        self.sort != SortOption::default()
    }

    pub fn has_active_filters(&self) -> bool {
        !self.search.is_empty() || !self.selected_groups.is_empty() || self.has_custom_sort()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupTypeFilter {
    #[default]
    All,
    Only(SchoolGroupType),
}

impl GroupTypeFilter {
    pub fn matches(self, group_type: SchoolGroupType) -> bool {
        match self {
            GroupTypeFilter::All => true,
            GroupTypeFilter::Only(wanted) => wanted == group_type,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GroupTypeFilter::All => "All",
            GroupTypeFilter::Only(group_type) => group_type.label(),
        }
    }
}

impl FromStr for GroupTypeFilter {
    type Err = RosterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().eq_ignore_ascii_case("all") {
            return Ok(GroupTypeFilter::All);
        }
        value.parse::<SchoolGroupType>().map(GroupTypeFilter::Only)
    }
}

/// Groups view filter state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroupFilterState {
    pub search: String,
    pub group_type: GroupTypeFilter,
}

impl GroupFilterState {
    pub fn with_search(&self, search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            ..self.clone()
        }
    }

    pub fn with_group_type(&self, group_type: GroupTypeFilter) -> Self {
        Self {
            group_type,
            ..self.clone()
        }
    }

    pub fn has_active_filters(&self) -> bool {
        !self.search.is_empty() || self.group_type != GroupTypeFilter::All
    }
}

/// One snapshot of reference data delivered by a roster source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roster {
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub school_groups: Vec<SchoolGroup>,
}
