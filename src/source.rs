use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;

use crate::models::Roster;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterSource {
    File(PathBuf),
    Database(String),
}

pub fn load_roster_file(path: &Path) -> anyhow::Result<Roster> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read roster file {}", path.display()))?;
    let roster = parse_roster(&raw)
        .with_context(|| format!("failed to parse roster file {}", path.display()))?;
    info!(
        path = %path.display(),
        students = roster.students.len(),
        groups = roster.groups.len(),
        school_groups = roster.school_groups.len(),
        "roster loaded from file"
    );
    Ok(roster)
}

pub fn parse_roster(raw: &str) -> anyhow::Result<Roster> {
    Ok(serde_json::from_str(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GroupKind, SchoolGroupType};

    #[test]
    fn parses_roster_snapshot() {
        let roster = parse_roster(
            r#"{
                "groups": [{"id": "north", "name": "North Region", "type": "region"}],
                "students": [{
                    "id": "s1",
                    "firstName": "Amy",
                    "lastName": "Lee",
                    "groups": ["north"],
                    "isOnline": true,
                    "tasks": 3,
                    "lastSubmissionDate": "2026-02-01T09:30:00Z"
                }],
                "schoolGroups": [{
                    "id": "band",
                    "name": "School Band",
                    "type": "studio",
                    "studentCount": 35,
                    "members": ["Grace Lee"]
                }]
            }"#,
        )
        .expect("roster parses");

        assert_eq!(roster.groups[0].kind, GroupKind::Region);
        assert_eq!(roster.students[0].tasks, 3);
        assert!(roster.students[0].last_submission_at.is_some());
        assert_eq!(roster.school_groups[0].group_type, SchoolGroupType::Studio);
        assert!(!roster.school_groups[0].is_mine);
    }

    #[test]
    fn fixture_roster_drives_the_students_view() {
        use crate::controller::StudentFilters;
        use crate::directory::GroupDirectory;
        use crate::models::{SortOption, SortSurface};

        let roster = parse_roster(include_str!("../fixtures/roster.json")).expect("fixture parses");
        let mut filters = StudentFilters::new(
            roster.students,
            GroupDirectory::new(roster.groups),
            SortSurface::Standard,
        );
        filters.set_sort(SortOption::TasksHigh);
        let names: Vec<String> = filters.filtered().iter().map(|s| s.full_name()).collect();
        assert_eq!(names, vec!["Bob Ng", "Amy Lee", "Cam Oz"]);

        filters.toggle_group("retired-2024");
        assert_eq!(filters.filtered().len(), 1);
        assert_eq!(filters.active_filters()[0].to_string(), "retired-2024");
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let roster = parse_roster("{}").expect("empty roster parses");
        assert_eq!(roster, Roster::default());
    }

    #[test]
    fn rejects_unknown_group_type() {
        let result = parse_roster(
            r#"{"schoolGroups": [{"id": "x", "name": "X", "type": "club"}]}"#,
        );
        assert!(result.is_err());
    }
}
