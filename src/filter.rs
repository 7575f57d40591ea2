use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use tracing::debug;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::{
    FilterState, GroupFilterState, SchoolGroup, SortOption, SortSurface, Student,
};

pub fn apply_student_filters(
    students: &[Student],
    state: &FilterState,
    surface: SortSurface,
) -> Vec<Student> {
    // Blank text switches search off; otherwise the text is matched as typed.
    let needle = if state.search.trim().is_empty() {
        None
    } else {
        Some(normalize_name_lookup(&state.search))
    };

    let mut result: Vec<Student> = students
        .iter()
        .filter(|student| {
            needle
                .as_deref()
                .map_or(true, |needle| matches_name(student, needle))
        })
        .filter(|student| {
            state.selected_groups.is_empty() || student.belongs_to_any(&state.selected_groups)
        })
        .cloned()
        .collect();

    if surface.offers(state.sort) {
        result.sort_by(|a, b| compare_students(a, b, state.sort));
    } else {
        debug!(sort = %state.sort, %surface, "sort not offered by surface, keeping order");
    }

    result
}

/// NFKC plus Unicode lowercase, so composed and decomposed input compare alike.
pub fn normalize_name_lookup(input: &str) -> String {
    input.nfkc().collect::<String>().to_lowercase()
}

/// Primary collation key: accents stripped, lowercased.
fn collation_key(input: &str) -> String {
    input
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

fn matches_name(student: &Student, needle: &str) -> bool {
    normalize_name_lookup(&student.full_name()).contains(needle)
}

pub fn compare_students(a: &Student, b: &Student, sort: SortOption) -> Ordering {
    match sort {
        SortOption::NameAsc => compare_names(&a.full_name(), &b.full_name()),
        SortOption::NameDesc => compare_names(&b.full_name(), &a.full_name()),
        SortOption::SubmissionRecent => {
            compare_dates(a.last_submission_at, b.last_submission_at, true)
        }
        SortOption::SubmissionOldest => {
            compare_dates(a.last_submission_at, b.last_submission_at, false)
        }
        SortOption::SubmissionHigh => b.submissions.cmp(&a.submissions),
        SortOption::SubmissionLow => a.submissions.cmp(&b.submissions),
        SortOption::HelpRecent => {
            compare_dates(a.last_help_request_at, b.last_help_request_at, true)
        }
        SortOption::HelpOldest => {
            compare_dates(a.last_help_request_at, b.last_help_request_at, false)
        }
        SortOption::HelpHigh => b.help_requests.cmp(&a.help_requests),
        SortOption::HelpLow => a.help_requests.cmp(&b.help_requests),
        SortOption::PresentFirst => b.is_online.cmp(&a.is_online),
        SortOption::AbsentFirst => a.is_online.cmp(&b.is_online),
        SortOption::TasksHigh => b.tasks.cmp(&a.tasks),
        SortOption::TasksLow => a.tasks.cmp(&b.tasks),
    }
}

/// Base letters first (accents and case ignored), then accents, then case so the order stays total.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| normalize_name_lookup(a).cmp(&normalize_name_lookup(b)))
        .then_with(|| b.cmp(a))
}

/// Absent dates sink to the end whichever direction is requested.
fn compare_dates(
    a: Option<DateTime<Utc>>,
    b: Option<DateTime<Utc>>,
    most_recent_first: bool,
) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) if most_recent_first => b.cmp(&a),
        (Some(a), Some(b)) => a.cmp(&b),
    }
}

pub fn apply_group_filters(groups: &[SchoolGroup], state: &GroupFilterState) -> Vec<SchoolGroup> {
    let needle = if state.search.trim().is_empty() {
        None
    } else {
        Some(normalize_name_lookup(&state.search))
    };

    groups
        .iter()
        .filter(|group| state.group_type.matches(group.group_type))
        .filter(|group| {
            needle
                .as_deref()
                .map_or(true, |needle| matches_group(group, needle))
        })
        .cloned()
        .collect()
}

fn matches_group(group: &SchoolGroup, needle: &str) -> bool {
    normalize_name_lookup(&group.name).contains(needle)
        || group
            .members
            .iter()
            .any(|member| normalize_name_lookup(member).contains(needle))
}

pub fn my_groups(groups: &[SchoolGroup]) -> Vec<SchoolGroup> {
    groups.iter().filter(|group| group.is_mine).cloned().collect()
}

pub fn online_count(students: &[Student]) -> usize {
    students.iter().filter(|student| student.is_online).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GroupTypeFilter, SchoolGroupType};
    use chrono::{Duration, TimeZone};

    fn student(first: &str, last: &str, tasks: u32, online: bool) -> Student {
        Student {
            id: format!("{}-{}", first.to_lowercase(), last.to_lowercase()),
            first_name: first.to_string(),
            last_name: last.to_string(),
            initials: String::new(),
            group_ids: Vec::new(),
            status: String::new(),
            is_online: online,
            lessons_complete: 0,
            help_requests: 0,
            submissions: 0,
            tasks,
            last_submission_at: None,
            last_help_request_at: None,
        }
    }

    fn in_groups(mut student: Student, groups: &[&str]) -> Student {
        student.group_ids = groups.iter().map(|id| id.to_string()).collect();
        student
    }

    fn submitted(mut student: Student, days_ago: i64) -> Student {
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        student.last_submission_at = Some(base - Duration::days(days_ago));
        student
    }

    fn sample() -> Vec<Student> {
        vec![
            student("Amy", "Lee", 3, true),
            student("Bob", "Ng", 7, false),
            student("Cam", "Oz", 1, true),
        ]
    }

    fn first_names(students: &[Student]) -> Vec<&str> {
        students.iter().map(|s| s.first_name.as_str()).collect()
    }

    fn group(name: &str, group_type: SchoolGroupType, members: &[&str]) -> SchoolGroup {
        SchoolGroup {
            id: name.to_lowercase().replace(' ', "-"),
            name: name.to_string(),
            group_type,
            student_count: members.len() as u32 + 3,
            members: members.iter().map(|m| m.to_string()).collect(),
            is_mine: false,
        }
    }

    #[test]
    fn default_state_keeps_everything() {
        let students = sample();
        let result = apply_student_filters(&students, &FilterState::default(), SortSurface::Standard);
        assert_eq!(result, students);
    }

    #[test]
    fn sorts_by_tasks_high() {
        let state = FilterState::default().with_sort(SortOption::TasksHigh);
        let result = apply_student_filters(&sample(), &state, SortSurface::Standard);
        assert_eq!(first_names(&result), vec!["Bob", "Amy", "Cam"]);
    }

    #[test]
    fn search_keeps_matches_in_order() {
        let state = FilterState::default().with_search("o");
        let result = apply_student_filters(&sample(), &state, SortSurface::Standard);
        assert_eq!(first_names(&result), vec!["Bob", "Cam"]);
    }

    #[test]
    fn search_is_case_insensitive_substring_of_full_name() {
        let students = vec![student("Jane", "Doe", 0, false)];
        for query in ["jane", "DOE", "ane do", "e d"] {
            let state = FilterState::default().with_search(query);
            assert_eq!(
                apply_student_filters(&students, &state, SortSurface::Standard).len(),
                1,
                "{query}"
            );
        }
        let state = FilterState::default().with_search("janed");
        assert!(apply_student_filters(&students, &state, SortSurface::Standard).is_empty());
    }

    #[test]
    fn trailing_space_in_search_is_significant() {
        let students = vec![student("Amy", "Lee", 0, true), student("Amya", "Ray", 0, true)];

        let state = FilterState::default().with_search("amy ");
        let result = apply_student_filters(&students, &state, SortSurface::Standard);
        assert_eq!(first_names(&result), vec!["Amy"]);

        let state = FilterState::default().with_search("amy");
        let result = apply_student_filters(&students, &state, SortSurface::Standard);
        assert_eq!(first_names(&result), vec!["Amy", "Amya"]);
    }

    #[test]
    fn search_matches_decomposed_accents() {
        let students = vec![student("Jose\u{301}", "Diaz", 0, true), student("Josef", "Kim", 0, true)];

        let state = FilterState::default().with_search("josé");
        let result = apply_student_filters(&students, &state, SortSurface::Standard);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].last_name, "Diaz");

        let state = FilterState::default().with_search("JOSÉ D");
        assert_eq!(
            apply_student_filters(&students, &state, SortSurface::Standard).len(),
            1
        );
    }

    #[test]
    fn accented_names_sort_by_base_letter() {
        let students = vec![
            student("Zoe", "Ng", 0, true),
            student("Émile", "Roy", 0, true),
            student("José", "Diaz", 0, true),
        ];
        let state = FilterState::default();
        let result = apply_student_filters(&students, &state, SortSurface::Standard);
        assert_eq!(first_names(&result), vec!["Émile", "José", "Zoe"]);

        let state = state.with_sort(SortOption::NameDesc);
        let result = apply_student_filters(&students, &state, SortSurface::Standard);
        assert_eq!(first_names(&result), vec!["Zoe", "José", "Émile"]);
    }

    #[test]
    fn compare_names_is_total_across_accents_and_case() {
        assert_eq!(compare_names("Emile", "Émile"), Ordering::Less);
        assert_eq!(compare_names("émile", "Émile"), Ordering::Less);
        assert_ne!(compare_names("Jose\u{301}", "José"), Ordering::Equal);
        assert_eq!(compare_names("José", "José"), Ordering::Equal);
    }

    #[test]
    fn group_search_keeps_trailing_space() {
        let groups = vec![
            group("Art Studio", SchoolGroupType::Studio, &[]),
            group("Artisans", SchoolGroupType::Studio, &[]),
        ];
        let state = GroupFilterState::default().with_search("art ");
        let result = apply_group_filters(&groups, &state);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "Art Studio");
    }

    #[test]
    fn whitespace_search_is_a_no_op() {
        let state = FilterState::default().with_search("   ");
        assert_eq!(
            apply_student_filters(&sample(), &state, SortSurface::Standard).len(),
            3
        );
    }

    #[test]
    fn group_filter_uses_any_match() {
        let students = vec![
            in_groups(student("Amy", "Lee", 0, true), &["a"]),
            in_groups(student("Bob", "Ng", 0, true), &["b"]),
            in_groups(student("Cam", "Oz", 0, true), &["c"]),
            student("Dee", "Ray", 0, true),
        ];
        let state = FilterState::default().with_selected_groups(vec!["a".into(), "b".into()]);
        let result = apply_student_filters(&students, &state, SortSurface::Standard);
        assert_eq!(first_names(&result), vec!["Amy", "Bob"]);
    }

    #[test]
    fn presence_sort_is_stable() {
        let students = vec![
            student("Zed", "One", 0, true),
            student("Abe", "Two", 0, false),
            student("Moe", "Three", 0, true),
        ];
        let state = FilterState::default().with_sort(SortOption::PresentFirst);
        let result = apply_student_filters(&students, &state, SortSurface::Standard);
        assert_eq!(first_names(&result), vec!["Zed", "Moe", "Abe"]);

        let state = state.with_sort(SortOption::AbsentFirst);
        let result = apply_student_filters(&students, &state, SortSurface::Standard);
        assert_eq!(first_names(&result), vec!["Abe", "Zed", "Moe"]);
    }

    #[test]
    fn missing_dates_sink_in_both_directions() {
        let students = vec![
            student("Nil", "First", 0, true),
            submitted(student("Old", "Timer", 0, true), 30),
            student("Nil", "Second", 0, true),
            submitted(student("New", "Comer", 0, true), 1),
        ];

        let recent = FilterState::default().with_sort(SortOption::SubmissionRecent);
        let result = apply_student_filters(&students, &recent, SortSurface::Standard);
        let names: Vec<String> = result.iter().map(Student::full_name).collect();
        assert_eq!(names, vec!["New Comer", "Old Timer", "Nil First", "Nil Second"]);

        let oldest = recent.with_sort(SortOption::SubmissionOldest);
        let result = apply_student_filters(&students, &oldest, SortSurface::Standard);
        let names: Vec<String> = result.iter().map(Student::full_name).collect();
        assert_eq!(names, vec!["Old Timer", "New Comer", "Nil First", "Nil Second"]);
    }

    #[test]
    fn help_recency_uses_help_dates() {
        let mut early = student("Early", "Asker", 0, true);
        early.last_help_request_at = Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).single();
        let mut late = student("Late", "Asker", 0, true);
        late.last_help_request_at = Utc.with_ymd_and_hms(2026, 2, 5, 9, 0, 0).single();
        let students = vec![student("Never", "Asked", 0, true), early, late];

        let state = FilterState::default().with_sort(SortOption::HelpRecent);
        let result = apply_student_filters(&students, &state, SortSurface::Standard);
        assert_eq!(first_names(&result), vec!["Late", "Early", "Never"]);
    }

    #[test]
    fn name_sort_ignores_case() {
        let students = vec![
            student("bea", "Zim", 0, true),
            student("Al", "Young", 0, true),
            student("Cy", "Xu", 0, true),
        ];
        let state = FilterState::default();
        let result = apply_student_filters(&students, &state, SortSurface::Standard);
        assert_eq!(first_names(&result), vec!["Al", "bea", "Cy"]);

        let state = state.with_sort(SortOption::NameDesc);
        let result = apply_student_filters(&students, &state, SortSurface::Standard);
        assert_eq!(first_names(&result), vec!["Cy", "bea", "Al"]);
    }

    #[test]
    fn count_sorts_only_apply_on_extended_surface() {
        let mut students = sample();
        students[0].submissions = 1;
        students[1].submissions = 2;
        students[2].submissions = 9;
        let state = FilterState::default().with_sort(SortOption::SubmissionHigh);

        let standard = apply_student_filters(&students, &state, SortSurface::Standard);
        assert_eq!(first_names(&standard), vec!["Amy", "Bob", "Cam"]);

        let extended = apply_student_filters(&students, &state, SortSurface::Extended);
        assert_eq!(first_names(&extended), vec!["Cam", "Bob", "Amy"]);
    }

    #[test]
    fn group_search_matches_name_or_member() {
        let groups = vec![
            group("Art Studio", SchoolGroupType::Studio, &["Grace Lee"]),
            group("Chess Club", SchoolGroupType::Other, &["Leo Thompson"]),
            group("Debate Team", SchoolGroupType::Anchor, &["Maya Anderson"]),
        ];
        let state = GroupFilterState::default().with_search("LEE");
        let result = apply_group_filters(&groups, &state);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "Art Studio");

        let state = GroupFilterState::default().with_search("club");
        assert_eq!(apply_group_filters(&groups, &state)[0].name, "Chess Club");
    }

    #[test]
    fn group_type_filter_is_exact_and_all_is_no_op() {
        let groups = vec![
            group("Art Studio", SchoolGroupType::Studio, &[]),
            group("Art Flex", SchoolGroupType::Flex, &[]),
            group("Band", SchoolGroupType::Studio, &[]),
        ];
        let all = apply_group_filters(&groups, &GroupFilterState::default());
        assert_eq!(all, groups);

        let studios = GroupFilterState::default()
            .with_group_type(GroupTypeFilter::Only(SchoolGroupType::Studio))
            .with_search("art");
        let result = apply_group_filters(&groups, &studios);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "Art Studio");
    }

    #[test]
    fn my_groups_and_online_count() {
        let mut groups = vec![
            group("Art Studio", SchoolGroupType::Studio, &[]),
            group("Band", SchoolGroupType::Studio, &[]),
        ];
        groups[1].is_mine = true;
        assert_eq!(my_groups(&groups).len(), 1);
        assert_eq!(online_count(&sample()), 2);
    }
}
