use std::fmt::Write;

use crate::controller::{ActiveFilter, GroupFilters, StudentFilters};
use crate::directory::GroupDirectory;
use crate::models::{SchoolGroup, SortOption, SortSurface, Student};

const MEMBER_PREVIEW_LEN: usize = 4;
const PLACEHOLDER: &str = "-";

fn count_or_dash(value: u32) -> String {
    if value == 0 {
        PLACEHOLDER.to_string()
    } else {
        value.to_string()
    }
}

fn chips_line(chips: &[ActiveFilter]) -> Option<String> {
    if chips.is_empty() {
        return None;
    }
    let labels: Vec<String> = chips.iter().map(ToString::to_string).collect();
    Some(format!("Active Filters: {}", labels.join(" | ")))
}

pub fn student_row(student: &Student, directory: &GroupDirectory) -> String {
    let presence = if student.is_online { "●" } else { "○" };
    let groups: Vec<&str> = student
        .group_ids
        .iter()
        .map(|id| directory.display_name(id))
        .collect();
    let groups = if groups.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        groups.join(", ")
    };
    let status = if student.status.trim().is_empty() {
        PLACEHOLDER
    } else {
        student.status.as_str()
    };

    format!(
        "{} [{}] {} | groups: {} | status: {} | lessons: {} | help: {} | submissions: {} | tasks: {}",
        presence,
        student.display_initials(),
        student.full_name().to_uppercase(),
        groups,
        status,
        count_or_dash(student.lessons_complete),
        count_or_dash(student.help_requests),
        count_or_dash(student.submissions),
        count_or_dash(student.tasks),
    )
}

pub fn build_student_report(filters: &StudentFilters) -> String {
    let mut output = String::new();

    let _ = writeln!(
        output,
        "Students ({}) - In Attendance: {}",
        filters.total_count(),
        filters.online_count()
    );

    if let Some(line) = chips_line(&filters.active_filters()) {
        let _ = writeln!(output, "{line}");
    }
    let _ = writeln!(output);

    let students = filters.filtered();
    if students.is_empty() {
        let _ = writeln!(output, "No students found");
        let _ = writeln!(
            output,
            "Try adjusting your search or filters to find the students you're looking for."
        );
        return output;
    }

    let _ = writeln!(
        output,
        "Showing {} of {} students",
        students.len(),
        filters.total_count()
    );
    for student in students {
        let _ = writeln!(output, "{}", student_row(student, filters.directory()));
    }

    output
}

/// Member names from the preview plus `,+N more` when the group is larger than the preview.
pub fn member_preview(group: &SchoolGroup) -> String {
    let shown: Vec<&str> = group
        .members
        .iter()
        .take(MEMBER_PREVIEW_LEN)
        .map(String::as_str)
        .collect();
    let remaining = (group.student_count as usize).saturating_sub(shown.len());
    let mut preview = shown.join(", ");
    if remaining > 0 {
        let _ = write!(preview, ",+{remaining} more");
    }
    preview
}

pub fn group_row(group: &SchoolGroup) -> String {
    format!(
        "{} | {} | {} | {} Students",
        group.name.to_uppercase(),
        member_preview(group),
        group.group_type.label(),
        group.student_count
    )
}

pub fn build_group_report(filters: &GroupFilters, mine_only: bool) -> String {
    let mut output = String::new();

    if mine_only {
        let groups = filters.my_groups();
        let _ = writeln!(output, "My Groups: {} Groups", groups.len());
        for group in &groups {
            let _ = writeln!(output, "{}", group_row(group));
        }
        return output;
    }

    if let Some(line) = chips_line(&filters.active_filters()) {
        let _ = writeln!(output, "{line}");
    }

    let groups = filters.filtered();
    let _ = writeln!(output, "{} Groups", groups.len());

    if groups.is_empty() {
        let _ = writeln!(output, "No groups match your search or filter criteria");
    } else {
        for group in groups {
            let _ = writeln!(output, "{}", group_row(group));
        }
    }

    output
}

pub fn build_group_options(directory: &GroupDirectory, query: &str) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Filter by Groups");

    let sections = directory.option_sections(query);
    if sections.is_empty() {
        let _ = writeln!(output, "No groups match \"{query}\"");
        return output;
    }

    for (kind, groups) in sections {
        let _ = writeln!(output);
        let _ = writeln!(output, "{}", kind.section_title().to_uppercase());
        for group in groups {
            let _ = writeln!(output, "  {:<24} {}", group.name, group.id);
        }
    }

    output
}

pub fn build_sort_menu(surface: SortSurface, current: SortOption) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Sort Students By");

    for (title, options) in surface.sections() {
        let _ = writeln!(output);
        let _ = writeln!(output, "{}", title.to_uppercase());
        for option in options {
            let marker = if option == current { "✓" } else { " " };
            let _ = writeln!(output, "  {marker} {:<12} {}", option.menu_label(), option);
        }
    }

    output
}
