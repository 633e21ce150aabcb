use chrono::{NaiveDate, NaiveDateTime};
use yew::services::ConsoleService;

use super::model::{Task, TaskStatus, DATE_FORMAT};

pub fn log_error_to_js(e: &impl std::fmt::Display) {
    ConsoleService::error(format!("{}", e).as_str());
}

/// Title rule shared by create and edit: required after trimming, at most
/// 100 characters.
pub fn validate_title(title: &str) -> Result<(), String> {
    let trimmed = title.trim();

    if trimmed.is_empty() {
        Err("Title is required".to_string())
    } else if trimmed.chars().count() > 100 {
        Err("Title cannot be more than 100 characters".to_string())
    } else {
        Ok(())
    }
}

/// Parses the backend date pattern, tolerating the seconds the
/// `datetime-local` input sometimes appends.
pub fn parse_due_date(value: &str) -> Result<NaiveDateTime, String> {
    if value.is_empty() {
        return Err("Due date is required".to_string());
    }

    NaiveDateTime::parse_from_str(value, DATE_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| "Please enter a valid date".to_string())
}

/// Relative due-date label at day granularity: time of day is truncated on
/// both sides before subtracting.
pub fn due_date_label(due: NaiveDateTime, today: NaiveDate) -> String {
    let days = due.date().signed_duration_since(today).num_days();

    if days == 0 {
        "Due today".to_string()
    } else if days < 0 {
        let overdue = -days;
        if overdue == 1 {
            "Overdue by 1 day".to_string()
        } else {
            format!("Overdue by {} days", overdue)
        }
    } else if days == 1 {
        "1 day remaining".to_string()
    } else {
        format!("{} days remaining", days)
    }
}

/// Human-readable form of a wire date for the task cards; falls back to the
/// raw string when the backend sends something unparseable.
pub fn format_display_date(value: &str) -> String {
    match parse_due_date(value) {
        Ok(date) => date.format("%-d %B %Y, %H:%M").to_string(),
        Err(_) => value.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    Status(TaskStatus),
}

impl StatusFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Status(status) => task.status == status,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Status(status) => status.label(),
        }
    }

    /// Wording for the empty state under this filter.
    pub fn empty_message(self) -> String {
        match self {
            StatusFilter::All => "Get started by adding a new task.".to_string(),
            StatusFilter::Status(status) => {
                format!(
                    "No {} tasks found.",
                    status.as_str().to_lowercase().replace('_', " ")
                )
            }
        }
    }
}

pub fn filter_tasks<'a>(tasks: &'a [Task], filter: StatusFilter) -> Vec<&'a Task> {
    tasks.iter().filter(|task| filter.matches(task)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::model::TaskId;
    use chrono::NaiveDate;

    fn task(id: TaskId, status: TaskStatus) -> Task {
        Task {
            id,
            title: format!("Task {}", id),
            description: None,
            status,
            due_date: "2026-09-01T09:00".to_string(),
            created_at: "2026-08-20T10:15".to_string(),
            updated_at: "2026-08-20T10:15".to_string(),
        }
    }

    #[test]
    fn empty_and_oversized_titles_are_rejected() {
        assert!(validate_title("Write report").is_ok());
        assert_eq!(validate_title("   ").unwrap_err(), "Title is required");
        assert_eq!(validate_title("").unwrap_err(), "Title is required");

        let long = "x".repeat(101);
        assert_eq!(
            validate_title(&long).unwrap_err(),
            "Title cannot be more than 100 characters"
        );
        assert!(validate_title(&"x".repeat(100)).is_ok());
    }

    #[test]
    fn due_dates_parse_in_the_wire_pattern() {
        assert!(parse_due_date("2026-09-01T09:00").is_ok());
        assert!(parse_due_date("2026-09-01T09:00:30").is_ok());
        assert_eq!(parse_due_date("").unwrap_err(), "Due date is required");
        assert_eq!(
            parse_due_date("tomorrow").unwrap_err(),
            "Please enter a valid date"
        );
        assert!(parse_due_date("2026-02-30T09:00").is_err());
    }

    #[test]
    fn due_label_boundaries() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        let at = |date: NaiveDate, hour: u32| date.and_hms_opt(hour, 0, 0).unwrap();

        // Any time of day on the due date counts as today.
        assert_eq!(due_date_label(at(today, 0), today), "Due today");
        assert_eq!(due_date_label(at(today, 23), today), "Due today");

        let yesterday = today.pred_opt().unwrap();
        assert_eq!(due_date_label(at(yesterday, 12), today), "Overdue by 1 day");

        let last_week = today - chrono::Duration::days(7);
        assert_eq!(due_date_label(at(last_week, 12), today), "Overdue by 7 days");

        let tomorrow = today.succ_opt().unwrap();
        assert_eq!(due_date_label(at(tomorrow, 1), today), "1 day remaining");

        let in_two_days = today + chrono::Duration::days(2);
        assert_eq!(due_date_label(at(in_two_days, 23), today), "2 days remaining");
    }

    #[test]
    fn filtering_is_pure_and_local() {
        let tasks = vec![
            task(1, TaskStatus::Todo),
            task(2, TaskStatus::Todo),
            task(3, TaskStatus::InProgress),
            task(4, TaskStatus::Todo),
            task(5, TaskStatus::InProgress),
            task(6, TaskStatus::Completed),
        ];

        assert_eq!(filter_tasks(&tasks, StatusFilter::All).len(), 6);
        assert_eq!(
            filter_tasks(&tasks, StatusFilter::Status(TaskStatus::Todo)).len(),
            3
        );
        assert_eq!(
            filter_tasks(&tasks, StatusFilter::Status(TaskStatus::Completed)).len(),
            1
        );
    }

    #[test]
    fn empty_messages_reference_the_active_filter() {
        assert_eq!(
            StatusFilter::Status(TaskStatus::InProgress).empty_message(),
            "No in progress tasks found."
        );
        assert_eq!(
            StatusFilter::All.empty_message(),
            "Get started by adding a new task."
        );
    }
}
