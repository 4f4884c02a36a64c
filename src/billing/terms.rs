use chrono::{Days, NaiveDate};

/// Due date for an invoice issued on `issue_date` under net-`due_days` terms.
pub fn due_date_for(issue_date: NaiveDate, due_days: i32) -> NaiveDate {
    let days = Days::new(due_days.max(0) as u64);
    issue_date.checked_add_days(days).unwrap_or(NaiveDate::MAX)
}
