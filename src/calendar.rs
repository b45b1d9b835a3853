use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use chrono::{Datelike, Duration, NaiveDate};
use crate::clock::{Clock, SystemClock};
use crate::error::{Result, TaskError};
use crate::models::Task;
use crate::store::TaskStore;

/// Cells in a month view: six weeks of seven days.
pub const GRID_CELLS: usize = 42;

/// Tasks due on `date`, in store order.
pub fn tasks_on_date(tasks: &[Task], date: NaiveDate) -> Vec<Task> {
    tasks
        .iter()
        .filter(|t| t.due_date == Some(date))
        .cloned()
        .collect()
}

/// Distinct due dates among `tasks`. Tasks without a due date are skipped.
pub fn dates_with_tasks(tasks: &[Task]) -> BTreeSet<NaiveDate> {
    tasks.iter().filter_map(|t| t.due_date).collect()
}

/// A calendar month, validated on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(TaskError::Validation(format!("invalid month {}-{:02}", year, month)));
        }
        Ok(YearMonth { year, month })
    }

    /// The month `date` falls in.
    pub fn of(date: NaiveDate) -> Self {
        YearMonth { year: date.year(), month: date.month() }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn num_days(&self) -> u32 {
        let next = self.next().first_day();
        (next - self.first_day()).num_days() as u32
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            YearMonth { year: self.year + 1, month: 1 }
        } else {
            YearMonth { year: self.year, month: self.month + 1 }
        }
    }

    pub fn prev(&self) -> Self {
        if self.month == 1 {
            YearMonth { year: self.year - 1, month: 12 }
        } else {
            YearMonth { year: self.year, month: self.month - 1 }
        }
    }

    /// Month name and year, e.g. "February 2024".
    pub fn title(&self) -> String {
        self.first_day().format("%B %Y").to_string()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = TaskError;

    /// Parses `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || TaskError::Validation(format!("invalid month '{}', use YYYY-MM", s));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        YearMonth::new(year, month)
    }
}

/// One cell of the month grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCell {
    pub date: NaiveDate,
    /// False for padding days from the neighbouring months.
    pub in_month: bool,
    pub is_today: bool,
    pub is_selected: bool,
    pub has_tasks: bool,
}

/// Builds the 42-cell view of `month`, weeks starting on Sunday.
///
/// Padding cells from the previous and next month never carry flags.
pub fn month_grid(
    month: YearMonth,
    selected: Option<NaiveDate>,
    today: NaiveDate,
    dates: &BTreeSet<NaiveDate>,
) -> Vec<DayCell> {
    let first = month.first_day();
    let leading = first.weekday().num_days_from_sunday() as i64;
    let start = first - Duration::days(leading);

    (0..GRID_CELLS as i64)
        .map(|i| {
            let date = start + Duration::days(i);
            let in_month = month.contains(date);
            DayCell {
                date,
                in_month,
                is_today: in_month && date == today,
                is_selected: in_month && selected == Some(date),
                has_tasks: in_month && dates.contains(&date),
            }
        })
        .collect()
}

/// Date queries answered from a fresh read of the task store.
///
/// Nothing is indexed ahead of time. When the store cannot be read the last
/// successful read is used instead.
pub struct Calendar<S> {
    store: S,
    clock: Arc<dyn Clock>,
    last_known: Vec<Task>,
}

impl<S: TaskStore> Calendar<S> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: S, clock: Arc<dyn Clock>) -> Self {
        Calendar { store, clock, last_known: Vec::new() }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    async fn snapshot(&mut self) -> &[Task] {
        match self.store.list().await {
            Ok(tasks) => self.last_known = tasks,
            Err(e) => tracing::warn!(error = %e, "calendar using last known tasks"),
        }
        &self.last_known
    }

    pub async fn tasks_on_date(&mut self, date: NaiveDate) -> Vec<Task> {
        tasks_on_date(self.snapshot().await, date)
    }

    pub async fn dates_with_tasks(&mut self) -> BTreeSet<NaiveDate> {
        dates_with_tasks(self.snapshot().await)
    }

    pub async fn month_grid(&mut self, month: YearMonth, selected: Option<NaiveDate>) -> Vec<DayCell> {
        let today = self.today();
        let dates = self.dates_with_tasks().await;
        month_grid(month, selected, today, &dates)
    }
}
