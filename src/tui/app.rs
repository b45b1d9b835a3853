use chrono::{Datelike, Duration, NaiveDate};
use ratatui::widgets::TableState;
use crate::calendar::{Calendar, DayCell, YearMonth};
use crate::commands::{cmd_add, cmd_edit, cmd_toggle, parse_date};
use crate::models::{RecycledTask, Task, TaskFilter, TaskId};
use crate::recycle_bin::RecycleBinManager;
use crate::store::TaskStore;

#[derive(PartialEq)]
pub enum InputMode {
    Normal,
    Editing,
    Adding,
    Confirm,
}

#[derive(PartialEq, Clone, Copy)]
pub enum ViewMode {
    Tasks,
    Calendar,
    Bin,
}

pub enum InputField {
    None,
    Title,
    Description,
    Due,
    Category,
}

/// Destructive action waiting for a yes/no answer.
#[derive(Clone, PartialEq, Debug)]
pub enum PendingAction {
    Recycle(TaskId),
    Purge(RecycledTask),
    Empty,
}

/// State for the multi-step "Add Task" wizard.
#[derive(Default)]
pub struct AddState {
    pub title: String,
    pub description: Option<String>,
    pub due: Option<String>,
    pub step: usize, // 0: Title, 1: Description, 2: Due, 3: Category
}

pub struct App<S> {
    pub manager: RecycleBinManager<S>,
    pub calendar: Calendar<S>,
    pub tasks: Vec<Task>,
    pub state: TableState,
    pub bin: Vec<RecycledTask>,
    pub bin_state: TableState,
    pub filter: TaskFilter,
    pub categories: Vec<String>,
    pub month: YearMonth,
    pub selected_date: NaiveDate,
    pub grid: Vec<DayCell>,
    pub day_tasks: Vec<Task>,
    pub view_mode: ViewMode,
    pub input_mode: InputMode,
    pub input_field: InputField,
    pub input_buffer: String,
    pub target_id: Option<TaskId>,
    pub add_state: AddState,
    pub pending: Option<PendingAction>,
    /// One-line notice shown under the current view.
    pub status: Option<String>,
}

impl<S: TaskStore> App<S> {
    /// Creates a new App instance and loads initial data.
    pub async fn new(manager: RecycleBinManager<S>, calendar: Calendar<S>) -> App<S> {
        let today = calendar.today();
        let mut app = App {
            manager,
            calendar,
            tasks: Vec::new(),
            state: TableState::default(),
            bin: Vec::new(),
            bin_state: TableState::default(),
            filter: TaskFilter::default(),
            categories: Vec::new(),
            month: YearMonth::of(today),
            selected_date: today,
            grid: Vec::new(),
            day_tasks: Vec::new(),
            view_mode: ViewMode::Tasks,
            input_mode: InputMode::Normal,
            input_field: InputField::None,
            input_buffer: String::new(),
            target_id: None,
            add_state: AddState::default(),
            pending: None,
            status: None,
        };
        app.reload().await;
        app
    }

    /// Re-reads tasks, the calendar and the bin and fixes up selections.
    pub async fn reload(&mut self) {
        let all = self.manager.active_tasks().await;

        let mut categories: Vec<String> = all.iter().map(|t| t.category.clone()).collect();
        categories.sort();
        categories.dedup();
        self.categories = categories;

        self.tasks = self.filter.apply(all);
        clamp_selection(&mut self.state, self.tasks.len());

        self.grid = self.calendar.month_grid(self.month, Some(self.selected_date)).await;
        self.day_tasks = self.calendar.tasks_on_date(self.selected_date).await;

        self.bin = self.manager.list().to_vec();
        clamp_selection(&mut self.bin_state, self.bin.len());
    }

    /// Selects the next row in the current list.
    pub fn next(&mut self) {
        let (state, len) = match self.view_mode {
            ViewMode::Tasks => (&mut self.state, self.tasks.len()),
            ViewMode::Bin => (&mut self.bin_state, self.bin.len()),
            ViewMode::Calendar => return,
        };
        if len == 0 { return; }
        let i = match state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        state.select(Some(i));
    }

    /// Selects the previous row in the current list.
    pub fn previous(&mut self) {
        let (state, len) = match self.view_mode {
            ViewMode::Tasks => (&mut self.state, self.tasks.len()),
            ViewMode::Bin => (&mut self.bin_state, self.bin.len()),
            ViewMode::Calendar => return,
        };
        if len == 0 { return; }
        let i = match state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        state.select(Some(i));
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.state.selected().and_then(|i| self.tasks.get(i))
    }

    pub fn selected_bin_entry(&self) -> Option<&RecycledTask> {
        self.bin_state.selected().and_then(|i| self.bin.get(i))
    }

    /// Cycles Tasks -> Calendar -> Bin. Opening the bin purges expired entries.
    pub async fn cycle_view(&mut self) {
        self.view_mode = match self.view_mode {
            ViewMode::Tasks => ViewMode::Calendar,
            ViewMode::Calendar => ViewMode::Bin,
            ViewMode::Bin => ViewMode::Tasks,
        };
        self.status = None;
        if self.view_mode == ViewMode::Bin {
            self.manager.open_bin().await;
        }
        self.reload().await;
    }

    /// Flips completion of the selected task.
    pub async fn toggle_selected(&mut self) {
        if self.view_mode != ViewMode::Tasks { return; }
        if let Some(id) = self.selected_task().map(|t| t.id) {
            cmd_toggle(self.manager.store(), id, true).await;
            self.reload().await;
        }
    }

    pub async fn cycle_status_filter(&mut self) {
        self.filter.status = self.filter.status.next();
        self.reload().await;
    }

    /// Steps through the known categories, then back to "any".
    pub async fn cycle_category_filter(&mut self) {
        self.filter.category = match &self.filter.category {
            None => self.categories.first().cloned(),
            Some(current) => {
                let pos = self.categories.iter().position(|c| c == current);
                pos.and_then(|p| self.categories.get(p + 1)).cloned()
            }
        };
        self.reload().await;
    }

    /// Asks before moving the selected task to the bin.
    pub fn request_recycle(&mut self) {
        if self.view_mode != ViewMode::Tasks { return; }
        if let Some(id) = self.selected_task().map(|t| t.id) {
            self.ask(PendingAction::Recycle(id));
        }
    }

    /// Asks before deleting the selected bin entry for good.
    pub fn request_purge(&mut self) {
        if self.view_mode != ViewMode::Bin { return; }
        if let Some(entry) = self.selected_bin_entry().cloned() {
            self.ask(PendingAction::Purge(entry));
        }
    }

    pub fn request_empty(&mut self) {
        if self.view_mode != ViewMode::Bin || self.bin.is_empty() { return; }
        self.ask(PendingAction::Empty);
    }

    fn ask(&mut self, action: PendingAction) {
        self.pending = Some(action);
        self.input_mode = InputMode::Confirm;
    }

    /// Answers the pending question.
    pub async fn confirm(&mut self, yes: bool) {
        self.input_mode = InputMode::Normal;
        let Some(action) = self.pending.take() else { return };
        if !yes {
            self.status = Some("Cancelled.".to_string());
            return;
        }
        match action {
            PendingAction::Recycle(id) => {
                let remaining = self.manager.recycle(id).await;
                self.status = Some(if self.manager.is_recycled(id, &remaining) {
                    format!("Task {} moved to the recycle bin. It will be kept for 30 days.", id)
                } else {
                    format!("Task {} could not be recycled.", id)
                });
            }
            PendingAction::Purge(entry) => {
                self.manager.permanently_delete_entry(&entry);
                self.status = Some(format!("Task {} permanently deleted.", entry.id()));
            }
            PendingAction::Empty => {
                let removed = self.manager.empty_all();
                self.status = Some(format!("Recycle bin emptied ({} tasks).", removed));
            }
        }
        self.reload().await;
    }

    /// Restores the selected bin entry.
    pub async fn restore_selected(&mut self) {
        if self.view_mode != ViewMode::Bin { return; }
        if let Some(entry) = self.selected_bin_entry().cloned() {
            let id = entry.id();
            let bin = self.manager.restore_entry(&entry).await;
            self.status = Some(if !bin.contains(&entry) {
                format!("Task {} restored.", id)
            } else {
                format!("Task {} could not be restored.", id)
            });
            self.reload().await;
        }
    }

    /// Moves the calendar selection by `days`, following it across months.
    pub async fn move_day(&mut self, days: i64) {
        if self.view_mode != ViewMode::Calendar { return; }
        self.selected_date += Duration::days(days);
        self.month = YearMonth::of(self.selected_date);
        self.reload().await;
    }

    /// Shows the previous or next month, keeping the day of month where possible.
    pub async fn shift_month(&mut self, forward: bool) {
        if self.view_mode != ViewMode::Calendar { return; }
        self.month = if forward { self.month.next() } else { self.month.prev() };
        let day = self.selected_date.day().min(self.month.num_days());
        self.selected_date = self.month.first_day() + Duration::days(day as i64 - 1);
        self.reload().await;
    }

    pub async fn jump_today(&mut self) {
        if self.view_mode != ViewMode::Calendar { return; }
        self.selected_date = self.calendar.today();
        self.month = YearMonth::of(self.selected_date);
        self.reload().await;
    }

    /// Initiates the "Add Task" wizard.
    pub fn start_add(&mut self) {
        if self.view_mode != ViewMode::Tasks { return; }
        self.input_mode = InputMode::Adding;
        self.add_state = AddState::default();
        self.input_buffer.clear();
    }

    /// Initiates editing of a specific field for the selected task.
    pub fn start_edit(&mut self, field: InputField) {
        if self.view_mode != ViewMode::Tasks { return; }
        let Some(t) = self.selected_task() else { return };
        let buffer = match field {
            InputField::Title => t.title.clone(),
            InputField::Description => t.description.clone().unwrap_or_default(),
            InputField::Due => t.due_date.map(|d| d.to_string()).unwrap_or_default(),
            InputField::Category => t.category.clone(),
            InputField::None => String::new(),
        };
        let id = t.id;
        self.target_id = Some(id);
        self.input_buffer = buffer;
        self.input_field = field;
        self.input_mode = InputMode::Editing;
    }

    pub fn cancel_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input_buffer.clear();
    }

    /// Handles text input based on the current mode.
    pub async fn handle_input(&mut self) {
        match self.input_mode {
            InputMode::Adding => self.handle_adding_input().await,
            InputMode::Editing => self.handle_editing_input().await,
            _ => {}
        }
    }

    /// Handles input for the "Add Task" wizard.
    async fn handle_adding_input(&mut self) {
        let value = self.input_buffer.trim().to_string();
        match self.add_state.step {
            0 => { // Title
                if value.is_empty() { return; }
                self.add_state.title = value;
            }
            1 => { // Description
                self.add_state.description = Some(value).filter(|v| !v.is_empty());
            }
            2 => { // Due
                if !value.is_empty() {
                    if parse_date(&value, true).is_none() {
                        self.status = Some(format!("Invalid date '{}'. Use YYYY-MM-DD.", value));
                        return;
                    }
                    self.add_state.due = Some(value);
                }
            }
            3 => { // Category
                let category = Some(value).filter(|v| !v.is_empty());
                cmd_add(
                    self.manager.store(),
                    self.add_state.title.clone(),
                    self.add_state.description.clone(),
                    self.add_state.due.clone(),
                    category,
                    true,
                ).await;
                self.status = None;
                self.input_mode = InputMode::Normal;
                self.input_buffer.clear();
                self.reload().await;
                return;
            }
            _ => return,
        }
        self.status = None;
        self.add_state.step += 1;
        self.input_buffer.clear();
    }

    /// Handles input for the "Edit Task" mode.
    async fn handle_editing_input(&mut self) {
        let Some(id) = self.target_id else { return };
        let value = self.input_buffer.clone();
        let store = self.manager.store();
        match self.input_field {
            InputField::Title => cmd_edit(store, id, Some(value), None, None, None, false, true).await,
            InputField::Description => cmd_edit(store, id, None, Some(value), None, None, false, true).await,
            InputField::Due => {
                if value.trim().is_empty() {
                    cmd_edit(store, id, None, None, None, None, true, true).await;
                } else if parse_date(&value, true).is_some() {
                    cmd_edit(store, id, None, None, Some(value), None, false, true).await;
                } else {
                    self.status = Some(format!("Invalid date '{}'. Use YYYY-MM-DD.", value));
                    return;
                }
            }
            InputField::Category => cmd_edit(store, id, None, None, None, Some(value), false, true).await,
            InputField::None => {}
        }
        self.input_mode = InputMode::Normal;
        self.input_buffer.clear();
        self.reload().await;
    }
}

fn clamp_selection(state: &mut TableState, len: usize) {
    if len == 0 {
        state.select(None);
    } else if let Some(i) = state.selected() {
        if i >= len {
            state.select(Some(len - 1));
        }
    } else {
        state.select(Some(0));
    }
}
