use arboard::Clipboard;
use ratatui::crossterm::event::KeyEvent;
use tracing::{debug, error, info, trace, warn};

use crate::country::{CountryRow, RawCountry, SortField, project_rows};
use crate::domain::{CVConfig, CVError, HELP_TEXT, LOAD_ERROR_TEXT, Message};
use crate::inputter::{InputResult, Inputter};
use crate::view_state::{
    COMPACT_PAGE_SIZE, CountryPage, DEFAULT_PAGE_SIZE, PageChange, SortChange, SortDirection,
    TableChange, ViewState, find_countries,
};

#[derive(Debug, PartialEq)]
pub enum Status {
    LOADING,
    READY,
    FAILED,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    TABLE,
    POPUP,
    CMDINPUT,
}

/// Everything the UI needs for one frame.
#[derive(Debug, Clone, Default)]
pub struct UIData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub selected_row: usize,
    pub selected_column: usize,
    pub page_label: String,
    pub show_popup: bool,
    pub popup_message: String,
    pub cmdinput: InputResult,
    pub active_cmdinput: bool,
    pub filter_text: String,
    pub status_message: String,
}

pub struct Model {
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    rows: Vec<CountryRow>,
    view: ViewState,
    page: CountryPage,
    curser_row: usize,
    curser_column: usize,
    ui_size: (usize, usize),
    uidata: UIData,
    clipboard: Option<Clipboard>,
    input: Inputter,
    active_cmdinput: bool,
    status_message: String,
}

impl Model {
    pub fn init(config: &CVConfig) -> Self {
        let mut view = ViewState::with_page_size(config.page_size);
        view.sort_field = config.sort_field;
        let mut model = Self {
            status: Status::LOADING,
            modus: Modus::TABLE,
            previous_modus: Modus::TABLE,
            rows: Vec::new(),
            view,
            page: CountryPage::default(),
            curser_row: 0,
            curser_column: 1,
            ui_size: (0, 0),
            uidata: UIData::default(),
            clipboard: None,
            input: Inputter::default(),
            active_cmdinput: false,
            status_message: String::new(),
        };
        model.set_status_message(format!("Querying {} ...", config.endpoint));
        model.refresh();
        model
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    #[cfg(test)]
    pub fn view_state(&self) -> &ViewState {
        &self.view
    }

    #[cfg(test)]
    pub fn page(&self) -> &CountryPage {
        &self.page
    }

    pub fn raw_keyevents(&self) -> bool {
        self.active_cmdinput
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    pub fn update(&mut self, message: Option<Message>) -> Result<(), CVError> {
        let Some(msg) = message else {
            return Ok(());
        };

        if let Message::Loaded(result) = msg {
            self.load(result);
            return Ok(());
        }

        match self.modus {
            Modus::TABLE => match msg {
                Message::Quit => self.quit(),
                Message::MoveUp => self.move_selection_up(),
                Message::MoveDown => self.move_selection_down(),
                Message::MoveLeft => self.move_column(-1),
                Message::MoveRight => self.move_column(1),
                Message::NextPage => self.goto_page(self.view.page_index.saturating_add(1)),
                Message::PreviousPage => self.goto_page(self.view.page_index.saturating_sub(1)),
                Message::FirstPage => self.goto_page(0),
                Message::LastPage => self.goto_page(usize::MAX),
                Message::ToggleSort => self.toggle_sort(),
                Message::SortAscending => self.sort_current_column(SortDirection::Asc),
                Message::SortDescending => self.sort_current_column(SortDirection::Desc),
                Message::TogglePageSize => self.toggle_page_size(),
                Message::Search => self.enter_search(),
                Message::CopyCell => self.copy_cell(),
                Message::CopyRow => self.copy_row(),
                Message::Help => self.show_help(),
                Message::Exit => self.exit(),
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => (),
            },
            Modus::POPUP => match msg {
                Message::Quit => self.quit(),
                Message::Exit | Message::Help => self.exit(),
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => (),
            },
            Modus::CMDINPUT => match msg {
                Message::RawKey(key) => self.raw_input(key),
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => (),
            },
        }
        Ok(())
    }

    fn load(&mut self, result: Result<Vec<RawCountry>, String>) {
        match result {
            Ok(countries) => {
                self.rows = project_rows(Some(countries.as_slice()));
                self.status = Status::READY;
                info!("Loaded {} countries", self.rows.len());
                self.set_status_message(format!("Loaded {} countries", self.rows.len()));
            }
            Err(e) => {
                self.rows = project_rows(None);
                self.status = Status::FAILED;
                error!("Loading countries failed: {e}");
                self.set_status_message(format!("{LOAD_ERROR_TEXT} {e}"));
            }
        }
        self.refresh();
    }

    // Recompute the visible page from rows and view state
    fn refresh(&mut self) {
        self.page = find_countries(&self.rows, &self.view);
        self.curser_row = self
            .curser_row
            .min(self.page.visible_rows.len().saturating_sub(1));
        self.update_uidata();
    }

    fn update_uidata(&mut self) {
        let headers = SortField::ALL
            .iter()
            .map(|field| match self.view.sort_field {
                Some(sorted) if sorted == *field => {
                    format!("{} {}", field.title(), self.view.sort_direction.arrow())
                }
                _ => field.title().to_string(),
            })
            .collect();

        let rows = self
            .page
            .visible_rows
            .iter()
            .map(|row| {
                SortField::ALL
                    .iter()
                    .map(|&field| row.field(field).unwrap_or_default().to_string())
                    .collect()
            })
            .collect();

        let page_label = if self.status == Status::READY {
            format!(
                "Page {}/{} · {} of {} countries · {} per page",
                self.view.page_index + 1,
                self.view.page_count(self.page.total_matching_count),
                self.page.total_matching_count,
                self.rows.len(),
                self.view.page_size,
            )
        } else {
            String::new()
        };

        self.uidata = UIData {
            headers,
            rows,
            selected_row: self.curser_row,
            selected_column: self.curser_column,
            page_label,
            show_popup: self.modus == Modus::POPUP,
            popup_message: self.uidata.popup_message.clone(),
            cmdinput: self.input.get(),
            active_cmdinput: self.active_cmdinput,
            filter_text: self.view.filter_text.clone(),
            status_message: self.status_message.clone(),
        };
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.uidata.status_message = self.status_message.clone();
    }

    fn ui_resize(&mut self, width: usize, height: usize) {
        trace!(
            "UI was resized! w:{}->{}, h:{}->{}",
            self.ui_size.0, width, self.ui_size.1, height
        );
        self.ui_size = (width, height);
        self.update_uidata();
    }

    // -------------------- Control handling functions ---------------------- //

    fn last_page(&self) -> usize {
        self.view.page_count(self.page.total_matching_count) - 1
    }

    fn goto_page(&mut self, index: usize) {
        let index = index.min(self.last_page());
        if index == self.view.page_index {
            return;
        }
        self.view.on_table_change(TableChange {
            page: Some(PageChange {
                index,
                size: self.view.page_size,
            }),
            sort: None,
        });
        self.curser_row = 0;
        self.refresh();
    }

    fn toggle_page_size(&mut self) {
        let size = if self.view.page_size == COMPACT_PAGE_SIZE {
            DEFAULT_PAGE_SIZE
        } else {
            COMPACT_PAGE_SIZE
        };
        // Keep the first row of the current page visible
        let first_row = self.view.page_index * self.view.page_size;
        self.view.on_table_change(TableChange {
            page: Some(PageChange {
                index: first_row / size,
                size,
            }),
            sort: None,
        });
        self.curser_row = 0;
        self.set_status_message(format!("Showing {size} countries per page"));
        self.refresh();
    }

    fn move_selection_up(&mut self) {
        if self.curser_row > 0 {
            self.curser_row -= 1;
            self.update_uidata();
        } else if self.view.page_index > 0 {
            self.goto_page(self.view.page_index - 1);
            self.curser_row = self.page.visible_rows.len().saturating_sub(1);
            self.update_uidata();
        }
    }

    fn move_selection_down(&mut self) {
        if self.curser_row + 1 < self.page.visible_rows.len() {
            self.curser_row += 1;
            self.update_uidata();
        } else if self.view.page_index < self.last_page() {
            self.goto_page(self.view.page_index + 1);
        }
    }

    fn move_column(&mut self, step: isize) {
        let last = SortField::ALL.len() - 1;
        self.curser_column = self.curser_column.saturating_add_signed(step).min(last);
        self.update_uidata();
    }

    fn current_field(&self) -> SortField {
        SortField::ALL[self.curser_column]
    }

    fn apply_sort(&mut self, field: SortField, direction: SortDirection) {
        if !field.sortable() {
            self.set_status_message(format!("Column {} is not sortable", field.title()));
            return;
        }
        self.view.on_table_change(TableChange {
            page: None,
            sort: Some(SortChange {
                field: Some(field),
                direction,
            }),
        });
        debug!("Sorting by {} {:?}", field.key(), direction);
        self.set_status_message(format!("Sorted by {} {}", field.title(), direction.arrow()));
        self.refresh();
    }

    fn toggle_sort(&mut self) {
        let field = self.current_field();
        let direction = if self.view.sort_field == Some(field) {
            self.view.sort_direction.toggled()
        } else {
            SortDirection::Asc
        };
        self.apply_sort(field, direction);
    }

    fn sort_current_column(&mut self, direction: SortDirection) {
        self.apply_sort(self.current_field(), direction);
    }

    fn enter_search(&mut self) {
        trace!("Entering search mode ...");
        self.previous_modus = self.modus;
        self.modus = Modus::CMDINPUT;
        self.active_cmdinput = true;
        self.input.start(&self.view.filter_text);
        self.update_uidata();
    }

    fn raw_input(&mut self, key: KeyEvent) {
        if !self.active_cmdinput {
            return;
        }
        let result = self.input.read(key);
        if result.edited {
            self.view.on_search_input(&result.input);
            self.curser_row = 0;
        }
        if result.finished {
            self.active_cmdinput = false;
            self.modus = self.previous_modus;
            self.previous_modus = Modus::CMDINPUT;
            if result.canceled {
                self.set_status_message("Search cleared");
            }
        }
        self.refresh();
        if result.finished && !result.canceled {
            let found = self.page.total_matching_count;
            self.set_status_message(format!("Found {found} matches for \"{}\"", result.input));
        }
    }

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::POPUP;
        self.uidata.popup_message = HELP_TEXT.to_string();
        self.update_uidata();
    }

    fn exit(&mut self) {
        match self.modus {
            Modus::POPUP => {
                trace!("Close popup ...");
                self.modus = self.previous_modus;
                self.previous_modus = Modus::POPUP;
                self.update_uidata();
            }
            Modus::TABLE => {
                if !self.view.filter_text.is_empty() {
                    self.view.on_search_input("");
                    self.set_status_message("Search cleared");
                    self.refresh();
                }
            }
            Modus::CMDINPUT => {}
        }
    }

    fn selected_row(&self) -> Option<&CountryRow> {
        self.page.visible_rows.get(self.curser_row)
    }

    fn copy_cell(&mut self) {
        let Some(row) = self.selected_row() else {
            return;
        };
        let cell = row.field(self.current_field()).unwrap_or_default().to_string();
        trace!("Cell content: {}", cell);
        self.copy_text(cell);
    }

    fn copy_row(&mut self) {
        let Some(row) = self.selected_row() else {
            return;
        };
        let content = row_as_csv(row);
        self.copy_text(content);
    }

    fn copy_text(&mut self, text: String) {
        if self.clipboard.is_none() {
            match Clipboard::new() {
                Ok(clipboard) => self.clipboard = Some(clipboard),
                Err(e) => {
                    warn!("No clipboard available: {:?}", e);
                    self.set_status_message("No clipboard available");
                    return;
                }
            }
        }
        if let Some(clipboard) = self.clipboard.as_mut() {
            match clipboard.set_text(text) {
                Ok(_) => {
                    trace!("Copied content to clipboard.");
                    self.set_status_message("Copied to clipboard");
                }
                Err(e) => {
                    warn!("Error copying to clipboard: {:?}", e);
                    self.set_status_message("Copy failed");
                }
            }
        }
    }
}

fn wrap_cell_content(c: &str) -> String {
    let needs_escaping = c.contains('"');
    let needs_wrapping = needs_escaping || c.chars().any(|c| c == ' ' || c == '\t' || c == ',');
    let mut out = String::from(c);

    if needs_escaping {
        out = out.replace('"', "\"\"");
    }
    if needs_wrapping {
        out = format!("\"{out}\"");
    }
    out
}

fn row_as_csv(row: &CountryRow) -> String {
    SortField::ALL
        .iter()
        .map(|&field| wrap_cell_content(row.field(field).unwrap_or_default()))
        .collect::<Vec<String>>()
        .join(",")
}
