//! Main application logic and TUI event loop.

use std::io;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::Span,
    widgets::{Block, Borders, Paragraph},
    Terminal,
};

use crate::cli::AppConfig;
use crate::data::RawTable;
use crate::error::Error;
use crate::session::Session;
use crate::ui::{
    chart::{ComponentsChart, ForecastChart},
    column_picker::{ColumnPicker, ColumnPickerState},
    form::{ConfigForm, FormOutcome, TextInput},
    widgets::{render_placeholder, OptionsPanel, PathInput, StatusBar, StatusMessage, TabBar, TablePreview},
    HelpOverlay, Theme,
};

/// Rows moved by PageUp / PageDown in previews
const PAGE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    LoadData,
    Forecast,
}

impl Tab {
    pub const TITLES: [&'static str; 2] = ["Load Data", "Forecast"];

    fn index(self) -> usize {
        match self {
            Tab::LoadData => 0,
            Tab::Forecast => 1,
        }
    }
}

/// Which panel is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPanel {
    PathInput,
    RawPreview,
    DateColumn,
    ValueColumn,
    MapSubmit,
    MappedPreview,
    Options,
    ForecastChart,
    Components,
}

/// Application state
pub struct App {
    theme: Theme,
    session: Session,

    // UI State
    tab: Tab,
    focused: FocusedPanel,
    path_input: TextInput,
    editing_path: bool,
    raw_offset: usize,
    mapped_offset: usize,
    date_picker: ColumnPickerState,
    value_picker: ColumnPickerState,
    preferred_date: Option<String>,
    preferred_value: Option<String>,
    /// Forecast table rendered as text for the preview
    mapped_preview: Option<RawTable>,
    form: ConfigForm,
    show_help: bool,

    // Exit flag
    should_quit: bool,

    status: Option<StatusMessage>,
}

impl App {
    /// Create a new App instance, loading the file given on the command line
    pub fn new(config: AppConfig) -> Self {
        let mut app = App {
            theme: Theme::default().with_palette(&config.color_palette),
            session: Session::default(),
            tab: Tab::LoadData,
            focused: FocusedPanel::PathInput,
            path_input: TextInput::new(config.file.clone().unwrap_or_default()),
            editing_path: false,
            raw_offset: 0,
            mapped_offset: 0,
            date_picker: ColumnPickerState::new(),
            value_picker: ColumnPickerState::new(),
            preferred_date: config.date_column.clone(),
            preferred_value: config.value_column.clone(),
            mapped_preview: None,
            form: ConfigForm::new(&config.forecast),
            show_help: false,
            should_quit: false,
            status: None,
        };

        let preselected = config.date_column.is_some() && config.value_column.is_some();
        if config.file.is_some() && app.load_file() && preselected {
            app.submit_columns();
        }

        app
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn set_error(&mut self, err: &Error) {
        tracing::warn!(kind = %err.kind(), error = %err, "step failed");
        self.status = Some(StatusMessage::Error(err.user_message()));
    }

    fn set_info(&mut self, message: String) {
        self.status = Some(StatusMessage::Info(message));
    }

    /// Load the file named in the path input. Returns true on success.
    fn load_file(&mut self) -> bool {
        let path = self.path_input.value().trim().to_string();
        if path.is_empty() {
            self.set_error(&Error::MissingInput("enter the path of a CSV file"));
            return false;
        }

        match self.session.load_file(&path) {
            Ok(raw) => {
                let columns = raw.column_names().to_vec();
                let summary = format!("Loaded {} rows × {} columns", raw.row_count(), raw.column_count());

                self.date_picker.reset(columns.len(), 0);
                self.value_picker.reset(columns.len(), 1);
                if let Some(name) = &self.preferred_date {
                    self.date_picker.select_name(&columns, name);
                }
                if let Some(name) = &self.preferred_value {
                    self.value_picker.select_name(&columns, name);
                }
                self.raw_offset = 0;
                self.focused = FocusedPanel::DateColumn;
                self.set_info(summary);
                true
            }
            Err(err) => {
                self.set_error(&err);
                false
            }
        }
    }

    fn submit_columns(&mut self) {
        let Some(raw) = self.session.raw() else {
            self.set_error(&Error::MissingInput("load a CSV file first"));
            return;
        };
        let columns = raw.column_names();
        let date = self.date_picker.selected_name(columns).unwrap_or_default().to_string();
        let value = self.value_picker.selected_name(columns).unwrap_or_default().to_string();

        match self.session.map_columns(&date, &value) {
            Ok(table) => {
                let message = format!("Mapped '{date}' and '{value}' into {} timestamps", table.len());
                self.mapped_preview = Some(table.to_raw());
                self.mapped_offset = 0;
                self.focused = FocusedPanel::MappedPreview;
                self.set_info(message);
            }
            Err(err) => self.set_error(&err),
        }
    }

    fn run_forecast(&mut self) {
        let config = match self.form.to_config() {
            Ok(config) => config,
            Err(err) => return self.set_error(&err),
        };

        match self.session.run_forecast(&config) {
            Ok(result) => {
                let message = format!(
                    "Forecast {} periods with {} significant changepoints",
                    result.future().len(),
                    result.significant_changepoints.len()
                );
                self.form.collapse();
                self.focused = FocusedPanel::ForecastChart;
                self.set_info(message);
            }
            Err(err) => self.set_error(&err),
        }
    }

    /// Panels that can take focus on the current tab
    fn visible_panels(&self) -> Vec<FocusedPanel> {
        match self.tab {
            Tab::LoadData => {
                let mut panels = vec![FocusedPanel::PathInput];
                if self.session.raw().is_some() {
                    panels.extend([
                        FocusedPanel::RawPreview,
                        FocusedPanel::DateColumn,
                        FocusedPanel::ValueColumn,
                        FocusedPanel::MapSubmit,
                    ]);
                }
                if self.mapped_preview.is_some() {
                    panels.push(FocusedPanel::MappedPreview);
                }
                panels
            }
            Tab::Forecast => vec![
                FocusedPanel::Options,
                FocusedPanel::ForecastChart,
                FocusedPanel::Components,
            ],
        }
    }

    fn cycle_focus(&mut self, forward: bool) {
        let panels = self.visible_panels();
        let n = panels.len();
        let i = panels.iter().position(|p| *p == self.focused).unwrap_or(0);
        self.focused = panels[if forward { (i + 1) % n } else { (i + n - 1) % n }];
    }

    fn switch_tab(&mut self, tab: Tab) {
        if self.tab != tab {
            self.tab = tab;
            self.focused = self.visible_panels()[0];
        }
    }

    fn is_editing(&self) -> bool {
        self.editing_path || self.form.is_editing()
    }

    /// Handle keyboard input
    pub fn handle_key(&mut self, key: KeyEvent) {
        tracing::trace!(code = ?key.code, "key");

        // Text entry takes every key until it ends
        if self.editing_path {
            match key.code {
                KeyCode::Enter => {
                    self.editing_path = false;
                    self.load_file();
                }
                KeyCode::Esc => self.editing_path = false,
                code => {
                    self.path_input.handle_key(code);
                }
            }
            return;
        }
        if self.form.is_editing() {
            self.handle_form_key(key.code);
            return;
        }

        // Global shortcuts
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::F(1) => {
                self.show_help = !self.show_help;
                return;
            }
            KeyCode::Esc if self.show_help => {
                self.show_help = false;
                return;
            }
            _ => {}
        }

        // If help is shown, don't process other keys
        if self.show_help {
            return;
        }

        match key.code {
            KeyCode::Char('1') => return self.switch_tab(Tab::LoadData),
            KeyCode::Char('2') => return self.switch_tab(Tab::Forecast),
            KeyCode::Tab => return self.cycle_focus(true),
            KeyCode::BackTab => return self.cycle_focus(false),
            KeyCode::Char('o') if self.tab == Tab::Forecast => {
                self.form.toggle();
                self.focused = FocusedPanel::Options;
                return;
            }
            _ => {}
        }

        // Panel-specific navigation
        match self.focused {
            FocusedPanel::PathInput => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Char('i') | KeyCode::Char('e')) {
                    self.editing_path = true;
                }
            }
            FocusedPanel::RawPreview => {
                let rows = self.session.raw().map_or(0, RawTable::row_count);
                scroll(&mut self.raw_offset, rows, key.code);
            }
            FocusedPanel::MappedPreview => {
                let rows = self.mapped_preview.as_ref().map_or(0, RawTable::row_count);
                scroll(&mut self.mapped_offset, rows, key.code);
            }
            FocusedPanel::DateColumn | FocusedPanel::ValueColumn => self.handle_picker_key(key.code),
            FocusedPanel::MapSubmit => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
                    self.submit_columns();
                }
            }
            FocusedPanel::Options => {
                if self.form.open {
                    self.handle_form_key(key.code);
                } else if key.code == KeyCode::Enter {
                    self.form.toggle();
                }
            }
            FocusedPanel::ForecastChart | FocusedPanel::Components => {}
        }
    }

    fn handle_picker_key(&mut self, code: KeyCode) {
        let num_columns = self.session.raw().map_or(0, RawTable::column_count);
        let picker = if self.focused == FocusedPanel::DateColumn {
            &mut self.date_picker
        } else {
            &mut self.value_picker
        };
        match code {
            KeyCode::Down | KeyCode::Char('j') => picker.select_next(num_columns),
            KeyCode::Up | KeyCode::Char('k') => picker.select_prev(num_columns),
            KeyCode::Enter => self.cycle_focus(true),
            _ => {}
        }
    }

    fn handle_form_key(&mut self, code: KeyCode) {
        match self.form.handle_key(code) {
            FormOutcome::Submit => self.run_forecast(),
            FormOutcome::Rejected(err) => self.set_error(&err),
            FormOutcome::Committed(row) => {
                tracing::debug!(field = row.label(), value = %self.form.value_text(row), "option changed");
                self.status = None;
            }
            FormOutcome::Changed | FormOutcome::Ignored => {}
        }
    }

    /// Render the UI
    fn render(&self, frame: &mut ratatui::Frame) {
        let size = frame.area();

        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // Tabs
                Constraint::Min(3),    // Body
                Constraint::Length(2), // Status bar
            ])
            .split(size);

        TabBar::new(&Tab::TITLES, self.tab.index(), &self.theme).render(frame, main_chunks[0]);

        match self.tab {
            Tab::LoadData => self.render_load_tab(frame, main_chunks[1]),
            Tab::Forecast => self.render_forecast_tab(frame, main_chunks[1]),
        }

        StatusBar::new(self.status.as_ref(), self.is_editing(), &self.theme).render(frame, main_chunks[2]);

        if self.show_help {
            HelpOverlay::new(&self.theme).render(frame, size);
        }
    }

    fn render_load_tab(&self, frame: &mut ratatui::Frame, area: Rect) {
        let focus = |panel: FocusedPanel| self.focused == panel;
        let source = self.session.source().map(|p| p.display().to_string());
        let path_input = PathInput::new(&self.path_input, self.editing_path, source.as_deref(), &self.theme);

        let Some(raw) = self.session.raw() else {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Min(0)])
                .split(area);
            path_input.render(frame, chunks[0], focus(FocusedPanel::PathInput));
            return;
        };

        let picker_height = (raw.column_count() as u16 + 2).clamp(3, 8);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),             // Path
                Constraint::Percentage(45),        // Raw preview
                Constraint::Length(picker_height), // Pickers
                Constraint::Min(4),                // Mapped preview
            ])
            .split(area);

        path_input.render(frame, chunks[0], focus(FocusedPanel::PathInput));
        TablePreview::new("Preview", raw, self.raw_offset, &self.theme).render(
            frame,
            chunks[1],
            focus(FocusedPanel::RawPreview),
        );

        let picker_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(40),
                Constraint::Percentage(40),
                Constraint::Percentage(20),
            ])
            .split(chunks[2]);
        let columns = raw.column_names();
        ColumnPicker::new("Date column", columns, &self.date_picker, &self.theme).render(
            frame,
            picker_chunks[0],
            focus(FocusedPanel::DateColumn),
        );
        ColumnPicker::new("Value column", columns, &self.value_picker, &self.theme).render(
            frame,
            picker_chunks[1],
            focus(FocusedPanel::ValueColumn),
        );
        self.render_submit(frame, picker_chunks[2], focus(FocusedPanel::MapSubmit));

        match &self.mapped_preview {
            Some(table) => TablePreview::new("Forecast data", table, self.mapped_offset, &self.theme).render(
                frame,
                chunks[3],
                focus(FocusedPanel::MappedPreview),
            ),
            None => render_placeholder(
                frame,
                chunks[3],
                "Forecast data",
                "Choose the date and value columns, then Submit",
                false,
                &self.theme,
            ),
        }
    }

    fn render_submit(&self, frame: &mut ratatui::Frame, area: Rect, focused: bool) {
        let (border_style, _) = self.theme.panel_styles(focused);
        let style = if focused {
            self.theme.highlight_style()
        } else {
            self.theme.normal_style()
        };
        let button = Paragraph::new(Span::styled("Submit", style))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).border_style(border_style));
        frame.render_widget(button, area);
    }

    fn render_forecast_tab(&self, frame: &mut ratatui::Frame, area: Rect) {
        let options_height = if self.form.open { OptionsPanel::height() } else { 1 };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(options_height),
                Constraint::Percentage(55),
                Constraint::Min(6),
            ])
            .split(area);

        let options = OptionsPanel::new(&self.form, &self.theme);
        let options_focused = self.focused == FocusedPanel::Options;
        if self.form.open {
            options.render(frame, chunks[0], options_focused);
        } else {
            options.render_collapsed(frame, chunks[0], options_focused);
        }

        let plots = self.session.plots();
        ForecastChart::new(plots.map(|p| &p.forecast), &self.theme).render(
            frame,
            chunks[1],
            self.focused == FocusedPanel::ForecastChart,
        );
        ComponentsChart::new(plots.map(|p| &p.components), &self.theme).render(
            frame,
            chunks[2],
            self.focused == FocusedPanel::Components,
        );
    }
}

/// Move a preview's first visible row
fn scroll(offset: &mut usize, rows: usize, code: KeyCode) {
    let last = rows.saturating_sub(1);
    *offset = match code {
        KeyCode::Down | KeyCode::Char('j') => (*offset + 1).min(last),
        KeyCode::Up | KeyCode::Char('k') => offset.saturating_sub(1),
        KeyCode::PageDown => (*offset + PAGE).min(last),
        KeyCode::PageUp => offset.saturating_sub(PAGE),
        KeyCode::Home | KeyCode::Char('g') => 0,
        KeyCode::End | KeyCode::Char('G') => last,
        _ => *offset,
    };
}

/// Restore terminal to normal state
fn restore_terminal() {
    // Best effort cleanup - ignore errors since we may be in a panic
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

/// Run the TUI application
pub fn run(config: AppConfig) -> Result<()> {
    // Build state before touching the terminal so startup errors stay readable
    let mut app = App::new(config);

    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen) {
        restore_terminal();
        return Err(e).context("Failed to setup terminal");
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = match Terminal::new(backend) {
        Ok(t) => t,
        Err(e) => {
            restore_terminal();
            return Err(e).context("Failed to create terminal");
        }
    };

    let result = run_main_loop(&mut terminal, &mut app);

    // Always restore terminal, regardless of result
    restore_terminal();
    terminal.show_cursor().ok();

    result
}

/// Main application loop: one event is handled completely before the next is read
fn run_main_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| app.render(f))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                app.handle_key(key);
            }
        }

        if app.should_quit() {
            return Ok(());
        }
    }
}
