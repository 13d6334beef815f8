//! UI widgets for the forecast dashboard.

use ratatui::{
    layout::{Alignment, Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Tabs},
    Frame,
};

use crate::data::RawTable;

use super::form::{ConfigForm, FormRow, TextInput};
use super::theme::Theme;

/// Widest a preview column is drawn
const MAX_COLUMN_WIDTH: usize = 24;

fn panel<'a>(title: &str, focused: bool, theme: &Theme) -> Block<'a> {
    let (border_style, title_style) = theme.panel_styles(focused);
    Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_style(border_style)
        .title_style(title_style)
}

/// Dimmed centered message inside a titled block
pub fn render_placeholder(frame: &mut Frame, area: Rect, title: &str, message: &str, focused: bool, theme: &Theme) {
    let block = panel(title, focused, theme);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    let message = Paragraph::new(message)
        .style(theme.dimmed_style())
        .alignment(Alignment::Center);
    frame.render_widget(message, inner);
}

/// Tab bar at the top of the screen
pub struct TabBar<'a> {
    titles: &'a [&'a str],
    selected: usize,
    theme: &'a Theme,
}

impl<'a> TabBar<'a> {
    pub fn new(titles: &'a [&'a str], selected: usize, theme: &'a Theme) -> Self {
        TabBar {
            titles,
            selected,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = self
            .titles
            .iter()
            .enumerate()
            .map(|(i, t)| Line::from(format!("[{}] {t}", i + 1)))
            .collect();
        let tabs = Tabs::new(titles)
            .select(self.selected)
            .style(self.theme.normal_style())
            .highlight_style(self.theme.highlight_style())
            .block(Block::default().borders(Borders::BOTTOM).border_style(self.theme.border_style()));
        frame.render_widget(tabs, area);
    }
}

/// File path entry
pub struct PathInput<'a> {
    input: &'a TextInput,
    editing: bool,
    source: Option<&'a str>,
    theme: &'a Theme,
}

impl<'a> PathInput<'a> {
    pub fn new(input: &'a TextInput, editing: bool, source: Option<&'a str>, theme: &'a Theme) -> Self {
        PathInput {
            input,
            editing,
            source,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let title = match self.source {
            Some(source) => format!("CSV file (loaded: {source})"),
            None => "CSV file".to_string(),
        };
        let block = panel(&title, focused, self.theme);
        let inner = block.inner(area);

        let line = if self.input.value().is_empty() && !self.editing {
            Line::from(Span::styled("Press Enter and type a path to a .csv file", self.theme.dimmed_style()))
        } else {
            Line::from(Span::styled(self.input.value(), self.theme.normal_style()))
        };
        frame.render_widget(Paragraph::new(line).block(block), area);

        if self.editing && inner.width > 0 {
            let prefix: String = self.input.value().chars().take(self.input.cursor()).collect();
            let offset = (prefix.chars().count() as u16).min(inner.width.saturating_sub(1));
            frame.set_cursor_position((inner.x + offset, inner.y));
        }
    }
}

/// Scrollable preview of a table's rows
pub struct TablePreview<'a> {
    title: &'a str,
    table: &'a RawTable,
    offset: usize,
    theme: &'a Theme,
}

impl<'a> TablePreview<'a> {
    pub fn new(title: &'a str, table: &'a RawTable, offset: usize, theme: &'a Theme) -> Self {
        TablePreview {
            title,
            table,
            offset,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let title = format!(
            "{} ({} rows × {} columns)",
            self.title,
            self.table.row_count(),
            self.table.column_count()
        );
        let block = panel(&title, focused, self.theme);

        let widths: Vec<Constraint> = (0..self.table.column_count())
            .map(|c| {
                let cells = self.table.column(c).take(200).map(|v| v.chars().count());
                let header = self.table.headers[c].chars().count();
                let width = cells.fold(header, usize::max).clamp(3, MAX_COLUMN_WIDTH);
                Constraint::Length(width as u16)
            })
            .collect();

        let header = Row::new(self.table.headers.iter().map(|h| Cell::from(h.as_str())))
            .style(self.theme.title_style().add_modifier(Modifier::UNDERLINED));

        let visible = block.inner(area).height.saturating_sub(1) as usize;
        let offset = self.offset.min(self.table.row_count().saturating_sub(1));
        let rows = self
            .table
            .rows
            .iter()
            .skip(offset)
            .take(visible)
            .map(|r| Row::new(r.iter().map(|c| Cell::from(c.as_str()))));

        let table = Table::new(rows, widths)
            .header(header)
            .column_spacing(2)
            .style(self.theme.normal_style())
            .block(block);
        frame.render_widget(table, area);
    }
}

/// The "Forecast options" panel
pub struct OptionsPanel<'a> {
    form: &'a ConfigForm,
    theme: &'a Theme,
}

impl<'a> OptionsPanel<'a> {
    pub fn new(form: &'a ConfigForm, theme: &'a Theme) -> Self {
        OptionsPanel { form, theme }
    }

    /// Height needed when open, including borders
    pub fn height() -> u16 {
        FormRow::ALL.len() as u16 + 2
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let block = panel("▼ Forecast options [o]", focused, self.theme);
        let inner = block.inner(area);

        let lines: Vec<Line> = FormRow::ALL
            .iter()
            .map(|row| {
                let selected = focused && self.form.selected == *row;
                let label_style = if selected {
                    self.theme.highlight_style()
                } else {
                    self.theme.normal_style()
                };
                if *row == FormRow::Submit {
                    return Line::from(Span::styled("[ Submit ]", label_style));
                }

                let value = match self.form.field(*row).and_then(|f| f.editing()) {
                    Some(input) => Span::styled(
                        format!("{}▏", input.value()),
                        Style::default().fg(self.theme.title).add_modifier(Modifier::BOLD),
                    ),
                    None => Span::styled(self.form.value_text(*row), self.theme.normal_style()),
                };
                let hint = match row {
                    FormRow::SeasonalityMode | FormRow::Frequency => "  ◂ ▸",
                    _ => "",
                };
                Line::from(vec![
                    Span::styled(format!("{:<26}", row.label()), label_style),
                    value,
                    Span::styled(hint, self.theme.dimmed_style()),
                ])
            })
            .collect();

        frame.render_widget(block, area);
        frame.render_widget(Paragraph::new(lines), inner);
    }

    /// One-line header shown while the panel is collapsed
    pub fn render_collapsed(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let style = if focused {
            self.theme.focused_border_style()
        } else {
            self.theme.title_style()
        };
        let summary = format!(
            "▶ Forecast options [o]  periods {} · changepoint {} · seasonality {} · {} · {}",
            self.form.value_text(FormRow::Periods),
            self.form.value_text(FormRow::ChangepointPriorScale),
            self.form.value_text(FormRow::SeasonalityPriorScale),
            self.form.value_text(FormRow::SeasonalityMode),
            self.form.value_text(FormRow::Frequency),
        );
        frame.render_widget(Paragraph::new(Span::styled(summary, style)), area);
    }
}

/// Kind of message in the status bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMessage {
    Info(String),
    Error(String),
}

/// Status bar widget
pub struct StatusBar<'a> {
    message: Option<&'a StatusMessage>,
    editing: bool,
    theme: &'a Theme,
}

impl<'a> StatusBar<'a> {
    pub fn new(message: Option<&'a StatusMessage>, editing: bool, theme: &'a Theme) -> Self {
        StatusBar {
            message,
            editing,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let hints = if self.editing {
            "[Enter] Confirm [Esc] Cancel"
        } else {
            "[1/2] Tabs [Tab] Focus [o] Options [?] Help [q] Quit"
        };

        let line = match self.message {
            Some(StatusMessage::Error(e)) => Line::from(Span::styled(e.as_str(), self.theme.error_style())),
            Some(StatusMessage::Info(m)) => Line::from(vec![
                Span::styled(m.as_str(), self.theme.success_style()),
                Span::styled(format!(" | {hints}"), self.theme.dimmed_style()),
            ]),
            None => Line::from(Span::styled(format!("forecast-tui | {hints}"), self.theme.dimmed_style())),
        };

        let paragraph = Paragraph::new(line).block(Block::default().borders(Borders::TOP));
        frame.render_widget(paragraph, area);
    }
}
