//! Single-choice column picker state and widget.
//!
//! Shows the loaded file's column names as a radio list. When there are more
//! columns than rows available, a window scrolls to keep the selection
//! visible.

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::theme::Theme;

/// Selection and scroll window of a column picker
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnPickerState {
    /// Index of the chosen column
    pub selected: usize,
    /// Index of the first visible column
    pub window_start: usize,
}

impl ColumnPickerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the selection down, wrapping to the top
    pub fn select_next(&mut self, num_columns: usize) {
        if num_columns == 0 {
            return;
        }
        self.selected = (self.selected + 1) % num_columns;
    }

    /// Move the selection up, wrapping to the bottom
    pub fn select_prev(&mut self, num_columns: usize) {
        if num_columns == 0 {
            return;
        }
        self.selected = (self.selected + num_columns - 1) % num_columns;
    }

    /// Select a column by name. Unknown names are ignored.
    pub fn select_name(&mut self, columns: &[String], name: &str) -> bool {
        match columns.iter().position(|c| c == name) {
            Some(index) => {
                self.selected = index;
                true
            }
            None => false,
        }
    }

    /// Name of the chosen column
    pub fn selected_name<'a>(&self, columns: &'a [String]) -> Option<&'a str> {
        columns.get(self.selected).map(String::as_str)
    }

    /// Reset after a new file is loaded
    pub fn reset(&mut self, num_columns: usize, default: usize) {
        self.selected = default.min(num_columns.saturating_sub(1));
        self.window_start = 0;
    }

    /// Scroll the window so the selection is one of `visible` rows
    pub fn scroll_to_selection(&mut self, visible: usize) {
        if visible == 0 {
            return;
        }
        if self.selected < self.window_start {
            self.window_start = self.selected;
        } else if self.selected >= self.window_start + visible {
            self.window_start = self.selected + 1 - visible;
        }
    }
}

/// Radio list widget for one column choice
pub struct ColumnPicker<'a> {
    title: &'a str,
    columns: &'a [String],
    state: &'a ColumnPickerState,
    theme: &'a Theme,
}

impl<'a> ColumnPicker<'a> {
    pub fn new(
        title: &'a str,
        columns: &'a [String],
        state: &'a ColumnPickerState,
        theme: &'a Theme,
    ) -> Self {
        ColumnPicker {
            title,
            columns,
            state,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let (border_style, title_style) = self.theme.panel_styles(focused);
        let block = Block::default()
            .title(format!(" {} ", self.title))
            .borders(Borders::ALL)
            .border_style(border_style)
            .title_style(title_style);

        let visible = block.inner(area).height as usize;
        let mut window = self.state.clone();
        window.scroll_to_selection(visible);

        let lines: Vec<Line> = self
            .columns
            .iter()
            .enumerate()
            .skip(window.window_start)
            .take(visible)
            .map(|(i, name)| {
                if i == self.state.selected {
                    let style = if focused {
                        self.theme.highlight_style()
                    } else {
                        self.theme.normal_style()
                    };
                    Line::from(Span::styled(format!("(•) {name}"), style))
                } else {
                    Line::from(Span::styled(format!("( ) {name}"), self.theme.normal_style()))
                }
            })
            .collect();

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}
