//! Theme configuration for the TUI.

use std::str::FromStr;

use ratatui::style::{Color, Modifier, Style};

/// Color theme for the application
#[derive(Debug, Clone)]
pub struct Theme {
    pub bg: Color,
    pub fg: Color,
    pub highlight_bg: Color,
    pub highlight_fg: Color,
    pub border: Color,
    pub title: Color,
    pub error: Color,
    pub success: Color,
    pub observed: Color,
    /// yhat, changepoints, trend, then seasonal panels
    pub chart_colors: Vec<Color>,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            bg: Color::Reset,
            fg: Color::White,
            highlight_bg: Color::Rgb(60, 60, 80),
            highlight_fg: Color::White,
            border: Color::Rgb(100, 100, 120),
            title: Color::Cyan,
            error: Color::Red,
            success: Color::Green,
            observed: Color::Gray,
            // Using named colors instead of RGB for better terminal compatibility
            chart_colors: vec![
                Color::Cyan,
                Color::Red,
                Color::Blue,
                Color::Green,
                Color::Yellow,
                Color::Magenta,
            ],
        }
    }
}

impl Theme {
    /// Replace chart colors with a hex palette; unparseable entries are skipped
    pub fn with_palette(mut self, palette: &[String]) -> Self {
        let colors: Vec<Color> = palette
            .iter()
            .filter_map(|hex| match Color::from_str(hex.trim()) {
                Ok(color) => Some(color),
                Err(_) => {
                    tracing::warn!(color = %hex, "ignoring invalid palette color");
                    None
                }
            })
            .collect();
        if !colors.is_empty() {
            self.chart_colors = colors;
        }
        self
    }

    /// Base surface style used to paint widget backgrounds
    pub fn surface_style(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    /// Convenience helper returning (border_style, title_style) for focus state
    pub fn panel_styles(&self, focused: bool) -> (Style, Style) {
        if focused {
            (self.focused_border_style(), self.focused_border_style())
        } else {
            (self.border_style(), self.title_style())
        }
    }

    /// Get style for normal text
    pub fn normal_style(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    /// Get style for highlighted/selected items
    pub fn highlight_style(&self) -> Style {
        Style::default()
            .fg(self.highlight_fg)
            .bg(self.highlight_bg)
            .add_modifier(Modifier::BOLD)
    }

    /// Get style for borders
    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    /// Get style for focused panel borders (distinct from normal borders)
    pub fn focused_border_style(&self) -> Style {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    }

    /// Get style for titles
    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(self.title)
            .add_modifier(Modifier::BOLD)
    }

    /// Get style for hints and placeholders
    pub fn dimmed_style(&self) -> Style {
        Style::default()
            .fg(self.border)
            .add_modifier(Modifier::DIM)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error).add_modifier(Modifier::BOLD)
    }

    pub fn success_style(&self) -> Style {
        Style::default().fg(self.success)
    }

    /// Get a chart color by index (cycles through available colors)
    pub fn chart_color(&self, index: usize) -> Color {
        self.chart_colors[index % self.chart_colors.len()]
    }

    pub fn forecast_color(&self) -> Color {
        self.chart_color(0)
    }

    pub fn changepoint_color(&self) -> Color {
        self.chart_color(1)
    }

    pub fn trend_color(&self) -> Color {
        self.chart_color(2)
    }

    /// Color of the n-th seasonal panel
    pub fn seasonal_color(&self, index: usize) -> Color {
        self.chart_color(3 + index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_colors_are_distinct() {
        let theme = Theme::default();
        // Verify first few colors are all different
        let c0 = theme.forecast_color();
        let c1 = theme.changepoint_color();
        let c2 = theme.trend_color();
        assert_ne!(c0, c1, "Colors 0 and 1 should be different");
        assert_ne!(c1, c2, "Colors 1 and 2 should be different");
        assert_ne!(c0, c2, "Colors 0 and 2 should be different");
    }

    #[test]
    fn test_chart_color_cycles() {
        let theme = Theme::default();
        let len = theme.chart_colors.len();
        // Color at index 0 should equal color at index len (cycle)
        assert_eq!(theme.chart_color(0), theme.chart_color(len));
        assert_eq!(theme.chart_color(1), theme.chart_color(len + 1));
    }

    #[test]
    fn test_chart_colors_are_not_gray() {
        let theme = Theme::default();
        for (i, color) in theme.chart_colors.iter().enumerate() {
            let gray_colors = [Color::Gray, Color::DarkGray, Color::White, Color::Black];
            assert!(
                !gray_colors.contains(color),
                "Chart color {i} should not be a gray shade: {:?}",
                color
            );
        }
    }

    #[test]
    fn test_palette_from_hex() {
        let palette = vec!["#FF0000".to_string(), "nonsense-color".to_string(), " #00ff00 ".to_string()];
        let theme = Theme::default().with_palette(&palette);
        assert_eq!(theme.chart_colors, vec![Color::Rgb(255, 0, 0), Color::Rgb(0, 255, 0)]);
        assert_eq!(theme.trend_color(), Color::Rgb(255, 0, 0));
    }

    #[test]
    fn test_invalid_palette_keeps_defaults() {
        let theme = Theme::default().with_palette(&["#zzzzzz".to_string()]);
        assert_eq!(theme.chart_colors, Theme::default().chart_colors);
    }
}
