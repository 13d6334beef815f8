//! Forecast and component charts.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    symbols::Marker,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, LegendPosition},
    Frame,
};

use crate::forecast::{format_date_label, ComponentsPlot, ForecastPlot, SeasonalPanel};

use super::theme::Theme;
use super::widgets::render_placeholder;

fn chart_block<'a>(title: &str, focused: bool, theme: &Theme) -> Block<'a> {
    let (border_style, title_style) = theme.panel_styles(focused);
    Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_style(border_style)
        .title_style(title_style)
}

fn date_axis<'a>(bounds: [f64; 2], theme: &Theme) -> Axis<'a> {
    let span = bounds[1] - bounds[0];
    let labels = vec![
        Span::raw(format_date_label(bounds[0], span)),
        Span::raw(format_date_label((bounds[0] + bounds[1]) / 2.0, span)),
        Span::raw(format_date_label(bounds[1], span)),
    ];
    Axis::default()
        .style(theme.normal_style())
        .bounds(bounds)
        .labels(labels)
}

fn value_axis<'a>(bounds: [f64; 2], percent: bool, theme: &Theme) -> Axis<'a> {
    let label = |v: f64| {
        if percent {
            format!("{v:.1}%")
        } else {
            format_value(v)
        }
    };
    Axis::default()
        .style(theme.normal_style())
        .bounds(bounds)
        .labels(vec![
            Span::raw(label(bounds[0])),
            Span::raw(label((bounds[0] + bounds[1]) / 2.0)),
            Span::raw(label(bounds[1])),
        ])
}

/// Observed points, forecast with interval, trend and changepoints
pub struct ForecastChart<'a> {
    plot: Option<&'a ForecastPlot>,
    theme: &'a Theme,
}

impl<'a> ForecastChart<'a> {
    pub fn new(plot: Option<&'a ForecastPlot>, theme: &'a Theme) -> Self {
        ForecastChart { plot, theme }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let Some(plot) = self.plot else {
            render_placeholder(
                frame,
                area,
                "Forecast",
                "Map a date and value column, then submit the options",
                focused,
                self.theme,
            );
            return;
        };

        // Vertical changepoint markers spanning the y range
        let markers: Vec<[(f64, f64); 2]> = plot
            .changepoints
            .iter()
            .map(|x| [(*x, plot.y_bounds[0]), (*x, plot.y_bounds[1])])
            .collect();

        let forecast = self.theme.forecast_color();
        let interval = Style::default().fg(forecast).add_modifier(Modifier::DIM);

        let mut datasets = vec![
            Dataset::default()
                .name("upper")
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(interval)
                .data(&plot.upper),
            Dataset::default()
                .name("lower")
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(interval)
                .data(&plot.lower),
            Dataset::default()
                .name("trend")
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(self.theme.trend_color()))
                .data(&plot.trend),
            Dataset::default()
                .name("yhat")
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(forecast))
                .data(&plot.yhat),
            Dataset::default()
                .name("observed")
                .marker(Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(self.theme.observed))
                .data(&plot.observed),
        ];
        for (i, line) in markers.iter().enumerate() {
            let dataset = Dataset::default()
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(self.theme.changepoint_color()))
                .data(line);
            // One legend entry for all markers
            datasets.push(if i == 0 { dataset.name("changepoint") } else { dataset });
        }

        let title = format!("Forecast ({} changepoints)", plot.changepoints.len());
        let chart = Chart::new(datasets)
            .block(chart_block(&title, focused, self.theme))
            .legend_position(Some(LegendPosition::TopLeft))
            .x_axis(date_axis(plot.x_bounds, self.theme))
            .y_axis(value_axis(plot.y_bounds, false, self.theme));

        frame.render_widget(chart, area);
    }
}

/// Trend over time plus one chart per seasonality
pub struct ComponentsChart<'a> {
    plot: Option<&'a ComponentsPlot>,
    theme: &'a Theme,
}

impl<'a> ComponentsChart<'a> {
    pub fn new(plot: Option<&'a ComponentsPlot>, theme: &'a Theme) -> Self {
        ComponentsChart { plot, theme }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let Some(plot) = self.plot else {
            render_placeholder(frame, area, "Components", "No forecast yet", focused, self.theme);
            return;
        };

        let panels = 1 + plot.seasonal.len();
        let constraints = vec![Constraint::Ratio(1, panels as u32); panels];
        let direction = if area.width >= 60 * panels as u16 {
            Direction::Horizontal
        } else {
            Direction::Vertical
        };
        let chunks = Layout::default()
            .direction(direction)
            .constraints(constraints)
            .split(area);

        self.render_trend(frame, chunks[0], plot, focused);
        for (i, panel) in plot.seasonal.iter().enumerate() {
            self.render_seasonal(frame, chunks[i + 1], panel, i, focused);
        }
    }

    fn render_trend(&self, frame: &mut Frame, area: Rect, plot: &ComponentsPlot, focused: bool) {
        let trend = Style::default().fg(self.theme.trend_color());
        let band = trend.add_modifier(Modifier::DIM);
        let datasets = vec![
            Dataset::default()
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(band)
                .data(&plot.trend_upper),
            Dataset::default()
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(band)
                .data(&plot.trend_lower),
            Dataset::default()
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(trend)
                .data(&plot.trend),
        ];
        let chart = Chart::new(datasets)
            .block(chart_block("trend", focused, self.theme))
            .x_axis(date_axis(plot.trend_x_bounds, self.theme))
            .y_axis(value_axis(plot.trend_y_bounds, false, self.theme));
        frame.render_widget(chart, area);
    }

    fn render_seasonal(&self, frame: &mut Frame, area: Rect, panel: &SeasonalPanel, index: usize, focused: bool) {
        let dataset = Dataset::default()
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(self.theme.seasonal_color(index)))
            .data(&panel.points);

        let labels: Vec<Span> = panel.x_labels().into_iter().map(Span::raw).collect();
        let chart = Chart::new(vec![dataset])
            .block(chart_block(&panel.name, focused, self.theme))
            .x_axis(
                Axis::default()
                    .style(self.theme.normal_style())
                    .bounds(panel.x_bounds)
                    .labels(labels),
            )
            .y_axis(value_axis(panel.y_bounds, panel.percent, self.theme));
        frame.render_widget(chart, area);
    }
}

/// Format a value for display on axis labels
fn format_value(value: f64) -> String {
    if value.abs() < 0.001 && value != 0.0 {
        format!("{:.2e}", value)
    } else if value.abs() >= 100_000.0 {
        format!("{:.2e}", value)
    } else if value.abs() >= 1.0 {
        format!("{:.2}", value)
    } else {
        format!("{:.4}", value)
    }
}
