//! Terminal User Interface components for forecast-tui.

pub mod chart;
pub mod column_picker;
pub mod form;
mod help;
mod theme;
pub mod widgets;

pub use help::HelpOverlay;
pub use theme::Theme;
