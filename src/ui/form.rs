//! Editable text and the forecast options form.

use crossterm::event::KeyCode;

use crate::error::{Error, Result};
use crate::forecast::{
    ForecastConfig, Frequency, NumberSpec, SeasonalityMode, CHANGEPOINT_SPEC, PERIODS_SPEC,
    SEASONALITY_SPEC,
};

/// Single-line text buffer with a cursor (in characters)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    value: String,
    cursor: usize,
}

impl TextInput {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let cursor = value.chars().count();
        TextInput { value, cursor }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set(&mut self, value: impl Into<String>) {
        *self = TextInput::new(value);
    }

    fn byte_index(&self) -> usize {
        self.value
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    /// Apply an editing key. Returns false for keys that are not edits.
    pub fn handle_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char(c) => {
                let at = self.byte_index();
                self.value.insert(at, c);
                self.cursor += 1;
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = self.byte_index();
                    self.value.remove(at);
                }
            }
            KeyCode::Delete => {
                if self.cursor < self.value.chars().count() {
                    let at = self.byte_index();
                    self.value.remove(at);
                }
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.value.chars().count()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.value.chars().count(),
            _ => return false,
        }
        true
    }
}

/// A numeric control: committed value plus an optional edit in progress
#[derive(Debug, Clone, PartialEq)]
pub struct NumberField {
    pub spec: NumberSpec,
    value: f64,
    editing: Option<TextInput>,
}

impl NumberField {
    pub fn new(spec: NumberSpec, value: f64) -> Self {
        NumberField {
            spec,
            value: spec.round(value),
            editing: None,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn editing(&self) -> Option<&TextInput> {
        self.editing.as_ref()
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn display(&self) -> String {
        self.spec.format(self.value)
    }

    pub fn begin_edit(&mut self) {
        self.editing = Some(TextInput::new(self.display()));
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Finish editing. Invalid text is rejected and the previous value kept.
    pub fn commit(&mut self) -> Result<f64> {
        let Some(input) = self.editing.take() else {
            return Ok(self.value);
        };
        self.value = self.spec.parse(input.value())?;
        Ok(self.value)
    }

    pub fn handle_edit_key(&mut self, key: KeyCode) -> bool {
        match &mut self.editing {
            Some(input) => input.handle_key(key),
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormRow {
    Periods,
    ChangepointPriorScale,
    SeasonalityPriorScale,
    SeasonalityMode,
    Frequency,
    Submit,
}

impl FormRow {
    pub const ALL: [FormRow; 6] = [
        FormRow::Periods,
        FormRow::ChangepointPriorScale,
        FormRow::SeasonalityPriorScale,
        FormRow::SeasonalityMode,
        FormRow::Frequency,
        FormRow::Submit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormRow::Periods => "Periods to forecast",
            FormRow::ChangepointPriorScale => "Changepoint prior scale",
            FormRow::SeasonalityPriorScale => "Seasonality prior scale",
            FormRow::SeasonalityMode => "Seasonality mode",
            FormRow::Frequency => "Frequency",
            FormRow::Submit => "Submit",
        }
    }

    fn index(self) -> usize {
        FormRow::ALL.iter().position(|r| *r == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        FormRow::ALL[(self.index() + 1) % FormRow::ALL.len()]
    }

    fn prev(self) -> Self {
        FormRow::ALL[(self.index() + FormRow::ALL.len() - 1) % FormRow::ALL.len()]
    }
}

/// What a key press did to the form
#[derive(Debug)]
pub enum FormOutcome {
    /// Key not used by the form
    Ignored,
    Changed,
    /// A numeric value was accepted
    Committed(FormRow),
    /// A numeric value was rejected; the previous value is kept
    Rejected(Error),
    Submit,
}

const FREQUENCIES: [Frequency; 5] = [
    Frequency::Auto,
    Frequency::Hourly,
    Frequency::Daily,
    Frequency::Weekly,
    Frequency::Monthly,
];

fn frequency_label(frequency: Frequency) -> &'static str {
    match frequency {
        Frequency::Auto => "auto",
        Frequency::Hourly => "hourly",
        Frequency::Daily => "daily",
        Frequency::Weekly => "weekly",
        Frequency::Monthly => "monthly",
    }
}

fn cycle<T: Copy + PartialEq>(options: &[T], current: T, forward: bool) -> T {
    let i = options.iter().position(|o| *o == current).unwrap_or(0);
    let n = options.len();
    options[if forward { (i + 1) % n } else { (i + n - 1) % n }]
}

/// The collapsible "Forecast options" panel
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigForm {
    pub open: bool,
    pub selected: FormRow,
    pub periods: NumberField,
    pub changepoint_prior_scale: NumberField,
    pub seasonality_prior_scale: NumberField,
    pub seasonality_mode: SeasonalityMode,
    pub frequency: Frequency,
    interval_width: f64,
}

impl ConfigForm {
    pub fn new(config: &ForecastConfig) -> Self {
        ConfigForm {
            open: true,
            selected: FormRow::Periods,
            periods: NumberField::new(PERIODS_SPEC, f64::from(config.horizon_periods)),
            changepoint_prior_scale: NumberField::new(CHANGEPOINT_SPEC, config.changepoint_prior_scale),
            seasonality_prior_scale: NumberField::new(SEASONALITY_SPEC, config.seasonality_prior_scale),
            seasonality_mode: config.seasonality_mode,
            frequency: config.frequency,
            interval_width: config.interval_width,
        }
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
        if !self.open {
            self.cancel_edit();
        }
    }

    pub fn collapse(&mut self) {
        self.open = false;
        self.cancel_edit();
    }

    fn field_mut(&mut self, row: FormRow) -> Option<&mut NumberField> {
        match row {
            FormRow::Periods => Some(&mut self.periods),
            FormRow::ChangepointPriorScale => Some(&mut self.changepoint_prior_scale),
            FormRow::SeasonalityPriorScale => Some(&mut self.seasonality_prior_scale),
            _ => None,
        }
    }

    pub fn field(&self, row: FormRow) -> Option<&NumberField> {
        match row {
            FormRow::Periods => Some(&self.periods),
            FormRow::ChangepointPriorScale => Some(&self.changepoint_prior_scale),
            FormRow::SeasonalityPriorScale => Some(&self.seasonality_prior_scale),
            _ => None,
        }
    }

    pub fn is_editing(&self) -> bool {
        [&self.periods, &self.changepoint_prior_scale, &self.seasonality_prior_scale]
            .iter()
            .any(|f| f.is_editing())
    }

    pub fn cancel_edit(&mut self) {
        self.periods.cancel_edit();
        self.changepoint_prior_scale.cancel_edit();
        self.seasonality_prior_scale.cancel_edit();
    }

    /// Display text for a row's current value
    pub fn value_text(&self, row: FormRow) -> String {
        match row {
            FormRow::SeasonalityMode => self.seasonality_mode.to_string(),
            FormRow::Frequency => frequency_label(self.frequency).to_string(),
            FormRow::Submit => String::new(),
            _ => self.field(row).map(NumberField::display).unwrap_or_default(),
        }
    }

    /// Configuration from the committed values
    pub fn to_config(&self) -> Result<ForecastConfig> {
        ForecastConfig::new(
            self.periods.value() as u32,
            self.changepoint_prior_scale.value(),
            self.seasonality_prior_scale.value(),
            self.seasonality_mode,
        )?
        .with_frequency(self.frequency)
        .with_interval_width(self.interval_width)
    }

    pub fn handle_key(&mut self, key: KeyCode) -> FormOutcome {
        let row = self.selected;

        if self.is_editing() {
            return match key {
                KeyCode::Enter => match self.field_mut(row).map(NumberField::commit) {
                    Some(Err(err)) => FormOutcome::Rejected(err),
                    _ => FormOutcome::Committed(row),
                },
                KeyCode::Esc => {
                    self.cancel_edit();
                    FormOutcome::Changed
                }
                other => match self.field_mut(row).map(|field| field.handle_edit_key(other)) {
                    Some(true) => FormOutcome::Changed,
                    _ => FormOutcome::Ignored,
                },
            };
        }

        match key {
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected = row.next();
                FormOutcome::Changed
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = row.prev();
                FormOutcome::Changed
            }
            KeyCode::Enter | KeyCode::Char('e') if self.field(row).is_some() => {
                if let Some(field) = self.field_mut(row) {
                    field.begin_edit();
                }
                FormOutcome::Changed
            }
            KeyCode::Enter | KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')
                if row == FormRow::SeasonalityMode =>
            {
                let forward = key != KeyCode::Left;
                self.seasonality_mode = cycle(&SeasonalityMode::ALL, self.seasonality_mode, forward);
                FormOutcome::Changed
            }
            KeyCode::Enter | KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')
                if row == FormRow::Frequency =>
            {
                let forward = key != KeyCode::Left;
                self.frequency = cycle(&FREQUENCIES, self.frequency, forward);
                FormOutcome::Changed
            }
            KeyCode::Enter if row == FormRow::Submit => FormOutcome::Submit,
            _ => FormOutcome::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_text(form: &mut ConfigForm, text: &str) {
        for c in text.chars() {
            form.handle_key(KeyCode::Char(c));
        }
    }

    fn clear(form: &mut ConfigForm) {
        for _ in 0..10 {
            form.handle_key(KeyCode::Backspace);
        }
    }

    #[test]
    fn test_text_input_editing() {
        let mut input = TextInput::new("data.csv");
        assert_eq!(input.cursor(), 8);
        input.handle_key(KeyCode::Home);
        input.handle_key(KeyCode::Char('~'));
        input.handle_key(KeyCode::Char('/'));
        assert_eq!(input.value(), "~/data.csv");
        input.handle_key(KeyCode::End);
        input.handle_key(KeyCode::Backspace);
        input.handle_key(KeyCode::Left);
        input.handle_key(KeyCode::Delete);
        assert_eq!(input.value(), "~/data.c");
        assert!(!input.handle_key(KeyCode::Enter));
    }

    #[test]
    fn test_text_input_multibyte() {
        let mut input = TextInput::new("día");
        input.handle_key(KeyCode::Left);
        input.handle_key(KeyCode::Backspace);
        assert_eq!(input.value(), "da");
    }

    #[test]
    fn test_form_defaults_from_config() {
        let form = ConfigForm::new(&ForecastConfig::default());
        assert!(form.open);
        assert_eq!(form.value_text(FormRow::Periods), "24");
        assert_eq!(form.value_text(FormRow::ChangepointPriorScale), "0.05");
        assert_eq!(form.value_text(FormRow::SeasonalityPriorScale), "10.00");
        assert_eq!(form.value_text(FormRow::SeasonalityMode), "additive");
        assert_eq!(form.to_config().unwrap(), ForecastConfig::default());
    }

    #[test]
    fn test_commit_valid_value() {
        let mut form = ConfigForm::new(&ForecastConfig::default());
        form.handle_key(KeyCode::Enter);
        assert!(form.is_editing());
        clear(&mut form);
        type_text(&mut form, "36");
        assert!(matches!(form.handle_key(KeyCode::Enter), FormOutcome::Committed(FormRow::Periods)));
        assert!(!form.is_editing());
        assert_eq!(form.to_config().unwrap().horizon_periods, 36);
    }

    #[test]
    fn test_invalid_commit_keeps_previous_value() {
        let mut form = ConfigForm::new(&ForecastConfig::default());
        form.handle_key(KeyCode::Down);
        form.handle_key(KeyCode::Down);
        assert_eq!(form.selected, FormRow::SeasonalityPriorScale);

        form.handle_key(KeyCode::Enter);
        clear(&mut form);
        type_text(&mut form, "42");
        match form.handle_key(KeyCode::Enter) {
            FormOutcome::Rejected(err) => assert!(matches!(err, Error::InvalidConfig { .. })),
            other => panic!("expected rejection, got {other:?}"),
        }
        assert_eq!(form.seasonality_prior_scale.value(), 10.0);
        assert!(!form.is_editing());

        form.handle_key(KeyCode::Enter);
        clear(&mut form);
        type_text(&mut form, "abc");
        assert!(matches!(form.handle_key(KeyCode::Enter), FormOutcome::Rejected(_)));
        assert_eq!(form.seasonality_prior_scale.value(), 10.0);
    }

    #[test]
    fn test_commit_rounds_to_precision() {
        let mut form = ConfigForm::new(&ForecastConfig::default());
        form.selected = FormRow::ChangepointPriorScale;
        form.handle_key(KeyCode::Enter);
        clear(&mut form);
        type_text(&mut form, "0.123");
        form.handle_key(KeyCode::Enter);
        assert_eq!(form.changepoint_prior_scale.value(), 0.12);
    }

    #[test]
    fn test_edit_keys_while_editing() {
        let mut form = ConfigForm::new(&ForecastConfig::default());
        form.handle_key(KeyCode::Enter);
        assert!(matches!(form.handle_key(KeyCode::Char('5')), FormOutcome::Changed));
        assert!(matches!(form.handle_key(KeyCode::Backspace), FormOutcome::Changed));
        assert!(matches!(form.handle_key(KeyCode::Tab), FormOutcome::Ignored));
        assert_eq!(form.field(FormRow::Periods).and_then(|f| f.editing()).unwrap().value(), "24");
    }

    #[test]
    fn test_escape_cancels_edit() {
        let mut form = ConfigForm::new(&ForecastConfig::default());
        form.handle_key(KeyCode::Enter);
        type_text(&mut form, "9");
        form.handle_key(KeyCode::Esc);
        assert!(!form.is_editing());
        assert_eq!(form.periods.value(), 24.0);
    }

    #[test]
    fn test_mode_and_frequency_cycle() {
        let mut form = ConfigForm::new(&ForecastConfig::default());
        form.selected = FormRow::SeasonalityMode;
        form.handle_key(KeyCode::Right);
        assert_eq!(form.seasonality_mode, SeasonalityMode::Multiplicative);
        form.handle_key(KeyCode::Right);
        assert_eq!(form.seasonality_mode, SeasonalityMode::Additive);

        form.selected = FormRow::Frequency;
        form.handle_key(KeyCode::Right);
        assert_eq!(form.frequency, Frequency::Weekly);
        form.handle_key(KeyCode::Left);
        form.handle_key(KeyCode::Left);
        assert_eq!(form.frequency, Frequency::Hourly);
    }

    #[test]
    fn test_submit_row() {
        let mut form = ConfigForm::new(&ForecastConfig::default());
        form.handle_key(KeyCode::Up);
        assert_eq!(form.selected, FormRow::Submit);
        assert!(matches!(form.handle_key(KeyCode::Enter), FormOutcome::Submit));
    }

    #[test]
    fn test_collapse_cancels_edit() {
        let mut form = ConfigForm::new(&ForecastConfig::default());
        form.handle_key(KeyCode::Enter);
        form.collapse();
        assert!(!form.open);
        assert!(!form.is_editing());
        form.toggle();
        assert!(form.open);
    }
}
