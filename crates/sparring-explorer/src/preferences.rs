//! Search preferences persisted between runs.
//!
//! Stored as a JSON object:
//!
//! ```json
//! {"ratings":[0,1200],"timeControls":["blitz"],"dateRange":["1952-01-01","3000-12-01"],"evalDepth":16}
//! ```
//!
//! Loading is lenient per key. Unknown keys are dropped and a key whose
//! value is malformed falls back to its default.

use std::fs;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::PreferencesError;
use crate::query::Speed;

/// Deepest evaluation the user may request.
pub const MAX_EVAL_DEPTH: u8 = 30;

/// Evaluation depth used when nothing else is configured.
pub const DEFAULT_EVAL_DEPTH: u8 = 16;

/// Half-open rating interval `[min, max)`. A missing `max` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(u16, Option<u16>)", into = "(u16, Option<u16>)")]
pub struct RatingRange {
    pub min: u16,
    pub max: Option<u16>,
}

impl RatingRange {
    pub fn new(min: u16, max: Option<u16>) -> Self {
        RatingRange { min, max }
    }

    pub fn contains(&self, rating: u16) -> bool {
        rating >= self.min && self.max.is_none_or(|max| rating < max)
    }

    pub fn is_empty(&self) -> bool {
        self.max.is_some_and(|max| max <= self.min)
    }
}

impl Default for RatingRange {
    fn default() -> Self {
        RatingRange::new(0, Some(1200))
    }
}

impl From<(u16, Option<u16>)> for RatingRange {
    fn from((min, max): (u16, Option<u16>)) -> Self {
        RatingRange::new(min, max)
    }
}

impl From<RatingRange> for (u16, Option<u16>) {
    fn from(range: RatingRange) -> Self {
        (range.min, range.max)
    }
}

/// Earliest month the service has games for.
pub fn min_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1952, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Open-ended upper bound used as the default `until`.
pub fn max_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(3000, 12, 1).unwrap_or(NaiveDate::MAX)
}

/// Inclusive month range of the games to consider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(NaiveDate, NaiveDate)", into = "(NaiveDate, NaiveDate)")]
pub struct DateRange {
    pub since: NaiveDate,
    pub until: NaiveDate,
}

impl DateRange {
    pub fn new(since: NaiveDate, until: NaiveDate) -> Self {
        DateRange { since, until }
    }

    /// `since` as `YYYY-MM`, or `None` at the earliest month.
    pub fn since_param(&self) -> Option<String> {
        let floor = min_date();
        (month(self.since) != month(floor)).then(|| format_month(self.since))
    }

    /// `until` as `YYYY-MM`, or `None` at the open-ended default.
    pub fn until_param(&self) -> Option<String> {
        let ceiling = max_date();
        (month(self.until) != month(ceiling)).then(|| format_month(self.until))
    }
}

fn month(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

fn format_month(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

impl Default for DateRange {
    fn default() -> Self {
        DateRange::new(min_date(), max_date())
    }
}

impl From<(NaiveDate, NaiveDate)> for DateRange {
    fn from((since, until): (NaiveDate, NaiveDate)) -> Self {
        DateRange::new(since, until)
    }
}

impl From<DateRange> for (NaiveDate, NaiveDate) {
    fn from(range: DateRange) -> Self {
        (range.since, range.until)
    }
}

/// User preferences for statistics queries and engine evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub ratings: RatingRange,
    pub time_controls: Vec<Speed>,
    pub date_range: DateRange,
    pub eval_depth: u8,
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            ratings: RatingRange::default(),
            time_controls: vec![
                Speed::Blitz,
                Speed::Rapid,
                Speed::Classical,
                Speed::Correspondence,
            ],
            date_range: DateRange::default(),
            eval_depth: DEFAULT_EVAL_DEPTH,
        }
    }
}

impl Preferences {
    /// Decode stored preferences, keeping every valid recognised key.
    ///
    /// Never fails: unparseable text yields the defaults.
    pub fn from_json(text: &str) -> Self {
        let mut prefs = Preferences::default();
        let map: Map<String, Value> = match serde_json::from_str(text) {
            Ok(Value::Object(map)) => map,
            _ => {
                warn!("stored preferences are not a JSON object, using defaults");
                return prefs;
            }
        };

        if let Some(value) = map.get("ratings") {
            match serde_json::from_value::<RatingRange>(value.clone()) {
                Ok(range) if !range.is_empty() => prefs.ratings = range,
                _ => warn!(%value, "ignoring invalid ratings preference"),
            }
        }
        if let Some(value) = map.get("timeControls") {
            match serde_json::from_value::<Vec<Speed>>(value.clone()) {
                Ok(speeds) if !speeds.is_empty() => prefs.time_controls = speeds,
                _ => warn!(%value, "ignoring invalid timeControls preference"),
            }
        }
        if let Some(value) = map.get("dateRange") {
            match serde_json::from_value::<DateRange>(value.clone()) {
                Ok(range) if range.since <= range.until => prefs.date_range = range,
                _ => warn!(%value, "ignoring invalid dateRange preference"),
            }
        }
        if let Some(value) = map.get("evalDepth") {
            match serde_json::from_value::<u8>(value.clone()) {
                Ok(depth) if depth <= MAX_EVAL_DEPTH => prefs.eval_depth = depth,
                _ => warn!(%value, "ignoring invalid evalDepth preference"),
            }
        }

        prefs
    }

    pub fn to_json(&self) -> Result<String, PreferencesError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Read preferences from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, PreferencesError> {
        match fs::read_to_string(path) {
            Ok(text) => {
                debug!(path = %path.display(), "loaded preferences");
                Ok(Preferences::from_json(&text))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Preferences::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write preferences to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), PreferencesError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        debug!(path = %path.display(), "saved preferences");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let prefs = Preferences::default();
        assert_eq!(prefs.ratings, RatingRange::new(0, Some(1200)));
        assert_eq!(prefs.time_controls.len(), 4);
        assert_eq!(prefs.eval_depth, 16);
        assert_eq!(prefs.date_range.since_param(), None);
        assert_eq!(prefs.date_range.until_param(), None);
    }

    #[test]
    fn json_shape() {
        let json = Preferences::default().to_json().unwrap();
        assert_eq!(
            json,
            r#"{"ratings":[0,1200],"timeControls":["blitz","rapid","classical","correspondence"],"dateRange":["1952-01-01","3000-12-01"],"evalDepth":16}"#
        );
    }

    #[test]
    fn reload_saved_json() {
        let prefs = Preferences {
            ratings: RatingRange::new(1800, None),
            time_controls: vec![Speed::Bullet],
            eval_depth: 22,
            ..Preferences::default()
        };
        assert_eq!(Preferences::from_json(&prefs.to_json().unwrap()), prefs);
    }

    #[test]
    fn garbage_yields_defaults() {
        assert_eq!(Preferences::from_json("not json"), Preferences::default());
        assert_eq!(Preferences::from_json("[1,2]"), Preferences::default());
    }

    #[test]
    fn invalid_keys_fall_back_individually() {
        let prefs = Preferences::from_json(
            r#"{"ratings":[1400,1400],"timeControls":["blitz"],"evalDepth":99,"theme":"dark"}"#,
        );
        assert_eq!(prefs.ratings, RatingRange::default());
        assert_eq!(prefs.time_controls, vec![Speed::Blitz]);
        assert_eq!(prefs.eval_depth, DEFAULT_EVAL_DEPTH);
    }

    #[test]
    fn unknown_speed_rejects_the_key() {
        let prefs = Preferences::from_json(r#"{"timeControls":["blitz","hyper"]}"#);
        assert_eq!(prefs.time_controls, Preferences::default().time_controls);
    }

    #[test]
    fn reversed_dates_are_rejected() {
        let prefs = Preferences::from_json(r#"{"dateRange":["2020-01-01","2010-01-01"]}"#);
        assert_eq!(prefs.date_range, DateRange::default());
    }

    #[test]
    fn rating_range_bounds() {
        let range = RatingRange::new(1000, Some(1400));
        assert!(!range.contains(999));
        assert!(range.contains(1000));
        assert!(range.contains(1200));
        assert!(!range.contains(1400));
        assert!(RatingRange::new(0, None).contains(u16::MAX));
    }
}
