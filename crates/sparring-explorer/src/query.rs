//! Query parameters for the statistics service.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::preferences::{DateRange, Preferences, RatingRange};

/// Rating buckets the service groups games into.
pub const RATING_BUCKETS: [u16; 9] = [0, 1000, 1200, 1400, 1600, 1800, 2000, 2200, 2500];

/// Time control category of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Speed {
    UltraBullet,
    Bullet,
    Blitz,
    Rapid,
    Classical,
    Correspondence,
}

impl Speed {
    pub const ALL: [Speed; 6] = [
        Speed::UltraBullet,
        Speed::Bullet,
        Speed::Blitz,
        Speed::Rapid,
        Speed::Classical,
        Speed::Correspondence,
    ];

    /// Name used by the service.
    pub fn as_str(self) -> &'static str {
        match self {
            Speed::UltraBullet => "ultraBullet",
            Speed::Bullet => "bullet",
            Speed::Blitz => "blitz",
            Speed::Rapid => "rapid",
            Speed::Classical => "classical",
            Speed::Correspondence => "correspondence",
        }
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Speed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Speed::ALL
            .into_iter()
            .find(|speed| speed.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown time control: {s}"))
    }
}

/// A statistics request for the position reached by `play` from `fen`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplorerQuery {
    /// FEN of the line's starting position.
    pub fen: String,
    /// Moves of the line in long algebraic notation.
    pub play: Vec<String>,
    pub ratings: RatingRange,
    pub speeds: Vec<Speed>,
    pub dates: DateRange,
}

impl ExplorerQuery {
    /// Build a query for a line using the user's search preferences.
    pub fn from_preferences(
        fen: impl Into<String>,
        play: impl IntoIterator<Item = impl Into<String>>,
        prefs: &Preferences,
    ) -> Self {
        ExplorerQuery {
            fen: fen.into(),
            play: play.into_iter().map(Into::into).collect(),
            ratings: prefs.ratings,
            speeds: prefs.time_controls.clone(),
            dates: prefs.date_range,
        }
    }

    /// Rating buckets selected by the range, or `None` when every bucket is.
    pub fn rating_buckets(&self) -> Option<Vec<u16>> {
        let selected: Vec<u16> = RATING_BUCKETS
            .into_iter()
            .filter(|&bucket| self.ratings.contains(bucket))
            .collect();
        if selected.len() == RATING_BUCKETS.len() {
            None
        } else {
            Some(selected)
        }
    }

    /// Key/value pairs of the HTTP query string, in a stable order.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("fen", self.fen.clone()),
            ("play", self.play.join(",")),
            ("topGames", "0".to_string()),
            ("recentGames", "0".to_string()),
        ];

        if let Some(buckets) = self.rating_buckets() {
            let joined = buckets
                .iter()
                .map(u16::to_string)
                .collect::<Vec<_>>()
                .join(",");
            params.push(("ratings", joined));
        }

        if let Some(since) = self.dates.since_param() {
            params.push(("since", since));
        }
        if let Some(until) = self.dates.until_param() {
            params.push(("until", until));
        }

        let speeds = self
            .speeds
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(",");
        params.push(("speeds", speeds));

        params
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn param<'a>(params: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn default_preferences_query() {
        let prefs = Preferences::default();
        let query = ExplorerQuery::from_preferences(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            ["e2e4", "e7e5"],
            &prefs,
        );
        let params = query.params();
        assert_eq!(param(&params, "play"), Some("e2e4,e7e5"));
        assert_eq!(param(&params, "ratings"), Some("0,1000"));
        assert_eq!(param(&params, "speeds"), Some("blitz,rapid,classical,correspondence"));
        assert_eq!(param(&params, "topGames"), Some("0"));
        assert_eq!(param(&params, "recentGames"), Some("0"));
        assert_eq!(param(&params, "since"), None);
        assert_eq!(param(&params, "until"), None);
    }

    #[test]
    fn full_rating_range_is_omitted() {
        let prefs = Preferences {
            ratings: RatingRange::new(0, None),
            ..Preferences::default()
        };
        let query = ExplorerQuery::from_preferences("startfen", Vec::<String>::new(), &prefs);
        assert_eq!(query.rating_buckets(), None);
        assert_eq!(param(&query.params(), "ratings"), None);
        assert_eq!(param(&query.params(), "play"), Some(""));
    }

    #[test]
    fn bounded_rating_range_selects_buckets() {
        let prefs = Preferences {
            ratings: RatingRange::new(1600, Some(2200)),
            ..Preferences::default()
        };
        let query = ExplorerQuery::from_preferences("fen", ["d2d4"], &prefs);
        assert_eq!(query.rating_buckets(), Some(vec![1600, 1800, 2000]));
    }

    #[test]
    fn open_ended_top_range() {
        let prefs = Preferences {
            ratings: RatingRange::new(2200, None),
            ..Preferences::default()
        };
        let query = ExplorerQuery::from_preferences("fen", ["d2d4"], &prefs);
        assert_eq!(query.rating_buckets(), Some(vec![2200, 2500]));
    }

    #[test]
    fn custom_dates_are_sent_as_months() {
        let since = NaiveDate::from_ymd_opt(2015, 3, 14).unwrap();
        let until = NaiveDate::from_ymd_opt(2020, 11, 1).unwrap();
        let prefs = Preferences {
            date_range: DateRange::new(since, until),
            ..Preferences::default()
        };
        let query = ExplorerQuery::from_preferences("fen", ["e2e4"], &prefs);
        let params = query.params();
        assert_eq!(param(&params, "since"), Some("2015-03"));
        assert_eq!(param(&params, "until"), Some("2020-11"));
    }

    #[test]
    fn speed_names() {
        assert_eq!(Speed::UltraBullet.to_string(), "ultraBullet");
        assert_eq!("Classical".parse::<Speed>(), Ok(Speed::Classical));
        assert!("hyper".parse::<Speed>().is_err());
        assert_eq!(serde_json::to_string(&Speed::UltraBullet).unwrap(), "\"ultraBullet\"");
    }
}
