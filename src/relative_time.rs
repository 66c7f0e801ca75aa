//! "N units ago" labels for comment creation times.
//!
//! Months are 30 days and years are 365 days; labels are approximate by
//! construction.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

const MINUTE: f64 = 60.0;
const HOUR: f64 = 3_600.0;
const DAY: f64 = 86_400.0;
const MONTH: f64 = 2_592_000.0;
const YEAR: f64 = 31_536_000.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Zh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Second,
    Minute,
    Hour,
    Day,
    Month,
    Year,
}

impl Unit {
    fn english(self) -> &'static str {
        match self {
            Unit::Second => "second",
            Unit::Minute => "minute",
            Unit::Hour => "hour",
            Unit::Day => "day",
            Unit::Month => "month",
            Unit::Year => "year",
        }
    }

    fn chinese(self) -> &'static str {
        match self {
            Unit::Second => "秒",
            Unit::Minute => "分钟",
            Unit::Hour => "小时",
            Unit::Day => "天",
            Unit::Month => "月",
            Unit::Year => "年",
        }
    }
}

/// Pick the unit and rounded amount for the time elapsed between `created`
/// and `now`. Anything under a second (including clock skew putting
/// `created` in the future) reports as one second.
#[allow(clippy::cast_possible_truncation)]
pub fn elapsed(created: Timestamp, now: Timestamp) -> (i64, Unit) {
    let duration = now.duration_since(created).as_secs_f64();

    let (amount, unit) = if duration < MINUTE {
        (duration.max(1.0), Unit::Second)
    } else if duration < HOUR {
        (duration / MINUTE, Unit::Minute)
    } else if duration < DAY {
        (duration / HOUR, Unit::Hour)
    } else if duration < MONTH {
        (duration / DAY, Unit::Day)
    } else if duration < YEAR {
        (duration / MONTH, Unit::Month)
    } else {
        (duration / YEAR, Unit::Year)
    };

    (amount.round() as i64, unit)
}

pub fn format(created: Timestamp, now: Timestamp, locale: Locale) -> String {
    let (amount, unit) = elapsed(created, now);
    match locale {
        Locale::En if amount == 1 => format!("1 {} ago", unit.english()),
        Locale::En => format!("{amount} {}s ago", unit.english()),
        Locale::Zh => format!("{amount} {}前发布", unit.chinese()),
    }
}
