//! Text formatting for card values.

use crate::normalize::stats::{identify, StatTarget};

pub const MISSING: &str = "-";

/// Percent values get one decimal and `%`; flat values are floored.
pub fn format_value(value: f64, is_percent: bool) -> String {
    if is_percent {
        format!("{:.1}%", value)
    } else {
        format!("{}", value.floor() as i64)
    }
}

pub fn format_stat(value: Option<f64>, is_percent: bool) -> String {
    match value {
        Some(value) if value.is_finite() => format_value(value, is_percent),
        _ => MISSING.to_string(),
    }
}

pub fn format_level_badge(level: u32) -> String {
    format!("+{}", level)
}

pub fn format_score(score: f64) -> String {
    format!("Score {:.1}", score)
}

pub fn format_character_level(level: u32, eidolon: u32) -> String {
    format!("Lv.{} E{}", level, eidolon)
}

pub fn format_light_cone_level(level: u32, superimpose: u32) -> String {
    format!("Lv.{} S{}", level, superimpose)
}

/// Compact label for a relic stat line (`CR`, `ATK`, ...). Unknown names
/// pass through.
pub fn short_stat_label(name: &str) -> String {
    match identify(name).map(|p| p.target) {
        Some(StatTarget::Fixed(key)) => key.short_label().to_string(),
        Some(StatTarget::Extra(extra)) => extra.to_string(),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_and_flat_formatting() {
        assert_eq!(format_stat(Some(7.3), true), "7.3%");
        assert_eq!(format_stat(Some(67.24), true), "67.2%");
        assert_eq!(format_stat(Some(3456.9), false), "3456");
        assert_eq!(format_stat(None, true), "-");
        assert_eq!(format_stat(Some(f64::NAN), false), "-");
    }

    #[test]
    fn labels_and_badges() {
        assert_eq!(format_level_badge(15), "+15");
        assert_eq!(format_score(87.46), "Score 87.5");
        assert_eq!(format_character_level(80, 2), "Lv.80 E2");
        assert_eq!(format_light_cone_level(80, 5), "Lv.80 S5");
        assert_eq!(short_stat_label("Crit Rate"), "CR");
        assert_eq!(short_stat_label("SPD"), "SPD");
        assert_eq!(short_stat_label("Something"), "Something");
    }
}
