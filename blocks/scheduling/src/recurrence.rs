use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// How often a recurring chore repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Yearly,
    /// Anything we don't recognise. Never due, formatted as "Custom schedule".
    #[serde(other)]
    Custom,
}

/// Recurrence rule attached to a task template.
///
/// Only the selector relevant to `frequency` is consulted; the others are
/// carried along untouched. Empty selectors are legal and simply never match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    pub interval: u32,
    #[serde(rename = "byDay", default, skip_serializing_if = "Option::is_none")]
    pub by_day: Option<Vec<String>>,
    #[serde(rename = "byMonthDay", default, skip_serializing_if = "Option::is_none")]
    pub by_month_day: Option<Vec<u32>>,
    #[serde(rename = "byMonth", default, skip_serializing_if = "Option::is_none")]
    pub by_month: Option<Vec<u32>>,
}

/// Parse the serialized rule stored on a template row.
///
/// Templates carry the rule as an opaque JSON string; a blob that fails to
/// parse makes the template inert rather than surfacing an error.
pub fn parse_rule(raw: &str) -> Option<RecurrenceRule> {
    match serde_json::from_str(raw) {
        Ok(rule) => Some(rule),
        Err(e) => {
            tracing::warn!("Ignoring unparseable recurrence rule: {}", e);
            None
        }
    }
}

fn weekday_from_name(name: &str) -> Option<Weekday> {
    match name.to_ascii_uppercase().as_str() {
        "MO" | "MONDAY" => Some(Weekday::Mon),
        "TU" | "TUESDAY" => Some(Weekday::Tue),
        "WE" | "WEDNESDAY" => Some(Weekday::Wed),
        "TH" | "THURSDAY" => Some(Weekday::Thu),
        "FR" | "FRIDAY" => Some(Weekday::Fri),
        "SA" | "SATURDAY" => Some(Weekday::Sat),
        "SU" | "SUNDAY" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Does an occurrence of `rule` fall on `date`?
///
/// Daily rules are always due; the interval only affects `next_occurrence`.
/// Biweekly keeps the week-of-month parity filter of the original scheduler:
/// `day_of_month / 7` must be even, so the cadence resets at month boundaries.
pub fn is_due_on(rule: &RecurrenceRule, date: NaiveDate) -> bool {
    match rule.frequency {
        Frequency::Daily => true,
        Frequency::Weekly | Frequency::Biweekly => {
            let days = match rule.by_day.as_deref() {
                Some(days) if !days.is_empty() => days,
                _ => return false,
            };
            if rule.frequency == Frequency::Biweekly && (date.day() / 7) % 2 != 0 {
                return false;
            }
            days.iter()
                .filter_map(|d| weekday_from_name(d))
                .any(|w| w == date.weekday())
        }
        Frequency::Monthly => match rule.by_month_day.as_deref() {
            Some(days) if !days.is_empty() => days.contains(&date.day()),
            _ => false,
        },
        Frequency::Yearly => match rule.by_month.as_deref() {
            Some(months) if !months.is_empty() => months.contains(&date.month()),
            _ => false,
        },
        Frequency::Custom => false,
    }
}

/// Compute the occurrence after `from`.
///
/// Weekly rules with a `byDay` selector scan forward at most a week for the
/// next listed weekday; monthly/yearly rules pick the next listed day/month
/// in the current period before advancing `interval` periods. A rule with an
/// unrecognised frequency has no next occurrence and returns `from`.
pub fn next_occurrence(rule: &RecurrenceRule, from: NaiveDate) -> NaiveDate {
    let interval = rule.interval.max(1);
    match rule.frequency {
        Frequency::Daily => from + Days::new(u64::from(interval)),
        Frequency::Weekly | Frequency::Biweekly => {
            if let Some(days) = rule.by_day.as_deref().filter(|d| !d.is_empty()) {
                let wanted: Vec<Weekday> =
                    days.iter().filter_map(|d| weekday_from_name(d)).collect();
                for offset in 1..=7 {
                    let candidate = from + Days::new(offset);
                    if wanted.contains(&candidate.weekday()) {
                        return candidate;
                    }
                }
            }
            from + Days::new(u64::from(interval) * 7)
        }
        Frequency::Monthly => {
            if let Some(days) = rule.by_month_day.as_deref().filter(|d| !d.is_empty()) {
                let mut days = days.to_vec();
                days.sort_unstable();
                for &day in &days {
                    if day > from.day() {
                        if let Some(date) = from.with_day(day) {
                            return date;
                        }
                    }
                }
                let advanced = from + Months::new(interval);
                return advanced.with_day(days[0]).unwrap_or(advanced);
            }
            from + Months::new(interval)
        }
        Frequency::Yearly => {
            if let Some(months) = rule.by_month.as_deref().filter(|m| !m.is_empty()) {
                let mut months = months.to_vec();
                months.sort_unstable();
                for &month in &months {
                    if month > from.month() {
                        if let Some(date) = from.with_month(month) {
                            return date;
                        }
                    }
                }
                let advanced = from + Months::new(12 * interval);
                return advanced.with_month(months[0]).unwrap_or(advanced);
            }
            from + Months::new(12 * interval)
        }
        Frequency::Custom => from,
    }
}

/// Render the rule the way the task-template screens show it, e.g.
/// "Weekly on Monday, Friday" or "Every 3 months on days 1, 15".
/// Selector values are listed in the order the rule gives them.
pub fn describe_rule(rule: &RecurrenceRule) -> String {
    match rule.frequency {
        Frequency::Daily => {
            if rule.interval == 1 {
                "Daily".to_string()
            } else {
                format!("Every {} days", rule.interval)
            }
        }
        Frequency::Weekly | Frequency::Biweekly => {
            let base = if rule.frequency == Frequency::Biweekly {
                "Biweekly".to_string()
            } else if rule.interval == 1 {
                "Weekly".to_string()
            } else {
                format!("Every {} weeks", rule.interval)
            };
            match rule.by_day.as_deref() {
                Some(days) if !days.is_empty() => {
                    if rule.interval == 1 && rule.frequency == Frequency::Weekly && days.len() == 7 {
                        return "Every day".to_string();
                    }
                    let days: Vec<&str> = days.iter().map(|d| format_day(d)).collect();
                    format!("{} on {}", base, days.join(", "))
                }
                _ => base,
            }
        }
        Frequency::Monthly => match rule.by_month_day.as_deref() {
            Some(days) if !days.is_empty() => {
                let plural = if days.len() > 1 { "s" } else { "" };
                let days: Vec<String> = days.iter().map(|d| d.to_string()).collect();
                if rule.interval == 1 {
                    format!("Monthly on day{} {}", plural, days.join(", "))
                } else {
                    format!("Every {} months on day{} {}", rule.interval, plural, days.join(", "))
                }
            }
            _ => {
                if rule.interval == 1 {
                    "Monthly".to_string()
                } else {
                    format!("Every {} months", rule.interval)
                }
            }
        },
        Frequency::Yearly => match rule.by_month.as_deref() {
            Some(months) if !months.is_empty() => {
                let months: Vec<&str> = months.iter().map(|m| format_month(*m)).collect();
                if rule.interval == 1 {
                    format!("Yearly in {}", months.join(", "))
                } else {
                    format!("Every {} years in {}", rule.interval, months.join(", "))
                }
            }
            _ => {
                if rule.interval == 1 {
                    "Yearly".to_string()
                } else {
                    format!("Every {} years", rule.interval)
                }
            }
        },
        Frequency::Custom => "Custom schedule".to_string(),
    }
}

/// Human string for the serialized form; malformed blobs render as nothing.
pub fn describe_serialized_rule(raw: &str) -> String {
    parse_rule(raw).map(|rule| describe_rule(&rule)).unwrap_or_default()
}

fn format_day(day: &str) -> &str {
    match weekday_from_name(day) {
        Some(Weekday::Mon) => "Monday",
        Some(Weekday::Tue) => "Tuesday",
        Some(Weekday::Wed) => "Wednesday",
        Some(Weekday::Thu) => "Thursday",
        Some(Weekday::Fri) => "Friday",
        Some(Weekday::Sat) => "Saturday",
        Some(Weekday::Sun) => "Sunday",
        None => day,
    }
}

fn format_month(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "?",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rule(frequency: Frequency) -> RecurrenceRule {
        RecurrenceRule {
            frequency,
            interval: 1,
            by_day: None,
            by_month_day: None,
            by_month: None,
        }
    }

    #[test]
    fn daily_is_always_due_even_with_larger_interval() {
        // The due check deliberately ignores the interval; only
        // next_occurrence consults it.
        let mut r = rule(Frequency::Daily);
        r.interval = 3;
        for offset in 0..10 {
            assert!(is_due_on(&r, date(2025, 6, 1) + Days::new(offset)));
        }
    }

    #[test]
    fn weekly_matches_only_listed_weekday_across_a_week() {
        let mut r = rule(Frequency::Weekly);
        r.by_day = Some(vec!["WE".to_string()]);
        // 2025-06-02 is a Monday.
        for offset in 0..7u64 {
            let day = date(2025, 6, 2) + Days::new(offset);
            assert_eq!(is_due_on(&r, day), day.weekday() == Weekday::Wed, "{}", day);
        }
    }

    #[test]
    fn weekly_accepts_full_names_case_insensitively() {
        let mut r = rule(Frequency::Weekly);
        r.by_day = Some(vec!["wednesday".to_string()]);
        assert!(is_due_on(&r, date(2025, 6, 4)));
        r.by_day = Some(vec!["WEDNESDAY".to_string()]);
        assert!(is_due_on(&r, date(2025, 6, 4)));
    }

    #[test]
    fn weekly_without_days_is_never_due() {
        let mut r = rule(Frequency::Weekly);
        assert!(!is_due_on(&r, date(2025, 6, 4)));
        r.by_day = Some(vec![]);
        assert!(!is_due_on(&r, date(2025, 6, 4)));
    }

    #[test]
    fn biweekly_filters_by_week_of_month_parity() {
        let mut r = rule(Frequency::Biweekly);
        r.by_day = Some(vec!["TU".to_string()]);
        // June 2025 Tuesdays: 3rd (3/7=0, even), 10th (1, odd), 17th (2, even), 24th (3, odd).
        assert!(is_due_on(&r, date(2025, 6, 3)));
        assert!(!is_due_on(&r, date(2025, 6, 10)));
        assert!(is_due_on(&r, date(2025, 6, 17)));
        assert!(!is_due_on(&r, date(2025, 6, 24)));
        // The parity resets at the month boundary: July 1st is a Tuesday in week 0.
        assert!(is_due_on(&r, date(2025, 7, 1)));
    }

    #[test]
    fn monthly_matches_listed_days_only() {
        let mut r = rule(Frequency::Monthly);
        r.by_month_day = Some(vec![1, 15]);
        for month in 1..=12 {
            assert!(is_due_on(&r, date(2025, month, 1)));
            assert!(is_due_on(&r, date(2025, month, 15)));
            assert!(!is_due_on(&r, date(2025, month, 2)));
            assert!(!is_due_on(&r, date(2025, month, 28)));
        }
    }

    #[test]
    fn yearly_matches_every_day_of_listed_month() {
        let mut r = rule(Frequency::Yearly);
        r.by_month = Some(vec![3]);
        for day in 1..=31 {
            assert!(is_due_on(&r, date(2025, 3, day)));
        }
        assert!(!is_due_on(&r, date(2025, 2, 28)));
        assert!(!is_due_on(&r, date(2025, 4, 1)));
    }

    #[test]
    fn unknown_frequency_is_never_due() {
        let parsed = parse_rule(r#"{"frequency":"fortnightly","interval":1}"#).unwrap();
        assert_eq!(parsed.frequency, Frequency::Custom);
        assert!(!is_due_on(&parsed, date(2025, 6, 4)));
    }

    #[test]
    fn malformed_rule_parses_to_none() {
        assert!(parse_rule("not json").is_none());
        assert!(parse_rule(r#"{"interval":"x"}"#).is_none());
        assert_eq!(describe_serialized_rule("not json"), "");
    }

    #[test]
    fn due_check_is_referentially_transparent() {
        let mut r = rule(Frequency::Weekly);
        r.by_day = Some(vec!["MO".to_string()]);
        let day = date(2025, 6, 2);
        assert_eq!(is_due_on(&r, day), is_due_on(&r, day));
    }

    #[test]
    fn next_daily_respects_interval() {
        let mut r = rule(Frequency::Daily);
        r.interval = 3;
        assert_eq!(next_occurrence(&r, date(2025, 6, 1)), date(2025, 6, 4));
    }

    #[test]
    fn next_weekly_scans_to_nearest_listed_day() {
        let mut r = rule(Frequency::Weekly);
        r.by_day = Some(vec!["MO".to_string(), "FR".to_string()]);
        // From Wednesday the 4th, Friday the 6th comes first.
        assert_eq!(next_occurrence(&r, date(2025, 6, 4)), date(2025, 6, 6));
        // From Friday itself, the scan starts tomorrow and lands on Monday.
        assert_eq!(next_occurrence(&r, date(2025, 6, 6)), date(2025, 6, 9));
    }

    #[test]
    fn next_weekly_without_days_jumps_whole_weeks() {
        let mut r = rule(Frequency::Weekly);
        r.interval = 2;
        assert_eq!(next_occurrence(&r, date(2025, 6, 4)), date(2025, 6, 18));
    }

    #[test]
    fn next_monthly_prefers_later_day_in_same_month() {
        let mut r = rule(Frequency::Monthly);
        r.by_month_day = Some(vec![1, 15]);
        assert_eq!(next_occurrence(&r, date(2025, 6, 10)), date(2025, 6, 15));
        // Past every listed day: advance a month and take the smallest.
        assert_eq!(next_occurrence(&r, date(2025, 6, 20)), date(2025, 7, 1));
    }

    #[test]
    fn next_monthly_interval_applies_when_rolling_over() {
        let mut r = rule(Frequency::Monthly);
        r.interval = 3;
        r.by_month_day = Some(vec![5]);
        assert_eq!(next_occurrence(&r, date(2025, 6, 10)), date(2025, 9, 5));
    }

    #[test]
    fn next_monthly_without_days_clamps_end_of_month() {
        let r = rule(Frequency::Monthly);
        assert_eq!(next_occurrence(&r, date(2025, 1, 31)), date(2025, 2, 28));
    }

    #[test]
    fn next_yearly_scans_months_then_years() {
        let mut r = rule(Frequency::Yearly);
        r.by_month = Some(vec![3, 9]);
        assert_eq!(next_occurrence(&r, date(2025, 6, 10)), date(2025, 9, 10));
        assert_eq!(next_occurrence(&r, date(2025, 10, 10)), date(2026, 3, 10));
    }

    #[test]
    fn describe_covers_singular_and_plural_phrasings() {
        let mut weekly = rule(Frequency::Weekly);
        weekly.by_day = Some(vec!["monday".to_string(), "friday".to_string()]);
        assert_eq!(describe_rule(&weekly), "Weekly on Monday, Friday");

        weekly.interval = 2;
        assert_eq!(describe_rule(&weekly), "Every 2 weeks on Monday, Friday");

        weekly.interval = 1;
        weekly.by_day = Some(
            ["MO", "TU", "WE", "TH", "FR", "SA", "SU"]
                .iter()
                .map(|d| d.to_string())
                .collect(),
        );
        assert_eq!(describe_rule(&weekly), "Every day");

        let mut monthly = rule(Frequency::Monthly);
        monthly.by_month_day = Some(vec![15]);
        assert_eq!(describe_rule(&monthly), "Monthly on day 15");
        monthly.interval = 3;
        monthly.by_month_day = Some(vec![1, 15]);
        assert_eq!(describe_rule(&monthly), "Every 3 months on days 1, 15");

        let mut yearly = rule(Frequency::Yearly);
        yearly.by_month = Some(vec![3]);
        assert_eq!(describe_rule(&yearly), "Yearly in March");

        let mut daily = rule(Frequency::Daily);
        assert_eq!(describe_rule(&daily), "Daily");
        daily.interval = 4;
        assert_eq!(describe_rule(&daily), "Every 4 days");
    }

    #[test]
    fn describe_preserves_selector_order() {
        let mut r = rule(Frequency::Monthly);
        r.by_month_day = Some(vec![15, 1]);
        assert_eq!(describe_rule(&r), "Monthly on days 15, 1");
    }
}
