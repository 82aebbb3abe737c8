//! Chinese public holiday periods and the shipment caution window around them.

use chrono::NaiveDate;
use serde::Serialize;

/// Days before and after a period that still count as a soft holiday
pub const BUFFER_DAYS: i64 = 3;

/// Longest range `classify_range` accepts
pub const MAX_RANGE_DAYS: i64 = 366;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HolidayPeriod {
    pub name: &'static str,
    pub name_chinese: &'static str,
    pub year: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration: i64,
}

// (name, chinese name, start, end) per year, from the State Council schedules
const PERIODS: &[(i32, &str, &str, &str, &str)] = &[
    (2024, "New Year's Day", "元旦", "2024-01-01", "2024-01-01"),
    (2024, "Spring Festival (Chinese New Year)", "春节", "2024-02-10", "2024-02-17"),
    (2024, "Qingming Festival (Tomb-Sweeping Day)", "清明节", "2024-04-04", "2024-04-06"),
    (2024, "Labour Day", "劳动节", "2024-05-01", "2024-05-05"),
    (2024, "Dragon Boat Festival", "端午节", "2024-06-10", "2024-06-10"),
    (2024, "Mid-Autumn Festival", "中秋节", "2024-09-15", "2024-09-17"),
    (2024, "National Day Golden Week", "国庆节", "2024-10-01", "2024-10-07"),
    (2025, "New Year's Day", "元旦", "2025-01-01", "2025-01-01"),
    (2025, "Spring Festival (Chinese New Year)", "春节", "2025-01-28", "2025-02-04"),
    (2025, "Qingming Festival (Tomb-Sweeping Day)", "清明节", "2025-04-04", "2025-04-06"),
    (2025, "Labour Day", "劳动节", "2025-05-01", "2025-05-05"),
    (2025, "Dragon Boat Festival", "端午节", "2025-05-31", "2025-06-02"),
    (2025, "National Day Golden Week", "国庆节", "2025-10-01", "2025-10-08"),
    (2025, "Mid-Autumn Festival", "中秋节", "2025-10-06", "2025-10-08"),
];

/// Periods of a year ordered by start date; empty for years without data
pub fn periods_for(year: i32) -> Vec<HolidayPeriod> {
    let mut periods: Vec<HolidayPeriod> = PERIODS
        .iter()
        .filter(|(y, ..)| *y == year)
        .filter_map(|(y, name, name_chinese, start, end)| {
            let start_date = NaiveDate::parse_from_str(start, "%Y-%m-%d").ok()?;
            let end_date = NaiveDate::parse_from_str(end, "%Y-%m-%d").ok()?;
            Some(HolidayPeriod {
                name: *name,
                name_chinese: *name_chinese,
                year: *y,
                start_date,
                end_date,
                duration: (end_date - start_date).num_days() + 1,
            })
        })
        .collect();
    periods.sort_by_key(|p| p.start_date);
    periods
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DayType {
    Holiday,
    SoftHoliday,
    Neutral,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateClassification {
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub day_type: DayType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holiday_name: Option<&'static str>,
    /// Negative before the period, positive after, 0 during
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_from_holiday: Option<i64>,
}

impl DateClassification {
    fn neutral(date: NaiveDate) -> Self {
        Self {
            date,
            day_type: DayType::Neutral,
            holiday_name: None,
            days_from_holiday: None,
        }
    }

    /// Human readable reason to avoid shipping on this date
    pub fn caution(&self) -> Option<String> {
        let name = self.holiday_name?;
        match (self.day_type, self.days_from_holiday) {
            (DayType::Holiday, _) => Some(format!("During {} holiday period", name)),
            (DayType::SoftHoliday, Some(days)) => {
                let n = days.abs();
                let side = if days < 0 { "before" } else { "after" };
                let plural = if n > 1 { "s" } else { "" };
                Some(format!("{} day{} {} {}", n, plural, side, name))
            }
            _ => None,
        }
    }
}

/// Periods take precedence over buffers; earlier periods win ties
pub fn classify(date: NaiveDate) -> DateClassification {
    use chrono::Datelike;
    let periods = periods_for(date.year());

    if let Some(p) = periods
        .iter()
        .find(|p| p.start_date <= date && date <= p.end_date)
    {
        return DateClassification {
            date,
            day_type: DayType::Holiday,
            holiday_name: Some(p.name),
            days_from_holiday: Some(0),
        };
    }

    for p in &periods {
        let before = (p.start_date - date).num_days();
        if (1..=BUFFER_DAYS).contains(&before) {
            return DateClassification {
                date,
                day_type: DayType::SoftHoliday,
                holiday_name: Some(p.name),
                days_from_holiday: Some(-before),
            };
        }
        let after = (date - p.end_date).num_days();
        if (1..=BUFFER_DAYS).contains(&after) {
            return DateClassification {
                date,
                day_type: DayType::SoftHoliday,
                holiday_name: Some(p.name),
                days_from_holiday: Some(after),
            };
        }
    }
    DateClassification::neutral(date)
}

/// Every day from `start` to `end` inclusive
pub fn classify_range(start: NaiveDate, end: NaiveDate) -> Result<Vec<DateClassification>, String> {
    if end < start {
        return Err("end must not be before start".into());
    }
    if (end - start).num_days() >= MAX_RANGE_DAYS {
        return Err(format!("Range is limited to {} days", MAX_RANGE_DAYS));
    }
    Ok(start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(classify)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn spring_festival_spans_eight_days() {
        let periods = periods_for(2024);
        let spring = periods
            .iter()
            .find(|p| p.name_chinese == "春节")
            .unwrap();
        assert_eq!(spring.duration, 8);
        assert!(periods_for(2030).is_empty());
    }

    #[test]
    fn days_inside_a_period_are_holidays() {
        let c = classify(day("2024-02-12"));
        assert_eq!(c.day_type, DayType::Holiday);
        assert_eq!(c.days_from_holiday, Some(0));
        assert_eq!(
            c.caution().unwrap(),
            "During Spring Festival (Chinese New Year) holiday period"
        );
    }

    #[test]
    fn buffer_days_are_soft_holidays() {
        let before = classify(day("2024-02-07"));
        assert_eq!(before.day_type, DayType::SoftHoliday);
        assert_eq!(before.days_from_holiday, Some(-3));
        assert_eq!(
            before.caution().unwrap(),
            "3 days before Spring Festival (Chinese New Year)"
        );

        let after = classify(day("2024-10-08"));
        assert_eq!(after.days_from_holiday, Some(1));
        assert_eq!(after.caution().unwrap(), "1 day after National Day Golden Week");

        let clear = classify(day("2024-02-06"));
        assert_eq!(clear.day_type, DayType::Neutral);
        assert!(clear.caution().is_none());
    }

    #[test]
    fn overlapping_periods_report_the_earlier_one() {
        let c = classify(day("2025-10-07"));
        assert_eq!(c.holiday_name, Some("National Day Golden Week"));
    }

    #[test]
    fn ranges_are_inclusive_and_bounded() {
        let range = classify_range(day("2024-02-01"), day("2024-02-29")).unwrap();
        assert_eq!(range.len(), 29);
        assert_eq!(
            range.iter().filter(|c| c.day_type == DayType::Holiday).count(),
            8
        );
        assert!(classify_range(day("2024-03-01"), day("2024-02-01")).is_err());
        assert!(classify_range(day("2024-01-01"), day("2025-06-01")).is_err());
    }

    #[test]
    fn classification_serializes_for_the_calendar() {
        let json = serde_json::to_value(classify(day("2024-02-09"))).unwrap();
        assert_eq!(json["type"], "soft-holiday");
        assert_eq!(json["daysFromHoliday"], -1);
        assert_eq!(json["date"], "2024-02-09");
    }
}
