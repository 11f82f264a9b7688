//! Treatment eligibility evaluation: age range and BMI threshold checks
//! against remote demographic data.
//!
//! Every function takes `today` as an argument so the calendar boundaries
//! are deterministic under test.

use chrono::{Datelike, NaiveDate};

/// Youngest eligible age, inclusive.
const MIN_AGE: i32 = 18;
/// Oldest eligible age, inclusive.
const MAX_AGE: i32 = 74;
/// Eligible strictly below this BMI.
const MAX_BMI: f64 = 27.0;

/// Evaluate eligibility from remote demographic fields.
///
/// Ineligible when: the date of birth is absent or unparsable; the exact
/// elapsed-years age falls outside 18..=74; the BMI (imperial formula from
/// height in inches and the numeric leading token of the weight string) is
/// missing, unparsable, or `>= 27`.
#[must_use]
pub fn evaluate(
    dob: Option<&str>,
    height_in: Option<f64>,
    weight: Option<&str>,
    today: NaiveDate,
) -> bool {
    let Some(dob) = dob.and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()) else {
        return false;
    };

    let age = age_on(dob, today);
    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        return false;
    }

    let bmi = weight
        .and_then(parse_weight_lbs)
        .zip(height_in)
        .and_then(|(weight_lbs, height_in)| bmi_imperial(weight_lbs, height_in));
    bmi.is_some_and(|bmi| bmi < MAX_BMI)
}

/// Exact elapsed-years age: calendar-year subtraction, minus one when
/// today's month/day precedes the birth month/day.
#[must_use]
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }
    age
}

/// The numeric leading token of a weight string, e.g. `"200 lbs"` -> `200`.
#[must_use]
pub fn parse_weight_lbs(weight: &str) -> Option<f64> {
    weight.split_whitespace().next()?.parse().ok()
}

/// BMI for imperial units: `weight_lbs * 703 / height_in^2`.
#[must_use]
pub fn bmi_imperial(weight_lbs: f64, height_in: f64) -> Option<f64> {
    if height_in <= 0.0 {
        return None;
    }
    Some(weight_lbs * 703.0 / (height_in * height_in))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    const TODAY: (i32, u32, u32) = (2025, 6, 15);

    fn today() -> NaiveDate {
        date(TODAY.0, TODAY.1, TODAY.2)
    }

    #[test]
    fn test_age_counts_exact_elapsed_years() {
        // Birthday later this year: not yet completed
        assert_eq!(age_on(date(1990, 12, 1), today()), 34);
        // Birthday earlier this year: completed
        assert_eq!(age_on(date(1990, 6, 1), today()), 35);
        // Birthday today counts as completed
        assert_eq!(age_on(date(1990, 6, 15), today()), 35);
    }

    #[test]
    fn test_age_boundary_under_18() {
        // today - 17 years + 1 day
        let eligible = evaluate(Some("2008-06-16"), Some(70.0), Some("133 lbs"), today());
        assert!(!eligible);
    }

    #[test]
    fn test_age_boundary_exactly_18() {
        let eligible = evaluate(Some("2007-06-15"), Some(70.0), Some("133 lbs"), today());
        assert!(eligible);
    }

    #[test]
    fn test_age_boundary_exactly_74() {
        let eligible = evaluate(Some("1951-06-15"), Some(70.0), Some("133 lbs"), today());
        assert!(eligible);
    }

    #[test]
    fn test_age_boundary_75_is_out() {
        let eligible = evaluate(Some("1950-06-15"), Some(70.0), Some("133 lbs"), today());
        assert!(!eligible);
    }

    #[test]
    fn test_missing_dob_is_ineligible() {
        assert!(!evaluate(None, Some(70.0), Some("133 lbs"), today()));
    }

    #[test]
    fn test_unparsable_dob_is_ineligible() {
        assert!(!evaluate(Some("yesterday"), Some(70.0), Some("133 lbs"), today()));
    }

    #[test]
    fn test_bmi_below_threshold_is_eligible() {
        // 133 lbs at 70 inches ~ 19.08
        assert!(evaluate(Some("1990-01-01"), Some(70.0), Some("133 lbs"), today()));
    }

    #[test]
    fn test_bmi_above_threshold_is_ineligible() {
        // 160 lbs at 64 inches ~ 27.46
        assert!(!evaluate(Some("1990-01-01"), Some(64.0), Some("160 lbs"), today()));
    }

    #[test]
    fn test_bmi_exactly_27_is_ineligible() {
        // 18981 lbs at 703 inches is exactly 27.0; eligibility is strict `<`
        let bmi = bmi_imperial(18981.0, 703.0).expect("bmi");
        assert!((bmi - 27.0).abs() < f64::EPSILON);
        assert!(!evaluate(Some("1990-01-01"), Some(703.0), Some("18981"), today()));
    }

    #[test]
    fn test_missing_height_or_weight_is_ineligible() {
        assert!(!evaluate(Some("1990-01-01"), None, Some("133 lbs"), today()));
        assert!(!evaluate(Some("1990-01-01"), Some(70.0), None, today()));
        assert!(!evaluate(Some("1990-01-01"), Some(70.0), Some("lbs"), today()));
        assert!(!evaluate(Some("1990-01-01"), Some(0.0), Some("133 lbs"), today()));
    }

    #[test]
    fn test_weight_leading_token() {
        assert_eq!(parse_weight_lbs("200 lbs"), Some(200.0));
        assert_eq!(parse_weight_lbs("150.5 lbs"), Some(150.5));
        assert_eq!(parse_weight_lbs("150"), Some(150.0));
        assert_eq!(parse_weight_lbs("lbs 150"), None);
        assert_eq!(parse_weight_lbs(""), None);
    }
}
