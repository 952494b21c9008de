use burrow_lib::rules::validate_recurrence;
use burrow_lib::time::{days_after, days_before};
use proptest::prelude::*;

// 2024-01-01T00:00:00Z
const DTSTART: i64 = 1_704_067_200_000;

proptest! {
    #[test]
    fn bounded_daily_rules_validate(interval in 1u32..=365, count in 1u32..=64) {
        let rule = format!("FREQ=DAILY;INTERVAL={interval};COUNT={count}");
        prop_assert!(validate_recurrence(&rule, DTSTART).is_ok());
    }

    #[test]
    fn weekly_rules_validate(interval in 1u32..=52) {
        let rule = format!("FREQ=WEEKLY;INTERVAL={interval}");
        prop_assert!(validate_recurrence(&rule, DTSTART).is_ok());
    }

    #[test]
    fn garbage_frequencies_are_rejected(word in "[A-Z]{4,12}") {
        prop_assume!(!matches!(
            word.as_str(),
            "SECONDLY" | "MINUTELY" | "HOURLY" | "DAILY" | "WEEKLY" | "MONTHLY" | "YEARLY"
        ));
        let rule = format!("FREQ={word}");
        prop_assert!(validate_recurrence(&rule, DTSTART).is_err());
    }

    #[test]
    fn lead_time_offsets_invert(base in 0i64..=4_102_444_800_000, days in 0i64..=10_000) {
        prop_assert_eq!(days_after(days_before(base, days), days), base);
    }
}
