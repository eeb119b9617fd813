#[cfg(test)]
mod tests {
    use crate::logic::{generate_slots, mark_unavailable, CLOSE_HOUR, OPEN_HOUR};
    use bodyshop_common::services::CalendarEntry;
    use chrono::{DateTime, Duration, NaiveDate, TimeZone, Timelike, Utc};
    use chrono_tz::America::New_York;
    use chrono_tz::Tz;
    use proptest::prelude::*;

    fn local_hour(slot_start: &str, tz: Tz) -> u32 {
        DateTime::parse_from_rfc3339(slot_start)
            .expect("slot start is RFC 3339")
            .with_timezone(&tz)
            .hour()
    }

    fn event_at(date: NaiveDate, hour: u32, minute: u32) -> CalendarEntry {
        let start = New_York
            .from_local_datetime(&date.and_hms_opt(hour, minute, 0).unwrap())
            .earliest()
            .unwrap()
            .fixed_offset();
        CalendarEntry {
            id: format!("evt_{}_{}", hour, minute),
            summary: None,
            start: Some(start),
            end: Some(start + Duration::minutes(30)),
        }
    }

    proptest! {
        // Slot count, hour range and the no-past-slot rule for arbitrary days and clocks
        #[test]
        fn test_slots_within_business_hours(
            day_offset in 0..730i64,
            now_offset_minutes in -2880..2880i64,
        ) {
            let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + Duration::days(day_offset);
            let noon = New_York
                .from_local_datetime(&date.and_hms_opt(12, 0, 0).unwrap())
                .earliest()
                .unwrap()
                .with_timezone(&Utc);
            let now = noon + Duration::minutes(now_offset_minutes);

            let slots = generate_slots(date, now, New_York);

            prop_assert!(slots.len() <= (CLOSE_HOUR - OPEN_HOUR) as usize);
            for slot in &slots {
                let hour = local_hour(&slot.start_time, New_York);
                prop_assert!((OPEN_HOUR..CLOSE_HOUR).contains(&hour));
                let start = DateTime::parse_from_rfc3339(&slot.start_time).unwrap();
                let end = DateTime::parse_from_rfc3339(&slot.end_time).unwrap();
                prop_assert!(start.with_timezone(&Utc) >= now);
                prop_assert_eq!(end - start, Duration::hours(1));
                prop_assert!(slot.available);
            }
            // Hours strictly increasing and contiguous up to the close
            let hours: Vec<u32> = slots.iter().map(|s| local_hour(&s.start_time, New_York)).collect();
            for pair in hours.windows(2) {
                prop_assert_eq!(pair[1], pair[0] + 1);
            }
            if let Some(last) = hours.last() {
                prop_assert_eq!(*last, CLOSE_HOUR - 1);
            }
        }

        // A slot is unavailable iff some event starts within its hour
        #[test]
        fn test_hour_bucket_conflicts(
            day_offset in 0..365i64,
            events in proptest::collection::vec((0u32..24, 0u32..60), 0..6),
        ) {
            let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + Duration::days(day_offset);
            let before = DateTime::<Utc>::from_naive_utc_and_offset(
                (date - Duration::days(1)).and_hms_opt(0, 0, 0).unwrap(),
                Utc,
            );
            let entries: Vec<CalendarEntry> = events
                .iter()
                .filter(|(hour, _)| *hour != 2) // skip the DST gap hour
                .map(|(hour, minute)| event_at(date, *hour, *minute))
                .collect();
            let mut slots = generate_slots(date, before, New_York);

            mark_unavailable(&mut slots, &entries, date, New_York);

            for slot in &slots {
                let hour = local_hour(&slot.start_time, New_York);
                let busy = entries
                    .iter()
                    .any(|e| e.start.unwrap().with_timezone(&New_York).hour() == hour);
                prop_assert_eq!(slot.available, !busy);
            }
        }
    }
}
