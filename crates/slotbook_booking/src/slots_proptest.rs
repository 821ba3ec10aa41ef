#[cfg(test)]
mod tests {
    use crate::slots::generate;
    use crate::window::{BusinessZone, CalendarDay, OpenWindow};
    use chrono::{DateTime, Duration};
    use chrono_tz::Tz;
    use proptest::prelude::*;

    fn zone() -> BusinessZone {
        BusinessZone::default()
    }

    fn day() -> CalendarDay {
        CalendarDay::from_ymd(2025, 3, 5).unwrap()
    }

    fn opening() -> DateTime<Tz> {
        zone().at(day(), 6, 0).unwrap()
    }

    // Non-overlapping windows laid out one after another from 06:00
    fn build_windows(layout: &[(i64, i64)]) -> Vec<OpenWindow> {
        let mut cursor = opening();
        let mut windows = Vec::new();
        for (index, (gap, length)) in layout.iter().enumerate() {
            let start = cursor + Duration::minutes(*gap);
            let end = start + Duration::minutes(*length);
            windows.push(OpenWindow::new(zone(), start, end, Some(format!("w{index}"))).unwrap());
            cursor = end;
        }
        windows
    }

    proptest! {
        // A window shorter than the service never yields a slot
        #[test]
        fn test_short_window_yields_nothing(
            duration in 1..240i64,
            shortfall in 1..240i64,
        ) {
            let length = (duration - shortfall).max(0);
            let start = opening();
            let window = OpenWindow::new(zone(), start, start + Duration::minutes(length), None).unwrap();

            prop_assert!(generate(&[window], day(), duration).is_empty());
        }

        // Every slot lies in exactly one window and lasts exactly the duration
        #[test]
        fn test_slots_fit_exactly_one_window(
            layout in prop::collection::vec((0..60i64, 0..150i64), 0..6),
            duration in 1..150i64,
        ) {
            let windows = build_windows(&layout);
            let slots = generate(&windows, day(), duration);

            for slot in &slots {
                prop_assert_eq!(slot.length(), Duration::minutes(duration));
                let containing = windows
                    .iter()
                    .filter(|w| w.start() <= slot.start() && slot.end() <= w.end())
                    .count();
                prop_assert_eq!(containing, 1);
                prop_assert!(windows.iter().any(|w| w.contains(slot)));
            }
        }

        // Starts are strictly increasing, so there are no duplicates
        #[test]
        fn test_slots_strictly_ordered(
            layout in prop::collection::vec((0..60i64, 0..150i64), 0..6),
            duration in 1..150i64,
        ) {
            let mut windows = build_windows(&layout);
            windows.reverse();
            let slots = generate(&windows, day(), duration);

            for pair in slots.windows(2) {
                prop_assert!(pair[0].start() < pair[1].start());
            }
        }

        // Same inputs, same output
        #[test]
        fn test_generation_is_deterministic(
            layout in prop::collection::vec((0..60i64, 0..150i64), 0..6),
            duration in 1..150i64,
        ) {
            let windows = build_windows(&layout);
            let before = windows.clone();

            let first = generate(&windows, day(), duration);
            let second = generate(&windows, day(), duration);

            prop_assert_eq!(first, second);
            prop_assert_eq!(windows, before);
        }
    }
}
