#[cfg(test)]
mod tests {
    use crate::window::{format_time, upcoming, BusinessZone, CalendarDay, OpenWindow, WindowError};
    use chrono::{Duration, Offset, TimeZone, Utc};

    fn zone() -> BusinessZone {
        BusinessZone::default()
    }

    #[test]
    fn test_day_is_taken_in_business_zone() {
        // 23:30 UTC is already the next day in Prague
        let window =
            OpenWindow::parse(zone(), "2025-03-05T23:30:00Z", "2025-03-06T01:00:00Z", None)
                .unwrap();
        assert_eq!(window.day(), CalendarDay::from_ymd(2025, 3, 6).unwrap());
        assert_eq!(format_time(&window.start()), "00:30");
    }

    #[test]
    fn test_naive_instant_is_local_wall_clock() {
        let instant = zone().parse_instant("2025-07-01T09:00:00").unwrap();
        assert_eq!(instant.offset().fix().local_minus_utc(), 2 * 3600);
        assert_eq!(
            instant.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2025, 7, 1, 7, 0, 0).unwrap()
        );

        let short = zone().parse_instant("2025-01-10T14:15").unwrap();
        assert_eq!(format_time(&short), "14:15");
    }

    #[test]
    fn test_unparseable_instant() {
        assert!(matches!(
            zone().parse_instant("tomorrow at nine"),
            Err(WindowError::TimeParseError(_))
        ));
    }

    #[test]
    fn test_inverted_window_is_rejected() {
        let result =
            OpenWindow::parse(zone(), "2025-03-05T11:00:00+01:00", "2025-03-05T09:00:00+01:00", None);
        assert!(matches!(result, Err(WindowError::InvertedWindow { .. })));
    }

    #[test]
    fn test_window_length_across_dst_start() {
        // Clocks jump from 02:00 to 03:00 on 2025-03-30
        let window = OpenWindow::parse(
            zone(),
            "2025-03-30T01:00:00+01:00",
            "2025-03-30T04:00:00+02:00",
            None,
        )
        .unwrap();
        assert_eq!(window.length(), Duration::hours(2));
        let day = CalendarDay::from_ymd(2025, 3, 30).unwrap();
        assert!(zone().at(day, 2, 30).is_none());
        assert!(zone().at(day, 3, 0).is_some());
    }

    #[test]
    fn test_upcoming_drops_windows_started_before_now() {
        let now = zone().parse_instant("2025-03-05T10:00:00").unwrap();
        let windows = vec![
            OpenWindow::parse(zone(), "2025-03-05T08:00:00", "2025-03-05T12:00:00", None).unwrap(),
            OpenWindow::parse(zone(), "2025-03-05T10:00:00", "2025-03-05T12:00:00", None).unwrap(),
            OpenWindow::parse(zone(), "2025-03-06T09:00:00", "2025-03-06T12:00:00", None).unwrap(),
        ];
        let kept = upcoming(windows, now);

        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|w| w.start() >= now));
    }

    #[test]
    fn test_calendar_day_formats() {
        let day: CalendarDay = "2025-03-05".parse().unwrap();
        assert_eq!(day.to_string(), "2025-03-05");
        assert_eq!(day.display(), "05.03.2025");
        assert_eq!(day.succ().unwrap().to_string(), "2025-03-06");
        assert!(matches!(
            "05.03.2025".parse::<CalendarDay>(),
            Err(WindowError::InvalidDay(_))
        ));
    }

    #[test]
    fn test_zone_by_name() {
        assert!(BusinessZone::from_name("Europe/Prague").is_ok());
        assert_eq!(
            BusinessZone::from_name("Mars/Olympus"),
            Err(WindowError::UnknownTimeZone("Mars/Olympus".to_string()))
        );
    }
}
