use chrono::{DateTime, Timelike, Utc};

/// Is `now_utc`, shifted by a fixed offset into local time, inside the
/// half-open daily window `[start_minute, end_minute)`?
///
/// Minutes count from local midnight. Pure on its inputs so gating rules
/// are testable without touching the wall clock.
pub fn is_within_window(
    now_utc: DateTime<Utc>,
    tz_offset_minutes: i32,
    start_minute: u32,
    end_minute: u32,
) -> bool {
    let local = now_utc + chrono::Duration::minutes(tz_offset_minutes as i64);
    let minute_of_day = local.hour() * 60 + local.minute();
    minute_of_day >= start_minute && minute_of_day < end_minute
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const IST: i32 = 330;
    const PAYMENT_START: u32 = 10 * 60;
    const PAYMENT_END: u32 = 11 * 60;

    fn utc(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, h, m, 0).unwrap()
    }

    #[test]
    fn payment_allowed_at_half_past_ten_ist() {
        // 05:00 UTC == 10:30 IST
        assert!(is_within_window(utc(5, 0), IST, PAYMENT_START, PAYMENT_END));
    }

    #[test]
    fn payment_rejected_at_five_past_eleven_ist() {
        // 05:35 UTC == 11:05 IST
        assert!(!is_within_window(utc(5, 35), IST, PAYMENT_START, PAYMENT_END));
    }

    #[test]
    fn window_start_is_inclusive() {
        // 04:30 UTC == 10:00 IST
        assert!(is_within_window(utc(4, 30), IST, PAYMENT_START, PAYMENT_END));
    }

    #[test]
    fn window_end_is_exclusive() {
        // 05:30 UTC == 11:00 IST
        assert!(!is_within_window(utc(5, 30), IST, PAYMENT_START, PAYMENT_END));
    }

    #[test]
    fn offset_can_cross_midnight() {
        // 23:00 UTC + 5:30 == 04:30 IST the next day
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 23, 0, 0).unwrap();
        assert!(!is_within_window(now, IST, PAYMENT_START, PAYMENT_END));
        assert!(is_within_window(now, IST, 4 * 60, 5 * 60));
    }

    #[test]
    fn mobile_window_spans_ten_to_one() {
        // 07:15 UTC == 12:45 IST
        assert!(is_within_window(utc(7, 15), IST, 600, 780));
        // 07:45 UTC == 13:15 IST
        assert!(!is_within_window(utc(7, 45), IST, 600, 780));
    }

    #[test]
    fn negative_offset() {
        // 15:00 UTC == 10:00 UTC-5
        assert!(is_within_window(utc(15, 0), -300, PAYMENT_START, PAYMENT_END));
    }
}
