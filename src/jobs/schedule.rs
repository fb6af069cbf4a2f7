use chrono::{DateTime, FixedOffset, Timelike, Utc};

/// Checks if `now` falls inside an inclusive local-hour window
///
/// Hours are evaluated at `utc_offset_hours` from UTC. A job without a
/// window is always active.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use page_harvest::jobs::is_within_active_hours;
///
/// // 02:00 UTC is 09:00 at UTC+7
/// let now = Utc.with_ymd_and_hms(2024, 1, 1, 2, 0, 0).unwrap();
/// assert!(is_within_active_hours(Some([8, 10]), now, 7));
/// assert!(!is_within_active_hours(Some([10, 12]), now, 7));
/// ```
pub fn is_within_active_hours(window: Option<[u32; 2]>, now: DateTime<Utc>, utc_offset_hours: i32) -> bool {
    let Some([start, end]) = window else {
        return true;
    };

    let hour = match FixedOffset::east_opt(utc_offset_hours * 3600) {
        Some(offset) => now.with_timezone(&offset).hour(),
        None => {
            tracing::warn!("Invalid UTC offset {}h, using UTC", utc_offset_hours);
            now.hour()
        }
    };

    (start..=end).contains(&hour)
}
