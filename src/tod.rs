//! Time-of-Day rendering of timer timestamps.
//!
//! Vola timers record absolute times as microseconds since the Unix epoch.
//! The report shows them as a wall-clock time of day in UTC, with four
//! digits of sub-second precision.

const MICROS_PER_SEC: u64 = 1_000_000;
const SECS_PER_DAY: u64 = 86_400;

/// Format microseconds since the Unix epoch as a ToD string like
/// `"10h17:07.3180"`.
///
/// The hour of day carries no leading zero; minutes and seconds are
/// zero-padded. The fraction is the first four digits of the
/// microsecond-of-second remainder, truncated — `.31809` microseconds
/// render as `.3180`, never `.3181`.
pub fn format_tod(micros: u64) -> String {
    let second_of_day = (micros / MICROS_PER_SEC) % SECS_PER_DAY;
    let hour = second_of_day / 3600;
    let minute = (second_of_day % 3600) / 60;
    let second = second_of_day % 60;
    // First 4 digits of the 6-digit microsecond remainder.
    let frac = (micros % MICROS_PER_SEC) / 100;
    format!("{hour}h{minute:02}:{second:02}.{frac:04}")
}
