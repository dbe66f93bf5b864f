//! `HH:MM` reminder time parsing

/// Parse `HH:MM` (24h) into (hour, minute). Single digits are accepted.
pub fn parse_time(value: &str) -> Option<(u32, u32)> {
    let mut parts = value.trim().split(':');
    let hour = parts.next()?.trim().parse::<i64>().ok()?;
    let minute = parts.next()?.trim().parse::<i64>().ok()?;
    if parts.next().is_some() {
        return None;
    }
    if !(0..=23).contains(&hour) || !(0..=59).contains(&minute) {
        return None;
    }
    Some((hour as u32, minute as u32))
}

/// True iff `value` is a valid `HH:MM` time. Never panics.
pub fn validate_time(value: &str) -> bool {
    parse_time(value).is_some()
}

/// Canonical zero-padded form, e.g. `9:5` -> `09:05`
pub fn normalize_time(value: &str) -> Option<String> {
    parse_time(value).map(|(h, m)| format!("{h:02}:{m:02}"))
}
