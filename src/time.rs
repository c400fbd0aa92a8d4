use crate::error::PlannerError;

/// Minutes in a day; valid start times are `0..MINUTES_PER_DAY`.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Parse a wall-clock `HH:MM` (24-hour, zero padded) into minutes since midnight
pub fn to_minutes(time: &str) -> Result<u32, PlannerError> {
    let invalid = || PlannerError::InvalidFormat(format!("Invalid time '{}': expected HH:MM", time));

    let (hours, minutes) = time.split_once(':').ok_or_else(invalid)?;
    if hours.len() != 2 || minutes.len() != 2 {
        return Err(invalid());
    }
    if !hours.bytes().chain(minutes.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let hours: u32 = hours.parse().map_err(|_| invalid())?;
    let minutes: u32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    Ok(hours * 60 + minutes)
}

/// Format minutes since midnight back into `HH:MM`
pub fn format_minutes(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Half-open interval overlap test on `[start, start + duration)`.
/// A zero-length interval never overlaps anything.
pub fn overlaps(start_a: u32, dur_a: u32, start_b: u32, dur_b: u32) -> bool {
    if dur_a == 0 || dur_b == 0 {
        return false;
    }
    let (start_a, dur_a, start_b, dur_b) = (start_a as u64, dur_a as u64, start_b as u64, dur_b as u64);
    start_a < start_b + dur_b && start_b < start_a + dur_a
}

/// A parsed start time plus duration, both in minutes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    pub start: u32,
    pub duration: u32,
}

impl TimeSlot {
    pub fn parse(start_time: &str, duration: u32) -> Result<Self, PlannerError> {
        Ok(Self {
            start: to_minutes(start_time)?,
            duration,
        })
    }

    /// Exclusive end, may run past midnight
    pub fn end(&self) -> u64 {
        self.start as u64 + self.duration as u64
    }

    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        overlaps(self.start, self.duration, other.start, other.duration)
    }
}
