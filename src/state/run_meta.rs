use chrono::{DateTime, SecondsFormat, Utc};

/// Singleton marker describing the latest harvest run
///
/// `last_start` is the watermark downstream consumers compare against
/// `record_created` to find records inserted by the latest run. `status`
/// only becomes true once the bulk write of that run has committed.
#[derive(Debug, Clone, PartialEq)]
pub struct RunMeta {
    pub last_start: Option<DateTime<Utc>>,
    pub status: bool,
}

impl RunMeta {
    /// State of a store that has never been harvested into
    pub fn new() -> Self {
        Self {
            last_start: None,
            status: false,
        }
    }

    /// Marks the start of a run at `now`
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.last_start = Some(now);
        self.status = false;
    }

    /// Marks the run as successfully committed
    pub fn finish(&mut self) {
        self.status = true;
    }
}

impl Default for RunMeta {
    fn default() -> Self {
        Self::new()
    }
}

/// Formats a timestamp with fixed precision so stored values sort lexically
pub fn to_db_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses a timestamp written by [`to_db_timestamp`]
pub fn from_db_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
