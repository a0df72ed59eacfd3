use chrono::{DateTime, Utc};

/// Source of the current time, injectable so window logic is testable
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
