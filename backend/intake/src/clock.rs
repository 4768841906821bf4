use chrono::{DateTime, Utc};

/// Source of the "now" that relative expressions are resolved against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReferenceClock {
    #[default]
    System,
    /// Every request sees the same instant. Useful for demos and tests.
    Pinned(DateTime<Utc>),
}

impl ReferenceClock {
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Self::System => Utc::now(),
            Self::Pinned(instant) => *instant,
        }
    }
}

impl From<Option<DateTime<Utc>>> for ReferenceClock {
    fn from(pinned: Option<DateTime<Utc>>) -> Self {
        pinned.map_or(Self::System, Self::Pinned)
    }
}
