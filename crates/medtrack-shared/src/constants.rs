/// Application name
pub const APP_NAME: &str = "MedTrack";

/// Default HTTP API port (server)
pub const DEFAULT_HTTP_PORT: u16 = 5000;

/// Number of calendar days, inclusive of today, in the adherence window
pub const ADHERENCE_WINDOW_DAYS: i64 = 7;

/// Upper bound on insights returned by a single generation
pub const MAX_INSIGHTS: usize = 3;

/// Maximum insight message length in characters
pub const MAX_INSIGHT_MESSAGE_CHARS: usize = 100;

/// Wire format of a scheduled time of day
pub const TIME_FORMAT: &str = "%H:%M";

/// Wire format of a calendar date
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Default chat model used for insight generation
pub const DEFAULT_AI_MODEL: &str = "gpt-4o";
