use chrono::{DateTime, TimeZone, Utc};
use std::fmt;

/// Quota signal read from a single remote response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateSignal {
    /// Requests left in the current window for this endpoint class
    pub requests_remaining: u64,

    /// When the current window resets
    pub reset_at: DateTime<Utc>,
}

impl RateSignal {
    pub fn new(requests_remaining: u64, reset_at: DateTime<Utc>) -> Self {
        Self {
            requests_remaining,
            reset_at,
        }
    }

    /// Builds a signal from the raw header values
    ///
    /// `reset` is a unix timestamp in seconds. Returns None if either value
    /// is absent or does not parse.
    pub fn from_headers(remaining: Option<&str>, reset: Option<&str>) -> Option<Self> {
        let requests_remaining = remaining?.trim().parse::<u64>().ok()?;
        let reset_secs = reset?.trim().parse::<i64>().ok()?;
        let reset_at = Utc.timestamp_opt(reset_secs, 0).single()?;
        Some(Self::new(requests_remaining, reset_at))
    }
}

/// The three independently rate-limited endpoint classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointClass {
    Search,
    Followers,
    Posts,
}

impl EndpointClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Followers => "followers",
            Self::Posts => "posts",
        }
    }
}

impl fmt::Display for EndpointClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last known quota state for one endpoint class
///
/// `NeverCalled` replaces a separate "first call made" flag: nothing has been
/// observed yet, so there is nothing to throttle against. `Unknown` means a
/// call was made but the response carried no usable quota headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassState {
    #[default]
    NeverCalled,
    Unknown,
    HasSignal(RateSignal),
}

impl ClassState {
    /// Builds the state recorded after a call that returned `signal`
    pub fn observed(signal: Option<RateSignal>) -> Self {
        match signal {
            Some(signal) => Self::HasSignal(signal),
            None => Self::Unknown,
        }
    }

    /// The signal to throttle against, if any
    pub fn signal(&self) -> Option<&RateSignal> {
        match self {
            Self::HasSignal(signal) => Some(signal),
            Self::NeverCalled | Self::Unknown => None,
        }
    }

    pub fn has_been_called(&self) -> bool {
        !matches!(self, Self::NeverCalled)
    }
}
