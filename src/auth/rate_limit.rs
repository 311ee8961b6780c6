use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::clock::SharedClock;
use crate::config::RateLimitSettings;

/// Subject key used for callers without a verified identity.
pub const UNAUTHENTICATED: &str = "unauthenticated";

/// Rate-limiting bucket derived from a JSON-RPC method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointClass {
    Resources,
    Tools,
}

impl EndpointClass {
    /// `resources/*` counts against resources, everything else against tools.
    pub fn for_method(method: &str) -> Self {
        if method.starts_with("resources/") {
            Self::Resources
        } else {
            Self::Tools
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resources => "resources",
            Self::Tools => "tools",
        }
    }
}

/// One fixed counting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    pub count: u32,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
}

impl RateWindow {
    fn open(now: DateTime<Utc>, length: Duration) -> Self {
        Self {
            count: 1,
            window_start: now,
            window_end: now + length,
        }
    }
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

impl RateDecision {
    /// Whole seconds until the window resets, never less than one.
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> u64 {
        let millis = (self.reset_at - now).num_milliseconds().max(0) as u64;
        millis.div_ceil(1000).max(1)
    }
}

/// Fixed-window request counter keyed by `subject:endpoint-class`.
///
/// Each check is a single update-or-create under the map's per-key lock, so
/// concurrent requests for one key observe a strictly increasing count.
pub struct RateLimiter {
    windows: DashMap<String, RateWindow>,
    settings: RateLimitSettings,
    clock: SharedClock,
}

impl RateLimiter {
    pub fn new(settings: RateLimitSettings, clock: SharedClock) -> Self {
        Self {
            windows: DashMap::new(),
            settings,
            clock,
        }
    }

    /// Count one request for `subject` (or an anonymous caller) and decide
    /// whether it is admitted.
    pub fn is_allowed(&self, subject: Option<&str>, class: EndpointClass) -> RateDecision {
        let subject_key = subject.unwrap_or(UNAUTHENTICATED);
        let limit = self.limit_for(subject, class);
        let now = self.clock.now();
        let length = Duration::minutes(self.settings.window_minutes);

        let window = match self.windows.entry(format!("{subject_key}:{}", class.as_str())) {
            Entry::Occupied(mut occupied) => {
                let window = occupied.get_mut();
                if now >= window.window_end {
                    *window = RateWindow::open(now, length);
                } else {
                    window.count = window.count.saturating_add(1);
                }
                *window
            }
            Entry::Vacant(vacant) => *vacant.insert(RateWindow::open(now, length)),
        };

        RateDecision {
            allowed: window.count <= limit,
            limit,
            remaining: limit.saturating_sub(window.count),
            reset_at: window.window_end,
        }
    }

    /// Current window for a key, if one exists.
    pub fn window(&self, subject: Option<&str>, class: EndpointClass) -> Option<RateWindow> {
        let key = format!("{}:{}", subject.unwrap_or(UNAUTHENTICATED), class.as_str());
        self.windows.get(&key).map(|w| *w)
    }

    fn limit_for(&self, subject: Option<&str>, class: EndpointClass) -> u32 {
        match (subject, class) {
            (None, _) => self.settings.unauthenticated_limit,
            (Some(_), EndpointClass::Resources) => self.settings.resources_limit,
            (Some(_), EndpointClass::Tools) => self.settings.tools_limit,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}
