use std::time::Duration;

/// A timed operation, recorded as the elapsed wall-clock duration.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timer {
    pub name: String,
    pub value: Duration,
}

impl Timer {
    #[must_use]
    pub fn new(name: impl Into<String>, value: Duration) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// A count of discrete events.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counter {
    pub name: String,
    pub value: i64,
}

impl Counter {
    #[must_use]
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// A point-in-time sampled value.
///
#[derive(Debug, Clone, PartialEq)]
pub struct Gauge {
    pub name: String,
    pub value: f64,
}

impl Gauge {
    #[must_use]
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// A single named observation handed off to a sink.
///
/// The buffering worker dispatches on the variant to decide which buffer the
/// observation lands in.
///
#[derive(Debug, Clone, PartialEq)]
pub enum Measurement {
    Timer(Timer),
    Counter(Counter),
    Gauge(Gauge),
}

impl From<Timer> for Measurement {
    fn from(timer: Timer) -> Self {
        Self::Timer(timer)
    }
}

impl From<Counter> for Measurement {
    fn from(counter: Counter) -> Self {
        Self::Counter(counter)
    }
}

impl From<Gauge> for Measurement {
    fn from(gauge: Gauge) -> Self {
        Self::Gauge(gauge)
    }
}
