use crate::{
    error::MetricsError,
    measurement::{Counter, Gauge, Timer},
    sink::{BufferedSink, Sink},
};
use std::{sync::Arc, time::Instant};

/// Ergonomic recording facade over a [`Sink`] capability.
///
/// Cloning is cheap; clones share the same underlying sink.
///
#[derive(Debug, Clone)]
pub struct Instrument {
    sink: Arc<dyn Sink>,
}

impl Instrument {
    /// Creates an instrument backed by a default [`BufferedSink`]: recorded
    /// measurements are printed to standard output every 5 seconds.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sink: Arc::new(BufferedSink::new()),
        }
    }

    /// Records a counter measurement with the given name and value.
    pub async fn counter(&self, name: &str, value: i64) {
        self.sink.counter(Counter::new(name, value)).await;
    }

    /// Records a gauge measurement with the given name and value.
    pub async fn gauge(&self, name: &str, value: f64) {
        self.sink.gauge(Gauge::new(name, value)).await;
    }

    /// Records a timer measurement with the given name and the time elapsed
    /// since `start`.
    pub async fn timer(&self, name: &str, start: Instant) {
        self.sink.timer(Timer::new(name, start.elapsed())).await;
    }

    /// Shuts the underlying sink down, flushing anything still buffered.
    pub async fn shutdown(&self) {
        self.sink.shutdown().await;
    }
}

impl Default for Instrument {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for an [`Instrument`] over a caller-supplied sink.
#[derive(Debug, Default)]
pub struct InstrumentBuilder {
    sink: Option<Arc<dyn Sink>>,
}

impl InstrumentBuilder {
    /// Sets the sink measurements are recorded to.
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Builds the instrument.
    ///
    /// # Errors
    /// Returns [`MetricsError::MissingSink`] if no sink was configured.
    pub fn build(self) -> Result<Instrument, MetricsError> {
        let sink = self.sink.ok_or(MetricsError::MissingSink)?;

        Ok(Instrument { sink })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MockSink;
    use std::time::Duration;
    use tokio::time;

    #[tokio::test]
    async fn test_counter_is_forwarded_to_the_sink() {
        let mut sink = MockSink::new();
        sink.expect_counter()
            .withf(|counter| counter == &Counter::new("requests", 1))
            .times(1)
            .return_const(());
        let instrument = InstrumentBuilder::default()
            .sink(Arc::new(sink))
            .build()
            .unwrap();

        instrument.counter("requests", 1).await;
    }

    #[tokio::test]
    async fn test_gauge_is_forwarded_to_the_sink() {
        let mut sink = MockSink::new();
        sink.expect_gauge()
            .withf(|gauge| gauge == &Gauge::new("temp", 21.5))
            .times(1)
            .return_const(());
        let instrument = InstrumentBuilder::default()
            .sink(Arc::new(sink))
            .build()
            .unwrap();

        instrument.gauge("temp", 21.5).await;
    }

    #[tokio::test]
    async fn test_timer_records_the_elapsed_time() {
        let mut sink = MockSink::new();
        sink.expect_timer()
            .withf(|timer| {
                timer.name == "request.duration" && timer.value >= Duration::from_millis(50)
            })
            .times(1)
            .return_const(());
        let instrument = InstrumentBuilder::default()
            .sink(Arc::new(sink))
            .build()
            .unwrap();

        let start = Instant::now();
        time::sleep(Duration::from_millis(50)).await;
        instrument.timer("request.duration", start).await;
    }

    #[tokio::test]
    async fn test_shutdown_is_forwarded_to_the_sink() {
        let mut sink = MockSink::new();
        sink.expect_shutdown().times(1).return_const(());
        let instrument = InstrumentBuilder::default()
            .sink(Arc::new(sink))
            .build()
            .unwrap();

        instrument.shutdown().await;
    }

    #[test]
    fn test_build_without_sink_fails() {
        let result = InstrumentBuilder::default().build();

        assert!(matches!(result, Err(MetricsError::MissingSink)));
    }
}
