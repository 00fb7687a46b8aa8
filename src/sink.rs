use crate::{
    error::MetricsError,
    measurement::{Counter, Gauge, Measurement, Timer},
};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use std::{fmt::Debug, time::Duration};
use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    select,
    sync::{mpsc, oneshot},
    time,
};

/// Interval between periodic flushes unless overridden at construction.
pub const DEFAULT_FLUSH_PERIOD: Duration = Duration::from_secs(5);

/// Capacity of the bounded handoff queue between producers and the worker.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// The capability set of a measurement sink.
///
/// Recording calls are fire-and-forget: they may briefly await queue space
/// when the sink is backed up, but they never return an error. `flush` and
/// `shutdown` complete only once the triggered flush has been written out.
///
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Sink: Debug + Send + Sync {
    /// Records a timer measurement.
    async fn timer(&self, timer: Timer);

    /// Records a counter measurement.
    async fn counter(&self, counter: Counter);

    /// Records a gauge measurement.
    async fn gauge(&self, gauge: Gauge);

    /// Flushes every measurement recorded so far, returning once the report
    /// has been written and the buffers cleared.
    async fn flush(&self);

    /// Stops the periodic flush timer, performs one final flush and
    /// terminates the sink.
    async fn shutdown(&self);
}

#[derive(Debug)]
enum SinkCommand {
    Record(Measurement),
    Flush(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

/// A sink that buffers measurements and flushes a line-oriented report to an
/// output stream, every [`DEFAULT_FLUSH_PERIOD`] and on demand.
///
/// All buffered state is owned by a single worker task; producers hand
/// measurements over through one bounded queue. The worker never interleaves
/// appending and draining, so every flush is an atomic snapshot of the
/// buffers without any locking around them. Because records and flush
/// requests travel through the same queue, a flush issued by a producer
/// always covers everything that producer recorded before it.
///
/// After [`Sink::shutdown`] completes, further recording calls are silently
/// dropped, further flushes return immediately and a repeated shutdown is a
/// logged no-op.
///
#[derive(Debug, Clone)]
pub struct BufferedSink {
    commands: mpsc::Sender<SinkCommand>,
}

impl BufferedSink {
    /// Creates a sink writing to standard output with the default flush
    /// period and queue capacity.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn new() -> Self {
        BufferedSinkBuilder::default().build()
    }

    async fn record(&self, measurement: Measurement) {
        // Awaiting the bounded queue is the backpressure policy: a full
        // queue blocks the producer instead of dropping the measurement.
        if self
            .commands
            .send(SinkCommand::Record(measurement))
            .await
            .is_err()
        {
            log::debug!("sink has shut down, dropping measurement");
        }
    }
}

impl Default for BufferedSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Sink for BufferedSink {
    async fn timer(&self, timer: Timer) {
        self.record(Measurement::Timer(timer)).await;
    }

    async fn counter(&self, counter: Counter) {
        self.record(Measurement::Counter(counter)).await;
    }

    async fn gauge(&self, gauge: Gauge) {
        self.record(Measurement::Gauge(gauge)).await;
    }

    async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self
            .commands
            .send(SinkCommand::Flush(ack))
            .await
            .is_err()
        {
            log::debug!("flush requested on a sink that has shut down");
            return;
        }
        // Acked only after the backlog has been written and cleared.
        let _ = done.await;
    }

    async fn shutdown(&self) {
        let (ack, done) = oneshot::channel();
        if self
            .commands
            .send(SinkCommand::Shutdown(ack))
            .await
            .is_err()
        {
            log::warn!("sink has already shut down");
            return;
        }
        let _ = done.await;
    }
}

/// Builder for [`BufferedSink`].
pub struct BufferedSinkBuilder {
    flush_period: Duration,
    capacity: usize,
    output: Box<dyn AsyncWrite + Send + Unpin>,
}

impl Default for BufferedSinkBuilder {
    fn default() -> Self {
        Self {
            flush_period: DEFAULT_FLUSH_PERIOD,
            capacity: DEFAULT_QUEUE_CAPACITY,
            output: Box::new(tokio::io::stdout()),
        }
    }
}

impl BufferedSinkBuilder {
    /// Sets the interval between periodic flushes.
    #[must_use]
    pub fn flush_period(mut self, flush_period: Duration) -> Self {
        self.flush_period = flush_period;
        self
    }

    /// Sets the capacity of the handoff queue between producers and the
    /// worker.
    #[must_use]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the stream the flush reports are written to.
    #[must_use]
    pub fn output(mut self, output: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        self.output = Box::new(output);
        self
    }

    /// Builds the sink and spawns its worker task.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn build(self) -> BufferedSink {
        let (commands, receiver) = mpsc::channel(self.capacity.max(1));
        let worker = SinkWorker {
            timers: Vec::new(),
            counters: Vec::new(),
            gauges: Vec::new(),
            output: self.output,
        };
        tokio::spawn(worker.run(receiver, self.flush_period));

        BufferedSink { commands }
    }
}

struct SinkWorker {
    timers: Vec<Timer>,
    counters: Vec<Counter>,
    gauges: Vec<Gauge>,
    output: Box<dyn AsyncWrite + Send + Unpin>,
}

impl SinkWorker {
    async fn run(mut self, mut commands: mpsc::Receiver<SinkCommand>, flush_period: Duration) {
        // The first tick is due one full period from now, not immediately.
        let mut ticker = time::interval_at(time::Instant::now() + flush_period, flush_period);

        loop {
            select! {
                command = commands.recv() => match command {
                    Some(SinkCommand::Record(measurement)) => self.receive(measurement),
                    Some(SinkCommand::Flush(ack)) => {
                        self.flush().await;
                        let _ = ack.send(());
                    }
                    Some(SinkCommand::Shutdown(ack)) => {
                        self.flush().await;
                        let _ = ack.send(());
                        break;
                    }
                    // All senders are gone, nothing can arrive anymore.
                    None => {
                        self.flush().await;
                        break;
                    }
                },
                _ = ticker.tick() => self.flush().await,
            }
        }

        log::debug!("measurement sink worker stopped");
    }

    fn receive(&mut self, measurement: Measurement) {
        match measurement {
            Measurement::Timer(timer) => self.timers.push(timer),
            Measurement::Counter(counter) => self.counters.push(counter),
            Measurement::Gauge(gauge) => self.gauges.push(gauge),
        }
    }

    async fn flush(&mut self) {
        if let Err(e) = self.write_report().await {
            log::error!("failed to write measurement report: {e}");
        }
        self.timers.clear();
        self.counters.clear();
        self.gauges.clear();
    }

    // Reported order is timers, then counters, then gauges, insertion order
    // within each kind.
    async fn write_report(&mut self) -> Result<(), MetricsError> {
        let mut report = String::from("flushing measurements\n");
        for timer in &self.timers {
            let millis = timer.value.as_secs_f64() * 1_000.0;
            report.push_str(&format!("{}; type=timer; value={millis}ms\n", timer.name));
        }
        for counter in &self.counters {
            report.push_str(&format!(
                "{}; type=counter; value={}\n",
                counter.name, counter.value
            ));
        }
        for gauge in &self.gauges {
            report.push_str(&format!(
                "{}; type=gauge; value={}\n",
                gauge.name, gauge.value
            ));
        }

        self.output.write_all(report.as_bytes()).await?;
        self.output.flush().await.map_err(Into::into)
    }
}
