#![warn(clippy::pedantic, clippy::nursery, clippy::cargo, clippy::perf)]

//! # `metrics_buffer_sink`
//!
//! An in-process metrics instrumentation facility. Callers record counters,
//! gauges and timers under a string name; a background worker buffers them
//! and flushes a human-readable report to an output stream, either on a
//! periodic timer (5 seconds by default) or on demand.
//!
//! All buffered state is owned by a single worker task fed through a bounded
//! queue, so recording is safe from any number of concurrent tasks and every
//! flush is an atomic snapshot of the buffers.
//!
//! ```rust,no_run
//! use metrics_buffer_sink::Instrument;
//! use std::time::Instant;
//!
//! #[tokio::main]
//! async fn main() {
//!     let instrument = Instrument::new();
//!
//!     let start = Instant::now();
//!     instrument.counter("requests", 1).await;
//!     instrument.gauge("queue.depth", 3.5).await;
//!     instrument.timer("request.duration", start).await;
//!
//!     // Flushes anything still buffered before terminating the sink.
//!     instrument.shutdown().await;
//! }
//! ```

mod error;
mod instrument;
mod measurement;
mod sink;

pub use error::MetricsError;
pub use instrument::{Instrument, InstrumentBuilder};
pub use measurement::{Counter, Gauge, Measurement, Timer};
pub use sink::{
    BufferedSink, BufferedSinkBuilder, DEFAULT_FLUSH_PERIOD, DEFAULT_QUEUE_CAPACITY, Sink,
};
