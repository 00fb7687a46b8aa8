use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("no sink was configured for the instrument")]
    MissingSink,
    #[error("failed to write flush report: {0}")]
    Io(#[from] std::io::Error),
}
