use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("invalid retention configuration: {0}")]
    InvalidConfig(String),
    #[error("{0}")]
    Message(String),
}

pub type MetricsResult<T> = Result<T, MetricsError>;

impl From<&'static str> for MetricsError {
    fn from(value: &'static str) -> Self {
        MetricsError::Message(value.to_owned())
    }
}

impl From<String> for MetricsError {
    fn from(value: String) -> Self {
        MetricsError::Message(value)
    }
}
