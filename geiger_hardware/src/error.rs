use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("invalid simulated rate: {0} cpm")]
    InvalidRate(f64),
    #[error("unreadable thermal value: {0:?}")]
    Thermal(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
