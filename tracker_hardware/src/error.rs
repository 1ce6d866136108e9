use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("pwm error: {0}")]
    Pwm(String),
    #[error("i2c error: {0}")]
    I2c(String),
    #[error("ADC not detected at I2C address {address:#04x}")]
    NotDetected { address: u16 },
    #[error("invalid pin: physical pin {0} is not a GPIO")]
    InvalidPin(u8),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
