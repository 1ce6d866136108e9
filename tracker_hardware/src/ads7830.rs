//! ADS7830 8-bit, 8-channel I2C ADC.

use rppal::i2c::I2c;
use tracker_traits::VoltageSensor;

use crate::error::{HwError, Result};
use crate::util::ads7830_command;

pub struct Ads7830 {
    i2c: I2c,
    address: u16,
    command: u8,
}

impl Ads7830 {
    /// Open the primary I2C bus and address the converter. Presence is only
    /// confirmed by `probe`.
    pub fn new(address: u16, channel: u8) -> Result<Self> {
        let mut i2c = I2c::new().map_err(|e| HwError::I2c(e.to_string()))?;
        i2c.set_slave_address(address)
            .map_err(|e| HwError::I2c(format!("address {address:#04x}: {e}")))?;
        Ok(Self {
            i2c,
            address,
            command: ads7830_command(channel),
        })
    }

    fn read(&mut self) -> Result<u8> {
        let v = self
            .i2c
            .smbus_read_byte(self.command)
            .map_err(|e| HwError::I2c(e.to_string()))?;
        tracing::trace!(raw = v, "ads7830 read");
        Ok(v)
    }
}

impl VoltageSensor for Ads7830 {
    fn probe(&mut self) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        match self.read() {
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::error!(address = self.address, error = %e, "ads7830 probe failed");
                Err(Box::new(HwError::NotDetected {
                    address: self.address,
                }))
            }
        }
    }

    fn read_raw(&mut self) -> std::result::Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        Ok(u16::from(self.read()?))
    }
}
