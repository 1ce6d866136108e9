//! H-bridge motor outputs on Raspberry Pi GPIO.

use std::time::Duration;

use rppal::gpio::{Gpio, OutputPin};
use tracker_traits::{Actuator, Axis, Direction};

use crate::error::{HwError, Result};
use crate::util::{HBridge, board_to_bcm, duty_fraction, timed_drive};

/// Physical header pins of one motor channel.
#[derive(Debug, Clone, Copy)]
pub struct MotorPins {
    pub in1: u8,
    pub in2: u8,
    pub enable: u8,
}

struct Channel {
    in1: OutputPin,
    in2: OutputPin,
    enable: OutputPin,
    duty: f64,
}

impl Channel {
    fn open(gpio: &Gpio, pins: MotorPins, duty_pct: u8) -> Result<Self> {
        let out = |board: u8| -> Result<OutputPin> {
            let bcm = board_to_bcm(board).ok_or(HwError::InvalidPin(board))?;
            let pin = gpio
                .get(bcm)
                .map_err(|e| HwError::Gpio(format!("open pin {board} (GPIO{bcm}): {e}")))?;
            Ok(pin.into_output_low())
        };
        Ok(Self {
            in1: out(pins.in1)?,
            in2: out(pins.in2)?,
            enable: out(pins.enable)?,
            duty: duty_fraction(duty_pct),
        })
    }

    fn polarity(&mut self, direction: Direction) {
        match direction {
            Direction::Forward => {
                self.in1.set_high();
                self.in2.set_low();
            }
            Direction::Reverse => {
                self.in1.set_low();
                self.in2.set_high();
            }
            Direction::Stop => {
                self.in1.set_low();
                self.in2.set_low();
            }
        }
    }

    fn set_duty(&mut self, frequency_hz: f64, duty: f64) -> Result<()> {
        self.enable
            .set_pwm_frequency(frequency_hz, duty)
            .map_err(|e| HwError::Pwm(e.to_string()))
    }
}

/// Two-axis actuator: IN1/IN2 set the polarity, software PWM on the enable
/// pin sets the speed.
pub struct GpioActuator {
    yaw: Channel,
    pitch: Channel,
    pwm_frequency_hz: f64,
}

impl GpioActuator {
    pub fn new(
        yaw: MotorPins,
        yaw_duty_pct: u8,
        pitch: MotorPins,
        pitch_duty_pct: u8,
        pwm_frequency_hz: f64,
    ) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let mut me = Self {
            yaw: Channel::open(&gpio, yaw, yaw_duty_pct)?,
            pitch: Channel::open(&gpio, pitch, pitch_duty_pct)?,
            pwm_frequency_hz,
        };
        // PWM runs at 0 % until a move is requested
        for axis in Axis::ALL {
            me.zero(axis)?;
        }
        tracing::info!(?yaw, ?pitch, pwm_frequency_hz, "gpio actuator ready");
        Ok(me)
    }

    fn channel(&mut self, axis: Axis) -> &mut Channel {
        match axis {
            Axis::Yaw => &mut self.yaw,
            Axis::Pitch => &mut self.pitch,
        }
    }

    fn zero(&mut self, axis: Axis) -> Result<()> {
        let f = self.pwm_frequency_hz;
        let ch = self.channel(axis);
        ch.polarity(Direction::Stop);
        ch.set_duty(f, 0.0)
    }
}

impl HBridge for GpioActuator {
    fn energize(&mut self, axis: Axis, direction: Direction) -> Result<()> {
        let f = self.pwm_frequency_hz;
        let ch = self.channel(axis);
        ch.polarity(direction);
        let duty = ch.duty;
        ch.set_duty(f, duty)
    }

    fn deenergize(&mut self, axis: Axis) -> Result<()> {
        self.zero(axis)
    }
}

impl Actuator for GpioActuator {
    fn drive(
        &mut self,
        axis: Axis,
        direction: Direction,
        duration: Duration,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        timed_drive(self, axis, direction, duration, std::thread::sleep)?;
        Ok(())
    }

    fn idle(&mut self, axis: Axis) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.zero(axis)?;
        Ok(())
    }

    fn release(&mut self) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        for axis in Axis::ALL {
            let ch = self.channel(axis);
            ch.polarity(Direction::Stop);
            ch.enable
                .clear_pwm()
                .map_err(|e| HwError::Pwm(e.to_string()))?;
            ch.enable.set_low();
        }
        tracing::info!("gpio actuator released");
        Ok(())
    }
}
