use std::time::Duration;

use geiger_traits::{BoxError, EdgeSource, PulseLine};
use rppal::gpio::{Gpio, InputPin, Trigger};
use tracing::{debug, trace};

use crate::PulseEdge;
use crate::error::{HwError, Result};

/// Tube interface output on a Raspberry Pi GPIO pin, using synchronous
/// interrupts so the acquisition thread owns the pin outright.
pub struct GpioPulseInput {
    pin: InputPin,
    edge: PulseEdge,
}

impl GpioPulseInput {
    pub fn new(bcm_pin: u8, edge: PulseEdge) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let pin = gpio
            .get(bcm_pin)
            .map_err(|e| HwError::Gpio(format!("open pulse pin {bcm_pin}: {e}")))?;
        // Tube boards drive an open-collector output; pull toward idle.
        let mut pin = match edge {
            PulseEdge::Falling => pin.into_input_pullup(),
            PulseEdge::Rising => pin.into_input_pulldown(),
        };
        pin.set_interrupt(trigger_for(edge))
            .map_err(|e| HwError::Gpio(e.to_string()))?;
        debug!(bcm_pin, ?edge, "gpio pulse input ready");
        Ok(Self { pin, edge })
    }
}

fn trigger_for(edge: PulseEdge) -> Trigger {
    match edge {
        PulseEdge::Rising => Trigger::RisingEdge,
        PulseEdge::Falling => Trigger::FallingEdge,
    }
}

impl PulseLine for GpioPulseInput {
    fn is_asserted(&self) -> bool {
        match self.edge {
            PulseEdge::Rising => self.pin.is_high(),
            PulseEdge::Falling => self.pin.is_low(),
        }
    }
}

impl EdgeSource for GpioPulseInput {
    fn wait_edge(&mut self, timeout: Duration) -> std::result::Result<bool, BoxError> {
        match self.pin.poll_interrupt(true, Some(timeout)) {
            Ok(Some(level)) => {
                trace!(?level, "gpio edge");
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(e) => Err(Box::new(HwError::Gpio(e.to_string()))),
        }
    }

    fn rearm(&mut self) -> std::result::Result<(), BoxError> {
        self.pin
            .clear_interrupt()
            .map_err(|e| HwError::Gpio(e.to_string()))?;
        self.pin
            .set_interrupt(trigger_for(self.edge))
            .map_err(|e| HwError::Gpio(e.to_string()))?;
        debug!(edge = ?self.edge, "gpio interrupt re-armed");
        Ok(())
    }
}
