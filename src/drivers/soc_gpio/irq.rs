//! Interrupt relay.
//!
//! The handler of a line is copied out of the ownership table under the port's
//! critical section and called after it is released. Events for lines that are
//! Free, still being configured, or configured without a trigger or handler are
//! dropped. Nothing is queued.
//!
//! The driver does not hook itself into an interrupt controller. The platform's
//! GPIO interrupt handler calls [`Gpio::service_interrupt`] for the port, or
//! [`Gpio::notify`] per line if it already demultiplexes the status itself.

use crate::common::bit::set_bits;
use crate::drivers::soc_gpio::bit_config::BitConfig;
use crate::drivers::soc_gpio::ownership::BitSlot;
use crate::drivers::soc_gpio::port::PortId;
use crate::drivers::soc_gpio::Gpio;
use crate::error::{GpioError, Result};
use crate::mcu::register::RegisterPort;

impl<R: RegisterPort> Gpio<R> {
    /// Deliver one event on line `bit` of port `id`.
    ///
    /// Returns whether a handler ran.
    pub fn notify(&self, id: PortId, bit: u8) -> bool {
        let Ok(port) = self.registry.lookup(id) else {
            log::trace!("gpio: event on unknown port {:?} dropped", id);
            return false;
        };
        if bit >= port.descriptor().bit_width {
            log::trace!("gpio: event on {:?}[{}] out of range", id, bit);
            return false;
        }

        match port.table.slot(bit) {
            BitSlot::Configured(BitConfig { trigger, handler: Some(handler), .. }) if trigger.is_enabled() => {
                handler.call();
                true
            }
            _ => {
                log::trace!("gpio: event on {:?}[{}] dropped", id, bit);
                false
            }
        }
    }

    /// Interrupt service entry for port `id`.
    ///
    /// Reads the pending lines, acknowledges them and relays each one, lowest
    /// line first. Returns the mask of lines seen.
    pub fn service_interrupt(&self, id: PortId) -> Result<u32> {
        let port = self.port(id)?;
        if !port.table.is_enabled() {
            return Err(GpioError::Fail);
        }

        let pending = port.regs().pending_interrupts()? & port.descriptor().irq_lines;
        if pending == 0 {
            return Ok(0);
        }
        port.regs().clear_interrupts(pending)?;

        for bit in set_bits(pending) {
            self.notify(id, bit);
        }
        Ok(pending)
    }
}
