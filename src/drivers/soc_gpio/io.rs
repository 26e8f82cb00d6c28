//! Data path.
//!
//! Single line accesses need the port enabled and the line Configured in the
//! matching direction. Port accesses need the port enabled and every line
//! reachable. None of them take the ownership lock beyond the state checks; the
//! register port alone orders concurrent data accesses, and a port access is not
//! atomic against a concurrent single line access unless the register port makes
//! it so.

use crate::config::DirectionPolicy;
use crate::drivers::soc_gpio::ownership::BitSlot;
use crate::drivers::soc_gpio::port::{Port, PortId};
use crate::drivers::soc_gpio::Gpio;
use crate::error::{GpioError, Result};
use crate::mcu::register::{Direction, RegisterPort};

impl<R: RegisterPort> Gpio<R> {
    /// Port of a line that may move data in `direction`.
    fn data_line(&self, id: PortId, bit: u8, direction: Direction) -> Result<&Port<R>> {
        let port = self.line(id, bit)?;
        if !port.table.is_enabled() {
            return Err(GpioError::Fail);
        }
        let config = match port.table.slot(bit) {
            BitSlot::Configured(config) => config,
            BitSlot::Free | BitSlot::Pending => return Err(GpioError::InvalidConfig),
        };
        if config.direction != direction && self.policy.direction == DirectionPolicy::Reject {
            return Err(GpioError::InvalidConfig);
        }
        Ok(port)
    }

    pub fn read(&self, id: PortId, bit: u8) -> Result<bool> {
        let port = self.data_line(id, bit, Direction::Input)?;
        Ok(port.regs().read_bit(bit)?)
    }

    pub fn write(&self, id: PortId, bit: u8, value: bool) -> Result<()> {
        let port = self.data_line(id, bit, Direction::Output)?;
        Ok(port.regs().write_bit(bit, value)?)
    }

    /// Every line of port `id`, masked to the port width.
    pub fn read_port(&self, id: PortId) -> Result<u32> {
        let port = self.whole_port(id)?;
        if !port.table.is_enabled() {
            return Err(GpioError::Fail);
        }
        Ok(port.regs().read_word()? & port.descriptor().width_mask())
    }

    /// Write the data register of port `id`.
    ///
    /// Bits above the port width are rejected with `InvalidConfig`. Lines not
    /// configured as outputs take the value in the data register only.
    pub fn write_port(&self, id: PortId, value: u32) -> Result<()> {
        let port = self.whole_port(id)?;
        if value & !port.descriptor().width_mask() != 0 {
            return Err(GpioError::InvalidConfig);
        }
        if !port.table.is_enabled() {
            return Err(GpioError::Fail);
        }
        Ok(port.regs().write_word(value)?)
    }
}
