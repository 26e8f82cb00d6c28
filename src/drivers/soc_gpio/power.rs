use crate::drivers::soc_gpio::port::PortId;
use crate::drivers::soc_gpio::Gpio;
use crate::error::Result;
use crate::mcu::register::RegisterPort;

impl<R: RegisterPort> Gpio<R> {
    /// Ungate the clock of port `id`. Enabling an enabled port does nothing.
    pub fn enable(&self, id: PortId) -> Result<()> {
        let port = self.port(id)?;
        if port.table.switch_power(true, || port.regs().ungate_clock())? {
            log::debug!("gpio: {:?} enabled", id);
        }
        Ok(())
    }

    /// Gate the clock of port `id`.
    ///
    /// Configured bits stay Configured; enabling the port again brings them
    /// back without another `set_config`.
    pub fn disable(&self, id: PortId) -> Result<()> {
        let port = self.port(id)?;
        if port.table.switch_power(false, || port.regs().gate_clock())? {
            log::debug!("gpio: {:?} disabled, {:#010x} stay configured", id, port.table.configured_mask());
        }
        Ok(())
    }
}
