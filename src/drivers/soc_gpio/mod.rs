//! GPIO driver core.
//!
//! [`Gpio`] owns a frozen [`PortRegistry`] and answers every request against it:
//! the port is resolved first, then the calling core's access, then the bit's
//! slot in the port's ownership table. Register transactions go through the
//! port's [`RegisterPort`].
//!
//! The operations are split by concern:
//!
//! * [`engine`] configures and deconfigures bits and whole ports
//! * [`power`] gates and ungates port clocks
//! * [`io`] reads and writes data
//! * [`irq`] relays interrupt events to the registered handlers

pub mod bit_config;
pub mod engine;
pub mod io;
pub mod irq;
pub mod ownership;
pub mod port;
pub mod power;

use crate::config::{CoreId, DriverPolicy, PreEnableConfig};
use crate::drivers::soc_gpio::bit_config::BitConfig;
use crate::drivers::soc_gpio::ownership::BitSlot;
use crate::drivers::soc_gpio::port::{Port, PortId, PortRegistry};
use crate::error::{GpioError, Result};
use crate::mcu::register::RegisterPort;

pub struct Gpio<R> {
    registry: PortRegistry<R>,
    core: CoreId,
    policy: DriverPolicy,
}

impl<R: RegisterPort> Gpio<R> {
    /// Driver instance for `core` over `registry`.
    ///
    /// Ports start disabled with every bit Free.
    pub fn new(registry: PortRegistry<R>, core: CoreId, policy: DriverPolicy) -> Self {
        log::debug!("gpio: driver up on {:?}, {} port(s)", core, registry.iter().count());
        Self { registry, core, policy }
    }

    pub fn core(&self) -> CoreId {
        self.core
    }

    pub fn policy(&self) -> DriverPolicy {
        self.policy
    }

    pub fn registry(&self) -> &PortRegistry<R> {
        &self.registry
    }

    /// Port `id`, if this core may reach it.
    fn port(&self, id: PortId) -> Result<&Port<R>> {
        let port = self.registry.lookup(id)?;
        if !port.descriptor().access.permits_core(self.core) {
            return Err(GpioError::ControllerNotAccessible);
        }
        Ok(port)
    }

    /// Port `id` for an operation on line `bit`.
    fn line(&self, id: PortId, bit: u8) -> Result<&Port<R>> {
        let port = self.port(id)?;
        if bit >= port.descriptor().bit_width {
            return Err(GpioError::InvalidConfig);
        }
        if !port.descriptor().access.permits_line(self.core, bit) {
            return Err(GpioError::ControllerNotAccessible);
        }
        Ok(port)
    }

    /// Port `id` for an operation touching every line.
    fn whole_port(&self, id: PortId) -> Result<&Port<R>> {
        let port = self.port(id)?;
        let desc = port.descriptor();
        if desc.access.lines & desc.width_mask() != desc.width_mask() {
            return Err(GpioError::ControllerNotAccessible);
        }
        Ok(port)
    }

    /// Whether configuration calls need the port clocked.
    fn config_needs_clock(&self) -> bool {
        self.policy.pre_enable_config == PreEnableConfig::Reject
    }

    pub fn is_enabled(&self, id: PortId) -> Result<bool> {
        Ok(self.port(id)?.table.is_enabled())
    }

    /// A bit whose configuration is still being applied or removed does not count.
    pub fn is_configured(&self, id: PortId, bit: u8) -> Result<bool> {
        Ok(self.bit_config(id, bit)?.is_some())
    }

    pub fn configured_mask(&self, id: PortId) -> Result<u32> {
        Ok(self.port(id)?.table.configured_mask())
    }

    pub fn bit_config(&self, id: PortId, bit: u8) -> Result<Option<BitConfig>> {
        match self.line(id, bit)?.table.slot(bit) {
            BitSlot::Configured(config) => Ok(Some(config)),
            BitSlot::Free | BitSlot::Pending => Ok(None),
        }
    }
}
