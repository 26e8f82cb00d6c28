use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive;

use crate::common::bit::mask_len;
use crate::config::{AccessPolicy, Capabilities, CoreMask, MAX_PORT_BITS};
use crate::drivers::soc_gpio::ownership::OwnershipTable;
use crate::error::{GpioError, Result};
use crate::mcu::register::RegisterPort;

/// Port list
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum PortId {
    /// 32 line SoC port.
    #[cfg(feature = "gpio-32")]
    Gpio32,
    /// Always-on port.
    #[cfg(feature = "gpio-aon")]
    Aon,
}

/// Number of port variants in this build. Also the first invalid raw port number.
pub const PORT_COUNT: usize = cfg!(feature = "gpio-32") as usize + cfg!(feature = "gpio-aon") as usize;

impl PortId {
    #[cfg(all(feature = "gpio-32", feature = "gpio-aon"))]
    pub const ALL: [PortId; PORT_COUNT] = [PortId::Gpio32, PortId::Aon];
    #[cfg(all(feature = "gpio-32", not(feature = "gpio-aon")))]
    pub const ALL: [PortId; PORT_COUNT] = [PortId::Gpio32];
    #[cfg(all(not(feature = "gpio-32"), feature = "gpio-aon"))]
    pub const ALL: [PortId; PORT_COUNT] = [PortId::Aon];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<u8> for PortId {
    type Error = GpioError;

    fn try_from(raw: u8) -> Result<Self> {
        PortId::from_u8(raw).ok_or(GpioError::DeviceTypeNotSupported)
    }
}

/// Static description of one port on a board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PortDescriptor {
    pub id: PortId,
    pub bit_width: u8,
    pub capabilities: Capabilities,
    /// Lines able to raise an interrupt.
    pub irq_lines: u32,
    pub access: AccessPolicy,
}

impl PortDescriptor {
    /// Descriptor with every line interrupt capable and reachable from every core.
    pub fn new(id: PortId, bit_width: u8, capabilities: Capabilities) -> Self {
        let all = mask_len(u32::from(bit_width));
        Self {
            id,
            bit_width,
            capabilities,
            irq_lines: all,
            access: AccessPolicy::new(CoreMask::all(), all),
        }
    }

    pub fn with_irq_lines(mut self, irq_lines: u32) -> Self {
        self.irq_lines = irq_lines;
        self
    }

    pub fn with_access(mut self, access: AccessPolicy) -> Self {
        self.access = access;
        self
    }

    /// Mask covering every line of the port.
    pub fn width_mask(&self) -> u32 {
        mask_len(u32::from(self.bit_width))
    }

    #[cfg(feature = "gpio-32")]
    pub fn soc_gpio_32() -> Self {
        Self::new(PortId::Gpio32, crate::config::GPIO_32_BITS, Capabilities::all())
    }

    /// The always-on port is reachable from the host core only.
    #[cfg(feature = "gpio-aon")]
    pub fn soc_gpio_aon() -> Self {
        let desc = Self::new(
            PortId::Aon,
            crate::config::GPIO_AON_BITS,
            Capabilities::INTERRUPT | Capabilities::DEBOUNCE | Capabilities::LEVEL_SYNC,
        );
        desc.with_access(AccessPolicy::new(CoreMask::HOST, desc.width_mask()))
    }
}

/// Registry entry: descriptor, register handle and the port's ownership table.
pub struct Port<R> {
    desc: PortDescriptor,
    regs: R,
    pub(crate) table: OwnershipTable,
}

impl<R: RegisterPort> Port<R> {
    pub fn descriptor(&self) -> &PortDescriptor {
        &self.desc
    }

    pub fn regs(&self) -> &R {
        &self.regs
    }
}

/// Fixed table of the ports known to this driver instance.
///
/// Built once, then frozen into a [`Gpio`](super::Gpio); lookups never mutate it.
pub struct PortRegistry<R> {
    ports: [Option<Port<R>>; PORT_COUNT],
}

impl<R: RegisterPort> PortRegistry<R> {
    pub fn new() -> Self {
        Self { ports: core::array::from_fn(|_| None) }
    }

    /// Add (or replace) the entry for `desc.id`.
    ///
    /// Widths above [`MAX_PORT_BITS`] are clamped; the ownership table cannot track more.
    pub fn with_port(mut self, mut desc: PortDescriptor, regs: R) -> Self {
        if usize::from(desc.bit_width) > MAX_PORT_BITS {
            log::warn!("gpio: {:?} width {} clamped to {}", desc.id, desc.bit_width, MAX_PORT_BITS);
            desc.bit_width = MAX_PORT_BITS as u8;
        }
        desc.irq_lines &= desc.width_mask();
        self.ports[desc.id.index()] = Some(Port { desc, regs, table: OwnershipTable::new() });
        self
    }

    pub fn lookup(&self, id: PortId) -> Result<&Port<R>> {
        self.ports
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(GpioError::DeviceTypeNotSupported)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Port<R>> {
        self.ports.iter().flatten()
    }
}

impl<R: RegisterPort> Default for PortRegistry<R> {
    fn default() -> Self {
        Self::new()
    }
}
