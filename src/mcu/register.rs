//! Register capability consumed by the GPIO core.
//!
//! The core never touches memory-mapped registers itself. Each port is handed a
//! [`RegisterPort`] at registry construction, and every hardware transaction goes
//! through it. A platform crate implements the trait over its register map; the
//! [`sim`](super::sim) module implements it over plain atomics for host testing.
//!
//! Implementations must make each method a single, bounded transaction. Port-wide
//! accesses (`read_word`/`write_word`) must be atomic against each other; the core
//! adds no locking around the data path.

use crate::error::RegisterFault;

/// Pin direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Input,
    Output,
}

/// Pull resistor selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Pull {
    #[default]
    None,
    Up,
    Down,
}

/// Interrupt trigger policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Trigger {
    #[default]
    None,
    RisingEdge,
    FallingEdge,
    BothEdges,
    LevelHigh,
    LevelLow,
}

impl Trigger {
    pub fn is_enabled(self) -> bool {
        self != Trigger::None
    }

    pub fn is_edge(self) -> bool {
        matches!(self, Trigger::RisingEdge | Trigger::FallingEdge | Trigger::BothEdges)
    }

    pub fn is_level(self) -> bool {
        matches!(self, Trigger::LevelHigh | Trigger::LevelLow)
    }

    /// Polarity bit as the controller expects it: rising edge or active high.
    pub fn is_active_high(self) -> bool {
        matches!(self, Trigger::RisingEdge | Trigger::LevelHigh)
    }
}

/// Electrical and interrupt setup of one line, as programmed into hardware.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PinSetup {
    pub direction: Direction,
    pub pull: Pull,
    pub trigger: Trigger,
    pub debounce: bool,
    pub level_sync: bool,
}

/// Register transactions for one GPIO port.
///
/// Bit indices passed in are always below the port width; the core checks bounds
/// before calling.
pub trait RegisterPort {
    /// Program direction, pull, and interrupt settings of `bit`.
    fn configure_bit(&self, bit: u8, setup: PinSetup) -> Result<(), RegisterFault>;

    /// Return `bit` to its reset state: input, no pull, interrupt disabled and masked.
    fn reset_bit(&self, bit: u8) -> Result<(), RegisterFault>;

    fn read_bit(&self, bit: u8) -> Result<bool, RegisterFault>;

    fn write_bit(&self, bit: u8, value: bool) -> Result<(), RegisterFault>;

    fn read_word(&self) -> Result<u32, RegisterFault>;

    fn write_word(&self, value: u32) -> Result<(), RegisterFault>;

    /// Stop the port clock.
    fn gate_clock(&self) -> Result<(), RegisterFault>;

    /// Start the port clock.
    fn ungate_clock(&self) -> Result<(), RegisterFault>;

    /// Masked interrupt status; one bit per line with an event to deliver.
    fn pending_interrupts(&self) -> Result<u32, RegisterFault>;

    /// Acknowledge (end-of-interrupt) the lines in `mask`.
    fn clear_interrupts(&self, mask: u32) -> Result<(), RegisterFault>;
}

impl<T: RegisterPort + ?Sized> RegisterPort for &T {
    fn configure_bit(&self, bit: u8, setup: PinSetup) -> Result<(), RegisterFault> {
        (**self).configure_bit(bit, setup)
    }

    fn reset_bit(&self, bit: u8) -> Result<(), RegisterFault> {
        (**self).reset_bit(bit)
    }

    fn read_bit(&self, bit: u8) -> Result<bool, RegisterFault> {
        (**self).read_bit(bit)
    }

    fn write_bit(&self, bit: u8, value: bool) -> Result<(), RegisterFault> {
        (**self).write_bit(bit, value)
    }

    fn read_word(&self) -> Result<u32, RegisterFault> {
        (**self).read_word()
    }

    fn write_word(&self, value: u32) -> Result<(), RegisterFault> {
        (**self).write_word(value)
    }

    fn gate_clock(&self) -> Result<(), RegisterFault> {
        (**self).gate_clock()
    }

    fn ungate_clock(&self) -> Result<(), RegisterFault> {
        (**self).ungate_clock()
    }

    fn pending_interrupts(&self) -> Result<u32, RegisterFault> {
        (**self).pending_interrupts()
    }

    fn clear_interrupts(&self, mask: u32) -> Result<(), RegisterFault> {
        (**self).clear_interrupts(mask)
    }
}
