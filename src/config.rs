use bitflags::bitflags;

#[cfg(not(any(feature = "gpio-32", feature = "gpio-aon")))]
compile_error!("at least one of the `gpio-32` and `gpio-aon` features must be enabled");

// soc gpio 32 bit count
pub const GPIO_32_BITS: u8 = 32;
// soc gpio aon bit count
pub const GPIO_AON_BITS: u8 = 6;

/// Widest port any board can describe; sizes the per-port bit tables.
pub const MAX_PORT_BITS: usize = 32;

bitflags! {
    /// Optional controller features a port implements.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Capabilities: u8 {
        const INTERRUPT = 1 << 0;
        const DEBOUNCE = 1 << 1;
        const PULL = 1 << 2;
        const LEVEL_SYNC = 1 << 3;
    }
}

bitflags! {
    /// Set of processor cores.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct CoreMask: u8 {
        const HOST = 1 << 0;
        const SENSOR = 1 << 1;
    }
}

/// Processor core a driver instance runs on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoreId {
    /// Application core.
    Host,
    /// Sensor subsystem core.
    Sensor,
}

impl CoreId {
    pub fn mask(self) -> CoreMask {
        match self {
            CoreId::Host => CoreMask::HOST,
            CoreId::Sensor => CoreMask::SENSOR,
        }
    }
}

/// Which cores may touch a port, and which of its lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccessPolicy {
    pub cores: CoreMask,
    pub lines: u32,
}

impl AccessPolicy {
    pub const fn new(cores: CoreMask, lines: u32) -> Self {
        Self { cores, lines }
    }

    pub fn permits_core(&self, core: CoreId) -> bool {
        self.cores.contains(core.mask())
    }

    pub fn permits_line(&self, core: CoreId, bit: u8) -> bool {
        self.permits_core(core) && u32::from(bit) < u32::BITS && self.lines & crate::BIT!(bit) != 0
    }
}

/// Whether configuration may be programmed into a clock gated port.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PreEnableConfig {
    /// Configuration calls fail with `Fail` until the port is enabled.
    #[default]
    Reject,
    /// Configuration registers are retained while gated; allow pre-programming.
    Allow,
}

/// What to do with a read of an output bit or a write of an input bit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DirectionPolicy {
    /// Fail with `InvalidConfig`.
    #[default]
    Reject,
    /// Forward to the register port verbatim.
    PassThrough,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DriverPolicy {
    pub pre_enable_config: PreEnableConfig,
    pub direction: DirectionPolicy,
}
