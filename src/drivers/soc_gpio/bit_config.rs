use crate::config::{Capabilities, MAX_PORT_BITS};
use crate::drivers::soc_gpio::port::PortDescriptor;
use crate::error::{GpioError, Result};
use crate::mcu::register::{Direction, PinSetup, Pull, Trigger};
use crate::{BIT, BM_IS_SET};

/// Interrupt callback plus the argument it is called with.
#[derive(Clone, Copy, Debug)]
pub struct Handler {
    pub func: fn(usize),
    pub arg: usize,
}

impl Handler {
    pub const fn new(func: fn(usize), arg: usize) -> Self {
        Self { func, arg }
    }

    pub fn call(&self) {
        (self.func)(self.arg)
    }
}

/// Configuration of a single line.
///
/// Attached to a bit as a whole and never edited in place: changing a configured
/// bit means deconfiguring it and configuring it again.
#[derive(Clone, Copy, Debug, Default)]
pub struct BitConfig {
    pub direction: Direction,
    pub pull: Pull,
    pub trigger: Trigger,
    pub debounce: bool,
    /// Synchronise level-sensitive interrupts to the bus clock.
    pub level_sync: bool,
    pub handler: Option<Handler>,
}

impl BitConfig {
    pub fn input() -> Self {
        Self::default()
    }

    pub fn output() -> Self {
        Self { direction: Direction::Output, ..Self::default() }
    }

    /// Input raising `trigger` interrupts delivered to `handler`.
    pub fn interrupt(trigger: Trigger, handler: Handler) -> Self {
        Self { trigger, handler: Some(handler), ..Self::default() }
    }

    pub fn with_pull(mut self, pull: Pull) -> Self {
        self.pull = pull;
        self
    }

    pub fn with_debounce(mut self) -> Self {
        self.debounce = true;
        self
    }

    pub fn with_level_sync(mut self) -> Self {
        self.level_sync = true;
        self
    }

    /// The part of the configuration that goes into hardware.
    pub fn setup(&self) -> PinSetup {
        PinSetup {
            direction: self.direction,
            pull: self.pull,
            trigger: self.trigger,
            debounce: self.debounce,
            level_sync: self.level_sync,
        }
    }

    /// Checks the configuration against what `desc` can do on line `bit`.
    ///
    /// # Rules
    ///
    /// * An interrupt trigger needs an input, the `INTERRUPT` capability and `bit`
    ///   among the port's interrupt lines
    /// * Debounce needs the `DEBOUNCE` capability and an edge trigger
    /// * Level synchronisation needs the `LEVEL_SYNC` capability and a level trigger
    /// * Any pull needs the `PULL` capability
    pub(crate) fn validate(&self, desc: &PortDescriptor, bit: u8) -> Result<()> {
        let caps = desc.capabilities;

        if self.trigger.is_enabled()
            && (self.direction != Direction::Input
                || !caps.contains(Capabilities::INTERRUPT)
                || !BM_IS_SET!(desc.irq_lines, BIT!(bit)))
        {
            return Err(GpioError::InvalidConfig);
        }
        if self.debounce && (!caps.contains(Capabilities::DEBOUNCE) || !self.trigger.is_edge()) {
            return Err(GpioError::InvalidConfig);
        }
        if self.level_sync && (!caps.contains(Capabilities::LEVEL_SYNC) || !self.trigger.is_level()) {
            return Err(GpioError::InvalidConfig);
        }
        if self.pull != Pull::None && !caps.contains(Capabilities::PULL) {
            return Err(GpioError::InvalidConfig);
        }
        Ok(())
    }
}

/// Configuration of a whole port, one mask bit per line for every field.
///
/// A line takes an interrupt when its `interrupt` bit is set. The trigger is then
/// picked from `level`, `both_edges` and `active_high`, in that order.
#[derive(Clone, Copy, Debug, Default)]
pub struct PortConfig {
    pub output: u32,
    pub interrupt: u32,
    pub level: u32,
    pub active_high: u32,
    pub both_edges: u32,
    pub debounce: u32,
    pub level_sync: u32,
    pub pull_up: u32,
    pub pull_down: u32,
    pub handlers: [Option<Handler>; MAX_PORT_BITS],
}

impl PortConfig {
    /// Every line gets `config`.
    pub fn uniform(config: BitConfig) -> Self {
        let all = |on: bool| if on { u32::MAX } else { 0 };
        let trigger = config.trigger;
        Self {
            output: all(config.direction == Direction::Output),
            interrupt: all(trigger.is_enabled()),
            level: all(trigger.is_level()),
            active_high: all(trigger.is_active_high()),
            both_edges: all(trigger == Trigger::BothEdges),
            debounce: all(config.debounce),
            level_sync: all(config.level_sync),
            pull_up: all(config.pull == Pull::Up),
            pull_down: all(config.pull == Pull::Down),
            handlers: [config.handler; MAX_PORT_BITS],
        }
    }

    /// The configuration line `bit` receives from this port configuration.
    pub fn bit_view(&self, bit: u8) -> Result<BitConfig> {
        if usize::from(bit) >= MAX_PORT_BITS {
            return Err(GpioError::InvalidConfig);
        }
        let mask = BIT!(bit);
        let pull = match (BM_IS_SET!(self.pull_up, mask), BM_IS_SET!(self.pull_down, mask)) {
            (true, true) => return Err(GpioError::InvalidConfig),
            (true, false) => Pull::Up,
            (false, true) => Pull::Down,
            (false, false) => Pull::None,
        };

        let active_high = BM_IS_SET!(self.active_high, mask);
        let trigger = if !BM_IS_SET!(self.interrupt, mask) {
            Trigger::None
        } else if BM_IS_SET!(self.level, mask) {
            if active_high { Trigger::LevelHigh } else { Trigger::LevelLow }
        } else if BM_IS_SET!(self.both_edges, mask) {
            Trigger::BothEdges
        } else if active_high {
            Trigger::RisingEdge
        } else {
            Trigger::FallingEdge
        };

        Ok(BitConfig {
            direction: if BM_IS_SET!(self.output, mask) { Direction::Output } else { Direction::Input },
            pull,
            trigger,
            debounce: BM_IS_SET!(self.debounce, mask),
            level_sync: BM_IS_SET!(self.level_sync, mask),
            handler: self.handlers[usize::from(bit)],
        })
    }
}
