//! Simulated GPIO register block.
//!
//! `SimPort` models one DesignWare APB style GPIO port with plain atomics so it can
//! stand in for hardware on the host and be shared between threads. Configuration
//! registers keep their contents while the clock is gated; the data path and the
//! interrupt status registers fail with [`RegisterFault::ClockGated`].
//!
//! Faults can be injected per operation class (and optionally per bit) to drive
//! the error paths of the core.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use bitflags::bitflags;

use crate::error::RegisterFault;
use crate::mcu::register::{Direction, PinSetup, Pull, RegisterPort, Trigger};
use crate::{BIT, BM_IS_SET};

const ANY_BIT: u32 = u32::MAX;

bitflags! {
    /// Operation classes that can be made to fail.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct SimFault: u32 {
        const CONFIGURE = 1 << 0;
        const RESET = 1 << 1;
        const READ = 1 << 2;
        const WRITE = 1 << 3;
        const CLOCK = 1 << 4;
        const IRQ = 1 << 5;
    }
}

pub struct SimPort {
    dr: AtomicU32,
    ddr: AtomicU32,
    ext: AtomicU32,
    inten: AtomicU32,
    intmask: AtomicU32,
    edge: AtomicU32,
    polarity: AtomicU32,
    bothedge: AtomicU32,
    debounce: AtomicU32,
    ls_sync: AtomicU32,
    pull_up: AtomicU32,
    pull_down: AtomicU32,
    raw_status: AtomicU32,
    gated: AtomicBool,
    clock_transactions: AtomicU32,
    accesses: AtomicU32,
    faults: AtomicU32,
    fault_bit: AtomicU32,
}

macro_rules! sim_reg {
    ( $($x:ident),* ) => {
        paste::paste! {
            impl SimPort {
                $(
                    pub fn [<read_ $x>](&self) -> u32 {
                        self.$x.load(Ordering::SeqCst)
                    }
                )*
            }
        }
    };
}

sim_reg!(dr, ddr, ext, inten, intmask, edge, polarity, bothedge, debounce, ls_sync, pull_up, pull_down, raw_status);

fn assign(reg: &AtomicU32, bit: u8, on: bool) {
    if on {
        reg.fetch_or(BIT!(bit), Ordering::SeqCst);
    } else {
        reg.fetch_and(!BIT!(bit), Ordering::SeqCst);
    }
}

impl SimPort {
    /// A port in its power-on state: clock gated, every line an input.
    pub const fn new() -> Self {
        Self {
            dr: AtomicU32::new(0),
            ddr: AtomicU32::new(0),
            ext: AtomicU32::new(0),
            inten: AtomicU32::new(0),
            intmask: AtomicU32::new(0),
            edge: AtomicU32::new(0),
            polarity: AtomicU32::new(0),
            bothedge: AtomicU32::new(0),
            debounce: AtomicU32::new(0),
            ls_sync: AtomicU32::new(0),
            pull_up: AtomicU32::new(0),
            pull_down: AtomicU32::new(0),
            raw_status: AtomicU32::new(0),
            gated: AtomicBool::new(true),
            clock_transactions: AtomicU32::new(0),
            accesses: AtomicU32::new(0),
            faults: AtomicU32::new(0),
            fault_bit: AtomicU32::new(ANY_BIT),
        }
    }

    pub fn is_gated(&self) -> bool {
        self.gated.load(Ordering::SeqCst)
    }

    /// Number of gate/ungate transactions performed so far.
    pub fn clock_transactions(&self) -> u32 {
        self.clock_transactions.load(Ordering::SeqCst)
    }

    /// Number of data path and interrupt status accesses attempted, failed ones included.
    pub fn accesses(&self) -> u32 {
        self.accesses.load(Ordering::SeqCst)
    }

    /// Make every operation in `faults` fail with a bus error.
    pub fn inject(&self, faults: SimFault) {
        self.fault_bit.store(ANY_BIT, Ordering::SeqCst);
        self.faults.store(faults.bits(), Ordering::SeqCst);
    }

    /// Like [`inject`](Self::inject) but only for operations addressing `bit`.
    pub fn inject_on_bit(&self, faults: SimFault, bit: u8) {
        self.fault_bit.store(bit as u32, Ordering::SeqCst);
        self.faults.store(faults.bits(), Ordering::SeqCst);
    }

    pub fn clear_faults(&self) {
        self.faults.store(0, Ordering::SeqCst);
        self.fault_bit.store(ANY_BIT, Ordering::SeqCst);
    }

    /// Drive the external level of an input line.
    pub fn drive(&self, bit: u8, level: bool) {
        assign(&self.ext, bit, level);
    }

    /// Signal an event on `bit`. Latched only if the line has its interrupt enabled.
    pub fn raise(&self, bit: u8) -> bool {
        if !BM_IS_SET!(self.read_inten(), BIT!(bit)) {
            return false;
        }
        self.raw_status.fetch_or(BIT!(bit), Ordering::SeqCst);
        true
    }

    /// Level seen on the pins: outputs reflect the data register, inputs the outside world.
    fn pins(&self) -> u32 {
        let ddr = self.read_ddr();
        (self.read_dr() & ddr) | (self.read_ext() & !ddr)
    }

    fn check(&self, op: SimFault, bit: Option<u8>) -> Result<(), RegisterFault> {
        let faults = SimFault::from_bits_truncate(self.faults.load(Ordering::SeqCst));
        if !faults.contains(op) {
            return Ok(());
        }
        let fault_bit = self.fault_bit.load(Ordering::SeqCst);
        match bit {
            _ if fault_bit == ANY_BIT => Err(RegisterFault::Bus),
            Some(bit) if bit as u32 == fault_bit => Err(RegisterFault::Bus),
            _ => Ok(()),
        }
    }

    fn data_path(&self, op: SimFault, bit: Option<u8>) -> Result<(), RegisterFault> {
        self.accesses.fetch_add(1, Ordering::SeqCst);
        self.check(op, bit)?;
        if self.is_gated() {
            return Err(RegisterFault::ClockGated);
        }
        Ok(())
    }
}

impl Default for SimPort {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterPort for SimPort {
    fn configure_bit(&self, bit: u8, setup: PinSetup) -> Result<(), RegisterFault> {
        self.check(SimFault::CONFIGURE, Some(bit))?;
        assign(&self.ddr, bit, setup.direction == Direction::Output);
        assign(&self.pull_up, bit, setup.pull == Pull::Up);
        assign(&self.pull_down, bit, setup.pull == Pull::Down);
        assign(&self.edge, bit, setup.trigger.is_edge());
        assign(&self.polarity, bit, setup.trigger.is_active_high());
        assign(&self.bothedge, bit, setup.trigger == Trigger::BothEdges);
        assign(&self.debounce, bit, setup.debounce);
        assign(&self.ls_sync, bit, setup.level_sync);
        assign(&self.intmask, bit, false);
        assign(&self.inten, bit, setup.trigger.is_enabled());
        Ok(())
    }

    fn reset_bit(&self, bit: u8) -> Result<(), RegisterFault> {
        self.check(SimFault::RESET, Some(bit))?;
        for reg in [
            &self.inten,
            &self.raw_status,
            &self.intmask,
            &self.edge,
            &self.polarity,
            &self.bothedge,
            &self.debounce,
            &self.ls_sync,
            &self.pull_up,
            &self.pull_down,
            &self.ddr,
            &self.dr,
        ] {
            assign(reg, bit, false);
        }
        Ok(())
    }

    fn read_bit(&self, bit: u8) -> Result<bool, RegisterFault> {
        self.data_path(SimFault::READ, Some(bit))?;
        Ok(BM_IS_SET!(self.pins(), BIT!(bit)))
    }

    fn write_bit(&self, bit: u8, value: bool) -> Result<(), RegisterFault> {
        self.data_path(SimFault::WRITE, Some(bit))?;
        assign(&self.dr, bit, value);
        Ok(())
    }

    fn read_word(&self) -> Result<u32, RegisterFault> {
        self.data_path(SimFault::READ, None)?;
        Ok(self.pins())
    }

    fn write_word(&self, value: u32) -> Result<(), RegisterFault> {
        self.data_path(SimFault::WRITE, None)?;
        self.dr.store(value, Ordering::SeqCst);
        Ok(())
    }

    fn gate_clock(&self) -> Result<(), RegisterFault> {
        self.check(SimFault::CLOCK, None)?;
        self.clock_transactions.fetch_add(1, Ordering::SeqCst);
        self.gated.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn ungate_clock(&self) -> Result<(), RegisterFault> {
        self.check(SimFault::CLOCK, None)?;
        self.clock_transactions.fetch_add(1, Ordering::SeqCst);
        self.gated.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn pending_interrupts(&self) -> Result<u32, RegisterFault> {
        self.data_path(SimFault::IRQ, None)?;
        Ok(self.read_raw_status() & self.read_inten() & !self.read_intmask())
    }

    fn clear_interrupts(&self, mask: u32) -> Result<(), RegisterFault> {
        self.data_path(SimFault::IRQ, None)?;
        self.raw_status.fetch_and(!mask, Ordering::SeqCst);
        Ok(())
    }
}
