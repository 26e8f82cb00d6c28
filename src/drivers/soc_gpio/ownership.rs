//! Per-port bit ownership ledger.
//!
//! Every slot moves `Free -> Pending -> Configured` when a configuration is applied
//! and `Configured -> Pending -> Free` when it is removed. `Pending` covers the
//! register transaction, which runs outside the critical section; a pending bit is
//! "in use" for configuration and "not configured" for the interrupt relay.
//!
//! Each port has its own table. The critical section is held only for the slot
//! bookkeeping and, for power changes, the single clock transaction.

use core::cell::RefCell;

use critical_section::Mutex;

use crate::common::bit::set_bits;
use crate::config::MAX_PORT_BITS;
use crate::drivers::soc_gpio::bit_config::BitConfig;
use crate::error::{GpioError, Result};
use crate::{BIT, BM_IS_SET, BM_SET};

#[derive(Clone, Copy, Debug, Default)]
pub(crate) enum BitSlot {
    #[default]
    Free,
    Pending,
    Configured(BitConfig),
}

struct Ledger {
    enabled: bool,
    slots: [BitSlot; MAX_PORT_BITS],
}

pub(crate) struct OwnershipTable {
    ledger: Mutex<RefCell<Ledger>>,
}

impl OwnershipTable {
    pub const fn new() -> Self {
        Self {
            ledger: Mutex::new(RefCell::new(Ledger { enabled: false, slots: [BitSlot::Free; MAX_PORT_BITS] })),
        }
    }

    fn with<T>(&self, f: impl FnOnce(&mut Ledger) -> T) -> T {
        critical_section::with(|cs| f(&mut self.ledger.borrow_ref_mut(cs)))
    }

    pub fn is_enabled(&self) -> bool {
        self.with(|ledger| ledger.enabled)
    }

    /// Move the port to `on`, running `transaction` only if that is a change.
    ///
    /// Returns whether a transition happened. On a failed transaction the
    /// recorded state is left alone.
    pub fn switch_power<E>(
        &self,
        on: bool,
        transaction: impl FnOnce() -> core::result::Result<(), E>,
    ) -> core::result::Result<bool, E> {
        self.with(|ledger| {
            if ledger.enabled == on {
                return Ok(false);
            }
            transaction()?;
            ledger.enabled = on;
            Ok(true)
        })
    }

    pub fn slot(&self, bit: u8) -> BitSlot {
        self.with(|ledger| ledger.slots[usize::from(bit)])
    }

    /// Reserve a Free bit for configuration.
    ///
    /// With `require_enabled`, a gated port fails with `Fail` before the slot is
    /// looked at.
    pub fn claim(&self, bit: u8, require_enabled: bool) -> Result<()> {
        self.claim_mask(BIT!(bit), require_enabled)
    }

    /// Reserve every bit in `mask`, or none of them.
    pub fn claim_mask(&self, mask: u32, require_enabled: bool) -> Result<()> {
        self.with(|ledger| {
            if require_enabled && !ledger.enabled {
                return Err(GpioError::Fail);
            }
            let busy = ledger
                .slots
                .iter()
                .enumerate()
                .any(|(bit, slot)| BM_IS_SET!(mask, BIT!(bit)) && !matches!(slot, BitSlot::Free));
            if busy {
                return Err(GpioError::ControllerInUse);
            }
            for (bit, slot) in ledger.slots.iter_mut().enumerate() {
                if BM_IS_SET!(mask, BIT!(bit)) {
                    *slot = BitSlot::Pending;
                }
            }
            Ok(())
        })
    }

    /// Attach `config` to a bit previously claimed.
    pub fn commit(&self, bit: u8, config: BitConfig) {
        self.with(|ledger| ledger.slots[usize::from(bit)] = BitSlot::Configured(config));
    }

    /// Like [`commit`](Self::commit), but with `require_enabled` a port gated
    /// while the bit was Pending fails with `Fail` and the bit stays Pending.
    pub fn try_commit(&self, bit: u8, config: BitConfig, require_enabled: bool) -> Result<()> {
        self.with(|ledger| {
            if require_enabled && !ledger.enabled {
                return Err(GpioError::Fail);
            }
            ledger.slots[usize::from(bit)] = BitSlot::Configured(config);
            Ok(())
        })
    }

    /// Attach `configs[bit]` to every claimed bit of `mask` in one step.
    ///
    /// The power check is the one of [`try_commit`](Self::try_commit); on
    /// failure no bit of `mask` changes.
    pub fn commit_mask(&self, mask: u32, configs: &[BitConfig; MAX_PORT_BITS], require_enabled: bool) -> Result<()> {
        self.with(|ledger| {
            if require_enabled && !ledger.enabled {
                return Err(GpioError::Fail);
            }
            for bit in set_bits(mask) {
                ledger.slots[usize::from(bit)] = BitSlot::Configured(configs[usize::from(bit)]);
            }
            Ok(())
        })
    }

    /// Give back a claimed bit without configuring it.
    pub fn release(&self, bit: u8) {
        self.with(|ledger| ledger.slots[usize::from(bit)] = BitSlot::Free);
    }

    /// Free a bit whose configuration was removed.
    ///
    /// With `require_enabled`, a port gated meanwhile fails with `Fail` and the
    /// bit stays Pending.
    pub fn finish_release(&self, bit: u8, require_enabled: bool) -> Result<()> {
        self.with(|ledger| {
            if require_enabled && !ledger.enabled {
                return Err(GpioError::Fail);
            }
            ledger.slots[usize::from(bit)] = BitSlot::Free;
            Ok(())
        })
    }

    pub fn release_mask(&self, mask: u32) {
        self.with(|ledger| {
            for bit in set_bits(mask) {
                ledger.slots[usize::from(bit)] = BitSlot::Free;
            }
        })
    }

    /// Start removing a bit's configuration.
    ///
    /// Returns `Ok(None)` for a Free bit, `Ok(Some(config))` after moving a
    /// Configured bit to Pending, and `ControllerInUse` for a bit some other
    /// context is working on.
    pub fn begin_release(&self, bit: u8, require_enabled: bool) -> Result<Option<BitConfig>> {
        self.with(|ledger| match ledger.slots[usize::from(bit)] {
            BitSlot::Free => Ok(None),
            BitSlot::Pending => Err(GpioError::ControllerInUse),
            BitSlot::Configured(_) if require_enabled && !ledger.enabled => Err(GpioError::Fail),
            BitSlot::Configured(config) => {
                ledger.slots[usize::from(bit)] = BitSlot::Pending;
                Ok(Some(config))
            }
        })
    }

    /// Bits currently Configured.
    pub fn configured_mask(&self) -> u32 {
        self.with(|ledger| {
            let mut mask = 0;
            for (bit, slot) in ledger.slots.iter().enumerate() {
                if matches!(slot, BitSlot::Configured(_)) {
                    BM_SET!(mask, BIT!(bit));
                }
            }
            mask
        })
    }
}
