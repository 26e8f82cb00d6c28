use crate::common::bit::set_bits;
use crate::config::MAX_PORT_BITS;
use crate::drivers::soc_gpio::bit_config::{BitConfig, PortConfig};
use crate::drivers::soc_gpio::port::{Port, PortId};
use crate::drivers::soc_gpio::Gpio;
use crate::error::{GpioError, PortDeconfigError, Result};
use crate::mcu::register::RegisterPort;
use crate::BIT_RNG;

impl<R: RegisterPort> Gpio<R> {
    /// Attaches `config` to line `bit` of port `id` and programs it.
    ///
    /// # Parameters
    ///
    /// * `id` - Port holding the line
    /// * `bit` - Line index, below the port width
    /// * `config` - Direction, pull, trigger and handler for the line
    ///
    /// # Algorithm
    ///
    /// 1. Resolve the port and check the calling core may reach `bit`
    /// 2. Claim the slot; a bit that is not Free fails `ControllerInUse`
    /// 3. Validate `config` against the port's capabilities
    /// 4. Program the register port outside the critical section
    /// 5. Commit the slot as Configured
    ///
    /// # Notes
    ///
    /// * A failed step after the claim hands the slot back Free, so a rejected
    ///   or failed call leaves no trace in the ownership table
    /// * Under `PreEnableConfig::Reject` a gated port fails with `Fail`, also
    ///   when it is gated while the line is being programmed; the line is then
    ///   reset and released
    pub fn set_config(&self, id: PortId, bit: u8, config: BitConfig) -> Result<()> {
        let port = self.line(id, bit)?;
        let needs_clock = self.config_needs_clock();
        port.table.claim(bit, needs_clock)?;

        if let Err(err) = config.validate(port.descriptor(), bit) {
            port.table.release(bit);
            return Err(err);
        }

        if let Err(fault) = port.regs().configure_bit(bit, config.setup()) {
            // whatever part of the setup landed must not outlive the claim
            self.undo(id, port, bit);
            port.table.release(bit);
            return Err(fault.into());
        }

        if let Err(err) = port.table.try_commit(bit, config, needs_clock) {
            log::warn!("gpio: {:?} gated while configuring line {}", id, bit);
            self.undo(id, port, bit);
            port.table.release(bit);
            return Err(err);
        }

        log::debug!("gpio: {:?}[{}] configured {:?}", id, bit, config.setup());
        Ok(())
    }

    /// Removes the configuration of line `bit`, returning it to its reset state.
    ///
    /// Deconfiguring a Free bit succeeds without touching hardware. If the reset
    /// transaction fails the bit stays Configured with its old configuration.
    /// A port gated while the reset runs fails with `Fail` under
    /// `PreEnableConfig::Reject`, after the old configuration is programmed back.
    pub fn deconfig(&self, id: PortId, bit: u8) -> Result<()> {
        let port = self.line(id, bit)?;
        let needs_clock = self.config_needs_clock();
        let Some(config) = port.table.begin_release(bit, needs_clock)? else {
            return Ok(());
        };

        if let Err(fault) = port.regs().reset_bit(bit) {
            port.table.commit(bit, config);
            return Err(fault.into());
        }

        if let Err(err) = port.table.finish_release(bit, needs_clock) {
            log::warn!("gpio: {:?} gated while releasing line {}", id, bit);
            self.restore(id, port, bit, config);
            return Err(err);
        }

        log::debug!("gpio: {:?}[{}] released", id, bit);
        Ok(())
    }

    /// Configures every line of port `id` from `config` in one batch.
    ///
    /// # Parameters
    ///
    /// * `id` - Port to configure; the calling core must reach all its lines
    /// * `config` - Per-line masks; bits above the port width are ignored
    ///
    /// # Algorithm
    ///
    /// 1. Claim every line at once; any line not Free fails `ControllerInUse`
    ///    and nothing is claimed
    /// 2. Build and validate each line's view of `config`; the first invalid
    ///    line fails `InvalidConfig` before any register is written
    /// 3. Program the lines in order
    /// 4. Commit all lines together
    ///
    /// # Notes
    ///
    /// * A register fault in step 3 resets the lines already programmed and
    ///   releases the whole batch, so the port is never left half configured
    /// * Under `PreEnableConfig::Reject` a port gated before step 4 fails with
    ///   `Fail`; every line is reset and the batch released
    pub fn set_port_config(&self, id: PortId, config: &PortConfig) -> Result<()> {
        let port = self.whole_port(id)?;
        let desc = port.descriptor();
        let lines = desc.width_mask();
        let needs_clock = self.config_needs_clock();

        port.table.claim_mask(lines, needs_clock)?;

        let mut views = [BitConfig::default(); MAX_PORT_BITS];
        for bit in set_bits(lines) {
            let view = config.bit_view(bit).and_then(|view| view.validate(desc, bit).map(|()| view));
            match view {
                Ok(view) => views[usize::from(bit)] = view,
                Err(err) => {
                    port.table.release_mask(lines);
                    return Err(err);
                }
            }
        }

        for bit in set_bits(lines) {
            if let Err(fault) = port.regs().configure_bit(bit, views[usize::from(bit)].setup()) {
                for done in set_bits(lines & BIT_RNG!(0, u32::from(bit))) {
                    self.undo(id, port, done);
                }
                port.table.release_mask(lines);
                return Err(fault.into());
            }
        }

        if let Err(err) = port.table.commit_mask(lines, &views, needs_clock) {
            log::warn!("gpio: {:?} gated while configuring as a port", id);
            for bit in set_bits(lines) {
                self.undo(id, port, bit);
            }
            port.table.release_mask(lines);
            return Err(err);
        }

        log::debug!("gpio: {:?} configured as a port, lines {:#010x}", id, lines);
        Ok(())
    }

    /// Deconfigures every line of port `id`.
    ///
    /// Free lines are skipped, as are lines another context is configuring at
    /// the same time. On a register fault the lines handled so far stay Free,
    /// the failing line keeps its configuration, and the error carries the mask
    /// of lines still Configured. A port gated part way under
    /// `PreEnableConfig::Reject` stops the same way.
    pub fn port_deconfig(&self, id: PortId) -> core::result::Result<(), PortDeconfigError> {
        let port = self.whole_port(id)?;
        let needs_clock = self.config_needs_clock();

        if needs_clock && !port.table.is_enabled() && port.table.configured_mask() != 0 {
            return Err(GpioError::Fail.into());
        }

        for bit in set_bits(port.descriptor().width_mask()) {
            let config = match port.table.begin_release(bit, needs_clock) {
                Ok(Some(config)) => config,
                Ok(None) | Err(GpioError::ControllerInUse) => continue,
                Err(_) => return Err(self.partial(id, port.table.configured_mask())),
            };
            if let Err(fault) = port.regs().reset_bit(bit) {
                port.table.commit(bit, config);
                log::warn!("gpio: {:?}[{}] reset failed: {}", id, bit, fault);
                return Err(self.partial(id, port.table.configured_mask()));
            }
            if port.table.finish_release(bit, needs_clock).is_err() {
                self.restore(id, port, bit, config);
                return Err(self.partial(id, port.table.configured_mask()));
            }
        }

        log::debug!("gpio: {:?} released as a port", id);
        Ok(())
    }

    fn partial(&self, id: PortId, remaining: u32) -> PortDeconfigError {
        log::warn!("gpio: {:?} deconfiguration stopped, {:#010x} still configured", id, remaining);
        PortDeconfigError::Partial { remaining }
    }

    /// Best-effort reset of a line whose configuration is being abandoned.
    fn undo(&self, id: PortId, port: &Port<R>, bit: u8) {
        if let Err(fault) = port.regs().reset_bit(bit) {
            log::warn!("gpio: {:?}[{}] rollback reset failed: {}", id, bit, fault);
        }
    }

    /// Program `config` back into a Pending line and commit it.
    ///
    /// If that fails the line is at its reset state and is released Free.
    fn restore(&self, id: PortId, port: &Port<R>, bit: u8, config: BitConfig) {
        match port.regs().configure_bit(bit, config.setup()) {
            Ok(()) => port.table.commit(bit, config),
            Err(fault) => {
                log::warn!("gpio: {:?}[{}] restore failed, line left at reset: {}", id, bit, fault);
                port.table.release(bit);
            }
        }
    }
}

#[cfg(test)]
#[cfg(feature = "gpio-32")]
mod tests {
    use super::*;
    use crate::config::{CoreId, DriverPolicy, PreEnableConfig};
    use crate::drivers::soc_gpio::bit_config::Handler;
    use crate::drivers::soc_gpio::port::{PortDescriptor, PortRegistry};
    use crate::drivers::soc_gpio::tests::{sim_gpio_32, MockPort};
    use crate::error::RegisterFault;
    use crate::mcu::register::{Direction, PinSetup, Pull, Trigger};
    use crate::mcu::sim::{SimFault, SimPort};
    use crate::BIT;
    use core::sync::atomic::{AtomicBool, Ordering};
    use mry::Any;
    use std::sync::Barrier;

    fn nop(_: usize) {}

    /// Simulated port whose next configure or reset waits twice on `gate`:
    /// once on arrival, once before it goes on.
    struct StallPort {
        sim: SimPort,
        armed: AtomicBool,
        gate: Barrier,
    }

    impl StallPort {
        fn new() -> Self {
            Self { sim: SimPort::new(), armed: AtomicBool::new(false), gate: Barrier::new(2) }
        }

        fn arm(&self) {
            self.armed.store(true, Ordering::SeqCst);
        }

        fn stall(&self) {
            if self.armed.swap(false, Ordering::SeqCst) {
                self.gate.wait();
                self.gate.wait();
            }
        }
    }

    impl RegisterPort for StallPort {
        fn configure_bit(&self, bit: u8, setup: PinSetup) -> core::result::Result<(), RegisterFault> {
            self.stall();
            self.sim.configure_bit(bit, setup)
        }

        fn reset_bit(&self, bit: u8) -> core::result::Result<(), RegisterFault> {
            self.stall();
            self.sim.reset_bit(bit)
        }

        fn read_bit(&self, bit: u8) -> core::result::Result<bool, RegisterFault> {
            self.sim.read_bit(bit)
        }

        fn write_bit(&self, bit: u8, value: bool) -> core::result::Result<(), RegisterFault> {
            self.sim.write_bit(bit, value)
        }

        fn read_word(&self) -> core::result::Result<u32, RegisterFault> {
            self.sim.read_word()
        }

        fn write_word(&self, value: u32) -> core::result::Result<(), RegisterFault> {
            self.sim.write_word(value)
        }

        fn gate_clock(&self) -> core::result::Result<(), RegisterFault> {
            self.sim.gate_clock()
        }

        fn ungate_clock(&self) -> core::result::Result<(), RegisterFault> {
            self.sim.ungate_clock()
        }

        fn pending_interrupts(&self) -> core::result::Result<u32, RegisterFault> {
            self.sim.pending_interrupts()
        }

        fn clear_interrupts(&self, mask: u32) -> core::result::Result<(), RegisterFault> {
            self.sim.clear_interrupts(mask)
        }
    }

    fn stall_gpio(port: &StallPort) -> Gpio<&StallPort> {
        let registry = PortRegistry::new().with_port(PortDescriptor::soc_gpio_32(), port);
        let gpio = Gpio::new(registry, CoreId::Host, DriverPolicy::default());
        gpio.enable(PortId::Gpio32).unwrap();
        gpio
    }

    /// Runs `op` on another thread and disables the port while `op` is parked in
    /// its first armed register transaction.
    fn disable_during<T: Send>(gpio: &Gpio<&StallPort>, port: &StallPort, op: impl FnOnce() -> T + Send) -> T {
        port.arm();
        std::thread::scope(|s| {
            let worker = s.spawn(op);
            port.gate.wait();
            gpio.disable(PortId::Gpio32).unwrap();
            port.gate.wait();
            worker.join().unwrap()
        })
    }

    fn enabled(sim: &SimPort) -> Gpio<&SimPort> {
        let gpio = sim_gpio_32(sim, DriverPolicy::default());
        gpio.enable(PortId::Gpio32).unwrap();
        gpio
    }

    #[test]
    fn test_set_config_twice_is_in_use() {
        let sim = SimPort::new();
        let gpio = enabled(&sim);

        assert_eq!(gpio.set_config(PortId::Gpio32, 4, BitConfig::output()), Ok(()));
        assert_eq!(gpio.set_config(PortId::Gpio32, 4, BitConfig::output()), Err(GpioError::ControllerInUse));
        assert_eq!(gpio.set_config(PortId::Gpio32, 4, BitConfig::input()), Err(GpioError::ControllerInUse));
        assert_eq!(sim.read_ddr(), BIT!(4));
    }

    #[test]
    fn test_set_config_rejected_before_enable() {
        let sim = SimPort::new();
        let gpio = sim_gpio_32(&sim, DriverPolicy::default());

        assert_eq!(gpio.set_config(PortId::Gpio32, 0, BitConfig::output()), Err(GpioError::Fail));
        assert_eq!(gpio.configured_mask(PortId::Gpio32), Ok(0));
        assert_eq!(sim.read_ddr(), 0);
    }

    #[test]
    fn test_set_config_allowed_before_enable() {
        let sim = SimPort::new();
        let policy = DriverPolicy { pre_enable_config: PreEnableConfig::Allow, ..DriverPolicy::default() };
        let gpio = sim_gpio_32(&sim, policy);

        assert_eq!(gpio.set_config(PortId::Gpio32, 0, BitConfig::output()), Ok(()));
        assert_eq!(sim.read_ddr(), BIT!(0));
        // data path stays closed until the clock runs
        assert_eq!(gpio.write(PortId::Gpio32, 0, true), Err(GpioError::Fail));
        assert_eq!(sim.accesses(), 0);

        gpio.enable(PortId::Gpio32).unwrap();
        assert_eq!(gpio.write(PortId::Gpio32, 0, true), Ok(()));
    }

    #[test]
    fn test_set_config_bad_bit_and_bad_config() {
        let sim = SimPort::new();
        let gpio = enabled(&sim);

        assert_eq!(gpio.set_config(PortId::Gpio32, 32, BitConfig::input()), Err(GpioError::InvalidConfig));

        let irq_output = BitConfig {
            direction: Direction::Output,
            ..BitConfig::interrupt(Trigger::RisingEdge, Handler::new(nop, 0))
        };
        assert_eq!(gpio.set_config(PortId::Gpio32, 1, irq_output), Err(GpioError::InvalidConfig));
        // the rejected claim is handed back
        assert_eq!(gpio.set_config(PortId::Gpio32, 1, BitConfig::input()), Ok(()));
    }

    #[test]
    fn test_set_config_fault_leaves_bit_free() {
        let mut mock = mry::new!(MockPort {});
        mock.mock_ungate_clock().returns(Ok(()));
        mock.mock_configure_bit(2, Any).returns(Err(RegisterFault::Bus));
        mock.mock_reset_bit(2).returns(Ok(()));

        {
            let registry = PortRegistry::new().with_port(PortDescriptor::soc_gpio_32(), &mock);
            let gpio = Gpio::new(registry, CoreId::Host, DriverPolicy::default());
            gpio.enable(PortId::Gpio32).unwrap();

            assert_eq!(gpio.set_config(PortId::Gpio32, 2, BitConfig::output()), Err(GpioError::Fail));
            assert_eq!(gpio.is_configured(PortId::Gpio32, 2), Ok(false));
        }

        mock.mock_configure_bit(2, Any).assert_called(1);
        mock.mock_reset_bit(2).assert_called(1);
    }

    #[test]
    fn test_deconfig_free_bit_is_noop() {
        let mut mock = mry::new!(MockPort {});
        mock.mock_ungate_clock().returns(Ok(()));
        mock.mock_reset_bit(Any).returns(Ok(()));

        {
            let registry = PortRegistry::new().with_port(PortDescriptor::soc_gpio_32(), &mock);
            let gpio = Gpio::new(registry, CoreId::Host, DriverPolicy::default());
            gpio.enable(PortId::Gpio32).unwrap();

            assert_eq!(gpio.deconfig(PortId::Gpio32, 9), Ok(()));
            assert_eq!(gpio.deconfig(PortId::Gpio32, 9), Ok(()));
            assert_eq!(gpio.configured_mask(PortId::Gpio32), Ok(0));
        }

        mock.mock_reset_bit(Any).assert_called(0);
    }

    #[test]
    fn test_round_trip_with_new_config() {
        let sim = SimPort::new();
        let gpio = enabled(&sim);

        gpio.set_config(PortId::Gpio32, 6, BitConfig::output()).unwrap();
        assert_eq!(gpio.write(PortId::Gpio32, 6, true), Ok(()));
        assert_eq!(sim.read_dr(), BIT!(6));

        assert_eq!(gpio.deconfig(PortId::Gpio32, 6), Ok(()));
        assert_eq!(gpio.is_configured(PortId::Gpio32, 6), Ok(false));
        assert_eq!(sim.read_ddr(), 0);

        let input = BitConfig::input().with_pull(Pull::Up);
        assert_eq!(gpio.set_config(PortId::Gpio32, 6, input), Ok(()));
        sim.drive(6, true);
        assert_eq!(gpio.read(PortId::Gpio32, 6), Ok(true));
        assert_eq!(sim.read_pull_up(), BIT!(6));
    }

    #[test]
    fn test_deconfig_fault_keeps_configuration() {
        let sim = SimPort::new();
        let gpio = enabled(&sim);
        gpio.set_config(PortId::Gpio32, 3, BitConfig::output()).unwrap();

        sim.inject(SimFault::RESET);
        assert_eq!(gpio.deconfig(PortId::Gpio32, 3), Err(GpioError::Fail));
        let kept = gpio.bit_config(PortId::Gpio32, 3).unwrap().unwrap();
        assert_eq!(kept.direction, Direction::Output);

        sim.clear_faults();
        assert_eq!(gpio.deconfig(PortId::Gpio32, 3), Ok(()));
    }

    #[test]
    fn test_disable_keeps_configuration() {
        let sim = SimPort::new();
        let gpio = enabled(&sim);
        gpio.set_config(PortId::Gpio32, 7, BitConfig::output()).unwrap();

        gpio.disable(PortId::Gpio32).unwrap();
        assert_eq!(gpio.configured_mask(PortId::Gpio32), Ok(BIT!(7)));
        assert_eq!(gpio.deconfig(PortId::Gpio32, 7), Err(GpioError::Fail));

        gpio.enable(PortId::Gpio32).unwrap();
        assert_eq!(gpio.write(PortId::Gpio32, 7, true), Ok(()));
    }

    #[test]
    fn test_set_port_config_all_or_nothing() {
        let sim = SimPort::new();
        let gpio = enabled(&sim);
        gpio.set_config(PortId::Gpio32, 3, BitConfig::input()).unwrap();

        let config = PortConfig::uniform(BitConfig::output());
        assert_eq!(gpio.set_port_config(PortId::Gpio32, &config), Err(GpioError::ControllerInUse));
        assert_eq!(gpio.configured_mask(PortId::Gpio32), Ok(BIT!(3)));
        assert_eq!(sim.read_ddr(), 0);

        gpio.deconfig(PortId::Gpio32, 3).unwrap();
        assert_eq!(gpio.set_port_config(PortId::Gpio32, &config), Ok(()));
        assert_eq!(gpio.configured_mask(PortId::Gpio32), Ok(u32::MAX));
        assert_eq!(sim.read_ddr(), u32::MAX);
    }

    #[test]
    fn test_set_port_config_invalid_line_rejects_batch() {
        let mut mock = mry::new!(MockPort {});
        mock.mock_ungate_clock().returns(Ok(()));
        mock.mock_configure_bit(Any, Any).returns(Ok(()));

        {
            let desc = PortDescriptor::soc_gpio_32().with_irq_lines(0x0000_ffff);
            let registry = PortRegistry::new().with_port(desc, &mock);
            let gpio = Gpio::new(registry, CoreId::Host, DriverPolicy::default());
            gpio.enable(PortId::Gpio32).unwrap();

            // line 16 and up cannot take an interrupt
            let config = PortConfig::uniform(BitConfig::interrupt(Trigger::LevelHigh, Handler::new(nop, 0)));
            assert_eq!(gpio.set_port_config(PortId::Gpio32, &config), Err(GpioError::InvalidConfig));
            assert_eq!(gpio.configured_mask(PortId::Gpio32), Ok(0));

            let config = PortConfig { interrupt: 0x0000_ffff, ..config };
            assert_eq!(gpio.set_port_config(PortId::Gpio32, &config), Ok(()));
        }

        mock.mock_configure_bit(Any, Any).assert_called(32);
    }

    #[test]
    fn test_set_port_config_fault_rolls_back() {
        let sim = SimPort::new();
        let gpio = enabled(&sim);

        sim.inject_on_bit(SimFault::CONFIGURE, 5);
        let config = PortConfig { output: 0xff, ..PortConfig::default() };
        assert_eq!(gpio.set_port_config(PortId::Gpio32, &config), Err(GpioError::Fail));
        assert_eq!(gpio.configured_mask(PortId::Gpio32), Ok(0));
        assert_eq!(sim.read_ddr(), 0);

        sim.clear_faults();
        assert_eq!(gpio.set_config(PortId::Gpio32, 5, BitConfig::input()), Ok(()));
    }

    #[test]
    fn test_port_deconfig_skips_free_bits() {
        let sim = SimPort::new();
        let gpio = enabled(&sim);
        gpio.set_config(PortId::Gpio32, 1, BitConfig::output()).unwrap();
        gpio.set_config(PortId::Gpio32, 30, BitConfig::output()).unwrap();

        assert_eq!(gpio.port_deconfig(PortId::Gpio32), Ok(()));
        assert_eq!(gpio.configured_mask(PortId::Gpio32), Ok(0));
        assert_eq!(gpio.port_deconfig(PortId::Gpio32), Ok(()));
    }

    #[test]
    fn test_port_deconfig_reports_partial_failure() {
        let sim = SimPort::new();
        let gpio = enabled(&sim);
        for bit in [2, 5, 9] {
            gpio.set_config(PortId::Gpio32, bit, BitConfig::output()).unwrap();
        }

        sim.inject_on_bit(SimFault::RESET, 5);
        assert_eq!(
            gpio.port_deconfig(PortId::Gpio32),
            Err(PortDeconfigError::Partial { remaining: BIT!(5) | BIT!(9) })
        );
        assert_eq!(gpio.is_configured(PortId::Gpio32, 2), Ok(false));

        sim.clear_faults();
        assert_eq!(gpio.port_deconfig(PortId::Gpio32), Ok(()));
    }

    #[test]
    fn test_port_deconfig_disabled_port() {
        let sim = SimPort::new();
        let gpio = enabled(&sim);
        gpio.set_config(PortId::Gpio32, 0, BitConfig::output()).unwrap();
        gpio.disable(PortId::Gpio32).unwrap();

        assert_eq!(gpio.port_deconfig(PortId::Gpio32), Err(PortDeconfigError::Rejected(GpioError::Fail)));
        assert_eq!(gpio.configured_mask(PortId::Gpio32), Ok(BIT!(0)));
    }

    #[test]
    fn test_concurrent_set_config_on_one_port() {
        let sim = SimPort::new();
        let gpio = enabled(&sim);

        for _ in 0..64 {
            std::thread::scope(|s| {
                let a = s.spawn(|| gpio.set_config(PortId::Gpio32, 10, BitConfig::output()));
                let b = s.spawn(|| gpio.set_config(PortId::Gpio32, 11, BitConfig::input().with_pull(Pull::Down)));
                assert_eq!(a.join().unwrap(), Ok(()));
                assert_eq!(b.join().unwrap(), Ok(()));
            });

            assert_eq!(gpio.bit_config(PortId::Gpio32, 10).unwrap().map(|c| c.direction), Some(Direction::Output));
            assert_eq!(gpio.bit_config(PortId::Gpio32, 11).unwrap().map(|c| c.pull), Some(Pull::Down));
            assert_eq!(gpio.configured_mask(PortId::Gpio32), Ok(BIT!(10) | BIT!(11)));

            gpio.port_deconfig(PortId::Gpio32).unwrap();
        }
    }

    #[test]
    fn test_contended_set_config_has_one_winner() {
        let sim = SimPort::new();
        let gpio = enabled(&sim);

        let results: std::vec::Vec<_> = std::thread::scope(|s| {
            let handles: std::vec::Vec<_> = (0..4)
                .map(|_| s.spawn(|| gpio.set_config(PortId::Gpio32, 12, BitConfig::output())))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results.iter().all(|r| matches!(r, Ok(()) | Err(GpioError::ControllerInUse))));
    }

    #[test]
    fn test_set_config_fails_when_gated_mid_way() {
        let port = StallPort::new();
        let gpio = stall_gpio(&port);

        let result = disable_during(&gpio, &port, || gpio.set_config(PortId::Gpio32, 4, BitConfig::output()));
        assert_eq!(result, Err(GpioError::Fail));
        assert_eq!(gpio.is_configured(PortId::Gpio32, 4), Ok(false));
        assert_eq!(port.sim.read_ddr(), 0);

        gpio.enable(PortId::Gpio32).unwrap();
        assert_eq!(gpio.set_config(PortId::Gpio32, 4, BitConfig::output()), Ok(()));
    }

    #[test]
    fn test_set_port_config_fails_when_gated_mid_way() {
        let port = StallPort::new();
        let gpio = stall_gpio(&port);
        let config = PortConfig { output: u32::MAX, ..PortConfig::default() };

        let result = disable_during(&gpio, &port, || gpio.set_port_config(PortId::Gpio32, &config));
        assert_eq!(result, Err(GpioError::Fail));
        assert_eq!(gpio.configured_mask(PortId::Gpio32), Ok(0));
        assert_eq!(port.sim.read_ddr(), 0);
    }

    #[test]
    fn test_deconfig_fails_when_gated_mid_way() {
        let port = StallPort::new();
        let gpio = stall_gpio(&port);
        gpio.set_config(PortId::Gpio32, 6, BitConfig::output()).unwrap();

        let result = disable_during(&gpio, &port, || gpio.deconfig(PortId::Gpio32, 6));
        assert_eq!(result, Err(GpioError::Fail));
        // old configuration programmed back
        let kept = gpio.bit_config(PortId::Gpio32, 6).unwrap().map(|c| c.direction);
        assert_eq!(kept, Some(Direction::Output));
        assert_eq!(port.sim.read_ddr(), BIT!(6));
    }

    #[test]
    fn test_port_deconfig_stops_when_gated_mid_way() {
        let port = StallPort::new();
        let gpio = stall_gpio(&port);
        gpio.set_config(PortId::Gpio32, 1, BitConfig::output()).unwrap();
        gpio.set_config(PortId::Gpio32, 3, BitConfig::output()).unwrap();

        let result = disable_during(&gpio, &port, || gpio.port_deconfig(PortId::Gpio32));
        assert_eq!(result, Err(PortDeconfigError::Partial { remaining: BIT!(1) | BIT!(3) }));
        assert_eq!(port.sim.read_ddr(), BIT!(1) | BIT!(3));
    }

    #[test]
    fn test_failed_rollback_still_frees_bits() {
        let sim = SimPort::new();
        let gpio = enabled(&sim);

        sim.inject(SimFault::CONFIGURE | SimFault::RESET);
        assert_eq!(gpio.set_config(PortId::Gpio32, 8, BitConfig::output()), Err(GpioError::Fail));
        let config = PortConfig { output: 0xff, ..PortConfig::default() };
        assert_eq!(gpio.set_port_config(PortId::Gpio32, &config), Err(GpioError::Fail));
        assert_eq!(gpio.configured_mask(PortId::Gpio32), Ok(0));

        sim.clear_faults();
        assert_eq!(gpio.set_config(PortId::Gpio32, 8, BitConfig::output()), Ok(()));
        assert_eq!(gpio.set_config(PortId::Gpio32, 0, BitConfig::input()), Ok(()));
    }
}
