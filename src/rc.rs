//! Return-code front end.
//!
//! Same operations as [`Gpio`], addressed by raw port number and answering with a
//! [`DriverRc`]. A raw port that names no compiled-in variant fails with
//! `DeviceTypeNotSupported` before anything else is looked at.

use crate::drivers::soc_gpio::bit_config::{BitConfig, PortConfig};
use crate::drivers::soc_gpio::port::PortId;
use crate::drivers::soc_gpio::Gpio;
use crate::error::{DriverRc, Result};
use crate::mcu::register::RegisterPort;

fn with_port<T>(port: u8, op: impl FnOnce(PortId) -> Result<T>) -> Result<T> {
    op(PortId::try_from(port)?)
}

pub fn gpio_enable<R: RegisterPort>(gpio: &Gpio<R>, port: u8) -> DriverRc {
    with_port(port, |id| gpio.enable(id)).into()
}

pub fn gpio_disable<R: RegisterPort>(gpio: &Gpio<R>, port: u8) -> DriverRc {
    with_port(port, |id| gpio.disable(id)).into()
}

pub fn gpio_set_config<R: RegisterPort>(gpio: &Gpio<R>, port: u8, bit: u8, config: BitConfig) -> DriverRc {
    with_port(port, |id| gpio.set_config(id, bit, config)).into()
}

pub fn gpio_deconfig<R: RegisterPort>(gpio: &Gpio<R>, port: u8, bit: u8) -> DriverRc {
    with_port(port, |id| gpio.deconfig(id, bit)).into()
}

pub fn gpio_set_port_config<R: RegisterPort>(gpio: &Gpio<R>, port: u8, config: &PortConfig) -> DriverRc {
    with_port(port, |id| gpio.set_port_config(id, config)).into()
}

/// The mask of lines left Configured after a partial failure is lost here; use
/// [`Gpio::port_deconfig`] to see it.
pub fn gpio_port_deconfig<R: RegisterPort>(gpio: &Gpio<R>, port: u8) -> DriverRc {
    with_port(port, |id| gpio.port_deconfig(id).map_err(Into::into)).into()
}

/// Value is `false` whenever the return code is not `Ok`.
pub fn gpio_read<R: RegisterPort>(gpio: &Gpio<R>, port: u8, bit: u8) -> (bool, DriverRc) {
    match with_port(port, |id| gpio.read(id, bit)) {
        Ok(value) => (value, DriverRc::Ok),
        Err(err) => (false, err.into()),
    }
}

pub fn gpio_write<R: RegisterPort>(gpio: &Gpio<R>, port: u8, bit: u8, value: bool) -> DriverRc {
    with_port(port, |id| gpio.write(id, bit, value)).into()
}

pub fn gpio_read_port<R: RegisterPort>(gpio: &Gpio<R>, port: u8) -> (u32, DriverRc) {
    match with_port(port, |id| gpio.read_port(id)) {
        Ok(value) => (value, DriverRc::Ok),
        Err(err) => (0, err.into()),
    }
}

pub fn gpio_write_port<R: RegisterPort>(gpio: &Gpio<R>, port: u8, value: u32) -> DriverRc {
    with_port(port, |id| gpio.write_port(id, value)).into()
}
