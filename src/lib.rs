#![cfg_attr(not(test), no_std)]

pub mod common;
pub mod config;
pub mod drivers;
pub mod error;
pub mod mcu;
pub mod rc;

pub use config::{AccessPolicy, Capabilities, CoreId, CoreMask, DirectionPolicy, DriverPolicy, PreEnableConfig};
pub use drivers::soc_gpio::bit_config::{BitConfig, Handler, PortConfig};
pub use drivers::soc_gpio::port::{PortDescriptor, PortId, PortRegistry, PORT_COUNT};
pub use drivers::soc_gpio::Gpio;
pub use error::{DriverRc, GpioError, PortDeconfigError, RegisterFault, Result};
pub use mcu::register::{Direction, PinSetup, Pull, RegisterPort, Trigger};
