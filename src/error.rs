use num_derive::{FromPrimitive, ToPrimitive};
use thiserror::Error;

/// Failure codes returned by every driver operation.
///
/// Success is the `Ok` side of [`Result`]; nothing in the driver unwinds, so an
/// interrupt handler can match on these directly.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash)]
pub enum GpioError {
    /// The port identifier is out of range, compiled out, or not on this board.
    #[error("port not supported by this controller")]
    DeviceTypeNotSupported,
    /// Malformed or hardware-incompatible configuration, bad bit index, or a
    /// direction mismatch under the rejecting policy.
    #[error("invalid configuration")]
    InvalidConfig,
    /// The bit already carries a configuration (or one is being applied).
    #[error("bit already configured")]
    ControllerInUse,
    /// The calling core cannot reach this port or bit.
    #[error("port not accessible from this core")]
    ControllerNotAccessible,
    /// A register transaction failed, or the port is clock gated.
    #[error("register transaction failed")]
    Fail,
}

pub type Result<T> = core::result::Result<T, GpioError>;

/// Faults reported by a [`RegisterPort`](crate::mcu::register::RegisterPort).
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum RegisterFault {
    #[error("register block is clock gated")]
    ClockGated,
    #[error("bus error")]
    Bus,
}

impl From<RegisterFault> for GpioError {
    fn from(fault: RegisterFault) -> Self {
        log::warn!("gpio: register fault: {}", fault);
        GpioError::Fail
    }
}

/// Failure of a port-wide deconfiguration.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum PortDeconfigError {
    /// Nothing was touched.
    #[error(transparent)]
    Rejected(#[from] GpioError),
    /// A reset failed part way. Bits processed before the fault are Free;
    /// `remaining` holds every bit still Configured, the failing one included.
    #[error("port deconfiguration stopped with bits {remaining:#010x} still configured")]
    Partial { remaining: u32 },
}

impl From<PortDeconfigError> for GpioError {
    fn from(err: PortDeconfigError) -> Self {
        match err {
            PortDeconfigError::Rejected(err) => err,
            PortDeconfigError::Partial { .. } => GpioError::Fail,
        }
    }
}

/// Numeric return codes, for callers that speak in plain integers.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum DriverRc {
    Ok = 0,
    Fail = 1,
    DeviceTypeNotSupported = 2,
    InvalidConfig = 3,
    ControllerInUse = 4,
    ControllerNotAccessible = 5,
}

impl From<GpioError> for DriverRc {
    fn from(err: GpioError) -> Self {
        match err {
            GpioError::DeviceTypeNotSupported => DriverRc::DeviceTypeNotSupported,
            GpioError::InvalidConfig => DriverRc::InvalidConfig,
            GpioError::ControllerInUse => DriverRc::ControllerInUse,
            GpioError::ControllerNotAccessible => DriverRc::ControllerNotAccessible,
            GpioError::Fail => DriverRc::Fail,
        }
    }
}

impl<T, E: Into<GpioError>> From<core::result::Result<T, E>> for DriverRc {
    fn from(result: core::result::Result<T, E>) -> Self {
        match result {
            Ok(_) => DriverRc::Ok,
            Err(err) => {
                let err: GpioError = err.into();
                err.into()
            }
        }
    }
}

impl DriverRc {
    pub fn is_ok(self) -> bool {
        self == DriverRc::Ok
    }
}
