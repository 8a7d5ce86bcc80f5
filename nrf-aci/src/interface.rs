//! Hardware primitives the driver is built on.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, InputPin, OutputPin};
use embedded_hal::spi::{self, SpiBus};

/// The primitive operations a transaction is made of.
///
/// [`SpiInterface`] implements this over `embedded-hal` peripherals. Tests and unusual boards can
/// provide their own.
pub trait Interface {
    type Error;

    /// Take exclusive ownership of the bus. Blocks until it is available.
    fn acquire(&mut self) -> Result<(), Self::Error>;

    /// Give the bus back. Must be harmless if the bus is not held.
    fn release(&mut self);

    /// Assert the request line (REQN).
    fn select(&mut self) -> Result<(), Self::Error>;

    /// Deassert the request line (REQN).
    fn deselect(&mut self) -> Result<(), Self::Error>;

    /// Whether the radio asserts its ready line (RDYN).
    fn is_ready(&mut self) -> Result<bool, Self::Error>;

    /// Full-duplex exchange of `write.len()` bytes. `read` has the same length as `write`.
    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error>;

    fn delay_ms(&mut self, ms: u32);

    fn delay_us(&mut self, us: u32);

    /// Drive the reset line. `true` holds the radio in reset.
    fn set_reset(&mut self, asserted: bool) -> Result<(), Self::Error>;
}

/// Failure reported by [`SpiInterface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceError {
    Spi(spi::ErrorKind),
    Pin(digital::ErrorKind),
    /// A transfer was attempted without holding the bus.
    BusNotAcquired,
}

#[cfg(feature = "defmt")]
impl defmt::Format for InterfaceError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            InterfaceError::Spi(kind) => defmt::write!(fmt, "Spi({})", defmt::Debug2Format(kind)),
            InterfaceError::Pin(kind) => defmt::write!(fmt, "Pin({})", defmt::Debug2Format(kind)),
            InterfaceError::BusNotAcquired => defmt::write!(fmt, "BusNotAcquired"),
        }
    }
}

impl core::fmt::Display for InterfaceError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            InterfaceError::Spi(kind) => write!(f, "SPI error: {}", kind),
            InterfaceError::Pin(kind) => write!(f, "pin error: {}", kind),
            InterfaceError::BusNotAcquired => f.write_str("bus not acquired"),
        }
    }
}

impl core::error::Error for InterfaceError {}

fn pin_error<E: digital::Error>(err: E) -> InterfaceError {
    InterfaceError::Pin(err.kind())
}

/// nRF8001 wiring over an SPI bus shared through an `embassy-sync` mutex.
///
/// The bus must be configured for SPI mode 0, LSB first, at no more than 3 MHz. REQN, RDYN and
/// RESET are all active low.
pub struct SpiInterface<'d, M: RawMutex, SPI, REQN, RDYN, RESET, D> {
    bus: &'d Mutex<M, SPI>,
    guard: Option<MutexGuard<'d, M, SPI>>,
    reqn: REQN,
    rdyn: RDYN,
    reset: RESET,
    delay: D,
}

impl<'d, M, SPI, REQN, RDYN, RESET, D> SpiInterface<'d, M, SPI, REQN, RDYN, RESET, D>
where
    M: RawMutex,
    SPI: SpiBus,
    REQN: OutputPin,
    RDYN: InputPin,
    RESET: OutputPin,
    D: DelayNs,
{
    pub fn new(bus: &'d Mutex<M, SPI>, reqn: REQN, rdyn: RDYN, reset: RESET, delay: D) -> Self {
        SpiInterface {
            bus,
            guard: None,
            reqn,
            rdyn,
            reset,
            delay,
        }
    }
}

impl<'d, M, SPI, REQN, RDYN, RESET, D> Interface for SpiInterface<'d, M, SPI, REQN, RDYN, RESET, D>
where
    M: RawMutex,
    SPI: SpiBus,
    REQN: OutputPin,
    RDYN: InputPin,
    RESET: OutputPin,
    D: DelayNs,
{
    type Error = InterfaceError;

    fn acquire(&mut self) -> Result<(), Self::Error> {
        if self.guard.is_some() {
            return Ok(());
        }
        loop {
            if let Ok(guard) = self.bus.try_lock() {
                self.guard = Some(guard);
                return Ok(());
            }
            core::hint::spin_loop();
        }
    }

    fn release(&mut self) {
        self.guard = None;
    }

    fn select(&mut self) -> Result<(), Self::Error> {
        self.reqn.set_low().map_err(pin_error)
    }

    fn deselect(&mut self) -> Result<(), Self::Error> {
        self.reqn.set_high().map_err(pin_error)
    }

    fn is_ready(&mut self) -> Result<bool, Self::Error> {
        self.rdyn.is_low().map_err(pin_error)
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        let bus = self.guard.as_mut().ok_or(InterfaceError::BusNotAcquired)?;
        bus.transfer(read, write)
            .and_then(|()| bus.flush())
            .map_err(|err| InterfaceError::Spi(spi::Error::kind(&err)))
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }

    fn set_reset(&mut self, asserted: bool) -> Result<(), Self::Error> {
        if asserted {
            self.reset.set_low().map_err(pin_error)
        } else {
            self.reset.set_high().map_err(pin_error)
        }
    }
}
