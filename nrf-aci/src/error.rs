//! Error types for the ACI driver.

/// An error returned by a driver operation.
///
/// Everything except [`Error::Timeout`] and [`Error::Bus`] is detected locally, before any byte is
/// put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The ready line was not asserted within the polling budget.
    Timeout,
    /// The command is not allowed in the current device mode.
    InvalidState,
    /// No data credits are left for a credit-consuming command.
    InsufficientCredits,
    /// The target pipe is not open.
    PipeNotOpen,
    /// The link is not connected.
    NotConnected,
    /// The payload does not fit into a single ACI packet.
    DataTooLong,
    /// A parameter is outside the range the protocol accepts.
    InvalidParameter,
    /// The setup sequence ran out of messages before the device reached standby.
    SetupError,
    /// The hardware interface (SPI bus or one of the control lines) reported a failure.
    Bus,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            Error::Timeout => "timed out waiting for the ready line",
            Error::InvalidState => "command not allowed in the current device mode",
            Error::InsufficientCredits => "no data credits available",
            Error::PipeNotOpen => "pipe not open",
            Error::NotConnected => "not connected",
            Error::DataTooLong => "data too long",
            Error::InvalidParameter => "invalid parameter",
            Error::SetupError => "setup did not complete",
            Error::Bus => "bus error",
        };
        f.write_str(msg)
    }
}

impl core::error::Error for Error {}

impl embedded_io::Error for Error {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            Error::Timeout => embedded_io::ErrorKind::TimedOut,
            Error::NotConnected | Error::PipeNotOpen => embedded_io::ErrorKind::NotConnected,
            Error::DataTooLong | Error::InvalidParameter => embedded_io::ErrorKind::InvalidInput,
            Error::InsufficientCredits => embedded_io::ErrorKind::OutOfMemory,
            _ => embedded_io::ErrorKind::Other,
        }
    }
}
