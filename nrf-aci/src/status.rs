//! ACI status codes carried by command response events.

/// The status byte of a command response event.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Status(u8);

impl Status {
    /// Create a `Status` from its wire value.
    pub const fn from_raw(raw: u8) -> Self {
        Status(raw)
    }

    /// The wire value of this status.
    pub const fn to_raw(self) -> u8 {
        self.0
    }

    /// Whether this is the plain success status.
    ///
    /// The two transaction statuses are not successes in this sense: they drive the setup
    /// sequence and are routed like failures.
    pub const fn is_success(self) -> bool {
        self.0 == Status::SUCCESS.0
    }

    /// Whether this status reports an error (as opposed to success or a transaction status).
    pub const fn is_error(self) -> bool {
        self.0 >= 0x80
    }
}

impl From<u8> for Status {
    fn from(value: u8) -> Self {
        Status(value)
    }
}

macro_rules! statuses {
    (
        $(
            $(#[$docs:meta])*
            ($konst:ident, $name:expr, $raw:expr);
        )+
    ) => {
        impl Status {
        $(
            $(#[$docs])*
            pub const $konst: Status = Status($raw);
        )+

            /// A human readable description, if the status is a known one.
            pub const fn description(self) -> Option<&'static str> {
                match self {
                    $(
                    Self::$konst => Some($name),
                    )+
                    _ => None,
                }
            }
        }

        #[cfg(feature = "defmt")]
        impl defmt::Format for Status {
            fn format(&self, fmt: defmt::Formatter) {
                match *self {
                    $(
                    Self::$konst => defmt::write!(fmt, $name),
                    )+
                    _ => defmt::write!(fmt, "Unknown status: {=u8:#04x}", self.0),
                }
            }
        }

        impl core::fmt::Debug for Status {
            fn fmt(&self, fmt: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                match *self {
                    $(
                    Self::$konst => core::write!(fmt, $name),
                    )+
                    _ => core::write!(fmt, "Unknown status: {:#04x}", self.0),
                }
            }
        }
    }
}

statuses! {
    /// Success.
    (SUCCESS, "Success", 0x00);
    /// The transaction continues, send the next message.
    (TRANSACTION_CONTINUE, "Transaction continue", 0x01);
    /// The transaction is complete.
    (TRANSACTION_COMPLETE, "Transaction complete", 0x02);
    /// Extended status, further checks needed.
    (EXTENDED, "Extended status", 0x03);
    /// Unknown error.
    (ERROR_UNKNOWN, "Unknown error", 0x80);
    /// Internal error.
    (ERROR_INTERNAL, "Internal error", 0x81);
    /// Unknown command.
    (ERROR_CMD_UNKNOWN, "Unknown command", 0x82);
    /// Command invalid in the current device state.
    (ERROR_DEVICE_STATE_INVALID, "Command invalid in the current device state", 0x83);
    /// Invalid length.
    (ERROR_INVALID_LENGTH, "Invalid length", 0x84);
    /// Invalid input parameters.
    (ERROR_INVALID_PARAMETER, "Invalid input parameters", 0x85);
    /// Busy.
    (ERROR_BUSY, "Busy", 0x86);
    /// Invalid data format or contents.
    (ERROR_INVALID_DATA, "Invalid data format or contents", 0x87);
    /// CRC mismatch.
    (ERROR_CRC_MISMATCH, "CRC mismatch", 0x88);
    /// Unsupported setup format.
    (ERROR_UNSUPPORTED_SETUP_FORMAT, "Unsupported setup format", 0x89);
    /// Invalid sequence number during a write dynamic data sequence.
    (ERROR_INVALID_SEQ_NO, "Invalid sequence number", 0x8a);
    /// Setup data is locked and cannot be modified.
    (ERROR_SETUP_LOCKED, "Setup data is locked", 0x8b);
    /// Setup error due to lock verification failure.
    (ERROR_LOCK_FAILED, "Lock verification failed", 0x8c);
    /// Local service pipes need a bonded peer.
    (ERROR_BOND_REQUIRED, "Bond required", 0x8d);
    /// Command rejected as a transaction is still pending.
    (ERROR_REJECTED, "Command rejected, transaction pending", 0x8e);
    /// Data size exceeds the maximum size of the pipe.
    (ERROR_DATA_SIZE, "Data size exceeds pipe size", 0x8f);
    /// Invalid or unavailable pipe number, or unknown pipe type.
    (ERROR_PIPE_INVALID, "Invalid pipe", 0x90);
    /// Credit not available.
    (ERROR_CREDIT_NOT_AVAILABLE, "Credit not available", 0x91);
    /// The peer sent an error on a pipe operation on the remote characteristic.
    (ERROR_PEER_ATT_ERROR, "Peer ATT error", 0x92);
    /// No connection was established before advertising stopped.
    (ERROR_ADVT_TIMEOUT, "Advertising timeout", 0x93);
    /// The peer triggered a Security Manager Protocol error.
    (ERROR_PEER_SMP_ERROR, "Peer SMP error", 0x94);
    /// Pipe type invalid for the selected operation.
    (ERROR_PIPE_TYPE_INVALID, "Pipe type invalid", 0x95);
    /// Pipe state invalid for the selected operation.
    (ERROR_PIPE_STATE_INVALID, "Pipe state invalid", 0x96);
    /// Invalid key size provided.
    (ERROR_INVALID_KEY_SIZE, "Invalid key size", 0x97);
    /// Invalid key data provided.
    (ERROR_INVALID_KEY_DATA, "Invalid key data", 0x98);
}
