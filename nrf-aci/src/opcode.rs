//! ACI command opcodes.

/// The opcode byte of an ACI command.
///
/// Command response events echo the opcode they answer, so unknown values are representable.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Opcode(u8);

impl Opcode {
    /// Create an `Opcode` from its wire value.
    pub const fn from_raw(raw: u8) -> Self {
        Opcode(raw)
    }

    /// The wire value of this opcode.
    pub const fn to_raw(self) -> u8 {
        self.0
    }

    /// Whether a command with this opcode consumes a data credit when it is accepted.
    pub const fn consumes_credit(self) -> bool {
        matches!(
            self,
            Opcode::SEND_DATA | Opcode::REQUEST_DATA | Opcode::SEND_DATA_ACK | Opcode::SEND_DATA_NACK
        )
    }
}

impl From<u8> for Opcode {
    fn from(value: u8) -> Self {
        Opcode(value)
    }
}

impl From<Opcode> for u8 {
    fn from(value: Opcode) -> Self {
        value.0
    }
}

macro_rules! opcodes {
    (
        $(
            $(#[$docs:meta])*
            ($konst:ident, $name:expr, $raw:expr);
        )+
    ) => {
        impl Opcode {
        $(
            $(#[$docs])*
            pub const $konst: Opcode = Opcode($raw);
        )+

            /// A short name for the opcode, if it is a known one.
            pub const fn name(self) -> Option<&'static str> {
                match self {
                    $(
                    Self::$konst => Some($name),
                    )+
                    _ => None,
                }
            }
        }

        #[cfg(feature = "defmt")]
        impl defmt::Format for Opcode {
            fn format(&self, fmt: defmt::Formatter) {
                match *self {
                    $(
                    Self::$konst => defmt::write!(fmt, $name),
                    )+
                    _ => defmt::write!(fmt, "Opcode({=u8:#04x})", self.0),
                }
            }
        }

        impl core::fmt::Debug for Opcode {
            fn fmt(&self, fmt: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                match *self {
                    $(
                    Self::$konst => core::write!(fmt, $name),
                    )+
                    _ => core::write!(fmt, "Opcode({:#04x})", self.0),
                }
            }
        }
    }
}

opcodes! {
    /// Enable or disable test mode.
    (TEST, "Test", 0x01);
    /// Echo bytes back (test mode only on real hardware).
    (ECHO, "Echo", 0x02);
    /// Direct test mode command.
    (DTM_COMMAND, "DtmCommand", 0x03);
    /// Enter sleep mode.
    (SLEEP, "Sleep", 0x04);
    /// Leave sleep mode.
    (WAKEUP, "Wakeup", 0x05);
    /// One message of the setup sequence.
    (SETUP, "Setup", 0x06);
    /// Read one chunk of dynamic data.
    (READ_DYNAMIC_DATA, "ReadDynamicData", 0x07);
    /// Write one chunk of dynamic data.
    (WRITE_DYNAMIC_DATA, "WriteDynamicData", 0x08);
    /// Query configuration and ACI version.
    (GET_DEVICE_VERSION, "GetDeviceVersion", 0x09);
    /// Query the local Bluetooth address.
    (GET_DEVICE_ADDRESS, "GetDeviceAddress", 0x0a);
    /// Measure the supply voltage.
    (GET_BATTERY_LEVEL, "GetBatteryLevel", 0x0b);
    /// Measure the die temperature.
    (GET_TEMPERATURE, "GetTemperature", 0x0c);
    /// Update the local value of a pipe.
    (SET_LOCAL_DATA, "SetLocalData", 0x0d);
    /// Reset the radio.
    (RADIO_RESET, "RadioReset", 0x0e);
    /// Start connectable advertising.
    (CONNECT, "Connect", 0x0f);
    /// Start bonding advertising.
    (BOND, "Bond", 0x10);
    /// Terminate the link.
    (DISCONNECT, "Disconnect", 0x11);
    /// Set the output power.
    (SET_TX_POWER, "SetTxPower", 0x12);
    /// Request new connection timing.
    (CHANGE_TIMING_REQUEST, "ChangeTimingRequest", 0x13);
    /// Open a pipe on the peer.
    (OPEN_REMOTE_PIPE, "OpenRemotePipe", 0x14);
    /// Send data over a pipe.
    (SEND_DATA, "SendData", 0x15);
    /// Acknowledge received data.
    (SEND_DATA_ACK, "SendDataAck", 0x16);
    /// Request data from the peer.
    (REQUEST_DATA, "RequestData", 0x17);
    /// Reject received data.
    (SEND_DATA_NACK, "SendDataNack", 0x18);
    /// Configure application latency.
    (SET_APPL_LATENCY, "SetApplLatency", 0x19);
    /// Provide a passkey.
    (SET_KEY, "SetKey", 0x1a);
    /// Open advertising service data pipes.
    (OPEN_ADV_PIPE, "OpenAdvPipe", 0x1b);
    /// Start non-connectable advertising.
    (BROADCAST, "Broadcast", 0x1c);
    /// Ask the peer to start bonding.
    (BOND_SECURITY_REQUEST, "BondSecurityRequest", 0x1d);
    /// Start directed advertising.
    (DIRECTED_CONNECT, "DirectedConnect", 0x1e);
    /// Close a pipe on the peer.
    (CLOSE_REMOTE_PIPE, "CloseRemotePipe", 0x1f);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_data_commands_consume_credits() {
        assert!(Opcode::SEND_DATA.consumes_credit());
        assert!(Opcode::REQUEST_DATA.consumes_credit());
        assert!(Opcode::SEND_DATA_ACK.consumes_credit());
        assert!(Opcode::SEND_DATA_NACK.consumes_credit());
        assert!(!Opcode::SET_LOCAL_DATA.consumes_credit());
        assert!(!Opcode::ECHO.consumes_credit());
    }

    #[test]
    fn unknown_opcodes_format_as_hex() {
        extern crate std;
        use std::format;

        assert_eq!(format!("{:?}", Opcode::SETUP), "Setup");
        assert_eq!(format!("{:?}", Opcode::from_raw(0x7e)), "Opcode(0x7e)");
        assert_eq!(Opcode::from_raw(0x7e).name(), None);
    }
}
