//! Outbound ACI packets.
//!
//! A command on the wire is `[length, opcode, payload...]`, where `length` counts the opcode and
//! the payload. Nothing here looks at the device session: the only checks are on size.

use crate::{Error, Opcode};

/// Maximum number of bytes following the length byte, in either direction.
pub const MAX_PACKET_LEN: usize = 32;

/// Maximum payload of an `Echo` command.
pub const MAX_ECHO_LEN: usize = MAX_PACKET_LEN - 1;

/// Maximum data carried by a single pipe command (`SendData`, `SetLocalData`).
pub const MAX_DATA_LEN: usize = MAX_PACKET_LEN - 2;

/// Maximum data carried by a single `WriteDynamicData` command.
pub const MAX_DYNAMIC_DATA_LEN: usize = MAX_PACKET_LEN - 2;

/// Length of a passkey, in ASCII digits.
pub const PASSKEY_LEN: usize = 6;

/// Number of logical pipes addressable by the pipe bitmaps.
pub const PIPE_COUNT: u8 = 64;

/// A serialized command, ready to be clocked out.
#[derive(Clone, PartialEq, Eq)]
pub struct Command {
    buf: [u8; MAX_PACKET_LEN + 1],
}

impl Command {
    /// Build a command from an opcode and its payload.
    pub fn new(opcode: Opcode, payload: &[u8]) -> Result<Self, Error> {
        Self::from_parts(opcode, &[payload])
    }

    /// Build a command whose payload is the concatenation of `parts`.
    pub fn from_parts(opcode: Opcode, parts: &[&[u8]]) -> Result<Self, Error> {
        let payload_len: usize = parts.iter().map(|p| p.len()).sum();
        if payload_len + 1 > MAX_PACKET_LEN {
            return Err(Error::DataTooLong);
        }

        let mut buf = [0; MAX_PACKET_LEN + 1];
        buf[0] = (payload_len + 1) as u8;
        buf[1] = opcode.to_raw();
        let mut pos = 2;
        for part in parts {
            buf[pos..pos + part.len()].copy_from_slice(part);
            pos += part.len();
        }
        Ok(Command { buf })
    }

    /// Wrap a pre-built frame, such as a message of a setup table.
    ///
    /// `frame[0]` is the length byte; bytes after `frame[length]` are ignored.
    pub fn from_frame(frame: &[u8]) -> Result<Self, Error> {
        let len = usize::from(*frame.first().ok_or(Error::InvalidParameter)?);
        if len > MAX_PACKET_LEN {
            return Err(Error::DataTooLong);
        }
        if len == 0 || frame.len() < len + 1 {
            return Err(Error::InvalidParameter);
        }

        let mut buf = [0; MAX_PACKET_LEN + 1];
        buf[..=len].copy_from_slice(&frame[..=len]);
        Ok(Command { buf })
    }

    /// The value of the length byte: opcode plus payload.
    pub fn len(&self) -> u8 {
        self.buf[0]
    }

    /// Always false; a command carries at least its opcode.
    pub fn is_empty(&self) -> bool {
        self.buf[0] == 0
    }

    /// The opcode of this command.
    pub fn opcode(&self) -> Opcode {
        Opcode::from_raw(self.buf[1])
    }

    /// The bytes following the opcode.
    pub fn payload(&self) -> &[u8] {
        &self.buf[2..=usize::from(self.buf[0])]
    }

    /// The full frame: length, opcode and payload.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..=usize::from(self.buf[0])]
    }
}

impl core::fmt::Debug for Command {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Command")
            .field("opcode", &self.opcode())
            .field("payload", &crate::fmt::Bytes(self.payload()))
            .finish()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Command {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "Command {{ opcode: {}, payload: {=[u8]:02x} }}", self.opcode(), self.payload())
    }
}

/// Connection timing parameters for `ChangeTimingRequest`, in the units the radio uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimingParams {
    /// Minimum connection interval, in 1.25 ms units.
    pub interval_min: u16,
    /// Maximum connection interval, in 1.25 ms units.
    pub interval_max: u16,
    /// Slave latency, in connection events.
    pub slave_latency: u16,
    /// Supervision timeout, in 10 ms units.
    pub timeout: u16,
}

/// Key material for `SetKey`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Key {
    /// No key available; rejects the pending key request.
    None,
    /// A passkey of six ASCII digits.
    Passkey([u8; PASSKEY_LEN]),
}

/// Constructors for every ACI command the driver issues.
impl Command {
    pub(crate) fn bare(opcode: Opcode) -> Self {
        let mut buf = [0; MAX_PACKET_LEN + 1];
        buf[0] = 1;
        buf[1] = opcode.to_raw();
        Command { buf }
    }

    pub(crate) fn with_byte(opcode: Opcode, value: u8) -> Self {
        let mut buf = [0; MAX_PACKET_LEN + 1];
        buf[0] = 2;
        buf[1] = opcode.to_raw();
        buf[2] = value;
        Command { buf }
    }

    pub fn test(feature: u8) -> Self {
        Self::with_byte(Opcode::TEST, feature)
    }

    pub fn echo(data: &[u8]) -> Result<Self, Error> {
        Self::new(Opcode::ECHO, data)
    }

    pub fn dtm_command(command: u16) -> Self {
        // DTM words go out MSB first, unlike every other ACI field.
        let mut cmd = Self::bare(Opcode::DTM_COMMAND);
        cmd.buf[0] = 3;
        cmd.buf[2..4].copy_from_slice(&command.to_be_bytes());
        cmd
    }

    pub fn sleep() -> Self {
        Self::bare(Opcode::SLEEP)
    }

    pub fn wakeup() -> Self {
        Self::bare(Opcode::WAKEUP)
    }

    pub fn read_dynamic_data() -> Self {
        Self::bare(Opcode::READ_DYNAMIC_DATA)
    }

    pub fn write_dynamic_data(sequence_no: u8, data: &[u8]) -> Result<Self, Error> {
        Self::from_parts(Opcode::WRITE_DYNAMIC_DATA, &[&[sequence_no], data])
    }

    pub fn get_device_version() -> Self {
        Self::bare(Opcode::GET_DEVICE_VERSION)
    }

    pub fn get_device_address() -> Self {
        Self::bare(Opcode::GET_DEVICE_ADDRESS)
    }

    pub fn get_battery_level() -> Self {
        Self::bare(Opcode::GET_BATTERY_LEVEL)
    }

    pub fn get_temperature() -> Self {
        Self::bare(Opcode::GET_TEMPERATURE)
    }

    pub fn radio_reset() -> Self {
        Self::bare(Opcode::RADIO_RESET)
    }

    pub fn connect(timeout: u16, adv_interval: u16) -> Self {
        Self::advertise(Opcode::CONNECT, timeout, adv_interval)
    }

    pub fn bond(timeout: u16, adv_interval: u16) -> Self {
        Self::advertise(Opcode::BOND, timeout, adv_interval)
    }

    pub fn broadcast(timeout: u16, adv_interval: u16) -> Self {
        Self::advertise(Opcode::BROADCAST, timeout, adv_interval)
    }

    fn advertise(opcode: Opcode, timeout: u16, adv_interval: u16) -> Self {
        let mut cmd = Self::bare(opcode);
        cmd.buf[0] = 5;
        cmd.buf[2..4].copy_from_slice(&timeout.to_le_bytes());
        cmd.buf[4..6].copy_from_slice(&adv_interval.to_le_bytes());
        cmd
    }

    pub fn disconnect(reason: u8) -> Self {
        Self::with_byte(Opcode::DISCONNECT, reason)
    }

    pub fn set_tx_power(level: u8) -> Self {
        Self::with_byte(Opcode::SET_TX_POWER, level)
    }

    pub fn change_timing_request(params: Option<TimingParams>) -> Self {
        let mut cmd = Self::bare(Opcode::CHANGE_TIMING_REQUEST);
        if let Some(p) = params {
            cmd.buf[0] = 9;
            cmd.buf[2..4].copy_from_slice(&p.interval_min.to_le_bytes());
            cmd.buf[4..6].copy_from_slice(&p.interval_max.to_le_bytes());
            cmd.buf[6..8].copy_from_slice(&p.slave_latency.to_le_bytes());
            cmd.buf[8..10].copy_from_slice(&p.timeout.to_le_bytes());
        }
        cmd
    }

    pub fn open_remote_pipe(pipe: u8) -> Self {
        Self::with_byte(Opcode::OPEN_REMOTE_PIPE, pipe)
    }

    pub fn close_remote_pipe(pipe: u8) -> Self {
        Self::with_byte(Opcode::CLOSE_REMOTE_PIPE, pipe)
    }

    pub fn set_appl_latency(enabled: bool, latency: u16) -> Self {
        let mut cmd = Self::with_byte(Opcode::SET_APPL_LATENCY, u8::from(enabled));
        cmd.buf[0] = 4;
        cmd.buf[3..5].copy_from_slice(&latency.to_le_bytes());
        cmd
    }

    pub fn set_key(key: Key) -> Self {
        match key {
            Key::None => Self::with_byte(Opcode::SET_KEY, 0),
            Key::Passkey(passkey) => {
                let mut cmd = Self::with_byte(Opcode::SET_KEY, 1);
                cmd.buf[0] = 2 + PASSKEY_LEN as u8;
                cmd.buf[3..3 + PASSKEY_LEN].copy_from_slice(&passkey);
                cmd
            }
        }
    }

    pub fn open_adv_pipe(pipes: u64) -> Self {
        let mut cmd = Self::bare(Opcode::OPEN_ADV_PIPE);
        cmd.buf[0] = 9;
        cmd.buf[2..10].copy_from_slice(&pipes.to_le_bytes());
        cmd
    }

    pub fn bond_security_request() -> Self {
        Self::bare(Opcode::BOND_SECURITY_REQUEST)
    }

    pub fn directed_connect() -> Self {
        Self::bare(Opcode::DIRECTED_CONNECT)
    }

    pub fn send_data(pipe: u8, data: &[u8]) -> Result<Self, Error> {
        Self::from_parts(Opcode::SEND_DATA, &[&[pipe], data])
    }

    pub fn set_local_data(pipe: u8, data: &[u8]) -> Result<Self, Error> {
        Self::from_parts(Opcode::SET_LOCAL_DATA, &[&[pipe], data])
    }

    pub fn request_data(pipe: u8) -> Self {
        Self::with_byte(Opcode::REQUEST_DATA, pipe)
    }

    pub fn send_data_ack(pipe: u8) -> Self {
        Self::with_byte(Opcode::SEND_DATA_ACK, pipe)
    }

    pub fn send_data_nack(pipe: u8, error_code: u8) -> Self {
        let mut cmd = Self::with_byte(Opcode::SEND_DATA_NACK, pipe);
        cmd.buf[0] = 3;
        cmd.buf[3] = error_code;
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_byte_counts_opcode_and_payload() {
        let cmd = Command::echo(b"hello").unwrap();
        assert_eq!(cmd.as_bytes(), &[6, 0x02, b'h', b'e', b'l', b'l', b'o']);
        assert_eq!(cmd.opcode(), Opcode::ECHO);
        assert_eq!(cmd.payload(), b"hello");

        assert_eq!(Command::sleep().as_bytes(), &[1, 0x04]);
    }

    #[test]
    fn oversized_payloads_are_rejected() {
        assert!(Command::echo(&[0; MAX_ECHO_LEN]).is_ok());
        assert_eq!(Command::echo(&[0; MAX_ECHO_LEN + 1]), Err(Error::DataTooLong));
        assert!(Command::send_data(1, &[0; MAX_DATA_LEN]).is_ok());
        assert_eq!(Command::send_data(1, &[0; MAX_DATA_LEN + 1]), Err(Error::DataTooLong));
    }

    #[test]
    fn multi_byte_fields_are_little_endian() {
        assert_eq!(Command::connect(180, 0x0050).as_bytes(), &[5, 0x0f, 180, 0, 0x50, 0]);
        assert_eq!(
            Command::open_adv_pipe(0x0102).as_bytes(),
            &[9, 0x1b, 0x02, 0x01, 0, 0, 0, 0, 0, 0]
        );
        assert_eq!(Command::set_appl_latency(true, 0x1234).as_bytes(), &[4, 0x19, 1, 0x34, 0x12]);
        assert_eq!(Command::send_data_nack(3, 0x90).as_bytes(), &[3, 0x18, 3, 0x90]);
    }

    #[test]
    fn dtm_command_is_big_endian() {
        assert_eq!(Command::dtm_command(0x1234).as_bytes(), &[3, 0x03, 0x12, 0x34]);
    }

    #[test]
    fn change_timing_request_forms() {
        assert_eq!(Command::change_timing_request(None).as_bytes(), &[1, 0x13]);
        let params = TimingParams {
            interval_min: 6,
            interval_max: 12,
            slave_latency: 0,
            timeout: 400,
        };
        assert_eq!(
            Command::change_timing_request(Some(params)).as_bytes(),
            &[9, 0x13, 6, 0, 12, 0, 0, 0, 0x90, 0x01]
        );
    }

    #[test]
    fn set_key_forms() {
        assert_eq!(Command::set_key(Key::None).as_bytes(), &[2, 0x1a, 0]);
        assert_eq!(
            Command::set_key(Key::Passkey(*b"123456")).as_bytes(),
            &[8, 0x1a, 1, b'1', b'2', b'3', b'4', b'5', b'6']
        );
    }

    #[test]
    fn frames_keep_only_declared_bytes() {
        let frame = [3, 0x06, 0xaa, 0xbb, 0xcc, 0xdd];
        let cmd = Command::from_frame(&frame).unwrap();
        assert_eq!(cmd.as_bytes(), &[3, 0x06, 0xaa, 0xbb]);
        assert_eq!(cmd.opcode(), Opcode::SETUP);

        assert_eq!(Command::from_frame(&[]), Err(Error::InvalidParameter));
        assert_eq!(Command::from_frame(&[4, 0x06, 0]), Err(Error::InvalidParameter));
        assert_eq!(Command::from_frame(&[33; 40]), Err(Error::DataTooLong));
    }
}
