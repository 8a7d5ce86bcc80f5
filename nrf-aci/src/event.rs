//! Inbound ACI packets.
//!
//! An event on the wire is `[debug, length, tag, payload...]`, where `length` counts the tag and
//! the payload. Decoding only ever looks at the `length` bytes the radio declared; whatever else
//! sits in the receive buffer is ignored.

use bt_hci::param::BdAddr;

use crate::command::{MAX_PACKET_LEN, PASSKEY_LEN};
use crate::{BatteryLevel, Opcode, Status, Temperature};

/// Size of the receive buffer: debug byte, length byte and the largest packet.
pub const RX_FRAME_LEN: usize = 2 + MAX_PACKET_LEN;

mod tag {
    pub const DEVICE_STARTED: u8 = 0x81;
    pub const ECHO: u8 = 0x82;
    pub const HARDWARE_ERROR: u8 = 0x83;
    pub const COMMAND_RESPONSE: u8 = 0x84;
    pub const CONNECTED: u8 = 0x85;
    pub const DISCONNECTED: u8 = 0x86;
    pub const BOND_STATUS: u8 = 0x87;
    pub const PIPE_STATUS: u8 = 0x88;
    pub const TIMING: u8 = 0x89;
    pub const DATA_CREDIT: u8 = 0x8a;
    pub const DATA_ACK: u8 = 0x8b;
    pub const DATA_RECEIVED: u8 = 0x8c;
    pub const PIPE_ERROR: u8 = 0x8d;
    pub const DISPLAY_KEY: u8 = 0x8e;
    pub const KEY_REQUEST: u8 = 0x8f;
}

/// Operating mode announced by a `DeviceStarted` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperatingMode {
    Test,
    Setup,
    /// Standby-class report. Whether the radio is provisioned depends on the previous mode.
    Standby,
    Unknown(u8),
}

impl From<u8> for OperatingMode {
    fn from(value: u8) -> Self {
        match value {
            0x01 => OperatingMode::Test,
            0x02 => OperatingMode::Setup,
            0x03 => OperatingMode::Standby,
            other => OperatingMode::Unknown(other),
        }
    }
}

/// Kind of Bluetooth address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressType {
    Public,
    RandomStatic,
    RandomPrivateResolvable,
    RandomPrivateNonResolvable,
    Unknown(u8),
}

impl From<u8> for AddressType {
    fn from(value: u8) -> Self {
        match value {
            0x01 => AddressType::Public,
            0x02 => AddressType::RandomStatic,
            0x03 => AddressType::RandomPrivateResolvable,
            0x04 => AddressType::RandomPrivateNonResolvable,
            other => AddressType::Unknown(other),
        }
    }
}

/// Parameters of a freshly established link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Connection {
    pub address_type: AddressType,
    pub peer_address: BdAddr,
    /// Connection interval, in 1.25 ms units.
    pub interval: u16,
    pub slave_latency: u16,
    /// Supervision timeout, in 10 ms units.
    pub supervision_timeout: u16,
    /// Master clock accuracy code (0 = 500 ppm ... 7 = 20 ppm).
    pub master_clock_accuracy: u8,
}

/// Connection timing reported by a `Timing` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timing {
    /// Connection interval, in 1.25 ms units.
    pub interval: u16,
    pub slave_latency: u16,
    /// Supervision timeout, in 10 ms units.
    pub supervision_timeout: u16,
}

/// Answer to `GetDeviceVersion`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceVersion {
    pub configuration_id: u16,
    pub aci_version: u8,
    pub setup_format: u8,
    pub setup_id: u32,
    /// Whether the setup data has been locked.
    pub setup_locked: bool,
}

/// Outcome of a bonding procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BondStatus<'a> {
    pub status: u8,
    pub source: u8,
    /// Security modes and exchanged keys, as sent by the radio.
    pub details: &'a [u8],
}

/// Typed contents of a successful command response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResponseData<'a> {
    DeviceVersion(DeviceVersion),
    DeviceAddress { address: BdAddr, address_type: AddressType },
    BatteryLevel(BatteryLevel),
    Temperature(Temperature),
    DynamicData { sequence_no: u8, data: &'a [u8] },
    /// Direct test mode result, MSB first on the wire.
    Dtm(u16),
    /// Anything without a typed form, including every non-success response.
    Raw(&'a [u8]),
}

/// A decoded ACI event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event<'a> {
    DeviceStarted {
        mode: OperatingMode,
        hardware_error: bool,
        credits: u8,
    },
    Echo(&'a [u8]),
    HardwareError {
        line: u16,
        file: &'a [u8],
    },
    CommandResponse {
        opcode: Opcode,
        status: Status,
        data: ResponseData<'a>,
    },
    Connected(Connection),
    Disconnected {
        aci_status: Status,
        btle_status: u8,
    },
    BondStatus(BondStatus<'a>),
    PipeStatus {
        open: u64,
        closed: u64,
    },
    Timing(Timing),
    DataCredit(u8),
    DataAck {
        pipe: u8,
    },
    DataReceived {
        pipe: u8,
        data: &'a [u8],
    },
    PipeError {
        pipe: u8,
        error_code: Status,
        data: &'a [u8],
    },
    DisplayKey([u8; PASSKEY_LEN]),
    KeyRequest {
        key_type: u8,
    },
    /// An unrecognized tag, or a known tag whose payload is too short for its fields.
    Unknown {
        tag: u8,
        payload: &'a [u8],
    },
}

impl<'a> Event<'a> {
    /// Decode the body of a received packet (tag and payload, `length` bytes).
    ///
    /// Returns `None` for an empty body, which the radio sends when it had nothing to say.
    pub fn decode(body: &'a [u8]) -> Option<Self> {
        let (&tag, payload) = body.split_first()?;
        let event = Self::decode_tagged(tag, payload).unwrap_or_else(|| {
            warn!("[aci] malformed event {:#x}: {:?}", tag, crate::fmt::Bytes(payload));
            Event::Unknown { tag, payload }
        });
        Some(event)
    }

    fn decode_tagged(tag: u8, payload: &'a [u8]) -> Option<Self> {
        let mut r = Reader::new(payload);
        let event = match tag {
            tag::DEVICE_STARTED => Event::DeviceStarted {
                mode: OperatingMode::from(r.u8()?),
                hardware_error: r.u8()? != 0,
                credits: r.u8()?,
            },
            tag::ECHO => Event::Echo(r.rest()),
            tag::HARDWARE_ERROR => Event::HardwareError {
                line: r.u16()?,
                file: trim_nul(r.rest()),
            },
            tag::COMMAND_RESPONSE => {
                let opcode = Opcode::from_raw(r.u8()?);
                let status = Status::from_raw(r.u8()?);
                let rest = r.rest();
                let data = if status.is_success() {
                    ResponseData::decode(opcode, rest).unwrap_or(ResponseData::Raw(rest))
                } else {
                    ResponseData::Raw(rest)
                };
                Event::CommandResponse { opcode, status, data }
            }
            tag::CONNECTED => Event::Connected(Connection {
                address_type: AddressType::from(r.u8()?),
                peer_address: BdAddr::new(r.array()?),
                interval: r.u16()?,
                slave_latency: r.u16()?,
                supervision_timeout: r.u16()?,
                master_clock_accuracy: r.u8()?,
            }),
            tag::DISCONNECTED => Event::Disconnected {
                aci_status: Status::from_raw(r.u8()?),
                btle_status: r.u8()?,
            },
            tag::BOND_STATUS => Event::BondStatus(BondStatus {
                status: r.u8()?,
                source: r.u8()?,
                details: r.rest(),
            }),
            tag::PIPE_STATUS => Event::PipeStatus {
                open: r.u64()?,
                closed: r.u64()?,
            },
            tag::TIMING => Event::Timing(Timing {
                interval: r.u16()?,
                slave_latency: r.u16()?,
                supervision_timeout: r.u16()?,
            }),
            tag::DATA_CREDIT => Event::DataCredit(r.u8()?),
            tag::DATA_ACK => Event::DataAck { pipe: r.u8()? },
            tag::DATA_RECEIVED => Event::DataReceived {
                pipe: r.u8()?,
                data: r.rest(),
            },
            tag::PIPE_ERROR => Event::PipeError {
                pipe: r.u8()?,
                error_code: Status::from_raw(r.u8()?),
                data: r.rest(),
            },
            tag::DISPLAY_KEY => Event::DisplayKey(r.array()?),
            tag::KEY_REQUEST => Event::KeyRequest { key_type: r.u8()? },
            _ => {
                warn!("[aci] unknown event tag {:#x}", tag);
                Event::Unknown { tag, payload }
            }
        };
        Some(event)
    }
}

impl<'a> ResponseData<'a> {
    fn decode(opcode: Opcode, data: &'a [u8]) -> Option<Self> {
        let mut r = Reader::new(data);
        let decoded = match opcode {
            Opcode::GET_DEVICE_VERSION => ResponseData::DeviceVersion(DeviceVersion {
                configuration_id: r.u16()?,
                aci_version: r.u8()?,
                setup_format: r.u8()?,
                setup_id: r.u32()?,
                setup_locked: r.u8()? == 1,
            }),
            Opcode::GET_DEVICE_ADDRESS => ResponseData::DeviceAddress {
                address: BdAddr::new(r.array()?),
                address_type: AddressType::from(r.u8()?),
            },
            Opcode::GET_BATTERY_LEVEL => ResponseData::BatteryLevel(BatteryLevel(r.u16()?)),
            Opcode::GET_TEMPERATURE => ResponseData::Temperature(Temperature(r.u16()? as i16)),
            Opcode::READ_DYNAMIC_DATA => ResponseData::DynamicData {
                sequence_no: r.u8()?,
                data: r.rest(),
            },
            Opcode::DTM_COMMAND => ResponseData::Dtm(u16::from_be_bytes(r.array()?)),
            _ => ResponseData::Raw(data),
        };
        Some(decoded)
    }
}

fn trim_nul(s: &[u8]) -> &[u8] {
    let end = s.iter().position(|&b| b == 0).unwrap_or(s.len());
    &s[..end]
}

/// Bounds-checked little-endian cursor over an event payload.
struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Reader { buf }
    }

    fn array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let (head, tail) = self.buf.split_first_chunk::<N>()?;
        self.buf = tail;
        Some(*head)
    }

    fn u8(&mut self) -> Option<u8> {
        self.array::<1>().map(|[b]| b)
    }

    fn u16(&mut self) -> Option<u16> {
        self.array().map(u16::from_le_bytes)
    }

    fn u32(&mut self) -> Option<u32> {
        self.array().map(u32::from_le_bytes)
    }

    fn u64(&mut self) -> Option<u64> {
        self.array().map(u64::from_le_bytes)
    }

    fn rest(&mut self) -> &'a [u8] {
        core::mem::take(&mut self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_is_no_event() {
        assert_eq!(Event::decode(&[]), None);
    }

    #[test]
    fn device_started() {
        assert_eq!(
            Event::decode(&[0x81, 0x03, 0x00, 0x02]),
            Some(Event::DeviceStarted {
                mode: OperatingMode::Standby,
                hardware_error: false,
                credits: 2,
            })
        );
    }

    #[test]
    fn pipe_status_masks() {
        let body = [0x88, 0x06, 0, 0, 0, 0, 0, 0, 0x80, 0x01, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(
            Event::decode(&body),
            Some(Event::PipeStatus {
                open: 0x8000_0000_0000_0006,
                closed: 0x01,
            })
        );
    }

    #[test]
    fn connected_event() {
        let body = [0x85, 0x02, 1, 2, 3, 4, 5, 6, 0x18, 0x00, 0x00, 0x00, 0x90, 0x01, 0x03];
        let Some(Event::Connected(c)) = Event::decode(&body) else {
            panic!("not a connected event");
        };
        assert_eq!(c.address_type, AddressType::RandomStatic);
        assert_eq!(c.peer_address, BdAddr::new([1, 2, 3, 4, 5, 6]));
        assert_eq!(c.interval, 24);
        assert_eq!(c.supervision_timeout, 400);
        assert_eq!(c.master_clock_accuracy, 3);
    }

    #[test]
    fn typed_response_only_on_success() {
        assert_eq!(
            Event::decode(&[0x84, 0x0c, 0x00, 0x65, 0x00]),
            Some(Event::CommandResponse {
                opcode: Opcode::GET_TEMPERATURE,
                status: Status::SUCCESS,
                data: ResponseData::Temperature(Temperature(101)),
            })
        );
        assert_eq!(
            Event::decode(&[0x84, 0x0c, 0x83]),
            Some(Event::CommandResponse {
                opcode: Opcode::GET_TEMPERATURE,
                status: Status::ERROR_DEVICE_STATE_INVALID,
                data: ResponseData::Raw(&[]),
            })
        );
    }

    #[test]
    fn negative_temperature() {
        let Some(Event::CommandResponse {
            data: ResponseData::Temperature(t),
            ..
        }) = Event::decode(&[0x84, 0x0c, 0x00, 0xf8, 0xff])
        else {
            panic!("not a temperature response");
        };
        assert_eq!(t.raw(), -8);
        assert_eq!(t.degrees(), -2);
    }

    #[test]
    fn device_version_response() {
        let body = [0x84, 0x09, 0x00, 0x34, 0x12, 0x01, 0x02, 0x78, 0x56, 0x34, 0x12, 0x01];
        assert_eq!(
            Event::decode(&body),
            Some(Event::CommandResponse {
                opcode: Opcode::GET_DEVICE_VERSION,
                status: Status::SUCCESS,
                data: ResponseData::DeviceVersion(DeviceVersion {
                    configuration_id: 0x1234,
                    aci_version: 1,
                    setup_format: 2,
                    setup_id: 0x1234_5678,
                    setup_locked: true,
                }),
            })
        );
    }

    #[test]
    fn short_typed_response_falls_back_to_raw() {
        assert_eq!(
            Event::decode(&[0x84, 0x0b, 0x00, 0x10]),
            Some(Event::CommandResponse {
                opcode: Opcode::GET_BATTERY_LEVEL,
                status: Status::SUCCESS,
                data: ResponseData::Raw(&[0x10]),
            })
        );
    }

    #[test]
    fn truncated_payload_is_unknown() {
        assert_eq!(
            Event::decode(&[0x88, 0x01, 0x02]),
            Some(Event::Unknown {
                tag: 0x88,
                payload: &[0x01, 0x02],
            })
        );
        assert_eq!(
            Event::decode(&[0x8a]),
            Some(Event::Unknown {
                tag: 0x8a,
                payload: &[],
            })
        );
    }

    #[test]
    fn unknown_tag_keeps_payload() {
        assert_eq!(
            Event::decode(&[0x42, 1, 2]),
            Some(Event::Unknown {
                tag: 0x42,
                payload: &[1, 2],
            })
        );
    }

    #[test]
    fn data_received_borrows_data() {
        assert_eq!(
            Event::decode(&[0x8c, 0x05, b'h', b'i']),
            Some(Event::DataReceived { pipe: 5, data: b"hi" })
        );
    }

    #[test]
    fn hardware_error_file_is_trimmed() {
        assert_eq!(
            Event::decode(&[0x83, 0x2a, 0x00, b'a', b'.', b'c', 0, 0, 0]),
            Some(Event::HardwareError { line: 42, file: b"a.c" })
        );
    }

    #[test]
    fn pipe_error_layout() {
        assert_eq!(
            Event::decode(&[0x8d, 0x03, 0x91, 0x09, 0x0a]),
            Some(Event::PipeError {
                pipe: 3,
                error_code: Status::ERROR_CREDIT_NOT_AVAILABLE,
                data: &[0x09, 0x0a],
            })
        );
    }

    #[test]
    fn bond_status_layout() {
        assert_eq!(
            Event::decode(&[0x87, 0x00, 0x01, 0x05, 0x06]),
            Some(Event::BondStatus(BondStatus {
                status: 0x00,
                source: 0x01,
                details: &[0x05, 0x06],
            }))
        );
    }

    #[test]
    fn key_request_layout() {
        assert_eq!(Event::decode(&[0x8f, 0x01]), Some(Event::KeyRequest { key_type: 1 }));
    }

    #[test]
    fn device_address_response() {
        assert_eq!(
            Event::decode(&[0x84, 0x0a, 0x00, 1, 2, 3, 4, 5, 6, 0x02]),
            Some(Event::CommandResponse {
                opcode: Opcode::GET_DEVICE_ADDRESS,
                status: Status::SUCCESS,
                data: ResponseData::DeviceAddress {
                    address: BdAddr::new([1, 2, 3, 4, 5, 6]),
                    address_type: AddressType::RandomStatic,
                },
            })
        );
    }

    #[test]
    fn dynamic_data_response() {
        assert_eq!(
            Event::decode(&[0x84, 0x07, 0x00, 0x02, 0xaa, 0xbb]),
            Some(Event::CommandResponse {
                opcode: Opcode::READ_DYNAMIC_DATA,
                status: Status::SUCCESS,
                data: ResponseData::DynamicData {
                    sequence_no: 2,
                    data: &[0xaa, 0xbb],
                },
            })
        );
    }
}
