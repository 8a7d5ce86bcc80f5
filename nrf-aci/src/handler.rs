//! Event handler registry.

use bt_hci::param::BdAddr;

use crate::event::{AddressType, BondStatus, Connection, DeviceVersion, Event, ResponseData};
use crate::{BatteryLevel, Opcode, Status, Temperature};

/// Category of a [`Notification`], one handler slot each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HandlerKind {
    /// Failed commands, and successful ones without typed response data.
    CommandResponse,
    Temperature,
    BatteryLevel,
    DeviceVersion,
    DeviceAddress,
    DynamicData,
    Connected,
    Disconnected,
    BondStatus,
    KeyRequest,
    PipeError,
    DataReceived,
    DataAck,
}

impl HandlerKind {
    pub const COUNT: usize = 13;

    const fn index(self) -> usize {
        self as usize
    }
}

/// Typed payload handed to a category handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Notification<'a> {
    CommandResponse {
        opcode: Opcode,
        status: Status,
        data: ResponseData<'a>,
    },
    Temperature(Temperature),
    BatteryLevel(BatteryLevel),
    DeviceVersion(DeviceVersion),
    DeviceAddress {
        address: BdAddr,
        address_type: AddressType,
    },
    DynamicData {
        sequence_no: u8,
        data: &'a [u8],
    },
    Connected(Connection),
    Disconnected {
        aci_status: Status,
        btle_status: u8,
    },
    BondStatus(BondStatus<'a>),
    KeyRequest {
        key_type: u8,
    },
    PipeError {
        pipe: u8,
        error_code: Status,
        data: &'a [u8],
    },
    DataReceived {
        pipe: u8,
        data: &'a [u8],
    },
    DataAck {
        pipe: u8,
    },
}

impl Notification<'_> {
    pub fn kind(&self) -> HandlerKind {
        match self {
            Notification::CommandResponse { .. } => HandlerKind::CommandResponse,
            Notification::Temperature(_) => HandlerKind::Temperature,
            Notification::BatteryLevel(_) => HandlerKind::BatteryLevel,
            Notification::DeviceVersion(_) => HandlerKind::DeviceVersion,
            Notification::DeviceAddress { .. } => HandlerKind::DeviceAddress,
            Notification::DynamicData { .. } => HandlerKind::DynamicData,
            Notification::Connected(_) => HandlerKind::Connected,
            Notification::Disconnected { .. } => HandlerKind::Disconnected,
            Notification::BondStatus(_) => HandlerKind::BondStatus,
            Notification::KeyRequest { .. } => HandlerKind::KeyRequest,
            Notification::PipeError { .. } => HandlerKind::PipeError,
            Notification::DataReceived { .. } => HandlerKind::DataReceived,
            Notification::DataAck { .. } => HandlerKind::DataAck,
        }
    }
}

pub type Handler<'d> = &'d mut dyn FnMut(&Notification<'_>);
pub type Listener<'d> = &'d mut dyn FnMut(&Event<'_>);

/// One optional handler per [`HandlerKind`], plus a listener that sees every decoded event.
pub struct Handlers<'d> {
    slots: [Option<Handler<'d>>; HandlerKind::COUNT],
    listener: Option<Listener<'d>>,
}

impl Default for Handlers<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'d> Handlers<'d> {
    pub fn new() -> Self {
        Handlers {
            slots: core::array::from_fn(|_| None),
            listener: None,
        }
    }

    /// Install `handler` for `kind`, returning the one it replaces.
    pub fn register(&mut self, kind: HandlerKind, handler: Handler<'d>) -> Option<Handler<'d>> {
        self.slots[kind.index()].replace(handler)
    }

    pub fn unregister(&mut self, kind: HandlerKind) -> Option<Handler<'d>> {
        self.slots[kind.index()].take()
    }

    pub fn set_listener(&mut self, listener: Listener<'d>) -> Option<Listener<'d>> {
        self.listener.replace(listener)
    }

    pub fn clear_listener(&mut self) -> Option<Listener<'d>> {
        self.listener.take()
    }

    pub(crate) fn notify(&mut self, notification: &Notification<'_>) {
        if let Some(handler) = self.slots[notification.kind().index()].as_mut() {
            handler(notification);
        }
    }

    pub(crate) fn listen(&mut self, event: &Event<'_>) {
        if let Some(listener) = self.listener.as_mut() {
            listener(event);
        }
    }
}
