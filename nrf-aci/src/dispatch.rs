//! Applies decoded events to the session and fans them out to handlers.

use crate::event::{Event, ResponseData};
use crate::handler::{Handlers, Notification};
use crate::session::{ConnectionStatus, DeviceMode, Session, SetupProgress};
use crate::{Opcode, Status};

/// Dispatch one event: update `session`, call the category handler, then the listener.
pub fn dispatch(session: &mut Session, handlers: &mut Handlers<'_>, event: &Event<'_>) {
    debug!("[aci] event {:?}", event);

    if let Some(notification) = apply(session, event) {
        handlers.notify(&notification);
    }
    handlers.listen(event);
}

fn apply<'a>(session: &mut Session, event: &Event<'a>) -> Option<Notification<'a>> {
    match *event {
        Event::DeviceStarted { mode, credits, .. } => {
            session.mode = session.mode.on_started(mode);
            session.credits = credits;
            debug!("[aci] device started, mode {:?}, {} credits", session.mode, credits);
            None
        }
        Event::CommandResponse { opcode, status, data } => {
            if opcode == Opcode::SETUP {
                advance_setup(session, status);
            }
            Some(response_notification(opcode, status, data))
        }
        Event::Connected(connection) => {
            session.connection = ConnectionStatus::Connected;
            Some(Notification::Connected(connection))
        }
        Event::Disconnected { aci_status, btle_status } => {
            session.connection = ConnectionStatus::Disconnected;
            session.pipes_open = 0;
            Some(Notification::Disconnected { aci_status, btle_status })
        }
        Event::DataCredit(credits) => {
            session.grant_credits(credits);
            None
        }
        Event::PipeStatus { open, .. } => {
            session.pipes_open = open;
            None
        }
        Event::BondStatus(status) => Some(Notification::BondStatus(status)),
        Event::KeyRequest { key_type } => Some(Notification::KeyRequest { key_type }),
        Event::PipeError { pipe, error_code, data } => Some(Notification::PipeError { pipe, error_code, data }),
        Event::DataReceived { pipe, data } => Some(Notification::DataReceived { pipe, data }),
        Event::DataAck { pipe } => Some(Notification::DataAck { pipe }),
        Event::HardwareError { line, file } => {
            error!("[aci] hardware error at line {}: {:?}", line, crate::fmt::Bytes(file));
            None
        }
        Event::Echo(_) | Event::Timing(_) | Event::DisplayKey(_) | Event::Unknown { .. } => None,
    }
}

fn advance_setup(session: &mut Session, status: Status) {
    session.reply_pending = false;
    if status == Status::TRANSACTION_COMPLETE {
        session.mode = DeviceMode::Standby;
        session.setup = SetupProgress::Complete;
        return;
    }
    let SetupProgress::Pending { index, rejections } = session.setup else {
        debug!("[aci] setup response {:?} outside a setup sequence", status);
        return;
    };
    session.setup = match status {
        Status::TRANSACTION_CONTINUE => SetupProgress::Pending {
            index: index + 1,
            rejections,
        },
        _ => {
            debug!("[aci] setup message {} rejected: {:?}", index, status);
            SetupProgress::Pending {
                index,
                rejections: rejections + 1,
            }
        }
    };
}

fn response_notification<'a>(opcode: Opcode, status: Status, data: ResponseData<'a>) -> Notification<'a> {
    if !status.is_success() {
        return Notification::CommandResponse { opcode, status, data };
    }
    match data {
        ResponseData::Temperature(t) => Notification::Temperature(t),
        ResponseData::BatteryLevel(level) => Notification::BatteryLevel(level),
        ResponseData::DeviceVersion(version) => Notification::DeviceVersion(version),
        ResponseData::DeviceAddress { address, address_type } => {
            Notification::DeviceAddress { address, address_type }
        }
        ResponseData::DynamicData { sequence_no, data } => Notification::DynamicData { sequence_no, data },
        ResponseData::Dtm(_) | ResponseData::Raw(_) => Notification::CommandResponse { opcode, status, data },
    }
}
