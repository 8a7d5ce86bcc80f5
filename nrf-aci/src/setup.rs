//! Provisioning the radio's services.

use crate::command::{Command, MAX_PACKET_LEN};
use crate::interface::Interface;
use crate::session::{DeviceMode, SetupProgress};
use crate::{Aci, Error};

/// One pre-built setup message, as generated by nRFgo Studio: `[length, opcode, payload...]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetupMessage {
    /// Status byte that precedes each message in the generated tables. Not sent.
    pub status: u8,
    pub buffer: [u8; MAX_PACKET_LEN],
}

impl SetupMessage {
    pub const fn new(status: u8, buffer: [u8; MAX_PACKET_LEN]) -> Self {
        SetupMessage { status, buffer }
    }
}

/// The ordered list of setup messages describing the radio's services.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServiceDefinition {
    messages: &'static [SetupMessage],
}

impl ServiceDefinition {
    pub const fn new(messages: &'static [SetupMessage]) -> Self {
        ServiceDefinition { messages }
    }

    pub fn messages(&self) -> &'static [SetupMessage] {
        self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl<'d, I: Interface> Aci<'d, I> {
    /// Send `service` to the radio and wait until it reports standby.
    ///
    /// Blocks until the radio has reported its mode after reset. A message the radio neither
    /// continues nor completes is sent again, up to the configured retry limit (the number of
    /// messages by default). Fails with [`Error::SetupError`] if the messages run out first, in
    /// which case [`Aci::setup`] has to be called again, usually after a reset.
    pub fn setup(&mut self, service: &ServiceDefinition) -> Result<(), Error> {
        while self.session.mode == DeviceMode::Initial {
            self.transact(None, 0)?;
        }
        if !matches!(self.session.mode, DeviceMode::PreSetup | DeviceMode::SetupInProgress) {
            debug!("[aci] setup in mode {:?}", self.session.mode);
            return Err(Error::InvalidState);
        }

        let retry_limit = self.config.setup_retry_limit.unwrap_or(service.len());
        info!("[aci] setup: {} messages", service.len());
        self.session.setup = SetupProgress::Pending { index: 0, rejections: 0 };
        self.session.reply_pending = false;

        loop {
            if self.session.mode == DeviceMode::Standby {
                info!("[aci] setup complete");
                return Ok(());
            }

            let (index, rejections) = match self.session.setup {
                SetupProgress::Pending { index, rejections } => (index, rejections),
                // Complete always comes with standby. Idle means someone reset mid-sequence.
                SetupProgress::Complete | SetupProgress::Idle => return Err(Error::SetupError),
            };
            if rejections > retry_limit {
                warn!("[aci] setup message {} rejected {} times", index, rejections);
                self.session.setup = SetupProgress::Idle;
                return Err(Error::SetupError);
            }
            let Some(message) = service.messages.get(index) else {
                warn!("[aci] setup messages exhausted before standby");
                self.session.setup = SetupProgress::Idle;
                return Err(Error::SetupError);
            };

            if self.session.reply_pending {
                self.transact(None, 0)?;
            } else {
                debug!("[aci] setup message {}", index);
                let command = Command::from_frame(&message.buffer)?;
                self.session.reply_pending = true;
                if let Err(err) = self.transact(Some(&command), 0) {
                    self.session.reply_pending = false;
                    return Err(err);
                }
            }
        }
    }
}
