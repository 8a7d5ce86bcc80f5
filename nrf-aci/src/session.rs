//! Host-side mirror of the radio's state.

use crate::event::OperatingMode;
use crate::PIPE_COUNT;

/// The radio's operating mode, as tracked by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceMode {
    /// No mode report received since the last reset.
    Initial,
    /// The radio is in standby but has not been provisioned.
    PreSetup,
    /// The radio is accepting setup messages.
    SetupInProgress,
    /// The radio is provisioned and operational.
    Standby,
    Test,
}

impl DeviceMode {
    /// The mode after a `DeviceStarted` report.
    ///
    /// The radio reports standby both before and after provisioning. Straight out of reset it
    /// means unprovisioned; from any other mode it means provisioned.
    pub fn on_started(self, reported: OperatingMode) -> Self {
        match reported {
            OperatingMode::Standby if self == DeviceMode::Initial => DeviceMode::PreSetup,
            OperatingMode::Standby => DeviceMode::Standby,
            OperatingMode::Setup => DeviceMode::SetupInProgress,
            OperatingMode::Test => DeviceMode::Test,
            OperatingMode::Unknown(_) => self,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionStatus {
    Disconnected,
    /// Advertising was started; no `Connected` event yet.
    Connecting,
    Connected,
}

/// Position in the setup message list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SetupProgress {
    /// No setup sequence is running.
    Idle,
    /// Sending the message at `index`. `rejections` counts non-transaction replies so far.
    Pending { index: usize, rejections: usize },
    /// The radio reported the transaction complete.
    Complete,
}

/// Everything the driver knows about the radio.
///
/// `credits` and `pipes_open` are authoritative as of the last decoded event, except for the
/// debit applied when a data command is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Session {
    pub(crate) mode: DeviceMode,
    pub(crate) connection: ConnectionStatus,
    pub(crate) credits: u8,
    pub(crate) pipes_open: u64,
    pub(crate) setup: SetupProgress,
    /// A setup message has been sent and its response not yet dispatched.
    pub(crate) reply_pending: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub const fn new() -> Self {
        Session {
            mode: DeviceMode::Initial,
            connection: ConnectionStatus::Disconnected,
            credits: 0,
            pipes_open: 0,
            setup: SetupProgress::Idle,
            reply_pending: false,
        }
    }

    pub fn mode(&self) -> DeviceMode {
        self.mode
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.connection
    }

    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionStatus::Connected
    }

    pub fn credits(&self) -> u8 {
        self.credits
    }

    /// Bitmap of open pipes, bit `n` for pipe `n`.
    pub fn pipes_open(&self) -> u64 {
        self.pipes_open
    }

    pub fn is_pipe_open(&self, pipe: u8) -> bool {
        pipe < PIPE_COUNT && self.pipes_open & (1 << pipe) != 0
    }

    pub fn setup_progress(&self) -> SetupProgress {
        self.setup
    }

    pub(crate) fn grant_credits(&mut self, credits: u8) {
        self.credits = self.credits.saturating_add(credits);
    }

    /// Take one credit. Returns `false`, leaving the count untouched, if none are left.
    pub(crate) fn take_credit(&mut self) -> bool {
        match self.credits.checked_sub(1) {
            Some(credits) => {
                self.credits = credits;
                true
            }
            None => false,
        }
    }
}
