//! The driver handle and its command surface.

use crate::command::{Command, Key, TimingParams, PIPE_COUNT};
use crate::handler::{Handler, HandlerKind, Handlers, Listener};
use crate::interface::Interface;
use crate::session::{ConnectionStatus, DeviceMode, Session};
use crate::transport::bus_error;
use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) struct Config {
    pub(crate) poll_interval_ms: u32,
    pub(crate) setup_retry_limit: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            poll_interval_ms: 1,
            setup_retry_limit: None,
        }
    }
}

/// Driver configuration.
#[derive(Debug, Clone, Default)]
pub struct Builder {
    config: Config,
}

impl Builder {
    pub fn new() -> Self {
        Builder::default()
    }

    /// Spacing of ready-line samples when polling with a finite timeout. Defaults to 1 ms.
    pub fn poll_interval_ms(mut self, interval: u32) -> Result<Self, Error> {
        if interval == 0 {
            return Err(Error::InvalidParameter);
        }
        self.config.poll_interval_ms = interval;
        Ok(self)
    }

    /// How many rejected setup messages are tolerated before giving up.
    ///
    /// `None`, the default, allows as many rejections as the service has messages.
    pub fn setup_retry_limit(mut self, limit: Option<usize>) -> Result<Self, Error> {
        self.config.setup_retry_limit = limit;
        Ok(self)
    }

    pub fn build<'d, I: Interface>(self, interface: I) -> Aci<'d, I> {
        Aci {
            interface,
            session: Session::new(),
            handlers: Handlers::new(),
            config: self.config,
        }
    }
}

/// An nRF8001 attached through `I`.
///
/// Every call runs at most one full transaction and returns once the event it produced has been
/// dispatched. Events the radio sends on its own are only picked up by [`Aci::poll`] or as a side
/// effect of another command.
pub struct Aci<'d, I> {
    pub(crate) interface: I,
    pub(crate) session: Session,
    pub(crate) handlers: Handlers<'d>,
    pub(crate) config: Config,
}

impl<'d, I: Interface> Aci<'d, I> {
    pub fn new(interface: I) -> Self {
        Builder::new().build(interface)
    }

    /// Forget everything known about the radio and pulse its reset line.
    pub fn reset(&mut self) -> Result<(), Error> {
        info!("[aci] reset");
        self.session = Session::new();
        self.interface.set_reset(true).map_err(bus_error)?;
        self.interface.delay_us(1);
        self.interface.set_reset(false).map_err(bus_error)
    }

    /// Receive one event, if the radio has one within `timeout_ms` (`0` waits forever).
    pub fn poll(&mut self, timeout_ms: u16) -> Result<(), Error> {
        self.transact(None, timeout_ms)
    }

    pub fn register_handler(&mut self, kind: HandlerKind, handler: Handler<'d>) -> Option<Handler<'d>> {
        self.handlers.register(kind, handler)
    }

    pub fn unregister_handler(&mut self, kind: HandlerKind) -> Option<Handler<'d>> {
        self.handlers.unregister(kind)
    }

    /// Install a listener that sees every decoded event after its category handler.
    pub fn set_listener(&mut self, listener: Listener<'d>) -> Option<Listener<'d>> {
        self.handlers.set_listener(listener)
    }

    pub fn clear_listener(&mut self) -> Option<Listener<'d>> {
        self.handlers.clear_listener()
    }

    fn require_standby(&self) -> Result<(), Error> {
        if self.session.mode == DeviceMode::Standby {
            Ok(())
        } else {
            debug!("[aci] command needs standby, mode is {:?}", self.session.mode);
            Err(Error::InvalidState)
        }
    }

    fn send(&mut self, command: &Command) -> Result<(), Error> {
        self.transact(Some(command), 0)
    }
}

/// Informational
impl<'d, I> Aci<'d, I> {
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn mode(&self) -> DeviceMode {
        self.session.mode()
    }

    pub fn credits(&self) -> u8 {
        self.session.credits()
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.session.connection_status()
    }

    pub fn is_pipe_open(&self, pipe: u8) -> bool {
        self.session.is_pipe_open(pipe)
    }

    pub fn pipes_open(&self) -> u64 {
        self.session.pipes_open()
    }
}

/// System commands
impl<'d, I: Interface> Aci<'d, I> {
    pub fn test(&mut self, feature: u8) -> Result<(), Error> {
        self.require_standby()?;
        self.send(&Command::test(feature))
    }

    pub fn sleep(&mut self) -> Result<(), Error> {
        self.require_standby()?;
        self.send(&Command::sleep())
    }

    pub fn wakeup(&mut self) -> Result<(), Error> {
        self.require_standby()?;
        self.send(&Command::wakeup())
    }

    pub fn echo(&mut self, data: &[u8]) -> Result<(), Error> {
        self.require_standby()?;
        self.send(&Command::echo(data)?)
    }

    /// Direct test mode command, usable in any mode.
    pub fn dtm_command(&mut self, command: u16) -> Result<(), Error> {
        self.send(&Command::dtm_command(command))
    }

    pub fn radio_reset(&mut self) -> Result<(), Error> {
        self.send(&Command::radio_reset())
    }

    pub fn get_device_version(&mut self) -> Result<(), Error> {
        self.require_standby()?;
        self.send(&Command::get_device_version())
    }

    pub fn get_device_address(&mut self) -> Result<(), Error> {
        self.require_standby()?;
        self.send(&Command::get_device_address())
    }

    pub fn get_battery_level(&mut self) -> Result<(), Error> {
        self.require_standby()?;
        self.send(&Command::get_battery_level())
    }

    pub fn get_temperature(&mut self) -> Result<(), Error> {
        self.require_standby()?;
        self.send(&Command::get_temperature())
    }

    pub fn set_tx_power(&mut self, level: u8) -> Result<(), Error> {
        self.require_standby()?;
        self.send(&Command::set_tx_power(level))
    }

    pub fn read_dynamic_data(&mut self) -> Result<(), Error> {
        self.require_standby()?;
        self.send(&Command::read_dynamic_data())
    }

    pub fn write_dynamic_data(&mut self, sequence_no: u8, data: &[u8]) -> Result<(), Error> {
        self.require_standby()?;
        self.send(&Command::write_dynamic_data(sequence_no, data)?)
    }
}

/// Link and advertising commands
impl<'d, I: Interface> Aci<'d, I> {
    /// Start connectable advertising. `timeout` is in seconds, `adv_interval` in 0.625 ms units.
    pub fn connect(&mut self, timeout: u16, adv_interval: u16) -> Result<(), Error> {
        self.require_standby()?;
        let previous = self.session.connection;
        self.session.connection = ConnectionStatus::Connecting;
        self.send(&Command::connect(timeout, adv_interval)).inspect_err(|_| {
            self.session.connection = previous;
        })
    }

    pub fn bond(&mut self, timeout: u16, adv_interval: u16) -> Result<(), Error> {
        self.require_standby()?;
        self.send(&Command::bond(timeout, adv_interval))
    }

    pub fn broadcast(&mut self, timeout: u16, adv_interval: u16) -> Result<(), Error> {
        self.require_standby()?;
        self.send(&Command::broadcast(timeout, adv_interval))
    }

    pub fn directed_connect(&mut self) -> Result<(), Error> {
        self.require_standby()?;
        self.send(&Command::directed_connect())
    }

    pub fn disconnect(&mut self, reason: u8) -> Result<(), Error> {
        self.require_standby()?;
        if !self.session.is_connected() {
            debug!("[aci] disconnect while {:?}", self.session.connection);
            return Err(Error::InvalidState);
        }
        self.send(&Command::disconnect(reason))
    }

    pub fn change_timing_request(&mut self, params: Option<TimingParams>) -> Result<(), Error> {
        self.require_standby()?;
        self.send(&Command::change_timing_request(params))
    }

    pub fn set_appl_latency(&mut self, enabled: bool, latency: u16) -> Result<(), Error> {
        self.require_standby()?;
        self.send(&Command::set_appl_latency(enabled, latency))
    }

    /// Answer a key request. A passkey must be six ASCII digits.
    pub fn set_key(&mut self, key: Key) -> Result<(), Error> {
        self.require_standby()?;
        if let Key::Passkey(passkey) = key {
            if !passkey.iter().all(u8::is_ascii_digit) {
                return Err(Error::InvalidParameter);
            }
        }
        self.send(&Command::set_key(key))
    }

    pub fn bond_security_request(&mut self) -> Result<(), Error> {
        self.require_standby()?;
        self.send(&Command::bond_security_request())
    }

    /// Open the advertising service data pipes in `pipes`, one bit per pipe.
    pub fn open_adv_pipe(&mut self, pipes: u64) -> Result<(), Error> {
        self.require_standby()?;
        self.send(&Command::open_adv_pipe(pipes))
    }

    pub fn open_remote_pipe(&mut self, pipe: u8) -> Result<(), Error> {
        self.require_standby()?;
        check_pipe(pipe)?;
        self.send(&Command::open_remote_pipe(pipe))
    }

    pub fn close_remote_pipe(&mut self, pipe: u8) -> Result<(), Error> {
        self.require_standby()?;
        check_pipe(pipe)?;
        self.send(&Command::close_remote_pipe(pipe))
    }
}

/// Data commands
impl<'d, I: Interface> Aci<'d, I> {
    /// Send `data` over `pipe`, using one credit.
    ///
    /// Checks, in order: standby, connected, pipe open, credit available, length. A pipe number
    /// outside `0..64` is never open.
    pub fn send_data(&mut self, pipe: u8, data: &[u8]) -> Result<(), Error> {
        self.require_standby()?;
        if !self.session.is_connected() {
            debug!("[aci] send on pipe {} while {:?}", pipe, self.session.connection);
            return Err(Error::NotConnected);
        }
        if !self.session.is_pipe_open(pipe) {
            debug!("[aci] pipe {} not open", pipe);
            return Err(Error::PipeNotOpen);
        }
        if self.session.credits() == 0 {
            debug!("[aci] no credits left");
            return Err(Error::InsufficientCredits);
        }
        self.send(&Command::send_data(pipe, data)?)
    }

    /// Ask the peer for the value behind `pipe`, using one credit.
    pub fn request_data(&mut self, pipe: u8) -> Result<(), Error> {
        self.require_standby()?;
        check_pipe(pipe)?;
        self.send(&Command::request_data(pipe))
    }

    pub fn send_data_ack(&mut self, pipe: u8) -> Result<(), Error> {
        self.require_standby()?;
        check_pipe(pipe)?;
        self.send(&Command::send_data_ack(pipe))
    }

    pub fn send_data_nack(&mut self, pipe: u8, error_code: u8) -> Result<(), Error> {
        self.require_standby()?;
        check_pipe(pipe)?;
        self.send(&Command::send_data_nack(pipe, error_code))
    }

    /// Update the value a local pipe serves. Does not use a credit.
    pub fn set_local_data(&mut self, pipe: u8, data: &[u8]) -> Result<(), Error> {
        self.require_standby()?;
        check_pipe(pipe)?;
        self.send(&Command::set_local_data(pipe, data)?)
    }
}

fn check_pipe(pipe: u8) -> Result<(), Error> {
    if pipe < PIPE_COUNT {
        Ok(())
    } else {
        Err(Error::InvalidParameter)
    }
}
