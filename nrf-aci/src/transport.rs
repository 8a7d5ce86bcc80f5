//! One REQN/RDYN handshake per call: send a command, receive whatever the radio has queued.

use crate::command::{Command, MAX_PACKET_LEN};
use crate::dispatch::dispatch;
use crate::event::{Event, RX_FRAME_LEN};
use crate::fmt::Bytes;
use crate::interface::Interface;
use crate::{Aci, Error};

impl<'d, I: Interface> Aci<'d, I> {
    /// Run one transaction and dispatch the event it returns.
    ///
    /// With a command, the radio is selected right away and the ready line is waited on without
    /// limit. Without one, the radio is only selected once it asserts the ready line by itself:
    /// `timeout_ms == 0` waits without limit, any other value gives up after `timeout_ms` with
    /// [`Error::Timeout`], leaving the bus and the session untouched.
    pub(crate) fn transact(&mut self, command: Option<&Command>, timeout_ms: u16) -> Result<(), Error> {
        let debit = command.is_some_and(|c| c.opcode().consumes_credit());
        if debit && self.session.credits() == 0 {
            debug!("[aci] no credits left");
            return Err(Error::InsufficientCredits);
        }

        let mut tx = [0u8; RX_FRAME_LEN];
        let tx_len = match command {
            Some(command) => {
                trace!("[aci] tx {:?}: {:?}", command.opcode(), Bytes(command.as_bytes()));
                tx[..command.as_bytes().len()].copy_from_slice(command.as_bytes());
                usize::from(command.as_bytes()[0])
            }
            None if timeout_ms == 0 => {
                while !self.interface.is_ready().map_err(bus_error)? {}
                0
            }
            None => {
                if !self.wait_ready_for(timeout_ms)? {
                    debug!("[aci] no event within {} ms", timeout_ms);
                    return Err(Error::Timeout);
                }
                0
            }
        };

        let mut rx = [0u8; RX_FRAME_LEN];
        self.interface.acquire().map_err(bus_error)?;
        let exchanged = self.exchange(&tx, tx_len, &mut rx);
        let finished = self.finish();
        self.interface.release();
        let rx_len = exchanged?;
        finished?;

        if debit {
            self.session.take_credit();
        }

        let body = &rx[2..2 + rx_len];
        trace!("[aci] rx {:?}", Bytes(&rx[..2 + rx_len]));
        match Event::decode(body) {
            Some(event) => dispatch(&mut self.session, &mut self.handlers, &event),
            None => trace!("[aci] nothing received"),
        }
        Ok(())
    }

    /// Select the radio, wait for it, and clock the packet through. Returns the received length.
    fn exchange(&mut self, tx: &[u8; RX_FRAME_LEN], tx_len: usize, rx: &mut [u8; RX_FRAME_LEN]) -> Result<usize, Error> {
        self.interface.select().map_err(bus_error)?;
        while !self.interface.is_ready().map_err(bus_error)? {}

        self.interface.transfer(&mut rx[..2], &tx[..2]).map_err(bus_error)?;
        let rx_len = usize::from(rx[1]);
        assert!(rx_len <= MAX_PACKET_LEN, "received packet too long: {}", rx_len);

        let remaining = rx_len.max(tx_len.saturating_sub(1));
        if remaining > 0 {
            self.interface
                .transfer(&mut rx[2..2 + remaining], &tx[2..2 + remaining])
                .map_err(bus_error)?;
        }
        Ok(rx_len)
    }

    /// Deselect the radio and wait for it to drop the ready line.
    fn finish(&mut self) -> Result<(), Error> {
        self.interface.deselect().map_err(bus_error)?;
        while self.interface.is_ready().map_err(bus_error)? {}
        Ok(())
    }

    fn wait_ready_for(&mut self, timeout_ms: u16) -> Result<bool, Error> {
        let timeout = u32::from(timeout_ms);
        let mut waited = 0u32;
        while waited < timeout {
            if self.interface.is_ready().map_err(bus_error)? {
                return Ok(true);
            }
            let step = self.config.poll_interval_ms.min(timeout - waited);
            self.interface.delay_ms(step);
            waited += step;
        }
        Ok(false)
    }
}

pub(crate) fn bus_error<E>(_: E) -> Error {
    error!("[aci] interface failure");
    Error::Bus
}
