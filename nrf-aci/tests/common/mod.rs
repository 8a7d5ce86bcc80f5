#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use nrf_aci::{Aci, Interface};

/// Consecutive idle ready-line samples after which a blocking wait is considered hung.
const HANG_LIMIT: usize = 10_000;

type Responder = Box<dyn FnMut(&[u8]) -> Vec<Vec<u8>>>;

#[derive(Default)]
pub struct Chip {
    /// Event bodies (tag and payload) waiting to be clocked out.
    pub queue: VecDeque<Vec<u8>>,
    /// Every command frame received, `[length, opcode, payload...]`.
    pub sent: Vec<Vec<u8>>,
    pub transfers: usize,
    pub elapsed_ms: u32,
    pub resets: usize,
    pub in_reset: bool,
    pub bus_held: bool,
    selected: bool,
    acknowledging: bool,
    idle_samples: usize,
    frame: Vec<u8>,
    rx_pos: usize,
    tx: Vec<u8>,
    responder: Option<Responder>,
}

/// A scripted nRF8001 behind the [`Interface`] primitives.
///
/// Each transaction clocks out the oldest queued event (or an empty packet). Commands are
/// recorded on deselect and handed to the responder, whose events are queued for later
/// transactions, as on the real radio.
#[derive(Clone, Default)]
pub struct FakeChip(Rc<RefCell<Chip>>);

impl FakeChip {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: Vec<u8>) {
        self.0.borrow_mut().queue.push_back(event);
    }

    pub fn respond_with(&self, responder: impl FnMut(&[u8]) -> Vec<Vec<u8>> + 'static) {
        self.0.borrow_mut().responder = Some(Box::new(responder));
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.0.borrow().sent.clone()
    }

    pub fn sent_opcodes(&self) -> Vec<u8> {
        self.0.borrow().sent.iter().map(|frame| frame[1]).collect()
    }

    pub fn transfers(&self) -> usize {
        self.0.borrow().transfers
    }

    pub fn elapsed_ms(&self) -> u32 {
        self.0.borrow().elapsed_ms
    }

    pub fn resets(&self) -> usize {
        self.0.borrow().resets
    }

    pub fn in_reset(&self) -> bool {
        self.0.borrow().in_reset
    }

    pub fn bus_held(&self) -> bool {
        self.0.borrow().bus_held
    }

    pub fn queued(&self) -> usize {
        self.0.borrow().queue.len()
    }
}

impl Interface for FakeChip {
    type Error = Infallible;

    fn acquire(&mut self) -> Result<(), Self::Error> {
        let mut chip = self.0.borrow_mut();
        assert!(!chip.bus_held, "bus acquired twice");
        chip.bus_held = true;
        Ok(())
    }

    fn release(&mut self) {
        self.0.borrow_mut().bus_held = false;
    }

    fn select(&mut self) -> Result<(), Self::Error> {
        let mut chip = self.0.borrow_mut();
        assert!(chip.bus_held, "selected without holding the bus");
        let body = chip.queue.pop_front().unwrap_or_default();
        let mut frame = vec![0, body.len() as u8];
        frame.extend(body);
        chip.frame = frame;
        chip.rx_pos = 0;
        chip.tx.clear();
        chip.selected = true;
        Ok(())
    }

    fn deselect(&mut self) -> Result<(), Self::Error> {
        let chip = &mut *self.0.borrow_mut();
        chip.selected = false;
        chip.acknowledging = true;
        if let Some(&len) = chip.tx.first() {
            if len > 0 {
                let frame = chip.tx[..=usize::from(len)].to_vec();
                if let Some(responder) = chip.responder.as_mut() {
                    chip.queue.extend(responder(&frame));
                }
                chip.sent.push(frame);
            }
        }
        chip.tx.clear();
        Ok(())
    }

    fn is_ready(&mut self) -> Result<bool, Self::Error> {
        let mut chip = self.0.borrow_mut();
        if chip.selected {
            return Ok(true);
        }
        if chip.acknowledging {
            chip.acknowledging = false;
            return Ok(false);
        }
        if chip.queue.is_empty() {
            chip.idle_samples += 1;
            assert!(chip.idle_samples < HANG_LIMIT, "radio never became ready");
            return Ok(false);
        }
        chip.idle_samples = 0;
        Ok(true)
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        let mut chip = self.0.borrow_mut();
        assert!(chip.selected, "transfer without REQN");
        assert_eq!(read.len(), write.len());
        chip.transfers += 1;
        for (i, byte) in read.iter_mut().enumerate() {
            *byte = chip.frame.get(chip.rx_pos + i).copied().unwrap_or(0);
        }
        chip.rx_pos += read.len();
        chip.tx.extend_from_slice(write);
        Ok(())
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.borrow_mut().elapsed_ms += ms;
    }

    fn delay_us(&mut self, _us: u32) {}

    fn set_reset(&mut self, asserted: bool) -> Result<(), Self::Error> {
        let mut chip = self.0.borrow_mut();
        if asserted {
            chip.resets += 1;
        }
        chip.in_reset = asserted;
        Ok(())
    }
}

pub const MODE_TEST: u8 = 0x01;
pub const MODE_SETUP: u8 = 0x02;
pub const MODE_STANDBY: u8 = 0x03;

pub fn device_started(mode: u8, credits: u8) -> Vec<u8> {
    vec![0x81, mode, 0x00, credits]
}

pub fn command_response(opcode: u8, status: u8, data: &[u8]) -> Vec<u8> {
    let mut body = vec![0x84, opcode, status];
    body.extend_from_slice(data);
    body
}

pub fn connected() -> Vec<u8> {
    vec![0x85, 0x01, 1, 2, 3, 4, 5, 6, 0x18, 0x00, 0x00, 0x00, 0x90, 0x01, 0x00]
}

pub fn disconnected() -> Vec<u8> {
    vec![0x86, 0x03, 0x13]
}

pub fn pipe_status(open: u64) -> Vec<u8> {
    let mut body = vec![0x88];
    body.extend_from_slice(&open.to_le_bytes());
    body.extend_from_slice(&(!open).to_le_bytes());
    body
}

pub fn data_credit(credits: u8) -> Vec<u8> {
    vec![0x8a, credits]
}

pub fn data_received(pipe: u8, data: &[u8]) -> Vec<u8> {
    let mut body = vec![0x8c, pipe];
    body.extend_from_slice(data);
    body
}

/// Drain every queued event.
pub fn drain(chip: &FakeChip, aci: &mut Aci<'_, FakeChip>) {
    while chip.queued() > 0 {
        aci.poll(1).unwrap();
    }
}

/// A provisioned radio in standby with `credits` credits.
pub fn standby(chip: &FakeChip, aci: &mut Aci<'_, FakeChip>, credits: u8) {
    chip.push(device_started(MODE_STANDBY, credits));
    chip.push(device_started(MODE_STANDBY, credits));
    drain(chip, aci);
}

/// A provisioned, connected radio with the pipes in `open` open.
pub fn connected_with_pipes(chip: &FakeChip, aci: &mut Aci<'_, FakeChip>, credits: u8, open: u64) {
    standby(chip, aci, credits);
    chip.push(connected());
    chip.push(pipe_status(open));
    drain(chip, aci);
}
