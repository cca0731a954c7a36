#![allow(dead_code)]

use std::collections::VecDeque;

use usb_selfenum::{EndpointEngine, SelfEnumDevice};

/// Queue-backed endpoint engine standing in for the real PHY/FIFO block.
///
/// SETUP and OUT data are plain FIFOs; IN traffic is recorded per call. The
/// OUT event flag is level-triggered on OUT data being present, and
/// `auto_in_event` models a host that drains armed IN packets immediately
/// (the IN event rises as soon as a byte is staged). Status-stage-only
/// transfers stage nothing, so tests raise `in_event` by hand for those.
#[derive(Default)]
pub struct MockEngine {
    pub setup_fifo: VecDeque<u8>,
    pub out_fifo: VecDeque<u8>,
    pub out_epno: u8,
    /// `(epno, byte)` per `in_send_byte` call, in order.
    pub in_sent: Vec<(u8, u8)>,
    pub in_event: bool,
    pub auto_in_event: bool,
    pub address: u8,
    pub address_writes: Vec<u8>,
    pub armed_in: Vec<u8>,
    pub armed_out: Vec<u8>,
    pub pullup: bool,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            auto_in_event: true,
            ..Self::default()
        }
    }

    /// Queues a SETUP packet followed by the two CRC16 bytes the engine
    /// exposes after the payload.
    pub fn push_setup(&mut self, request_type: u8, request: u8, value: u16, index: u16, length: u16) {
        let [value_lo, value_hi] = value.to_le_bytes();
        let [index_lo, index_hi] = index.to_le_bytes();
        let [length_lo, length_hi] = length.to_le_bytes();
        for byte in [
            request_type,
            request,
            value_lo,
            value_hi,
            index_lo,
            index_hi,
            length_lo,
            length_hi,
            0x00,
            0x00,
        ] {
            self.setup_fifo.push_back(byte);
        }
    }

    /// Queues one OUT packet for endpoint `epno`.
    pub fn push_out(&mut self, epno: u8, data: &[u8]) {
        self.out_epno = epno;
        self.out_fifo.extend(data.iter().copied());
    }

    /// Bytes staged for IN endpoint `epno`, in order.
    pub fn in_bytes(&self, epno: u8) -> Vec<u8> {
        self.in_sent
            .iter()
            .filter(|(ep, _)| *ep == epno)
            .map(|(_, byte)| *byte)
            .collect()
    }
}

impl EndpointEngine for MockEngine {
    fn setup_available(&self) -> bool {
        !self.setup_fifo.is_empty()
    }

    fn setup_next_byte(&self) -> u8 {
        self.setup_fifo.front().copied().unwrap_or(0x00)
    }

    fn setup_consume_ack(&mut self) {
        self.setup_fifo.pop_front();
    }

    fn out_available(&self, epno: u8) -> bool {
        epno == self.out_epno && !self.out_fifo.is_empty()
    }

    fn out_next_byte(&self) -> u8 {
        self.out_fifo.front().copied().unwrap_or(0x00)
    }

    fn out_consume_ack(&mut self) {
        self.out_fifo.pop_front();
    }

    fn out_event_pending(&self) -> bool {
        !self.out_fifo.is_empty()
    }

    fn out_event_ack(&mut self) {}

    fn in_send_byte(&mut self, epno: u8, byte: u8) {
        self.in_sent.push((epno, byte));
        if self.auto_in_event {
            self.in_event = true;
        }
    }

    fn in_event_pending(&self) -> bool {
        self.in_event
    }

    fn in_event_ack(&mut self) {
        self.in_event = false;
    }

    fn arm_in(&mut self, epno: u8) {
        self.armed_in.push(epno);
    }

    fn arm_out(&mut self, epno: u8) {
        self.armed_out.push(epno);
    }

    fn set_device_address(&mut self, addr: u8) {
        self.address = addr;
        self.address_writes.push(addr);
    }

    fn pullup_enable(&mut self, enable: bool) {
        self.pullup = enable;
    }
}

/// Advances the device by `ticks` cycles.
pub fn run(dev: &mut SelfEnumDevice, eng: &mut MockEngine, ticks: usize) {
    for _ in 0..ticks {
        dev.tick(eng);
    }
}

/// Generous cycle budget: the longest supported transfer (10 SETUP bytes plus
/// a 62-byte descriptor response) completes well inside it.
pub const TICK_BUDGET: usize = 200;
