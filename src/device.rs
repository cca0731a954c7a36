//! Control-transfer state machine and bulk loopback path.

use tracing::trace;

use crate::descriptors::{DescriptorError, DescriptorTable, DeviceConfig};
use crate::engine::EndpointEngine;
use crate::setup::SetupAssembler;

const CONTROL_EP: u8 = 0;
const ECHO_EP: u8 = 2;

/// `{bmRequestType, bRequest}` of SET_ADDRESS.
const REQ_SET_ADDRESS: u16 = 0x0005;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Idle,
    Wait,
    Setup,
    SetupIn,
    WaitTransaction,
    Echo,
}

/// Offset/remaining pair tracking an in-progress descriptor response.
#[derive(Clone, Copy, Debug, Default)]
struct StreamCursor {
    addr: u32,
    remaining: u16,
}

/// Self-enumerating USB device: answers the standard enumeration requests
/// from the descriptor table and echoes bulk traffic on endpoint 2.
///
/// The device advances one clock cycle per [`tick`] call and polls the
/// engine's flags each cycle; nothing blocks and nothing is interrupt-driven.
/// One control transfer is in flight at a time, serialized by the state
/// machine itself.
///
/// [`tick`]: SelfEnumDevice::tick
pub struct SelfEnumDevice {
    table: DescriptorTable,
    state: State,
    assembler: SetupAssembler,
    cursor: StreamCursor,
    /// Read address latched last cycle, emitted this cycle. The descriptor
    /// read port has one cycle of latency; the enable must trail the address
    /// by exactly one tick so the data strobe lines up with valid data.
    pending_read: Option<u32>,
    /// Address latch. Written by SET_ADDRESS, applied to the engine only on
    /// Idle re-entry so the carrying transaction completes at the old
    /// address.
    address: u8,
    debug: bool,
}

impl SelfEnumDevice {
    pub fn new(config: DeviceConfig) -> Result<Self, DescriptorError> {
        let table = DescriptorTable::build(&config)?;
        Ok(Self {
            table,
            state: State::Idle,
            assembler: SetupAssembler::default(),
            cursor: StreamCursor::default(),
            pending_read: None,
            address: 0,
            debug: config.debug,
        })
    }

    /// Returns the device to its power-on state and asserts the pull-up.
    pub fn reset(&mut self, engine: &mut dyn EndpointEngine) {
        self.state = State::Idle;
        self.assembler.reset();
        self.cursor = StreamCursor::default();
        self.pending_read = None;
        self.address = 0;
        engine.pullup_enable(true);
    }

    /// Currently latched device address.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Advances the state machine by one clock cycle.
    pub fn tick(&mut self, engine: &mut dyn EndpointEngine) {
        match self.state {
            State::Idle => {
                // Sole place the address latch reaches the engine.
                engine.set_device_address(self.address);
                engine.arm_out(ECHO_EP);
                self.set_state(State::Wait);
            }

            State::Wait => {
                engine.arm_in(CONTROL_EP);
                engine.arm_out(CONTROL_EP);
                if engine.setup_available() {
                    engine.out_event_ack();
                    self.assembler.reset();
                    self.set_state(State::Setup);
                } else if engine.out_event_pending() {
                    engine.out_event_ack();
                    if engine.out_available(ECHO_EP) {
                        self.set_state(State::Echo);
                    }
                    // OUT events on other endpoints are acknowledged with no
                    // further action.
                }
            }

            State::Setup => {
                if engine.setup_available() {
                    let byte = engine.setup_next_byte();
                    if self.debug {
                        trace!(byte, "setup byte");
                    }
                    self.assembler.push(byte);
                    engine.setup_consume_ack();
                }
                if self.assembler.complete() {
                    self.finish_setup();
                }
            }

            State::SetupIn => {
                if let Some(addr) = self.pending_read.take() {
                    engine.in_send_byte(CONTROL_EP, self.table.byte(addr));
                }
                if self.cursor.remaining > 0 {
                    self.pending_read = Some(self.cursor.addr);
                    self.cursor.addr += 1;
                    self.cursor.remaining -= 1;
                } else if engine.in_event_pending() {
                    self.set_state(State::WaitTransaction);
                }
            }

            State::WaitTransaction => {
                // Don't-care drain of any trailing OUT stage.
                engine.out_consume_ack();
                if engine.in_event_pending() {
                    engine.in_event_ack();
                    self.set_state(State::Idle);
                }
            }

            State::Echo => {
                if engine.out_available(ECHO_EP) {
                    let byte = engine.out_next_byte();
                    if self.debug {
                        trace!(byte, "echo byte");
                    }
                    engine.in_send_byte(ECHO_EP, byte);
                    engine.out_consume_ack();
                } else {
                    engine.arm_in(ECHO_EP);
                    self.set_state(State::WaitTransaction);
                }
            }
        }
    }

    /// Acts on a fully assembled SETUP packet.
    fn finish_setup(&mut self) {
        if self.assembler.request_and_type() == REQ_SET_ADDRESS {
            // The on-wire address byte sits in value() bits [8:16); USB
            // addresses are 7 bits.
            self.address = (self.assembler.value() >> 8) as u8 & 0x7f;
            self.set_state(State::WaitTransaction);
            return;
        }

        if self.assembler.is_in() {
            if let Some((offset, length)) = self.table.lookup(self.assembler.key()) {
                if length > 0 {
                    // Truncate, never reject: hosts routinely ask for more
                    // than the descriptor holds.
                    self.cursor = StreamCursor {
                        addr: offset,
                        remaining: length.min(u16::from(self.assembler.length())),
                    };
                    self.pending_read = None;
                    self.set_state(State::SetupIn);
                    return;
                }
            }
        }

        // Unmatched requests and matched requests with no data stage
        // complete silently.
        self.set_state(State::Idle);
    }

    fn set_state(&mut self, next: State) {
        trace!(from = ?self.state, to = ?next, "transition");
        self.state = next;
    }
}
