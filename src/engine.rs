//! Register-level contract of the lower endpoint engine.
//!
//! The engine owns the USB PHY, per-endpoint FIFOs, and the event flags a real
//! controller exposes as CSRs. [`crate::SelfEnumDevice`] never touches the
//! wire; every cycle it polls and strobes the engine exclusively through this
//! trait. A testbench implements it with plain queues.

/// Abstract endpoint/PHY engine driven by the control state machine.
///
/// FIFO accessors are split into a peek (`*_next_byte`) and a consume strobe
/// (`*_consume_ack`) that advances the read pointer, mirroring how the
/// underlying data registers behave: reading the data CSR does not pop, the
/// acknowledge write does. Consume strobes with nothing pending are no-ops.
///
/// The SETUP stream delivers ten bytes per packet: the eight-byte SETUP
/// payload followed by the two CRC16 bytes, which the engine exposes but the
/// state machine discards.
pub trait EndpointEngine {
    /// A byte of the current SETUP packet is waiting in the SETUP FIFO.
    fn setup_available(&self) -> bool;

    /// Head of the SETUP FIFO. Only meaningful while [`setup_available`]
    /// reports `true`.
    ///
    /// [`setup_available`]: EndpointEngine::setup_available
    fn setup_next_byte(&self) -> u8;

    /// Advances the SETUP FIFO read pointer by one byte.
    fn setup_consume_ack(&mut self);

    /// OUT data is waiting and the packet at the head of the OUT FIFO is
    /// addressed to endpoint `epno`.
    fn out_available(&self, epno: u8) -> bool;

    /// Head of the OUT FIFO.
    fn out_next_byte(&self) -> u8;

    /// Advances the OUT FIFO read pointer by one byte.
    fn out_consume_ack(&mut self);

    /// An OUT-side event (packet received) is pending acknowledgement.
    fn out_event_pending(&self) -> bool;

    /// Clears the pending OUT event.
    fn out_event_ack(&mut self);

    /// Stages one byte into the IN FIFO for endpoint `epno`.
    fn in_send_byte(&mut self, epno: u8, byte: u8);

    /// An IN-side event (packet transmitted to the host) is pending
    /// acknowledgement.
    fn in_event_pending(&self) -> bool;

    /// Clears the pending IN event.
    fn in_event_ack(&mut self);

    /// Primes endpoint `epno` to answer the next IN token with the staged
    /// FIFO contents (a zero-length packet if nothing was staged).
    fn arm_in(&mut self, epno: u8);

    /// Re-enables reception on OUT endpoint `epno`.
    fn arm_out(&mut self, epno: u8);

    /// Sets the device address the engine answers to. Takes effect
    /// immediately; the caller is responsible for sequencing the write so the
    /// in-flight transaction still completes at the old address.
    fn set_device_address(&mut self, addr: u8);

    /// Drives the D+ pull-up. Asserted whenever the device is out of reset.
    fn pullup_enable(&mut self, enable: bool);
}
