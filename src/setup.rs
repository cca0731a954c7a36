//! SETUP packet assembly.
//!
//! The endpoint engine hands over the SETUP stage one byte per cycle: the
//! eight-byte payload followed by the two CRC16 bytes. Only the first four
//! bytes (bmRequestType, bRequest, wValue) and byte 6 (the low wLength byte)
//! are retained; wIndex and the high wLength byte are consumed and dropped —
//! this device never consults them.

/// Bytes delivered per SETUP packet: 8 payload + 2 CRC16.
pub const SETUP_STREAM_BYTES: u8 = 10;

/// Accumulates one SETUP packet from the engine's byte stream.
///
/// Bytes 0–3 shift into a 32-bit composite register, newest byte in the low
/// byte. After four bytes the composite reads as
/// `{bmRequestType, bRequest, wValue.lo, wValue.hi}` from the top down, so
/// bits \[16:32) are the request half of the lookup key and bits \[0:16) are
/// the byte-swapped wValue — the same packing the descriptor table keys use.
#[derive(Clone, Copy, Debug, Default)]
pub struct SetupAssembler {
    packet: u32,
    length: u8,
    index: u8,
}

impl SetupAssembler {
    /// Restarts assembly for a fresh SETUP indication.
    ///
    /// Only the byte index is rewound; the retained slots are fully
    /// overwritten during the next assembly pass.
    pub fn reset(&mut self) {
        self.index = 0;
    }

    /// Routes one received byte to its slot and advances the index.
    pub fn push(&mut self, byte: u8) {
        match self.index {
            0..=3 => self.packet = self.packet << 8 | u32::from(byte),
            6 => self.length = byte,
            // wIndex (4, 5), the high wLength byte (7), and the CRC16 tail
            // (8, 9) are received but unused.
            _ => {}
        }
        self.index = self.index.wrapping_add(1);
    }

    /// The full SETUP stream has been consumed.
    pub fn complete(&self) -> bool {
        self.index >= SETUP_STREAM_BYTES
    }

    /// `{bmRequestType, bRequest}` as one word, e.g. 0x8006 for
    /// GET_DESCRIPTOR.
    pub fn request_and_type(&self) -> u16 {
        (self.packet >> 16) as u16
    }

    /// Byte-swapped wValue: the on-wire low byte sits in bits \[8:16).
    pub fn value(&self) -> u16 {
        self.packet as u16
    }

    /// Low byte of wLength. Descriptor responses never exceed 255 bytes.
    pub fn length(&self) -> u8 {
        self.length
    }

    /// Direction bit of bmRequestType: device-to-host.
    pub fn is_in(&self) -> bool {
        self.packet & 0x8000_0000 != 0
    }

    /// Composite descriptor-table key: request word in the high half,
    /// byte-swapped wValue in the low half.
    pub fn key(&self) -> u32 {
        self.packet
    }
}
