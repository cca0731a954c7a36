//! Static descriptor table and request resolver.
//!
//! Every response this device can give — descriptors, status words, and
//! zero-length acknowledgements — lives in one concatenated byte blob built at
//! construction time. Each supported request maps a 32-bit composite key
//! (`{bmRequestType, bRequest}` in the high half, byte-swapped wValue in the
//! low half, matching [`crate::setup::SetupAssembler::key`]) to an
//! offset/length pair into that blob. The table is immutable after build;
//! resolution is an exact-match lookup with no miss handling beyond `None`.

use std::collections::BTreeMap;

use thiserror::Error;

/// UTF-16 code-unit limit for string descriptor sources; longer strings
/// overflow the descriptor's one-byte length field.
pub const MAX_STRING_UNITS: usize = 126;

const DESC_TYPE_STRING: u8 = 0x03;

/// Identity and diagnostics knobs supplied at construction.
#[derive(Clone, Debug)]
pub struct DeviceConfig {
    pub vendor_id: u16,
    pub product_id: u16,
    pub manufacturer: String,
    pub product: String,
    /// Enables per-byte trace diagnostics in the state machine. No protocol
    /// effect.
    pub debug: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            vendor_id: 0x1209,
            product_id: 0x5bf2,
            manufacturer: "GsD".to_owned(),
            product: "OrangeCrab CDC".to_owned(),
            debug: false,
        }
    }
}

/// Construction-time failures. Nothing at run time returns an error; the
/// state machine resolves protocol oddities locally by clamping or defaulting.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("string descriptor source is {units} UTF-16 units, limit is {MAX_STRING_UNITS}")]
    StringTooLong { units: usize },
}

/// Immutable request-key → response-bytes mapping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DescriptorTable {
    blob: Vec<u8>,
    entries: BTreeMap<u32, (u32, u16)>,
}

impl DescriptorTable {
    /// Builds the full response table for `config`.
    ///
    /// Entry insertion order fixes the blob layout, so identical inputs
    /// always produce identical offset/length tables. Offset 0 holds a
    /// sentinel byte no entry points at.
    pub fn build(config: &DeviceConfig) -> Result<Self, DescriptorError> {
        let mut table = Self {
            blob: vec![0x00],
            entries: BTreeMap::new(),
        };

        table.add(0x8006, 0x0002, &configuration_descriptor());
        table.add(
            0x8006,
            0x0001,
            &device_descriptor(config.vendor_id, config.product_id),
        );
        table.add(0x8006, 0x0003, &STRING_ZERO);
        table.add(0x8006, 0x0103, &string_descriptor(&config.manufacturer)?);
        table.add(0x8006, 0x0203, &string_descriptor(&config.product)?);
        table.add(0x8006, 0x000f, &BOS_DESCRIPTOR);
        table.add(0x8006, 0xee03, &MSFT_OS_STRING);
        table.add(0xc07e, 0x0000, &MS_COMPAT_ID);
        // GET_STATUS: self-powered/remote-wakeup bits all clear.
        table.add(0x8000, 0x0000, &[0x00, 0x00]);
        // SET_CONFIGURATION(1): acknowledged with an empty data stage.
        table.add(0x0009, 0x0100, &[]);

        Ok(table)
    }

    fn add(&mut self, request_and_type: u16, value: u16, bytes: &[u8]) {
        let key = u32::from(request_and_type) << 16 | u32::from(value);
        let offset = self.blob.len() as u32;
        self.entries.insert(key, (offset, bytes.len() as u16));
        self.blob.extend_from_slice(bytes);
    }

    /// Resolves a composite request key to `(offset, length)` into the blob.
    pub fn lookup(&self, key: u32) -> Option<(u32, u16)> {
        self.entries.get(&key).copied()
    }

    /// Single-byte read port into the blob. Out-of-range reads return the
    /// sentinel value; streaming cursors built from [`lookup`] results never
    /// go out of range.
    ///
    /// [`lookup`]: DescriptorTable::lookup
    pub fn byte(&self, offset: u32) -> u8 {
        self.blob.get(offset as usize).copied().unwrap_or(0x00)
    }

    /// Total blob size in bytes, sentinel included.
    pub fn len(&self) -> usize {
        self.blob.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blob.is_empty()
    }
}

/// Encodes a string descriptor: total length, type tag 0x03, UTF-16LE body.
fn string_descriptor(s: &str) -> Result<Vec<u8>, DescriptorError> {
    let units: Vec<u16> = s.encode_utf16().collect();
    if units.len() > MAX_STRING_UNITS {
        return Err(DescriptorError::StringTooLong { units: units.len() });
    }
    let mut out = Vec::with_capacity(2 + units.len() * 2);
    out.push((units.len() * 2 + 2) as u8);
    out.push(DESC_TYPE_STRING);
    for unit in units {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    Ok(out)
}

fn device_descriptor(vid: u16, pid: u16) -> [u8; 18] {
    let [vid_lo, vid_hi] = vid.to_le_bytes();
    let [pid_lo, pid_hi] = pid.to_le_bytes();
    [
        0x12, // bLength
        0x01, // bDescriptorType
        0x00, 0x02, // bcdUSB 2.00
        0x02, // bDeviceClass (CDC)
        0x00, // bDeviceSubClass
        0x00, // bDeviceProtocol
        0x40, // bMaxPacketSize0
        vid_lo, vid_hi, // idVendor
        pid_lo, pid_hi, // idProduct
        0x01, 0x01, // bcdDevice
        0x01, // iManufacturer
        0x02, // iProduct
        0x00, // iSerialNumber
        0x01, // bNumConfigurations
    ]
}

/// CDC ACM configuration: control interface with its functional descriptors
/// and interrupt endpoint, plus a data interface with one bulk endpoint pair.
fn configuration_descriptor() -> [u8; 62] {
    [
        // Configuration descriptor.
        0x09, // bLength
        0x02, // bDescriptorType
        62, 0x00, // wTotalLength
        0x02, // bNumInterfaces
        0x01, // bConfigurationValue
        0x00, // iConfiguration
        0x80, // bmAttributes (bus powered)
        0x32, // bMaxPower (100mA)
        // Interface 0: Communications (Abstract Control Model).
        0x09, // bLength
        0x04, // bDescriptorType
        0x00, // bInterfaceNumber
        0x00, // bAlternateSetting
        0x01, // bNumEndpoints
        0x02, // bInterfaceClass
        0x02, // bInterfaceSubClass
        0x00, // bInterfaceProtocol
        0x00, // iInterface
        // Header functional descriptor.
        0x05, // bFunctionLength
        0x24, // bDescriptorType (CS_INTERFACE)
        0x00, // bDescriptorSubtype
        0x10, 0x01, // bcdCDC 1.10
        // ACM functional descriptor.
        0x04, // bFunctionLength
        0x24, // bDescriptorType
        0x02, // bDescriptorSubtype
        0x02, // bmCapabilities
        // Union functional descriptor.
        0x05, // bLength
        0x24, // bDescriptorType
        0x06, // bDescriptorSubtype
        0x00, // bControlInterface
        0x01, // bSubordinateInterface0
        // Notification endpoint (Interrupt IN 1).
        0x07, // bLength
        0x05, // bDescriptorType
        0x81, // bEndpointAddress
        0x03, // bmAttributes
        0x08, 0x00, // wMaxPacketSize
        0x40, // bInterval
        // Interface 1: CDC Data.
        0x09, // bLength
        0x04, // bDescriptorType
        0x01, // bInterfaceNumber
        0x00, // bAlternateSetting
        0x02, // bNumEndpoints
        0x0a, // bInterfaceClass
        0x00, // bInterfaceSubClass
        0x00, // bInterfaceProtocol
        0x00, // iInterface
        // Bulk OUT endpoint 2.
        0x07, // bLength
        0x05, // bDescriptorType
        0x02, // bEndpointAddress
        0x02, // bmAttributes
        0x40, 0x00, // wMaxPacketSize
        0x00, // bInterval
        // Bulk IN endpoint 2.
        0x07, // bLength
        0x05, // bDescriptorType
        0x82, // bEndpointAddress
        0x02, // bmAttributes
        0x40, 0x00, // wMaxPacketSize
        0x00, // bInterval
    ]
}

// String descriptor zero: one supported LANGID, en-US (0x0409).
const STRING_ZERO: [u8; 4] = [0x04, 0x03, 0x09, 0x04];

// BOS descriptor advertising the MS OS 2.0 platform capability.
const BOS_DESCRIPTOR: [u8; 29] = [
    0x05, 0x0f, 0x1d, 0x00, 0x01, 0x18, 0x10, 0x05, //
    0x00, 0x38, 0xb6, 0x08, 0x34, 0xa9, 0x09, 0xa0, //
    0x47, 0x8b, 0xfd, 0xa0, 0x76, 0x88, 0x15, 0xb6, //
    0x65, 0x00, 0x01, 0x02, 0x01,
];

// String descriptor 0xee: "MSFT100" with vendor code 0x7e.
const MSFT_OS_STRING: [u8; 18] = [
    0x12, 0x03, 0x4d, 0x53, 0x46, 0x54, 0x31, 0x30, //
    0x30, 0x7e, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
    0x00, 0x00,
];

// Microsoft compatibility ID descriptor binding the device to WINUSB.
const MS_COMPAT_ID: [u8; 40] = [
    0x28, 0x00, 0x00, 0x00, 0x00, 0x01, 0x04, 0x00, //
    0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
    0x00, 0x01, 0x57, 0x49, 0x4e, 0x55, 0x53, 0x42, //
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];
