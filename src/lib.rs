//! Self-enumerating USB device core.
//!
//! This crate implements the control-transfer half of a minimal full-speed USB
//! device: it parses SETUP packets delivered one byte at a time by a
//! lower-level endpoint engine, answers the standard enumeration requests out
//! of a static descriptor table, and loops bulk OUT traffic on endpoint 2 back
//! to the host on bulk IN endpoint 2.
//!
//! The endpoint engine itself (bit-level signaling, CRC, FIFOs) is external;
//! this crate only consumes its register-level contract through the
//! [`EndpointEngine`] trait. The device is advanced one clock cycle at a time
//! via [`SelfEnumDevice::tick`], so a host-side model or testbench can drive
//! it deterministically.

pub mod descriptors;
pub mod device;
pub mod engine;
pub mod setup;

pub use descriptors::{DescriptorError, DescriptorTable, DeviceConfig};
pub use device::SelfEnumDevice;
pub use engine::EndpointEngine;
