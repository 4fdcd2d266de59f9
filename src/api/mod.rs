//! API clients for external services
//!
//! - device: the audio device's content, queue and event API

pub mod device;

pub use device::{DeviceClient, DeviceContent, DeviceError};
