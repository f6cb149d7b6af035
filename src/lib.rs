//! Per-flow feature extraction for IEC 61850 GOOSE traffic.
//!
//! Frames are parsed once into a [`GoosePacket`], keyed into bidirectional
//! flows by a [`FlowMeter`], and summarized as [`FlowFeatures`] records.

#[macro_use]
extern crate tracing;

#[macro_use]
pub mod internal_events;

pub mod config;
pub mod features;
pub mod fields;
pub mod flow;
pub mod frame;
pub mod meter;
pub mod packet;
pub mod stats;
pub mod trace;

pub use config::{ConfigError, FlowMeterConfig};
pub use features::FlowFeatures;
pub use fields::{ApduStatus, ProtocolFields};
pub use flow::{FlowAggregate, FlowKey, KeyError};
pub use frame::{PacketDirection, RawFrame};
pub use meter::FlowMeter;
pub use packet::GoosePacket;
pub use stats::StatSummary;
