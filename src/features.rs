//! The flat per-flow feature record and the helpers that compute it.

use chrono::DateTime;
use goose_parser::format_timestamp;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    fields::ProtocolFields,
    flow::FlowAggregate,
    frame::PacketDirection,
    packet::GoosePacket,
    stats::StatSummary,
};

/// One output row. Field names are the column names downstream models were
/// trained on.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FlowFeatures {
    pub src_mac: String,
    pub dst_mac: String,
    pub appid: u16,
    #[serde(rename = "gocbRef")]
    pub gocb_ref: String,
    #[serde(rename = "stNum")]
    pub st_num: i64,
    #[serde(rename = "sqNum_Norm")]
    pub sq_num_norm: f64,

    #[serde(rename = "timeAllowedtoLive")]
    pub time_allowed_to_live: i64,
    #[serde(rename = "datSet")]
    pub dat_set: String,
    #[serde(rename = "goID")]
    pub go_id: String,
    pub test: bool,
    #[serde(rename = "confRev")]
    pub conf_rev: i64,
    #[serde(rename = "ndsCom")]
    pub nds_com: bool,
    #[serde(rename = "numDatSetEntries")]
    pub num_dat_set_entries: i64,

    pub timestamp: String,
    pub flow_duration: f64,
    pub flow_byts_s: f64,
    pub flow_pkts_s: f64,

    pub tot_flow_pkts: u64,
    pub tot_len_flow_pkts: u64,
    pub pkt_len_max: f64,
    pub pkt_len_min: f64,
    pub pkt_len_mean: f64,
    pub pkt_len_std: f64,
    pub pkt_len_var: f64,
    pub pkt_len_median: f64,

    pub flow_header_len: u64,
    pub flow_seg_size_min: u64,

    pub flow_iat_max: f64,
    pub flow_iat_min: f64,
    pub flow_iat_mean: f64,
    pub flow_iat_std: f64,
    pub flow_iat_median: f64,
    pub flow_iat_tot: f64,

    pub pkt_size_avg: f64,

    pub active_max: f64,
    pub active_min: f64,
    pub active_mean: f64,
    pub active_std: f64,
    pub idle_max: f64,
    pub idle_min: f64,
    pub idle_mean: f64,
    pub idle_std: f64,

    pub flow_byts_b_avg: f64,
    pub flow_pkts_b_avg: f64,
    pub flow_blk_rate_avg: f64,

    pub flow_label: u16,
}

impl FlowFeatures {
    pub fn from_aggregate(flow: &FlowAggregate) -> Self {
        let key = flow.key();
        let timing = flow.timing();
        let bulk = flow.bulk();
        let default_metadata = ProtocolFields::default();
        let metadata = flow.metadata().unwrap_or(&default_metadata);

        let lengths = packet_lengths(flow);
        let length = StatSummary::summarize(&lengths);
        let iat = StatSummary::summarize(timing.interarrival());
        let forward_iat = StatSummary::summarize(&interarrival(flow, PacketDirection::Forward));
        let active = StatSummary::summarize(flow.activity().active());
        let idle = StatSummary::summarize(flow.activity().idle());

        Self {
            src_mac: key.source.to_string(),
            dst_mac: key.destination.to_string(),
            appid: key.appid,
            gocb_ref: key.gocb_ref.clone(),
            st_num: key.st_num,
            sq_num_norm: timing.sq_num_norm(),

            time_allowed_to_live: metadata.time_allowed_to_live,
            dat_set: metadata.dat_set.clone(),
            go_id: metadata.go_id.clone(),
            test: metadata.test,
            conf_rev: metadata.conf_rev,
            nds_com: metadata.nds_com,
            num_dat_set_entries: metadata.num_dat_set_entries,

            timestamp: start_time(flow),
            flow_duration: 1e6 * timing.duration(),
            flow_byts_s: byte_rate(flow),
            flow_pkts_s: packet_rate(flow),

            tot_flow_pkts: flow.len() as u64,
            tot_len_flow_pkts: total_bytes(flow, PacketDirection::Forward),
            pkt_len_max: length.max,
            pkt_len_min: length.min,
            pkt_len_mean: length.mean,
            pkt_len_std: length.std,
            pkt_len_var: length.variance(),
            pkt_len_median: length.median,

            flow_header_len: header_bytes(flow, PacketDirection::Forward),
            flow_seg_size_min: min_header_bytes(flow, PacketDirection::Forward),

            flow_iat_max: iat.max,
            flow_iat_min: iat.min,
            flow_iat_mean: iat.mean,
            flow_iat_std: iat.std,
            flow_iat_median: iat.median,
            flow_iat_tot: forward_iat.total,

            pkt_size_avg: average_packet_size(flow),

            active_max: active.max,
            active_min: active.min,
            active_mean: active.mean,
            active_std: active.std,
            idle_max: idle.max,
            idle_min: idle.min,
            idle_mean: idle.mean,
            idle_std: idle.std,

            flow_byts_b_avg: bulk.bytes_per_bulk(),
            flow_pkts_b_avg: bulk.packets_per_bulk(),
            flow_blk_rate_avg: bulk.rate(),

            flow_label: flow.label(),
        }
    }

    /// The record as a JSON object keyed by column name.
    pub fn to_map(&self) -> Result<Map<String, Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Err(serde::ser::Error::custom("feature record is not an object")),
        }
    }
}

fn directed(
    flow: &FlowAggregate,
    direction: PacketDirection,
) -> impl Iterator<Item = &GoosePacket> {
    flow.packets()
        .iter()
        .filter(move |(_, packet_direction)| *packet_direction == direction)
        .map(|(packet, _)| packet)
}

/// First packet time, formatted in UTC. Empty before any packet.
pub fn start_time(flow: &FlowAggregate) -> String {
    flow.timing()
        .start()
        .and_then(|start| DateTime::from_timestamp_micros((start * 1e6).round() as i64))
        .map(|start| format_timestamp(&start))
        .unwrap_or_default()
}

pub fn packet_lengths(flow: &FlowAggregate) -> Vec<f64> {
    flow.packets()
        .iter()
        .map(|(packet, _)| packet.len() as f64)
        .collect()
}

/// Frame bytes sent in one direction.
pub fn total_bytes(flow: &FlowAggregate, direction: PacketDirection) -> u64 {
    directed(flow, direction)
        .map(|packet| packet.len() as u64)
        .sum()
}

fn all_bytes(flow: &FlowAggregate) -> u64 {
    flow.packets()
        .iter()
        .map(|(packet, _)| packet.len() as u64)
        .sum()
}

/// Bytes per second over the whole flow. Zero for an instantaneous flow.
pub fn byte_rate(flow: &FlowAggregate) -> f64 {
    let duration = flow.timing().duration();
    if duration == 0.0 {
        0.0
    } else {
        all_bytes(flow) as f64 / duration
    }
}

/// Packets per second over the whole flow. Zero for an instantaneous flow.
pub fn packet_rate(flow: &FlowAggregate) -> f64 {
    let duration = flow.timing().duration();
    if duration == 0.0 {
        0.0
    } else {
        flow.len() as f64 / duration
    }
}

pub fn average_packet_size(flow: &FlowAggregate) -> f64 {
    if flow.is_empty() {
        0.0
    } else {
        all_bytes(flow) as f64 / flow.len() as f64
    }
}

pub fn header_bytes(flow: &FlowAggregate, direction: PacketDirection) -> u64 {
    directed(flow, direction)
        .map(|packet| packet.header_size() as u64)
        .sum()
}

pub fn min_header_bytes(flow: &FlowAggregate, direction: PacketDirection) -> u64 {
    directed(flow, direction)
        .map(|packet| packet.header_size() as u64)
        .min()
        .unwrap_or_default()
}

/// Microseconds between consecutive packets of one direction.
pub fn interarrival(flow: &FlowAggregate, direction: PacketDirection) -> Vec<f64> {
    let timestamps: Vec<f64> = directed(flow, direction)
        .map(GoosePacket::timestamp)
        .collect();
    timestamps
        .windows(2)
        .map(|pair| 1e6 * (pair[1] - pair[0]))
        .collect()
}
