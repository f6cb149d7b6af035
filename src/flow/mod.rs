//! Per-flow state: identity, packet ingestion and the timing state machines.

mod activity;
mod aggregate;
mod bulk;
mod key;
mod timing;

pub use self::{
    activity::ActivityState,
    aggregate::FlowAggregate,
    bulk::BulkState,
    key::{FlowKey, KeyError},
    timing::TimingState,
};
