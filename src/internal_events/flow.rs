use metrics::counter;

use super::{InternalEvent, error_stage};
use crate::flow::KeyError;

#[derive(Debug)]
pub(crate) struct FlowFrameSkipped<'a> {
    pub error: &'a KeyError,
}

impl InternalEvent for FlowFrameSkipped<'_> {
    fn emit(self) {
        debug!(
            message = "Frame cannot be keyed to a flow; skipping.",
            error = %self.error,
            reason = self.error.reason(),
            stage = error_stage::RECEIVING,
        );
        counter!("frames_skipped_total", "reason" => self.error.reason()).increment(1);
    }

    fn name(&self) -> Option<&'static str> {
        Some("FlowFrameSkipped")
    }
}

#[derive(Debug)]
pub(crate) struct FlowCreated<'a> {
    pub key: &'a crate::flow::FlowKey,
}

impl InternalEvent for FlowCreated<'_> {
    fn emit(self) {
        debug!(
            message = "New flow.",
            source = %self.key.source,
            destination = %self.key.destination,
            appid = self.key.appid,
            gocb_ref = %self.key.gocb_ref,
            st_num = self.key.st_num,
        );
        counter!("flows_created_total").increment(1);
    }

    fn name(&self) -> Option<&'static str> {
        Some("FlowCreated")
    }
}

#[derive(Debug)]
pub(crate) struct FlowsFlushed {
    pub count: usize,
    pub packets: usize,
}

impl InternalEvent for FlowsFlushed {
    fn emit(self) {
        debug!(
            message = "Flushed flows into feature records.",
            count = self.count,
            packets = self.packets,
        );
        counter!("flows_flushed_total").increment(self.count as u64);
    }

    fn name(&self) -> Option<&'static str> {
        Some("FlowsFlushed")
    }
}
