use crate::client::accumulator::Accumulator;
use crate::transport::{Completion, TransportEvents};

/// Records transport callbacks so the executor can check them between pumps.
#[derive(Debug, Default)]
pub struct Signals {
    pub opened: Option<Completion>,
    pub sent: Option<Completion>,
    pub closed: bool,
    pub errored: bool,
    pub inbound: Accumulator,
}

impl Signals {
    /// Clears the per-send latch before the next send is issued.
    pub fn arm_send(&mut self) {
        self.sent = None;
    }
}

impl TransportEvents for Signals {
    fn on_open_complete(&mut self, result: Completion) {
        self.opened = Some(result);
    }

    fn on_send_complete(&mut self, result: Completion) {
        self.sent = Some(result);
    }

    fn on_bytes_received(&mut self, bytes: &[u8]) {
        self.inbound.append(bytes);
    }

    fn on_close_complete(&mut self) {
        self.closed = true;
    }

    fn on_error(&mut self) {
        self.errored = true;
    }
}
