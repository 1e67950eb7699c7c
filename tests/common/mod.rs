#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use compact_http::Connection;
use compact_http::client::OptionName;
use compact_http::config::{Config, Limits, Timeouts};
use compact_http::transport::{
    Completion, Transport, TransportError, TransportEvents, TransportFactory,
};

/// When a scripted completion is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Inline,
    OnPump,
    Never,
}

/// Behaviour of a [`FakeTransport`]. The default opens on the first pump,
/// completes sends inline and closes inline.
#[derive(Debug, Clone)]
pub struct Script {
    pub open: Delivery,
    pub open_result: Completion,
    pub open_refused: bool,
    pub send: Delivery,
    pub send_result: Completion,
    /// Zero-based index of the send call that returns an error.
    pub refuse_send_at: Option<usize>,
    pub close: Delivery,
    pub close_refused: bool,
    pub reject_option: Option<OptionName>,
    /// Chunks handed out one per pump while open.
    pub incoming: VecDeque<Vec<u8>>,
    /// Fire `on_error` once every chunk has been delivered.
    pub error_when_drained: bool,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            open: Delivery::OnPump,
            open_result: Completion::Ok,
            open_refused: false,
            send: Delivery::Inline,
            send_result: Completion::Ok,
            refuse_send_at: None,
            close: Delivery::Inline,
            close_refused: false,
            reject_option: None,
            incoming: VecDeque::new(),
            error_when_drained: false,
        }
    }
}

impl Script {
    pub fn responding(response: &[u8]) -> Self {
        Self::default().with_response(response)
    }

    pub fn with_response(mut self, response: &[u8]) -> Self {
        self.incoming.push_back(response.to_vec());
        self
    }

    /// Delivers `response` one byte per pump.
    pub fn trickling(response: &[u8]) -> Self {
        Self {
            incoming: response.iter().map(|b| vec![*b]).collect(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Open,
    Send(Vec<u8>),
    Close,
    SetOption(OptionName, Vec<u8>),
}

#[derive(Debug, Default)]
pub struct Log {
    pub calls: Vec<Call>,
    pub pumps: usize,
    pub closes_completed: usize,
}

impl Log {
    pub fn opens(&self) -> usize {
        self.calls.iter().filter(|c| **c == Call::Open).count()
    }

    pub fn closes(&self) -> usize {
        self.calls.iter().filter(|c| **c == Call::Close).count()
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Send(bytes) => Some(bytes.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn sent_text(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .map(|b| String::from_utf8_lossy(&b).into_owned())
            .collect()
    }
}

pub struct FakeTransport {
    script: Script,
    log: Rc<RefCell<Log>>,
    open: bool,
    opening: bool,
    closing: bool,
    pending_sends: usize,
    send_calls: usize,
    drained_reported: bool,
}

impl FakeTransport {
    pub fn new(script: Script, log: Rc<RefCell<Log>>) -> Self {
        Self {
            script,
            log,
            open: false,
            opening: false,
            closing: false,
            pending_sends: 0,
            send_calls: 0,
            drained_reported: false,
        }
    }

    /// Queues more inbound data, e.g. for a second request.
    pub fn push_incoming(&mut self, bytes: &[u8]) {
        self.script.incoming.push_back(bytes.to_vec());
        self.drained_reported = false;
    }

    pub fn script_mut(&mut self) -> &mut Script {
        &mut self.script
    }

    fn finish_open(&mut self, events: &mut dyn TransportEvents) {
        self.opening = false;
        self.open = self.script.open_result == Completion::Ok;
        events.on_open_complete(self.script.open_result);
    }

    fn finish_close(&mut self, events: &mut dyn TransportEvents) {
        self.closing = false;
        self.open = false;
        self.log.borrow_mut().closes_completed += 1;
        events.on_close_complete();
    }
}

impl Transport for FakeTransport {
    fn open(&mut self, events: &mut dyn TransportEvents) -> Result<(), TransportError> {
        self.log.borrow_mut().calls.push(Call::Open);
        if self.script.open_refused {
            return Err(TransportError::Rejected("open refused".to_string()));
        }
        self.opening = true;
        if self.script.open == Delivery::Inline {
            self.finish_open(events);
        }
        Ok(())
    }

    fn send(
        &mut self,
        bytes: &[u8],
        events: &mut dyn TransportEvents,
    ) -> Result<(), TransportError> {
        let index = self.send_calls;
        self.send_calls += 1;
        if self.script.refuse_send_at == Some(index) {
            return Err(TransportError::Rejected("send refused".to_string()));
        }
        if !self.open {
            return Err(TransportError::NotOpen);
        }
        self.log.borrow_mut().calls.push(Call::Send(bytes.to_vec()));
        match self.script.send {
            Delivery::Inline => events.on_send_complete(self.script.send_result),
            Delivery::OnPump => self.pending_sends += 1,
            Delivery::Never => {}
        }
        Ok(())
    }

    fn close(&mut self, events: &mut dyn TransportEvents) -> Result<(), TransportError> {
        self.log.borrow_mut().calls.push(Call::Close);
        if self.script.close_refused {
            return Err(TransportError::Rejected("close refused".to_string()));
        }
        self.closing = true;
        if self.script.close == Delivery::Inline {
            self.finish_close(events);
        }
        Ok(())
    }

    fn pump_once(&mut self, events: &mut dyn TransportEvents) {
        self.log.borrow_mut().pumps += 1;

        if self.opening {
            if self.script.open == Delivery::OnPump {
                self.finish_open(events);
            }
            return;
        }

        if self.closing {
            if self.script.close == Delivery::OnPump {
                self.finish_close(events);
            }
            return;
        }

        if self.pending_sends > 0 {
            self.pending_sends -= 1;
            events.on_send_complete(self.script.send_result);
            return;
        }

        if !self.open {
            return;
        }

        match self.script.incoming.pop_front() {
            Some(chunk) => events.on_bytes_received(&chunk),
            None if self.script.error_when_drained && !self.drained_reported => {
                self.drained_reported = true;
                events.on_error();
            }
            None => {}
        }
    }

    fn set_option(&mut self, name: OptionName, value: &[u8]) -> Result<(), TransportError> {
        self.log
            .borrow_mut()
            .calls
            .push(Call::SetOption(name, value.to_vec()));
        if self.script.reject_option == Some(name) {
            return Err(TransportError::UnsupportedOption(name));
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

pub struct FakeFactory {
    pub script: Script,
    pub log: Rc<RefCell<Log>>,
    pub fail: bool,
}

impl FakeFactory {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            log: Rc::new(RefCell::new(Log::default())),
            fail: false,
        }
    }
}

impl TransportFactory for FakeFactory {
    type Transport = FakeTransport;

    fn create(&self, _host: &str) -> Result<FakeTransport, TransportError> {
        if self.fail {
            return Err(TransportError::InvalidEndpoint("refused by test".to_string()));
        }
        Ok(FakeTransport::new(self.script.clone(), Rc::clone(&self.log)))
    }
}

/// Budgets of 20 attempts spaced 1 ms apart.
pub fn fast_config() -> Config {
    Config {
        timeouts: Timeouts {
            open_ms: 20,
            send_ms: 20,
            receive_ms: 20,
            close_ms: 20,
            poll_interval_ms: 1,
        },
        limits: Limits::default(),
    }
}

pub const BUDGET_ATTEMPTS: usize = 20;

pub fn connect(host: &str, script: Script) -> (Connection<FakeTransport>, Rc<RefCell<Log>>) {
    connect_with(host, script, fast_config())
}

pub fn connect_with(
    host: &str,
    script: Script,
    config: Config,
) -> (Connection<FakeTransport>, Rc<RefCell<Log>>) {
    let factory = FakeFactory::new(script);
    let log = Rc::clone(&factory.log);
    let conn = Connection::create_with(host, &factory, config).expect("fake connection");
    (conn, log)
}
