//! One request/response exchange driven as an explicit state machine.
//!
//! ```text
//!   ValidateArguments → ApplyOptions → Open → SendHeaders → SendBody
//!                                                              │
//!              Complete ← ReceiveBody ← ReceiveHead ←──────────┘
//! ```
//!
//! Every call to [`Exchange::step`] does at most one transport pump. Phases
//! that wait on the transport spend a [`Poller`] budget; an exhausted budget
//! fails the phase with its own error.

use tracing::{debug, trace, warn};

use crate::client::events::Signals;
use crate::client::options::Credentials;
use crate::client::poll::Poller;
use crate::config::{Config, Timeouts};
use crate::error::{HttpApiError, Result};
use crate::http::headers::HeaderCollection;
use crate::http::parser::ParseError;
use crate::http::request::{RequestParts, is_valid_path};
use crate::http::response::{HeadEvent, HeadParser};
use crate::http::writer::{RequestWriter, serialize_request_head};
use crate::transport::{Completion, Transport};

/// Where the results of an exchange are written. Absent outputs are skipped.
#[derive(Default)]
pub struct ResponseSink<'a> {
    pub status: Option<&'a mut u16>,
    pub headers: Option<&'a mut dyn HeaderCollection>,
    /// Replaced with the response body on success.
    pub body: Option<&'a mut Vec<u8>>,
}

impl<'a> ResponseSink<'a> {
    pub fn none() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    ValidateArguments,
    ApplyOptions,
    Open,
    SendHeaders,
    SendBody,
    ReceiveHead,
    ReceiveBody,
    Complete,
}

/// A request in flight on a connection's transport.
///
/// [`Exchange::run`] drives it to the end; [`Exchange::step`] advances it by
/// one phase action for callers that want to watch the transitions. Only
/// `run` closes the transport when a phase fails.
pub struct Exchange<'c, 'q, 's, T: Transport> {
    transport: &'c mut T,
    credentials: &'c Credentials,
    config: &'c Config,
    authority: &'c str,
    request: RequestParts<'q>,
    sink: ResponseSink<'s>,
    phase: Phase,
    signals: Signals,
    poller: Option<Poller>,
    writer: RequestWriter,
    in_flight: bool,
    head: HeadParser,
    body_len: usize,
}

impl<'c, 'q, 's, T: Transport> Exchange<'c, 'q, 's, T> {
    pub(crate) fn new(
        transport: &'c mut T,
        credentials: &'c Credentials,
        config: &'c Config,
        authority: &'c str,
        request: RequestParts<'q>,
        sink: ResponseSink<'s>,
    ) -> Self {
        Self {
            transport,
            credentials,
            config,
            authority,
            request,
            sink,
            phase: Phase::ValidateArguments,
            signals: Signals::default(),
            poller: None,
            writer: RequestWriter::new(Vec::new()),
            in_flight: false,
            head: HeadParser::new(config.limits.max_line_length),
            body_len: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Steps until the exchange completes or fails. Any failure past argument
    /// validation closes the transport before the error is returned.
    pub fn run(mut self) -> Result<()> {
        while self.phase != Phase::Complete {
            let phase = self.phase;
            if let Err(e) = self.step() {
                warn!(
                    host = %self.authority,
                    method = ?self.request.method,
                    path = %self.request.path,
                    phase = ?phase,
                    error = %e,
                    "Request failed"
                );
                if phase != Phase::ValidateArguments {
                    shutdown(self.transport, &self.config.timeouts);
                }
                return Err(e);
            }
        }

        debug!(
            host = %self.authority,
            method = ?self.request.method,
            path = %self.request.path,
            body_len = self.body_len,
            "Request completed"
        );
        Ok(())
    }

    /// Performs at most one pump; a completed exchange stays `Complete`.
    pub fn step(&mut self) -> Result<()> {
        match self.phase {
            Phase::ValidateArguments => self.validate(),
            Phase::ApplyOptions => self.apply_options(),
            Phase::Open => self.open(),
            Phase::SendHeaders => self.send_headers(),
            Phase::SendBody => self.send_body(),
            Phase::ReceiveHead => self.receive_head(),
            Phase::ReceiveBody => self.receive_body(),
            Phase::Complete => Ok(()),
        }
    }

    fn enter(&mut self, phase: Phase, budget: Option<std::time::Duration>) {
        trace!(from = ?self.phase, to = ?phase, "Phase transition");
        let timeouts = &self.config.timeouts;
        self.poller = budget.map(|b| Poller::for_budget(timeouts, b));
        self.in_flight = false;
        self.phase = phase;
    }

    /// One pump, or `timeout` once the phase budget is spent.
    fn pump(&mut self, timeout: HttpApiError) -> Result<()> {
        let Some(poller) = self.poller.as_mut() else {
            return Err(timeout);
        };
        if !poller.attempt() {
            warn!(phase = ?self.phase, "Phase budget exhausted");
            return Err(timeout);
        }
        self.transport.pump_once(&mut self.signals);
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        if !is_valid_path(self.request.path) {
            return Err(HttpApiError::InvalidArgument("path"));
        }
        self.request
            .headers
            .count()
            .map_err(|_| HttpApiError::InvalidArgument("headers"))?;
        self.enter(Phase::ApplyOptions, None);
        Ok(())
    }

    fn apply_options(&mut self) -> Result<()> {
        for (name, value) in self.credentials.to_apply() {
            self.transport.set_option(name, value).map_err(|e| {
                warn!(option = %name, error = %e, "Transport rejected option");
                HttpApiError::SetOptionFailed(name)
            })?;
        }
        self.enter(Phase::Open, None);
        Ok(())
    }

    fn open(&mut self) -> Result<()> {
        if self.poller.is_none() {
            if self.transport.is_open() {
                trace!(host = %self.authority, "Reusing open transport");
                return self.enter_send_headers();
            }
            self.signals.opened = None;
            self.transport.open(&mut self.signals).map_err(|e| {
                warn!(host = %self.authority, error = %e, "Transport refused to open");
                HttpApiError::OpenRequestFailed
            })?;
            let timeouts = &self.config.timeouts;
            self.poller = Some(Poller::for_budget(timeouts, timeouts.open()));
        }

        match self.signals.opened {
            Some(Completion::Ok) => return self.enter_send_headers(),
            Some(Completion::Error) => return Err(HttpApiError::OpenRequestFailed),
            None if self.signals.errored => return Err(HttpApiError::OpenRequestFailed),
            None => {}
        }
        self.pump(HttpApiError::OpenRequestFailed)
    }

    fn enter_send_headers(&mut self) -> Result<()> {
        let lines = serialize_request_head(
            self.request.method,
            self.request.path,
            self.authority,
            self.request.headers,
            self.request.body().map(<[u8]>::len),
            self.config.limits.max_line_length,
        )
        .map_err(|e| {
            warn!(error = %e, "Unable to build request head");
            HttpApiError::StringProcessingError
        })?;
        self.writer = RequestWriter::new(lines);
        let budget = self.config.timeouts.send();
        self.enter(Phase::SendHeaders, Some(budget));
        Ok(())
    }

    fn send_headers(&mut self) -> Result<()> {
        let Some(line) = self.writer.pending().cloned() else {
            return self.enter_send_body();
        };
        if self.drive_send(&line)? {
            self.writer.advance();
        }
        Ok(())
    }

    fn enter_send_body(&mut self) -> Result<()> {
        if self.request.body().is_some() {
            let budget = self.config.timeouts.send();
            self.enter(Phase::SendBody, Some(budget));
            Ok(())
        } else {
            self.enter_receive_head();
            Ok(())
        }
    }

    fn send_body(&mut self) -> Result<()> {
        let body = self.request.body().unwrap_or_default();
        if self.drive_send(body)? {
            self.enter_receive_head();
        }
        Ok(())
    }

    /// Issues `bytes` if no send is in flight, then waits on its completion.
    /// Returns `true` once the send completed.
    fn drive_send(&mut self, bytes: &[u8]) -> Result<bool> {
        if !self.in_flight {
            self.signals.arm_send();
            self.transport.send(bytes, &mut self.signals).map_err(|e| {
                warn!(error = %e, "Transport refused to send");
                HttpApiError::SendRequestFailed
            })?;
            self.in_flight = true;
        }

        match self.signals.sent {
            Some(Completion::Ok) => {
                self.in_flight = false;
                Ok(true)
            }
            Some(Completion::Error) => Err(HttpApiError::SendRequestFailed),
            None if self.signals.errored => Err(HttpApiError::SendRequestFailed),
            None => self.pump(HttpApiError::SendRequestFailed).map(|_| false),
        }
    }

    fn enter_receive_head(&mut self) {
        let budget = self.config.timeouts.receive();
        self.enter(Phase::ReceiveHead, Some(budget));
    }

    fn receive_head(&mut self) -> Result<()> {
        loop {
            let (event, consumed) = self
                .head
                .advance(self.signals.inbound.data())
                .map_err(response_error)?;
            self.signals.inbound.consume(consumed);

            match event {
                HeadEvent::Status(code) => {
                    trace!(status = code, "Received status line");
                    if let Some(status) = self.sink.status.as_deref_mut() {
                        *status = code;
                    }
                }
                HeadEvent::Header(name, value) => {
                    if let Some(headers) = self.sink.headers.as_deref_mut() {
                        headers.add(&name, &value).map_err(|e| {
                            warn!(header = %name, error = %e, "Unable to store response header");
                            HttpApiError::ReceiveResponseFailed
                        })?;
                    }
                }
                HeadEvent::End => return self.enter_receive_body(),
                HeadEvent::NeedMore => break,
            }
        }

        if self.signals.errored {
            return Err(HttpApiError::ReadDataFailed);
        }
        self.pump(HttpApiError::ReadDataFailed)
    }

    fn enter_receive_body(&mut self) -> Result<()> {
        if !self.request.method.expects_response_body() {
            self.enter(Phase::Complete, None);
            return Ok(());
        }

        self.body_len = self
            .head
            .content_length()
            .map_err(|_| HttpApiError::ReadDataFailed)?;
        let limit = self.config.limits.max_body_length;
        if self.body_len > limit {
            warn!(content_length = self.body_len, limit, "Announced body is too large");
            return Err(HttpApiError::ReadDataFailed);
        }
        let budget = self.config.timeouts.receive();
        self.enter(Phase::ReceiveBody, Some(budget));
        Ok(())
    }

    fn receive_body(&mut self) -> Result<()> {
        if self.signals.inbound.has_bytes(self.body_len) {
            if let Some(body) = self.sink.body.as_deref_mut() {
                body.clear();
                body.try_reserve_exact(self.body_len)
                    .map_err(|_| HttpApiError::AllocationFailed)?;
                body.extend_from_slice(&self.signals.inbound.data()[..self.body_len]);
            }
            self.signals.inbound.consume(self.body_len);
            self.enter(Phase::Complete, None);
            return Ok(());
        }

        if self.signals.errored {
            return Err(HttpApiError::ReadDataFailed);
        }
        self.pump(HttpApiError::ReadDataFailed)
    }
}

fn response_error(e: ParseError) -> HttpApiError {
    match e {
        ParseError::LineTooLong | ParseError::Incomplete => HttpApiError::ReadDataFailed,
        _ => HttpApiError::ReceiveResponseFailed,
    }
}

/// Closes `transport` if it is open and waits for the close to complete within
/// the close budget. Gives up silently when the close is refused or stalls.
pub(crate) fn shutdown<T: Transport>(transport: &mut T, timeouts: &Timeouts) {
    if !transport.is_open() {
        return;
    }

    let mut signals = Signals::default();
    if let Err(e) = transport.close(&mut signals) {
        warn!(error = %e, "Transport close failed");
        return;
    }

    let mut poller = Poller::for_budget(timeouts, timeouts.close());
    while !signals.closed && !signals.errored {
        if !poller.attempt() {
            warn!("Transport did not close within budget");
            return;
        }
        transport.pump_once(&mut signals);
    }
    debug!("Transport closed");
}
