use tracing::{debug, warn};

use crate::client::exchange::{Exchange, ResponseSink, shutdown};
use crate::client::options::{Credentials, OptionName};
use crate::config::Config;
use crate::error::{HttpApiError, Result};
use crate::http::request::{Request, RequestParts};
use crate::http::response::Response;
use crate::transport::endpoint::host_header_value;
use crate::transport::{TcpTransport, TcpTransportFactory, Transport, TransportFactory};

/// A host plus the transport used to reach it.
///
/// The transport is opened by the first request and kept open across
/// successful requests. A failed request closes it; the next request reopens.
pub struct Connection<T: Transport = TcpTransport> {
    host: String,
    authority: String,
    transport: T,
    credentials: Credentials,
    config: Config,
}

impl Connection<TcpTransport> {
    /// Connection over the default transport (TLS unless the host says
    /// `http://`), configured from `COMPACT_HTTP_CONFIG` or the defaults.
    pub fn create(host: &str) -> Result<Self> {
        Self::create_with(host, &TcpTransportFactory::default(), Config::load())
    }
}

impl<T: Transport> Connection<T> {
    pub fn create_with<F>(host: &str, factory: &F, config: Config) -> Result<Self>
    where
        F: TransportFactory<Transport = T>,
    {
        if host.is_empty() {
            return Err(HttpApiError::NullOrEmptyHost);
        }

        let transport = factory.create(host).map_err(|e| {
            warn!(host = %host, error = %e, "Unable to create transport");
            HttpApiError::TransportCreateFailed(e.to_string())
        })?;

        debug!(host = %host, "Connection created");
        Ok(Self {
            host: host.to_string(),
            authority: host_header_value(host),
            transport,
            credentials: Credentials::default(),
            config,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Value sent in the `Host` header.
    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Stores a copy of a credential; it reaches the transport on the next
    /// request.
    pub fn set_option(&mut self, name: OptionName, value: &[u8]) -> Result<()> {
        self.credentials.set(name, value)?;
        debug!(host = %self.host, option = %name, len = value.len(), "Option stored");
        Ok(())
    }

    /// Runs one request, writing results into `sink`.
    pub fn execute(&mut self, request: RequestParts<'_>, sink: ResponseSink<'_>) -> Result<()> {
        debug!(
            host = %self.host,
            method = ?request.method,
            path = %request.path,
            "Executing request"
        );
        self.exchange(request, sink).run()
    }

    /// Starts a request without driving it; see [`Exchange::step`].
    pub fn exchange<'c, 'q, 's>(
        &'c mut self,
        request: RequestParts<'q>,
        sink: ResponseSink<'s>,
    ) -> Exchange<'c, 'q, 's, T> {
        Exchange::new(
            &mut self.transport,
            &self.credentials,
            &self.config,
            &self.authority,
            request,
            sink,
        )
    }

    /// Runs `request` and collects the whole response.
    pub fn fetch(&mut self, request: &Request) -> Result<Response> {
        let mut response = Response::default();
        let sink = ResponseSink {
            status: Some(&mut response.status),
            headers: Some(&mut response.headers),
            body: Some(&mut response.body),
        };
        self.execute(request.parts(), sink)?;
        Ok(response)
    }

    /// Closes the transport within the close budget and drops everything the
    /// connection owns.
    pub fn close(mut self) {
        shutdown(&mut self.transport, &self.config.timeouts);
        debug!(host = %self.host, "Connection closed");
    }
}
