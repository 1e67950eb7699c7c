use url::Url;

/// Where a connection points, derived from the host string it was created
/// with. Accepts full URLs (`https://example.test:8443`), `host:port` pairs and
/// bare host names. Only an explicit `http://` scheme turns TLS off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: Option<u16>,
    pub secure: bool,
}

impl Endpoint {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if raw.contains("://") {
            let url = Url::parse(raw).ok()?;
            let host = url.host_str()?.to_string();
            return Some(Self {
                host,
                port: url.port(),
                secure: url.scheme() != "http",
            });
        }

        match raw.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && !host.contains(':') => Some(Self {
                host: host.to_string(),
                port: Some(port.parse().ok()?),
                secure: true,
            }),
            _ => Some(Self {
                host: raw.to_string(),
                port: None,
                secure: true,
            }),
        }
    }

    /// Value for the `Host` request header.
    pub fn authority(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{}", self.host, port),
            None => self.host.clone(),
        }
    }

    /// Port to dial, defaulting by scheme.
    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or(if self.secure { 443 } else { 80 })
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port_or_default())
    }
}

/// Host header value for a connection's host string. Falls back to the raw
/// string when it does not parse as an endpoint.
pub fn host_header_value(raw: &str) -> String {
    Endpoint::parse(raw)
        .map(|e| e.authority())
        .unwrap_or_else(|| raw.to_string())
}
