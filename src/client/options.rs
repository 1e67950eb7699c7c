//! Credential options attached to a connection before execution.

use std::fmt;

use crate::error::{HttpApiError, Result};

/// Names accepted by `set_option` and `clone_option`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionName {
    /// PEM bundle of certificates the peer is verified against.
    TrustedCertificate,
    /// Client certificate presented during the handshake.
    ClientCertificate,
    /// Private key matching [`OptionName::ClientCertificate`].
    ClientPrivateKey,
}

impl OptionName {
    /// Parses an option name, accepting the short aliases for the client
    /// certificate and key. Matching is case-sensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "TrustedCerts" => Some(OptionName::TrustedCertificate),
            "x509ClientCertificate" | "x509certificate" => Some(OptionName::ClientCertificate),
            "x509ClientPrivateKey" | "x509privatekey" => Some(OptionName::ClientPrivateKey),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionName::TrustedCertificate => "TrustedCerts",
            OptionName::ClientCertificate => "x509ClientCertificate",
            OptionName::ClientPrivateKey => "x509ClientPrivateKey",
        }
    }
}

impl fmt::Display for OptionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owned copies of the credentials stored on a connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub trusted: Option<Vec<u8>>,
    pub client_cert: Option<Vec<u8>>,
    pub client_key: Option<Vec<u8>>,
}

impl Credentials {
    /// Stores a copy of `value`, dropping whatever was stored under `name`.
    pub fn set(&mut self, name: OptionName, value: &[u8]) -> Result<()> {
        let copy = copy_bytes(value)?;
        let slot = match name {
            OptionName::TrustedCertificate => &mut self.trusted,
            OptionName::ClientCertificate => &mut self.client_cert,
            OptionName::ClientPrivateKey => &mut self.client_key,
        };
        *slot = Some(copy);
        Ok(())
    }

    pub fn get(&self, name: OptionName) -> Option<&[u8]> {
        match name {
            OptionName::TrustedCertificate => self.trusted.as_deref(),
            OptionName::ClientCertificate => self.client_cert.as_deref(),
            OptionName::ClientPrivateKey => self.client_key.as_deref(),
        }
    }

    /// Options to hand to the transport, in application order. The client
    /// certificate and key only travel together.
    pub fn to_apply(&self) -> Vec<(OptionName, &[u8])> {
        let mut out = Vec::with_capacity(3);
        if let Some(trusted) = self.trusted.as_deref() {
            out.push((OptionName::TrustedCertificate, trusted));
        }
        if let (Some(cert), Some(key)) = (self.client_cert.as_deref(), self.client_key.as_deref()) {
            out.push((OptionName::ClientCertificate, cert));
            out.push((OptionName::ClientPrivateKey, key));
        }
        out
    }
}

/// Deep copy of an option value.
pub fn copy_bytes(value: &[u8]) -> Result<Vec<u8>> {
    let mut copy = Vec::new();
    copy.try_reserve_exact(value.len())
        .map_err(|_| HttpApiError::AllocationFailed)?;
    copy.extend_from_slice(value);
    Ok(copy)
}

/// Copies an option value after checking that `name` is a known option.
pub fn clone_option(name: &str, value: &[u8]) -> Result<Vec<u8>> {
    OptionName::from_name(name).ok_or(HttpApiError::InvalidArgument("unknown option name"))?;
    copy_bytes(value)
}
