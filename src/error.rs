//! Error types for gwnetctl

use std::io;
use thiserror::Error;

/// Coarse error classes used by callers to pick a response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input, missing or conflicting resource
    Client,
    /// Scope or permission failure
    Permission,
    /// I/O or system tool failure
    Server,
    /// Unsupported version or platform
    Unsupported,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Command execution failed
    #[error("Command '{cmd}' failed{}: {stderr}", .code.map(|c| format!(" with code {}", c)).unwrap_or_default())]
    CommandFailed { cmd: String, code: Option<i32>, stderr: String },
    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// Parse error
    #[error("Parse error: {0}")]
    ParseError(String),
    /// Not found
    #[error("Not found: {0}")]
    NotFound(String),
    /// Already exists
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    /// NetworkManager does not know the connection (nmcli exit code 10)
    #[error("Nonexistent connection: {0}")]
    NonexistentConnection(String),
    /// NetworkManager does not know the device (nmcli exit code 10)
    #[error("Nonexistent device: {0}")]
    NonexistentDevice(String),
    /// Any other nmcli failure
    #[error("NetworkManager error: {0}")]
    NetworkManager(String),
    /// ModemManager failure
    #[error("ModemManager error: {0}")]
    ModemManager(String),
    /// Permission denied
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    /// Not supported
    #[error("Not supported: {0}")]
    NotSupported(String),
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// wg genkey / wg pubkey failed
    #[error("WireGuard key error: {0}")]
    WireguardKey(String),
    /// Supplied private and public key do not belong together
    #[error("WireGuard key mismatch: {0}")]
    WireguardKeyMismatch(String),
    /// Peer endpoint does not resolve
    #[error("Invalid WireGuard endpoint: {0}")]
    WireguardInvalidEndpoint(String),
    /// `ip` rejected the command line (exit code 1)
    #[error("ip syntax error: {0}")]
    IpSyntax(String),
    /// `ip` failed in the kernel (exit code 2)
    #[error("ip kernel error: {0}")]
    IpKernel(String),
    /// API key expiration lies in the past
    #[error("API key expiration has already passed: {0}")]
    ApiKeyExpirationPassed(String),
    /// API key expiration is not a valid timestamp
    #[error("Invalid API key expiration: {0}")]
    ApiKeyInvalidExpiration(String),
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::InvalidParameter(_)
            | GatewayError::ParseError(_)
            | GatewayError::NotFound(_)
            | GatewayError::AlreadyExists(_)
            | GatewayError::NonexistentConnection(_)
            | GatewayError::NonexistentDevice(_)
            | GatewayError::WireguardKeyMismatch(_)
            | GatewayError::WireguardInvalidEndpoint(_)
            | GatewayError::ApiKeyExpirationPassed(_)
            | GatewayError::ApiKeyInvalidExpiration(_) => ErrorKind::Client,
            GatewayError::PermissionDenied(_) => ErrorKind::Permission,
            GatewayError::NotSupported(_) => ErrorKind::Unsupported,
            GatewayError::Io(_)
            | GatewayError::CommandFailed { .. }
            | GatewayError::NetworkManager(_)
            | GatewayError::ModemManager(_)
            | GatewayError::ConfigError(_)
            | GatewayError::WireguardKey(_)
            | GatewayError::IpSyntax(_)
            | GatewayError::IpKernel(_) => ErrorKind::Server,
        }
    }

    /// HTTP status a REST adapter should answer with
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Client => 400,
            ErrorKind::Permission => 403,
            ErrorKind::Server => 500,
            ErrorKind::Unsupported => 501,
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(error: serde_json::Error) -> Self {
        GatewayError::ParseError(error.to_string())
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
