use std::{any::Any, fmt, rc::Rc};
use wasm_bindgen::JsValue;

trait OpaqueValue: Any + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + fmt::Debug> OpaqueValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A failure value of arbitrary shape.
///
/// The hooks supplied by the application (and the JavaScript wallets behind
/// them) may fail with anything: a string, a custom object, a native
/// `Error`. The value is kept as-is and can be recovered with
/// [`OpaqueError::downcast_ref`].
///
/// ```
/// # use cosmos_connector::error::OpaqueError;
/// let error = OpaqueError::new("user rejected");
/// assert_eq!(error.downcast_ref::<&str>(), Some(&"user rejected"));
/// ```
#[derive(Clone)]
pub struct OpaqueError(Rc<dyn OpaqueValue>);

impl OpaqueError {
    pub fn new<T: Any + fmt::Debug>(value: T) -> Self {
        Self(Rc::new(value))
    }

    /// get the original value back if it is of type `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.0).as_any().downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }

    /// check both errors hold the very same value (not only an equal one)
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for OpaqueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for OpaqueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(message) = self.downcast_ref::<&'static str>() {
            f.write_str(message)
        } else if let Some(message) = self.downcast_ref::<String>() {
            f.write_str(message)
        } else {
            write!(f, "{:?}", self.0)
        }
    }
}

impl std::error::Error for OpaqueError {}

impl From<JsValue> for OpaqueError {
    fn from(value: JsValue) -> Self {
        Self::new(value)
    }
}

/// The failures the connection manager itself knows how to describe.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    /// The wallet factory did not produce a client: the extension is not
    /// installed or the relay pairing could not be established.
    #[error(
        "Wallet `{id}' is not available.{}",
        .reason.as_deref().map(|reason| format!(" {reason}")).unwrap_or_default()
    )]
    WalletUnavailable { id: String, reason: Option<String> },
    #[error("Wallet `{id}' is not registered.")]
    UnknownWallet { id: String },
}

/// The error held by the connection state while it is errored.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConnectionError {
    #[error(transparent)]
    Known(#[from] ErrorKind),
    /// Value raised by one of the hooks (pre-select, client factory or
    /// enable). Passed through without any wrapping.
    #[error("{0}")]
    Opaque(OpaqueError),
}

impl ConnectionError {
    pub fn kind(&self) -> Option<&ErrorKind> {
        match self {
            Self::Known(kind) => Some(kind),
            Self::Opaque(_) => None,
        }
    }

    pub fn opaque(&self) -> Option<&OpaqueError> {
        match self {
            Self::Known(_) => None,
            Self::Opaque(error) => Some(error),
        }
    }

    /// shortcut for `self.opaque().and_then(|e| e.downcast_ref())`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.opaque().and_then(OpaqueError::downcast_ref)
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Known(ErrorKind::WalletUnavailable { .. }))
    }
}

impl From<OpaqueError> for ConnectionError {
    fn from(error: OpaqueError) -> Self {
        Self::Opaque(error)
    }
}

/// Errors returned by the [`WalletClient`] operations.
///
/// [`WalletClient`]: crate::WalletClient
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    #[error("`{0}' is not supported by this wallet.")]
    Unsupported(&'static str),
    #[error("Invalid response from the wallet: {0}.")]
    InvalidResponse(String),
    #[error(transparent)]
    Relay(#[from] RelayError),
    #[error("The wallet failed the request: {0}")]
    Rejected(OpaqueError),
}

impl From<JsValue> for ClientError {
    fn from(value: JsValue) -> Self {
        Self::Rejected(OpaqueError::from(value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, thiserror::Error)]
pub enum RpcErrorCode {
    #[error("Parse error")]
    ParseError,
    #[error("Invalid request")]
    InvalidRequest,
    #[error("Method not found")]
    MethodNotFound,
    #[error("Invalid params")]
    InvalidParams,
    #[error("Internal error")]
    InternalError,
    /// Implementation defined errors, this is where the wallets report a
    /// user declining the request.
    #[error("Server error `{0}'")]
    Server(i64),
    #[error("Unknown error code `{0}'")]
    Unknown(i64),
}

/// JSON-RPC error returned by the wallet at the other end of the relay.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, thiserror::Error, serde::Deserialize,
)]
#[error("{code}. {message}.")]
pub struct RpcError {
    pub code: RpcErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    #[error("Relay transport failure: {0}.")]
    Transport(String),
    #[error("The pairing was closed before it completed.")]
    PairingAborted,
    #[error("The relay session is closed.")]
    Closed,
    #[error(transparent)]
    Rpc(#[from] RpcError),
}

impl RelayError {
    /// decode the value a JavaScript relay client rejected with
    ///
    /// Values shaped like a JSON-RPC error are decoded as such, anything else
    /// becomes a transport failure.
    pub fn from_js(value: JsValue) -> Self {
        match serde_wasm_bindgen::from_value::<RpcError>(value.clone()) {
            Ok(rpc) => Self::Rpc(rpc),
            Err(_) => Self::Transport(
                value
                    .as_string()
                    .unwrap_or_else(|| format!("{value:?}")),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("Storage is not available in this environment.")]
    Unavailable,
    #[error("Storage refused the operation: {0}.")]
    Refused(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}.")]
    Invalid(String),
    #[error("Wallet `{0}' is registered more than once.")]
    DuplicateWallet(String),
}

impl<'de> serde::Deserialize<'de> for RpcErrorCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct Visitor;
        impl serde::de::Visitor<'_> for Visitor {
            type Value = RpcErrorCode;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(formatter, "Expecting an integer RpcErrorCode")
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                match v {
                    -32700 => Ok(RpcErrorCode::ParseError),
                    -32600 => Ok(RpcErrorCode::InvalidRequest),
                    -32601 => Ok(RpcErrorCode::MethodNotFound),
                    -32602 => Ok(RpcErrorCode::InvalidParams),
                    -32603 => Ok(RpcErrorCode::InternalError),
                    -32099..=-32000 => Ok(RpcErrorCode::Server(v)),
                    unknown => Ok(RpcErrorCode::Unknown(unknown)),
                }
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(RpcErrorCode::Unknown(i64::try_from(v).unwrap_or(i64::MAX)))
            }

            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                // JavaScript numbers come through as floats
                self.visit_i64(v as i64)
            }
        }

        deserializer.deserialize_i64(Visitor)
    }
}
