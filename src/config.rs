use crate::error::ConfigError;
use wasm_bindgen::JsValue;

pub const DEFAULT_STORAGE_KEY: &str = "cosmos-connector-connected-wallet-id";

/// user agent fragment of Keplr's in-app browser
pub const KEPLR_MOBILE_USER_AGENT: &str = "KeplrWalletMobile";

/// Settings of the [`WalletManager`].
///
/// Every field has a default, so an empty object is a valid configuration.
///
/// [`WalletManager`]: crate::WalletManager
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WalletManagerConfig {
    /// reconnect the last connected wallet when the manager is created
    pub attempt_auto_connect: bool,
    /// skip the wallet selection and always connect this wallet
    pub preselected_wallet_id: Option<String>,
    /// key under which the last connected wallet id is stored
    pub storage_key: String,
    /// user agent fragments identifying a wallet's in-app browser
    pub embedded_browser_markers: Vec<String>,
    /// chains the built-in wallets request access to
    pub chain_ids: Vec<String>,
}

impl Default for WalletManagerConfig {
    fn default() -> Self {
        Self {
            attempt_auto_connect: true,
            preselected_wallet_id: None,
            storage_key: DEFAULT_STORAGE_KEY.to_owned(),
            embedded_browser_markers: vec![KEPLR_MOBILE_USER_AGENT.to_owned()],
            chain_ids: Vec::new(),
        }
    }
}

impl WalletManagerConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|error| ConfigError::Invalid(error.to_string()))
    }

    /// read the configuration from a JavaScript object
    pub fn from_js(value: JsValue) -> Result<Self, ConfigError> {
        if value.is_undefined() || value.is_null() {
            return Ok(Self::default());
        }
        serde_wasm_bindgen::from_value(value)
            .map_err(|error| ConfigError::Invalid(error.to_string()))
    }

    /// check the given user agent against the embedded browser markers
    pub fn is_embedded_browser(&self, user_agent: &str) -> bool {
        self.embedded_browser_markers
            .iter()
            .any(|marker| !marker.is_empty() && user_agent.contains(marker.as_str()))
    }
}

/// Metadata the mobile wallet displays when asked to pair.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientMeta {
    pub name: String,
    pub description: String,
    pub url: String,
    pub icons: Vec<String>,
}

/// Options of the WalletConnect relay client.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WalletConnectOptions {
    pub bridge: String,
    pub client_meta: ClientMeta,
}

impl Default for WalletConnectOptions {
    fn default() -> Self {
        Self {
            bridge: "https://bridge.walletconnect.org".to_owned(),
            client_meta: ClientMeta::default(),
        }
    }
}
