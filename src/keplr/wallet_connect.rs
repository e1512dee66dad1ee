use crate::{
    error::{ClientError, OpaqueError},
    relay::RelaySession,
    wallet::{Capabilities, ClientFactory, Key, WalletClient},
};
use async_trait::async_trait;
use serde_json::json;
use std::rc::Rc;

const ENABLE: &str = "keplr_enable_wallet_connect_v1";
const GET_KEY: &str = "keplr_get_key_wallet_connect_v1";
const SIGN_AMINO: &str = "keplr_sign_amino_wallet_connect_v1";

/// Wraps the relay session into a [`WalletConnectKeplr`].
#[derive(Debug, Default, Clone, Copy)]
pub struct WalletConnectFactory;

#[async_trait(?Send)]
impl ClientFactory for WalletConnectFactory {
    async fn create_client(
        &self,
        session: Option<RelaySession>,
    ) -> Result<Option<Rc<dyn WalletClient>>, OpaqueError> {
        Ok(session.map(|session| Rc::new(WalletConnectKeplr::new(session)) as Rc<dyn WalletClient>))
    }
}

/// [`WalletClient`] talking to Keplr mobile through the relay session.
///
/// Only amino signing is available and chains cannot be suggested.
#[derive(Clone)]
pub struct WalletConnectKeplr {
    session: RelaySession,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyResponse {
    name: String,
    algo: String,
    /// hex encoded
    pub_key: String,
    /// hex encoded
    address: String,
    bech32_address: String,
    #[serde(default)]
    is_nano_ledger: bool,
}

impl TryFrom<KeyResponse> for Key {
    type Error = ClientError;

    fn try_from(response: KeyResponse) -> Result<Self, Self::Error> {
        let pub_key = hex::decode(&response.pub_key).map_err(|error| {
            ClientError::InvalidResponse(format!("Invalid pubKey `{}': {error}", response.pub_key))
        })?;
        let address = hex::decode(&response.address).map_err(|error| {
            ClientError::InvalidResponse(format!("Invalid address `{}': {error}", response.address))
        })?;

        Ok(Key {
            name: response.name,
            algo: response.algo,
            pub_key,
            address,
            bech32_address: response.bech32_address,
            is_nano_ledger: response.is_nano_ledger,
        })
    }
}

/// the wallet answers with a one element array
fn first(response: serde_json::Value) -> Result<serde_json::Value, ClientError> {
    match response {
        serde_json::Value::Array(mut values) if !values.is_empty() => Ok(values.swap_remove(0)),
        other => Err(ClientError::InvalidResponse(format!(
            "Expected a non empty array, received {other}"
        ))),
    }
}

impl WalletConnectKeplr {
    pub fn new(session: RelaySession) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &RelaySession {
        &self.session
    }
}

#[async_trait(?Send)]
impl WalletClient for WalletConnectKeplr {
    fn capabilities(&self) -> Capabilities {
        Capabilities::RELAY
    }

    async fn enable(&self, chain_ids: &[String]) -> Result<(), ClientError> {
        self.session.request(ENABLE, json!(chain_ids)).await?;
        Ok(())
    }

    async fn get_key(&self, chain_id: &str) -> Result<Key, ClientError> {
        let response = self.session.request(GET_KEY, json!([chain_id])).await?;
        let key: KeyResponse = serde_json::from_value(first(response)?)
            .map_err(|error| ClientError::InvalidResponse(format!("Invalid key: {error}")))?;
        Key::try_from(key)
    }

    async fn sign_amino(
        &self,
        chain_id: &str,
        signer: &str,
        sign_doc: &serde_json::Value,
    ) -> Result<serde_json::Value, ClientError> {
        let response = self
            .session
            .request(SIGN_AMINO, json!([chain_id, signer, sign_doc, {}]))
            .await?;
        first(response)
    }
}
