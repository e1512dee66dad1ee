use crate::{
    error::{ClientError, OpaqueError},
    ffi,
    relay::RelaySession,
    wallet::{Capabilities, ClientFactory, Key, WalletClient},
};
use async_trait::async_trait;
use serde::Serialize as _;
use std::rc::Rc;
use wasm_bindgen::{JsCast as _, JsValue};

/// Builds a [`KeplrExtension`] when `window.keplr` is present.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtensionFactory;

#[async_trait(?Send)]
impl ClientFactory for ExtensionFactory {
    async fn create_client(
        &self,
        _session: Option<RelaySession>,
    ) -> Result<Option<Rc<dyn WalletClient>>, OpaqueError> {
        Ok(ffi::keplr::keplr().map(|keplr| Rc::new(KeplrExtension::new(keplr)) as Rc<dyn WalletClient>))
    }
}

/// [`WalletClient`] over the object injected by the Keplr extension.
#[derive(Clone, PartialEq)]
pub struct KeplrExtension {
    keplr: ffi::Keplr,
}

impl KeplrExtension {
    pub fn new(keplr: ffi::Keplr) -> Self {
        Self { keplr }
    }
}

fn to_js(value: &serde_json::Value) -> Result<JsValue, ClientError> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|error| ClientError::InvalidResponse(format!("Couldn't encode the request: {error}")))
}

fn from_js(value: JsValue) -> Result<serde_json::Value, ClientError> {
    serde_wasm_bindgen::from_value(value)
        .map_err(|error| ClientError::InvalidResponse(format!("Couldn't decode the response: {error}")))
}

fn property(object: &JsValue, name: &str) -> Result<JsValue, ClientError> {
    js_sys::Reflect::get(object, &JsValue::from_str(name))
        .map_err(|_| ClientError::InvalidResponse(format!("missing `{name}'")))
}

fn string_property(object: &JsValue, name: &str) -> Result<String, ClientError> {
    property(object, name)?
        .as_string()
        .ok_or_else(|| ClientError::InvalidResponse(format!("`{name}' is not a string")))
}

fn bytes_property(object: &JsValue, name: &str) -> Result<Vec<u8>, ClientError> {
    let value = property(object, name)?;
    let Some(bytes) = value.dyn_ref::<js_sys::Uint8Array>() else {
        return Err(ClientError::InvalidResponse(format!("`{name}' is not a Uint8Array")));
    };
    Ok(bytes.to_vec())
}

fn decode_key(key: &JsValue) -> Result<Key, ClientError> {
    Ok(Key {
        name: string_property(key, "name")?,
        algo: string_property(key, "algo")?,
        pub_key: bytes_property(key, "pubKey")?,
        address: bytes_property(key, "address")?,
        bech32_address: string_property(key, "bech32Address")?,
        is_nano_ledger: property(key, "isNanoLedger")?.as_bool().unwrap_or(false),
    })
}

#[async_trait(?Send)]
impl WalletClient for KeplrExtension {
    fn capabilities(&self) -> Capabilities {
        Capabilities::EXTENSION
    }

    async fn enable(&self, chain_ids: &[String]) -> Result<(), ClientError> {
        self.keplr.enable(chain_ids.to_vec()).await?;
        Ok(())
    }

    async fn get_key(&self, chain_id: &str) -> Result<Key, ClientError> {
        let key = self.keplr.get_key(chain_id).await?;
        decode_key(&key)
    }

    async fn sign_amino(
        &self,
        chain_id: &str,
        signer: &str,
        sign_doc: &serde_json::Value,
    ) -> Result<serde_json::Value, ClientError> {
        let sign_doc = to_js(sign_doc)?;
        let response = self.keplr.sign_amino(chain_id, signer, sign_doc).await?;
        from_js(response)
    }

    async fn experimental_suggest_chain(
        &self,
        chain_info: &serde_json::Value,
    ) -> Result<(), ClientError> {
        let chain_info = to_js(chain_info)?;
        self.keplr.experimental_suggest_chain(chain_info).await?;
        Ok(())
    }
}
