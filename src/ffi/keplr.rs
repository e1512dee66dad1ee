use wasm_bindgen::{JsCast as _, prelude::*};

#[wasm_bindgen]
extern "C" {
    #[derive(Clone, PartialEq)]
    pub type Keplr;

    /// Ask the user to grant the web application access to the given
    /// chains. Resolves once every chain is enabled.
    #[wasm_bindgen(method, catch)]
    pub async fn enable(this: &Keplr, chain_ids: Vec<String>) -> Result<JsValue, JsValue>;

    /// Returns the `Key` of the selected account for the given chain:
    /// `{ name, algo, pubKey, address, bech32Address, isNanoLedger }` where
    /// `pubKey` and `address` are `Uint8Array`.
    #[wasm_bindgen(method, catch, js_name = "getKey")]
    pub async fn get_key(this: &Keplr, chain_id: &str) -> Result<JsValue, JsValue>;

    /// Sign the amino `StdSignDoc`. Resolves to `{ signed, signature }`.
    #[wasm_bindgen(method, catch, js_name = "signAmino")]
    pub async fn sign_amino(
        this: &Keplr,
        chain_id: &str,
        signer: &str,
        sign_doc: JsValue,
    ) -> Result<JsValue, JsValue>;

    /// Register a chain Keplr does not know natively.
    #[wasm_bindgen(method, catch, js_name = "experimentalSuggestChain")]
    pub async fn experimental_suggest_chain(
        this: &Keplr,
        chain_info: JsValue,
    ) -> Result<JsValue, JsValue>;
}

/// get the `window.keplr` object injected by the extension
///
/// This is looked up on every call as the extension may inject the object
/// after our module was loaded.
pub fn keplr() -> Option<Keplr> {
    let window = js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str("window")).ok()?;
    let keplr = js_sys::Reflect::get(&window, &JsValue::from_str("keplr")).ok()?;

    if keplr.is_object() {
        Some(keplr.unchecked_into())
    } else {
        None
    }
}
