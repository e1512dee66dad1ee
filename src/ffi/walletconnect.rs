use wasm_bindgen::{closure::Closure, prelude::*};

#[wasm_bindgen]
extern "C" {
    /// The WalletConnect (v1) client, expected as a global of the page.
    #[wasm_bindgen(js_namespace = ["window"])]
    #[derive(Clone)]
    pub type WalletConnect;

    /// `options` is `{ bridge, clientMeta }`
    #[wasm_bindgen(constructor, catch, js_namespace = ["window"])]
    pub fn new(options: &JsValue) -> Result<WalletConnect, JsValue>;

    /// `true` once a wallet joined the session
    #[wasm_bindgen(method, getter)]
    pub fn connected(this: &WalletConnect) -> bool;

    #[wasm_bindgen(method, getter)]
    pub fn accounts(this: &WalletConnect) -> Vec<String>;

    /// The pairing URI (`wc:...`), to display as a QR code.
    #[wasm_bindgen(method, getter)]
    pub fn uri(this: &WalletConnect) -> String;

    /// Publish a new session request on the bridge.
    #[wasm_bindgen(method, catch, js_name = "createSession")]
    pub async fn create_session(this: &WalletConnect) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = "killSession")]
    pub async fn kill_session(this: &WalletConnect) -> Result<JsValue, JsValue>;

    /// Send a JSON-RPC request `{ id, jsonrpc, method, params }` to the
    /// paired wallet and resolve with its `result`.
    #[wasm_bindgen(method, catch, js_name = "sendCustomRequest")]
    pub async fn send_custom_request(
        this: &WalletConnect,
        request: JsValue,
    ) -> Result<JsValue, JsValue>;

    /// Subscribe to `"connect"`, `"disconnect"` or `"session_update"`. The
    /// callback receives `(error, payload)`.
    #[wasm_bindgen(method)]
    pub fn on(this: &WalletConnect, event: &str, callback: &Closure<dyn FnMut(JsValue, JsValue)>);
}
