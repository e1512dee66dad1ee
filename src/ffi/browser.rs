use wasm_bindgen::{JsCast as _, closure::Closure, prelude::*};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(thread_local_v2, js_namespace = ["window"], js_name = "navigator")]
    pub static NAVIGATOR: Option<Navigator>;
}

#[wasm_bindgen]
extern "C" {
    #[derive(Clone, PartialEq)]
    pub type Storage;

    /// `null` when the key is not set
    #[wasm_bindgen(method, catch, js_name = "getItem")]
    pub fn get_item(this: &Storage, key: &str) -> Result<Option<String>, JsValue>;

    /// Throws when the quota is exceeded.
    #[wasm_bindgen(method, catch, js_name = "setItem")]
    pub fn set_item(this: &Storage, key: &str, value: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = "removeItem")]
    pub fn remove_item(this: &Storage, key: &str) -> Result<(), JsValue>;
}

#[wasm_bindgen]
extern "C" {
    #[derive(Clone, PartialEq)]
    pub type Navigator;

    #[wasm_bindgen(method, getter, js_name = "userAgent")]
    pub fn user_agent(this: &Navigator) -> String;
}

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["window"], js_name = "addEventListener")]
    pub fn add_event_listener(event: &str, listener: &Closure<dyn FnMut(JsValue)>);
}

/// the `navigator.userAgent` of the page, if there is one
pub fn user_agent() -> Option<String> {
    NAVIGATOR.with(|navigator| navigator.as_ref().map(Navigator::user_agent))
}

/// `window.localStorage`
///
/// Reading the property throws (`SecurityError`) when the page is not allowed
/// to use the storage, in a sandboxed iframe for example.
pub fn local_storage() -> Result<Option<Storage>, JsValue> {
    let window = js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str("window"))?;
    let storage = js_sys::Reflect::get(&window, &JsValue::from_str("localStorage"))?;

    if storage.is_object() {
        Ok(Some(storage.unchecked_into()))
    } else {
        Ok(None)
    }
}
