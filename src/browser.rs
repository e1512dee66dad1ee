/*!
Wiring of the [`WalletManager`] to the browser: `localStorage`, the
`WalletConnect` client of the page and the `wasm-bindgen-futures` executor.
*/

use crate::{
    config::WalletConnectOptions,
    error::RelayError,
    ffi,
    manager::{Environment, WalletManager},
    relay::{RelayConnector, RelayEvent, RelayTransport},
    storage::LocalStorage,
};
use async_trait::async_trait;
use futures::{
    future::LocalFutureObj,
    task::{LocalSpawn, SpawnError},
};
use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};
use wasm_bindgen::{JsValue, closure::Closure};

/// event dispatched on `window` when the user switches account in Keplr
pub const KEYSTORE_CHANGE_EVENT: &str = "keplr_keystorechange";

/// Runs the connection attempts on the page's microtask queue.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserSpawner;

impl LocalSpawn for BrowserSpawner {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        wasm_bindgen_futures::spawn_local(future);
        Ok(())
    }
}

fn to_js<T: serde::Serialize + ?Sized>(value: &T) -> Result<JsValue, RelayError> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|error| RelayError::Transport(error.to_string()))
}

/// A session of the page's `WalletConnect` client.
pub struct BrowserRelay {
    client: ffi::WalletConnect,
    next_request_id: Cell<u64>,
    listeners: RefCell<Vec<Closure<dyn FnMut(JsValue, JsValue)>>>,
}

impl BrowserRelay {
    pub fn new(client: ffi::WalletConnect) -> Self {
        Self {
            client,
            next_request_id: Cell::new(1),
            listeners: RefCell::new(Vec::new()),
        }
    }
}

#[async_trait(?Send)]
impl RelayTransport for BrowserRelay {
    fn connected(&self) -> bool {
        self.client.connected()
    }

    fn accounts(&self) -> Vec<String> {
        self.client.accounts()
    }

    fn uri(&self) -> Option<String> {
        Some(self.client.uri()).filter(|uri| !uri.is_empty())
    }

    fn set_listener(&self, listener: Rc<dyn Fn(RelayEvent)>) {
        let mut listeners = self.listeners.borrow_mut();
        for (name, event) in [
            ("connect", RelayEvent::Connect),
            ("disconnect", RelayEvent::Disconnect),
        ] {
            let listener = Rc::clone(&listener);
            let closure = Closure::<dyn FnMut(JsValue, JsValue)>::new(
                move |error: JsValue, _payload: JsValue| {
                    if !error.is_null() && !error.is_undefined() {
                        log::warn!("WalletConnect `{name}' event failed: {error:?}");
                    }
                    listener(event);
                },
            );
            self.client.on(name, &closure);
            listeners.push(closure);
        }
    }

    async fn create_session(&self) -> Result<(), RelayError> {
        self.client
            .create_session()
            .await
            .map(|_| ())
            .map_err(RelayError::from_js)
    }

    async fn request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, RelayError> {
        let id = self.next_request_id.get();
        self.next_request_id.set(id + 1);

        let request = to_js(&serde_json::json!({
            "id": id,
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
        }))?;

        log::debug!("relay request #{id} `{method}'");
        let response = self
            .client
            .send_custom_request(request)
            .await
            .map_err(RelayError::from_js)?;

        serde_wasm_bindgen::from_value(response)
            .map_err(|error| RelayError::Transport(error.to_string()))
    }

    async fn kill_session(&self) -> Result<(), RelayError> {
        self.client
            .kill_session()
            .await
            .map(|_| ())
            .map_err(RelayError::from_js)
    }
}

/// Every session is a new `window.WalletConnect` built with these options.
impl RelayConnector for WalletConnectOptions {
    fn open(&self) -> Result<Rc<dyn RelayTransport>, RelayError> {
        let options = to_js(self)?;
        let client = ffi::WalletConnect::new(&options).map_err(RelayError::from_js)?;
        Ok(Rc::new(BrowserRelay::new(client)))
    }
}

/// The collaborators of a [`WalletManager`] running in a web page.
pub fn environment(options: WalletConnectOptions) -> Environment {
    Environment {
        storage: Rc::new(LocalStorage),
        relay: Rc::new(options),
        spawner: Rc::new(BrowserSpawner),
        user_agent: ffi::browser::user_agent(),
    }
}

/// Refresh the connected wallet every time the user changes account in
/// Keplr. The listener stays registered for the lifetime of the page but
/// does not keep the manager alive.
pub fn watch_keystore_changes(manager: &WalletManager) {
    let manager = manager.downgrade();
    let listener = Closure::<dyn FnMut(JsValue)>::new(move |_event: JsValue| {
        if let Some(manager) = manager.upgrade() {
            log::debug!("keystore changed, refreshing the connected wallet");
            manager.refresh();
        }
    });
    ffi::browser::add_event_listener(KEYSTORE_CHANGE_EVENT, &listener);
    listener.forget();
}

/// Forward the `log` records to the browser console.
#[cfg(target_arch = "wasm32")]
pub fn init_logger() {
    wasm_logger::init(wasm_logger::Config::default());
}
