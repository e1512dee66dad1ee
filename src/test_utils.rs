//! Test doubles for the collaborators of the connection manager.

use crate::{
    error::{ClientError, RelayError},
    relay::{RelayConnector, RelayEvent, RelayTransport},
    wallet::{Capabilities, Key, WalletClient},
};
use async_trait::async_trait;
use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    rc::Rc,
};

pub(crate) struct MockTransport {
    connected: Cell<bool>,
    uri: RefCell<Option<String>>,
    listener: RefCell<Option<Rc<dyn Fn(RelayEvent)>>>,
    kills: Cell<usize>,
    fail_session: bool,
    requests: RefCell<Vec<(String, serde_json::Value)>>,
    responses: RefCell<VecDeque<Result<serde_json::Value, RelayError>>>,
}

impl MockTransport {
    pub(crate) const URI: &'static str =
        "wc:8a5e5bdc-a0e4-4702-ba63-8f1a5655744f@1?bridge=https%3A%2F%2Fbridge.walletconnect.org&key=41791102999c339c844880b23950704cc43aa840f3739e365323cda4dfa89e7a";

    fn new(connected: bool, fail_session: bool) -> Self {
        Self {
            connected: Cell::new(connected),
            uri: RefCell::new(None),
            listener: RefCell::new(None),
            kills: Cell::new(0),
            fail_session,
            requests: RefCell::new(Vec::new()),
            responses: RefCell::new(VecDeque::new()),
        }
    }

    /// simulate the wallet application joining or leaving the pairing
    pub(crate) fn emit(&self, event: RelayEvent) {
        self.connected.set(event == RelayEvent::Connect);
        let listener = self.listener.borrow().clone();
        if let Some(listener) = listener {
            listener(event);
        }
    }

    pub(crate) fn kills(&self) -> usize {
        self.kills.get()
    }

    pub(crate) fn respond(&self, response: Result<serde_json::Value, RelayError>) {
        self.responses.borrow_mut().push_back(response);
    }

    pub(crate) fn requests(&self) -> Vec<(String, serde_json::Value)> {
        self.requests.borrow().clone()
    }
}

#[async_trait(?Send)]
impl RelayTransport for MockTransport {
    fn connected(&self) -> bool {
        self.connected.get()
    }

    fn accounts(&self) -> Vec<String> {
        if self.connected.get() {
            vec!["cosmos1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc5lzv7xu".to_owned()]
        } else {
            Vec::new()
        }
    }

    fn uri(&self) -> Option<String> {
        self.uri.borrow().clone()
    }

    fn set_listener(&self, listener: Rc<dyn Fn(RelayEvent)>) {
        *self.listener.borrow_mut() = Some(listener);
    }

    async fn create_session(&self) -> Result<(), RelayError> {
        if self.fail_session {
            return Err(RelayError::Transport("bridge unreachable".to_owned()));
        }
        *self.uri.borrow_mut() = Some(Self::URI.to_owned());
        Ok(())
    }

    async fn request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, RelayError> {
        self.requests.borrow_mut().push((method.to_owned(), params));
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or(Ok(serde_json::Value::Null))
    }

    async fn kill_session(&self) -> Result<(), RelayError> {
        self.kills.set(self.kills.get() + 1);
        self.connected.set(false);
        Ok(())
    }
}

#[derive(Default)]
struct TransportsInner {
    opened: RefCell<Vec<Rc<MockTransport>>>,
    paired: bool,
    fail_next_session: Cell<bool>,
}

/// Keeps track of the transports opened by a [`MockConnector`].
#[derive(Clone, Default)]
pub(crate) struct Transports(Rc<TransportsInner>);

impl Transports {
    pub(crate) fn last(&self) -> Rc<MockTransport> {
        Rc::clone(
            self.0
                .opened
                .borrow()
                .last()
                .expect("no transport was opened"),
        )
    }

    pub(crate) fn opened(&self) -> usize {
        self.0.opened.borrow().len()
    }

    pub(crate) fn fail_next_session(&self) {
        self.0.fail_next_session.set(true);
    }
}

pub(crate) struct MockConnector {
    transports: Transports,
}

impl MockConnector {
    /// transports wait for [`MockTransport::emit`] to pair
    pub(crate) fn new() -> (Self, Transports) {
        let transports = Transports::default();
        (
            Self {
                transports: transports.clone(),
            },
            transports,
        )
    }

    /// transports are already paired when opened
    pub(crate) fn paired() -> (Self, Transports) {
        let transports = Transports(Rc::new(TransportsInner {
            paired: true,
            ..TransportsInner::default()
        }));
        (
            Self {
                transports: transports.clone(),
            },
            transports,
        )
    }
}

impl RelayConnector for MockConnector {
    fn open(&self) -> Result<Rc<dyn RelayTransport>, RelayError> {
        let inner = &self.transports.0;
        let transport = Rc::new(MockTransport::new(
            inner.paired,
            inner.fail_next_session.replace(false),
        ));
        inner.opened.borrow_mut().push(Rc::clone(&transport));
        Ok(transport)
    }
}

pub(crate) struct MockClient {
    capabilities: Capabilities,
}

impl MockClient {
    pub(crate) fn extension() -> Rc<dyn WalletClient> {
        Rc::new(Self {
            capabilities: Capabilities::EXTENSION,
        })
    }

    pub(crate) fn relay() -> Rc<dyn WalletClient> {
        Rc::new(Self {
            capabilities: Capabilities::RELAY,
        })
    }
}

#[async_trait(?Send)]
impl WalletClient for MockClient {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    async fn enable(&self, _chain_ids: &[String]) -> Result<(), ClientError> {
        Ok(())
    }

    async fn get_key(&self, chain_id: &str) -> Result<Key, ClientError> {
        Ok(Key {
            name: format!("{chain_id} account"),
            algo: "secp256k1".to_owned(),
            pub_key: vec![2; 33],
            address: vec![1; 20],
            bech32_address: "cosmos1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc5lzv7xu".to_owned(),
            is_nano_ledger: false,
        })
    }

    async fn sign_amino(
        &self,
        _chain_id: &str,
        _signer: &str,
        sign_doc: &serde_json::Value,
    ) -> Result<serde_json::Value, ClientError> {
        Ok(sign_doc.clone())
    }
}
