/*!
Pairing protocol sessions (WalletConnect style).

Mobile wallets are reached through a relay: the web application creates a
pairing session, displays its URI as a QR code, and the wallet application
joins it. The [`RelaySessionManager`] owns that session for the whole
application lifetime:

```text
Uninitialized -> Pairing -> Paired -> Closed
```

A session is created lazily by [`RelaySessionManager::ensure_session`] and
reused until it is closed, either by us ([`RelaySessionManager::close`]) or
by the wallet application (the transport raises a disconnect event).
*/

use crate::error::RelayError;
use async_trait::async_trait;
use futures::channel::oneshot;
use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelayPhase {
    Uninitialized,
    Pairing,
    Paired,
    Closed,
}

/// Lifecycle events raised by the relay transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelayEvent {
    Connect,
    Disconnect,
}

/// The raw pairing protocol client.
#[async_trait(?Send)]
pub trait RelayTransport {
    fn connected(&self) -> bool;

    fn accounts(&self) -> Vec<String>;

    /// the pairing URI, to display as a QR code
    fn uri(&self) -> Option<String>;

    /// install the callback receiving the transport's lifecycle events
    fn set_listener(&self, listener: Rc<dyn Fn(RelayEvent)>);

    /// start a new pairing, the URI becomes available once this resolves
    async fn create_session(&self) -> Result<(), RelayError>;

    /// send a JSON-RPC request to the paired wallet
    async fn request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, RelayError>;

    async fn kill_session(&self) -> Result<(), RelayError>;
}

/// Opens new [`RelayTransport`]s.
pub trait RelayConnector {
    fn open(&self) -> Result<Rc<dyn RelayTransport>, RelayError>;
}

struct SessionInner {
    transport: Rc<dyn RelayTransport>,
    phase: Cell<RelayPhase>,
    waiters: RefCell<Vec<oneshot::Sender<Result<(), RelayError>>>>,
}

impl SessionInner {
    fn mark_paired(&self) {
        if self.phase.get() == RelayPhase::Closed {
            return;
        }
        self.phase.set(RelayPhase::Paired);
        for waiter in self.waiters.take() {
            let _ = waiter.send(Ok(()));
        }
    }

    /// returns `false` if the session was already closed
    fn mark_closed(&self) -> bool {
        if self.phase.replace(RelayPhase::Closed) == RelayPhase::Closed {
            return false;
        }
        for waiter in self.waiters.take() {
            let _ = waiter.send(Err(RelayError::PairingAborted));
        }
        true
    }
}

/// Handle on the pairing session given to the relay based wallets.
#[derive(Clone)]
pub struct RelaySession {
    inner: Rc<SessionInner>,
}

impl RelaySession {
    fn new(transport: Rc<dyn RelayTransport>) -> Self {
        Self {
            inner: Rc::new(SessionInner {
                transport,
                phase: Cell::new(RelayPhase::Pairing),
                waiters: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn phase(&self) -> RelayPhase {
        self.inner.phase.get()
    }

    pub fn connected(&self) -> bool {
        self.phase() == RelayPhase::Paired
    }

    pub fn accounts(&self) -> Vec<String> {
        self.inner.transport.accounts()
    }

    pub fn uri(&self) -> Option<String> {
        self.inner.transport.uri()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// send a JSON-RPC request to the paired wallet application
    pub async fn request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, RelayError> {
        if self.phase() == RelayPhase::Closed {
            return Err(RelayError::Closed);
        }
        self.inner.transport.request(method, params).await
    }

    async fn wait_paired(&self) -> Result<(), RelayError> {
        match self.phase() {
            RelayPhase::Paired => return Ok(()),
            RelayPhase::Closed => return Err(RelayError::PairingAborted),
            RelayPhase::Uninitialized | RelayPhase::Pairing => (),
        }

        let (sender, receiver) = oneshot::channel();
        self.inner.waiters.borrow_mut().push(sender);
        receiver.await.unwrap_or(Err(RelayError::PairingAborted))
    }
}

type DisconnectListener = Rc<RefCell<Option<Rc<dyn Fn()>>>>;

pub struct RelaySessionManager {
    connector: Rc<dyn RelayConnector>,
    session: RefCell<Option<RelaySession>>,
    on_disconnect: DisconnectListener,
}

impl RelaySessionManager {
    pub fn new(connector: Rc<dyn RelayConnector>) -> Self {
        Self {
            connector,
            session: RefCell::new(None),
            on_disconnect: Rc::new(RefCell::new(None)),
        }
    }

    /// Set the callback invoked when the wallet application closes the
    /// session on its own.
    pub fn set_disconnect_listener(&self, listener: Rc<dyn Fn()>) {
        *self.on_disconnect.borrow_mut() = Some(listener);
    }

    pub fn phase(&self) -> RelayPhase {
        self.session
            .borrow()
            .as_ref()
            .map_or(RelayPhase::Uninitialized, RelaySession::phase)
    }

    /// the URI of the pairing in progress, if any
    pub fn pairing_uri(&self) -> Option<String> {
        let session = self.session.borrow();
        let session = session.as_ref()?;
        if session.phase() == RelayPhase::Pairing {
            session.uri()
        } else {
            None
        }
    }

    /// Returns the current session once paired, creating it if there is none
    /// (or if the previous one was closed).
    ///
    /// Resolves only once the wallet application joined the pairing.
    pub async fn ensure_session(&self) -> Result<RelaySession, RelayError> {
        let current = self
            .session
            .borrow()
            .as_ref()
            .filter(|session| session.phase() != RelayPhase::Closed)
            .cloned();

        let session = match current {
            Some(session) => session,
            None => self.open().await?,
        };

        session.wait_paired().await?;
        Ok(session)
    }

    async fn open(&self) -> Result<RelaySession, RelayError> {
        let transport = self.connector.open()?;
        let session = RelaySession::new(Rc::clone(&transport));

        let weak = Rc::downgrade(&session.inner);
        let on_disconnect = Rc::clone(&self.on_disconnect);
        transport.set_listener(Rc::new(move |event| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            match event {
                RelayEvent::Connect => {
                    log::debug!("relay session paired");
                    inner.mark_paired();
                }
                RelayEvent::Disconnect => {
                    if inner.mark_closed() {
                        log::debug!("relay session closed by the remote wallet");
                        let listener = on_disconnect.borrow().clone();
                        if let Some(listener) = listener {
                            listener();
                        }
                    }
                }
            }
        }));

        *self.session.borrow_mut() = Some(session.clone());

        if transport.connected() {
            session.inner.mark_paired();
        } else if let Err(error) = transport.create_session().await {
            session.inner.mark_closed();
            return Err(error);
        }

        Ok(session)
    }

    /// Tear down the current session. Safe to call multiple times, failures
    /// of the transport are only logged.
    pub async fn close(&self) {
        let Some(session) = self.session.borrow().clone() else {
            return;
        };
        if !session.inner.mark_closed() {
            return;
        }

        if let Err(error) = session.inner.transport.kill_session().await {
            log::warn!("Failed to close the relay session: {error}");
        }
    }
}
