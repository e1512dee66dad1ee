/*!
The connection lifecycle.

```text
            connect()                 wallet chosen
  Idle ───────────────> Selecting ─────────────────> Enabling ──> Connected
   ^                        │                          │   ^          │
   │   selection cancelled  │                          │   │ connect(id)
   └────────────────────────┘                          v   │          │
   ^                                                Errored ──────────┘
   │                     disconnect()                                 │
   └──────────────────────────────────────────────────────────────────┘
```

Each enable sequence is tagged with an attempt token. Every transition the
sequence wants to make after one of its suspension points is discarded if
the token is no longer the current one, which is how [`WalletManager::disconnect`]
cancels an attempt in flight.
*/

use crate::{
    ConnectedWallet,
    config::WalletManagerConfig,
    error::{ClientError, ConfigError, ConnectionError, ErrorKind, OpaqueError, RelayError},
    factory,
    relay::{RelayConnector, RelayPhase, RelaySessionManager},
    storage::KeyValueStore,
    wallet::{WalletClient, WalletDescriptor},
};
use async_trait::async_trait;
use futures::task::{LocalSpawn, LocalSpawnExt as _};
use std::{
    cell::{Cell, RefCell},
    collections::HashSet,
    rc::{Rc, Weak},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Idle,
    Selecting,
    Enabling,
    Connected,
    Errored,
}

/// Snapshot of the connection, as rendered by the presentation layer.
#[derive(Debug, Clone, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    /// waiting for the user to pick a wallet
    Selecting,
    Enabling {
        wallet_id: String,
    },
    Connected(ConnectedWallet),
    Errored(ConnectionError),
}

impl ConnectionState {
    pub fn phase(&self) -> Phase {
        match self {
            Self::Idle => Phase::Idle,
            Self::Selecting => Phase::Selecting,
            Self::Enabling { .. } => Phase::Enabling,
            Self::Connected(_) => Phase::Connected,
            Self::Errored(_) => Phase::Errored,
        }
    }

    pub fn connected_wallet(&self) -> Option<&ConnectedWallet> {
        match self {
            Self::Connected(wallet) => Some(wallet),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ConnectionError> {
        match self {
            Self::Errored(error) => Some(error),
            _ => None,
        }
    }

    /// the wallet being enabled
    pub fn pending_wallet_id(&self) -> Option<&str> {
        match self {
            Self::Enabling { wallet_id } => Some(wallet_id),
            _ => None,
        }
    }
}

/// The application's hook, run once the wallet client is built.
///
/// A failure is stored as the connection error exactly as returned.
#[async_trait(?Send)]
pub trait EnableWallet {
    async fn enable_wallet(
        &self,
        wallet: &WalletDescriptor,
        client: &Rc<dyn WalletClient>,
    ) -> Result<(), OpaqueError>;
}

/// Hook requesting access to a fixed list of chains, usually
/// [`WalletManagerConfig::chain_ids`].
///
/// A rejection by the wallet is reported as the value the wallet failed with.
#[derive(Debug, Clone, Default)]
pub struct EnableChains {
    chain_ids: Vec<String>,
}

impl EnableChains {
    pub fn new(chain_ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            chain_ids: chain_ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn chain_ids(&self) -> &[String] {
        &self.chain_ids
    }
}

impl From<&WalletManagerConfig> for EnableChains {
    fn from(config: &WalletManagerConfig) -> Self {
        Self::new(config.chain_ids.iter().cloned())
    }
}

#[async_trait(?Send)]
impl EnableWallet for EnableChains {
    async fn enable_wallet(
        &self,
        wallet: &WalletDescriptor,
        client: &Rc<dyn WalletClient>,
    ) -> Result<(), OpaqueError> {
        log::debug!("enabling {:?} on `{}'", self.chain_ids, wallet.id());
        client
            .enable(&self.chain_ids)
            .await
            .map_err(|error| match error {
                ClientError::Rejected(error) => error,
                error => OpaqueError::new(error),
            })
    }
}

/// The collaborators of the [`WalletManager`].
pub struct Environment {
    /// remembers the last connected wallet
    pub storage: Rc<dyn KeyValueStore>,
    pub relay: Rc<dyn RelayConnector>,
    /// runs the connection attempts
    pub spawner: Rc<dyn LocalSpawn>,
    /// used to detect a wallet's in-app browser
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Rc<dyn Fn(&ConnectionState)>;

struct Inner {
    config: WalletManagerConfig,
    wallets: Vec<Rc<WalletDescriptor>>,
    enable_wallet: Rc<dyn EnableWallet>,
    storage: Rc<dyn KeyValueStore>,
    relay: RelaySessionManager,
    spawner: Rc<dyn LocalSpawn>,
    embedded_browser: bool,

    state: RefCell<ConnectionState>,
    attempt: Cell<u64>,
    subscribers: RefCell<Vec<(SubscriptionId, Subscriber)>>,
    next_subscription: Cell<u64>,
}

enum Outcome {
    Connected(Rc<dyn WalletClient>),
    Failed(ConnectionError),
    Superseded,
}

/// Handle on the wallet connection of the application.
///
/// Create it once at startup and hand clones of it to whatever needs to
/// read or drive the connection; every clone refers to the same state.
#[derive(Clone)]
pub struct WalletManager {
    inner: Rc<Inner>,
}

/// A [`WalletManager`] handle that does not keep it alive.
#[derive(Clone)]
pub struct WeakWalletManager {
    inner: Weak<Inner>,
}

impl WeakWalletManager {
    pub fn upgrade(&self) -> Option<WalletManager> {
        self.inner.upgrade().map(|inner| WalletManager { inner })
    }
}

impl WalletManager {
    /// Create the manager and, if configured, reconnect the wallet that was
    /// connected last time.
    pub fn new(
        config: WalletManagerConfig,
        wallets: Vec<WalletDescriptor>,
        enable_wallet: Rc<dyn EnableWallet>,
        environment: Environment,
    ) -> Result<Self, ConfigError> {
        let mut ids = HashSet::new();
        for wallet in &wallets {
            if !ids.insert(wallet.id()) {
                return Err(ConfigError::DuplicateWallet(wallet.id().to_owned()));
            }
        }

        let embedded_browser = environment
            .user_agent
            .as_deref()
            .is_some_and(|user_agent| config.is_embedded_browser(user_agent));

        let manager = Self {
            inner: Rc::new(Inner {
                wallets: wallets.into_iter().map(Rc::new).collect(),
                enable_wallet,
                storage: environment.storage,
                relay: RelaySessionManager::new(environment.relay),
                spawner: environment.spawner,
                embedded_browser,
                state: RefCell::new(ConnectionState::Idle),
                attempt: Cell::new(0),
                subscribers: RefCell::new(Vec::new()),
                next_subscription: Cell::new(0),
                config,
            }),
        };

        let weak = manager.downgrade();
        manager.inner.relay.set_disconnect_listener(Rc::new(move || {
            if let Some(manager) = weak.upgrade() {
                manager.relay_disconnected();
            }
        }));

        if manager.inner.config.attempt_auto_connect {
            manager.auto_connect();
        }

        Ok(manager)
    }

    pub fn downgrade(&self) -> WeakWalletManager {
        WeakWalletManager {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn config(&self) -> &WalletManagerConfig {
        &self.inner.config
    }

    /// the registered wallets, in registration order
    pub fn wallets(&self) -> &[Rc<WalletDescriptor>] {
        &self.inner.wallets
    }

    pub fn wallet(&self, id: &str) -> Option<Rc<WalletDescriptor>> {
        self.inner
            .wallets
            .iter()
            .find(|wallet| wallet.id() == id)
            .cloned()
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.state.borrow().clone()
    }

    pub fn phase(&self) -> Phase {
        self.inner.state.borrow().phase()
    }

    pub fn connected_wallet(&self) -> Option<ConnectedWallet> {
        self.inner.state.borrow().connected_wallet().cloned()
    }

    pub fn error(&self) -> Option<ConnectionError> {
        self.inner.state.borrow().error().cloned()
    }

    /// `true` when the page runs inside a wallet's in-app browser
    pub fn is_embedded_browser(&self) -> bool {
        self.inner.embedded_browser
    }

    /// the URI to display as a QR code while a mobile wallet is pairing
    pub fn pairing_uri(&self) -> Option<String> {
        self.inner.relay.pairing_uri()
    }

    pub fn relay_phase(&self) -> RelayPhase {
        self.inner.relay.phase()
    }

    /// Be notified of every transition. The callback receives the new state.
    pub fn subscribe(&self, callback: impl Fn(&ConnectionState) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_subscription.get());
        self.inner.next_subscription.set(id.0 + 1);
        self.inner
            .subscribers
            .borrow_mut()
            .push((id, Rc::new(callback)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner
            .subscribers
            .borrow_mut()
            .retain(|(subscription, _)| *subscription != id);
    }

    /// Start connecting a wallet.
    ///
    /// Ignored while another attempt is enabling. With a registered
    /// `preselected` id (or the configured one) the selection is skipped,
    /// otherwise the manager waits in [`Phase::Selecting`] for
    /// [`select_wallet`] or [`cancel_selection`].
    ///
    /// [`select_wallet`]: Self::select_wallet
    /// [`cancel_selection`]: Self::cancel_selection
    pub fn connect(&self, preselected: Option<&str>) {
        if self.phase() == Phase::Enabling {
            log::debug!("connect ignored, a wallet is already being enabled");
            return;
        }

        let preselected = preselected.or(self.inner.config.preselected_wallet_id.as_deref());
        let wallet = match preselected.and_then(|id| self.wallet(id)) {
            Some(wallet) => Some(wallet),
            None if self.inner.embedded_browser => self
                .inner
                .wallets
                .iter()
                .find(|wallet| !wallet.uses_relay_protocol())
                .cloned(),
            None => None,
        };

        match wallet {
            Some(wallet) => self.start_attempt(wallet),
            None => {
                self.transition(ConnectionState::Selecting);
            }
        }
    }

    /// The user picked a wallet.
    pub fn select_wallet(&self, id: &str) {
        if self.phase() == Phase::Enabling {
            log::debug!("selection of `{id}' ignored, a wallet is already being enabled");
            return;
        }

        match self.wallet(id) {
            Some(wallet) => self.start_attempt(wallet),
            None => {
                self.next_attempt();
                self.transition(ConnectionState::Errored(
                    ErrorKind::UnknownWallet { id: id.to_owned() }.into(),
                ));
            }
        }
    }

    /// The user dismissed the selection, this is not an error.
    pub fn cancel_selection(&self) {
        if self.phase() == Phase::Selecting {
            self.transition(ConnectionState::Idle);
        }
    }

    /// Re-run the enable sequence of the connected wallet, for example after
    /// the user switched account in the wallet.
    pub fn refresh(&self) {
        let wallet = self
            .inner
            .state
            .borrow()
            .connected_wallet()
            .and_then(|connected| self.wallet(connected.id()));
        if let Some(wallet) = wallet {
            self.start_attempt(wallet);
        }
    }

    /// Drop the connected wallet (or the attempt in flight), forget it and
    /// close its relay session. Does nothing if already idle.
    pub async fn disconnect(&self) {
        if self.phase() == Phase::Idle {
            return;
        }

        if self.teardown() {
            self.inner.relay.close().await;
        }
    }

    /// Drop the connection and close the relay session for good. The
    /// remembered wallet is kept for the next auto-connect.
    pub async fn shutdown(&self) {
        self.next_attempt();
        if self.phase() != Phase::Idle {
            self.transition(ConnectionState::Idle);
        }
        self.inner.relay.close().await;
    }

    /// returns `true` if the torn down connection was using the relay
    fn teardown(&self) -> bool {
        self.next_attempt();
        let previous = self.transition(ConnectionState::Idle);
        self.forget_wallet();

        match previous {
            ConnectionState::Connected(wallet) => wallet.uses_relay_protocol(),
            ConnectionState::Enabling { wallet_id } => self
                .wallet(&wallet_id)
                .is_some_and(|wallet| wallet.uses_relay_protocol()),
            _ => false,
        }
    }

    fn relay_disconnected(&self) {
        let relay_backed = self
            .inner
            .state
            .borrow()
            .connected_wallet()
            .is_some_and(ConnectedWallet::uses_relay_protocol);
        if relay_backed {
            log::info!("the mobile wallet closed the session");
            self.teardown();
        }
    }

    fn auto_connect(&self) {
        match self.inner.storage.get_item(&self.inner.config.storage_key) {
            Ok(Some(id)) if self.wallet(&id).is_some() => {
                log::debug!("reconnecting wallet `{id}'");
                self.connect(Some(&id));
            }
            Ok(Some(id)) => log::debug!("remembered wallet `{id}' is not registered"),
            Ok(None) => (),
            Err(error) => log::warn!("Cannot read the last connected wallet: {error}"),
        }
    }

    fn remember_wallet(&self, id: &str) {
        if let Err(error) = self.inner.storage.set_item(&self.inner.config.storage_key, id) {
            log::warn!("Cannot remember the connected wallet: {error}");
        }
    }

    fn forget_wallet(&self) {
        if let Err(error) = self.inner.storage.remove_item(&self.inner.config.storage_key) {
            log::warn!("Cannot forget the connected wallet: {error}");
        }
    }

    fn next_attempt(&self) -> u64 {
        let token = self.inner.attempt.get() + 1;
        self.inner.attempt.set(token);
        token
    }

    fn is_current(&self, token: u64) -> bool {
        self.inner.attempt.get() == token
    }

    fn transition(&self, state: ConnectionState) -> ConnectionState {
        let previous = self.inner.state.replace(state);
        log::debug!("{:?} -> {:?}", previous.phase(), self.phase());
        if self.leaves_relay(&previous) {
            self.release_relay();
        }
        self.notify();
        previous
    }

    /// the relay session goes with the connected wallet it was backing,
    /// unless the relay wallet is being enabled again
    fn leaves_relay(&self, previous: &ConnectionState) -> bool {
        let relay_backed = previous
            .connected_wallet()
            .is_some_and(ConnectedWallet::uses_relay_protocol);
        if !relay_backed {
            return false;
        }

        match &*self.inner.state.borrow() {
            ConnectionState::Enabling { wallet_id } => !self
                .wallet(wallet_id)
                .is_some_and(|wallet| wallet.uses_relay_protocol()),
            ConnectionState::Connected(wallet) => !wallet.uses_relay_protocol(),
            _ => true,
        }
    }

    fn release_relay(&self) {
        let manager = self.clone();
        let spawned = self
            .inner
            .spawner
            .spawn_local(async move { manager.inner.relay.close().await });
        if let Err(error) = spawned {
            log::warn!("Cannot release the relay session: {error}");
        }
    }

    fn notify(&self) {
        let state = self.state();
        let subscribers: Vec<Subscriber> = self
            .inner
            .subscribers
            .borrow()
            .iter()
            .map(|(_, subscriber)| Rc::clone(subscriber))
            .collect();

        for subscriber in subscribers {
            subscriber(&state);
        }
    }

    fn start_attempt(&self, wallet: Rc<WalletDescriptor>) {
        let token = self.next_attempt();
        self.transition(ConnectionState::Enabling {
            wallet_id: wallet.id().to_owned(),
        });

        let manager = self.clone();
        let spawned = self
            .inner
            .spawner
            .spawn_local(async move { manager.run_attempt(wallet, token).await });

        if let Err(error) = spawned {
            log::error!("Cannot start the connection attempt: {error}");
            if self.is_current(token) {
                self.transition(ConnectionState::Errored(ConnectionError::Opaque(
                    OpaqueError::new(error),
                )));
            }
        }
    }

    async fn run_attempt(self, wallet: Rc<WalletDescriptor>, token: u64) {
        match self.attempt(&wallet, token).await {
            Outcome::Connected(client) => {
                log::info!("wallet `{}' connected", wallet.id());
                self.transition(ConnectionState::Connected(ConnectedWallet::new(
                    Rc::clone(&wallet),
                    client,
                )));
                self.remember_wallet(wallet.id());
            }
            Outcome::Failed(error) => {
                log::debug!("wallet `{}' failed to connect: {error}", wallet.id());
                self.transition(ConnectionState::Errored(error));

                if wallet.uses_relay_protocol() {
                    self.inner.relay.close().await;
                }
            }
            Outcome::Superseded => {
                log::debug!("attempt to connect `{}' was superseded", wallet.id());
            }
        }
    }

    async fn attempt(&self, wallet: &WalletDescriptor, token: u64) -> Outcome {
        let selected = wallet.factory().on_select().await;
        if !self.is_current(token) {
            return Outcome::Superseded;
        }
        if let Err(error) = selected {
            return Outcome::Failed(ConnectionError::Opaque(error));
        }

        let built = factory::build(wallet, &self.inner.relay).await;
        if !self.is_current(token) {
            return Outcome::Superseded;
        }
        let client = match built {
            Ok(Some(client)) => client,
            Ok(None) => {
                return Outcome::Failed(
                    ErrorKind::WalletUnavailable {
                        id: wallet.id().to_owned(),
                        reason: None,
                    }
                    .into(),
                );
            }
            Err(error) => return Outcome::Failed(error),
        };

        let enabled = self
            .inner
            .enable_wallet
            .enable_wallet(wallet, &client)
            .await;
        if !self.is_current(token) {
            return Outcome::Superseded;
        }
        match enabled {
            // the mobile wallet left while the hook was running
            Ok(()) if wallet.uses_relay_protocol() && self.relay_phase() == RelayPhase::Closed => {
                Outcome::Failed(
                    ErrorKind::WalletUnavailable {
                        id: wallet.id().to_owned(),
                        reason: Some(RelayError::Closed.to_string()),
                    }
                    .into(),
                )
            }
            Ok(()) => Outcome::Connected(client),
            Err(error) => Outcome::Failed(ConnectionError::Opaque(error)),
        }
    }
}
