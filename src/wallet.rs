use crate::{
    error::{ClientError, OpaqueError},
    relay::RelaySession,
};
use async_trait::async_trait;
use std::{fmt, rc::Rc};

/// What a [`WalletClient`] is able to do.
///
/// The connection manager and the application branch on these flags rather
/// than on the concrete client type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Capabilities {
    /// the client talks to a mobile wallet through a relay session
    pub uses_relay_protocol: bool,
    /// `experimentalSuggestChain` is available
    pub supports_chain_suggestion: bool,
}

impl Capabilities {
    pub const EXTENSION: Self = Self {
        uses_relay_protocol: false,
        supports_chain_suggestion: true,
    };

    pub const RELAY: Self = Self {
        uses_relay_protocol: true,
        supports_chain_suggestion: false,
    };
}

/// Public key information of the account selected in the wallet for a
/// given chain.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Key {
    pub name: String,
    pub algo: String,
    pub pub_key: Vec<u8>,
    pub address: Vec<u8>,
    pub bech32_address: String,
    pub is_nano_ledger: bool,
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("name", &self.name)
            .field("algo", &self.algo)
            .field("pub_key", &hex::encode(&self.pub_key))
            .field("address", &hex::encode(&self.address))
            .field("bech32_address", &self.bech32_address)
            .field("is_nano_ledger", &self.is_nano_ledger)
            .finish()
    }
}

/// Uniform interface over the wallet backends.
///
/// Amino sign documents (`StdSignDoc`) are passed as JSON values, in the shape
/// the Cosmos wallets expect.
#[async_trait(?Send)]
pub trait WalletClient {
    fn capabilities(&self) -> Capabilities;

    /// request access to the given chains
    async fn enable(&self, chain_ids: &[String]) -> Result<(), ClientError>;

    async fn get_key(&self, chain_id: &str) -> Result<Key, ClientError>;

    async fn sign_amino(
        &self,
        chain_id: &str,
        signer: &str,
        sign_doc: &serde_json::Value,
    ) -> Result<serde_json::Value, ClientError>;

    async fn experimental_suggest_chain(
        &self,
        chain_info: &serde_json::Value,
    ) -> Result<(), ClientError> {
        let _ = chain_info;
        Err(ClientError::Unsupported("experimentalSuggestChain"))
    }
}

/// Produces the [`WalletClient`] of a registered wallet.
#[async_trait(?Send)]
pub trait ClientFactory {
    /// Called when the wallet is picked, before any client is built. Failing
    /// here aborts the connection.
    async fn on_select(&self) -> Result<(), OpaqueError> {
        Ok(())
    }

    /// Build the client. `session` is only given to wallets using the relay
    /// protocol. `Ok(None)` means the wallet is not available.
    async fn create_client(
        &self,
        session: Option<RelaySession>,
    ) -> Result<Option<Rc<dyn WalletClient>>, OpaqueError>;
}

/// Registration record of a wallet the user can connect to.
#[derive(Clone)]
pub struct WalletDescriptor {
    id: String,
    name: String,
    description: String,
    image_url: String,
    uses_relay_protocol: bool,
    factory: Rc<dyn ClientFactory>,
}

impl WalletDescriptor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        factory: impl ClientFactory + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            image_url: String::new(),
            uses_relay_protocol: false,
            factory: Rc::new(factory),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = image_url.into();
        self
    }

    /// mark the wallet as needing a relay session to build its client
    pub fn with_relay_protocol(mut self) -> Self {
        self.uses_relay_protocol = true;
        self
    }

    /// unique identifier, also the value remembered for auto-connect
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// the image to display next to the name when listing the wallets
    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    pub fn uses_relay_protocol(&self) -> bool {
        self.uses_relay_protocol
    }

    pub(crate) fn factory(&self) -> &dyn ClientFactory {
        self.factory.as_ref()
    }
}

impl fmt::Debug for WalletDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("uses_relay_protocol", &self.uses_relay_protocol)
            .finish_non_exhaustive()
    }
}

impl PartialEq for WalletDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
