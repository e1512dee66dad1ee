use crate::{
    error::ClientError,
    wallet::{Capabilities, Key, WalletClient, WalletDescriptor},
};
use core::fmt;
use std::rc::Rc;

/// A wallet whose client was successfully enabled.
///
/// Only exists while the connection is established: it is dropped on
/// disconnect and never kept when the enable sequence fails.
#[derive(Clone)]
pub struct ConnectedWallet {
    wallet: Rc<WalletDescriptor>,
    client: Rc<dyn WalletClient>,
}

impl ConnectedWallet {
    pub(crate) fn new(wallet: Rc<WalletDescriptor>, client: Rc<dyn WalletClient>) -> Self {
        Self { wallet, client }
    }

    /// return the identifier of the wallet
    pub fn id(&self) -> &str {
        self.wallet.id()
    }

    /// return the name of the wallet
    pub fn name(&self) -> &str {
        self.wallet.name()
    }

    /// returns the image to display for this wallet
    pub fn image_url(&self) -> &str {
        self.wallet.image_url()
    }

    pub fn descriptor(&self) -> &WalletDescriptor {
        &self.wallet
    }

    pub fn client(&self) -> &Rc<dyn WalletClient> {
        &self.client
    }

    pub fn capabilities(&self) -> Capabilities {
        self.client.capabilities()
    }

    /// `true` if this connection goes through a relay session
    pub fn uses_relay_protocol(&self) -> bool {
        self.wallet.uses_relay_protocol() || self.capabilities().uses_relay_protocol
    }

    /// get the key of the selected account for the given chain
    pub async fn key(&self, chain_id: &str) -> Result<Key, ClientError> {
        self.client.get_key(chain_id).await
    }
}

impl fmt::Debug for ConnectedWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectedWallet")
            .field("wallet", &self.wallet)
            .field("capabilities", &self.capabilities())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::OpaqueError, relay::RelaySession, test_utils::MockClient, wallet::ClientFactory};
    use async_trait::async_trait;
    use futures::executor::block_on;

    struct Unused;

    #[async_trait(?Send)]
    impl ClientFactory for Unused {
        async fn create_client(
            &self,
            _session: Option<RelaySession>,
        ) -> Result<Option<Rc<dyn WalletClient>>, OpaqueError> {
            Ok(None)
        }
    }

    #[test]
    fn delegates_to_descriptor_and_client() {
        let descriptor = WalletDescriptor::new("walletconnect_keplr", "WalletConnect", Unused)
            .with_image_url("https://example.org/wc.svg")
            .with_relay_protocol();
        let wallet = ConnectedWallet::new(Rc::new(descriptor), MockClient::relay());

        assert_eq!(wallet.id(), "walletconnect_keplr");
        assert_eq!(wallet.name(), "WalletConnect");
        assert_eq!(wallet.image_url(), "https://example.org/wc.svg");
        assert!(wallet.uses_relay_protocol());
        assert!(!wallet.capabilities().supports_chain_suggestion);

        let key = block_on(wallet.key("juno-1")).unwrap();
        assert_eq!(key.name, "juno-1 account");
    }
}
