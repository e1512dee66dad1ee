use crate::{
    error::{ConnectionError, ErrorKind},
    relay::RelaySessionManager,
    wallet::{WalletClient, WalletDescriptor},
};
use std::rc::Rc;

/// Build the client of the given wallet.
///
/// Wallets using the relay protocol get the (lazily created) relay session.
/// A relay session that cannot be paired makes the wallet unavailable. Any
/// failure of the wallet's own factory is returned untouched. There is no
/// retry here, the application retries by connecting again.
pub async fn build(
    descriptor: &WalletDescriptor,
    relay: &RelaySessionManager,
) -> Result<Option<Rc<dyn WalletClient>>, ConnectionError> {
    let session = if descriptor.uses_relay_protocol() {
        let session = relay.ensure_session().await.map_err(|error| {
            ErrorKind::WalletUnavailable {
                id: descriptor.id().to_owned(),
                reason: Some(error.to_string()),
            }
        })?;
        Some(session)
    } else {
        None
    };

    descriptor
        .factory()
        .create_client(session)
        .await
        .map_err(ConnectionError::Opaque)
}
