/*!
Built-in descriptors for the Keplr wallet.

* [`extension`]: the browser extension (also injected by Keplr's in-app
  browser on mobile);
* [`mobile`]: the Keplr mobile application, paired through WalletConnect.
*/

mod extension;
mod wallet_connect;

pub use self::{
    extension::{ExtensionFactory, KeplrExtension},
    wallet_connect::{WalletConnectFactory, WalletConnectKeplr},
};
use crate::WalletDescriptor;

pub const EXTENSION_ID: &str = "keplr";
pub const MOBILE_ID: &str = "walletconnect_keplr";

const KEPLR_ICON: &str = "https://raw.githubusercontent.com/chainapsis/keplr-wallet/master/packages/extension/src/public/assets/logo-256.png";
const WALLETCONNECT_ICON: &str = "https://raw.githubusercontent.com/WalletConnect/walletconnect-assets/master/Logo/Blue%20(Default)/Logo.svg";

/// the Keplr browser extension
pub fn extension() -> WalletDescriptor {
    WalletDescriptor::new(EXTENSION_ID, "Keplr Wallet", ExtensionFactory)
        .with_description("Keplr Chrome Extension")
        .with_image_url(KEPLR_ICON)
}

/// the Keplr mobile application, reached through WalletConnect
pub fn mobile() -> WalletDescriptor {
    WalletDescriptor::new(MOBILE_ID, "WalletConnect", WalletConnectFactory)
        .with_description("Keplr Mobile")
        .with_image_url(WALLETCONNECT_ICON)
        .with_relay_protocol()
}

/// both Keplr wallets, extension first
pub fn wallets() -> Vec<WalletDescriptor> {
    vec![extension(), mobile()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptors() {
        let wallets = wallets();
        assert_eq!(wallets.len(), 2);
        assert_eq!(wallets[0].id(), EXTENSION_ID);
        assert!(!wallets[0].uses_relay_protocol());
        assert_eq!(wallets[1].id(), MOBILE_ID);
        assert!(wallets[1].uses_relay_protocol());
        assert_eq!(wallets[1].description(), "Keplr Mobile");
    }
}
