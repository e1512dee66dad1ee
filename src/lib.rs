/*!

# Cosmos Connector for browser wallets

This library is meant to be used for web applications that need to connect to Cosmos wallets.
It keeps track of which wallet is connected, restores it on the next visit and takes care
of the WalletConnect pairing with mobile wallets.

## Features

- Connect the Keplr extension or Keplr mobile (through WalletConnect)
- Reconnect the last connected wallet on startup
- Bring your own wallets with [`WalletDescriptor`] and [`ClientFactory`]
- Observe every transition of the connection

## Usage

Create the [`WalletManager`] once, when the application starts, and give clones of it to
whatever needs to read or drive the connection:

```no_run
use cosmos_connector::{EnableChains, WalletManager, WalletManagerConfig, browser, keplr};
use std::rc::Rc;

# fn test() -> anyhow::Result<()> {
let config = WalletManagerConfig {
    chain_ids: vec!["juno-1".to_owned()],
    ..WalletManagerConfig::default()
};
let enable_wallet = Rc::new(EnableChains::from(&config));

let manager = WalletManager::new(
    config,
    keplr::wallets(),
    enable_wallet,
    browser::environment(Default::default()),
)?;
browser::watch_keystore_changes(&manager);
# Ok(()) }
```

The presentation layer renders the [`ConnectionState`] and reports the user's choice:

```no_run
# use cosmos_connector::{ConnectionState, WalletManager};
# async fn test(manager: WalletManager) -> Result<(), cosmos_connector::error::ClientError> {
manager.subscribe(|state| match state {
    ConnectionState::Selecting => { /* show the wallet list */ }
    ConnectionState::Connected(wallet) => println!("connected to {}", wallet.name()),
    ConnectionState::Errored(error) => eprintln!("{error}"),
    _ => (),
});

manager.connect(None);
manager.select_wallet("keplr");

// later
if let Some(wallet) = manager.connected_wallet() {
    let key = wallet.key("juno-1").await?;
    println!("{}", key.bech32_address);
}
manager.disconnect().await;
# Ok(()) }
```

While Keplr mobile is pairing, [`WalletManager::pairing_uri`] returns the URI to show as
a QR code.

*/

pub mod browser;
pub mod config;
mod connected_wallet;
pub mod error;
mod factory;
pub mod ffi;
pub mod keplr;
mod manager;
pub mod relay;
pub mod storage;
mod wallet;

#[cfg(test)]
mod test_utils;

pub use self::{
    config::{WalletConnectOptions, WalletManagerConfig},
    connected_wallet::ConnectedWallet,
    error::{ConnectionError, ErrorKind, OpaqueError},
    manager::{
        ConnectionState, EnableChains, EnableWallet, Environment, Phase, SubscriptionId,
        WalletManager, WeakWalletManager,
    },
    wallet::{Capabilities, ClientFactory, Key, WalletClient, WalletDescriptor},
};
