//! Raw bindings to the JavaScript objects of the page.
//!
//! Nothing here is meant to be called outside of a browser.

pub mod browser;
pub mod keplr;
pub mod walletconnect;

pub use self::{keplr::Keplr, walletconnect::WalletConnect};
