//! Local Keybase secret-key loader and in-memory keyring.

mod error;
mod keyring_impl;
mod loader;
mod parse;
mod path;

pub use error::KeyringError;
pub use keyring_impl::create_ephemeral;
pub use loader::{KeyringLoader, KeyringStats};
pub use path::config_dir;
