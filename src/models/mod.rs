pub mod extension_key;

pub use extension_key::{ExtensionKey, NO_EXTENSION_FOLDER};
