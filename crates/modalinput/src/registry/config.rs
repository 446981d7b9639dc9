//! # Keymap documents
//!
//! Keymaps can be loaded from JSON documents containing either a single keymap object or an
//! array of them:
//!
//! ```json
//! {
//!     "name": "user-normal",
//!     "mode": "normal",
//!     "priority": 1,
//!     "source": "user",
//!     "bindings": [
//!         { "keys": "g d", "action": "lsp.definition", "when": "lspActive" },
//!         { "keys": "<C-s>", "action": "file.save", "description": "Save the file" }
//!     ]
//! }
//! ```
//!
//! A document is loaded as a unit: if any binding in it is invalid, none of its keymaps are
//! registered.
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use super::{Keymap, Registry};
use crate::errors::ConfigError;

/// Decode a keymap document.
///
/// This only checks the document's structure. Key sequences and conditions are checked when
/// the keymaps are registered.
pub fn parse_keymaps(json: &str) -> Result<Vec<Keymap>, ConfigError> {
    let doc: Value = serde_json::from_str(json)?;

    let keymaps = match doc {
        Value::Array(_) => serde_json::from_value(doc)?,
        doc => vec![serde_json::from_value(doc)?],
    };

    Ok(keymaps)
}

/// Read and decode a keymap document from a file.
pub fn load_keymap_file<P: AsRef<Path>>(path: P) -> Result<Vec<Keymap>, ConfigError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)?;
    let keymaps = parse_keymaps(&json)?;

    debug!(path = %path.display(), keymaps = keymaps.len(), "read keymap file");

    Ok(keymaps)
}

impl Registry {
    /// Register every keymap in a JSON document, or none of them if any is invalid.
    ///
    /// Returns the number of keymaps registered.
    pub fn load_json(&self, json: &str) -> Result<usize, ConfigError> {
        let keymaps = parse_keymaps(json)?;
        let count = keymaps.len();

        self.register_all(keymaps)?;

        Ok(count)
    }

    /// Register every keymap in a JSON file, or none of them if any is invalid.
    ///
    /// Returns the number of keymaps registered.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<usize, ConfigError> {
        let keymaps = load_keymap_file(path)?;
        let count = keymaps.len();

        self.register_all(keymaps)?;

        Ok(count)
    }
}
