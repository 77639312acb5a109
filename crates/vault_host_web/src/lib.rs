//! Browser (`wasm32`) implementations of the [`vault_host`] contracts.
//!
//! Metadata, accounts, the session and uploaded bytes all live in `window.localStorage`; bytes are
//! stored as base64 data URLs under `blob.{record_id}` keys.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod picker;
pub mod storage;

use std::rc::Rc;

pub use picker::{pick_files, trigger_download, PickedFile};
pub use storage::WebKeyValueStore;
use vault_host::{HostServices, HostStrategy, KeyValueBlobStore};

/// Builds host services over `localStorage`.
pub fn web_host_services() -> HostServices {
    let records = Rc::new(WebKeyValueStore);
    let blobs = Rc::new(KeyValueBlobStore::new(records.clone()));
    HostServices::new(records, blobs, HostStrategy::Browser)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn web_services_report_browser_strategy() {
        assert_eq!(web_host_services().strategy, HostStrategy::Browser);
    }
}
