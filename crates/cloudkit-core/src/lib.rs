//! Core types and trait definitions for the CloudKit document store.
//!
//! Everything the engine and the storage backends share lives here: the
//! row and response models, URI classification, request options, view
//! declarations and the `Adapter` contract. No server framework and no
//! database driver appear in this crate's dependency tree.

// The `Adapter` contract is written with native async trait methods; the
// `Send` story for their futures is pinned down explicitly in adapter.rs,
// so the compiler's advisory lint adds nothing here.
#![allow(async_fn_in_trait)]

pub mod adapter;
pub mod entry;
pub mod error;
pub mod options;
pub mod response;
pub mod uri;
pub mod view;

pub use adapter::{Adapter, Filters, StorageTx};
pub use entry::{EntryMeta, NewEntry, StoreEntry};
pub use error::{StorageError, StorageResult};
pub use options::RequestOptions;
pub use response::Response;
pub use uri::UriKind;
pub use view::{View, ViewRow};
