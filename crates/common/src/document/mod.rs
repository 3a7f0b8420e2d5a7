//! Versioned encrypted documents
//!
//! - [`chain`]: the version chain data model
//! - [`codec`]: memo encoding, including legacy decoders
//! - [`detect`]: title / type / file name inference
//! - [`manager`]: publish, update, restore and ledger persistence

pub mod chain;
pub mod codec;
pub mod detect;
pub mod manager;

pub use chain::{
    DocumentMetadata, DocumentVersion, KeyFormat, VersionChain, VersionId, SCHEMA_VERSION,
};
pub use codec::{decode, decode_record, encode, try_decode, CodecError, RecordMemo};
pub use detect::DocumentTraits;
pub use manager::{DocumentError, DocumentManager, KeyProtection};
