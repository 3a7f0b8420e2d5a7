//! Cryptographic primitives for ledgerdoc
//!
//! - **Content encryption** ([`cipher`]): one fresh 256-bit key and nonce per
//!   document revision or share snapshot. XChaCha20-Poly1305 for stored
//!   revisions, AES-256-GCM on the sharing path.
//! - **Owner key wrapping** ([`wrap`]): revision keys are sealed to the
//!   owner's X25519 encryption key so only the owner's credential provider can
//!   unwrap them.
//! - **Share secret splitting** ([`split`]): a snapshot key is split into a
//!   public partial key and a short secret carried in a link fragment.
//!
//! # Security Model
//!
//! No key is ever reused across documents or versions. Restoring an old
//! revision re-encrypts its plaintext under new material. Share links expose
//! exactly one snapshot; nothing in the ledger memo alone can decrypt it.

pub mod cipher;
pub mod keys;
pub mod split;
pub mod wrap;

pub use cipher::{
    CipherError, CipherMode, KeyMaterial, Sealed, Secret, GCM_NONCE_SIZE, SECRET_SIZE,
    STREAM_NONCE_SIZE,
};
pub use keys::{KeyError, OwnerPublicKey, OwnerSecretKey};
pub use split::{
    build_share_info, build_share_info_with_iv, recover_key, ShareInfo, ShareSecret, SplitError,
    SplitStrategy,
};
pub use wrap::{
    unwrap_key_and_nonce, unwrap_key_material, wrap_key_and_nonce, wrap_key_material, WrapError,
    WrappedEnvelope, COMBINED_FORMAT_SENTINEL,
};
