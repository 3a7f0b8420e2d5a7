//! Integration tests for publishing, updating and restoring version chains

mod common;

use ::common::credential::{CredentialError, LocalCredentialProvider, Prompt};
use ::common::crypto::{CipherError, COMBINED_FORMAT_SENTINEL};
use ::common::document::{
    decode, encode, DocumentError, DocumentManager, KeyFormat, KeyProtection,
};
use ::common::storage::ContentStore;
use ::common::ledger::MemoryLedger;

#[tokio::test]
async fn test_publish_update_hide_restore() {
    let env = common::setup_test_env().await;
    let manager = &env.manager;

    let chain = manager
        .publish(b"# Hello\n\nWorld", Some("note.md"))
        .await
        .unwrap();
    assert_eq!(chain.versions().len(), 1);
    assert_eq!(chain.current_version(), 1);
    assert_eq!(chain.metadata().title, "Hello");
    assert_eq!(chain.metadata().file_type, "text/markdown");

    let updated = manager
        .update(&chain, b"# Hello\n\nWorld v2", None)
        .await
        .unwrap();
    assert_eq!(updated.versions().len(), 2);
    assert_eq!(updated.current_version(), 2);
    assert_eq!(
        updated.versions()[0].content_address,
        chain.versions()[0].content_address
    );

    let hidden = manager.hide(&updated);
    assert!(!hidden.metadata().is_visible);
    assert_eq!(hidden.versions(), updated.versions());

    let restored = manager.restore_version(&hidden, 1).await.unwrap();
    assert_eq!(restored.versions().len(), 3);
    assert_eq!(restored.current_version(), 3);
    assert_eq!(
        manager.read_version(&restored, 3).await.unwrap(),
        b"# Hello\n\nWorld".to_vec()
    );
    assert_eq!(
        manager.read_current(&restored).await.unwrap(),
        b"# Hello\n\nWorld".to_vec()
    );
}

#[tokio::test]
async fn test_restore_fidelity_and_fresh_key_material() {
    let env = common::setup_test_env().await;
    let manager = &env.manager;

    let chain = manager.publish(b"A", Some("a.md")).await.unwrap();
    let chain = manager.update(&chain, b"B", None).await.unwrap();
    let restored = manager.restore_version(&chain, 1).await.unwrap();

    assert_eq!(&restored.versions()[..2], chain.versions());
    assert_eq!(manager.read_version(&restored, 1).await.unwrap(), b"A");
    assert_eq!(manager.read_version(&restored, 2).await.unwrap(), b"B");
    assert_eq!(manager.read_version(&restored, 3).await.unwrap(), b"A");

    let v1 = &restored.versions()[0];
    let v3 = &restored.versions()[2];
    assert_ne!(v1.wrapped_key, v3.wrapped_key);
    // fresh nonce, so the stored ciphertext differs too
    assert_ne!(v1.content_address, v3.content_address);
}

#[tokio::test]
async fn test_append_only_and_monotonic_ids() {
    let env = common::setup_test_env().await;
    let manager = &env.manager;

    let mut chain = manager.publish(b"v1", None).await.unwrap();
    let steps: &[Option<u64>] = &[None, None, Some(1), None, Some(2), Some(5)];
    for step in steps {
        let before = chain.clone();
        let expected_id = before.versions().iter().map(|v| v.version_id).max().unwrap() + 1;

        chain = match step {
            Some(target) => manager.restore_version(&chain, *target).await.unwrap(),
            None => manager
                .update(&chain, format!("rev {expected_id}").as_bytes(), None)
                .await
                .unwrap(),
        };

        assert_eq!(chain.current_version(), expected_id);
        assert_eq!(chain.versions().len(), before.versions().len() + 1);
        assert_eq!(&chain.versions()[..before.versions().len()], before.versions());
    }

    let history: Vec<u64> = manager
        .version_history(&chain)
        .iter()
        .map(|v| v.version_id)
        .collect();
    assert_eq!(history, vec![7, 6, 5, 4, 3, 2, 1]);
}

#[tokio::test]
async fn test_new_versions_use_combined_format() {
    let env = common::setup_test_env().await;
    let chain = env.manager.publish(b"# Doc", None).await.unwrap();
    let version = &chain.versions()[0];

    assert_eq!(version.wrapped_nonce_or_sentinel, COMBINED_FORMAT_SENTINEL);
    assert_eq!(version.key_format, Some(KeyFormat::Combined));
    assert!(version.wrapped_key.starts_with("0x"));
    assert_eq!(version.size, 5);
}

#[tokio::test]
async fn test_combined_read_costs_one_prompt() {
    let env = common::setup_test_env().await;
    let chain = env.manager.publish(b"# Doc", None).await.unwrap();
    // one public key request while publishing
    assert_eq!(env.provider.prompts(), 1);

    env.manager.update(&chain, b"# Doc 2", None).await.unwrap();
    // public key is cached by the session
    assert_eq!(env.provider.prompts(), 1);

    env.manager.read_current(&chain).await.unwrap();
    assert_eq!(env.provider.prompts(), 2);
}

#[tokio::test]
async fn test_empty_content_rejected() {
    let env = common::setup_test_env().await;
    assert!(matches!(
        env.manager.publish(b"", None).await,
        Err(DocumentError::EmptyContent)
    ));

    let chain = env.manager.publish(b"x", None).await.unwrap();
    assert!(matches!(
        env.manager.update(&chain, b"", None).await,
        Err(DocumentError::EmptyContent)
    ));
}

#[tokio::test]
async fn test_restore_missing_version() {
    let env = common::setup_test_env().await;
    let chain = env.manager.publish(b"x", None).await.unwrap();
    assert!(matches!(
        env.manager.restore_version(&chain, 9).await,
        Err(DocumentError::VersionNotFound(9))
    ));
}

#[tokio::test]
async fn test_storage_failure_leaves_chain_untouched() {
    let env = common::setup_test_env().await;
    let store = common::FlakyStore::new(env.blobs.clone());
    let manager = DocumentManager::new(
        store.clone(),
        MemoryLedger::new(),
        env.provider.clone(),
        env.key.public().address(),
    );

    let chain = manager.publish(b"# First", None).await.unwrap();
    let snapshot = chain.clone();

    store.set_failing(true);
    assert!(matches!(
        manager.update(&chain, b"# Second", None).await,
        Err(DocumentError::Storage(_))
    ));
    assert!(matches!(
        manager.restore_version(&chain, 1).await,
        Err(DocumentError::Storage(_))
    ));
    assert_eq!(chain, snapshot);

    // retrying with the same input succeeds once the store is back
    store.set_failing(false);
    let updated = manager.update(&chain, b"# Second", None).await.unwrap();
    assert_eq!(updated.current_version(), 2);
}

#[tokio::test]
async fn test_rejected_prompt_surfaces_user_rejected() {
    let env = common::setup_test_env().await;
    let chain = env.manager.publish(b"# Private", None).await.unwrap();

    let refusing = LocalCredentialProvider::new(env.key.clone())
        .with_approval(|prompt| matches!(prompt, Prompt::PublicKey { .. }));
    let manager = DocumentManager::new(
        env.blobs.clone(),
        MemoryLedger::new(),
        refusing,
        env.key.public().address(),
    );

    assert!(matches!(
        manager.read_current(&chain).await,
        Err(DocumentError::Credential(CredentialError::UserRejected))
    ));
    let result = manager.restore_version(&chain, 1).await;
    assert!(matches!(
        result,
        Err(DocumentError::Credential(CredentialError::UserRejected))
    ));
}

#[tokio::test]
async fn test_wrong_owner_cannot_read() {
    let env = common::setup_test_env().await;
    let chain = env.manager.publish(b"# Private", None).await.unwrap();

    let stranger = ::common::crypto::OwnerSecretKey::generate().unwrap();
    let manager = DocumentManager::new(
        env.blobs.clone(),
        MemoryLedger::new(),
        LocalCredentialProvider::new(stranger.clone()),
        stranger.public().address(),
    );
    // the wrapped key is sealed to the real owner
    assert!(manager.read_current(&chain).await.is_err());
}

#[tokio::test]
async fn test_plain_protection() {
    let env = common::setup_test_env().await;
    let manager = DocumentManager::new(
        env.blobs.clone(),
        MemoryLedger::new(),
        env.provider.clone(),
        env.key.public().address(),
    )
    .with_protection(KeyProtection::Plain);

    let chain = manager.publish(b"# Plain", None).await.unwrap();
    let version = &chain.versions()[0];
    assert_eq!(version.key_format(), KeyFormat::Plain);
    assert_ne!(version.wrapped_nonce_or_sentinel, COMBINED_FORMAT_SENTINEL);

    assert_eq!(manager.read_current(&chain).await.unwrap(), b"# Plain");
    assert_eq!(env.provider.prompts(), 0);
}

#[tokio::test]
async fn test_tampered_blob_fails_restore() {
    let env = common::setup_test_env().await;
    let chain = env.manager.publish(b"# Original", None).await.unwrap();
    let chain = env.manager.update(&chain, b"# Second", None).await.unwrap();

    // point version 1 at a copy of its blob with one byte flipped
    let address = chain.versions()[0].content_address.clone();
    let mut blob = env.blobs.get(&address).await.unwrap();
    let last = blob.len() - 1;
    blob[last] ^= 0x01;
    let tampered_address = env.blobs.put(blob).await.unwrap();

    let memo = encode(&chain).unwrap().replace(&address, &tampered_address);
    let tampered = decode(&memo).unwrap();
    let snapshot = tampered.clone();

    assert!(matches!(
        env.manager.restore_version(&tampered, 1).await,
        Err(DocumentError::Cipher(CipherError::DecryptionFailed))
    ));
    assert_eq!(tampered, snapshot);
    assert_eq!(tampered.current_version(), 2);

    // the untouched revision still restores
    let restored = env.manager.restore_version(&tampered, 2).await.unwrap();
    assert_eq!(restored.current_version(), 3);
}
