//! Integration tests for ledger-backed documents and legacy memos

mod common;

use ::common::crypto::{wrap_key_and_nonce, CipherMode, KeyMaterial};
use ::common::document::{encode, DocumentError, DocumentManager, KeyFormat};
use ::common::ledger::{LedgerProvider, MemoryLedger};
use ::common::share::share_to_ledger;
use ::common::storage::ContentStore;

#[tokio::test]
async fn test_create_commit_load() {
    let env = common::setup_test_env().await;
    let manager = &env.manager;

    let (id, chain) = manager.create(b"# Hello\n\nWorld", Some("note.md")).await.unwrap();
    let record = env.ledger.get_record(id).await.unwrap();
    assert_eq!(record.owner, manager.owner());
    assert_eq!(record.content_address, chain.versions()[0].content_address);
    assert_eq!(record.memo, encode(&chain).unwrap());

    let loaded = manager.load(id).await.unwrap();
    assert_eq!(loaded, chain);

    let updated = manager.update(&loaded, b"# Hello\n\nWorld v2", None).await.unwrap();
    manager.commit(id, &updated).await.unwrap();

    let record = env.ledger.get_record(id).await.unwrap();
    assert_eq!(record.content_address, updated.versions()[1].content_address);
    let reloaded = manager.load(id).await.unwrap();
    assert_eq!(reloaded.current_version(), 2);
    assert_eq!(
        manager.read_current(&reloaded).await.unwrap(),
        b"# Hello\n\nWorld v2".to_vec()
    );
}

#[tokio::test]
async fn test_list_filters_hidden_and_foreign_records() {
    let env = common::setup_test_env().await;
    let manager = &env.manager;
    let owner = manager.owner().to_string();

    let (visible, _) = manager.create(b"# Visible", None).await.unwrap();
    let (hidden, chain) = manager.create(b"# Hidden", None).await.unwrap();
    manager.commit(hidden, &manager.hide(&chain)).await.unwrap();

    let garbage = env.ledger.create_record(&owner, "", "not a memo").await.unwrap();
    let (shared, _) = share_to_ledger(&env.blobs, &env.ledger, &owner, b"snap", "Snap", "text/plain")
        .await
        .unwrap();
    env.ledger.create_record("0xsomeoneelse", "", "Key: a, Nonce: b").await.unwrap();

    let ids: Vec<u64> = manager.list(false).await.unwrap().iter().map(|(id, _)| *id).collect();
    assert_eq!(ids, vec![visible]);

    let ids: Vec<u64> = manager.list(true).await.unwrap().iter().map(|(id, _)| *id).collect();
    assert_eq!(ids, vec![visible, hidden]);

    assert!(matches!(
        manager.load(garbage).await,
        Err(DocumentError::UnparsableMemo(id)) if id == garbage
    ));
    assert!(matches!(
        manager.load(shared).await,
        Err(DocumentError::UnparsableMemo(_))
    ));
}

#[tokio::test]
async fn test_load_missing_record() {
    let env = common::setup_test_env().await;
    assert!(matches!(
        env.manager.load(404).await,
        Err(DocumentError::RecordNotFound(404))
    ));
}

#[tokio::test]
async fn test_legacy_plain_memo_is_readable_and_restorable() {
    let env = common::setup_test_env().await;
    let owner = env.manager.owner().to_string();

    let material = KeyMaterial::generate(CipherMode::Stream).unwrap();
    let address = env.blobs.put(material.seal(b"# Legacy").unwrap()).await.unwrap();
    let memo = format!(
        "Key: {}, Nonce: {}",
        material.key_base64(),
        material.nonce_base64()
    );
    let id = env.ledger.create_record(&owner, &address, &memo).await.unwrap();

    let chain = env.manager.load(id).await.unwrap();
    let record = env.ledger.get_record(id).await.unwrap();
    assert_eq!(chain.versions()[0].content_address, address);
    assert_eq!(chain.versions()[0].timestamp, record.created_at);
    assert_eq!(chain.versions()[0].key_format(), KeyFormat::Plain);
    assert_eq!(env.manager.read_current(&chain).await.unwrap(), b"# Legacy");

    // restoring re-encrypts into the current combined format
    let restored = env.manager.restore_version(&chain, 1).await.unwrap();
    assert_eq!(restored.versions()[1].key_format(), KeyFormat::Combined);
    env.manager.commit(id, &restored).await.unwrap();

    let memo = env.ledger.get_record(id).await.unwrap().memo;
    assert!(memo.starts_with('{'));
    assert_eq!(
        env.manager.read_current(&env.manager.load(id).await.unwrap()).await.unwrap(),
        b"# Legacy"
    );
}

#[tokio::test]
async fn test_legacy_wallet_memo_takes_two_prompts() {
    let env = common::setup_test_env().await;
    let owner = env.manager.owner().to_string();

    let material = KeyMaterial::generate(CipherMode::Stream).unwrap();
    let address = env.blobs.put(material.seal(b"# Wallet era").unwrap()).await.unwrap();
    let (wrapped_key, wrapped_nonce) = wrap_key_and_nonce(&material, &env.key.public()).unwrap();
    let memo = serde_json::json!({
        "title": "Wallet era",
        "fileName": "wallet.md",
        "encryptedKey": wrapped_key,
        "encryptedNonce": wrapped_nonce,
    })
    .to_string();
    let id = env.ledger.create_record(&owner, &address, &memo).await.unwrap();

    let chain = env.manager.load(id).await.unwrap();
    assert_eq!(chain.metadata().title, "Wallet era");
    assert_eq!(chain.versions()[0].key_format(), KeyFormat::Wallet);

    assert_eq!(env.manager.read_current(&chain).await.unwrap(), b"# Wallet era");
    assert_eq!(env.provider.prompts(), 2);
}

#[tokio::test]
async fn test_ledger_failure_leaves_chain_untouched() {
    let env = common::setup_test_env().await;
    let ledger = common::FlakyLedger::new(MemoryLedger::new());
    let manager = DocumentManager::new(
        env.blobs.clone(),
        ledger.clone(),
        env.provider.clone(),
        env.key.public().address(),
    );

    ledger.set_failing(true);
    assert!(matches!(
        manager.create(b"# Draft", None).await,
        Err(DocumentError::Ledger(_))
    ));

    ledger.set_failing(false);
    let (id, chain) = manager.create(b"# Draft", None).await.unwrap();
    let updated = manager.update(&chain, b"# Draft v2", None).await.unwrap();
    let snapshot = updated.clone();

    ledger.set_failing(true);
    assert!(matches!(
        manager.commit(id, &updated).await,
        Err(DocumentError::Ledger(_))
    ));
    assert_eq!(updated, snapshot);
    // the record still points at the last committed chain
    assert_eq!(manager.load(id).await.unwrap(), chain);

    // retrying the same commit succeeds once the ledger is back
    ledger.set_failing(false);
    manager.commit(id, &updated).await.unwrap();
    assert_eq!(manager.load(id).await.unwrap(), updated);
}
