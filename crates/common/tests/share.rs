//! Integration tests for share packages, shared records and share links

mod common;

use ::common::ledger::LedgerProvider;
use ::common::share::{
    build_share_package, open_share_package, open_shared_record, share_to_ledger, ShareError,
    ShareLink, SharePackage,
};
use url::Url;

#[tokio::test]
async fn test_package_through_store_and_link() {
    let env = common::setup_test_env().await;
    let base = Url::parse("https://ledgerdoc.local").unwrap();

    let (package, secret) = build_share_package(b"# Shared\n\nhi", "Shared", "text/markdown").unwrap();
    let address = package.store(&env.blobs).await.unwrap();
    let link = ShareLink::Package {
        address: address.clone(),
        secret,
    }
    .to_url(&base)
    .unwrap();

    // the recipient only has the link
    let parsed = ShareLink::parse(link.as_str()).unwrap();
    let ShareLink::Package { address, secret } = parsed else {
        panic!("expected a package link");
    };
    let fetched = SharePackage::fetch(&env.blobs, &address).await.unwrap();
    let opened = open_share_package(&fetched, secret.as_str()).unwrap();
    assert_eq!(opened.content, b"# Shared\n\nhi".to_vec());
    assert_eq!(opened.title, "Shared");
}

#[tokio::test]
async fn test_shared_record_roundtrip() {
    let env = common::setup_test_env().await;
    let owner = env.manager.owner().to_string();

    let (id, secret) = share_to_ledger(
        &env.blobs,
        &env.ledger,
        &owner,
        b"# Snapshot",
        "Snapshot",
        "text/markdown",
    )
    .await
    .unwrap();

    let record = env.ledger.get_record(id).await.unwrap();
    assert!(record.memo.contains("\"type\":\"shared\""));
    assert!(!record.memo.contains(secret.as_str()));

    let opened = open_shared_record(&env.blobs, &env.ledger, id, secret.as_str())
        .await
        .unwrap();
    assert_eq!(opened.content, b"# Snapshot".to_vec());
    assert_eq!(opened.title, "Snapshot");
    // no credential was involved
    assert_eq!(env.provider.prompts(), 0);
}

#[tokio::test]
async fn test_shared_record_rejects_wrong_secret() {
    let env = common::setup_test_env().await;
    let owner = env.manager.owner().to_string();
    let (id, secret) = share_to_ledger(&env.blobs, &env.ledger, &owner, b"data", "T", "text/plain")
        .await
        .unwrap();

    let mut wrong: Vec<char> = secret.as_str().chars().collect();
    wrong[7] = if wrong[7] == 'a' { 'b' } else { 'a' };
    let wrong: String = wrong.into_iter().collect();

    for bad in ["", "1234", wrong.as_str(), "gggggggg"] {
        match open_shared_record(&env.blobs, &env.ledger, id, bad).await {
            Err(ShareError::KeyReconstructionFailed(_)) | Err(ShareError::AuthenticationFailed) => {}
            other => panic!("expected failure for {bad:?}, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_document_record_is_not_shared() {
    let env = common::setup_test_env().await;
    let (id, _) = env.manager.create(b"# Private", None).await.unwrap();

    assert!(matches!(
        open_shared_record(&env.blobs, &env.ledger, id, "deadbeef").await,
        Err(ShareError::NotShared(not_shared)) if not_shared == id
    ));
    assert!(matches!(
        open_shared_record(&env.blobs, &env.ledger, 999, "deadbeef").await,
        Err(ShareError::RecordNotFound(999))
    ));
}

#[tokio::test]
async fn test_share_current_version_of_a_document() {
    let env = common::setup_test_env().await;
    let (_, chain) = env.manager.create(b"# Draft", None).await.unwrap();
    let chain = env.manager.update(&chain, b"# Final", None).await.unwrap();

    let plaintext = env.manager.read_current(&chain).await.unwrap();
    let metadata = chain.metadata();
    let (package, secret) =
        build_share_package(&plaintext, &metadata.title, &metadata.file_type).unwrap();

    let opened = open_share_package(&package, secret.as_str()).unwrap();
    assert_eq!(opened.content, b"# Final".to_vec());
    assert_eq!(opened.title, "Final");
}
