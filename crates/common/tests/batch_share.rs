//! Integration tests for sharing a batch of files with one recipient

mod common;

use crate::common::{quiet, sample_files, TestEnv, DAY, NOW};

use ::common::ledger::AccountKind;
use ::common::share::{open_share, share_files, ShareError, Status};
use ::common::file::decrypt_file;
use ::common::store::{fetch_blob, fetch_manifest, StoreError};
use ::common::wallet::Wallet;

#[tokio::test]
async fn test_share_and_open_as_recipient() {
    let env = TestEnv::new();
    let alice = env.user();
    let bob = env.user();
    let files = sample_files();

    let mut seen = Vec::new();
    let shared = share_files(
        &alice.ctx,
        &files,
        Some(&bob.wallet.public_key()),
        7,
        NOW,
        &mut |status| seen.push(status),
    )
    .await
    .unwrap();

    assert_eq!(shared.file_count, 2);
    assert_eq!(shared.recipient, bob.address());
    assert_eq!(shared.expires_at, NOW + 7 * DAY);
    assert_eq!(
        seen,
        vec![
            Status::DerivingKey,
            Status::Encrypting,
            Status::Uploading,
            Status::CreatingShare,
            Status::Shared {
                file_count: 2,
                recipient: bob.address(),
            },
        ]
    );

    let record = bob
        .ctx
        .program
        .fetch_batch_share(&shared.batch_share)
        .await
        .unwrap();
    assert_eq!(record.owner, alice.address());
    assert_eq!(record.manifest_cid, shared.manifest_cid.to_string());
    assert_eq!(record.expiry, Some(NOW + 7 * DAY));

    let opened = open_share(&bob.ctx, &shared.batch_share, NOW + DAY, true, &mut quiet)
        .await
        .unwrap();
    assert_eq!(opened.kind, AccountKind::BatchShare);
    assert_eq!(opened.owner, alice.address());
    assert_eq!(opened.files.len(), files.len());
    for (file, original) in opened.files.iter().zip(&files) {
        assert_eq!(file.name, original.name);
        assert_eq!(file.mime_type, original.mime_type);
        assert_eq!(file.data, original.data);
    }
    // batch shares are not documents, nothing to log
    assert!(env.ledger.access_logs().is_empty());
}

#[tokio::test]
async fn test_manifest_carries_wrapped_keys_not_plaintext() {
    let env = TestEnv::new();
    let alice = env.user();
    let bob = env.user();
    let files = sample_files();

    let shared = share_files(
        &alice.ctx,
        &files,
        Some(&bob.wallet.public_key()),
        1,
        NOW,
        &mut quiet,
    )
    .await
    .unwrap();

    // two blobs plus the manifest
    assert_eq!(env.store.len(), 3);

    let manifest = fetch_manifest(env.store.as_ref(), &shared.manifest_cid)
        .await
        .unwrap();
    assert_eq!(manifest.files.len(), 2);
    assert_eq!(manifest.files[0].size, files[0].size());
    assert_ne!(manifest.files[0].nonce, manifest.files[1].nonce);
    assert_eq!(manifest.keys.len(), 2);
    assert!(manifest.key_for(&bob.wallet.public_key()).is_some());
    assert!(manifest.key_for(&alice.wallet.public_key()).is_some());

    let json = String::from_utf8(manifest.to_json().unwrap()).unwrap();
    assert!(!json.contains("meet at noon"));
}

#[tokio::test]
async fn test_sender_can_open_own_share() {
    let env = TestEnv::new();
    let alice = env.user();
    let bob = env.user();

    let shared = share_files(
        &alice.ctx,
        &sample_files(),
        Some(&bob.wallet.public_key()),
        1,
        NOW,
        &mut quiet,
    )
    .await
    .unwrap();

    // past expiry still opens for the owner
    let opened = open_share(&alice.ctx, &shared.batch_share, NOW + 30 * DAY, false, &mut quiet)
        .await
        .unwrap();
    assert_eq!(opened.files.len(), 2);
}

#[tokio::test]
async fn test_outsider_is_denied() {
    let env = TestEnv::new();
    let alice = env.user();
    let bob = env.user();
    let carol = env.user();

    let shared = share_files(
        &alice.ctx,
        &sample_files(),
        Some(&bob.wallet.public_key()),
        7,
        NOW,
        &mut quiet,
    )
    .await
    .unwrap();

    let mut seen = Vec::new();
    let err = open_share(&carol.ctx, &shared.batch_share, NOW, false, &mut |s| {
        seen.push(s)
    })
    .await
    .unwrap_err();
    assert!(matches!(err, ShareError::AccessDenied));
    assert_eq!(seen, vec![Status::CheckingAccess, Status::AccessDenied]);
    assert_eq!(seen.last().unwrap().to_string(), "Access denied");
}

#[tokio::test]
async fn test_expired_share_is_refused() {
    let env = TestEnv::new();
    let alice = env.user();
    let bob = env.user();

    let shared = share_files(
        &alice.ctx,
        &sample_files(),
        Some(&bob.wallet.public_key()),
        2,
        NOW,
        &mut quiet,
    )
    .await
    .unwrap();

    let err = open_share(&bob.ctx, &shared.batch_share, NOW + 3 * DAY, false, &mut quiet)
        .await
        .unwrap_err();
    assert!(matches!(err, ShareError::Expired(at) if at == NOW + 2 * DAY));
}

#[tokio::test]
async fn test_preconditions_do_no_work() {
    let env = TestEnv::new();
    let alice = env.user();
    let bob = env.user();

    let mut seen = Vec::new();
    let err = share_files(
        &alice.ctx,
        &[],
        Some(&bob.wallet.public_key()),
        7,
        NOW,
        &mut |s| seen.push(s),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ShareError::NoFiles));
    assert!(err.is_precondition());

    let err = share_files(&alice.ctx, &sample_files(), None, 7, NOW, &mut |s| {
        seen.push(s)
    })
    .await
    .unwrap_err();
    assert!(matches!(err, ShareError::NoRecipient));

    let err = share_files(
        &alice.ctx,
        &sample_files(),
        Some(&bob.wallet.public_key()),
        0,
        NOW,
        &mut |s| seen.push(s),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ShareError::InvalidExpiry));

    assert!(seen.is_empty());
    assert_eq!(env.store.puts(), 0);
    assert!(env.ledger.submitted().is_empty());
}

#[tokio::test]
async fn test_failed_upload_records_nothing() {
    let env = TestEnv::new();
    let alice = env.user();
    let bob = env.user();

    // first file goes up, second fails
    env.store.fail_on_put(1);

    let mut seen = Vec::new();
    let err = share_files(
        &alice.ctx,
        &sample_files(),
        Some(&bob.wallet.public_key()),
        7,
        NOW,
        &mut |s| seen.push(s),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ShareError::Store(StoreError::Upload(_))));
    assert_eq!(env.store.puts(), 2);
    assert!(env.ledger.submitted().is_empty());
    assert_eq!(seen.last(), Some(&Status::Failed("Error uploading files")));
    assert!(!seen.contains(&Status::CreatingShare));
}

#[tokio::test]
async fn test_recipient_key_does_not_open_other_shares() {
    let env = TestEnv::new();
    let alice = env.user();
    let bob = env.user();
    let carol = env.user();

    let to_bob = share_files(
        &alice.ctx,
        &sample_files(),
        Some(&bob.wallet.public_key()),
        7,
        NOW,
        &mut quiet,
    )
    .await
    .unwrap();
    let to_carol = share_files(
        &alice.ctx,
        &sample_files(),
        Some(&carol.wallet.public_key()),
        7,
        NOW,
        &mut quiet,
    )
    .await
    .unwrap();

    // bob holds his own key and can read carol's manifest and blobs directly
    let bobs = fetch_manifest(env.store.as_ref(), &to_bob.manifest_cid)
        .await
        .unwrap();
    let bob_key = bob
        .wallet
        .recover_share(bobs.key_for(&bob.wallet.public_key()).unwrap())
        .unwrap();
    let carols = fetch_manifest(env.store.as_ref(), &to_carol.manifest_cid)
        .await
        .unwrap();
    assert!(carols.key_for(&bob.wallet.public_key()).is_none());
    assert_ne!(bobs.salt, carols.salt);

    for entry in &carols.files {
        let blob = fetch_blob(env.store.as_ref(), &entry.cid().unwrap())
            .await
            .unwrap();
        assert!(decrypt_file(&blob, &bob_key, &entry.nonce).is_err());
    }

    // the ledger check refuses him too
    let err = open_share(&bob.ctx, &to_carol.batch_share, NOW, false, &mut quiet)
        .await
        .unwrap_err();
    assert!(matches!(err, ShareError::AccessDenied));

    // carol's own key still works
    let opened = open_share(&carol.ctx, &to_carol.batch_share, NOW, false, &mut quiet)
        .await
        .unwrap();
    assert_eq!(opened.files[0].data, sample_files()[0].data);
}
