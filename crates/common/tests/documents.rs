//! Integration tests for registered documents and access grants

mod common;

use bytes::Bytes;

use crate::common::{quiet, sample_files, TestEnv, DAY, NOW};

use ::common::crypto::KeyPurpose;
use ::common::file::encrypt_file;
use ::common::ledger::{AccessFilter, AccountKind, LedgerError, ProgramAccount};
use ::common::manifest::{Keys, Manifest};
use ::common::share::{open_share, register_files, ShareError, Status};
use ::common::store::{fetch_manifest, upload_batch, ContentStore};
use ::common::wallet::Wallet;

#[tokio::test]
async fn test_register_grant_and_open() {
    let env = TestEnv::new();
    let alice = env.user();
    let bob = env.user();
    let files = sample_files();

    let mut seen = Vec::new();
    let registered = register_files(
        &alice.ctx,
        &files,
        &[bob.wallet.public_key()],
        7,
        NOW,
        &mut |s| seen.push(s),
    )
    .await
    .unwrap();

    assert_eq!(registered.grants.len(), 1);
    assert_eq!(
        seen,
        vec![
            Status::DerivingKey,
            Status::Encrypting,
            Status::Uploading,
            Status::RegisteringDocument,
            Status::GrantingAccess(bob.address()),
            Status::Registered {
                file_count: 2,
                document: registered.document,
            },
        ]
    );

    let doc = alice
        .ctx
        .program
        .fetch_document(&registered.document)
        .await
        .unwrap();
    assert_eq!(doc.owner, alice.address());
    assert_eq!(doc.ipfs_hash, registered.manifest_cid.to_string());
    assert_eq!(doc.expires_at, NOW + 7 * DAY);
    assert_eq!(doc.created_at, NOW);

    assert!(bob
        .ctx
        .program
        .has_access(&registered.document, &bob.address())
        .await
        .unwrap());

    let opened = open_share(&bob.ctx, &registered.document, NOW, true, &mut quiet)
        .await
        .unwrap();
    assert_eq!(opened.kind, AccountKind::Document);
    assert_eq!(opened.files[1].data, files[1].data);

    let logs = env.ledger.access_logs();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].account.doc, registered.document);
    assert_eq!(logs[0].account.user, bob.address());
    assert_eq!(logs[0].account.timestamp, NOW);

    // the log is an ordinary program account, readable by anyone
    let fetched = alice.ctx.program.fetch_account(&logs[0].address).await.unwrap();
    assert_eq!(fetched.kind(), AccountKind::AccessLog);
    assert_eq!(fetched, ProgramAccount::AccessLog(logs[0].account.clone()));
}

#[tokio::test]
async fn test_owner_opens_without_logging() {
    let env = TestEnv::new();
    let alice = env.user();

    let registered = register_files(&alice.ctx, &sample_files(), &[], 7, NOW, &mut quiet)
        .await
        .unwrap();
    assert!(registered.grants.is_empty());

    let opened = open_share(&alice.ctx, &registered.document, NOW, true, &mut quiet)
        .await
        .unwrap();
    assert_eq!(opened.files.len(), 2);
    assert!(env.ledger.access_logs().is_empty());
}

#[tokio::test]
async fn test_revoked_grant_denies_access() {
    let env = TestEnv::new();
    let alice = env.user();
    let bob = env.user();

    let registered = register_files(
        &alice.ctx,
        &sample_files(),
        &[bob.wallet.public_key()],
        7,
        NOW,
        &mut quiet,
    )
    .await
    .unwrap();

    // only the grant's owner may revoke it
    let err = bob
        .ctx
        .program
        .revoke_access(&registered.grants[0])
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Rejected(_)));

    alice
        .ctx
        .program
        .revoke_access(&registered.grants[0])
        .await
        .unwrap();

    assert!(!bob
        .ctx
        .program
        .has_access(&registered.document, &bob.address())
        .await
        .unwrap());
    let err = open_share(&bob.ctx, &registered.document, NOW, false, &mut quiet)
        .await
        .unwrap_err();
    assert!(matches!(err, ShareError::AccessDenied));
}

#[tokio::test]
async fn test_grant_on_other_document_does_not_leak() {
    let env = TestEnv::new();
    let alice = env.user();
    let bob = env.user();

    let shared_with_bob = register_files(
        &alice.ctx,
        &sample_files(),
        &[bob.wallet.public_key()],
        7,
        NOW,
        &mut quiet,
    )
    .await
    .unwrap();
    let private = register_files(&alice.ctx, &sample_files(), &[], 7, NOW, &mut quiet)
        .await
        .unwrap();

    let grants = bob
        .ctx
        .program
        .access_records(AccessFilter::Grantee(bob.address()))
        .await
        .unwrap();
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].account.doc, shared_with_bob.document);

    let err = open_share(&bob.ctx, &private.document, NOW, false, &mut quiet)
        .await
        .unwrap_err();
    assert!(matches!(err, ShareError::AccessDenied));
}

#[tokio::test]
async fn test_expired_document_refused_for_grantee() {
    let env = TestEnv::new();
    let alice = env.user();
    let bob = env.user();

    let registered = register_files(
        &alice.ctx,
        &sample_files(),
        &[bob.wallet.public_key()],
        1,
        NOW,
        &mut quiet,
    )
    .await
    .unwrap();

    let err = open_share(&bob.ctx, &registered.document, NOW + 2 * DAY, false, &mut quiet)
        .await
        .unwrap_err();
    assert!(matches!(err, ShareError::Expired(_)));
}

#[tokio::test]
async fn test_owner_rederives_key_for_manifest_without_keys() {
    let env = TestEnv::new();
    let alice = env.user();
    let bob = env.user();

    // a manifest uploaded with an empty key map and no salt
    let secret = alice.wallet.derive_secret(KeyPurpose::Document, None);
    let encrypted = sample_files()
        .iter()
        .map(|file| encrypt_file(file, &secret))
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    let cid = upload_batch(env.store.as_ref(), &encrypted, Manifest::new(Keys::new()))
        .await
        .unwrap();
    let document = alice
        .ctx
        .program
        .register_document(&cid.to_string(), NOW + DAY)
        .await
        .unwrap();
    alice
        .ctx
        .program
        .grant_access(&document, &bob.address())
        .await
        .unwrap();

    let opened = open_share(&alice.ctx, &document, NOW, false, &mut quiet)
        .await
        .unwrap();
    assert_eq!(opened.files[0].data, sample_files()[0].data);

    // granted, but nothing in the manifest lets bob decrypt
    let err = open_share(&bob.ctx, &document, NOW, false, &mut quiet)
        .await
        .unwrap_err();
    assert!(matches!(err, ShareError::NoKey));
}

#[tokio::test]
async fn test_tampered_blob_fails_to_decrypt() {
    let env = TestEnv::new();
    let alice = env.user();
    let bob = env.user();

    let registered = register_files(
        &alice.ctx,
        &sample_files(),
        &[bob.wallet.public_key()],
        7,
        NOW,
        &mut quiet,
    )
    .await
    .unwrap();

    let manifest = fetch_manifest(env.store.as_ref(), &registered.manifest_cid)
        .await
        .unwrap();
    let blob_cid = manifest.files[0].cid().unwrap();
    let mut blob = env.store.get(&blob_cid).await.unwrap().to_vec();
    blob[0] ^= 0x01;
    env.store.corrupt(&blob_cid, Bytes::from(blob));

    let mut seen = Vec::new();
    let err = open_share(&bob.ctx, &registered.document, NOW, false, &mut |s| {
        seen.push(s)
    })
    .await
    .unwrap_err();
    assert!(matches!(err, ShareError::Secret(_)));
    assert_eq!(seen.last(), Some(&Status::Failed("Error decrypting file")));
}

#[tokio::test]
async fn test_open_missing_account() {
    let env = TestEnv::new();
    let bob = env.user();
    let nowhere = env.user().address();

    let err = open_share(&bob.ctx, &nowhere, NOW, false, &mut quiet)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ShareError::Ledger(LedgerError::AccountNotFound(a)) if a == nowhere
    ));
}

#[tokio::test]
async fn test_access_record_is_not_openable() {
    let env = TestEnv::new();
    let alice = env.user();
    let bob = env.user();

    let registered = register_files(
        &alice.ctx,
        &sample_files(),
        &[bob.wallet.public_key()],
        7,
        NOW,
        &mut quiet,
    )
    .await
    .unwrap();

    let err = open_share(&bob.ctx, &registered.grants[0], NOW, false, &mut quiet)
        .await
        .unwrap_err();
    assert!(matches!(err, ShareError::NotShareable(AccountKind::Access)));
}
