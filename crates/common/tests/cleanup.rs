//! Integration tests for revoking grants on expired documents

mod common;

use crate::common::{quiet, sample_files, TestEnv, DAY, NOW};

use ::common::ledger::{AccessAccount, Address, ProgramAccount};
use ::common::share::{register_files, revoke_expired};
use ::common::wallet::Wallet;

#[tokio::test]
async fn test_revokes_live_grants_on_expired_documents() {
    let env = TestEnv::new();
    let alice = env.user();
    let bob = env.user();
    let carol = env.user();

    let expiring = register_files(
        &alice.ctx,
        &sample_files(),
        &[bob.wallet.public_key(), carol.wallet.public_key()],
        1,
        NOW,
        &mut quiet,
    )
    .await
    .unwrap();
    let lasting = register_files(
        &alice.ctx,
        &sample_files(),
        &[bob.wallet.public_key()],
        30,
        NOW,
        &mut quiet,
    )
    .await
    .unwrap();

    // carol's grant was already revoked by hand
    alice
        .ctx
        .program
        .revoke_access(&expiring.grants[1])
        .await
        .unwrap();

    let report = revoke_expired(&alice.ctx.program, NOW + 2 * DAY)
        .await
        .unwrap();
    assert_eq!(report.documents_scanned, 2);
    assert_eq!(report.expired_documents, 1);
    assert_eq!(report.revoked, vec![expiring.grants[0]]);
    assert!(report.skipped.is_empty());

    let program = &bob.ctx.program;
    assert!(!program
        .has_access(&expiring.document, &bob.address())
        .await
        .unwrap());
    assert!(program
        .has_access(&lasting.document, &bob.address())
        .await
        .unwrap());
}

#[tokio::test]
async fn test_second_run_is_a_no_op() {
    let env = TestEnv::new();
    let alice = env.user();
    let bob = env.user();

    register_files(
        &alice.ctx,
        &sample_files(),
        &[bob.wallet.public_key()],
        1,
        NOW,
        &mut quiet,
    )
    .await
    .unwrap();

    let first = revoke_expired(&alice.ctx.program, NOW + 2 * DAY)
        .await
        .unwrap();
    assert_eq!(first.revoked.len(), 1);
    let submitted = env.ledger.submitted().len();

    let second = revoke_expired(&alice.ctx.program, NOW + 2 * DAY)
        .await
        .unwrap();
    assert_eq!(second.expired_documents, 1);
    assert!(second.revoked.is_empty());
    assert_eq!(env.ledger.submitted().len(), submitted);
}

#[tokio::test]
async fn test_nothing_expired() {
    let env = TestEnv::new();
    let alice = env.user();
    let bob = env.user();

    register_files(
        &alice.ctx,
        &sample_files(),
        &[bob.wallet.public_key()],
        7,
        NOW,
        &mut quiet,
    )
    .await
    .unwrap();

    // expiry is exclusive: a document expiring exactly now is still live
    let report = revoke_expired(&alice.ctx.program, NOW + 7 * DAY)
        .await
        .unwrap();
    assert_eq!(report.expired_documents, 0);
    assert!(report.revoked.is_empty());
}

#[tokio::test]
async fn test_skips_grants_owned_by_another_wallet() {
    let env = TestEnv::new();
    let alice = env.user();
    let bob = env.user();
    let janitor = env.user();

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

    // a grant the janitor owns on the same document
    let own_grant = Address::new([9; 32]);
    env.ledger.insert(
        own_grant,
        ProgramAccount::Access(AccessAccount {
            doc: registered.document,
            owner: janitor.address(),
            grantee: bob.address(),
            granted_at: NOW,
            revoked: false,
        }),
    );

    let report = revoke_expired(&janitor.ctx.program, NOW + 2 * DAY)
        .await
        .unwrap();
    assert_eq!(report.revoked, vec![own_grant]);
    assert_eq!(report.skipped, vec![registered.grants[0]]);

    let alices = env
        .ledger
        .account(&registered.grants[0])
        .unwrap()
        .into_access()
        .unwrap();
    assert!(!alices.revoked);
}

#[tokio::test]
async fn test_first_failure_aborts_run() {
    let env = TestEnv::new();
    let alice = env.user();
    let bob = env.user();

    let mut grants = Vec::new();
    for _ in 0..2 {
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
        grants.push(registered.grants[0]);
    }

    // the second revocation is rejected
    env.ledger.fail_on_submit(1);
    assert!(revoke_expired(&alice.ctx.program, NOW + 2 * DAY)
        .await
        .is_err());

    let revoked = grants
        .iter()
        .filter(|grant| {
            env.ledger
                .account(grant)
                .unwrap()
                .into_access()
                .unwrap()
                .revoked
        })
        .count();
    assert_eq!(revoked, 1);
}
