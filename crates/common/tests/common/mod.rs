//! Shared test utilities for flow integration tests
#![allow(dead_code)]

use std::sync::Arc;

use common::file::PlainFile;
use common::ledger::{Address, ProgramClient};
use common::share::{ShareContext, Status};
use common::testkit::{MemoryLedger, MemoryStore};
use common::wallet::{LocalWallet, Wallet};

pub const NOW: i64 = 1_700_000_000;
pub const DAY: i64 = 86_400;

/// A shared ledger and store that several wallets talk to
pub struct TestEnv {
    pub ledger: Arc<MemoryLedger>,
    pub store: Arc<MemoryStore>,
}

/// One wallet connected to the environment
pub struct TestUser {
    pub wallet: Arc<LocalWallet>,
    pub ctx: ShareContext,
}

impl TestUser {
    pub fn address(&self) -> Address {
        self.wallet.public_key().into()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        init_tracing();
        Self {
            ledger: Arc::new(MemoryLedger::new(NOW)),
            store: Arc::new(MemoryStore::new()),
        }
    }

    pub fn user(&self) -> TestUser {
        let wallet = Arc::new(LocalWallet::generate());
        let program = ProgramClient::new(self.ledger.clone(), wallet.clone());
        TestUser {
            wallet,
            ctx: ShareContext::new(program, self.store.clone()),
        }
    }
}

/// Route flow logs to the test harness; RUST_LOG picks the level
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn sample_files() -> Vec<PlainFile> {
    vec![
        PlainFile::new("notes.txt", "text/plain", b"meet at noon".to_vec()),
        PlainFile::new("photo.png", "image/png", vec![0x89, 0x50, 0x4e, 0x47, 0, 1, 2]),
    ]
}

/// Status sink for tests that do not look at progress
pub fn quiet(_: Status) {}
