/// In-process stand-ins for the external services
///
/// [`MemoryStore`] plays the content-addressed store and [`MemoryLedger`]
/// plays the sharing program, enforcing the same ownership rules. Together
/// they let every flow run end to end without a network.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use common::ledger::ProgramClient;
/// use common::share::ShareContext;
/// use common::testkit::{MemoryLedger, MemoryStore};
/// use common::wallet::LocalWallet;
///
/// let ledger = Arc::new(MemoryLedger::new(1_700_000_000));
/// let store = Arc::new(MemoryStore::new());
/// let alice = Arc::new(LocalWallet::generate());
///
/// let ctx = ShareContext::new(ProgramClient::new(ledger.clone(), alice), store);
/// ```
mod ledger;
mod store;

pub use ledger::MemoryLedger;
pub use store::MemoryStore;
