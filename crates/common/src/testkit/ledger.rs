use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::crypto::SecretKey;
use crate::ledger::{
    AccessAccount, AccessFilter, AccessLogAccount, Address, BatchShareAccount, DocumentAccount,
    Instruction, Keyed, Ledger, LedgerError, ProgramAccount, TxSignature,
};
use crate::wallet::Wallet;

struct State {
    now: i64,
    accounts: BTreeMap<Address, ProgramAccount>,
    submitted: Vec<&'static str>,
    attempts: usize,
    fail_on_submit: Option<usize>,
}

/// The sharing program, simulated in memory
///
/// Applies instructions with the program's rules: accounts are created once,
/// only a document's owner can grant access to it, and only a grant's owner
/// can revoke it. Time is a settable clock.
pub struct MemoryLedger {
    state: Mutex<State>,
}

impl MemoryLedger {
    pub fn new(now: i64) -> Self {
        Self {
            state: Mutex::new(State {
                now,
                accounts: BTreeMap::new(),
                submitted: Vec::new(),
                attempts: 0,
                fail_on_submit: None,
            }),
        }
    }

    pub fn now(&self) -> i64 {
        self.state.lock().now
    }

    pub fn set_now(&self, now: i64) {
        self.state.lock().now = now;
    }

    pub fn advance(&self, seconds: i64) {
        self.state.lock().now += seconds;
    }

    /// Make the `n`th submit from now on fail (0-based)
    pub fn fail_on_submit(&self, n: usize) {
        let mut state = self.state.lock();
        state.fail_on_submit = Some(state.attempts + n);
    }

    /// Place an account directly, bypassing the program rules
    pub fn insert(&self, address: Address, account: ProgramAccount) {
        self.state.lock().accounts.insert(address, account);
    }

    pub fn account(&self, address: &Address) -> Option<ProgramAccount> {
        self.state.lock().accounts.get(address).cloned()
    }

    /// Every access log account, by address
    pub fn access_logs(&self) -> Vec<Keyed<AccessLogAccount>> {
        let state = self.state.lock();
        state
            .accounts
            .iter()
            .filter_map(|(address, account)| match account {
                ProgramAccount::AccessLog(log) => Some(Keyed {
                    address: *address,
                    account: log.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    /// Names of every instruction accepted so far, in order
    pub fn submitted(&self) -> Vec<&'static str> {
        self.state.lock().submitted.clone()
    }
}

fn rejected(reason: impl Into<String>) -> LedgerError {
    LedgerError::Rejected(reason.into())
}

impl State {
    fn create(&mut self, address: Address, account: ProgramAccount) -> Result<(), LedgerError> {
        if self.accounts.contains_key(&address) {
            return Err(rejected(format!("account {} already in use", address)));
        }
        self.accounts.insert(address, account);
        Ok(())
    }

    fn document(&self, address: &Address) -> Result<&DocumentAccount, LedgerError> {
        match self.accounts.get(address) {
            Some(ProgramAccount::Document(doc)) => Ok(doc),
            Some(other) => Err(rejected(format!(
                "{} is a {} account, not a document",
                address,
                other.kind()
            ))),
            None => Err(LedgerError::AccountNotFound(*address)),
        }
    }

    fn apply(&mut self, payer: Address, instruction: Instruction) -> Result<(), LedgerError> {
        let now = self.now;
        match instruction {
            Instruction::RegisterDocument {
                document,
                ipfs_hash,
                expires_at,
            } => self.create(
                document,
                ProgramAccount::Document(DocumentAccount {
                    owner: payer,
                    ipfs_hash,
                    expires_at,
                    created_at: now,
                }),
            ),
            Instruction::GrantAccess {
                access,
                document,
                grantee,
            } => {
                if self.document(&document)?.owner != payer {
                    return Err(rejected("only the document owner can grant access"));
                }
                self.create(
                    access,
                    ProgramAccount::Access(AccessAccount {
                        doc: document,
                        owner: payer,
                        grantee,
                        granted_at: now,
                        revoked: false,
                    }),
                )
            }
            Instruction::RevokeAccess { access } => match self.accounts.get_mut(&access) {
                Some(ProgramAccount::Access(grant)) => {
                    if grant.owner != payer {
                        return Err(rejected("only the grant owner can revoke access"));
                    }
                    grant.revoked = true;
                    Ok(())
                }
                Some(_) => Err(rejected(format!("{} is not an access account", access))),
                None => Err(LedgerError::AccountNotFound(access)),
            },
            Instruction::LogAccess {
                access_log,
                document,
            } => {
                self.document(&document)?;
                self.create(
                    access_log,
                    ProgramAccount::AccessLog(AccessLogAccount {
                        doc: document,
                        user: payer,
                        timestamp: now,
                    }),
                )
            }
            Instruction::CreateBatchShare {
                batch_share,
                manifest_cid,
                recipient,
                file_count,
                expiry,
            } => self.create(
                batch_share,
                ProgramAccount::BatchShare(BatchShareAccount {
                    owner: payer,
                    recipient,
                    manifest_cid,
                    file_count,
                    expiry,
                }),
            ),
        }
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn fetch_account(
        &self,
        address: &Address,
    ) -> Result<Option<ProgramAccount>, LedgerError> {
        Ok(self.account(address))
    }

    async fn documents(&self) -> Result<Vec<Keyed<DocumentAccount>>, LedgerError> {
        let state = self.state.lock();
        Ok(state
            .accounts
            .iter()
            .filter_map(|(address, account)| match account {
                ProgramAccount::Document(doc) => Some(Keyed {
                    address: *address,
                    account: doc.clone(),
                }),
                _ => None,
            })
            .collect())
    }

    async fn access_records(
        &self,
        filter: AccessFilter,
    ) -> Result<Vec<Keyed<AccessAccount>>, LedgerError> {
        let state = self.state.lock();
        Ok(state
            .accounts
            .iter()
            .filter_map(|(address, account)| match account {
                ProgramAccount::Access(access) if filter.matches(access) => Some(Keyed {
                    address: *address,
                    account: access.clone(),
                }),
                _ => None,
            })
            .collect())
    }

    async fn submit(
        &self,
        payer: &dyn Wallet,
        instruction: Instruction,
        signers: &[SecretKey],
    ) -> Result<TxSignature, LedgerError> {
        let payer_address = Address::from(payer.public_key());
        if let Some(created) = instruction.created_account() {
            if !signers.iter().any(|key| Address::from(key) == created) {
                return Err(LedgerError::MissingSigner(created));
            }
        }

        let data = instruction.data()?;
        let signature = payer.sign_message(&data);
        payer
            .public_key()
            .verify(&data, &signature)
            .map_err(|e| rejected(format!("bad payer signature: {}", e)))?;

        let name = instruction.name();
        let mut state = self.state.lock();
        let attempt = state.attempts;
        state.attempts += 1;
        if state.fail_on_submit == Some(attempt) {
            return Err(LedgerError::Rpc(format!("injected failure on {}", name)));
        }
        state.apply(payer_address, instruction)?;
        state.submitted.push(name);

        Ok(bs58::encode(signature.to_bytes()).into_string())
    }
}
