//! Solana JSON-RPC adapter for the sharing program
//!
//! Reads go through `getAccountInfo` and `getProgramAccounts`; each
//! instruction is sent in its own legacy transaction against the latest
//! blockhash, and `submit` returns only once the transaction is confirmed,
//! failed on-chain, or its blockhash expired. Nothing is retried.

mod transaction;

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use url::Url;

use common::crypto::SecretKey;
use common::ledger::{
    AccessAccount, AccessFilter, AccountKind, Address, DocumentAccount, Instruction, Keyed,
    Ledger, LedgerError, ProgramAccount, TxSignature,
};
use common::wallet::Wallet;

use super::error::ClientError;

use transaction::{sign_transaction, Message};

const COMMITMENT: &str = "confirmed";
/// Delay between signature status polls
const CONFIRM_POLL_INTERVAL: Duration = Duration::from_millis(500);
/// Upper bound on status polls, in case block height stops advancing
const CONFIRM_MAX_POLLS: usize = 240;

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Deserialize)]
struct RpcAccount {
    /// `[base64 data, "base64"]`
    data: (String, String),
    owner: String,
}

#[derive(Deserialize)]
struct RpcKeyedAccount {
    pubkey: String,
    account: RpcAccount,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcBlockhash {
    blockhash: String,
    last_valid_block_height: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcSignatureStatus {
    err: Option<Value>,
    confirmation_status: Option<String>,
}

/// Where a sent transaction stands
#[derive(Debug, PartialEq, Eq)]
enum Confirmation {
    Pending,
    Confirmed,
    Failed(String),
}

impl Confirmation {
    fn from_status(status: Option<&RpcSignatureStatus>) -> Self {
        let Some(status) = status else {
            return Confirmation::Pending;
        };
        if let Some(err) = &status.err {
            return Confirmation::Failed(err.to_string());
        }
        match status.confirmation_status.as_deref() {
            Some("confirmed") | Some("finalized") => Confirmation::Confirmed,
            _ => Confirmation::Pending,
        }
    }
}

/// A blockhash and the last block height it is valid for
struct RecentBlockhash {
    hash: [u8; 32],
    last_valid_block_height: u64,
}

/// A memcmp filter over raw account data, bytes in base58
fn memcmp(offset: usize, bytes: &[u8]) -> Value {
    json!({ "memcmp": { "offset": offset, "bytes": bs58::encode(bytes).into_string() } })
}

#[derive(Debug)]
pub struct RpcLedger {
    url: Url,
    program_id: Address,
    client: Client,
    next_id: AtomicU64,
}

impl RpcLedger {
    pub fn new(url: Url, program_id: Address) -> Result<Self, ClientError> {
        Ok(Self {
            url,
            program_id,
            client: Client::builder().build()?,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn program_id(&self) -> &Address {
        &self.program_id
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, ClientError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        tracing::debug!(method, id = request.id, "rpc call");

        let response = self.client.post(self.url.clone()).json(&request).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            return Err(ClientError::HttpStatus(status, response.text().await?));
        }

        let body: RpcResponse<T> = response.json().await?;
        match (body.result, body.error) {
            (_, Some(error)) => Err(ClientError::Rpc {
                code: error.code,
                message: error.message,
            }),
            (Some(result), None) => Ok(result),
            (None, None) => Err(ClientError::Decode(format!("{}: empty response", method))),
        }
    }

    fn decode_account(&self, account: &RpcAccount) -> Result<ProgramAccount, LedgerError> {
        if account.owner != self.program_id.to_string() {
            return Err(LedgerError::Rpc(format!(
                "account owned by {}, not the sharing program",
                account.owner
            )));
        }
        let data = base64::engine::general_purpose::STANDARD
            .decode(&account.data.0)
            .map_err(ClientError::from)?;
        Ok(ProgramAccount::decode(&data)?)
    }

    /// Every program account of one kind, optionally narrowed by a memcmp
    async fn program_accounts(
        &self,
        kind: AccountKind,
        extra: Option<(usize, Address)>,
    ) -> Result<Vec<Keyed<ProgramAccount>>, LedgerError> {
        let mut filters = vec![memcmp(0, &kind.discriminator())];
        if let Some((offset, address)) = extra {
            filters.push(memcmp(offset, address.as_bytes()));
        }

        let accounts: Vec<RpcKeyedAccount> = self
            .call(
                "getProgramAccounts",
                json!([
                    self.program_id.to_string(),
                    { "encoding": "base64", "commitment": COMMITMENT, "filters": filters },
                ]),
            )
            .await?;

        accounts
            .iter()
            .map(|keyed| -> Result<Keyed<ProgramAccount>, LedgerError> {
                let address = keyed
                    .pubkey
                    .parse::<Address>()
                    .map_err(|e| LedgerError::Rpc(e.to_string()))?;
                Ok(Keyed {
                    address,
                    account: self.decode_account(&keyed.account)?,
                })
            })
            .collect()
    }

    async fn latest_blockhash(&self) -> Result<RecentBlockhash, ClientError> {
        let response: WithContext<RpcBlockhash> = self
            .call(
                "getLatestBlockhash",
                json!([{ "commitment": COMMITMENT }]),
            )
            .await?;
        let bytes = bs58::decode(&response.value.blockhash)
            .into_vec()
            .map_err(|e| ClientError::Decode(format!("blockhash: {}", e)))?;
        let hash = bytes
            .try_into()
            .map_err(|_| ClientError::Decode("blockhash is not 32 bytes".to_string()))?;
        Ok(RecentBlockhash {
            hash,
            last_valid_block_height: response.value.last_valid_block_height,
        })
    }

    async fn signature_status(&self, signature: &str) -> Result<Confirmation, ClientError> {
        let response: WithContext<Vec<Option<RpcSignatureStatus>>> = self
            .call(
                "getSignatureStatuses",
                json!([[signature], { "searchTransactionHistory": false }]),
            )
            .await?;
        Ok(Confirmation::from_status(
            response.value.first().and_then(Option::as_ref),
        ))
    }

    async fn block_height(&self) -> Result<u64, ClientError> {
        self.call("getBlockHeight", json!([{ "commitment": COMMITMENT }]))
            .await
    }

    /// Poll until `signature` is confirmed, fails on-chain, or can no longer land
    async fn confirm(
        &self,
        signature: &str,
        last_valid_block_height: u64,
    ) -> Result<(), LedgerError> {
        for _ in 0..CONFIRM_MAX_POLLS {
            match self.signature_status(signature).await? {
                Confirmation::Confirmed => return Ok(()),
                Confirmation::Failed(err) => {
                    return Err(LedgerError::Rejected(format!(
                        "transaction {} failed: {}",
                        signature, err
                    )));
                }
                Confirmation::Pending => {}
            }
            if self.block_height().await? > last_valid_block_height {
                return Err(LedgerError::Rpc(format!(
                    "transaction {} expired before confirmation",
                    signature
                )));
            }
            tokio::time::sleep(CONFIRM_POLL_INTERVAL).await;
        }
        Err(LedgerError::Rpc(format!(
            "transaction {} not confirmed after {} polls",
            signature, CONFIRM_MAX_POLLS
        )))
    }
}

#[async_trait]
impl Ledger for RpcLedger {
    async fn fetch_account(
        &self,
        address: &Address,
    ) -> Result<Option<ProgramAccount>, LedgerError> {
        let response: WithContext<Option<RpcAccount>> = self
            .call(
                "getAccountInfo",
                json!([
                    address.to_string(),
                    { "encoding": "base64", "commitment": COMMITMENT },
                ]),
            )
            .await?;
        response
            .value
            .map(|account| self.decode_account(&account))
            .transpose()
    }

    async fn documents(&self) -> Result<Vec<Keyed<DocumentAccount>>, LedgerError> {
        self.program_accounts(AccountKind::Document, None)
            .await?
            .into_iter()
            .map(|keyed| -> Result<Keyed<DocumentAccount>, LedgerError> {
                Ok(Keyed {
                    address: keyed.address,
                    account: keyed.account.into_document()?,
                })
            })
            .collect()
    }

    async fn access_records(
        &self,
        filter: AccessFilter,
    ) -> Result<Vec<Keyed<AccessAccount>>, LedgerError> {
        let mut records = Vec::new();
        for keyed in self
            .program_accounts(AccountKind::Access, Some(filter.memcmp()))
            .await?
        {
            let account = keyed.account.into_access()?;
            // the node already filtered; re-check the decoded record
            if filter.matches(&account) {
                records.push(Keyed {
                    address: keyed.address,
                    account,
                });
            }
        }
        Ok(records)
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

        let blockhash = self.latest_blockhash().await?;
        let message = Message::new(
            payer_address,
            self.program_id,
            &instruction.accounts(payer_address),
            instruction.data()?,
            blockhash.hash,
        )?;
        let (wire, _) = sign_transaction(&message, payer, signers)?;

        let signature: String = self
            .call(
                "sendTransaction",
                json!([
                    base64::engine::general_purpose::STANDARD.encode(&wire),
                    { "encoding": "base64", "preflightCommitment": COMMITMENT },
                ]),
            )
            .await?;
        tracing::debug!(instruction = instruction.name(), %signature, "transaction sent");

        self.confirm(&signature, blockhash.last_valid_block_height).await?;
        tracing::debug!(instruction = instruction.name(), %signature, "transaction confirmed");

        Ok(signature)
    }
}
