use clap::Args;

use common::wallet::Wallet;

/// Print this wallet's base58 address
#[derive(Args, Debug, Clone)]
pub struct WalletAddress;

#[async_trait::async_trait]
impl crate::op::Op for WalletAddress {
    type Error = crate::state::StateError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        Ok(ctx.wallet()?.public_key().to_string())
    }
}
