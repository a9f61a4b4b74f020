//! Classified account types

use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use std::fmt;

/// A token account and the mint it holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct AccountRef {
    #[serde(serialize_with = "as_string")]
    pub address: Pubkey,
    #[serde(serialize_with = "as_string")]
    pub mint: Pubkey,
}

impl AccountRef {
    pub fn new(address: Pubkey, mint: Pubkey) -> Self {
        Self { address, mint }
    }
}

impl fmt::Display for AccountRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (mint {})", self.address, self.mint)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpamKind {
    Token,
    Nft,
}

impl fmt::Display for SpamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpamKind::Token => write!(f, "token"),
            SpamKind::Nft => write!(f, "nft"),
        }
    }
}

/// A non-empty account offered for burning
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpamItem {
    #[serde(flatten)]
    pub account: AccountRef,
    pub kind: SpamKind,
    /// Raw on-chain amount
    pub raw_amount: u64,
    /// Decimal-adjusted balance, recorded for token items only
    pub balance: Option<f64>,
}

impl SpamItem {
    /// Token items with less than one whole unit
    pub fn is_dust(&self) -> bool {
        self.kind == SpamKind::Token && self.balance.is_some_and(|b| b < 1.0)
    }
}

/// Keep only the dust-sized token items, preserving order
pub fn select_dust(items: &[SpamItem]) -> Vec<SpamItem> {
    items.iter().filter(|i| i.is_dust()).cloned().collect()
}

/// A token account with a third-party delegate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DelegatedApproval {
    #[serde(flatten)]
    pub account: AccountRef,
    #[serde(serialize_with = "as_string")]
    pub delegate: Pubkey,
    /// Raw delegated amount, when the node reported one
    pub delegated_amount: Option<u64>,
}

fn as_string<S>(pubkey: &Pubkey, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_str(pubkey)
}
