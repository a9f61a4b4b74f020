//! Typed decode of jsonParsed token accounts
//!
//! The node returns `{"type": "account", "info": {...}}` for token accounts.
//! Decoding is strict: a record that does not match the token-account shape
//! is an error, never a silently-defaulted value.

use serde::{de, Deserialize, Deserializer};
use serde_json::Value;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

use crate::chain::RawTokenAccount;
use crate::error::{Error, Result};

#[derive(Debug, Deserialize)]
struct ParsedEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    info: Value,
}

/// Raw amount plus the mint's decimals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TokenAmount {
    #[serde(deserialize_with = "u64_from_str")]
    pub amount: u64,
    pub decimals: u8,
}

impl TokenAmount {
    /// Decimal-adjusted amount
    pub fn ui_amount(&self) -> f64 {
        self.amount as f64 / 10f64.powi(self.decimals as i32)
    }
}

/// The fields of a parsed token account this crate relies on
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAccountInfo {
    #[serde(deserialize_with = "pubkey_from_str")]
    pub mint: Pubkey,
    #[serde(deserialize_with = "pubkey_from_str")]
    pub owner: Pubkey,
    pub token_amount: TokenAmount,
    #[serde(default, deserialize_with = "opt_pubkey_from_str")]
    pub delegate: Option<Pubkey>,
    #[serde(default)]
    pub delegated_amount: Option<TokenAmount>,
    #[serde(default)]
    pub is_native: bool,
}

/// A token account that decoded cleanly
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedTokenAccount {
    pub pubkey: Pubkey,
    pub info: TokenAccountInfo,
}

/// Decode one query result.
///
/// `Ok(None)` for records that are valid but not token accounts
/// (mints and multisigs can match the owner memcmp by coincidence).
pub fn decode(raw: &RawTokenAccount) -> Result<Option<DecodedTokenAccount>> {
    let malformed = |reason: String| Error::MalformedAccount {
        account: raw.pubkey.to_string(),
        reason,
    };

    let parsed = raw
        .parsed
        .as_ref()
        .ok_or_else(|| malformed("node returned unparsed data".to_string()))?;

    let envelope = ParsedEnvelope::deserialize(parsed)
        .map_err(|e| malformed(format!("bad envelope: {}", e)))?;

    if envelope.kind != "account" {
        return Ok(None);
    }

    let info = TokenAccountInfo::deserialize(&envelope.info)
        .map_err(|e| malformed(format!("bad account info: {}", e)))?;

    Ok(Some(DecodedTokenAccount {
        pubkey: raw.pubkey,
        info,
    }))
}

fn u64_from_str<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse::<u64>().map_err(de::Error::custom)
}

fn pubkey_from_str<'de, D>(deserializer: D) -> std::result::Result<Pubkey, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Pubkey::from_str(&s).map_err(de::Error::custom)
}

fn opt_pubkey_from_str<'de, D>(deserializer: D) -> std::result::Result<Option<Pubkey>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(s) => Pubkey::from_str(&s).map(Some).map_err(de::Error::custom),
        None => Ok(None),
    }
}
