//! Pure classification of decoded token accounts
//!
//! Output order always follows input order.

use solana_sdk::pubkey::Pubkey;
use std::collections::HashSet;

use super::parsed::DecodedTokenAccount;
use super::types::{AccountRef, DelegatedApproval, SpamItem, SpamKind};

/// Zero-balance accounts, excluding the wrapped native mint
pub fn zombies(accounts: &[DecodedTokenAccount], wrapped_native_mint: &Pubkey) -> Vec<AccountRef> {
    accounts
        .iter()
        .filter(|a| a.info.mint != *wrapped_native_mint)
        .filter(|a| a.info.token_amount.amount == 0)
        .map(|a| AccountRef::new(a.pubkey, a.info.mint))
        .collect()
}

/// Non-empty accounts, each emitted exactly once.
///
/// Every non-empty account is a token item. Zero-decimal accounts holding
/// exactly one unit are NFT candidates, added only when the token pass has
/// not already emitted that address.
pub fn spam(accounts: &[DecodedTokenAccount]) -> Vec<SpamItem> {
    let mut seen = HashSet::with_capacity(accounts.len());
    let mut items = Vec::new();

    for account in accounts {
        let amount = account.info.token_amount;
        if amount.amount == 0 || !seen.insert(account.pubkey) {
            continue;
        }
        items.push(SpamItem {
            account: AccountRef::new(account.pubkey, account.info.mint),
            kind: SpamKind::Token,
            raw_amount: amount.amount,
            balance: Some(amount.ui_amount()),
        });
    }

    for account in accounts {
        let amount = account.info.token_amount;
        if amount.decimals != 0 || amount.amount != 1 || !seen.insert(account.pubkey) {
            continue;
        }
        items.push(SpamItem {
            account: AccountRef::new(account.pubkey, account.info.mint),
            kind: SpamKind::Nft,
            raw_amount: amount.amount,
            balance: None,
        });
    }

    items
}

/// Accounts whose delegate is someone other than the owner
pub fn approvals(accounts: &[DecodedTokenAccount], owner: &Pubkey) -> Vec<DelegatedApproval> {
    accounts
        .iter()
        .filter_map(|a| {
            let delegate = a.info.delegate?;
            if delegate == *owner {
                return None;
            }
            Some(DelegatedApproval {
                account: AccountRef::new(a.pubkey, a.info.mint),
                delegate,
                delegated_amount: a.info.delegated_amount.map(|d| d.amount),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::constants::WRAPPED_SOL_MINT;
    use crate::chain::testing::FixtureAccount;
    use crate::chain::RawTokenAccount;
    use crate::scanner::parsed::decode;

    fn decoded(fixtures: &[FixtureAccount]) -> Vec<DecodedTokenAccount> {
        fixtures
            .iter()
            .map(|f| {
                let raw = RawTokenAccount {
                    pubkey: f.pubkey,
                    space: f.space,
                    parsed: Some(f.parsed()),
                };
                decode(&raw).unwrap().unwrap()
            })
            .collect()
    }

    #[test]
    fn test_zombies_exclude_wrapped_sol_and_funded() {
        let owner = Pubkey::new_unique();
        let fixtures = vec![
            FixtureAccount::empty(owner),
            FixtureAccount::new(owner, *WRAPPED_SOL_MINT, 0, 9),
            FixtureAccount::new(owner, Pubkey::new_unique(), 7, 6),
            FixtureAccount::empty(owner),
        ];

        let found = zombies(&decoded(&fixtures), &WRAPPED_SOL_MINT);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].address, fixtures[0].pubkey);
        assert_eq!(found[1].address, fixtures[3].pubkey);
        assert!(found.iter().all(|z| z.mint != *WRAPPED_SOL_MINT));
    }

    #[test]
    fn test_spam_token_pass_wins_over_nft() {
        let owner = Pubkey::new_unique();
        let fixtures = vec![
            FixtureAccount::new(owner, Pubkey::new_unique(), 1, 0),
            FixtureAccount::new(owner, Pubkey::new_unique(), 2_500_000, 6),
            FixtureAccount::empty(owner),
            FixtureAccount::new(owner, Pubkey::new_unique(), 1, 6),
        ];
        let mut accounts = decoded(&fixtures);
        // Same record twice in one response
        accounts.push(accounts[0].clone());

        let items = spam(&accounts);
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|i| i.kind == SpamKind::Token));

        // zero decimals, amount one: already a token item, never re-added as nft
        assert_eq!(items[0].account.address, fixtures[0].pubkey);
        assert_eq!(items[0].balance, Some(1.0));
        assert_eq!(items[1].balance, Some(2.5));
        assert_eq!(items[2].account.address, fixtures[3].pubkey);

        let nft_address = fixtures[0].pubkey;
        assert_eq!(
            items.iter().filter(|i| i.account.address == nft_address).count(),
            1
        );
        assert!(items.iter().all(|i| i.raw_amount > 0));
    }

    #[test]
    fn test_approvals_skip_self_delegation() {
        let owner = Pubkey::new_unique();
        let stranger = Pubkey::new_unique();
        let fixtures = vec![
            FixtureAccount::empty(owner).with_delegate(stranger, 1_000),
            FixtureAccount::empty(owner).with_delegate(owner, 5),
            FixtureAccount::empty(owner),
        ];

        let found = approvals(&decoded(&fixtures), &owner);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].account.address, fixtures[0].pubkey);
        assert_eq!(found[0].delegate, stranger);
        assert_eq!(found[0].delegated_amount, Some(1_000));
    }
}
