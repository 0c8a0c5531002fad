// 💳 Account checks
// The `account` table belongs to an external collaborator; the ledger only
// reads it, and only when the configured policy asks for it.

use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use crate::config::AccountPolicy;
use crate::error::{LedgerError, Result};

/// Owning user of an account, `None` if the account does not exist.
pub fn owner_of(conn: &Connection, account_id: i64) -> Result<Option<i64>> {
    let owner = conn
        .query_row(
            "SELECT user_id FROM account WHERE Id_account = ?1",
            [account_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(owner)
}

/// An account touched by an operation.
#[derive(Debug, Clone, Copy)]
pub struct AccountUse {
    pub account_id: i64,
    /// Money leaves this account (debit side).
    pub debited: bool,
}

impl AccountUse {
    pub fn debit(account_id: i64) -> Self {
        Self { account_id, debited: true }
    }

    pub fn credit(account_id: i64) -> Self {
        Self { account_id, debited: false }
    }
}

/// Applies `policy` to every account an operation is about to write.
///
/// Runs on the write scope so the checks and the inserts see the same state.
pub fn enforce(
    conn: &Connection,
    policy: AccountPolicy,
    actor_user_id: i64,
    uses: &[AccountUse],
) -> Result<()> {
    if policy == AccountPolicy::Unchecked {
        return Ok(());
    }

    for account in uses {
        let owner = owner_of(conn, account.account_id)?
            .ok_or(LedgerError::AccountNotFound(account.account_id))?;

        if policy == AccountPolicy::RequireOwnership && account.debited && owner != actor_user_id {
            return Err(LedgerError::AccountNotOwned {
                account_id: account.account_id,
                user_id: actor_user_id,
            });
        }
    }

    debug!(?policy, accounts = uses.len(), "account checks passed");
    Ok(())
}
