use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::error::RaffleError;

/// Players of the current round in join order, plus the pooled lamports.
///
/// The pool tracks the funds actually held for the round; the processor
/// resyncs it from the raffle account before every operation.
///
/// The same player may appear more than once; each appearance is one entry.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct EntryLedger {
    players: Vec<Pubkey>,
    pool_balance: u64,
}

impl EntryLedger {
    /// Serialized size of a ledger holding `capacity` players
    pub const fn space(capacity: usize) -> usize {
        4 + 32 * capacity + 8
    }

    /// Appends `player` and adds `contribution` to the pool.
    /// Nothing is mutated when an error is returned.
    pub(crate) fn add_entry(
        &mut self,
        player: Pubkey,
        contribution: u64,
        capacity: usize,
    ) -> Result<(), RaffleError> {
        if self.players.len() >= capacity {
            return Err(RaffleError::RaffleFull);
        }
        let pool_balance = self
            .pool_balance
            .checked_add(contribution)
            .ok_or(RaffleError::AmountOverflow)?;
        self.players.push(player);
        self.pool_balance = pool_balance;
        Ok(())
    }

    /// Replaces the tracked pool with the lamports actually held
    pub(crate) fn sync_pool_balance(&mut self, held: u64) {
        self.pool_balance = held;
    }

    /// Empties the round and returns the drained pool
    pub(crate) fn clear(&mut self) -> u64 {
        self.players.clear();
        std::mem::take(&mut self.pool_balance)
    }

    pub fn entry_at(&self, index: u64) -> Result<Pubkey, RaffleError> {
        usize::try_from(index)
            .ok()
            .and_then(|index| self.players.get(index))
            .copied()
            .ok_or(RaffleError::IndexOutOfRange)
    }

    pub fn count(&self) -> u64 {
        self.players.len() as u64
    }

    pub fn pool_balance(&self) -> u64 {
        self.pool_balance
    }

    pub fn players(&self) -> &[Pubkey] {
        &self.players
    }
}
