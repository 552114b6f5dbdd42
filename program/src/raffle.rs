use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    clock::UnixTimestamp, entrypoint::ProgramResult, msg, program_error::ProgramError,
    pubkey::Pubkey,
};

use crate::eligibility::UpkeepSnapshot;
use crate::error::RaffleError;
use crate::events::RaffleEvent;
use crate::ledger::EntryLedger;
use crate::randomness::{RandomValue, RandomnessOracle, RequestCoordinator, RequestId};
use crate::state::{RaffleConfig, RaffleState};

/// Destination of the prize. Called exactly once per settled round, after the
/// round has been fully reset.
pub trait PrizeVault {
    fn pay_out(&mut self, winner: &Pubkey, amount: u64) -> Result<(), RaffleError>;
}

/// Raffle account data: the round state machine.
///
/// OPEN --perform_upkeep--> CALCULATING --fulfill_random_words--> OPEN
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct Raffle {
    /// Is the account initialized
    pub is_initialized: bool,
    state: RaffleState,
    /// Start of the current round
    last_timestamp: UnixTimestamp,
    recent_winner: Option<Pubkey>,
    rounds_completed: u64,
    ledger: EntryLedger,
    requests: RequestCoordinator,
}

impl Raffle {
    /// Account size for a raffle holding up to `max_players` entries per round
    pub const fn space(max_players: usize) -> usize {
        1 + 1 + 8 + (1 + 32) + 8 + EntryLedger::space(max_players) + RequestCoordinator::SPACE
    }

    pub fn new(now: UnixTimestamp) -> Self {
        Self {
            is_initialized: true,
            state: RaffleState::Open,
            last_timestamp: now,
            recent_winner: None,
            rounds_completed: 0,
            ledger: EntryLedger::default(),
            requests: RequestCoordinator::default(),
        }
    }

    /// Reads an initialized raffle from account data
    pub fn load(src: &[u8]) -> Result<Self, ProgramError> {
        let raffle =
            Self::deserialize(&mut &src[..]).map_err(|_| ProgramError::InvalidAccountData)?;
        if !raffle.is_initialized {
            return Err(RaffleError::NotInitialized.into());
        }
        Ok(raffle)
    }

    pub fn store(&self, dst: &mut [u8]) -> ProgramResult {
        let mut cursor: &mut [u8] = dst;
        self.serialize(&mut cursor)
            .map_err(|_| ProgramError::AccountDataTooSmall)
    }

    /// Records an entry for `player` paying `amount`. Anything above the
    /// entrance fee stays in the pool.
    pub fn enter(
        &mut self,
        config: &RaffleConfig,
        player: Pubkey,
        amount: u64,
    ) -> Result<RaffleEvent, RaffleError> {
        if self.state != RaffleState::Open {
            return Err(RaffleError::RaffleNotOpen);
        }
        if amount < config.entrance_fee {
            return Err(RaffleError::SendMoreToEnterRaffle);
        }
        self.ledger
            .add_entry(player, amount, config.max_players as usize)?;
        Ok(RaffleEvent::EntryRecorded { player, amount })
    }

    /// Sets the pool to the lamports the raffle account holds for prizes.
    /// Deposits made outside `enter` join the pool this way.
    pub fn sync_held_funds(&mut self, held: u64) {
        self.ledger.sync_pool_balance(held);
    }

    pub fn upkeep_snapshot(&self, now: UnixTimestamp) -> UpkeepSnapshot {
        UpkeepSnapshot {
            state: self.state,
            last_timestamp: self.last_timestamp,
            now,
            pool_balance: self.ledger.pool_balance(),
            player_count: self.ledger.count(),
        }
    }

    /// Read-only eligibility check for the automation keeper
    pub fn check_upkeep(&self, config: &RaffleConfig, now: UnixTimestamp) -> bool {
        self.upkeep_snapshot(now).is_upkeep_needed(config.interval)
    }

    /// Closes the round to entries and requests randomness for it
    pub fn perform_upkeep<O: RandomnessOracle>(
        &mut self,
        config: &RaffleConfig,
        now: UnixTimestamp,
        oracle: &mut O,
    ) -> Result<RaffleEvent, RaffleError> {
        let snapshot = self.upkeep_snapshot(now);
        if !snapshot.is_upkeep_needed(config.interval) {
            return Err(snapshot.not_needed());
        }
        let request_id = self.requests.issue_request(config, oracle)?;
        self.state = RaffleState::Calculating;
        Ok(RaffleEvent::SettlementRequested { request_id })
    }

    /// Picks the winner for the outstanding request, reopens the round and
    /// only then pays the whole pool out through `vault`.
    ///
    /// On `TransferFailed` the round has already been reset.
    pub fn fulfill_random_words<V: PrizeVault>(
        &mut self,
        request_id: RequestId,
        random_value: &RandomValue,
        now: UnixTimestamp,
        vault: &mut V,
    ) -> Result<RaffleEvent, RaffleError> {
        if self.state != RaffleState::Calculating {
            return Err(RaffleError::RaffleNotCalculating);
        }
        if !self.requests.consume(request_id) {
            return Err(RaffleError::UnknownRequest);
        }

        let player_count = self.ledger.count();
        let winner_index = random_value
            .reduce(player_count)
            .ok_or(RaffleError::IndexOutOfRange)?;
        let winner = self.ledger.entry_at(winner_index)?;

        self.recent_winner = Some(winner);
        let prize = self.ledger.clear();
        self.last_timestamp = now;
        self.state = RaffleState::Open;
        self.rounds_completed = self.rounds_completed.saturating_add(1);

        // Nothing may touch raffle state past this point.
        if let Err(err) = vault.pay_out(&winner, prize) {
            msg!("Payout of {} lamports to {} failed: {}", prize, winner, err);
            return Err(RaffleError::TransferFailed);
        }

        Ok(RaffleEvent::WinnerPicked {
            winner,
            prize,
            round: self.rounds_completed,
        })
    }

    pub fn state(&self) -> RaffleState {
        self.state
    }

    pub fn last_timestamp(&self) -> UnixTimestamp {
        self.last_timestamp
    }

    /// Winner of the last settled round, `None` before the first payout
    pub fn recent_winner(&self) -> Option<Pubkey> {
        self.recent_winner
    }

    pub fn player(&self, index: u64) -> Result<Pubkey, RaffleError> {
        self.ledger.entry_at(index)
    }

    pub fn number_of_players(&self) -> u64 {
        self.ledger.count()
    }

    pub fn pool_balance(&self) -> u64 {
        self.ledger.pool_balance()
    }

    pub fn outstanding_request(&self) -> Option<RequestId> {
        self.requests.outstanding()
    }

    pub fn rounds_completed(&self) -> u64 {
        self.rounds_completed
    }

    pub fn ledger(&self) -> &EntryLedger {
        &self.ledger
    }
}
