use solana_program::clock::UnixTimestamp;

use crate::error::RaffleError;
use crate::state::RaffleState;

/// Everything the settlement decision depends on, captured at one instant
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpkeepSnapshot {
    pub state: RaffleState,
    pub last_timestamp: UnixTimestamp,
    pub now: UnixTimestamp,
    pub pool_balance: u64,
    pub player_count: u64,
}

impl UpkeepSnapshot {
    /// True iff the round is open, `interval` seconds have elapsed since it
    /// began, and it holds both players and a balance.
    pub fn is_upkeep_needed(&self, interval: UnixTimestamp) -> bool {
        let is_open = self.state == RaffleState::Open;
        let time_passed = self.now.saturating_sub(self.last_timestamp) >= interval;
        let has_balance = self.pool_balance > 0;
        let has_players = self.player_count > 0;
        is_open && time_passed && has_balance && has_players
    }

    pub fn not_needed(&self) -> RaffleError {
        RaffleError::UpkeepNotNeeded {
            balance: self.pool_balance,
            players: self.player_count,
            state: self.state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: UnixTimestamp = 30;

    fn ready() -> UpkeepSnapshot {
        UpkeepSnapshot {
            state: RaffleState::Open,
            last_timestamp: 1_000,
            now: 1_031,
            pool_balance: 10,
            player_count: 1,
        }
    }

    #[test]
    fn all_conditions_met() {
        assert!(ready().is_upkeep_needed(INTERVAL));
    }

    #[test]
    fn exactly_one_interval_is_enough() {
        let snapshot = UpkeepSnapshot {
            now: 1_030,
            ..ready()
        };
        assert!(snapshot.is_upkeep_needed(INTERVAL));
    }

    #[test]
    fn each_clause_gates_independently() {
        let calculating = UpkeepSnapshot {
            state: RaffleState::Calculating,
            ..ready()
        };
        let too_early = UpkeepSnapshot {
            now: 1_005,
            ..ready()
        };
        let no_balance = UpkeepSnapshot {
            pool_balance: 0,
            ..ready()
        };
        let no_players = UpkeepSnapshot {
            player_count: 0,
            ..ready()
        };

        for snapshot in [calculating, too_early, no_balance, no_players] {
            assert!(!snapshot.is_upkeep_needed(INTERVAL), "{:?}", snapshot);
        }
    }

    #[test]
    fn clock_behind_last_timestamp_is_not_eligible() {
        let snapshot = UpkeepSnapshot {
            now: 900,
            ..ready()
        };
        assert!(!snapshot.is_upkeep_needed(INTERVAL));
    }

    #[test]
    fn not_needed_carries_diagnostics() {
        let snapshot = UpkeepSnapshot {
            player_count: 0,
            pool_balance: 0,
            ..ready()
        };
        assert_eq!(
            snapshot.not_needed(),
            RaffleError::UpkeepNotNeeded {
                balance: 0,
                players: 0,
                state: RaffleState::Open,
            }
        );
    }
}
