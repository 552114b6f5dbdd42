use solana_program::program_error::ProgramError;
use thiserror::Error;

use crate::state::RaffleState;

/// Errors that may be returned by the raffle program
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RaffleError {
    /// Entry payment is below the entrance fee
    #[error("Send more to enter the raffle")]
    SendMoreToEnterRaffle,

    /// Entries are only accepted while the raffle is open
    #[error("Raffle is not open")]
    RaffleNotOpen,

    /// Settlement was requested while the round was not eligible
    #[error("Upkeep not needed (balance {balance}, players {players}, state {state:?})")]
    UpkeepNotNeeded {
        balance: u64,
        players: u64,
        state: RaffleState,
    },

    /// Fulfillment arrived while no settlement is in progress
    #[error("Raffle is not calculating a winner")]
    RaffleNotCalculating,

    /// Fulfillment referenced an unknown or already consumed request
    #[error("Nonexistent request")]
    UnknownRequest,

    /// The prize could not be delivered to the winner
    #[error("Transfer failed")]
    TransferFailed,

    /// Ledger index past the current number of players
    #[error("Player index out of range")]
    IndexOutOfRange,

    /// Ledger is at capacity for this round
    #[error("Raffle is full")]
    RaffleFull,

    /// Only the configured randomness oracle may fulfill requests
    #[error("Caller is not the configured oracle")]
    UnauthorizedOracle,

    /// Initialization arguments were rejected
    #[error("Invalid raffle configuration")]
    InvalidConfig,

    #[error("Raffle already initialized")]
    AlreadyInitialized,

    #[error("Raffle not initialized")]
    NotInitialized,

    /// Lamport arithmetic overflowed
    #[error("Amount overflow")]
    AmountOverflow,
}

impl RaffleError {
    /// Stable custom error code reported to clients
    pub fn code(&self) -> u32 {
        match self {
            RaffleError::SendMoreToEnterRaffle => 0,
            RaffleError::RaffleNotOpen => 1,
            RaffleError::UpkeepNotNeeded { .. } => 2,
            RaffleError::RaffleNotCalculating => 3,
            RaffleError::UnknownRequest => 4,
            RaffleError::TransferFailed => 5,
            RaffleError::IndexOutOfRange => 6,
            RaffleError::RaffleFull => 7,
            RaffleError::UnauthorizedOracle => 8,
            RaffleError::InvalidConfig => 9,
            RaffleError::AlreadyInitialized => 10,
            RaffleError::NotInitialized => 11,
            RaffleError::AmountOverflow => 12,
        }
    }
}

impl From<RaffleError> for ProgramError {
    fn from(e: RaffleError) -> Self {
        ProgramError::Custom(e.code())
    }
}
