use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    clock::UnixTimestamp,
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack, Sealed},
    pubkey::Pubkey,
};
use std::convert::TryFrom;

use crate::error::RaffleError;
use crate::instruction::InitializeArgs;

/// Confirmations the oracle waits before answering a request
pub const REQUEST_CONFIRMATIONS: u16 = 3;
/// Random words delivered per request
pub const NUM_WORDS: u32 = 1;
/// Upper bound on `max_players`, keeps the raffle account under the CPI allocation limit
pub const MAX_PLAYERS: u32 = 300;

/// Phase of the current round
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RaffleState {
    /// Accepting entries
    Open,
    /// Randomness requested, waiting for the oracle
    Calculating,
}

impl TryFrom<u8> for RaffleState {
    type Error = &'static str;

    fn try_from(val: u8) -> Result<Self, Self::Error> {
        match val {
            0 => Ok(RaffleState::Open),
            1 => Ok(RaffleState::Calculating),
            _ => Err("Invalid raffle state"),
        }
    }
}

impl From<RaffleState> for u8 {
    fn from(state: RaffleState) -> Self {
        match state {
            RaffleState::Open => 0,
            RaffleState::Calculating => 1,
        }
    }
}

/// Raffle configuration account, immutable once initialized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaffleConfig {
    /// Is the account initialized
    pub is_initialized: bool,
    /// Account that initialized the raffle
    pub admin: Pubkey,
    /// The only signer allowed to deliver randomness
    pub oracle: Pubkey,
    /// Minimum payment per entry in lamports
    pub entrance_fee: u64,
    /// Minimum seconds between round starts
    pub interval: UnixTimestamp,
    /// Ledger capacity per round
    pub max_players: u32,
    /// Oracle key hash (gas lane) the requests are made against
    pub key_hash: [u8; 32],
    /// Oracle subscription billed for requests
    pub subscription_id: u64,
    /// Compute budget the oracle should attach to the callback
    pub callback_gas_limit: u32,
    /// Bump of the raffle PDA
    pub raffle_bump: u8,
}

impl RaffleConfig {
    pub fn new(
        admin: Pubkey,
        oracle: Pubkey,
        args: &InitializeArgs,
        raffle_bump: u8,
    ) -> Result<Self, RaffleError> {
        if args.entrance_fee == 0
            || args.interval <= 0
            || args.max_players == 0
            || args.max_players > MAX_PLAYERS
        {
            return Err(RaffleError::InvalidConfig);
        }
        Ok(Self {
            is_initialized: true,
            admin,
            oracle,
            entrance_fee: args.entrance_fee,
            interval: args.interval,
            max_players: args.max_players,
            key_hash: args.key_hash,
            subscription_id: args.subscription_id,
            callback_gas_limit: args.callback_gas_limit,
            raffle_bump,
        })
    }

    pub fn entrance_fee(&self) -> u64 {
        self.entrance_fee
    }

    pub fn interval(&self) -> UnixTimestamp {
        self.interval
    }

    pub fn request_confirmations(&self) -> u16 {
        REQUEST_CONFIRMATIONS
    }

    pub fn num_words(&self) -> u32 {
        NUM_WORDS
    }
}

impl Sealed for RaffleConfig {}

impl IsInitialized for RaffleConfig {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Pack for RaffleConfig {
    const LEN: usize = 1 + 32 + 32 + 8 + 8 + 4 + 32 + 8 + 4 + 1;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, RaffleConfig::LEN];
        let (
            is_initialized,
            admin,
            oracle,
            entrance_fee,
            interval,
            max_players,
            key_hash,
            subscription_id,
            callback_gas_limit,
            raffle_bump,
        ) = array_refs![src, 1, 32, 32, 8, 8, 4, 32, 8, 4, 1];

        let is_initialized = match is_initialized {
            [0] => false,
            [1] => true,
            _ => return Err(ProgramError::InvalidAccountData),
        };

        Ok(RaffleConfig {
            is_initialized,
            admin: Pubkey::new_from_array(*admin),
            oracle: Pubkey::new_from_array(*oracle),
            entrance_fee: u64::from_le_bytes(*entrance_fee),
            interval: UnixTimestamp::from_le_bytes(*interval),
            max_players: u32::from_le_bytes(*max_players),
            key_hash: *key_hash,
            subscription_id: u64::from_le_bytes(*subscription_id),
            callback_gas_limit: u32::from_le_bytes(*callback_gas_limit),
            raffle_bump: raffle_bump[0],
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, RaffleConfig::LEN];
        let (
            is_initialized_dst,
            admin_dst,
            oracle_dst,
            entrance_fee_dst,
            interval_dst,
            max_players_dst,
            key_hash_dst,
            subscription_id_dst,
            callback_gas_limit_dst,
            raffle_bump_dst,
        ) = mut_array_refs![dst, 1, 32, 32, 8, 8, 4, 32, 8, 4, 1];

        is_initialized_dst[0] = self.is_initialized as u8;
        admin_dst.copy_from_slice(self.admin.as_ref());
        oracle_dst.copy_from_slice(self.oracle.as_ref());
        *entrance_fee_dst = self.entrance_fee.to_le_bytes();
        *interval_dst = self.interval.to_le_bytes();
        *max_players_dst = self.max_players.to_le_bytes();
        key_hash_dst.copy_from_slice(&self.key_hash);
        *subscription_id_dst = self.subscription_id.to_le_bytes();
        *callback_gas_limit_dst = self.callback_gas_limit.to_le_bytes();
        raffle_bump_dst[0] = self.raffle_bump;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> InitializeArgs {
        InitializeArgs {
            entrance_fee: 10,
            interval: 30,
            max_players: 8,
            key_hash: [7u8; 32],
            subscription_id: 7458,
            callback_gas_limit: 500_000,
        }
    }

    #[test]
    fn config_survives_packing() {
        let config =
            RaffleConfig::new(Pubkey::new_unique(), Pubkey::new_unique(), &args(), 254).unwrap();
        let mut buf = [0u8; RaffleConfig::LEN];
        RaffleConfig::pack(config, &mut buf).unwrap();
        let unpacked = RaffleConfig::unpack(&buf).unwrap();
        assert_eq!(unpacked, config);
        assert_eq!(unpacked.request_confirmations(), 3);
        assert_eq!(unpacked.num_words(), 1);
    }

    #[test]
    fn zeroed_account_is_not_initialized() {
        let buf = [0u8; RaffleConfig::LEN];
        assert_eq!(
            RaffleConfig::unpack(&buf),
            Err(ProgramError::UninitializedAccount)
        );
    }

    #[test]
    fn rejects_degenerate_configuration() {
        let admin = Pubkey::new_unique();
        let oracle = Pubkey::new_unique();

        let mut bad = args();
        bad.entrance_fee = 0;
        assert_eq!(
            RaffleConfig::new(admin, oracle, &bad, 255),
            Err(RaffleError::InvalidConfig)
        );

        let mut bad = args();
        bad.interval = 0;
        assert_eq!(
            RaffleConfig::new(admin, oracle, &bad, 255),
            Err(RaffleError::InvalidConfig)
        );

        let mut bad = args();
        bad.max_players = MAX_PLAYERS + 1;
        assert_eq!(
            RaffleConfig::new(admin, oracle, &bad, 255),
            Err(RaffleError::InvalidConfig)
        );
    }

    #[test]
    fn state_byte_encoding() {
        assert_eq!(u8::from(RaffleState::Calculating), 1);
        assert_eq!(RaffleState::try_from(0), Ok(RaffleState::Open));
        assert!(RaffleState::try_from(2).is_err());
    }
}
