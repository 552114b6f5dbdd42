use solana_program::{
    clock::UnixTimestamp,
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};
use std::convert::TryInto;
use std::mem::size_of;

use crate::randomness::{RandomValue, RequestId};
use crate::utils::{find_config_address, find_raffle_address};

/// Arguments fixed for the lifetime of the raffle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InitializeArgs {
    /// Minimum lamports per entry
    pub entrance_fee: u64,
    /// Minimum seconds between round starts
    pub interval: UnixTimestamp,
    /// Entries accepted per round
    pub max_players: u32,
    /// Oracle key hash (gas lane)
    pub key_hash: [u8; 32],
    pub subscription_id: u64,
    pub callback_gas_limit: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RaffleInstruction {
    /// Create the config and raffle accounts and open the first round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The admin paying for both accounts
    /// 1. `[writable]` The config account (PDA)
    /// 2. `[writable]` The raffle account (PDA)
    /// 3. `[]` The oracle allowed to fulfill randomness requests
    /// 4. `[]` The system program
    Initialize(InitializeArgs),

    /// Pay into the pool and join the current round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The player
    /// 1. `[]` The config account
    /// 2. `[writable]` The raffle account
    /// 3. `[]` The system program
    EnterRaffle {
        /// Lamports paid, at least the entrance fee
        amount: u64,
    },

    /// Report whether the round is ready to settle. Read-only, the answer is
    /// set as return data `[upkeep_needed, state]`.
    ///
    /// Accounts expected:
    /// 0. `[]` The config account
    /// 1. `[]` The raffle account
    CheckUpkeep,

    /// Close the round and request randomness (anyone may crank this)
    ///
    /// Accounts expected:
    /// 0. `[signer]` The keeper
    /// 1. `[]` The config account
    /// 2. `[writable]` The raffle account
    PerformUpkeep,

    /// Deliver randomness for the outstanding request, pick and pay the winner
    ///
    /// Accounts expected:
    /// 0. `[signer]` The configured oracle
    /// 1. `[]` The config account
    /// 2. `[writable]` The raffle account
    /// 3. `[writable]` The winner, as selected from the public ledger
    FulfillRandomWords {
        request_id: RequestId,
        random_value: RandomValue,
    },
}

impl RaffleInstruction {
    /// Unpacks a byte buffer into a RaffleInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        let (tag, rest) = input
            .split_first()
            .ok_or(ProgramError::InvalidInstructionData)?;

        Ok(match tag {
            0 => {
                let (entrance_fee, rest) = Self::unpack_u64(rest)?;
                let (interval, rest) = Self::unpack_u64(rest)?;
                let (max_players, rest) = Self::unpack_u32(rest)?;
                let (key_hash, rest) = Self::unpack_fixed_bytes::<32>(rest)?;
                let (subscription_id, rest) = Self::unpack_u64(rest)?;
                let (callback_gas_limit, _) = Self::unpack_u32(rest)?;
                Self::Initialize(InitializeArgs {
                    entrance_fee,
                    interval: interval as UnixTimestamp,
                    max_players,
                    key_hash,
                    subscription_id,
                    callback_gas_limit,
                })
            }
            1 => {
                let (amount, _) = Self::unpack_u64(rest)?;
                Self::EnterRaffle { amount }
            }
            2 => Self::CheckUpkeep,
            3 => Self::PerformUpkeep,
            4 => {
                let (request_id, rest) = Self::unpack_u64(rest)?;
                let (random_value, _) = Self::unpack_fixed_bytes::<32>(rest)?;
                Self::FulfillRandomWords {
                    request_id,
                    random_value: RandomValue(random_value),
                }
            }
            _ => return Err(ProgramError::InvalidInstructionData),
        })
    }

    /// Packs a RaffleInstruction into a byte buffer
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(size_of::<Self>());
        match self {
            Self::Initialize(args) => {
                buf.push(0);
                buf.extend_from_slice(&args.entrance_fee.to_le_bytes());
                buf.extend_from_slice(&args.interval.to_le_bytes());
                buf.extend_from_slice(&args.max_players.to_le_bytes());
                buf.extend_from_slice(&args.key_hash);
                buf.extend_from_slice(&args.subscription_id.to_le_bytes());
                buf.extend_from_slice(&args.callback_gas_limit.to_le_bytes());
            }
            Self::EnterRaffle { amount } => {
                buf.push(1);
                buf.extend_from_slice(&amount.to_le_bytes());
            }
            Self::CheckUpkeep => buf.push(2),
            Self::PerformUpkeep => buf.push(3),
            Self::FulfillRandomWords {
                request_id,
                random_value,
            } => {
                buf.push(4);
                buf.extend_from_slice(&request_id.to_le_bytes());
                buf.extend_from_slice(&random_value.0);
            }
        }
        buf
    }

    fn unpack_u64(input: &[u8]) -> Result<(u64, &[u8]), ProgramError> {
        let (bytes, rest) = Self::unpack_fixed_bytes::<8>(input)?;
        Ok((u64::from_le_bytes(bytes), rest))
    }

    fn unpack_u32(input: &[u8]) -> Result<(u32, &[u8]), ProgramError> {
        let (bytes, rest) = Self::unpack_fixed_bytes::<4>(input)?;
        Ok((u32::from_le_bytes(bytes), rest))
    }

    fn unpack_fixed_bytes<const N: usize>(input: &[u8]) -> Result<([u8; N], &[u8]), ProgramError> {
        if input.len() < N {
            return Err(ProgramError::InvalidInstructionData);
        }
        let (bytes, rest) = input.split_at(N);
        let bytes = bytes
            .try_into()
            .map_err(|_| ProgramError::InvalidInstructionData)?;
        Ok((bytes, rest))
    }
}

/// Create initialize instruction
pub fn initialize(
    program_id: &Pubkey,
    admin: &Pubkey,
    oracle: &Pubkey,
    args: InitializeArgs,
) -> Instruction {
    let (config, _) = find_config_address(program_id);
    let (raffle, _) = find_raffle_address(program_id);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*admin, true),
            AccountMeta::new(config, false),
            AccountMeta::new(raffle, false),
            AccountMeta::new_readonly(*oracle, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: RaffleInstruction::Initialize(args).pack(),
    }
}

/// Create enter_raffle instruction
pub fn enter_raffle(program_id: &Pubkey, player: &Pubkey, amount: u64) -> Instruction {
    let (config, _) = find_config_address(program_id);
    let (raffle, _) = find_raffle_address(program_id);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*player, true),
            AccountMeta::new_readonly(config, false),
            AccountMeta::new(raffle, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: RaffleInstruction::EnterRaffle { amount }.pack(),
    }
}

/// Create check_upkeep instruction
pub fn check_upkeep(program_id: &Pubkey) -> Instruction {
    let (config, _) = find_config_address(program_id);
    let (raffle, _) = find_raffle_address(program_id);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(config, false),
            AccountMeta::new_readonly(raffle, false),
        ],
        data: RaffleInstruction::CheckUpkeep.pack(),
    }
}

/// Create perform_upkeep instruction
pub fn perform_upkeep(program_id: &Pubkey, keeper: &Pubkey) -> Instruction {
    let (config, _) = find_config_address(program_id);
    let (raffle, _) = find_raffle_address(program_id);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*keeper, true),
            AccountMeta::new_readonly(config, false),
            AccountMeta::new(raffle, false),
        ],
        data: RaffleInstruction::PerformUpkeep.pack(),
    }
}

/// Create fulfill_random_words instruction
pub fn fulfill_random_words(
    program_id: &Pubkey,
    oracle: &Pubkey,
    winner: &Pubkey,
    request_id: RequestId,
    random_value: RandomValue,
) -> Instruction {
    let (config, _) = find_config_address(program_id);
    let (raffle, _) = find_raffle_address(program_id);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*oracle, true),
            AccountMeta::new_readonly(config, false),
            AccountMeta::new(raffle, false),
            AccountMeta::new(*winner, false),
        ],
        data: RaffleInstruction::FulfillRandomWords {
            request_id,
            random_value,
        }
        .pack(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_layout() {
        let args = InitializeArgs {
            entrance_fee: 10_000_000,
            interval: 30,
            max_players: 100,
            key_hash: [0xab; 32],
            subscription_id: 7458,
            callback_gas_limit: 500_000,
        };
        let data = RaffleInstruction::Initialize(args).pack();

        assert_eq!(data.len(), 1 + 8 + 8 + 4 + 32 + 8 + 4);
        assert_eq!(data[0], 0);
        assert_eq!(
            RaffleInstruction::unpack(&data).unwrap(),
            RaffleInstruction::Initialize(args)
        );
    }

    #[test]
    fn fulfill_layout() {
        let instruction = RaffleInstruction::FulfillRandomWords {
            request_id: 42,
            random_value: RandomValue::from_u64(7),
        };
        let data = instruction.pack();

        assert_eq!(data[0], 4);
        assert_eq!(&data[1..9], &42u64.to_le_bytes());
        assert_eq!(data[40], 7);
        assert_eq!(RaffleInstruction::unpack(&data).unwrap(), instruction);
    }

    #[test]
    fn rejects_truncated_and_unknown_data() {
        assert_eq!(
            RaffleInstruction::unpack(&[]),
            Err(ProgramError::InvalidInstructionData)
        );
        assert_eq!(
            RaffleInstruction::unpack(&[1, 0, 0, 0]),
            Err(ProgramError::InvalidInstructionData)
        );
        assert_eq!(
            RaffleInstruction::unpack(&[9]),
            Err(ProgramError::InvalidInstructionData)
        );
    }
}
