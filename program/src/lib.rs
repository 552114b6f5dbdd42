// Autonomous raffle on Solana
// Players pay into a pool, a keeper closes each round and an oracle picks the winner

pub mod config;
pub mod eligibility;
pub mod error;
pub mod events;
pub mod instruction;
pub mod ledger;
pub mod processor;
pub mod raffle;
pub mod randomness;
pub mod state;
pub mod utils;

#[cfg(not(feature = "no-entrypoint"))]
mod raffle_entrypoint;

use solana_program::{account_info::AccountInfo, entrypoint::ProgramResult, pubkey::Pubkey};

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    processor::Processor::process(program_id, accounts, instruction_data)
}
