use solana_program::entrypoint;

use crate::process_instruction;

// Define the standard Solana entrypoint
entrypoint!(process_instruction);
