use solana_program::pubkey::Pubkey;

pub const CONFIG_SEED: &[u8] = b"config";
pub const RAFFLE_SEED: &[u8] = b"raffle";

/// Find the program derived address of the config account
pub fn find_config_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[CONFIG_SEED], program_id)
}

/// Find the program derived address of the raffle account (which also holds the pool)
pub fn find_raffle_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[RAFFLE_SEED], program_id)
}

/// Convert lamports to SOL (for display purposes)
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / 1_000_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addresses_are_distinct_per_seed() {
        let program_id = Pubkey::new_unique();
        let (config, _) = find_config_address(&program_id);
        let (raffle, _) = find_raffle_address(&program_id);
        assert_ne!(config, raffle);
        assert_eq!(find_raffle_address(&program_id).0, raffle);
    }

    #[test]
    fn lamports_display_as_sol() {
        assert_eq!(lamports_to_sol(25_000_000), 0.025);
    }
}
