use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{log::sol_log_data, msg, pubkey::Pubkey};

use crate::randomness::RequestId;

/// Observable raffle events, one per successful state-machine operation
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum RaffleEvent {
    EntryRecorded { player: Pubkey, amount: u64 },
    SettlementRequested { request_id: RequestId },
    WinnerPicked { winner: Pubkey, prize: u64, round: u64 },
}

impl RaffleEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RaffleEvent::EntryRecorded { .. } => "EntryRecorded",
            RaffleEvent::SettlementRequested { .. } => "SettlementRequested",
            RaffleEvent::WinnerPicked { .. } => "WinnerPicked",
        }
    }

    /// Writes a readable log line and a borsh record indexers can decode
    pub fn emit(&self) {
        match self {
            RaffleEvent::EntryRecorded { player, amount } => {
                msg!("EntryRecorded: player={} amount={}", player, amount)
            }
            RaffleEvent::SettlementRequested { request_id } => {
                msg!("SettlementRequested: request_id={}", request_id)
            }
            RaffleEvent::WinnerPicked {
                winner,
                prize,
                round,
            } => msg!("WinnerPicked: winner={} prize={} round={}", winner, prize, round),
        }
        match self.try_to_vec() {
            Ok(data) => sol_log_data(&[self.name().as_bytes(), &data]),
            Err(err) => msg!("Failed to encode {} event: {}", self.name(), err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_decodes_back() {
        let event = RaffleEvent::WinnerPicked {
            winner: Pubkey::new_unique(),
            prize: 30,
            round: 1,
        };
        let data = event.try_to_vec().unwrap();
        assert_eq!(RaffleEvent::try_from_slice(&data).unwrap(), event);
        assert_eq!(event.name(), "WinnerPicked");
    }
}
