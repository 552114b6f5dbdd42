// Randomness request bookkeeping and the oracle seam
use arrayref::array_ref;
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{keccak, log::sol_log_data, msg, pubkey::Pubkey};

use crate::error::RaffleError;
use crate::state::RaffleConfig;

/// Correlates a randomness request with its fulfillment
pub type RequestId = u64;

/// One raw random word as delivered by the oracle, read as a big-endian
/// unsigned 256-bit integer.
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct RandomValue(pub [u8; 32]);

impl RandomValue {
    pub fn from_u64(value: u64) -> Self {
        let mut word = [0u8; 32];
        word[24..].copy_from_slice(&value.to_be_bytes());
        Self(word)
    }

    /// Exact `self mod modulus`; `None` for a zero modulus
    pub fn reduce(&self, modulus: u64) -> Option<u64> {
        if modulus == 0 {
            return None;
        }
        let modulus = modulus as u128;
        let rem = self
            .0
            .iter()
            .fold(0u128, |acc, byte| (acc * 256 + *byte as u128) % modulus);
        Some(rem as u64)
    }
}

/// Parameters sent to the oracle with each request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RandomWordsRequest {
    pub key_hash: [u8; 32],
    pub subscription_id: u64,
    pub request_confirmations: u16,
    pub callback_gas_limit: u32,
    pub num_words: u32,
    /// 1-based count of requests this raffle has made
    pub sequence: u64,
}

/// Source of verifiable randomness. Accepts a request now and answers later
/// through `FulfillRandomWords`.
pub trait RandomnessOracle {
    fn request_random_words(&mut self, request: &RandomWordsRequest)
        -> Result<RequestId, RaffleError>;
}

/// Tracks the single request a round may have in flight
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestCoordinator {
    outstanding: Option<RequestId>,
    issued: u64,
}

impl RequestCoordinator {
    pub const SPACE: usize = (1 + 8) + 8;

    /// Asks `oracle` for one random word and records the returned id as
    /// outstanding. Callers gate on raffle state so that at most one request
    /// is ever in flight.
    pub(crate) fn issue_request<O: RandomnessOracle>(
        &mut self,
        config: &RaffleConfig,
        oracle: &mut O,
    ) -> Result<RequestId, RaffleError> {
        debug_assert!(self.outstanding.is_none());
        let request = RandomWordsRequest {
            key_hash: config.key_hash,
            subscription_id: config.subscription_id,
            request_confirmations: config.request_confirmations(),
            callback_gas_limit: config.callback_gas_limit,
            num_words: config.num_words(),
            sequence: self.issued.wrapping_add(1),
        };
        let request_id = oracle.request_random_words(&request)?;
        self.issued = request.sequence;
        self.outstanding = Some(request_id);
        Ok(request_id)
    }

    /// Clears and returns true iff `request_id` is the outstanding request
    pub(crate) fn consume(&mut self, request_id: RequestId) -> bool {
        if self.outstanding == Some(request_id) {
            self.outstanding = None;
            true
        } else {
            false
        }
    }

    pub fn outstanding(&self) -> Option<RequestId> {
        self.outstanding
    }

    pub fn issued(&self) -> u64 {
        self.issued
    }
}

/// Deterministic, non-zero request id bound to the raffle account and key hash
pub fn derive_request_id(raffle: &Pubkey, key_hash: &[u8; 32], sequence: u64) -> RequestId {
    let hash = keccak::hashv(&[raffle.as_ref(), key_hash, &sequence.to_le_bytes()]).to_bytes();
    u64::from_le_bytes(*array_ref![hash, 0, 8]).max(1)
}

/// Oracle client that publishes requests to the transaction log, where the
/// off-chain oracle node picks them up.
pub struct LogOracle<'a> {
    raffle: &'a Pubkey,
}

impl<'a> LogOracle<'a> {
    pub fn new(raffle: &'a Pubkey) -> Self {
        Self { raffle }
    }
}

impl RandomnessOracle for LogOracle<'_> {
    fn request_random_words(
        &mut self,
        request: &RandomWordsRequest,
    ) -> Result<RequestId, RaffleError> {
        let request_id = derive_request_id(self.raffle, &request.key_hash, request.sequence);
        msg!(
            "Random words requested: id={} sequence={} subscription={} confirmations={} callback_gas_limit={} num_words={}",
            request_id,
            request.sequence,
            request.subscription_id,
            request.request_confirmations,
            request.callback_gas_limit,
            request.num_words
        );
        sol_log_data(&[
            b"random_words_requested",
            self.raffle.as_ref(),
            &request.key_hash,
            &request_id.to_le_bytes(),
        ]);
        Ok(request_id)
    }
}
