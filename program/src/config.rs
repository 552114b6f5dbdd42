// Per-cluster deployment presets for the raffle
use solana_program::clock::UnixTimestamp;

use crate::instruction::InitializeArgs;
use crate::state::MAX_PLAYERS;

/// Clusters where the oracle is simulated locally
pub const DEVELOPMENT_CLUSTERS: [&str; 2] = ["localnet", "test"];

/// Default entrance fee: 0.01 SOL
pub const DEFAULT_ENTRANCE_FEE: u64 = 10_000_000;
/// Default round interval in seconds
pub const DEFAULT_INTERVAL: UnixTimestamp = 30;
pub const DEFAULT_CALLBACK_GAS_LIMIT: u32 = 500_000;

const DEFAULT_KEY_HASH: [u8; 32] = [
    0x79, 0xd3, 0xd8, 0x83, 0x2d, 0x90, 0x45, 0x92, 0xc0, 0xbf, 0x98, 0x18, 0xb6, 0x21, 0x52, 0x2c,
    0x98, 0x8b, 0xb8, 0xb0, 0xc0, 0x5c, 0xdc, 0x3b, 0x15, 0xae, 0xa1, 0xb6, 0xe8, 0xdb, 0x0c, 0x15,
];

/// Raffle parameters known for a cluster. Clusters without an oracle
/// subscription only carry the interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NetworkConfig {
    pub name: &'static str,
    pub interval: UnixTimestamp,
    pub entrance_fee: Option<u64>,
    pub key_hash: Option<[u8; 32]>,
    pub subscription_id: Option<u64>,
    pub callback_gas_limit: Option<u32>,
}

impl NetworkConfig {
    /// Initialization arguments for this cluster, if it is fully configured
    pub fn raffle_args(&self) -> Option<InitializeArgs> {
        Some(InitializeArgs {
            entrance_fee: self.entrance_fee?,
            interval: self.interval,
            max_players: MAX_PLAYERS,
            key_hash: self.key_hash?,
            subscription_id: self.subscription_id?,
            callback_gas_limit: self.callback_gas_limit?,
        })
    }
}

pub fn network_config(cluster: &str) -> Option<NetworkConfig> {
    let configured = |name: &'static str| NetworkConfig {
        name,
        interval: DEFAULT_INTERVAL,
        entrance_fee: Some(DEFAULT_ENTRANCE_FEE),
        key_hash: Some(DEFAULT_KEY_HASH),
        subscription_id: Some(7458),
        callback_gas_limit: Some(DEFAULT_CALLBACK_GAS_LIMIT),
    };

    match cluster {
        "localnet" | "test" => Some(configured("localnet")),
        "devnet" => Some(configured("devnet")),
        "mainnet" | "mainnet-beta" => Some(NetworkConfig {
            name: "mainnet",
            interval: DEFAULT_INTERVAL,
            entrance_fee: None,
            key_hash: None,
            subscription_id: None,
            callback_gas_limit: None,
        }),
        _ => None,
    }
}

pub fn is_development_cluster(cluster: &str) -> bool {
    DEVELOPMENT_CLUSTERS.contains(&cluster)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn localnet_is_fully_configured() {
        let args = network_config("localnet").unwrap().raffle_args().unwrap();
        assert_eq!(args.entrance_fee, 10_000_000);
        assert_eq!(args.interval, 30);
        assert_eq!(args.subscription_id, 7458);
        assert_eq!(args.callback_gas_limit, 500_000);
        assert!(is_development_cluster("localnet"));
    }

    #[test]
    fn mainnet_only_carries_interval() {
        let mainnet = network_config("mainnet-beta").unwrap();
        assert_eq!(mainnet.interval, 30);
        assert_eq!(mainnet.raffle_args(), None);
        assert!(!is_development_cluster("mainnet"));
    }

    #[test]
    fn unknown_cluster() {
        assert_eq!(network_config("goerli"), None);
    }
}
