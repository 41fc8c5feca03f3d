//! Throwaway EVM wallet generation.

use ethers::{
    signers::{LocalWallet, Signer},
    utils::to_checksum,
};

use chainpal_core::{ports::WalletGenerator, session::WalletRecord, Result};

/// Generates a fresh secp256k1 keypair per call.
///
/// The address is EIP-55 checksummed; the private key is `0x`-prefixed hex.
#[derive(Clone, Copy, Debug, Default)]
pub struct EvmWalletGenerator;

impl EvmWalletGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl WalletGenerator for EvmWalletGenerator {
    fn generate(&self) -> Result<WalletRecord> {
        let wallet = LocalWallet::new(&mut rand::thread_rng());
        Ok(WalletRecord {
            address: to_checksum(&wallet.address(), None),
            private_key: format!("0x{}", hex::encode(wallet.signer().to_bytes())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_well_formed_records() {
        let record = EvmWalletGenerator::new().generate().unwrap();

        assert!(record.address.starts_with("0x"));
        assert_eq!(record.address.len(), 42);
        assert!(record.private_key.starts_with("0x"));
        assert_eq!(record.private_key.len(), 66);
        assert!(record.private_key[2..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn private_key_derives_the_address() {
        let record = EvmWalletGenerator::new().generate().unwrap();
        let restored: LocalWallet = record.private_key[2..].parse().unwrap();
        assert_eq!(to_checksum(&restored.address(), None), record.address);
    }

    #[test]
    fn consecutive_wallets_differ() {
        let generator = EvmWalletGenerator::new();
        let a = generator.generate().unwrap();
        let b = generator.generate().unwrap();
        assert_ne!(a.address, b.address);
        assert_ne!(a.private_key, b.private_key);
    }
}
