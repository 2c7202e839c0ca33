//! Interchangeable split/reconstruct strategies
//!
//! [`LocalFieldStrategy`] runs the arithmetic in-process. [`RemoteContractStrategy`]
//! delegates it to a ledger contract behind [`ShareContract`] and checks
//! what comes back against the same field, so the two agree on every
//! error the caller can observe before the contract is reached.

use crate::shamir::{check_secret_len, reconstruct, split_with_rng, Secret, Share};
use crate::{ShamirConfig, ShamirError};
use async_trait::async_trait;
use rand::{rngs::OsRng, CryptoRng, RngCore};
use shardmail_core::field::{FieldElement, FIELD_BYTES};
use std::collections::HashSet;
use std::num::NonZeroU8;
use zeroize::Zeroizing;

/// Split and reconstruct secrets
#[async_trait]
pub trait SharingStrategy: Send + Sync {
    async fn split(
        &mut self,
        secret: &Secret,
        config: &ShamirConfig,
    ) -> Result<Vec<Share>, ShamirError>;

    async fn reconstruct(&self, shares: &[Share], secret_len: usize)
        -> Result<Secret, ShamirError>;
}

/// In-process sharing with an injected random source
pub struct LocalFieldStrategy<R> {
    rng: R,
}

impl LocalFieldStrategy<OsRng> {
    pub fn new() -> Self {
        Self { rng: OsRng }
    }
}

impl Default for LocalFieldStrategy<OsRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RngCore + CryptoRng> LocalFieldStrategy<R> {
    /// Use a specific generator, e.g. a seeded one in tests
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

#[async_trait]
impl<R: RngCore + CryptoRng + Send + Sync> SharingStrategy for LocalFieldStrategy<R> {
    async fn split(
        &mut self,
        secret: &Secret,
        config: &ShamirConfig,
    ) -> Result<Vec<Share>, ShamirError> {
        split_with_rng(secret, config.total_shares, config.threshold, &mut self.rng)
    }

    async fn reconstruct(
        &self,
        shares: &[Share],
        secret_len: usize,
    ) -> Result<Secret, ShamirError> {
        reconstruct(shares, secret_len)
    }
}

/// A share as the contract exchanges it: `y` as a 32-byte big-endian word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractShare {
    pub x: u8,
    pub y: [u8; FIELD_BYTES],
}

/// Ledger contract exposing secret sharing calls
#[async_trait]
pub trait ShareContract: Send + Sync {
    async fn split_secret(
        &self,
        secret: [u8; FIELD_BYTES],
        total: u8,
        threshold: u8,
    ) -> Result<Vec<ContractShare>, String>;

    async fn reconstruct_secret(
        &self,
        shares: &[ContractShare],
    ) -> Result<[u8; FIELD_BYTES], String>;
}

/// Sharing delegated to a [`ShareContract`]
pub struct RemoteContractStrategy<C> {
    contract: C,
}

impl<C: ShareContract> RemoteContractStrategy<C> {
    pub fn new(contract: C) -> Self {
        Self { contract }
    }

    pub fn contract(&self) -> &C {
        &self.contract
    }
}

fn to_word(value: &FieldElement) -> Result<Zeroizing<[u8; FIELD_BYTES]>, ShamirError> {
    let bytes = Zeroizing::new(value.to_bytes_be(FIELD_BYTES)?);
    let mut word = Zeroizing::new([0u8; FIELD_BYTES]);
    word.copy_from_slice(&bytes);
    Ok(word)
}

#[async_trait]
impl<C: ShareContract> SharingStrategy for RemoteContractStrategy<C> {
    async fn split(
        &mut self,
        secret: &Secret,
        config: &ShamirConfig,
    ) -> Result<Vec<Share>, ShamirError> {
        config.validate()?;
        let word = to_word(&secret.to_field()?)?;

        let raw = self
            .contract
            .split_secret(*word, config.total_shares, config.threshold)
            .await
            .map_err(ShamirError::Contract)?;

        if raw.len() != usize::from(config.total_shares) {
            return Err(ShamirError::Contract(format!(
                "Contract returned {} shares, expected {}",
                raw.len(),
                config.total_shares
            )));
        }

        let mut seen = HashSet::new();
        let mut shares = Vec::with_capacity(raw.len());
        for share in raw {
            let x = NonZeroU8::new(share.x)
                .filter(|x| x.get() <= config.total_shares)
                .ok_or_else(|| {
                    ShamirError::Contract(format!("Share index {} out of range", share.x))
                })?;
            if !seen.insert(x) {
                return Err(ShamirError::Contract(format!("Duplicate share index {}", x)));
            }
            let y = FieldElement::from_bytes_be(&share.y)
                .map_err(|e| ShamirError::Contract(e.to_string()))?;
            shares.push(Share::new(x, y));
        }
        shares.sort_by_key(|s| s.x);

        log::debug!(
            "Contract split secret into {} shares (threshold {})",
            config.total_shares,
            config.threshold
        );
        Ok(shares)
    }

    async fn reconstruct(
        &self,
        shares: &[Share],
        secret_len: usize,
    ) -> Result<Secret, ShamirError> {
        if shares.len() < 2 {
            return Err(ShamirError::InvalidParameters(format!(
                "Need at least 2 shares, got {}",
                shares.len()
            )));
        }
        check_secret_len(secret_len)?;

        // Same failure as a zero Lagrange denominator on the local path
        let mut seen = HashSet::new();
        if !shares.iter().all(|s| seen.insert(s.x)) {
            return Err(ShamirError::Arithmetic(
                "Duplicate share index makes interpolation undefined".into(),
            ));
        }

        let mut words = Vec::with_capacity(shares.len());
        for share in shares {
            words.push(ContractShare {
                x: share.x.get(),
                y: *to_word(&share.y)?,
            });
        }

        let word = Zeroizing::new(
            self.contract
                .reconstruct_secret(&words)
                .await
                .map_err(ShamirError::Contract)?,
        );
        let value = FieldElement::from_bytes_be(word.as_ref())
            .map_err(|e| ShamirError::Contract(e.to_string()))?;
        Ok(Secret::new(value.to_bytes_be(secret_len)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use std::sync::Mutex;

    /// Contract double running the same field arithmetic
    struct FieldContract {
        rng: Mutex<ChaCha20Rng>,
    }

    impl FieldContract {
        fn new(seed: u64) -> Self {
            Self {
                rng: Mutex::new(ChaCha20Rng::seed_from_u64(seed)),
            }
        }
    }

    #[async_trait]
    impl ShareContract for FieldContract {
        async fn split_secret(
            &self,
            secret: [u8; FIELD_BYTES],
            total: u8,
            threshold: u8,
        ) -> Result<Vec<ContractShare>, String> {
            let mut rng = self.rng.lock().map_err(|e| e.to_string())?;
            let shares = split_with_rng(&Secret::from_slice(&secret), total, threshold, &mut *rng)
                .map_err(|e| e.to_string())?;
            Ok(shares
                .into_iter()
                .map(|s| {
                    let mut y = [0u8; FIELD_BYTES];
                    y.copy_from_slice(&s.y.to_bytes_be(FIELD_BYTES).unwrap());
                    ContractShare { x: s.x.get(), y }
                })
                .collect())
        }

        async fn reconstruct_secret(
            &self,
            shares: &[ContractShare],
        ) -> Result<[u8; FIELD_BYTES], String> {
            let shares: Vec<Share> = shares
                .iter()
                .map(|s| {
                    Share::new(
                        NonZeroU8::new(s.x).unwrap(),
                        FieldElement::from_bytes_be(&s.y).unwrap(),
                    )
                })
                .collect();
            let secret = reconstruct(&shares, FIELD_BYTES).map_err(|e| e.to_string())?;
            let mut out = [0u8; FIELD_BYTES];
            out.copy_from_slice(secret.as_bytes());
            Ok(out)
        }
    }

    /// Contract double returning malformed output
    struct BrokenContract(Vec<ContractShare>);

    #[async_trait]
    impl ShareContract for BrokenContract {
        async fn split_secret(
            &self,
            _secret: [u8; FIELD_BYTES],
            _total: u8,
            _threshold: u8,
        ) -> Result<Vec<ContractShare>, String> {
            Ok(self.0.clone())
        }

        async fn reconstruct_secret(
            &self,
            _shares: &[ContractShare],
        ) -> Result<[u8; FIELD_BYTES], String> {
            Ok([0xff; FIELD_BYTES])
        }
    }

    fn secret() -> Secret {
        let mut bytes = vec![0u8; 32];
        bytes[31] = 0x2a;
        Secret::new(bytes)
    }

    async fn roundtrip<S: SharingStrategy>(strategy: &mut S) {
        let config = ShamirConfig::three_of_five();
        let shares = strategy.split(&secret(), &config).await.unwrap();
        assert_eq!(shares.len(), 5);

        let subset = [shares[0].clone(), shares[2].clone(), shares[4].clone()];
        let recovered = strategy.reconstruct(&subset, 32).await.unwrap();
        assert_eq!(recovered, secret());
    }

    #[tokio::test]
    async fn test_local_strategy_roundtrip() {
        roundtrip(&mut LocalFieldStrategy::new()).await;
        roundtrip(&mut LocalFieldStrategy::with_rng(ChaCha20Rng::seed_from_u64(1))).await;
    }

    #[tokio::test]
    async fn test_remote_strategy_roundtrip() {
        roundtrip(&mut RemoteContractStrategy::new(FieldContract::new(2))).await;
    }

    #[tokio::test]
    async fn test_strategies_are_interchangeable() {
        let config = ShamirConfig::two_of_three();
        let mut local = LocalFieldStrategy::new();
        let remote = RemoteContractStrategy::new(FieldContract::new(3));

        // Shares from one strategy reconstruct under the other
        let shares = local.split(&secret(), &config).await.unwrap();
        assert_eq!(remote.reconstruct(&shares[1..], 32).await.unwrap(), secret());
    }

    #[tokio::test]
    async fn test_strategies_reject_same_inputs() {
        let bad = ShamirConfig {
            threshold: 4,
            total_shares: 2,
        };
        let mut local = LocalFieldStrategy::new();
        let mut remote = RemoteContractStrategy::new(FieldContract::new(4));

        assert!(matches!(
            local.split(&secret(), &bad).await,
            Err(ShamirError::InvalidParameters(_))
        ));
        assert!(matches!(
            remote.split(&secret(), &bad).await,
            Err(ShamirError::InvalidParameters(_))
        ));

        let shares = local
            .split(&secret(), &ShamirConfig::two_of_three())
            .await
            .unwrap();
        let dup = [shares[0].clone(), shares[0].clone()];
        assert!(matches!(
            local.reconstruct(&dup, 32).await,
            Err(ShamirError::Arithmetic(_))
        ));
        assert!(matches!(
            remote.reconstruct(&dup, 32).await,
            Err(ShamirError::Arithmetic(_))
        ));
    }

    #[tokio::test]
    async fn test_remote_rejects_malformed_contract_output() {
        let config = ShamirConfig::two_of_three();

        // Wrong count
        let mut remote = RemoteContractStrategy::new(BrokenContract(vec![]));
        assert!(matches!(
            remote.split(&secret(), &config).await,
            Err(ShamirError::Contract(_))
        ));

        // Index zero
        let zero = ContractShare { x: 0, y: [1; 32] };
        let mut remote =
            RemoteContractStrategy::new(BrokenContract(vec![zero.clone(), zero.clone(), zero]));
        assert!(matches!(
            remote.split(&secret(), &config).await,
            Err(ShamirError::Contract(_))
        ));

        // y above the prime
        let shares = (1..=3)
            .map(|x| ContractShare { x, y: [0xff; 32] })
            .collect();
        let mut remote = RemoteContractStrategy::new(BrokenContract(shares));
        assert!(matches!(
            remote.split(&secret(), &config).await,
            Err(ShamirError::Contract(_))
        ));

        // Reconstructed word above the prime
        let local_shares = split_with_rng(&secret(), 3, 2, &mut OsRng).unwrap();
        assert!(matches!(
            remote.reconstruct(&local_shares, 32).await,
            Err(ShamirError::Contract(_))
        ));
    }
}
