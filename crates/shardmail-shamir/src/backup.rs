//! Key backup and recovery through a share registry
//!
//! Backup: split → protect each share → `store_shares`.
//! Recovery: `get_share_config` → fetch → unprotect → reconstruct.
//!
//! Every step either succeeds or aborts the whole operation; nothing is
//! retried here.

use crate::protect::{protect, unprotect_bytes};
use crate::registry::ShareRegistry;
use crate::shamir::Secret;
use crate::strategy::SharingStrategy;
use crate::{ShamirConfig, ShamirError};

/// Split `secret`, encrypt every share under `password`, and store them
/// for `owner`.
///
/// Fails with [`ShamirError::InvalidParameters`] for fewer than two shares,
/// since recovery interpolates at least two.
pub async fn backup_secret<S, G>(
    strategy: &mut S,
    registry: &G,
    owner: &str,
    secret: &Secret,
    config: &ShamirConfig,
    password: &str,
) -> Result<(), ShamirError>
where
    S: SharingStrategy + ?Sized,
    G: ShareRegistry + ?Sized,
{
    config.validate()?;
    if config.total_shares < 2 {
        return Err(ShamirError::InvalidParameters(format!(
            "Backup needs at least 2 shares, got {}",
            config.total_shares
        )));
    }

    let shares = strategy.split(secret, config).await?;

    let mut encrypted = Vec::with_capacity(shares.len());
    for share in &shares {
        encrypted.push(protect(share, password)?.to_bytes());
    }
    drop(shares);

    registry
        .store_shares(owner, encrypted, config.total_shares, config.threshold)
        .await?;

    log::info!(
        "Stored {} encrypted shares for {} (threshold {})",
        config.total_shares,
        owner,
        config.threshold
    );
    Ok(())
}

/// Recover `owner`'s secret from the first `max(threshold, 2)` stored shares
pub async fn recover_secret<S, G>(
    strategy: &S,
    registry: &G,
    owner: &str,
    password: &str,
    secret_len: usize,
) -> Result<Secret, ShamirError>
where
    S: SharingStrategy + ?Sized,
    G: ShareRegistry + ?Sized,
{
    let config = registry.get_share_config(owner).await?;
    let count = config.threshold.max(2).min(config.total_shares);
    let positions: Vec<u8> = (0..count).collect();
    fetch_and_reconstruct(strategy, registry, owner, &config, &positions, password, secret_len)
        .await
}

/// Recover `owner`'s secret from the shares stored at `positions`
///
/// Supplying fewer positions than the recorded threshold is allowed and
/// yields a wrong secret without error, exactly as [`crate::reconstruct`]
/// does.
pub async fn recover_secret_from<S, G>(
    strategy: &S,
    registry: &G,
    owner: &str,
    positions: &[u8],
    password: &str,
    secret_len: usize,
) -> Result<Secret, ShamirError>
where
    S: SharingStrategy + ?Sized,
    G: ShareRegistry + ?Sized,
{
    let config = registry.get_share_config(owner).await?;
    fetch_and_reconstruct(strategy, registry, owner, &config, positions, password, secret_len)
        .await
}

async fn fetch_and_reconstruct<S, G>(
    strategy: &S,
    registry: &G,
    owner: &str,
    config: &ShamirConfig,
    positions: &[u8],
    password: &str,
    secret_len: usize,
) -> Result<Secret, ShamirError>
where
    S: SharingStrategy + ?Sized,
    G: ShareRegistry + ?Sized,
{
    if positions.len() < usize::from(config.threshold) {
        log::warn!(
            "Recovering {} with {} shares, below threshold {}",
            owner,
            positions.len(),
            config.threshold
        );
    }

    let mut shares = Vec::with_capacity(positions.len());
    for &position in positions {
        let blob = registry.get_share(owner, position).await?;
        shares.push(unprotect_bytes(&blob, password)?);
    }

    log::debug!("Fetched and decrypted {} shares for {}", shares.len(), owner);
    strategy.reconstruct(&shares, secret_len).await
}
