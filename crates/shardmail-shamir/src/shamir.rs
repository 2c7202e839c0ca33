//! Core Shamir's Secret Sharing implementation
//!
//! Split a secret into N shares where any M can reconstruct it. The whole
//! secret is one field element; a degree `M - 1` polynomial with the secret
//! as constant term is evaluated at `x = 1..=N`.

use crate::{ShamirConfig, ShamirError};
use rand::{rngs::OsRng, CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use shardmail_core::field::{FieldElement, FIELD_BYTES};
use std::fmt;
use std::num::NonZeroU8;
use zeroize::Zeroizing;

/// Private key material to be split.
///
/// Interpreted as one big-endian integer, which must be below the field
/// prime. At most [`FIELD_BYTES`] long.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Zeroizing<Vec<u8>>);

impl Secret {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(Zeroizing::new(bytes))
    }

    pub fn from_slice(bytes: &[u8]) -> Self {
        Self::new(bytes.to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Field element for this secret, checking length and range
    pub(crate) fn to_field(&self) -> Result<FieldElement, ShamirError> {
        if self.is_empty() {
            return Err(ShamirError::InvalidParameters("Empty secret".into()));
        }
        if self.len() > FIELD_BYTES {
            return Err(ShamirError::InvalidParameters(format!(
                "Secret is {} bytes, at most {} allowed",
                self.len(),
                FIELD_BYTES
            )));
        }
        Ok(FieldElement::from_bytes_be(self.as_bytes())?)
    }

    pub(crate) fn from_field(value: &FieldElement, length: usize) -> Result<Self, ShamirError> {
        check_secret_len(length)?;
        Ok(Self::new(value.to_bytes_be(length)?))
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret({} bytes)", self.len())
    }
}

impl From<Vec<u8>> for Secret {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

pub(crate) fn check_secret_len(length: usize) -> Result<(), ShamirError> {
    if length == 0 || length > FIELD_BYTES {
        return Err(ShamirError::InvalidParameters(format!(
            "Secret length must be 1..={} bytes, got {}",
            FIELD_BYTES, length
        )));
    }
    Ok(())
}

/// A single share of a secret
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    /// Evaluation point (1..=N, never 0)
    pub x: NonZeroU8,
    /// Polynomial value at `x`
    pub y: FieldElement,
}

impl Share {
    pub fn new(x: NonZeroU8, y: FieldElement) -> Self {
        Self { x, y }
    }

    fn x_field(&self) -> FieldElement {
        FieldElement::from_u64(u64::from(self.x.get()))
    }
}

/// Random polynomial whose constant term is the secret.
///
/// Exists only for the duration of one split.
struct Polynomial {
    /// coefficients[0] is the secret
    coefficients: Vec<FieldElement>,
}

impl Polynomial {
    fn random<R: RngCore + CryptoRng>(secret: FieldElement, threshold: u8, rng: &mut R) -> Self {
        let mut coefficients = Vec::with_capacity(usize::from(threshold));
        coefficients.push(secret);
        for _ in 1..threshold {
            coefficients.push(FieldElement::random(rng));
        }
        Self { coefficients }
    }

    /// Horner evaluation
    fn evaluate(&self, x: &FieldElement) -> FieldElement {
        self.coefficients
            .iter()
            .rev()
            .fold(FieldElement::zero(), |acc, c| &(&acc * x) + c)
    }
}

impl Drop for Polynomial {
    fn drop(&mut self) {
        // num-bigint does not expose its limbs, so this releases the values
        // rather than scrubbing them.
        for c in &mut self.coefficients {
            c.clear();
        }
    }
}

/// Split a secret into shares using the OS random source
pub fn split(secret: &Secret, total: u8, threshold: u8) -> Result<Vec<Share>, ShamirError> {
    split_with_rng(secret, total, threshold, &mut OsRng)
}

/// Split a secret into shares using Shamir's Secret Sharing
///
/// # Arguments
/// * `secret` - The secret bytes to split (1..=32 bytes, value below P)
/// * `total` - Total shares to generate (N)
/// * `threshold` - Minimum shares needed to reconstruct (M)
/// * `rng` - Source of the polynomial coefficients
///
/// # Returns
/// Vector of N shares with `x = 1..=N`, any M of which reconstruct the secret
pub fn split_with_rng<R: RngCore + CryptoRng>(
    secret: &Secret,
    total: u8,
    threshold: u8,
    rng: &mut R,
) -> Result<Vec<Share>, ShamirError> {
    ShamirConfig::new(total, threshold)?;
    let constant = secret.to_field()?;

    let polynomial = Polynomial::random(constant, threshold, rng);
    let shares = (1..=total)
        .filter_map(NonZeroU8::new)
        .map(|x| {
            let y = polynomial.evaluate(&FieldElement::from_u64(u64::from(x.get())));
            Share::new(x, y)
        })
        .collect();

    log::debug!("Split secret into {} shares (threshold {})", total, threshold);
    Ok(shares)
}

/// Reconstruct a secret from shares by Lagrange interpolation at `x = 0`
///
/// # Arguments
/// * `shares` - At least two shares; callers must supply `threshold` of them
/// * `secret_len` - Byte length of the original secret
///
/// # Errors
/// * [`ShamirError::InvalidParameters`] for fewer than two shares or a bad length
/// * [`ShamirError::Arithmetic`] when two shares have the same `x`
/// * [`ShamirError::Encoding`] when the result does not fit `secret_len` bytes
///
/// Fewer than `threshold` shares is *not* an error: the result is simply
/// not the secret.
pub fn reconstruct(shares: &[Share], secret_len: usize) -> Result<Secret, ShamirError> {
    if shares.len() < 2 {
        return Err(ShamirError::InvalidParameters(format!(
            "Need at least 2 shares, got {}",
            shares.len()
        )));
    }
    check_secret_len(secret_len)?;

    let xs: Vec<FieldElement> = shares.iter().map(Share::x_field).collect();
    let zero = FieldElement::zero();

    let mut secret = FieldElement::zero();
    for (j, share) in shares.iter().enumerate() {
        let mut numerator = FieldElement::one();
        let mut denominator = FieldElement::one();
        for (m, x_m) in xs.iter().enumerate() {
            if m == j {
                continue;
            }
            numerator = &numerator * &(&zero - x_m);
            denominator = &denominator * &(&xs[j] - x_m);
        }
        // Duplicate x makes the denominator zero
        let basis = numerator.div(&denominator)?;
        secret = &secret + &(&share.y * &basis);
    }

    let result = Secret::from_field(&secret, secret_len);
    secret.clear();
    result
}

/// Verify that shares are consistent (reconstruct to the same secret)
///
/// Reconstructs the first and the last `threshold`-sized subsets and
/// compares them. This is an explicit, opt-in check; [`reconstruct`] never
/// performs it.
pub fn verify_shares(
    shares: &[Share],
    threshold: usize,
    secret_len: usize,
) -> Result<bool, ShamirError> {
    if shares.len() < threshold || threshold < 2 {
        return Err(ShamirError::InvalidParameters(format!(
            "Need at least {} shares to verify, got {}",
            threshold.max(2),
            shares.len()
        )));
    }

    let expected = reconstruct(&shares[..threshold], secret_len)?;

    if shares.len() > threshold {
        let result = reconstruct(&shares[shares.len() - threshold..], secret_len)?;
        if result != expected {
            return Ok(false);
        }
    }

    Ok(true)
}
