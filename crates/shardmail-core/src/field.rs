//! Prime field arithmetic
//!
//! All secret sharing happens in GF(P) with
//! `P = 2^256 - 189 = 115792089237316195423570985008687907853269984665640564039457584007913129639747`.
//!
//! This is a fixed constant of the sharing scheme. It is *not* the order of
//! secp256k1 or any other curve used elsewhere, and nothing here relies on it
//! being one.
//!
//! # Reduction
//!
//! Every value produced by this module lies in `[0, P)`. Subtraction and the
//! extended Euclidean algorithm both pass through negative intermediates;
//! those are folded back by adding `P` before any further reduction.

use num_bigint::{BigInt, BigUint, RandBigInt};
use num_traits::{One, Signed, Zero};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};
use std::sync::OnceLock;
use thiserror::Error;

/// Decimal form of the field prime
pub const PRIME_DECIMAL: &str =
    "115792089237316195423570985008687907853269984665640564039457584007913129639747";

/// Number of bytes needed to hold any field element
pub const FIELD_BYTES: usize = 32;

/// Big-endian bytes of `2^256 - 189`
const PRIME_BE: [u8; FIELD_BYTES] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0x43,
];

static PRIME: OnceLock<BigUint> = OnceLock::new();

/// The field modulus `P`
pub fn prime() -> &'static BigUint {
    PRIME.get_or_init(|| BigUint::from_bytes_be(&PRIME_BE))
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// Modular inverse of zero (or of a value sharing a factor with the modulus)
    #[error("Value has no modular inverse")]
    NotInvertible,
    /// Value needs more bytes than the requested encoding length
    #[error("Value does not fit in {length} bytes")]
    DoesNotFit { length: usize },
    /// Value is not a canonical field representative
    #[error("Value is not below the field prime")]
    OutOfRange,
    #[error("Invalid field element encoding: {0}")]
    InvalidEncoding(String),
}

/// Modular inverse via the extended Euclidean algorithm.
///
/// Returns the unique `b` in `[0, modulus)` with `a * b ≡ 1 (mod modulus)`.
pub fn mod_inverse(a: &BigUint, modulus: &BigUint) -> Result<BigUint, FieldError> {
    let a = a % modulus;
    if a.is_zero() {
        return Err(FieldError::NotInvertible);
    }

    let m = BigInt::from(modulus.clone());
    let (mut old_r, mut r) = (BigInt::from(a), m.clone());
    let (mut old_s, mut s) = (BigInt::one(), BigInt::zero());

    while !r.is_zero() {
        let q = &old_r / &r;
        let next_r = &old_r - &q * &r;
        old_r = std::mem::replace(&mut r, next_r);
        let next_s = &old_s - &q * &s;
        old_s = std::mem::replace(&mut s, next_s);
    }

    // gcd(a, modulus) must be 1
    if !old_r.is_one() {
        return Err(FieldError::NotInvertible);
    }

    let mut inverse = old_s % &m;
    if inverse.is_negative() {
        inverse += &m;
    }
    inverse.to_biguint().ok_or(FieldError::NotInvertible)
}

/// An element of GF(P), always in `[0, P)`.
///
/// Serializes as a decimal string so that JSON consumers without native
/// 256-bit integers read it losslessly.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldElement(BigUint);

impl FieldElement {
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    pub fn one() -> Self {
        Self(BigUint::one())
    }

    /// Wrap a value that must already be canonical
    pub fn new(value: BigUint) -> Result<Self, FieldError> {
        if &value >= prime() {
            return Err(FieldError::OutOfRange);
        }
        Ok(Self(value))
    }

    /// Reduce an arbitrary value into the field (`value mod P`)
    pub fn reduce(value: BigUint) -> Self {
        Self(value % prime())
    }

    pub fn from_u64(value: u64) -> Self {
        Self::reduce(BigUint::from(value))
    }

    /// Uniformly random element of `[0, P)`
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self(rng.gen_biguint_below(prime()))
    }

    /// Interpret big-endian bytes as an unsigned integer.
    ///
    /// Fails with [`FieldError::OutOfRange`] when the integer is `>= P`
    /// instead of silently reducing it.
    pub fn from_bytes_be(bytes: &[u8]) -> Result<Self, FieldError> {
        Self::new(BigUint::from_bytes_be(bytes))
    }

    /// Encode as exactly `length` big-endian bytes, zero-padded on the left.
    pub fn to_bytes_be(&self, length: usize) -> Result<Vec<u8>, FieldError> {
        let needed = self.0.bits().div_ceil(8) as usize;
        if needed > length {
            return Err(FieldError::DoesNotFit { length });
        }

        let mut out = vec![0u8; length];
        if needed > 0 {
            let raw = self.0.to_bytes_be();
            out[length - raw.len()..].copy_from_slice(&raw);
        }
        Ok(out)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Multiplicative inverse; undefined for zero
    pub fn inverse(&self) -> Result<Self, FieldError> {
        mod_inverse(&self.0, prime()).map(Self)
    }

    /// `self / rhs`, failing when `rhs` is zero
    pub fn div(&self, rhs: &Self) -> Result<Self, FieldError> {
        Ok(self * &rhs.inverse()?)
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    /// Drop the value held by this element, leaving zero behind.
    pub fn clear(&mut self) {
        self.0.set_zero();
    }
}

impl Add<&FieldElement> for &FieldElement {
    type Output = FieldElement;

    fn add(self, rhs: &FieldElement) -> FieldElement {
        FieldElement::reduce(&self.0 + &rhs.0)
    }
}

impl Sub<&FieldElement> for &FieldElement {
    type Output = FieldElement;

    fn sub(self, rhs: &FieldElement) -> FieldElement {
        // BigUint cannot go negative: self - rhs < 0 is exactly the case
        // where P has to be added back, so add it up front.
        if self.0 >= rhs.0 {
            FieldElement(&self.0 - &rhs.0)
        } else {
            FieldElement(prime() - &rhs.0 + &self.0)
        }
    }
}

impl Mul<&FieldElement> for &FieldElement {
    type Output = FieldElement;

    fn mul(self, rhs: &FieldElement) -> FieldElement {
        FieldElement::reduce(&self.0 * &rhs.0)
    }
}

impl Add for FieldElement {
    type Output = FieldElement;

    fn add(self, rhs: FieldElement) -> FieldElement {
        &self + &rhs
    }
}

impl Sub for FieldElement {
    type Output = FieldElement;

    fn sub(self, rhs: FieldElement) -> FieldElement {
        &self - &rhs
    }
}

impl Mul for FieldElement {
    type Output = FieldElement;

    fn mul(self, rhs: FieldElement) -> FieldElement {
        &self * &rhs
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement({})", self.0)
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<FieldElement> for String {
    fn from(value: FieldElement) -> Self {
        value.0.to_str_radix(10)
    }
}

impl TryFrom<String> for FieldElement {
    type Error = FieldError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FieldError::InvalidEncoding("expected decimal digits".into()));
        }
        let parsed = BigUint::parse_bytes(value.as_bytes(), 10)
            .ok_or_else(|| FieldError::InvalidEncoding("expected decimal digits".into()))?;
        Self::new(parsed)
    }
}
