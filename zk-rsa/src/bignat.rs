//! Big unsigned integers emulated over the BN254 scalar field.
//!
//! An integer is a little-endian vector of `LIMB_BITS`-wide limbs. Witness
//! integers are range-checked limb by limb through bit decomposition, so every
//! limb of a [`BigNatVar`] obtained from [`BigNatVar::new_witness`] or from
//! [`BigNatVar::mod_mul`] is guaranteed to lie in `[0, 2^LIMB_BITS)`.
//!
//! Public inputs are NOT range-checked: the verifier derives them from
//! canonical bytes, so they are well-formed by construction.
//!
//! Modular multiplication `a * b mod n` is proven by witnessing `(q, r)` and
//! checking `a * b = q * n + r` over the integers. The identity is checked
//! column-wise (one column per limb position) with a signed carry chain; the
//! carries are shifted by a constant offset to make them non-negative before
//! their range check.

use crate::constants::LIMB_BITS;
use ark_bn254::Fr;
use ark_ff::{AdditiveGroup, PrimeField};
use ark_r1cs_std::alloc::AllocVar;
use ark_r1cs_std::boolean::Boolean;
use ark_r1cs_std::eq::EqGadget;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::fields::FieldVar;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};
use num_bigint::{BigInt, BigUint};
use num_traits::{One, Zero};

/// Split `value` into exactly `num_limbs` little-endian limbs.
///
/// Returns `None` if the value does not fit.
// `to_u64_digits` matches the limb layout only because LIMB_BITS == 64.
pub fn to_limbs(value: &BigUint, num_limbs: usize) -> Option<Vec<u64>> {
    let mut digits = value.to_u64_digits();
    if digits.len() > num_limbs {
        return None;
    }
    digits.resize(num_limbs, 0);
    Some(digits)
}

/// Inverse of [`to_limbs`].
pub fn from_limbs(limbs: &[u64]) -> BigUint {
    limbs
        .iter()
        .rev()
        .fold(BigUint::zero(), |acc, limb| (acc << LIMB_BITS) + BigUint::from(*limb))
}

/// Limbs as field elements, in the order the circuit allocates them.
pub fn limbs_to_field_elems(limbs: &[u64]) -> Vec<Fr> {
    limbs.iter().map(|l| Fr::from(*l)).collect()
}

fn biguint_to_fr(x: &BigUint) -> Fr {
    Fr::from_le_bytes_mod_order(&x.to_bytes_le())
}

/// Allocate a witness that fits in `bits` bits.
///
/// The returned variable is the linear combination of its allocated bits, so
/// the range check costs exactly `bits` boolean constraints.
fn alloc_bounded(
    cs: &ConstraintSystemRef<Fr>,
    value: &BigUint,
    bits: usize,
) -> Result<FpVar<Fr>, SynthesisError> {
    let mut acc = FpVar::<Fr>::zero();
    let mut coeff = Fr::one();

    for i in 0..bits {
        let bit = Boolean::new_witness(cs.clone(), || Ok(value.bit(i as u64)))?;
        acc += FpVar::from(bit) * coeff;
        coeff.double_in_place();
    }

    Ok(acc)
}

/// `sum_{i+j=k} x_i * y_j` for every column `k`.
fn product_columns(x: &[FpVar<Fr>], y: &[FpVar<Fr>]) -> Vec<FpVar<Fr>> {
    let mut columns = vec![FpVar::<Fr>::zero(); x.len() + y.len() - 1];
    for (i, xi) in x.iter().enumerate() {
        for (j, yj) in y.iter().enumerate() {
            columns[i + j] += xi * yj;
        }
    }
    columns
}

fn native_product_columns(x: &[u64], y: &[u64]) -> Vec<BigInt> {
    let mut columns = vec![BigInt::zero(); x.len() + y.len() - 1];
    for (i, xi) in x.iter().enumerate() {
        for (j, yj) in y.iter().enumerate() {
            columns[i + j] += BigInt::from(*xi) * BigInt::from(*yj);
        }
    }
    columns
}

/// An assigned big unsigned integer.
#[derive(Clone, Debug)]
pub struct BigNatVar {
    limbs: Vec<FpVar<Fr>>,
    value: BigUint,
}

impl BigNatVar {
    /// Allocate a range-checked private integer of `num_limbs` limbs.
    pub fn new_witness(
        cs: &ConstraintSystemRef<Fr>,
        value: &BigUint,
        num_limbs: usize,
    ) -> Result<Self, SynthesisError> {
        let native = to_limbs(value, num_limbs).ok_or(SynthesisError::Unsatisfiable)?;
        let limbs = native
            .iter()
            .map(|limb| alloc_bounded(cs, &BigUint::from(*limb), LIMB_BITS))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            limbs,
            value: value.clone(),
        })
    }

    /// Allocate a public integer of `num_limbs` limbs (one public input per limb).
    pub fn new_input(
        cs: &ConstraintSystemRef<Fr>,
        value: &BigUint,
        num_limbs: usize,
    ) -> Result<Self, SynthesisError> {
        let native = to_limbs(value, num_limbs).ok_or(SynthesisError::Unsatisfiable)?;
        let limbs = native
            .iter()
            .map(|limb| FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(*limb))))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            limbs,
            value: value.clone(),
        })
    }

    pub fn constant(value: &BigUint, num_limbs: usize) -> Result<Self, SynthesisError> {
        let native = to_limbs(value, num_limbs).ok_or(SynthesisError::Unsatisfiable)?;
        Ok(Self {
            limbs: native.iter().map(|l| FpVar::constant(Fr::from(*l))).collect(),
            value: value.clone(),
        })
    }

    /// Assemble an integer from already-constrained limbs.
    ///
    /// The caller is responsible for the limbs being well-formed and for
    /// `value` matching them.
    pub fn from_limb_vars(limbs: Vec<FpVar<Fr>>, value: BigUint) -> Self {
        Self { limbs, value }
    }

    pub fn limbs(&self) -> &[FpVar<Fr>] {
        &self.limbs
    }

    pub fn num_limbs(&self) -> usize {
        self.limbs.len()
    }

    /// The native value this variable was assigned with.
    pub fn value(&self) -> &BigUint {
        &self.value
    }

    /// Limb-wise equality. Both sides must use the same number of limbs.
    pub fn enforce_equal(&self, other: &Self) -> Result<(), SynthesisError> {
        if self.num_limbs() != other.num_limbs() {
            return Err(SynthesisError::Unsatisfiable);
        }
        for (a, b) in self.limbs.iter().zip(other.limbs.iter()) {
            a.enforce_equal(b)?;
        }
        Ok(())
    }

    /// Modular multiplication. Returns `r` with `self * other = q * modulus + r`.
    ///
    /// The result has as many limbs as `modulus` and every limb is
    /// range-checked. `r` is congruent to the product but is only bounded by
    /// `2^(LIMB_BITS * modulus.num_limbs())`, not by the modulus.
    pub fn mod_mul(
        &self,
        cs: &ConstraintSystemRef<Fr>,
        other: &Self,
        modulus: &Self,
    ) -> Result<Self, SynthesisError> {
        if modulus.value.is_zero() {
            return Err(SynthesisError::Unsatisfiable);
        }

        let num_limbs = modulus.num_limbs();
        let product = &self.value * &other.value;
        let q_value = &product / &modulus.value;
        let r_value = &product % &modulus.value;

        let q = Self::new_witness(cs, &q_value, num_limbs)?;
        let r = Self::new_witness(cs, &r_value, num_limbs)?;

        // Native mirror of the column sums, used to derive the carries.
        let a_native = to_limbs(&self.value, self.num_limbs()).ok_or(SynthesisError::Unsatisfiable)?;
        let b_native = to_limbs(&other.value, other.num_limbs()).ok_or(SynthesisError::Unsatisfiable)?;
        let q_native = to_limbs(&q_value, num_limbs).ok_or(SynthesisError::Unsatisfiable)?;
        let n_native = to_limbs(&modulus.value, num_limbs).ok_or(SynthesisError::Unsatisfiable)?;
        let r_native = to_limbs(&r_value, num_limbs).ok_or(SynthesisError::Unsatisfiable)?;

        let mut lhs = product_columns(&self.limbs, &other.limbs);
        let mut rhs = product_columns(&q.limbs, &modulus.limbs);
        let mut lhs_native = native_product_columns(&a_native, &b_native);
        let mut rhs_native = native_product_columns(&q_native, &n_native);

        let num_columns = lhs.len().max(rhs.len());
        lhs.resize(num_columns, FpVar::zero());
        rhs.resize(num_columns, FpVar::zero());
        lhs_native.resize(num_columns, BigInt::zero());
        rhs_native.resize(num_columns, BigInt::zero());

        for (k, (limb, limb_native)) in r.limbs.iter().zip(r_native.iter()).enumerate() {
            rhs[k] += limb;
            rhs_native[k] += BigInt::from(*limb_native);
        }

        // |column| < 2 * L * 2^(2 * LIMB_BITS) + 2^LIMB_BITS, hence
        // |carry| < 2^(LIMB_BITS + log2(L) + 3).
        let max_limbs = self.num_limbs().max(other.num_limbs()).max(num_limbs);
        let log_limbs = max_limbs.next_power_of_two().trailing_zeros() as usize;
        let carry_bits = LIMB_BITS + log_limbs + 3;
        let offset = BigInt::one() << carry_bits;

        let base = BigInt::one() << LIMB_BITS;
        let base_fe = biguint_to_fr(&(BigUint::one() << LIMB_BITS));
        let offset_fe = biguint_to_fr(&(BigUint::one() << carry_bits));

        let mut carry_native = BigInt::zero();
        let mut carry = FpVar::<Fr>::zero();

        for k in 0..num_columns {
            let column = &lhs[k] - &rhs[k] + &carry;

            if k + 1 == num_columns {
                column.enforce_equal(&FpVar::zero())?;
                break;
            }

            // Exact for honest witnesses: the low LIMB_BITS bits cancel.
            carry_native = (&lhs_native[k] - &rhs_native[k] + &carry_native) / &base;
            let shifted = (&carry_native + &offset)
                .to_biguint()
                .ok_or(SynthesisError::Unsatisfiable)?;

            let next_carry = alloc_bounded(cs, &shifted, carry_bits + 1)? - offset_fe;
            column.enforce_equal(&(next_carry.clone() * base_fe))?;
            carry = next_carry;
        }

        Ok(r)
    }

    /// Modular exponentiation by a constant, by square-and-multiply.
    ///
    /// For `exponent == 1` the input is returned unreduced.
    pub fn mod_pow_const(
        &self,
        cs: &ConstraintSystemRef<Fr>,
        exponent: u64,
        modulus: &Self,
    ) -> Result<Self, SynthesisError> {
        if exponent == 0 {
            return Self::constant(&BigUint::one(), modulus.num_limbs());
        }

        let mut e = exponent;
        let mut base = self.clone();
        let mut acc: Option<Self> = None;

        while e > 0 {
            if e & 1 == 1 {
                acc = Some(match acc {
                    None => base.clone(),
                    Some(acc) => acc.mod_mul(cs, &base, modulus)?,
                });
            }

            e >>= 1;

            if e > 0 {
                base = base.mod_mul(cs, &base, modulus)?;
            }
        }

        acc.ok_or(SynthesisError::Unsatisfiable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_relations::r1cs::ConstraintSystem;
    use num_bigint::RandBigInt;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    const TEST_LIMBS: usize = 4;

    fn random_odd_modulus(rng: &mut ChaCha20Rng) -> BigUint {
        let bits = (TEST_LIMBS * LIMB_BITS) as u64;
        let mut n = rng.gen_biguint(bits);
        n.set_bit(bits - 1, true);
        n.set_bit(0, true);
        n
    }

    #[test]
    fn limbs_roundtrip_and_overflow() {
        let x = (BigUint::one() << 130u32) + BigUint::from(7u8);
        let limbs = to_limbs(&x, 3).unwrap();
        assert_eq!(limbs, vec![7, 0, 4]);
        assert_eq!(from_limbs(&limbs), x);
        assert!(to_limbs(&x, 2).is_none());
    }

    #[test]
    fn mod_mul_matches_native_and_is_satisfied() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let n = random_odd_modulus(&mut rng);
        let a = rng.gen_biguint_below(&n);
        let b = rng.gen_biguint_below(&n);

        let cs = ConstraintSystem::<Fr>::new_ref();
        let n_var = BigNatVar::new_input(&cs, &n, TEST_LIMBS).unwrap();
        let a_var = BigNatVar::new_witness(&cs, &a, TEST_LIMBS).unwrap();
        let b_var = BigNatVar::new_witness(&cs, &b, TEST_LIMBS).unwrap();

        let r = a_var.mod_mul(&cs, &b_var, &n_var).unwrap();
        assert_eq!(r.value(), &((&a * &b) % &n));

        let expected = BigNatVar::constant(&((&a * &b) % &n), TEST_LIMBS).unwrap();
        r.enforce_equal(&expected).unwrap();
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn mod_pow_matches_native() {
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let n = random_odd_modulus(&mut rng);
        let x = rng.gen_biguint_below(&n);

        let cs = ConstraintSystem::<Fr>::new_ref();
        let n_var = BigNatVar::new_input(&cs, &n, TEST_LIMBS).unwrap();
        let x_var = BigNatVar::new_witness(&cs, &x, TEST_LIMBS).unwrap();

        let y = x_var.mod_pow_const(&cs, 65537, &n_var).unwrap();
        assert_eq!(y.value(), &x.modpow(&BigUint::from(65537u32), &n));
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn wrong_claimed_result_is_unsatisfied() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let n = random_odd_modulus(&mut rng);
        let x = rng.gen_biguint_below(&n);

        let cs = ConstraintSystem::<Fr>::new_ref();
        let n_var = BigNatVar::new_input(&cs, &n, TEST_LIMBS).unwrap();
        let x_var = BigNatVar::new_witness(&cs, &x, TEST_LIMBS).unwrap();

        let y = x_var.mod_pow_const(&cs, 3, &n_var).unwrap();
        let wrong = (y.value() + BigUint::one()) % &n;
        let claimed = BigNatVar::constant(&wrong, TEST_LIMBS).unwrap();
        y.enforce_equal(&claimed).unwrap();

        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn oversized_witness_is_rejected() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let too_big = BigUint::one() << (TEST_LIMBS * LIMB_BITS);
        assert!(BigNatVar::new_witness(&cs, &too_big, TEST_LIMBS).is_err());
    }
}
