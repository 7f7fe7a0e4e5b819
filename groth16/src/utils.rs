//! Root-of-unity helpers shared by the QAP reduction and the setup.

use ark_ff::{FftField, LegendreSymbol, PrimeField};
use ark_poly::{EvaluationDomain, GeneralEvaluationDomain};
use num_traits::{One, ToPrimitive, Zero};

/// Returns the smallest quadratic non-residue `q` of the field together with
/// the tower of two-adic roots of unity derived from it: `roots[i]` is a
/// primitive `2^i`-th root of unity and `roots[i]^2 = roots[i - 1]`.
///
/// This is how snarkjs (ffjavascript) constructs its FFT generators, so any
/// code that has to agree with circom-produced key material on evaluation
/// order must draw its generators from this tower.
pub fn roots_of_unity<F: PrimeField + FftField>() -> (F, Vec<F>) {
    let mut roots = vec![F::zero(); F::TWO_ADICITY.to_usize().expect("fits usize") + 1];
    let mut q = F::one();
    while q.legendre() != LegendreSymbol::QuadraticNonResidue {
        q += F::one();
    }
    let z = q.pow(F::TRACE);
    roots[0] = z;
    for i in 1..roots.len() {
        roots[i] = roots[i - 1].square();
    }
    roots.reverse();
    (q, roots)
}

/// Replaces the generator of `domain` (of size `2^pow`) with the snarkjs one
/// and returns the `2^(pow + 1)`-th root used to shift evaluations onto the
/// odd powers of the doubled domain.
///
/// At the two-adicity limit no doubled domain exists; snarkjs falls back to
/// the square of the non-residue and so do we.
pub fn root_of_unity_for_groth16<F: PrimeField + FftField>(
    pow: usize,
    domain: &mut GeneralEvaluationDomain<F>,
) -> F {
    let (q, roots) = roots_of_unity::<F>();
    match domain {
        GeneralEvaluationDomain::Radix2(domain) => {
            domain.group_gen = roots[pow];
            domain.group_gen_inv = domain.group_gen.inverse().expect("can compute inverse");
        }
        GeneralEvaluationDomain::MixedRadix(domain) => {
            domain.group_gen = roots[pow];
            domain.group_gen_inv = domain.group_gen.inverse().expect("can compute inverse");
        }
    };
    if u64::from(F::TWO_ADICITY) == domain.log_size_of_group() {
        q.square()
    } else {
        roots[domain.log_size_of_group().to_usize().expect("fits usize") + 1]
    }
}

#[cfg(test)]
mod tests {
    use super::roots_of_unity;
    use ark_ff::{FftField, Field, PrimeField};
    use num_traits::One;

    fn tower_is_consistent<F: PrimeField + FftField>() {
        let (q, roots) = roots_of_unity::<F>();
        assert_eq!(q.legendre(), ark_ff::LegendreSymbol::QuadraticNonResidue);
        assert_eq!(roots.len(), F::TWO_ADICITY as usize + 1);
        assert!(roots[0].is_one());
        for (i, root) in roots.iter().enumerate().skip(1) {
            // primitive 2^i-th root: squares down the tower, and is not 1
            assert_eq!(root.square(), roots[i - 1]);
            assert!(!root.is_one());
        }
    }

    #[test]
    fn snarkjs_root_tower_bn254() {
        tower_is_consistent::<ark_bn254::Fr>();
    }

    #[test]
    fn snarkjs_root_tower_bls12_381() {
        tower_is_consistent::<ark_bls12_381::Fr>();
    }
}
