//! R1CS-to-QAP reductions.
//!
//! The witness map turns a satisfying assignment into the scalar vector the
//! prover feeds into the `h_query` multi-scalar multiplication; the instance
//! map and the h-basis scalars are the setup-side counterparts. Two maps are
//! provided: the snarkjs one ([`CircomReduction`]) and the libsnark one
//! ([`LibSnarkReduction`]). A proving key is only usable with the reduction
//! it was generated for.

use ark_ff::{FftField, PrimeField, batch_inversion};
use ark_poly::{EvaluationDomain, GeneralEvaluationDomain};
use ark_relations::r1cs::{ConstraintMatrices, Matrix};
use num_traits::{One, Zero};
use rayon::prelude::*;
use thiserror::Error;
use tracing::instrument;

use crate::utils::{root_of_unity_for_groth16, roots_of_unity};

macro_rules! rayon_join {
    ($t1: expr, $t2: expr, $t3: expr) => {{
        let ((x, y), z) = rayon::join(|| rayon::join($t1, $t2), $t3);
        (x, y, z)
    }};
}

/// Errors of the QAP reduction.
#[derive(Debug, Error)]
pub enum ReductionError {
    /// The constraint system needs an evaluation domain larger than the
    /// curve's two-adic subgroup supports.
    #[error("constraint system of size {0} exceeds the curve's two-adic evaluation domain")]
    DomainTooLarge(usize),
}

/// The QAP polynomials of a circuit, evaluated at the setup point.
#[derive(Debug)]
pub struct QapInstance<F: PrimeField> {
    /// `u_i(t)` per variable.
    pub a: Vec<F>,
    /// `v_i(t)` per variable.
    pub b: Vec<F>,
    /// `w_i(t)` per variable.
    pub c: Vec<F>,
    /// The vanishing polynomial at `t`.
    pub zt: F,
    /// Size of the evaluation domain.
    pub domain_size: usize,
}

/// An R1CS-to-QAP reduction: the witness map used while proving and the
/// instance map / h-basis used while generating parameters.
pub trait R1CSToQAP {
    /// The evaluation domain for a constraint system with `num_coeffs`
    /// combined constraints and instance variables, with the generator the
    /// reduction's FFTs assume.
    fn evaluation_domain<F: PrimeField + FftField>(
        num_coeffs: usize,
    ) -> Result<GeneralEvaluationDomain<F>, ReductionError>;

    /// Computes the quotient-polynomial scalar vector for a satisfying
    /// assignment, in `O(n log n)` field operations.
    fn witness_map_from_matrices<F: PrimeField>(
        matrices: &ConstraintMatrices<F>,
        public_inputs: &[F],
        private_witness: &[F],
    ) -> Result<Vec<F>, ReductionError>;

    /// Evaluates the QAP polynomials of the circuit at `t`.
    ///
    /// The domain also carries one slot per instance variable past the real
    /// constraints; those rows bind the public inputs into the A polynomial
    /// and are accounted for here exactly as the witness map fills them.
    fn instance_map_with_evaluation<F: PrimeField>(
        matrices: &ConstraintMatrices<F>,
        t: &F,
    ) -> Result<QapInstance<F>, ReductionError> {
        let num_instance = matrices.num_instance_variables;
        let domain =
            Self::evaluation_domain::<F>(matrices.num_constraints + num_instance)?;
        let domain_size = domain.size();
        let zt = domain.evaluate_vanishing_polynomial(*t);
        let lagrange = domain.evaluate_all_lagrange_coefficients(*t);

        let num_variables = num_instance + matrices.num_witness_variables;
        let mut a = vec![F::zero(); num_variables];
        let mut b = vec![F::zero(); num_variables];
        let mut c = vec![F::zero(); num_variables];

        a[..num_instance].copy_from_slice(
            &lagrange[matrices.num_constraints..matrices.num_constraints + num_instance],
        );

        for (row, lagrange_at_t) in lagrange.iter().enumerate().take(matrices.num_constraints) {
            for (coeff, index) in &matrices.a[row] {
                a[*index] += *lagrange_at_t * coeff;
            }
            for (coeff, index) in &matrices.b[row] {
                b[*index] += *lagrange_at_t * coeff;
            }
            // matrices recovered from a proving-key artifact carry no C rows
            for (coeff, index) in matrices.c.get(row).map(Vec::as_slice).unwrap_or_default() {
                c[*index] += *lagrange_at_t * coeff;
            }
        }

        Ok(QapInstance {
            a,
            b,
            c,
            zt,
            domain_size,
        })
    }

    /// The scalars the setup multiplies into G1 to obtain the `h_query`
    /// table consumed by this reduction's witness map.
    fn h_query_scalars<F: PrimeField + FftField>(
        domain_size: usize,
        t: F,
        zt: F,
        delta_inverse: F,
    ) -> Result<Vec<F>, ReductionError>;
}

/// The witness map used by snarkjs.
///
/// Instead of dividing by the vanishing polynomial, snarkjs evaluates
/// `A·B − C` on the odd powers of a `2n`-th root of unity (where it never
/// vanishes) and pairs those evaluations with key bases that already carry
/// the matching Lagrange factors. The domain generator is replaced by the
/// one ffjavascript derives from the smallest quadratic non-residue, since
/// the key's basis order depends on it.
pub struct CircomReduction;

impl R1CSToQAP for CircomReduction {
    fn evaluation_domain<F: PrimeField + FftField>(
        num_coeffs: usize,
    ) -> Result<GeneralEvaluationDomain<F>, ReductionError> {
        let mut domain = GeneralEvaluationDomain::<F>::new(num_coeffs)
            .ok_or(ReductionError::DomainTooLarge(num_coeffs))?;
        let pow = domain.log_size_of_group() as usize;
        root_of_unity_for_groth16(pow, &mut domain);
        Ok(domain)
    }

    #[instrument(level = "debug", name = "witness map from matrices", skip_all)]
    fn witness_map_from_matrices<F: PrimeField>(
        matrices: &ConstraintMatrices<F>,
        public_inputs: &[F],
        private_witness: &[F],
    ) -> Result<Vec<F>, ReductionError> {
        let num_constraints = matrices.num_constraints;
        let num_inputs = matrices.num_instance_variables;
        let num_coeffs = num_constraints + num_inputs;
        let mut domain = GeneralEvaluationDomain::<F>::new(num_coeffs)
            .ok_or(ReductionError::DomainTooLarge(num_coeffs))?;
        let domain_size = domain.size();
        let power = domain.log_size_of_group() as usize;

        let eval_constraint_span =
            tracing::debug_span!("evaluate constraints + root of unity computation").entered();
        let (roots_to_power_domain, a, b) = rayon_join!(
            || {
                let root_of_unity_span =
                    tracing::debug_span!("root of unity computation").entered();
                let root_of_unity = root_of_unity_for_groth16(power, &mut domain);
                let mut roots = Vec::with_capacity(domain_size);
                let mut current = F::one();
                for _ in 0..domain_size {
                    roots.push(current);
                    current *= root_of_unity;
                }
                root_of_unity_span.exit();
                roots
            },
            || {
                let span = tracing::debug_span!("evaluate constraints - a").entered();
                let mut result = evaluate_matrix(
                    domain_size,
                    &matrices.a,
                    public_inputs,
                    private_witness,
                );
                result[num_constraints..num_constraints + num_inputs]
                    .copy_from_slice(public_inputs);
                span.exit();
                result
            },
            || {
                let span = tracing::debug_span!("evaluate constraints - b").entered();
                let result = evaluate_matrix(
                    domain_size,
                    &matrices.b,
                    public_inputs,
                    private_witness,
                );
                span.exit();
                result
            }
        );
        eval_constraint_span.exit();

        let mut a_shifted = a.clone();
        let mut b_shifted = b.clone();
        let ((a_shifted, b_shifted), c_shifted) = rayon::join(
            || {
                rayon::join(
                    || {
                        let span =
                            tracing::debug_span!("a: distribute powers (ifft/fft)").entered();
                        domain.ifft_in_place(&mut a_shifted);
                        distribute_powers(&mut a_shifted, &roots_to_power_domain);
                        domain.fft_in_place(&mut a_shifted);
                        span.exit();
                        a_shifted
                    },
                    || {
                        let span =
                            tracing::debug_span!("b: distribute powers (ifft/fft)").entered();
                        domain.ifft_in_place(&mut b_shifted);
                        distribute_powers(&mut b_shifted, &roots_to_power_domain);
                        domain.fft_in_place(&mut b_shifted);
                        span.exit();
                        b_shifted
                    },
                )
            },
            || {
                let span = tracing::debug_span!("c: pointwise product").entered();
                let mut ab = pointwise_product(a, b);
                span.exit();
                let span = tracing::debug_span!("c: distribute powers (ifft/fft)").entered();
                domain.ifft_in_place(&mut ab);
                distribute_powers(&mut ab, &roots_to_power_domain);
                domain.fft_in_place(&mut ab);
                span.exit();
                ab
            },
        );

        let span = tracing::debug_span!("compute ab - c").entered();
        let mut ab = pointwise_product(a_shifted, b_shifted);
        ab.par_iter_mut()
            .zip_eq(c_shifted.par_iter())
            .with_min_len(512)
            .for_each(|(ab_i, c_i)| {
                *ab_i -= c_i;
            });
        span.exit();

        Ok(ab)
    }

    /// Lagrange coefficients of the doubled domain at `t`, odd indices only,
    /// scaled by `1/δ`: the prover's evaluations of `A·B − C` at the odd
    /// `2n`-th roots sum against these bases to `(H·Z)(τ)/δ`.
    fn h_query_scalars<F: PrimeField + FftField>(
        domain_size: usize,
        t: F,
        _zt: F,
        delta_inverse: F,
    ) -> Result<Vec<F>, ReductionError> {
        let (_, roots) = roots_of_unity::<F>();
        let pow = domain_size.ilog2() as usize;
        if pow + 1 >= roots.len() {
            return Err(ReductionError::DomainTooLarge(2 * domain_size));
        }
        let w = roots[pow + 1];

        let double_size = F::from(2 * domain_size as u64);
        let m_at_t = t.pow([2 * domain_size as u64]) - F::one();
        let scale = m_at_t
            * double_size.inverse().expect("domain size is invertible")
            * delta_inverse;

        // odd powers w^(2i + 1) and the denominators (t - w^(2i + 1))
        let w_square = w.square();
        let mut points = Vec::with_capacity(domain_size);
        let mut denominators = Vec::with_capacity(domain_size);
        let mut current = w;
        for _ in 0..domain_size {
            points.push(current);
            denominators.push(t - current);
            current *= w_square;
        }
        batch_inversion(&mut denominators);

        Ok(points
            .into_par_iter()
            .zip_eq(denominators)
            .map(|(point, denominator)| scale * point * denominator)
            .collect())
    }
}

/// The witness map used by libsnark and arkworks: evaluate `A·B − C` over a
/// multiplicative coset, divide by the vanishing polynomial (a constant on
/// the coset) and interpolate the quotient's coefficients.
pub struct LibSnarkReduction;

impl R1CSToQAP for LibSnarkReduction {
    fn evaluation_domain<F: PrimeField + FftField>(
        num_coeffs: usize,
    ) -> Result<GeneralEvaluationDomain<F>, ReductionError> {
        GeneralEvaluationDomain::<F>::new(num_coeffs)
            .ok_or(ReductionError::DomainTooLarge(num_coeffs))
    }

    #[instrument(level = "debug", name = "witness map from matrices", skip_all)]
    fn witness_map_from_matrices<F: PrimeField>(
        matrices: &ConstraintMatrices<F>,
        public_inputs: &[F],
        private_witness: &[F],
    ) -> Result<Vec<F>, ReductionError> {
        let num_constraints = matrices.num_constraints;
        let num_inputs = matrices.num_instance_variables;
        let num_coeffs = num_constraints + num_inputs;
        let domain = GeneralEvaluationDomain::<F>::new(num_coeffs)
            .ok_or(ReductionError::DomainTooLarge(num_coeffs))?;
        let domain_size = domain.size();
        let coset_domain = domain
            .get_coset(F::GENERATOR)
            .expect("coset by the multiplicative generator exists");

        let (mut ab, c) = rayon::join(
            || {
                let (a, b) = rayon::join(
                    || {
                        let mut a = evaluate_matrix(
                            domain_size,
                            &matrices.a,
                            public_inputs,
                            private_witness,
                        );
                        a[num_constraints..num_constraints + num_inputs]
                            .copy_from_slice(public_inputs);
                        domain.ifft_in_place(&mut a);
                        coset_domain.fft_in_place(&mut a);
                        a
                    },
                    || {
                        let mut b = evaluate_matrix(
                            domain_size,
                            &matrices.b,
                            public_inputs,
                            private_witness,
                        );
                        domain.ifft_in_place(&mut b);
                        coset_domain.fft_in_place(&mut b);
                        b
                    },
                );
                pointwise_product(a, b)
            },
            || {
                let mut c = evaluate_matrix(
                    domain_size,
                    &matrices.c,
                    public_inputs,
                    private_witness,
                );
                domain.ifft_in_place(&mut c);
                coset_domain.fft_in_place(&mut c);
                c
            },
        );

        let vanishing_inverse = domain
            .evaluate_vanishing_polynomial(F::GENERATOR)
            .inverse()
            .expect("the vanishing polynomial has no root outside the domain");

        ab.par_iter_mut()
            .zip_eq(c.par_iter())
            .with_min_len(512)
            .for_each(|(ab_i, c_i)| {
                *ab_i -= c_i;
                *ab_i *= vanishing_inverse;
            });

        coset_domain.ifft_in_place(&mut ab);

        Ok(ab)
    }

    fn h_query_scalars<F: PrimeField + FftField>(
        domain_size: usize,
        t: F,
        zt: F,
        delta_inverse: F,
    ) -> Result<Vec<F>, ReductionError> {
        Ok((0..domain_size - 1)
            .into_par_iter()
            .map(|i| zt * delta_inverse * t.pow([i as u64]))
            .collect())
    }
}

/// Evaluates one sparse constraint row against the split assignment.
pub(crate) fn evaluate_constraint<F: PrimeField>(
    row: &[(F, usize)],
    public_inputs: &[F],
    private_witness: &[F],
) -> F {
    let mut acc = F::zero();
    for (coeff, index) in row {
        if *index < public_inputs.len() {
            acc += *coeff * public_inputs[*index];
        } else {
            acc += *coeff * private_witness[*index - public_inputs.len()];
        }
    }
    acc
}

/// Evaluates every row of a sparse matrix, zero-padded to the domain size.
fn evaluate_matrix<F: PrimeField>(
    domain_size: usize,
    matrix: &Matrix<F>,
    public_inputs: &[F],
    private_witness: &[F],
) -> Vec<F> {
    let mut result = matrix
        .par_iter()
        .with_min_len(256)
        .map(|row| evaluate_constraint(row, public_inputs, private_witness))
        .collect::<Vec<_>>();
    result.resize(domain_size, F::zero());
    result
}

/// Index of the first constraint the assignment violates, if any.
pub(crate) fn first_unsatisfied_constraint<F: PrimeField>(
    matrices: &ConstraintMatrices<F>,
    public_inputs: &[F],
    private_witness: &[F],
) -> Option<usize> {
    (0..matrices.num_constraints)
        .into_par_iter()
        .find_first(|&row| {
            let a = evaluate_constraint(&matrices.a[row], public_inputs, private_witness);
            let b = evaluate_constraint(&matrices.b[row], public_inputs, private_witness);
            let c = matrices
                .c
                .get(row)
                .map(|terms| evaluate_constraint(terms, public_inputs, private_witness))
                .unwrap_or_default();
            a * b != c
        })
}

fn pointwise_product<F: PrimeField>(a: Vec<F>, b: Vec<F>) -> Vec<F> {
    a.into_par_iter()
        .zip_eq(b)
        .with_min_len(512)
        .map(|(a_i, b_i)| a_i * b_i)
        .collect()
}

fn distribute_powers<F: PrimeField>(coefficients: &mut [F], roots: &[F]) {
    coefficients
        .par_iter_mut()
        .zip_eq(roots.par_iter())
        .with_min_len(512)
        .for_each(|(coefficient, root)| {
            *coefficient *= root;
        });
}

#[cfg(test)]
mod tests {
    use super::{CircomReduction, LibSnarkReduction, R1CSToQAP};
    use ark_bn254::Fr;
    use ark_ff::{UniformRand, Zero};
    use ark_poly::{EvaluationDomain, GeneralEvaluationDomain};
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    fn interpolation_round_trip(domain: GeneralEvaluationDomain<Fr>, rng: &mut ChaCha12Rng) {
        let evaluations = (0..domain.size())
            .map(|_| Fr::rand(rng))
            .collect::<Vec<_>>();
        let coefficients = domain.ifft(&evaluations);
        assert_eq!(domain.fft(&coefficients), evaluations);
    }

    #[test]
    fn fft_round_trip_all_small_sizes() {
        let mut rng = ChaCha12Rng::seed_from_u64(0);
        for log_size in 1..=10 {
            let size = 1usize << log_size;
            interpolation_round_trip(
                LibSnarkReduction::evaluation_domain::<Fr>(size).unwrap(),
                &mut rng,
            );
            // the snarkjs generator replacement must not break the pairing
            // of forward and inverse transforms
            interpolation_round_trip(
                CircomReduction::evaluation_domain::<Fr>(size).unwrap(),
                &mut rng,
            );
        }
    }

    #[test]
    fn fft_round_trip_stress() {
        let mut rng = ChaCha12Rng::seed_from_u64(1);
        interpolation_round_trip(
            CircomReduction::evaluation_domain::<Fr>(1 << 16).unwrap(),
            &mut rng,
        );
    }

    #[test]
    fn quotient_vector_shape_for_a_satisfied_system() {
        let matrices = ark_relations::r1cs::ConstraintMatrices::<Fr> {
            num_instance_variables: 2,
            num_witness_variables: 2,
            num_constraints: 1,
            a_num_non_zero: 1,
            b_num_non_zero: 1,
            c_num_non_zero: 1,
            a: vec![vec![(Fr::from(1u64), 2)]],
            b: vec![vec![(Fr::from(1u64), 3)]],
            c: vec![vec![(Fr::from(1u64), 1)]],
        };
        let public_inputs = [Fr::from(1u64), Fr::from(33u64)];
        let private_witness = [Fr::from(3u64), Fr::from(11u64)];

        let h = LibSnarkReduction::witness_map_from_matrices(
            &matrices,
            &public_inputs,
            &private_witness,
        )
        .unwrap();
        // quotient of a satisfied system has low degree: the top coefficient
        // the generator's basis omits must be zero
        assert!(h.last().unwrap().is_zero());

        let circom_h = CircomReduction::witness_map_from_matrices(
            &matrices,
            &public_inputs,
            &private_witness,
        )
        .unwrap();
        assert_eq!(circom_h.len(), h.len());
    }
}
