//! Proof generation.

use ark_ec::pairing::Pairing;
use ark_ec::scalar_mul::variable_base::VariableBaseMSM;
use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::UniformRand;
use ark_relations::r1cs::ConstraintMatrices;
use thiserror::Error;
use tracing::instrument;

use crate::data_structures::{FullAssignment, KeyError, Proof, ProvingKey};
use crate::reduction::{R1CSToQAP, ReductionError, first_unsatisfied_constraint};
use crate::Groth16;

/// Errors of proof generation. A failed call emits no partial proof.
#[derive(Debug, Error)]
pub enum ProofError {
    /// The assignment does not satisfy the constraint system.
    #[error("witness does not satisfy constraint {0} of the constraint system")]
    InvalidWitness(usize),
    /// The instance part of the assignment has the wrong length for the
    /// constraint system.
    #[error("expected {expected} public inputs (including the constant one), but got {actual}")]
    PublicInputCount {
        /// Instance variables the constraint system declares.
        expected: usize,
        /// Instance values supplied by the caller.
        actual: usize,
    },
    /// The private part of the assignment has the wrong length for the
    /// constraint system.
    #[error("expected {expected} private witness values, but got {actual}")]
    WitnessLength {
        /// Witness variables the constraint system declares.
        expected: usize,
        /// Witness values supplied by the caller.
        actual: usize,
    },
    /// The proving key does not belong to this constraint system.
    #[error(transparent)]
    Key(#[from] KeyError),
    /// The QAP reduction failed.
    #[error(transparent)]
    Reduction(#[from] ReductionError),
}

impl<P: Pairing, R: R1CSToQAP> Groth16<P, R> {
    /// Creates a proof, drawing the two blinding scalars from the thread's
    /// cryptographically secure generator. Two calls with identical inputs
    /// yield different (but equally valid) proofs.
    pub fn prove(
        pk: &ProvingKey<P>,
        matrices: &ConstraintMatrices<P::ScalarField>,
        assignment: FullAssignment<P::ScalarField>,
    ) -> Result<Proof<P>, ProofError> {
        let mut rng = rand::thread_rng();
        let r = P::ScalarField::rand(&mut rng);
        let s = P::ScalarField::rand(&mut rng);
        Self::prove_with_randomness(pk, matrices, assignment, r, s)
    }

    /// Creates a proof with caller-chosen blinding scalars `r` and `s`.
    ///
    /// The assignment is consumed; nothing derived from the private witness
    /// outlives this call except the proof itself.
    #[instrument(level = "debug", name = "Groth16 - Proof", skip_all)]
    pub fn prove_with_randomness(
        pk: &ProvingKey<P>,
        matrices: &ConstraintMatrices<P::ScalarField>,
        assignment: FullAssignment<P::ScalarField>,
        r: P::ScalarField,
        s: P::ScalarField,
    ) -> Result<Proof<P>, ProofError> {
        if assignment.public_inputs.len() != matrices.num_instance_variables {
            return Err(ProofError::PublicInputCount {
                expected: matrices.num_instance_variables,
                actual: assignment.public_inputs.len(),
            });
        }
        if assignment.witness.len() != matrices.num_witness_variables {
            return Err(ProofError::WitnessLength {
                expected: matrices.num_witness_variables,
                actual: assignment.witness.len(),
            });
        }
        pk.validate(matrices)?;

        if matrices.c.is_empty() && matrices.c_num_non_zero == 0 {
            // matrices recovered from a circom proving key carry no C
            // section, so there is nothing to check against here
            tracing::debug!("constraint system has no C matrix, skipping satisfiability check");
        } else if let Some(row) = first_unsatisfied_constraint(
            matrices,
            &assignment.public_inputs,
            &assignment.witness,
        ) {
            return Err(ProofError::InvalidWitness(row));
        }

        let h = R::witness_map_from_matrices(
            matrices,
            &assignment.public_inputs,
            &assignment.witness,
        )?;

        Ok(Self::create_proof_with_assignment(
            pk,
            r,
            s,
            &h,
            &assignment.public_inputs,
            &assignment.witness,
        ))
    }

    #[instrument(level = "debug", name = "create proof with assignment", skip_all)]
    fn create_proof_with_assignment(
        pk: &ProvingKey<P>,
        r: P::ScalarField,
        s: P::ScalarField,
        h: &[P::ScalarField],
        input_assignment: &[P::ScalarField],
        aux_assignment: &[P::ScalarField],
    ) -> Proof<P> {
        let delta_g1 = pk.delta_g1.into_group();
        // the constant-one column is handled inside calculate_coeff
        let inputs = &input_assignment[1..];

        let ((g_a, g1_b), (g2_b, (l_aux_acc, h_acc))) = rayon::join(
            || {
                rayon::join(
                    || {
                        let span = tracing::debug_span!("compute A").entered();
                        let r_g1 = delta_g1 * r;
                        let g_a = Self::calculate_coeff(
                            r_g1,
                            &pk.a_query,
                            pk.vk.alpha_g1,
                            inputs,
                            aux_assignment,
                        );
                        span.exit();
                        g_a
                    },
                    || {
                        let span = tracing::debug_span!("compute B in G1").entered();
                        let s_g1 = delta_g1 * s;
                        let g1_b = Self::calculate_coeff(
                            s_g1,
                            &pk.b_g1_query,
                            pk.beta_g1,
                            inputs,
                            aux_assignment,
                        );
                        span.exit();
                        g1_b
                    },
                )
            },
            || {
                rayon::join(
                    || {
                        let span = tracing::debug_span!("compute B in G2").entered();
                        let s_g2 = pk.vk.delta_g2.into_group() * s;
                        let g2_b = Self::calculate_coeff(
                            s_g2,
                            &pk.b_g2_query,
                            pk.vk.beta_g2,
                            inputs,
                            aux_assignment,
                        );
                        span.exit();
                        g2_b
                    },
                    || {
                        rayon::join(
                            || {
                                let span = tracing::debug_span!("msm l_query").entered();
                                let acc = P::G1::msm_unchecked(&pk.l_query, aux_assignment);
                                span.exit();
                                acc
                            },
                            || {
                                let span = tracing::debug_span!("msm h_query").entered();
                                let acc = P::G1::msm_unchecked(&pk.h_query, h);
                                span.exit();
                                acc
                            },
                        )
                    },
                )
            },
        );

        let s_g_a = g_a * s;
        let r_g1_b = g1_b * r;
        let r_s_delta_g1 = delta_g1 * (r * s);

        let mut g_c = s_g_a;
        g_c += r_g1_b;
        g_c -= r_s_delta_g1;
        g_c += l_aux_acc;
        g_c += h_acc;

        Proof {
            a: g_a.into_affine(),
            b: g2_b.into_affine(),
            c: g_c.into_affine(),
        }
    }

    fn calculate_coeff<C>(
        initial: C,
        query: &[C::Affine],
        vk_param: C::Affine,
        input_assignment: &[P::ScalarField],
        aux_assignment: &[P::ScalarField],
    ) -> C
    where
        C: CurveGroup<ScalarField = P::ScalarField>,
    {
        let pub_len = input_assignment.len();
        let (aux_acc, pub_acc) = rayon::join(
            || C::msm_unchecked(&query[1 + pub_len..], aux_assignment),
            || C::msm_unchecked(&query[1..=pub_len], input_assignment),
        );

        let mut res = initial;
        res += query[0].into_group();
        res += vk_param.into_group();
        res += pub_acc;
        res += aux_acc;
        res
    }
}
