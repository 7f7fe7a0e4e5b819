//! Single-party parameter generation.
//!
//! This is the key generator a trusted party (or a test) runs per circuit.
//! The sampled exponents `α, β, γ, δ, τ` are the toxic waste: they exist
//! only on this call's stack and must never be persisted.

use ark_ec::CurveGroup;
use ark_ec::pairing::Pairing;
use ark_ec::scalar_mul::BatchMulPreprocessing;
use ark_ff::{Field, UniformRand};
use ark_poly::EvaluationDomain;
use ark_relations::r1cs::ConstraintMatrices;
use ark_std::rand::Rng;
use rayon::prelude::*;
use thiserror::Error;
use tracing::instrument;

use crate::Groth16;
use crate::data_structures::{ProvingKey, VerifyingKey};
use crate::reduction::{R1CSToQAP, ReductionError};

/// Errors of parameter generation.
#[derive(Debug, Error)]
pub enum SetupError {
    /// A sampled toxic-waste element is zero and cannot be inverted.
    #[error("a toxic-waste element is zero and cannot be inverted")]
    NonInvertibleElement,
    /// The QAP reduction failed.
    #[error(transparent)]
    Reduction(#[from] ReductionError),
}

impl<P: Pairing, R: R1CSToQAP> Groth16<P, R> {
    /// Generates a proving key (with embedded verification key) for the
    /// given constraint system, sampling all toxic waste from `rng`.
    pub fn generate_random_parameters_with_matrices(
        matrices: &ConstraintMatrices<P::ScalarField>,
        rng: &mut impl Rng,
    ) -> Result<ProvingKey<P>, SetupError> {
        let alpha = P::ScalarField::rand(rng);
        let beta = P::ScalarField::rand(rng);
        let gamma = P::ScalarField::rand(rng);
        let delta = P::ScalarField::rand(rng);
        let g1_generator = P::G1::rand(rng);
        let g2_generator = P::G2::rand(rng);

        Self::generate_parameters_with_matrices(
            matrices,
            alpha,
            beta,
            gamma,
            delta,
            g1_generator,
            g2_generator,
            rng,
        )
    }

    /// Generates parameters from caller-chosen toxic waste and group
    /// generators.
    #[allow(clippy::too_many_arguments)]
    #[instrument(level = "debug", name = "Groth16 - Setup", skip_all)]
    pub fn generate_parameters_with_matrices(
        matrices: &ConstraintMatrices<P::ScalarField>,
        alpha: P::ScalarField,
        beta: P::ScalarField,
        gamma: P::ScalarField,
        delta: P::ScalarField,
        g1_generator: P::G1,
        g2_generator: P::G2,
        rng: &mut impl Rng,
    ) -> Result<ProvingKey<P>, SetupError> {
        let num_instance = matrices.num_instance_variables;
        let domain =
            R::evaluation_domain::<P::ScalarField>(matrices.num_constraints + num_instance)?;
        let t = domain.sample_element_outside_domain(rng);

        let span = tracing::debug_span!("instance map with evaluation").entered();
        let qap = R::instance_map_with_evaluation(matrices, &t)?;
        span.exit();

        let gamma_inverse = gamma.inverse().ok_or(SetupError::NonInvertibleElement)?;
        let delta_inverse = delta.inverse().ok_or(SetupError::NonInvertibleElement)?;

        let span = tracing::debug_span!("gamma_abc and l query scalars").entered();
        let gamma_abc = qap.a[..num_instance]
            .par_iter()
            .zip(&qap.b[..num_instance])
            .zip(&qap.c[..num_instance])
            .map(|((a, b), c)| (beta * a + alpha * b + c) * gamma_inverse)
            .collect::<Vec<_>>();
        let l = qap.a[num_instance..]
            .par_iter()
            .zip(&qap.b[num_instance..])
            .zip(&qap.c[num_instance..])
            .map(|((a, b), c)| (beta * a + alpha * b + c) * delta_inverse)
            .collect::<Vec<_>>();
        span.exit();

        let h_scalars = R::h_query_scalars(qap.domain_size, t, qap.zt, delta_inverse)?;

        let span = tracing::debug_span!("batch scalar multiplications").entered();
        let num_g1_scalars =
            2 * qap.a.len() + h_scalars.len() + l.len() + gamma_abc.len();
        let g1_table = BatchMulPreprocessing::new(g1_generator, num_g1_scalars);
        let g2_table = BatchMulPreprocessing::new(g2_generator, qap.b.len());

        let a_query = g1_table.batch_mul(&qap.a);
        let b_g1_query = g1_table.batch_mul(&qap.b);
        let b_g2_query = g2_table.batch_mul(&qap.b);
        let h_query = g1_table.batch_mul(&h_scalars);
        let l_query = g1_table.batch_mul(&l);
        let gamma_abc_g1 = g1_table.batch_mul(&gamma_abc);
        span.exit();

        let vk = VerifyingKey::<P> {
            alpha_g1: (g1_generator * alpha).into_affine(),
            beta_g2: (g2_generator * beta).into_affine(),
            gamma_g2: (g2_generator * gamma).into_affine(),
            delta_g2: (g2_generator * delta).into_affine(),
            gamma_abc_g1,
        };

        Ok(ProvingKey {
            vk,
            beta_g1: (g1_generator * beta).into_affine(),
            delta_g1: (g1_generator * delta).into_affine(),
            a_query,
            b_g1_query,
            b_g2_query,
            h_query,
            l_query,
        })
    }
}
