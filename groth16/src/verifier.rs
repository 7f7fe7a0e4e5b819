//! Proof verification.
//!
//! The pairing-equation term layout follows the arkworks Groth16 reference:
//! `e(A, B) = e(α, β) · e(Σ x_i·γ_abc_i, γ) · e(C, δ)`, checked as a single
//! multi-Miller loop against the negated γ₂/δ₂ terms.

use ark_ec::pairing::Pairing;
use ark_ec::{AffineRepr, CurveGroup};
use core::ops::Neg;
use thiserror::Error;
use tracing::instrument;

use crate::Groth16;
use crate::data_structures::{PreparedVerifyingKey, Proof, VerifyingKey};
use crate::reduction::R1CSToQAP;

/// Errors of proof verification.
///
/// A well-formed proof that simply does not satisfy the pairing equation is
/// *not* an error: `verify_proof` answers `Ok(false)` for it.
#[derive(Debug, Error)]
pub enum VerificationError {
    /// The number of public inputs does not match the verification key.
    #[error("verification key expects {expected} public inputs, but got {actual}")]
    InputLengthMismatch {
        /// Inputs the verification key was generated for.
        expected: usize,
        /// Inputs supplied by the caller.
        actual: usize,
    },
    /// The Miller loop degenerated and the final exponentiation is
    /// undefined.
    #[error("pairing product could not be finalized")]
    UnexpectedIdentity,
}

/// Precomputes the input-independent parts of the pairing check.
pub fn prepare_verifying_key<P: Pairing>(vk: &VerifyingKey<P>) -> PreparedVerifyingKey<P> {
    PreparedVerifyingKey {
        vk: vk.clone(),
        alpha_g1_beta_g2: P::pairing(vk.alpha_g1, vk.beta_g2).0,
        gamma_g2_neg_pc: vk.gamma_g2.into_group().neg().into_affine().into(),
        delta_g2_neg_pc: vk.delta_g2.into_group().neg().into_affine().into(),
    }
}

impl<P: Pairing, R: R1CSToQAP> Groth16<P, R> {
    /// Folds the public inputs into the single G1 point the pairing check
    /// consumes. Fails if the input count does not match the key.
    pub fn prepare_inputs(
        pvk: &PreparedVerifyingKey<P>,
        public_inputs: &[P::ScalarField],
    ) -> Result<P::G1, VerificationError> {
        if public_inputs.len() + 1 != pvk.vk.gamma_abc_g1.len() {
            return Err(VerificationError::InputLengthMismatch {
                expected: pvk.vk.gamma_abc_g1.len() - 1,
                actual: public_inputs.len(),
            });
        }

        let mut g_ic = pvk.vk.gamma_abc_g1[0].into_group();
        for (input, base) in public_inputs.iter().zip(pvk.vk.gamma_abc_g1.iter().skip(1)) {
            g_ic += *base * *input;
        }
        Ok(g_ic)
    }

    /// Verifies a proof against a prepared verification key.
    #[instrument(level = "debug", name = "Groth16 - Verify", skip_all)]
    pub fn verify_proof(
        pvk: &PreparedVerifyingKey<P>,
        proof: &Proof<P>,
        public_inputs: &[P::ScalarField],
    ) -> Result<bool, VerificationError> {
        let prepared_inputs = Self::prepare_inputs(pvk, public_inputs)?;
        Self::verify_proof_with_prepared_inputs(pvk, proof, &prepared_inputs)
    }

    /// Verifies a proof against a prepared verification key and an already
    /// folded public-input point.
    pub fn verify_proof_with_prepared_inputs(
        pvk: &PreparedVerifyingKey<P>,
        proof: &Proof<P>,
        prepared_inputs: &P::G1,
    ) -> Result<bool, VerificationError> {
        let product = P::multi_miller_loop(
            [
                <P::G1Affine as Into<P::G1Prepared>>::into(proof.a),
                prepared_inputs.into_affine().into(),
                proof.c.into(),
            ],
            [
                proof.b.into(),
                pvk.gamma_g2_neg_pc.clone(),
                pvk.delta_g2_neg_pc.clone(),
            ],
        );
        let product =
            P::final_exponentiation(product).ok_or(VerificationError::UnexpectedIdentity)?;
        Ok(product.0 == pvk.alpha_g1_beta_g2)
    }

    /// Verifies a proof against an unprepared verification key.
    pub fn verify(
        vk: &VerifyingKey<P>,
        proof: &Proof<P>,
        public_inputs: &[P::ScalarField],
    ) -> Result<bool, VerificationError> {
        let pvk = prepare_verifying_key(vk);
        Self::verify_proof(&pvk, proof, public_inputs)
    }
}
