//! Key, proof and witness-assignment types.

use ark_ec::pairing::Pairing;
use ark_ff::PrimeField;
use ark_poly::{EvaluationDomain, Radix2EvaluationDomain};
use ark_relations::r1cs::ConstraintMatrices;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use thiserror::Error;

/// A Groth16 proof: exactly three curve points, in fixed order.
///
/// The derived [`CanonicalSerialize`] encoding is the wire format: `a`, `b`,
/// `c` back to back, each in the curve's fixed-width (compressed or
/// uncompressed) point encoding. Deserialization validates that every point
/// lies on the curve and in the prime-order subgroup.
#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct Proof<P: Pairing> {
    /// First proof element, in G1.
    pub a: P::G1Affine,
    /// Second proof element, in G2.
    pub b: P::G2Affine,
    /// Third proof element, in G1.
    pub c: P::G1Affine,
}

/// The verification key: four fixed curve points plus one G1 point per
/// public input (and one for the constant).
#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct VerifyingKey<P: Pairing> {
    /// `[α]₁`.
    pub alpha_g1: P::G1Affine,
    /// `[β]₂`.
    pub beta_g2: P::G2Affine,
    /// `[γ]₂`.
    pub gamma_g2: P::G2Affine,
    /// `[δ]₂`.
    pub delta_g2: P::G2Affine,
    /// `[(β·u_i(τ) + α·v_i(τ) + w_i(τ)) / γ]₁` for every instance variable,
    /// the constant one included.
    pub gamma_abc_g1: Vec<P::G1Affine>,
}

/// A verification key with the pairing-independent parts of the check
/// precomputed.
#[derive(Clone, Debug)]
pub struct PreparedVerifyingKey<P: Pairing> {
    /// The plain verification key.
    pub vk: VerifyingKey<P>,
    /// `e(α, β)`, the right-hand side of the pairing equation.
    pub alpha_g1_beta_g2: P::TargetField,
    /// `-γ₂`, prepared for the Miller loop.
    pub gamma_g2_neg_pc: P::G2Prepared,
    /// `-δ₂`, prepared for the Miller loop.
    pub delta_g2_neg_pc: P::G2Prepared,
}

/// The proving key: the verification key plus the per-variable point tables
/// produced by the setup.
///
/// Keys carry no witness material. The setup randomness they were derived
/// from is not recoverable from the tables and must never be logged or
/// exposed by code holding a key.
#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct ProvingKey<P: Pairing> {
    /// The embedded verification key.
    pub vk: VerifyingKey<P>,
    /// `[β]₁`.
    pub beta_g1: P::G1Affine,
    /// `[δ]₁`.
    pub delta_g1: P::G1Affine,
    /// `[u_i(τ)]₁` for every variable.
    pub a_query: Vec<P::G1Affine>,
    /// `[v_i(τ)]₁` for every variable.
    pub b_g1_query: Vec<P::G1Affine>,
    /// `[v_i(τ)]₂` for every variable.
    pub b_g2_query: Vec<P::G2Affine>,
    /// The quotient-polynomial basis, one entry per evaluation-domain slot.
    pub h_query: Vec<P::G1Affine>,
    /// `[(β·u_i(τ) + α·v_i(τ) + w_i(τ)) / δ]₁` for every private variable.
    pub l_query: Vec<P::G1Affine>,
}

/// Structural mismatch between a proving key and a constraint system.
#[derive(Debug, Error)]
pub enum KeyError {
    /// A key table does not have one entry per circuit variable (or domain
    /// slot) of the paired constraint system.
    #[error(
        "proving key table `{table}` has {actual} entries, expected {expected} for this constraint system"
    )]
    TableSize {
        /// Name of the offending table.
        table: &'static str,
        /// Entry count required by the constraint system.
        expected: usize,
        /// Entry count found in the key.
        actual: usize,
    },
    /// The constraint system needs an evaluation domain larger than the
    /// curve's two-adic subgroup supports.
    #[error("constraint system too large for the curve's two-adic evaluation domain")]
    DomainTooLarge,
}

impl<P: Pairing> ProvingKey<P> {
    /// Checks that every table has the size the given constraint system
    /// requires. Called by the prover before any proof work starts; loading
    /// code can call it directly after pairing a key with an R1CS artifact.
    pub fn validate(
        &self,
        matrices: &ConstraintMatrices<P::ScalarField>,
    ) -> Result<(), KeyError> {
        let num_instance = matrices.num_instance_variables;
        let num_witness = matrices.num_witness_variables;
        let num_variables = num_instance + num_witness;
        let domain_size = Radix2EvaluationDomain::<P::ScalarField>::compute_size_of_domain(
            matrices.num_constraints + num_instance,
        )
        .ok_or(KeyError::DomainTooLarge)?;

        let expectations = [
            ("a_query", self.a_query.len(), num_variables),
            ("b_g1_query", self.b_g1_query.len(), num_variables),
            ("b_g2_query", self.b_g2_query.len(), num_variables),
            ("l_query", self.l_query.len(), num_witness),
            ("gamma_abc_g1", self.vk.gamma_abc_g1.len(), num_instance),
        ];
        for (table, actual, expected) in expectations {
            if actual != expected {
                return Err(KeyError::TableSize {
                    table,
                    expected,
                    actual,
                });
            }
        }
        // the libsnark-style basis omits the top (always zero) coefficient
        if self.h_query.len() + 1 < domain_size {
            return Err(KeyError::TableSize {
                table: "h_query",
                expected: domain_size,
                actual: self.h_query.len(),
            });
        }
        Ok(())
    }
}

/// The full variable assignment for one proving request.
///
/// `public_inputs[0]` is the constant one. The assignment is taken by value
/// by the prover and dropped when the call returns; it must not be reused
/// across calls, since the blinding randomness differs each time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FullAssignment<F: PrimeField> {
    /// The instance part: the constant one followed by the public inputs.
    pub public_inputs: Vec<F>,
    /// The private witness part.
    pub witness: Vec<F>,
}

impl<F: PrimeField> FullAssignment<F> {
    /// Splits a flat witness vector (constant one first, then public, then
    /// private values) at the instance-variable boundary.
    pub fn from_flat(values: Vec<F>, num_instance_variables: usize) -> Self {
        let mut public_inputs = values;
        let witness = public_inputs.split_off(num_instance_variables);
        Self {
            public_inputs,
            witness,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FullAssignment;
    use ark_bn254::Fr;

    #[test]
    fn flat_split_keeps_the_constant_in_the_instance_part() {
        let values = vec![Fr::from(1u64), Fr::from(33u64), Fr::from(3u64), Fr::from(11u64)];
        let assignment = FullAssignment::from_flat(values, 2);
        assert_eq!(
            assignment.public_inputs,
            vec![Fr::from(1u64), Fr::from(33u64)]
        );
        assert_eq!(assignment.witness, vec![Fr::from(3u64), Fr::from(11u64)]);
    }
}
