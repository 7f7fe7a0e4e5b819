//! A Groth16 proving and verification engine over circom-style constraint systems.
//!
//! The prover consumes a [`ProvingKey`], the sparse constraint matrices of the
//! circuit and a full variable assignment, and produces a three-point
//! [`Proof`]. The verifier consumes a [`VerifyingKey`], the public inputs and
//! a proof, and answers with a boolean. Both are stateless; every invocation
//! is independent and side-effect free.
//!
//! The R1CS-to-QAP reduction is pluggable through [`R1CSToQAP`]. The default
//! [`CircomReduction`] matches the witness map used by snarkjs, so proving
//! keys produced by the circom toolchain work unchanged; [`LibSnarkReduction`]
//! implements the coset-quotient map used by libsnark and arkworks.
#![warn(missing_docs)]

mod data_structures;
mod prover;
mod reduction;
mod setup;
mod verifier;
pub mod utils;

pub use data_structures::{
    FullAssignment, KeyError, PreparedVerifyingKey, Proof, ProvingKey, VerifyingKey,
};
pub use prover::ProofError;
pub use reduction::{CircomReduction, LibSnarkReduction, QapInstance, R1CSToQAP, ReductionError};
pub use setup::SetupError;
pub use verifier::{VerificationError, prepare_verifying_key};

pub use ark_relations::r1cs::ConstraintMatrices;

use ark_ec::pairing::Pairing;
use std::marker::PhantomData;

/// The Groth16 protocol, instantiated for a pairing-friendly curve and an
/// R1CS-to-QAP reduction.
///
/// All operations are associated functions; the type itself carries no state.
/// Keys and matrices are read-only after construction and may be shared
/// across concurrent proving calls, while a [`FullAssignment`] belongs to
/// exactly one call.
pub struct Groth16<P: Pairing, R: R1CSToQAP = CircomReduction> {
    phantom_pairing: PhantomData<P>,
    phantom_reduction: PhantomData<R>,
}
