//! Groth16-specific artifacts: the proving-key file and the JSON types for
//! proofs, verification keys and public inputs.

mod proof;
mod public_input;
mod verification_key;
mod zkey;

pub use proof::JsonProof;
pub use public_input::JsonPublicInput;
pub use verification_key::JsonVerificationKey;
pub use zkey::ZKey;
