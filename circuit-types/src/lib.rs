//! Types for the artifacts the circom toolchain produces, and readers that
//! turn them into the [`groth16`] engine's key and constraint types.
//!
//! Binary artifacts (`.r1cs`, `.wtns`, `.zkey`) share one container layout:
//! a four-byte magic, a version, and a table of length-prefixed sections.
//! JSON artifacts (proofs, verification keys, public inputs) encode curve
//! points as projective coordinates in decimal strings.
#![warn(missing_docs)]

mod binfile;
mod error;
pub mod groth16;
mod r1cs;
pub mod traits;
mod witness;

pub use error::ParseError;
pub use r1cs::{Constraint, R1CS, SparseRow};
pub use witness::Witness;

pub(crate) mod reader_utils {
    use std::io::Read;

    use crate::ParseError;
    use crate::traits::{PairingBridge, PrimeFieldBridge};
    use ark_serialize::SerializationError;

    pub(crate) fn read_header<R: Read>(
        mut reader: R,
        expected: &str,
    ) -> Result<(), ParseError> {
        let mut buf = [0_u8; 4];
        reader.read_exact(&mut buf)?;
        let actual = std::str::from_utf8(&buf[..]).unwrap_or("<not utf-8>").to_owned();
        if actual == expected {
            Ok(())
        } else {
            Err(ParseError::WrongHeader {
                expected: expected.to_owned(),
                actual,
            })
        }
    }

    #[inline]
    pub(crate) fn read_g1_vector<P: PairingBridge, R: Read>(
        mut reader: R,
        num: usize,
    ) -> Result<Vec<P::G1Affine>, SerializationError>
    where
        P::BaseField: PrimeFieldBridge,
        P::ScalarField: PrimeFieldBridge,
    {
        (0..num).map(|_| P::g1_from_reader(&mut reader)).collect()
    }

    #[inline]
    pub(crate) fn read_g2_vector<P: PairingBridge, R: Read>(
        mut reader: R,
        num: usize,
    ) -> Result<Vec<P::G2Affine>, SerializationError>
    where
        P::BaseField: PrimeFieldBridge,
        P::ScalarField: PrimeFieldBridge,
    {
        (0..num).map(|_| P::g2_from_reader(&mut reader)).collect()
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    macro_rules! to_g1_bn254 {
        ($x: expr, $y: expr) => {
            <ark_bn254::Bn254 as ark_ec::pairing::Pairing>::G1Affine::new(
                ark_bn254::Fq::from_str($x).unwrap(),
                ark_bn254::Fq::from_str($y).unwrap(),
            )
        };
    }

    macro_rules! to_g2_bn254 {
        ({$x1: expr, $x2: expr}, {$y1: expr, $y2: expr}) => {
            <ark_bn254::Bn254 as ark_ec::pairing::Pairing>::G2Affine::new(
                ark_bn254::Fq2::new(
                    ark_bn254::Fq::from_str($x1).unwrap(),
                    ark_bn254::Fq::from_str($x2).unwrap(),
                ),
                ark_bn254::Fq2::new(
                    ark_bn254::Fq::from_str($y1).unwrap(),
                    ark_bn254::Fq::from_str($y2).unwrap(),
                ),
            )
        };
    }

    pub(crate) use to_g1_bn254;
    pub(crate) use to_g2_bn254;
}
