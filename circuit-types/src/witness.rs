//! Parser for circom `.wtns` witness files.

use std::io::Read;

use ark_ff::{BigInteger, PrimeField};
use byteorder::{LittleEndian, ReadBytesExt};
use groth16::FullAssignment;

use crate::traits::PrimeFieldBridge;
use crate::{ParseError, reader_utils};

const WITNESS_MAGIC: &str = "wtns";
const MAX_VERSION: u32 = 2;
const MAX_SECTIONS: u32 = 2;

/// The full wire assignment produced by a witness calculator, in wire order:
/// the constant one, the public wires, then the private wires.
///
/// A witness belongs to a single proving request; it is split into a
/// [`FullAssignment`] by value and not reused afterwards.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Witness<F: PrimeFieldBridge> {
    /// The wire values.
    pub values: Vec<F>,
}

impl<F: PrimeFieldBridge> Witness<F> {
    /// Parses a `.wtns` file.
    ///
    /// The format is small enough that it is read sequentially; no seeking
    /// is required.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, ParseError> {
        reader_utils::read_header(&mut reader, WITNESS_MAGIC)?;
        let version = reader.read_u32::<LittleEndian>()?;
        if version > MAX_VERSION {
            return Err(ParseError::UnsupportedVersion {
                artifact: "wtns",
                supported: MAX_VERSION,
                actual: version,
            });
        }
        let n_sections = reader.read_u32::<LittleEndian>()?;
        if n_sections > MAX_SECTIONS {
            return Err(ParseError::SectionCount {
                expected: MAX_SECTIONS,
                actual: n_sections,
            });
        }

        // header section: field size, modulus, witness length
        let _section_id = reader.read_u32::<LittleEndian>()?;
        let _section_size = reader.read_u64::<LittleEndian>()?;
        let field_size = reader.read_u32::<LittleEndian>()? as usize;
        let mut modulus = vec![0u8; field_size];
        reader.read_exact(&mut modulus)?;
        if F::MODULUS.to_bytes_le() != modulus {
            return Err(ParseError::WrongScalarField);
        }
        let n_witness = reader.read_u32::<LittleEndian>()?;

        // data section: the values themselves
        let _section_id = reader.read_u32::<LittleEndian>()?;
        let _section_size = reader.read_u64::<LittleEndian>()?;
        let values = (0..n_witness)
            .map(|_| F::from_reader(&mut reader))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { values })
    }

    /// Splits the flat assignment at the instance boundary of the circuit it
    /// was calculated for.
    pub fn into_assignment(self, num_instance_variables: usize) -> FullAssignment<F> {
        FullAssignment::from_flat(self.values, num_instance_variables)
    }
}

#[cfg(test)]
mod tests {
    use super::Witness;
    use ark_bn254::Fr;
    use hex_literal::hex;

    const MULTIPLIER2_WTNS: [u8; 204] = hex!(
        "77746e73020000000200000001000000280000000000000020000000010000f093f5e1439170b97948e833285d588181b64550b829a031e1724e6430040000000200000080000000000000000100000000000000000000000000000000000000000000000000000000000000210000000000000000000000000000000000000000000000000000000000000003000000000000000000000000000000000000000000000000000000000000000b00000000000000000000000000000000000000000000000000000000000000"
    );

    #[test]
    fn parses_bn254_multiplier2_witness() {
        let witness = Witness::<Fr>::from_reader(MULTIPLIER2_WTNS.as_slice()).unwrap();
        assert_eq!(
            witness,
            Witness {
                values: vec![
                    Fr::from(1u64),
                    Fr::from(33u64),
                    Fr::from(3u64),
                    Fr::from(11u64),
                ],
            }
        );
    }

    #[test]
    fn splits_into_instance_and_witness_parts() {
        let witness = Witness::<Fr>::from_reader(MULTIPLIER2_WTNS.as_slice()).unwrap();
        let assignment = witness.into_assignment(2);
        assert_eq!(
            assignment.public_inputs,
            vec![Fr::from(1u64), Fr::from(33u64)]
        );
        assert_eq!(assignment.witness, vec![Fr::from(3u64), Fr::from(11u64)]);
    }

    #[test]
    fn wrong_curve_is_rejected() {
        let result = Witness::<ark_bls12_381::Fr>::from_reader(MULTIPLIER2_WTNS.as_slice());
        assert!(matches!(result, Err(crate::ParseError::WrongScalarField)));
    }
}
