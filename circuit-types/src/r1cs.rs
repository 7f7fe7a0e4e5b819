//Copyright (c) 2021 Georgios Konstantopoulos
//
//Permission is hereby granted, free of charge, to any
//person obtaining a copy of this software and associated
//documentation files (the "Software"), to deal in the
//Software without restriction, including without
//limitation the rights to use, copy, modify, merge,
//publish, distribute, sublicense, and/or sell copies of
//the Software, and to permit persons to whom the Software
//is furnished to do so, subject to the following
//conditions:
//
//The above copyright notice and this permission notice
//shall be included in all copies or substantial portions
//of the Software.
//
//THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF
//ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED
//TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A
//PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT
//SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY
//CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
//OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR
//IN CONNECTION WITH THE SOFTWARE O THE USE OR OTHER
//DEALINGS IN THE SOFTWARE.R

//!Inspired by <https://github.com/arkworks-rs/circom-compat/blob/170b10fc9ed182b5f72ecf379033dda023d0bf07/src/circom/r1cs_reader.rs>

use std::io::{Read, Seek};

use ark_ec::pairing::Pairing;
use ark_ff::PrimeField;
use ark_relations::r1cs::ConstraintMatrices;
use ark_serialize::CanonicalDeserialize;
use byteorder::{LittleEndian, ReadBytesExt};

use crate::ParseError;
use crate::binfile::BinFile;
use crate::traits::{PairingBridge, PrimeFieldBridge};

const R1CS_MAGIC: &str = "r1cs";
const MAX_VERSION: u32 = 1;

const HEADER_SECTION: u32 = 1;
const CONSTRAINT_SECTION: u32 = 2;
const WIRE2LABEL_SECTION: u32 = 3;

/// One sparse linear combination: pairs of wire index and coefficient.
pub type SparseRow<P> = Vec<(usize, <P as Pairing>::ScalarField)>;
/// One rank-1 constraint `⟨A,w⟩ · ⟨B,w⟩ = ⟨C,w⟩`.
pub type Constraint<P> = (SparseRow<P>, SparseRow<P>, SparseRow<P>);

/// A rank-1 constraint system read from a circom `.r1cs` file.
///
/// Wire 0 is the constant one; public outputs and public inputs follow, then
/// the private wires. Immutable once parsed.
#[derive(Clone, Debug)]
pub struct R1CS<P: Pairing + PairingBridge>
where
    P::BaseField: PrimeFieldBridge,
    P::ScalarField: PrimeFieldBridge,
{
    /// Instance wires: the constant one plus all public outputs and inputs.
    pub num_instance: usize,
    /// Private wires.
    pub num_witness: usize,
    /// Total wires, `num_instance + num_witness`.
    pub num_variables: usize,
    /// Public outputs of the circuit.
    pub n_pub_out: u32,
    /// Public inputs of the circuit.
    pub n_pub_in: u32,
    /// Private inputs of the circuit.
    pub n_prv_in: u32,
    /// Labels in the original circuit source, before optimization.
    pub n_labels: u64,
    /// Number of constraints.
    pub n_constraints: usize,
    /// The constraints, in file order.
    pub constraints: Vec<Constraint<P>>,
    /// Map from wire index to original label.
    pub wire_mapping: Vec<usize>,
}

impl<P: Pairing + PairingBridge> R1CS<P>
where
    P::BaseField: PrimeFieldBridge,
    P::ScalarField: PrimeFieldBridge,
{
    /// Parses an `.r1cs` file.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self, ParseError> {
        let mut binfile = BinFile::new(R1CS_MAGIC, reader)?;
        if binfile.version() > MAX_VERSION {
            return Err(ParseError::UnsupportedVersion {
                artifact: "r1cs",
                supported: MAX_VERSION,
                actual: binfile.version(),
            });
        }

        let header = Header::read::<_, P>(&mut binfile)?;

        binfile.enter_section(CONSTRAINT_SECTION)?;
        let constraints = read_constraints::<_, P>(
            binfile.reader(),
            header.n_constraints,
            header.num_variables,
        )?;

        let section = binfile.enter_section(WIRE2LABEL_SECTION)?;
        let expected_size = 8 * header.num_variables as u64;
        if section.size != expected_size {
            return Err(ParseError::WrongSectionSize {
                section: WIRE2LABEL_SECTION,
                expected: expected_size,
                actual: section.size,
            });
        }
        let wire_mapping = (0..header.num_variables)
            .map(|_| binfile.reader().read_u64::<LittleEndian>())
            .collect::<Result<Vec<_>, _>>()?;
        if wire_mapping.first() != Some(&0) {
            return Err(ParseError::InvalidWireMapping);
        }

        let num_instance = (1 + header.n_pub_in + header.n_pub_out) as usize;
        Ok(Self {
            num_instance,
            num_witness: header.num_variables - num_instance,
            num_variables: header.num_variables,
            n_pub_out: header.n_pub_out,
            n_pub_in: header.n_pub_in,
            n_prv_in: header.n_prv_in,
            n_labels: header.n_labels,
            n_constraints: header.n_constraints,
            constraints,
            wire_mapping: wire_mapping.into_iter().map(|label| label as usize).collect(),
        })
    }

    /// Diagnostic check that an assignment satisfies every constraint.
    ///
    /// `witness` is the flat wire assignment, constant one first. Returns
    /// `false` for a wrong-length assignment as well.
    pub fn is_satisfied(&self, witness: &[P::ScalarField]) -> bool {
        if witness.len() != self.num_variables {
            return false;
        }
        let evaluate = |row: &SparseRow<P>| {
            row.iter()
                .map(|(wire, coeff)| witness[*wire] * coeff)
                .sum::<P::ScalarField>()
        };
        self.constraints
            .iter()
            .all(|(a, b, c)| evaluate(a) * evaluate(b) == evaluate(c))
    }

    /// The sparse constraint matrices in the layout the proving engine
    /// consumes.
    pub fn to_matrices(&self) -> ConstraintMatrices<P::ScalarField> {
        let flip = |row: &SparseRow<P>| {
            row.iter()
                .map(|(wire, coeff)| (*coeff, *wire))
                .collect::<Vec<_>>()
        };
        let a = self.constraints.iter().map(|(a, _, _)| flip(a)).collect::<Vec<_>>();
        let b = self.constraints.iter().map(|(_, b, _)| flip(b)).collect::<Vec<_>>();
        let c = self.constraints.iter().map(|(_, _, c)| flip(c)).collect::<Vec<_>>();

        let non_zero = |m: &[Vec<(P::ScalarField, usize)>]| {
            m.iter().map(|row| row.len()).sum::<usize>()
        };

        ConstraintMatrices {
            num_instance_variables: self.num_instance,
            num_witness_variables: self.num_witness,
            num_constraints: self.n_constraints,
            a_num_non_zero: non_zero(&a),
            b_num_non_zero: non_zero(&b),
            c_num_non_zero: non_zero(&c),
            a,
            b,
            c,
        }
    }
}

struct Header {
    num_variables: usize,
    n_pub_out: u32,
    n_pub_in: u32,
    n_prv_in: u32,
    n_labels: u64,
    n_constraints: usize,
}

impl Header {
    fn read<R: Read + Seek, P: Pairing + PairingBridge>(
        binfile: &mut BinFile<R>,
    ) -> Result<Self, ParseError>
    where
        P::BaseField: PrimeFieldBridge,
        P::ScalarField: PrimeFieldBridge,
    {
        let section = binfile.enter_section(HEADER_SECTION)?;
        let reader = binfile.reader();

        let field_size = reader.read_u32::<LittleEndian>()? as usize;
        if field_size != P::ScalarField::SERIALIZED_BYTE_SIZE {
            return Err(ParseError::WrongScalarField);
        }
        if section.size != 32 + field_size as u64 {
            return Err(ParseError::WrongSectionSize {
                section: HEADER_SECTION,
                expected: 32 + field_size as u64,
                actual: section.size,
            });
        }
        let modulus =
            <P::ScalarField as PrimeField>::BigInt::deserialize_uncompressed(&mut *reader)?;
        if modulus != P::ScalarField::MODULUS {
            return Err(ParseError::WrongScalarField);
        }

        Ok(Self {
            num_variables: reader.read_u32::<LittleEndian>()? as usize,
            n_pub_out: reader.read_u32::<LittleEndian>()?,
            n_pub_in: reader.read_u32::<LittleEndian>()?,
            n_prv_in: reader.read_u32::<LittleEndian>()?,
            n_labels: reader.read_u64::<LittleEndian>()?,
            n_constraints: reader.read_u32::<LittleEndian>()? as usize,
        })
    }
}

fn read_sparse_row<R: Read, P: Pairing + PairingBridge>(
    mut reader: R,
    num_variables: usize,
) -> Result<SparseRow<P>, ParseError>
where
    P::BaseField: PrimeFieldBridge,
    P::ScalarField: PrimeFieldBridge,
{
    let entries = reader.read_u32::<LittleEndian>()? as usize;
    let mut row = Vec::with_capacity(entries);
    for _ in 0..entries {
        let wire = reader.read_u32::<LittleEndian>()? as usize;
        if wire >= num_variables {
            return Err(ParseError::InvalidWireIndex {
                expected: num_variables,
                actual: wire,
            });
        }
        row.push((wire, P::ScalarField::from_reader(&mut reader)?));
    }
    Ok(row)
}

fn read_constraints<R: Read, P: Pairing + PairingBridge>(
    mut reader: R,
    n_constraints: usize,
    num_variables: usize,
) -> Result<Vec<Constraint<P>>, ParseError>
where
    P::BaseField: PrimeFieldBridge,
    P::ScalarField: PrimeFieldBridge,
{
    let mut constraints = Vec::with_capacity(n_constraints);
    for _ in 0..n_constraints {
        constraints.push((
            read_sparse_row::<_, P>(&mut reader, num_variables)?,
            read_sparse_row::<_, P>(&mut reader, num_variables)?,
            read_sparse_row::<_, P>(&mut reader, num_variables)?,
        ));
    }
    Ok(constraints)
}
