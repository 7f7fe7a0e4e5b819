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

//!Inspired by <https://github.com/arkworks-rs/circom-compat/blob/170b10fc9ed182b5f72ecf379033dda023d0bf07/src/zkey.rs>
//!
//! Proving-key (`.zkey`) parsing. The file is a section container:
//!
//! 1. prover type (1 = Groth16)
//! 2. Groth16 header: field sizes and moduli, variable counts, domain size,
//!    and the six key points α₁, β₁, β₂, γ₂, δ₁, δ₂
//! 3. IC, one G1 point per instance variable
//! 4. A/B coefficient matrices
//! 5. `a_query` 6. `b_g1_query` 7. `b_g2_query` 8. `l_query` 9. `h_query`
//!
//! Sections past 9 (contribution transcript) are ignored. All point sections
//! are validated for size, curve and subgroup membership at load time.

use std::io::{Read, Seek};

use ark_ec::pairing::Pairing;
use ark_ff::PrimeField;
use ark_relations::r1cs::ConstraintMatrices;
use ark_serialize::CanonicalDeserialize;
use byteorder::{LittleEndian, ReadBytesExt};
use groth16::{ProvingKey, VerifyingKey};

use crate::binfile::BinFile;
use crate::traits::{PairingBridge, PrimeFieldBridge};
use crate::{ParseError, reader_utils};

const ZKEY_MAGIC: &str = "zkey";
const GROTH16_PROVER_TYPE: u32 = 1;

const PROVER_TYPE_SECTION: u32 = 1;
const HEADER_SECTION: u32 = 2;
const IC_SECTION: u32 = 3;
const COEFFS_SECTION: u32 = 4;
const A_SECTION: u32 = 5;
const B_G1_SECTION: u32 = 6;
const B_G2_SECTION: u32 = 7;
const L_SECTION: u32 = 8;
const H_SECTION: u32 = 9;

/// A parsed proving-key artifact: the key tables plus the A/B constraint
/// matrices the witness map needs.
///
/// The matrices carry no C section (the file stores none); the satisfiability
/// check therefore needs the `.r1cs` artifact, see
/// [`R1CS::is_satisfied`](crate::R1CS::is_satisfied).
pub struct ZKey<P: Pairing> {
    /// The proving key, verification key embedded.
    pub proving_key: ProvingKey<P>,
    /// The constraint matrices, in witness-map layout.
    pub matrices: ConstraintMatrices<P::ScalarField>,
}

impl<P: Pairing + PairingBridge> ZKey<P>
where
    P::BaseField: PrimeFieldBridge,
    P::ScalarField: PrimeFieldBridge,
{
    /// Parses a `.zkey` file.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self, ParseError> {
        let mut binfile = BinFile::new(ZKEY_MAGIC, reader)?;

        binfile.enter_section(PROVER_TYPE_SECTION)?;
        let prover_type = binfile.reader().read_u32::<LittleEndian>()?;
        if prover_type != GROTH16_PROVER_TYPE {
            return Err(ParseError::WrongProverType(prover_type));
        }

        let header = Header::<P>::read(&mut binfile)?;
        let num_witness = header.n_vars - header.n_public - 1;

        let ic = read_g1_section::<_, P>(&mut binfile, IC_SECTION, header.n_public + 1)?;
        let matrices = read_matrices::<_, P>(&mut binfile, &header)?;
        let a_query = read_g1_section::<_, P>(&mut binfile, A_SECTION, header.n_vars)?;
        let b_g1_query = read_g1_section::<_, P>(&mut binfile, B_G1_SECTION, header.n_vars)?;
        let b_g2_query = read_g2_section::<_, P>(&mut binfile, B_G2_SECTION, header.n_vars)?;
        let l_query = read_g1_section::<_, P>(&mut binfile, L_SECTION, num_witness)?;
        let h_query = read_g1_section::<_, P>(&mut binfile, H_SECTION, header.domain_size)?;

        let vk = VerifyingKey::<P> {
            alpha_g1: header.alpha_g1,
            beta_g2: header.beta_g2,
            gamma_g2: header.gamma_g2,
            delta_g2: header.delta_g2,
            gamma_abc_g1: ic,
        };

        Ok(Self {
            proving_key: ProvingKey::<P> {
                vk,
                beta_g1: header.beta_g1,
                delta_g1: header.delta_g1,
                a_query,
                b_g1_query,
                b_g2_query,
                h_query,
                l_query,
            },
            matrices,
        })
    }
}

struct Header<P: Pairing> {
    n_vars: usize,
    n_public: usize,
    domain_size: usize,
    alpha_g1: P::G1Affine,
    beta_g1: P::G1Affine,
    beta_g2: P::G2Affine,
    gamma_g2: P::G2Affine,
    delta_g1: P::G1Affine,
    delta_g2: P::G2Affine,
}

impl<P: Pairing + PairingBridge> Header<P>
where
    P::BaseField: PrimeFieldBridge,
    P::ScalarField: PrimeFieldBridge,
{
    fn read<R: Read + Seek>(binfile: &mut BinFile<R>) -> Result<Self, ParseError> {
        binfile.enter_section(HEADER_SECTION)?;
        let reader = binfile.reader();

        let n8q = reader.read_u32::<LittleEndian>()? as usize;
        if n8q != P::BaseField::SERIALIZED_BYTE_SIZE {
            return Err(ParseError::WrongBaseField);
        }
        let q = <P::BaseField as PrimeField>::BigInt::deserialize_uncompressed(&mut *reader)?;
        if q != P::BaseField::MODULUS {
            return Err(ParseError::WrongBaseField);
        }

        let n8r = reader.read_u32::<LittleEndian>()? as usize;
        if n8r != P::ScalarField::SERIALIZED_BYTE_SIZE {
            return Err(ParseError::WrongScalarField);
        }
        let r = <P::ScalarField as PrimeField>::BigInt::deserialize_uncompressed(&mut *reader)?;
        if r != P::ScalarField::MODULUS {
            return Err(ParseError::WrongScalarField);
        }

        let n_vars = reader.read_u32::<LittleEndian>()? as usize;
        let n_public = reader.read_u32::<LittleEndian>()? as usize;
        let domain_size = reader.read_u32::<LittleEndian>()? as usize;
        if !domain_size.is_power_of_two() {
            return Err(ParseError::MalformedKey {
                table: "domain",
                expected: domain_size.next_power_of_two(),
                actual: domain_size,
            });
        }

        Ok(Self {
            n_vars,
            n_public,
            domain_size,
            alpha_g1: P::g1_from_reader(&mut *reader)?,
            beta_g1: P::g1_from_reader(&mut *reader)?,
            beta_g2: P::g2_from_reader(&mut *reader)?,
            gamma_g2: P::g2_from_reader(&mut *reader)?,
            delta_g1: P::g1_from_reader(&mut *reader)?,
            delta_g2: P::g2_from_reader(&mut *reader)?,
        })
    }
}

/// Reads the A/B coefficient section into witness-map matrices.
///
/// snarkjs appends one `1·x_i` row per instance variable behind the real
/// constraints (the witness map re-creates them); those rows are stripped
/// here so the matrices carry exactly the circuit's constraints.
fn read_matrices<R: Read + Seek, P: Pairing + PairingBridge>(
    binfile: &mut BinFile<R>,
    header: &Header<P>,
) -> Result<ConstraintMatrices<P::ScalarField>, ParseError>
where
    P::BaseField: PrimeFieldBridge,
    P::ScalarField: PrimeFieldBridge,
{
    binfile.enter_section(COEFFS_SECTION)?;
    let reader = binfile.reader();

    let num_coeffs = reader.read_u32::<LittleEndian>()?;
    let mut matrices = vec![vec![Vec::new(); header.domain_size]; 2];
    let mut max_constraint_index = 0;
    for _ in 0..num_coeffs {
        let matrix = reader.read_u32::<LittleEndian>()?;
        let constraint = reader.read_u32::<LittleEndian>()? as usize;
        let signal = reader.read_u32::<LittleEndian>()? as usize;
        let value = P::ScalarField::from_reader(&mut *reader)?;

        if matrix > 1 {
            return Err(ParseError::InvalidMatrixIndex(matrix));
        }
        if signal >= header.n_vars {
            return Err(ParseError::InvalidWireIndex {
                expected: header.n_vars,
                actual: signal,
            });
        }
        if constraint >= header.domain_size {
            return Err(ParseError::MalformedKey {
                table: "coefficients",
                expected: header.domain_size,
                actual: constraint + 1,
            });
        }
        max_constraint_index = std::cmp::max(max_constraint_index, constraint);
        matrices[matrix as usize][constraint].push((value, signal));
    }

    let num_constraints = (max_constraint_index + 1)
        .checked_sub(header.n_public + 1)
        .ok_or(ParseError::MalformedKey {
            table: "coefficients",
            expected: header.n_public + 1,
            actual: max_constraint_index + 1,
        })?;
    matrices.iter_mut().for_each(|matrix| {
        matrix.truncate(num_constraints);
    });

    let mut matrices = matrices.into_iter();
    let a = matrices.next().expect("two matrices");
    let b = matrices.next().expect("two matrices");
    let a_num_non_zero = a.iter().map(|row| row.len()).sum();
    let b_num_non_zero = b.iter().map(|row| row.len()).sum();

    Ok(ConstraintMatrices {
        num_instance_variables: header.n_public + 1,
        num_witness_variables: header.n_vars - header.n_public - 1,
        num_constraints,
        a_num_non_zero,
        b_num_non_zero,
        c_num_non_zero: 0,
        a,
        b,
        c: Vec::new(),
    })
}

fn read_g1_section<R: Read + Seek, P: Pairing + PairingBridge>(
    binfile: &mut BinFile<R>,
    section_id: u32,
    num: usize,
) -> Result<Vec<P::G1Affine>, ParseError>
where
    P::BaseField: PrimeFieldBridge,
    P::ScalarField: PrimeFieldBridge,
{
    let section = binfile.enter_section(section_id)?;
    let expected = (num * P::G1_SERIALIZED_BYTE_SIZE) as u64;
    if section.size != expected {
        return Err(ParseError::WrongSectionSize {
            section: section_id,
            expected,
            actual: section.size,
        });
    }
    Ok(reader_utils::read_g1_vector::<P, _>(binfile.reader(), num)?)
}

fn read_g2_section<R: Read + Seek, P: Pairing + PairingBridge>(
    binfile: &mut BinFile<R>,
    section_id: u32,
    num: usize,
) -> Result<Vec<P::G2Affine>, ParseError>
where
    P::BaseField: PrimeFieldBridge,
    P::ScalarField: PrimeFieldBridge,
{
    let section = binfile.enter_section(section_id)?;
    let expected = (num * P::G2_SERIALIZED_BYTE_SIZE) as u64;
    if section.size != expected {
        return Err(ParseError::WrongSectionSize {
            section: section_id,
            expected,
            actual: section.size,
        });
    }
    Ok(reader_utils::read_g2_vector::<P, _>(binfile.reader(), num)?)
}

#[cfg(test)]
pub(crate) mod test_writer {
    //! A minimal zkey writer, enough to round-trip keys produced by the
    //! engine's setup through the parser.

    use ark_bn254::{Bn254, Fr};
    use ark_ec::AffineRepr;
    use ark_ff::{BigInteger, Fp, FpConfig, PrimeField};
    use ark_relations::r1cs::ConstraintMatrices;
    use byteorder::{LittleEndian, WriteBytesExt};
    use groth16::ProvingKey;

    fn write_fp_montgomery<C: FpConfig<N>, const N: usize>(out: &mut Vec<u8>, value: Fp<C, N>) {
        out.extend_from_slice(&value.0.to_bytes_le());
    }

    fn write_fp_plain<C: FpConfig<N>, const N: usize>(out: &mut Vec<u8>, value: Fp<C, N>) {
        out.extend_from_slice(&value.into_bigint().to_bytes_le());
    }

    fn write_section(out: &mut Vec<u8>, id: u32, payload: &[u8]) {
        out.write_u32::<LittleEndian>(id).unwrap();
        out.write_u64::<LittleEndian>(payload.len() as u64).unwrap();
        out.extend_from_slice(payload);
    }

    pub(crate) fn write_zkey(
        pk: &ProvingKey<Bn254>,
        matrices: &ConstraintMatrices<Fr>,
        domain_size: usize,
    ) -> Vec<u8> {
        let write_g1 = |out: &mut Vec<u8>, p: &ark_bn254::G1Affine| match p.xy() {
            Some((x, y)) => {
                write_fp_montgomery(out, x);
                write_fp_montgomery(out, y);
            }
            None => out.extend_from_slice(&[0u8; 64]),
        };
        let write_g2 = |out: &mut Vec<u8>, p: &ark_bn254::G2Affine| match p.xy() {
            Some((x, y)) => {
                write_fp_montgomery(out, x.c0);
                write_fp_montgomery(out, x.c1);
                write_fp_montgomery(out, y.c0);
                write_fp_montgomery(out, y.c1);
            }
            None => out.extend_from_slice(&[0u8; 128]),
        };

        let n_public = matrices.num_instance_variables - 1;
        let n_vars = matrices.num_instance_variables + matrices.num_witness_variables;

        let mut out = Vec::new();
        out.extend_from_slice(b"zkey");
        out.write_u32::<LittleEndian>(1).unwrap();
        out.write_u32::<LittleEndian>(9).unwrap();

        // 1: prover type
        write_section(&mut out, 1, &1u32.to_le_bytes());

        // 2: Groth16 header
        let mut header = Vec::new();
        header.write_u32::<LittleEndian>(32).unwrap();
        header.extend_from_slice(&ark_bn254::Fq::MODULUS.to_bytes_le());
        header.write_u32::<LittleEndian>(32).unwrap();
        header.extend_from_slice(&ark_bn254::Fr::MODULUS.to_bytes_le());
        header.write_u32::<LittleEndian>(n_vars as u32).unwrap();
        header.write_u32::<LittleEndian>(n_public as u32).unwrap();
        header
            .write_u32::<LittleEndian>(domain_size as u32)
            .unwrap();
        write_g1(&mut header, &pk.vk.alpha_g1);
        write_g1(&mut header, &pk.beta_g1);
        write_g2(&mut header, &pk.vk.beta_g2);
        write_g2(&mut header, &pk.vk.gamma_g2);
        write_g1(&mut header, &pk.delta_g1);
        write_g2(&mut header, &pk.vk.delta_g2);
        write_section(&mut out, 2, &header);

        // 3: IC
        let mut ic = Vec::new();
        for point in &pk.vk.gamma_abc_g1 {
            write_g1(&mut ic, point);
        }
        write_section(&mut out, 3, &ic);

        // 4: coefficients, with the folded instance rows snarkjs appends
        let mut coeffs = Vec::new();
        let mut entries = Vec::new();
        for (matrix_index, matrix) in [&matrices.a, &matrices.b].into_iter().enumerate() {
            for (constraint, row) in matrix.iter().enumerate() {
                for (value, signal) in row {
                    entries.push((matrix_index as u32, constraint as u32, *signal as u32, *value));
                }
            }
        }
        for public in 0..=n_public {
            entries.push((
                0,
                (matrices.num_constraints + public) as u32,
                public as u32,
                ark_bn254::Fr::from(1u64),
            ));
        }
        coeffs
            .write_u32::<LittleEndian>(entries.len() as u32)
            .unwrap();
        for (matrix, constraint, signal, value) in entries {
            coeffs.write_u32::<LittleEndian>(matrix).unwrap();
            coeffs.write_u32::<LittleEndian>(constraint).unwrap();
            coeffs.write_u32::<LittleEndian>(signal).unwrap();
            write_fp_plain(&mut coeffs, value);
        }
        write_section(&mut out, 4, &coeffs);

        // 5-9: the query tables
        for (id, points) in [
            (5u32, &pk.a_query),
            (6, &pk.b_g1_query),
            (8, &pk.l_query),
            (9, &pk.h_query),
        ] {
            let mut payload = Vec::new();
            for point in points {
                write_g1(&mut payload, point);
            }
            write_section(&mut out, id, &payload);
        }
        let mut payload = Vec::new();
        for point in &pk.b_g2_query {
            write_g2(&mut payload, point);
        }
        write_section(&mut out, 7, &payload);

        out
    }
}
