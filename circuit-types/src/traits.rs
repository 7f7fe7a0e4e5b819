//! Bridges between the encodings the circom toolchain uses on disk and the
//! arkworks curve types.
//!
//! Binary artifacts store field elements little-endian; plain values (witness
//! entries, matrix coefficients) as integers, key material in Montgomery
//! form. JSON artifacts store curve points as projective coordinates in
//! decimal strings. Every point read is validated: it must lie on the curve
//! and in the prime-order subgroup, or deserialization fails.

use std::io::Read;
use std::str::FromStr;

use ark_ec::pairing::Pairing;
use ark_ff::{PrimeField, Zero};
use ark_serialize::SerializationError;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Serializer, de};

type IoResult<T> = Result<T, SerializationError>;

/// Little-endian field-element encodings used by the circom toolchain.
pub trait PrimeFieldBridge: PrimeField {
    /// Number of bytes of one serialized field element.
    const SERIALIZED_BYTE_SIZE: usize;

    /// Reads an element stored as a little-endian integer and performs the
    /// Montgomery reduction.
    fn from_reader(reader: impl Read) -> IoResult<Self>;

    /// Reads an element that is stored in Montgomery form already, without
    /// performing a reduction. Key material is stored this way.
    fn from_reader_unchecked(reader: impl Read) -> IoResult<Self>;
}

/// Curve-point encodings used by the circom toolchain.
pub trait PairingBridge: Pairing
where
    Self::BaseField: PrimeFieldBridge,
    Self::ScalarField: PrimeFieldBridge,
{
    /// The curve's name in circom artifacts ("bn128", "bls12381").
    const CURVE_NAME: &'static str;
    /// Bytes of an uncompressed G1 point.
    const G1_SERIALIZED_BYTE_SIZE: usize;
    /// Bytes of an uncompressed G2 point.
    const G2_SERIALIZED_BYTE_SIZE: usize;

    /// Reads an uncompressed Montgomery-form G1 point and validates it.
    fn g1_from_reader(reader: impl Read) -> IoResult<Self::G1Affine>;
    /// Reads an uncompressed Montgomery-form G2 point and validates it.
    fn g2_from_reader(reader: impl Read) -> IoResult<Self::G2Affine>;

    /// Builds a validated G1 point from projective decimal strings.
    fn g1_from_strings_projective(x: &str, y: &str, z: &str) -> IoResult<Self::G1Affine>;
    /// Builds a validated G2 point from projective decimal strings.
    fn g2_from_strings_projective(
        x0: &str,
        x1: &str,
        y0: &str,
        y1: &str,
        z0: &str,
        z1: &str,
    ) -> IoResult<Self::G2Affine>;

    /// Projective decimal-string form of a G1 point.
    fn g1_to_strings_projective(p: &Self::G1Affine) -> Vec<String>;

    /// Serializes a G1 point as a sequence of three decimal strings.
    fn serialize_g1<S: Serializer>(p: &Self::G1Affine, ser: S) -> Result<S::Ok, S::Error> {
        let strings = Self::g1_to_strings_projective(p);
        let mut seq = ser.serialize_seq(Some(strings.len()))?;
        for element in strings {
            seq.serialize_element(&element)?;
        }
        seq.end()
    }

    /// Serializes a G2 point as three pairs of decimal strings.
    fn serialize_g2<S: Serializer>(p: &Self::G2Affine, ser: S) -> Result<S::Ok, S::Error>;
    /// Serializes a target-group element as nested decimal strings.
    fn serialize_gt<S: Serializer>(p: &Self::TargetField, ser: S) -> Result<S::Ok, S::Error>;

    /// Deserializes a G1 point from a sequence of three decimal strings.
    fn deserialize_g1_element<'de, D>(deserializer: D) -> Result<Self::G1Affine, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        let coords = Vec::<String>::deserialize(deserializer)?;
        let [x, y, z] = coords.as_slice() else {
            return Err(de::Error::custom(
                "expected three projective coordinates for a point on G1",
            ));
        };
        Self::g1_from_strings_projective(x, y, z)
            .map_err(|_| de::Error::custom("invalid projective point on G1"))
    }

    /// Deserializes a G2 point from three pairs of decimal strings.
    fn deserialize_g2_element<'de, D>(deserializer: D) -> Result<Self::G2Affine, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        let coords = Vec::<Vec<String>>::deserialize(deserializer)?;
        let [x, y, z] = coords.as_slice() else {
            return Err(de::Error::custom(
                "expected three projective coordinates for a point on G2",
            ));
        };
        let ([x0, x1], [y0, y1], [z0, z1]) =
            (x.as_slice(), y.as_slice(), z.as_slice())
        else {
            return Err(de::Error::custom(
                "every G2 coordinate needs two field elements",
            ));
        };
        Self::g2_from_strings_projective(x0, x1, y0, y1, z0, z1)
            .map_err(|_| de::Error::custom("invalid projective point on G2"))
    }

    /// Deserializes a target-group element from nested decimal strings.
    fn deserialize_gt_element<'de, D>(deserializer: D) -> Result<Self::TargetField, D::Error>
    where
        D: de::Deserializer<'de>;
}

macro_rules! impl_circom_bridge {
    ($mod_name:ident, $curve_crate:ident, $pairing:ident, $curve_name:expr, $fq_bytes:expr) => {
        mod $mod_name {
            use super::*;
            use $curve_crate::{Fq, Fq2, Fq6, Fq12, Fr, G1Affine, G1Projective, G2Affine,
                G2Projective, $pairing};
            use ark_ec::AffineRepr;
            use ark_ff::BigInt;
            use ark_serialize::CanonicalDeserialize;

            fn parse_fq(string: &str) -> IoResult<Fq> {
                Fq::from_str(string).map_err(|_| SerializationError::InvalidData)
            }

            fn fq2_from_strings(c0: &str, c1: &str) -> IoResult<Fq2> {
                Ok(Fq2::new(parse_fq(c0)?, parse_fq(c1)?))
            }

            fn gt_from_strings(coords: &[Vec<Vec<String>>]) -> IoResult<Fq12> {
                let [c0, c1] = coords else {
                    return Err(SerializationError::InvalidData);
                };
                let mut sextic = [c0, c1].into_iter().map(|half| {
                    let [q0, q1, q2] = half.as_slice() else {
                        return Err(SerializationError::InvalidData);
                    };
                    let mut quadratic = [q0, q1, q2].into_iter().map(|pair| {
                        let [e0, e1] = pair.as_slice() else {
                            return Err(SerializationError::InvalidData);
                        };
                        fq2_from_strings(e0, e1)
                    });
                    Ok(Fq6::new(
                        quadratic.next().unwrap()?,
                        quadratic.next().unwrap()?,
                        quadratic.next().unwrap()?,
                    ))
                });
                Ok(Fq12::new(sextic.next().unwrap()?, sextic.next().unwrap()?))
            }

            impl PrimeFieldBridge for Fr {
                const SERIALIZED_BYTE_SIZE: usize = 32;

                #[inline]
                fn from_reader(mut reader: impl Read) -> IoResult<Self> {
                    let mut buf = [0u8; Self::SERIALIZED_BYTE_SIZE];
                    reader.read_exact(&mut buf[..])?;
                    Ok(Self::from_le_bytes_mod_order(&buf))
                }

                #[inline]
                fn from_reader_unchecked(mut reader: impl Read) -> IoResult<Self> {
                    let mut buf = [0u8; Self::SERIALIZED_BYTE_SIZE];
                    reader.read_exact(&mut buf[..])?;
                    Ok(Self::new_unchecked(BigInt::deserialize_uncompressed(
                        buf.as_slice(),
                    )?))
                }
            }

            impl PrimeFieldBridge for Fq {
                const SERIALIZED_BYTE_SIZE: usize = $fq_bytes;

                #[inline]
                fn from_reader(mut reader: impl Read) -> IoResult<Self> {
                    let mut buf = [0u8; Self::SERIALIZED_BYTE_SIZE];
                    reader.read_exact(&mut buf[..])?;
                    Ok(Self::from_le_bytes_mod_order(&buf))
                }

                #[inline]
                fn from_reader_unchecked(mut reader: impl Read) -> IoResult<Self> {
                    let mut buf = [0u8; Self::SERIALIZED_BYTE_SIZE];
                    reader.read_exact(&mut buf[..])?;
                    Ok(Self::new_unchecked(BigInt::deserialize_uncompressed(
                        buf.as_slice(),
                    )?))
                }
            }

            impl PairingBridge for $pairing {
                const CURVE_NAME: &'static str = $curve_name;
                const G1_SERIALIZED_BYTE_SIZE: usize = $fq_bytes * 2;
                const G2_SERIALIZED_BYTE_SIZE: usize = $fq_bytes * 4;

                fn g1_from_reader(mut reader: impl Read) -> IoResult<Self::G1Affine> {
                    let mut buf = [0u8; Self::G1_SERIALIZED_BYTE_SIZE];
                    reader.read_exact(&mut buf)?;
                    let x = Fq::from_reader_unchecked(&buf[..Fq::SERIALIZED_BYTE_SIZE])?;
                    let y = Fq::from_reader_unchecked(&buf[Fq::SERIALIZED_BYTE_SIZE..])?;

                    // all-zero coordinates encode the point at infinity
                    if x.is_zero() && y.is_zero() {
                        return Ok(G1Affine::zero());
                    }

                    let p = G1Affine::new_unchecked(x, y);
                    if !p.is_on_curve() || !p.is_in_correct_subgroup_assuming_on_curve() {
                        return Err(SerializationError::InvalidData);
                    }
                    Ok(p)
                }

                fn g2_from_reader(mut reader: impl Read) -> IoResult<Self::G2Affine> {
                    let mut buf = [0u8; Self::G2_SERIALIZED_BYTE_SIZE];
                    reader.read_exact(&mut buf)?;
                    let n = Fq::SERIALIZED_BYTE_SIZE;
                    let x0 = Fq::from_reader_unchecked(&buf[..n])?;
                    let x1 = Fq::from_reader_unchecked(&buf[n..2 * n])?;
                    let y0 = Fq::from_reader_unchecked(&buf[2 * n..3 * n])?;
                    let y1 = Fq::from_reader_unchecked(&buf[3 * n..])?;

                    let x = Fq2::new(x0, x1);
                    let y = Fq2::new(y0, y1);
                    if x.is_zero() && y.is_zero() {
                        return Ok(G2Affine::zero());
                    }

                    let p = G2Affine::new_unchecked(x, y);
                    if !p.is_on_curve() || !p.is_in_correct_subgroup_assuming_on_curve() {
                        return Err(SerializationError::InvalidData);
                    }
                    Ok(p)
                }

                fn g1_from_strings_projective(
                    x: &str,
                    y: &str,
                    z: &str,
                ) -> IoResult<Self::G1Affine> {
                    let x = parse_fq(x)?;
                    let y = parse_fq(y)?;
                    let z = parse_fq(z)?;
                    let p = G1Affine::from(G1Projective::new_unchecked(x, y, z));
                    if p.is_zero() {
                        return Ok(p);
                    }
                    if !p.is_on_curve() || !p.is_in_correct_subgroup_assuming_on_curve() {
                        return Err(SerializationError::InvalidData);
                    }
                    Ok(p)
                }

                fn g2_from_strings_projective(
                    x0: &str,
                    x1: &str,
                    y0: &str,
                    y1: &str,
                    z0: &str,
                    z1: &str,
                ) -> IoResult<Self::G2Affine> {
                    let x = fq2_from_strings(x0, x1)?;
                    let y = fq2_from_strings(y0, y1)?;
                    let z = fq2_from_strings(z0, z1)?;
                    let p = G2Affine::from(G2Projective::new_unchecked(x, y, z));
                    if p.is_zero() {
                        return Ok(p);
                    }
                    if !p.is_on_curve() || !p.is_in_correct_subgroup_assuming_on_curve() {
                        return Err(SerializationError::InvalidData);
                    }
                    Ok(p)
                }

                fn g1_to_strings_projective(p: &Self::G1Affine) -> Vec<String> {
                    match p.xy() {
                        Some((x, y)) => {
                            vec![x.to_string(), y.to_string(), "1".to_owned()]
                        }
                        // point at infinity
                        None => vec!["0".to_owned(), "1".to_owned(), "0".to_owned()],
                    }
                }

                fn serialize_g2<S: Serializer>(
                    p: &Self::G2Affine,
                    ser: S,
                ) -> Result<S::Ok, S::Error> {
                    let mut seq = ser.serialize_seq(Some(3))?;
                    match p.xy() {
                        Some((x, y)) => {
                            seq.serialize_element(&[x.c0.to_string(), x.c1.to_string()])?;
                            seq.serialize_element(&[y.c0.to_string(), y.c1.to_string()])?;
                            seq.serialize_element(&["1".to_owned(), "0".to_owned()])?;
                        }
                        None => {
                            seq.serialize_element(&["0".to_owned(), "0".to_owned()])?;
                            seq.serialize_element(&["1".to_owned(), "0".to_owned()])?;
                            seq.serialize_element(&["0".to_owned(), "0".to_owned()])?;
                        }
                    }
                    seq.end()
                }

                fn serialize_gt<S: Serializer>(
                    p: &Self::TargetField,
                    ser: S,
                ) -> Result<S::Ok, S::Error> {
                    let halves = [p.c0, p.c1].map(|half| {
                        [half.c0, half.c1, half.c2].map(|quadratic| {
                            [quadratic.c0.to_string(), quadratic.c1.to_string()]
                        })
                    });
                    let mut seq = ser.serialize_seq(Some(2))?;
                    for half in halves {
                        seq.serialize_element(&half)?;
                    }
                    seq.end()
                }

                fn deserialize_gt_element<'de, D>(
                    deserializer: D,
                ) -> Result<Self::TargetField, D::Error>
                where
                    D: de::Deserializer<'de>,
                {
                    let coords = Vec::<Vec<Vec<String>>>::deserialize(deserializer)?;
                    gt_from_strings(&coords).map_err(|_| {
                        de::Error::custom("invalid element of the target group")
                    })
                }
            }
        }
    };
}

impl_circom_bridge!(bn254, ark_bn254, Bn254, "bn128", 32);
impl_circom_bridge!(bls12_381, ark_bls12_381, Bls12_381, "bls12381", 48);
