//! The JSON public-input format emitted by snarkjs: a flat array of decimal
//! strings, the constant one *not* included.

use std::str::FromStr;

use ark_ff::PrimeField;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, de};

/// Public inputs of one proof, in instance order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JsonPublicInput<F: PrimeField + FromStr> {
    /// The input values.
    pub values: Vec<F>,
}

impl<'de, F: PrimeField + FromStr> Deserialize<'de> for JsonPublicInput<F> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        let strings = Vec::<String>::deserialize(deserializer)?;
        let values = strings
            .iter()
            .map(|s| F::from_str(s).map_err(|_| de::Error::custom("invalid field element")))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { values })
    }
}

impl<F: PrimeField + FromStr> Serialize for JsonPublicInput<F> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.values.len()))?;
        for value in &self.values {
            seq.serialize_element(&value.to_string())?;
        }
        seq.end()
    }
}
