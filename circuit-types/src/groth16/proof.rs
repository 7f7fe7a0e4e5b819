//! The JSON proof format emitted by snarkjs.

use ark_ec::pairing::Pairing;
use groth16::Proof;
use serde::{Deserialize, Serialize};

use crate::traits::{PairingBridge, PrimeFieldBridge};

/// A Groth16 proof in snarkjs' JSON layout: the three points as projective
/// decimal strings, plus protocol and curve tags.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonProof<P: Pairing + PairingBridge>
where
    P::BaseField: PrimeFieldBridge,
    P::ScalarField: PrimeFieldBridge,
{
    /// First proof element, in G1.
    #[serde(serialize_with = "P::serialize_g1::<_>")]
    #[serde(deserialize_with = "P::deserialize_g1_element::<_>")]
    pub pi_a: P::G1Affine,
    /// Second proof element, in G2.
    #[serde(serialize_with = "P::serialize_g2::<_>")]
    #[serde(deserialize_with = "P::deserialize_g2_element::<_>")]
    pub pi_b: P::G2Affine,
    /// Third proof element, in G1.
    #[serde(serialize_with = "P::serialize_g1::<_>")]
    #[serde(deserialize_with = "P::deserialize_g1_element::<_>")]
    pub pi_c: P::G1Affine,
    /// Always `"groth16"`.
    pub protocol: String,
    /// The curve name in circom spelling ("bn128", "bls12381").
    pub curve: String,
}

impl<P: Pairing + PairingBridge> From<Proof<P>> for JsonProof<P>
where
    P::BaseField: PrimeFieldBridge,
    P::ScalarField: PrimeFieldBridge,
{
    fn from(proof: Proof<P>) -> Self {
        Self {
            pi_a: proof.a,
            pi_b: proof.b,
            pi_c: proof.c,
            protocol: "groth16".to_owned(),
            curve: P::CURVE_NAME.to_owned(),
        }
    }
}

impl<P: Pairing + PairingBridge> From<JsonProof<P>> for Proof<P>
where
    P::BaseField: PrimeFieldBridge,
    P::ScalarField: PrimeFieldBridge,
{
    fn from(proof: JsonProof<P>) -> Self {
        Self {
            a: proof.pi_a,
            b: proof.pi_b,
            c: proof.pi_c,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::JsonProof;
    use crate::test_utils;
    use ark_bn254::Bn254;
    use std::str::FromStr;

    const PROOF_JSON: &str = r#"{
        "pi_a": [
            "5969123522090814361171588228229368332719697989145919311329989202301051796912",
            "18906266273883421538550545870389760028232642993789046435548759958047513826466",
            "1"
        ],
        "pi_b": [
            ["13732822754685216699494313130307949314358351264391615026657641877459312805921",
             "15242155868134051061519617910834758681213622395767565233201715494163382082631"],
            ["6040988303910179137905227500476692522731546381459192177262195830159275686930",
             "6102931310051425482112222546940021723264293724138375749141717027794878004116"],
            ["1", "0"]
        ],
        "pi_c": [
            "8027438340805100823503975850514290391260085605647857333256305214246713987397",
            "17368354082387796246978493062684369586080079518888794624836970993708830684295",
            "1"
        ],
        "protocol": "groth16",
        "curve": "bn128"
    }"#;

    #[test]
    fn deserializes_snarkjs_proof() {
        let proof = serde_json::from_str::<JsonProof<Bn254>>(PROOF_JSON).unwrap();

        let pi_a = test_utils::to_g1_bn254!(
            "5969123522090814361171588228229368332719697989145919311329989202301051796912",
            "18906266273883421538550545870389760028232642993789046435548759958047513826466"
        );
        let pi_b = test_utils::to_g2_bn254!(
            { "13732822754685216699494313130307949314358351264391615026657641877459312805921", "15242155868134051061519617910834758681213622395767565233201715494163382082631"},
            { "6040988303910179137905227500476692522731546381459192177262195830159275686930", "6102931310051425482112222546940021723264293724138375749141717027794878004116"}
        );
        let pi_c = test_utils::to_g1_bn254!(
            "8027438340805100823503975850514290391260085605647857333256305214246713987397",
            "17368354082387796246978493062684369586080079518888794624836970993708830684295"
        );
        assert_eq!(proof.pi_a, pi_a);
        assert_eq!(proof.pi_b, pi_b);
        assert_eq!(proof.pi_c, pi_c);
        assert_eq!(proof.protocol, "groth16");
        assert_eq!(proof.curve, "bn128");
    }

    #[test]
    fn json_round_trip() {
        let proof = serde_json::from_str::<JsonProof<Bn254>>(PROOF_JSON).unwrap();
        let serialized = serde_json::to_string(&proof).unwrap();
        let round_tripped = serde_json::from_str::<JsonProof<Bn254>>(&serialized).unwrap();
        assert_eq!(round_tripped, proof);
    }

    #[test]
    fn converts_to_and_from_the_engine_proof() {
        let json = serde_json::from_str::<JsonProof<Bn254>>(PROOF_JSON).unwrap();
        let proof: groth16::Proof<Bn254> = serde_json::from_str::<JsonProof<Bn254>>(PROOF_JSON)
            .unwrap()
            .into();
        assert_eq!(proof.a, json.pi_a);
        assert_eq!(proof.b, json.pi_b);
        assert_eq!(proof.c, json.pi_c);

        let back = JsonProof::from(proof);
        assert_eq!(back, json);
    }

    #[test]
    fn rejects_point_off_the_curve() {
        let tampered = PROOF_JSON.replacen(
            "5969123522090814361171588228229368332719697989145919311329989202301051796912",
            "5969123522090814361171588228229368332719697989145919311329989202301051796913",
            1,
        );
        assert!(serde_json::from_str::<JsonProof<Bn254>>(&tampered).is_err());
    }
}
