//! The JSON verification-key format emitted by snarkjs.

use ark_ec::pairing::Pairing;
use groth16::{PreparedVerifyingKey, VerifyingKey, prepare_verifying_key};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer, de};

use crate::ParseError;
use crate::traits::{PairingBridge, PrimeFieldBridge};

/// A verification key in snarkjs' JSON layout.
///
/// Carries the same four points and IC table as
/// [`groth16::VerifyingKey`], plus the precomputed `e(α, β)` snarkjs
/// stores alongside them.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonVerificationKey<P: Pairing + PairingBridge>
where
    P::BaseField: PrimeFieldBridge,
    P::ScalarField: PrimeFieldBridge,
{
    /// Always `"groth16"`.
    pub protocol: String,
    /// The curve name in circom spelling.
    pub curve: String,
    /// Number of public inputs (the constant one not counted).
    #[serde(rename = "nPublic")]
    pub n_public: usize,
    /// `[α]₁`.
    #[serde(rename = "vk_alpha_1")]
    #[serde(serialize_with = "P::serialize_g1::<_>")]
    #[serde(deserialize_with = "P::deserialize_g1_element::<_>")]
    pub alpha_1: P::G1Affine,
    /// `[β]₂`.
    #[serde(rename = "vk_beta_2")]
    #[serde(serialize_with = "P::serialize_g2::<_>")]
    #[serde(deserialize_with = "P::deserialize_g2_element::<_>")]
    pub beta_2: P::G2Affine,
    /// `[γ]₂`.
    #[serde(rename = "vk_gamma_2")]
    #[serde(serialize_with = "P::serialize_g2::<_>")]
    #[serde(deserialize_with = "P::deserialize_g2_element::<_>")]
    pub gamma_2: P::G2Affine,
    /// `[δ]₂`.
    #[serde(rename = "vk_delta_2")]
    #[serde(serialize_with = "P::serialize_g2::<_>")]
    #[serde(deserialize_with = "P::deserialize_g2_element::<_>")]
    pub delta_2: P::G2Affine,
    /// `e(α, β)`.
    #[serde(rename = "vk_alphabeta_12")]
    #[serde(serialize_with = "P::serialize_gt::<_>")]
    #[serde(deserialize_with = "P::deserialize_gt_element::<_>")]
    pub alpha_beta_gt: P::TargetField,
    /// The public-input bases, one per instance variable.
    #[serde(rename = "IC")]
    #[serde(serialize_with = "serialize_g1_sequence::<_, P>")]
    #[serde(deserialize_with = "deserialize_g1_sequence::<_, P>")]
    pub ic: Vec<P::G1Affine>,
}

fn serialize_g1_sequence<S: Serializer, P: Pairing + PairingBridge>(
    points: &[P::G1Affine],
    ser: S,
) -> Result<S::Ok, S::Error>
where
    P::BaseField: PrimeFieldBridge,
    P::ScalarField: PrimeFieldBridge,
{
    let mut seq = ser.serialize_seq(Some(points.len()))?;
    for point in points {
        seq.serialize_element(&P::g1_to_strings_projective(point))?;
    }
    seq.end()
}

fn deserialize_g1_sequence<'de, D, P: Pairing + PairingBridge>(
    deserializer: D,
) -> Result<Vec<P::G1Affine>, D::Error>
where
    D: de::Deserializer<'de>,
    P::BaseField: PrimeFieldBridge,
    P::ScalarField: PrimeFieldBridge,
{
    let points = Vec::<Vec<String>>::deserialize(deserializer)?;
    points
        .into_iter()
        .map(|point| {
            let [x, y, z] = point.as_slice() else {
                return Err(de::Error::custom(
                    "expected three projective coordinates for a point on G1",
                ));
            };
            P::g1_from_strings_projective(x, y, z)
                .map_err(|_| de::Error::custom("invalid projective point on G1"))
        })
        .collect()
}

impl<P: Pairing + PairingBridge> JsonVerificationKey<P>
where
    P::BaseField: PrimeFieldBridge,
    P::ScalarField: PrimeFieldBridge,
{
    /// Converts into the engine's prepared key, reusing the stored
    /// `e(α, β)` instead of recomputing the pairing.
    pub fn prepare(self) -> Result<PreparedVerifyingKey<P>, ParseError> {
        use ark_ec::{AffineRepr, CurveGroup};
        use core::ops::Neg;

        let alpha_beta = self.alpha_beta_gt;
        let gamma_neg = self.gamma_2.into_group().neg().into_affine().into();
        let delta_neg = self.delta_2.into_group().neg().into_affine().into();
        let vk: VerifyingKey<P> = self.try_into()?;
        Ok(PreparedVerifyingKey {
            vk,
            alpha_g1_beta_g2: alpha_beta,
            gamma_g2_neg_pc: gamma_neg,
            delta_g2_neg_pc: delta_neg,
        })
    }
}

impl<P: Pairing + PairingBridge> TryFrom<JsonVerificationKey<P>> for VerifyingKey<P>
where
    P::BaseField: PrimeFieldBridge,
    P::ScalarField: PrimeFieldBridge,
{
    type Error = ParseError;

    fn try_from(json: JsonVerificationKey<P>) -> Result<Self, ParseError> {
        if json.ic.len() != json.n_public + 1 {
            return Err(ParseError::MalformedKey {
                table: "IC",
                expected: json.n_public + 1,
                actual: json.ic.len(),
            });
        }
        Ok(Self {
            alpha_g1: json.alpha_1,
            beta_g2: json.beta_2,
            gamma_g2: json.gamma_2,
            delta_g2: json.delta_2,
            gamma_abc_g1: json.ic,
        })
    }
}

impl<P: Pairing + PairingBridge> From<VerifyingKey<P>> for JsonVerificationKey<P>
where
    P::BaseField: PrimeFieldBridge,
    P::ScalarField: PrimeFieldBridge,
{
    fn from(vk: VerifyingKey<P>) -> Self {
        let prepared = prepare_verifying_key(&vk);
        Self {
            protocol: "groth16".to_owned(),
            curve: P::CURVE_NAME.to_owned(),
            n_public: vk.gamma_abc_g1.len() - 1,
            alpha_1: vk.alpha_g1,
            beta_2: vk.beta_g2,
            gamma_2: vk.gamma_g2,
            delta_2: vk.delta_g2,
            alpha_beta_gt: prepared.alpha_g1_beta_g2,
            ic: vk.gamma_abc_g1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::JsonVerificationKey;
    use crate::ParseError;
    use crate::test_utils;
    use ark_bn254::Bn254;
    use groth16::VerifyingKey;
    use std::str::FromStr;

    const VK_JSON: &str = r#"{
        "protocol": "groth16",
        "curve": "bn128",
        "nPublic": 1,
        "vk_alpha_1": [
            "16899422092493380665487369855810985762968608626455123789954325961085508316984",
            "11126583514615198837401836505802377658281069969464374246623821884538475740573",
            "1"
        ],
        "vk_beta_2": [
            ["10507543441632391771444308193378912964353702039245296649929512844719350719061",
             "18201322790656668038537601329094316169506292175603805191741014817443184049262"],
            ["5970405197328671009015216309153477729292937823545171027250144292199028398006",
             "207690659672174295265842461226025308763643182574816306177651013602294932409"],
            ["1", "0"]
        ],
        "vk_gamma_2": [
            ["10857046999023057135944570762232829481370756359578518086990519993285655852781",
             "11559732032986387107991004021392285783925812861821192530917403151452391805634"],
            ["8495653923123431417604973247489272438418190587263600148770280649306958101930",
             "4082367875863433681332203403145435568316851327593401208105741076214120093531"],
            ["1", "0"]
        ],
        "vk_delta_2": [
            ["16155635570759079539128338844496116072647798864000233687303657902717776158999",
             "146722472349298011683444548694315820674090918095096001856936731325601586110"],
            ["7220557679759413200896918190625936046017159618724594116959480938714251928850",
             "3740741795440491235944811815904112252316619638122978144672498770442910025884"],
            ["1", "0"]
        ],
        "vk_alphabeta_12": [
            [["16538785791976368996028573001047494279971959674976400375908002449802111164210",
              "17311099400175814384162244991310888068564323701034150916749873601372080366545"],
             ["6190374261283519082602974907779713353906416008756241816830276080558497621488",
              "5946497939975323131559609840334502947229444050838397884136261522455069934142"],
             ["18660892217118600624251818120445899943943785636603359483071997396426302577570",
              "18531687330071011377875481700311081568396123435430215454992195853578365394388"]],
            [["5476127288440774450864859467181646064764995969290605718134676080503271266731",
              "3399564724672231262367838805943403806290653366654941312613814022309517035043"],
             ["4672701693668323185944980624424920973243633836894733786127181806645734926322",
              "7402927066587580894909225234727377776130731489482028867669208914818027294939"],
             ["11345717037360228259307455612221550284384863263968564709545071871541242621150",
              "13027534640849390915265700715948188003828506929766238127775224004400946253786"]]
        ],
        "IC": [
            ["17064056514210178269621297150176790945669784643731237949186503569701111845663",
             "5160771857172547017310246971961987180872028348077571247747329170768684330052",
             "1"],
            ["19547536507588365344778723326587455846790642159887261127893730469532513538882",
             "10737415594461993507153866894812637432840367562913937920244709428556226500845",
             "1"]
        ]
    }"#;

    #[test]
    fn deserializes_snarkjs_verification_key() {
        let vk = serde_json::from_str::<JsonVerificationKey<Bn254>>(VK_JSON).unwrap();

        let alpha_1 = test_utils::to_g1_bn254!(
            "16899422092493380665487369855810985762968608626455123789954325961085508316984",
            "11126583514615198837401836505802377658281069969464374246623821884538475740573"
        );
        let beta_2 = test_utils::to_g2_bn254!(
            { "10507543441632391771444308193378912964353702039245296649929512844719350719061", "18201322790656668038537601329094316169506292175603805191741014817443184049262"},
            { "5970405197328671009015216309153477729292937823545171027250144292199028398006", "207690659672174295265842461226025308763643182574816306177651013602294932409"}
        );
        let gamma_2 = test_utils::to_g2_bn254!(
            { "10857046999023057135944570762232829481370756359578518086990519993285655852781", "11559732032986387107991004021392285783925812861821192530917403151452391805634"},
            { "8495653923123431417604973247489272438418190587263600148770280649306958101930", "4082367875863433681332203403145435568316851327593401208105741076214120093531"}
        );
        let delta_2 = test_utils::to_g2_bn254!(
            { "16155635570759079539128338844496116072647798864000233687303657902717776158999", "146722472349298011683444548694315820674090918095096001856936731325601586110"},
            { "7220557679759413200896918190625936046017159618724594116959480938714251928850", "3740741795440491235944811815904112252316619638122978144672498770442910025884"}
        );

        assert_eq!(vk.protocol, "groth16");
        assert_eq!(vk.curve, "bn128");
        assert_eq!(vk.n_public, 1);
        assert_eq!(vk.alpha_1, alpha_1);
        assert_eq!(vk.beta_2, beta_2);
        assert_eq!(vk.gamma_2, gamma_2);
        assert_eq!(vk.delta_2, delta_2);
        assert_eq!(vk.ic.len(), 2);
    }

    #[test]
    fn json_round_trip() {
        let vk = serde_json::from_str::<JsonVerificationKey<Bn254>>(VK_JSON).unwrap();
        let serialized = serde_json::to_string(&vk).unwrap();
        let round_tripped =
            serde_json::from_str::<JsonVerificationKey<Bn254>>(&serialized).unwrap();
        assert_eq!(round_tripped, vk);
    }

    #[test]
    fn stored_alpha_beta_matches_the_pairing() {
        let vk = serde_json::from_str::<JsonVerificationKey<Bn254>>(VK_JSON).unwrap();
        let engine_vk: VerifyingKey<Bn254> =
            serde_json::from_str::<JsonVerificationKey<Bn254>>(VK_JSON)
                .unwrap()
                .try_into()
                .unwrap();
        let prepared = groth16::prepare_verifying_key(&engine_vk);
        assert_eq!(prepared.alpha_g1_beta_g2, vk.alpha_beta_gt);
    }

    #[test]
    fn engine_round_trip_preserves_the_key() {
        let vk = serde_json::from_str::<JsonVerificationKey<Bn254>>(VK_JSON).unwrap();
        let engine_vk: VerifyingKey<Bn254> =
            serde_json::from_str::<JsonVerificationKey<Bn254>>(VK_JSON)
                .unwrap()
                .try_into()
                .unwrap();
        let back = JsonVerificationKey::from(engine_vk);
        assert_eq!(back, vk);
    }

    #[test]
    fn ic_length_must_match_n_public() {
        let tampered = VK_JSON.replacen("\"nPublic\": 1", "\"nPublic\": 2", 1);
        let vk = serde_json::from_str::<JsonVerificationKey<Bn254>>(&tampered).unwrap();
        let result: Result<VerifyingKey<Bn254>, _> = vk.try_into();
        assert!(matches!(result, Err(ParseError::MalformedKey { .. })));
    }
}
