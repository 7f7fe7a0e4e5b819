use ark_serialize::SerializationError;
use thiserror::Error;

/// Errors raised while parsing circuit artifacts.
///
/// Every variant means the artifact could not be loaded; none of them is
/// recoverable by retrying with the same bytes.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The file does not start with the expected magic bytes.
    #[error("wrong magic bytes: expected \"{expected}\", got \"{actual}\"")]
    WrongHeader {
        /// Magic the parser was looking for.
        expected: String,
        /// Magic actually present.
        actual: String,
    },
    /// The file version is newer than this parser supports.
    #[error("max supported {artifact} version is {supported}, but got {actual}")]
    UnsupportedVersion {
        /// Artifact kind ("r1cs", "wtns", "zkey").
        artifact: &'static str,
        /// Highest version this parser understands.
        supported: u32,
        /// Version found in the file.
        actual: u32,
    },
    /// The file declares more sections than the format allows.
    #[error("expected at most {expected} sections, but got {actual}")]
    SectionCount {
        /// Sections the format allows.
        expected: u32,
        /// Sections declared by the file.
        actual: u32,
    },
    /// The proving key was produced for a proof system other than Groth16.
    #[error("unsupported prover type {0}, expected Groth16 (1)")]
    WrongProverType(u32),
    /// The scalar-field modulus in the file does not match the chosen curve.
    #[error("scalar field of the file does not match the chosen curve")]
    WrongScalarField,
    /// The base-field modulus in the file does not match the chosen curve.
    #[error("base field of the file does not match the chosen curve")]
    WrongBaseField,
    /// A section id occurs twice in the section table.
    #[error("section {0} appears more than once")]
    DuplicateSection(u32),
    /// A required section is absent.
    #[error("section {0} is missing")]
    MissingSection(u32),
    /// A section's byte length contradicts the counts in the header.
    #[error("section {section} has size {actual}, expected {expected}")]
    WrongSectionSize {
        /// Section id.
        section: u32,
        /// Size implied by the header.
        expected: u64,
        /// Size recorded in the section table.
        actual: u64,
    },
    /// A sparse-matrix entry points outside the A/B matrices.
    #[error("coefficient entry references matrix {0}, expected 0 (A) or 1 (B)")]
    InvalidMatrixIndex(u32),
    /// A constraint references a wire the header does not declare.
    #[error("constraint references wire {actual}, expected fewer than {expected}")]
    InvalidWireIndex {
        /// Wires declared by the header.
        expected: usize,
        /// Wire index found in the constraint.
        actual: usize,
    },
    /// The wire-to-label map does not pin wire 0 to label 0.
    #[error("wire 0 must map to label 0")]
    InvalidWireMapping,
    /// A key table length contradicts the circuit counts in the header.
    #[error("proving key table `{table}` has {actual} entries, expected {expected}")]
    MalformedKey {
        /// Name of the offending table.
        table: &'static str,
        /// Entry count implied by the header.
        expected: usize,
        /// Entry count found.
        actual: usize,
    },
    /// A field element or curve point failed to deserialize; points that are
    /// off-curve or outside the prime-order subgroup land here.
    #[error(transparent)]
    SerializationError(#[from] SerializationError),
    /// The underlying reader failed or the file is truncated.
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}
