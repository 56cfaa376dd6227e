//! Native binary model format.
//!
//! A model file is a 32-byte header followed by a Postcard-encoded
//! [`Payload`]. The header is enough to identify the file, reject versions
//! this build cannot read, and check payload integrity before anything is
//! deserialized.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ Header (32 bytes)            │
//! ├──────────────────────────────┤
//! │ Payload (payload_size bytes) │
//! └──────────────────────────────┘
//! ```
//!
//! Bytes after the payload are ignored.

use std::io::Write;

use bon::Builder;
use thiserror::Error;

use super::payload::{Payload, PayloadV1, PredictorPayload};
use crate::inference::{Predictor, PredictorKind};
use crate::model::{Model, TaskKind};

// ============================================================================
// Constants
// ============================================================================

/// Magic bytes identifying a model file.
pub const MAGIC: &[u8; 4] = b"CNPY";

pub const CURRENT_VERSION_MAJOR: u8 = 1;
pub const CURRENT_VERSION_MINOR: u8 = 0;

/// Size of the format header in bytes.
pub const HEADER_SIZE: usize = 32;

fn predictor_tag(kind: PredictorKind) -> u8 {
    match kind {
        PredictorKind::Linear => 0,
        PredictorKind::TreeEnsemble => 1,
    }
}

fn predictor_from_tag(tag: u8) -> Option<PredictorKind> {
    match tag {
        0 => Some(PredictorKind::Linear),
        1 => Some(PredictorKind::TreeEnsemble),
        _ => None,
    }
}

// ============================================================================
// Format Flags
// ============================================================================

/// Bitfield of optional content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormatFlags(u16);

impl FormatFlags {
    /// Every tree carries cover statistics.
    pub const HAS_COVERS: u16 = 1 << 0;

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn contains(self, flag: u16) -> bool {
        (self.0 & flag) != 0
    }

    pub fn set(&mut self, flag: u16) {
        self.0 |= flag;
    }
}

// ============================================================================
// Format Header
// ============================================================================

/// 32-byte header, little-endian.
///
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       4     Magic ("CNPY")
/// 4       1     Version major
/// 5       1     Version minor
/// 6       1     Predictor (0 = linear, 1 = tree ensemble)
/// 7       1     Task (0 = regression, 1 = binary, 2 = multiclass)
/// 8       2     Flags
/// 10      2     Reserved
/// 12      4     Payload size (bytes)
/// 16      4     CRC32 of payload
/// 20      4     Number of features
/// 24      4     Number of outputs
/// 28      4     Reserved
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatHeader {
    pub version_major: u8,
    pub version_minor: u8,
    pub predictor: PredictorKind,
    pub task: TaskKind,
    pub flags: FormatFlags,
    pub payload_size: u32,
    pub checksum: u32,
    pub n_features: u32,
    pub n_outputs: u32,
}

impl FormatHeader {
    /// Header at the current version, with an empty payload.
    pub fn new(predictor: PredictorKind, task: TaskKind, n_features: u32, n_outputs: u32) -> Self {
        Self {
            version_major: CURRENT_VERSION_MAJOR,
            version_minor: CURRENT_VERSION_MINOR,
            predictor,
            task,
            flags: FormatFlags::empty(),
            payload_size: 0,
            checksum: 0,
            n_features,
            n_outputs,
        }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(MAGIC);
        buf[4] = self.version_major;
        buf[5] = self.version_minor;
        buf[6] = predictor_tag(self.predictor);
        buf[7] = self.task.tag();
        buf[8..10].copy_from_slice(&self.flags.bits().to_le_bytes());
        buf[12..16].copy_from_slice(&self.payload_size.to_le_bytes());
        buf[16..20].copy_from_slice(&self.checksum.to_le_bytes());
        buf[20..24].copy_from_slice(&self.n_features.to_le_bytes());
        buf[24..28].copy_from_slice(&self.n_outputs.to_le_bytes());
        buf
    }

    /// Parse a header.
    ///
    /// The version is checked right after the magic, so a newer file is
    /// reported as [`DecodeError::UnsupportedVersion`] even if it redefines
    /// the remaining fields.
    pub fn from_bytes(buf: &[u8; HEADER_SIZE]) -> Result<Self, DecodeError> {
        if &buf[0..4] != MAGIC {
            return Err(DecodeError::NotAModel);
        }

        let version_major = buf[4];
        let version_minor = buf[5];
        if (version_major, version_minor) > (CURRENT_VERSION_MAJOR, CURRENT_VERSION_MINOR) {
            return Err(DecodeError::UnsupportedVersion {
                major: version_major,
                minor: version_minor,
            });
        }

        let predictor = predictor_from_tag(buf[6])
            .ok_or_else(|| DecodeError::CorruptPayload(format!("unknown predictor tag {}", buf[6])))?;
        let task = TaskKind::from_tag(buf[7])
            .ok_or_else(|| DecodeError::CorruptPayload(format!("unknown task tag {}", buf[7])))?;
        let read_u32 = |offset: usize| {
            u32::from_le_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
        };

        Ok(Self {
            version_major,
            version_minor,
            predictor,
            task,
            flags: FormatFlags::from_bits(u16::from_le_bytes([buf[8], buf[9]])),
            payload_size: read_u32(12),
            checksum: read_u32(16),
            n_features: read_u32(20),
            n_outputs: read_u32(24),
        })
    }

    /// Parse the header at the start of `bytes`.
    pub fn read(bytes: &[u8]) -> Result<Self, DecodeError> {
        let buf: &[u8; HEADER_SIZE] = bytes
            .get(..HEADER_SIZE)
            .and_then(|head| head.try_into().ok())
            .ok_or(DecodeError::Truncated {
                expected: HEADER_SIZE,
                actual: bytes.len(),
            })?;
        Self::from_bytes(buf)
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while encoding a model.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encoding error: {0}")]
    Encoding(#[from] postcard::Error),

    /// A size does not fit the header's 32-bit fields.
    #[error("{field} of {value} exceeds the format limit")]
    TooLarge { field: &'static str, value: usize },
}

/// Errors that can occur while decoding a model.
///
/// A failed decode never yields a partially constructed model.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("not a model file")]
    NotAModel,

    #[error(
        "model format {major}.{minor} is newer than supported {}.{}",
        CURRENT_VERSION_MAJOR,
        CURRENT_VERSION_MINOR
    )]
    UnsupportedVersion { major: u8, minor: u8 },

    #[error("checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("file truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// Payload decoded but is structurally invalid or disagrees with the header.
    #[error("corrupt payload: {0}")]
    CorruptPayload(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("decoding error: {0}")]
    Decoding(#[from] postcard::Error),
}

// ============================================================================
// Options
// ============================================================================

/// Options for reading model bytes.
#[derive(Debug, Clone, Builder)]
pub struct ReadOptions {
    /// Verify the payload CRC32 before decoding.
    #[builder(default = true)]
    pub verify_checksum: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            verify_checksum: true,
        }
    }
}

/// CRC32 of `data`.
pub fn compute_checksum(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

// ============================================================================
// Native Codec
// ============================================================================

/// Frames payloads with a header and unframes them again.
#[derive(Debug, Clone, Default)]
pub struct NativeCodec {
    options: ReadOptions,
}

impl NativeCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ReadOptions) -> Self {
        Self { options }
    }

    /// Write header and payload, filling in the header's size and checksum.
    pub fn write_to<W: Write>(
        &self,
        writer: &mut W,
        header: &mut FormatHeader,
        payload: &[u8],
    ) -> Result<(), EncodeError> {
        header.payload_size = u32::try_from(payload.len()).map_err(|_| EncodeError::TooLarge {
            field: "payload size",
            value: payload.len(),
        })?;
        header.checksum = compute_checksum(payload);
        writer.write_all(&header.to_bytes())?;
        writer.write_all(payload)?;
        Ok(())
    }

    /// Split `bytes` into a parsed header and its payload slice.
    pub fn read<'a>(&self, bytes: &'a [u8]) -> Result<(FormatHeader, &'a [u8]), DecodeError> {
        let header = FormatHeader::read(bytes)?;

        let end = HEADER_SIZE + header.payload_size as usize;
        let payload = bytes.get(HEADER_SIZE..end).ok_or(DecodeError::Truncated {
            expected: end,
            actual: bytes.len(),
        })?;

        if self.options.verify_checksum {
            let actual = compute_checksum(payload);
            if actual != header.checksum {
                return Err(DecodeError::ChecksumMismatch {
                    expected: header.checksum,
                    actual,
                });
            }
        }

        Ok((header, payload))
    }
}

// ============================================================================
// Models
// ============================================================================

fn to_u32(field: &'static str, value: usize) -> Result<u32, EncodeError> {
    u32::try_from(value).map_err(|_| EncodeError::TooLarge { field, value })
}

pub(crate) fn encode_model(model: &Model) -> Result<Vec<u8>, EncodeError> {
    let payload = postcard::to_allocvec(&Payload::V1(PayloadV1::from(model)))?;

    let predictor = model.predictor();
    let mut header = FormatHeader::new(
        predictor.kind(),
        model.task().kind(),
        to_u32("feature count", model.n_features())?,
        to_u32("output count", predictor.n_outputs())?,
    );
    if has_covers(predictor) {
        header.flags.set(FormatFlags::HAS_COVERS);
    }

    let mut bytes = Vec::with_capacity(HEADER_SIZE + payload.len());
    NativeCodec::new().write_to(&mut bytes, &mut header, &payload)?;
    Ok(bytes)
}

pub(crate) fn decode_model(bytes: &[u8], options: &ReadOptions) -> Result<Model, DecodeError> {
    let (header, payload) = NativeCodec::with_options(options.clone()).read(bytes)?;

    let Payload::V1(payload) = postcard::from_bytes::<Payload>(payload)?;
    check_predictor_kind(&header, &payload.predictor)?;
    let model = Model::try_from(payload)?;
    check_header(&header, &model)?;
    Ok(model)
}

fn has_covers(predictor: &Predictor) -> bool {
    match predictor {
        Predictor::Linear(_) => false,
        Predictor::TreeEnsemble(forest) => forest.n_trees() > 0 && forest.has_covers(),
    }
}

fn check_predictor_kind(header: &FormatHeader, predictor: &PredictorPayload) -> Result<(), DecodeError> {
    let kind = match predictor {
        PredictorPayload::Linear(_) => PredictorKind::Linear,
        PredictorPayload::TreeEnsemble(_) => PredictorKind::TreeEnsemble,
    };
    if kind != header.predictor {
        return Err(DecodeError::CorruptPayload(format!(
            "header declares a {:?} predictor, payload holds {:?}",
            header.predictor, kind
        )));
    }
    Ok(())
}

fn check_header(header: &FormatHeader, model: &Model) -> Result<(), DecodeError> {
    let mismatch = |field: &str, header_value: String, payload_value: String| {
        DecodeError::CorruptPayload(format!(
            "header {field} {header_value} disagrees with payload {payload_value}"
        ))
    };
    if header.task != model.task().kind() {
        return Err(mismatch(
            "task",
            header.task.to_string(),
            model.task().kind().to_string(),
        ));
    }
    if header.n_features as usize != model.n_features() {
        return Err(mismatch(
            "feature count",
            header.n_features.to_string(),
            model.n_features().to_string(),
        ));
    }
    if header.n_outputs as usize != model.predictor().n_outputs() {
        return Err(mismatch(
            "output count",
            header.n_outputs.to_string(),
            model.predictor().n_outputs().to_string(),
        ));
    }
    let flagged = header.flags.contains(FormatFlags::HAS_COVERS);
    if flagged != has_covers(model.predictor()) {
        return Err(mismatch(
            "covers flag",
            flagged.to_string(),
            has_covers(model.predictor()).to_string(),
        ));
    }
    Ok(())
}

// ============================================================================
// Inspection
// ============================================================================

/// Metadata available from the header alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    pub version: (u8, u8),
    pub predictor: PredictorKind,
    pub task: TaskKind,
    pub n_features: usize,
    pub n_outputs: usize,
    pub has_covers: bool,
    pub payload_size: usize,
}

impl ModelInfo {
    /// Read model metadata without decoding or verifying the payload.
    pub fn inspect(bytes: &[u8]) -> Result<Self, DecodeError> {
        let header = FormatHeader::read(bytes)?;
        Ok(Self {
            version: (header.version_major, header.version_minor),
            predictor: header.predictor,
            task: header.task,
            n_features: header.n_features as usize,
            n_outputs: header.n_outputs as usize,
            has_covers: header.flags.contains(FormatFlags::HAS_COVERS),
            payload_size: header.payload_size as usize,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn header_roundtrip() {
        let header = FormatHeader {
            version_major: 1,
            version_minor: 0,
            predictor: PredictorKind::TreeEnsemble,
            task: TaskKind::MulticlassClassification,
            flags: FormatFlags::from_bits(FormatFlags::HAS_COVERS),
            payload_size: 12345,
            checksum: 0xDEADBEEF,
            n_features: 100,
            n_outputs: 3,
        };
        let bytes = header.to_bytes();
        assert_eq!(&bytes[0..4], b"CNPY");
        assert_eq!(FormatHeader::from_bytes(&bytes).unwrap(), header);
    }

    #[test]
    fn header_wrong_magic() {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(b"XXXX");
        assert!(matches!(FormatHeader::from_bytes(&buf), Err(DecodeError::NotAModel)));
    }

    #[test]
    fn newer_versions_are_rejected() {
        for (major, minor) in [(2, 0), (1, 1), (99, 0)] {
            let mut header = FormatHeader::new(PredictorKind::Linear, TaskKind::Regression, 1, 1);
            header.version_major = major;
            header.version_minor = minor;
            let mut bytes = header.to_bytes();
            // A future version may reuse tag values this build does not know.
            bytes[6] = 0xFF;
            assert!(matches!(
                FormatHeader::from_bytes(&bytes),
                Err(DecodeError::UnsupportedVersion { major: m, minor: n }) if m == major && n == minor
            ));
        }
    }

    #[test]
    fn unknown_tags_are_corrupt() {
        let mut bytes = FormatHeader::new(PredictorKind::Linear, TaskKind::Regression, 1, 1).to_bytes();
        bytes[7] = 9;
        assert!(matches!(
            FormatHeader::from_bytes(&bytes),
            Err(DecodeError::CorruptPayload(_))
        ));
    }

    #[test]
    fn short_header_is_truncated() {
        assert!(matches!(
            FormatHeader::read(b"CNPY"),
            Err(DecodeError::Truncated { expected: 32, actual: 4 })
        ));
    }

    #[test]
    fn codec_write_read_roundtrip() {
        let codec = NativeCodec::new();
        let mut header = FormatHeader::new(PredictorKind::TreeEnsemble, TaskKind::Regression, 10, 1);
        let mut buffer = Vec::new();
        codec.write_to(&mut buffer, &mut header, b"test payload data").unwrap();
        buffer.extend_from_slice(b"trailing");

        let (read_header, payload) = codec.read(&buffer).unwrap();
        assert_eq!(read_header, header);
        assert_eq!(payload, b"test payload data");
    }

    #[test]
    fn codec_detects_corruption() {
        let codec = NativeCodec::new();
        let mut header = FormatHeader::new(PredictorKind::Linear, TaskKind::Regression, 5, 1);
        let mut buffer = Vec::new();
        codec.write_to(&mut buffer, &mut header, b"some model data").unwrap();
        buffer[HEADER_SIZE + 5] ^= 0xFF;

        assert!(matches!(
            codec.read(&buffer),
            Err(DecodeError::ChecksumMismatch { .. })
        ));
        let lenient = NativeCodec::with_options(ReadOptions::builder().verify_checksum(false).build());
        assert!(lenient.read(&buffer).is_ok());
    }

    #[test]
    fn header_must_agree_with_payload() {
        let model = testing::linear_regression_model();
        let mut bytes = encode_model(&model).unwrap();
        bytes[20] = bytes[20].wrapping_add(1);
        assert!(matches!(
            decode_model(&bytes, &ReadOptions::default()),
            Err(DecodeError::CorruptPayload(_))
        ));

        let mut bytes = encode_model(&model).unwrap();
        bytes[6] = 1;
        assert!(matches!(
            decode_model(&bytes, &ReadOptions::default()),
            Err(DecodeError::CorruptPayload(_))
        ));
    }

    #[test]
    fn inspect_reads_header_only() {
        let model = testing::tree_multiclass_model();
        let mut bytes = encode_model(&model).unwrap();
        let payload_len = bytes.len() - HEADER_SIZE;
        bytes.truncate(HEADER_SIZE);

        let info = ModelInfo::inspect(&bytes).unwrap();
        assert_eq!(info.version, (CURRENT_VERSION_MAJOR, CURRENT_VERSION_MINOR));
        assert_eq!(info.predictor, PredictorKind::TreeEnsemble);
        assert_eq!(info.task, TaskKind::MulticlassClassification);
        assert_eq!(info.n_features, model.n_features());
        assert_eq!(info.n_outputs, 3);
        assert!(info.has_covers);
        assert_eq!(info.payload_size, payload_len);
    }
}
