//! Model serialization.
//!
//! - [`native`]: header framing, checksums, version gate, errors
//! - [`payload`]: the Postcard schema of the payload
//! - `convert`: payload to runtime types and back, with validation

mod convert;
pub mod native;
pub mod payload;

pub use native::{
    compute_checksum, DecodeError, EncodeError, FormatFlags, FormatHeader, ModelInfo, NativeCodec,
    ReadOptions, CURRENT_VERSION_MAJOR, CURRENT_VERSION_MINOR, HEADER_SIZE, MAGIC,
};
pub use payload::{
    FeatureGroupPayload, ForestPayload, LinearPayload, Payload, PayloadV1, PredictorPayload,
    TaskPayload, TreePayload, VocabularyEntryPayload,
};
