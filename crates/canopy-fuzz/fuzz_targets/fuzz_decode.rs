#![no_main]

use libfuzzer_sys::fuzz_target;

use canopy::io::ModelInfo;
use canopy::{Model, ReadOptions};

fuzz_target!(|data: &[u8]| {
    let _ = ModelInfo::inspect(data);
    let _ = Model::from_bytes(data);
    let unchecked = ReadOptions::builder().verify_checksum(false).build();
    let _ = Model::from_bytes_with(data, &unchecked);
});
