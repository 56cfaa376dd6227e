#![no_main]

use libfuzzer_sys::fuzz_target;

use canopy::testing;
use canopy::{PredictInput, PredictOptions};

// Arbitrary text in every column of every fixture model.
fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let input = ["age", "income", "color", "review", "title"]
        .into_iter()
        .fold(PredictInput::new(), |input, column| input.with(column, text.as_ref()));
    let options = PredictOptions::builder()
        .compute_feature_contributions(true)
        .build()
        .unwrap_or_default();
    for model in testing::all_models() {
        let _ = model.predict_one(&input, &options);
    }
});
