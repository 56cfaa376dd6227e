use canopy::testing;
use canopy::PredictInput;

/// `n` records cycling through the fixture inputs.
pub fn repeated_inputs(n: usize) -> Vec<PredictInput> {
    testing::sample_inputs().into_iter().cycle().take(n).collect()
}
