#![no_main]

use arewefastyet::compare::compare_runs;
use arewefastyet::config::EngineConfig;
use arewefastyet::store::Dataset;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Any dataset that parses must be comparable without panicking
        if let Ok(dataset) = Dataset::from_json_str(input) {
            let (old, new) = dataset.runs.split_at(dataset.runs.len() / 2);
            let _ = compare_runs(old, new, &EngineConfig::default());
        }
    }
});
