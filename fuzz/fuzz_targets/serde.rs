#![no_main]

use libfuzzer_sys::fuzz_target;
use windowed_cardinality::LinearCounter;

fuzz_target!(|data: &[u8]| {
    if let Ok(mut counter) = serde_json::from_slice::<LinearCounter>(data) {
        counter.insert(&1);
        assert!(!counter.is_empty());
    }
});
