#![no_main]

use libfuzzer_sys::fuzz_target;
use windowed_cardinality::LinearCounter;
use wyhash::wyhash;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let capacity = (wyhash(data, 0) % 4096) as usize + 1;
    let mut counter = LinearCounter::<wyhash::WyHash>::new(capacity).unwrap();
    let mut previous = 0.0;
    for chunk in data.chunks(4) {
        counter.insert(&chunk);
        match counter.estimate() {
            Ok(estimate) => {
                assert!(estimate.is_finite());
                assert!(estimate >= previous);
                previous = estimate;
            }
            Err(_) => assert!(counter.is_saturated()),
        }
    }
});
