#![no_main]

use libfuzzer_sys::fuzz_target;
use windowed_cardinality::{Error, WindowConfig, WindowManager};

fuzz_target!(|data: &[u8]| {
    let mut manager: WindowManager =
        WindowManager::new(WindowConfig::new(60, 1024).unwrap()).unwrap();
    let mut last_emitted = None;
    for chunk in data.chunks(3) {
        let ts = i64::from(chunk[0]) * 7;
        match manager.observe(ts, chunk) {
            Ok(Some(estimate)) => {
                // emitted windows strictly advance
                assert!(last_emitted < Some(estimate.window_index));
                last_emitted = Some(estimate.window_index);
            }
            Ok(None) => {}
            Err(Error::LateEvent { window_index, current_window_index, .. }) => {
                assert!(window_index < current_window_index)
            }
            Err(e) => panic!("unexpected error {}", e),
        }
    }
    if let Some(estimate) = manager.flush() {
        assert!(last_emitted < Some(estimate.window_index));
    }
});
