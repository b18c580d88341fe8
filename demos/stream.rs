use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use windowed_cardinality::{Cardinality, Error, WindowConfig, WindowEstimate, WindowManager};

fn print(estimate: &WindowEstimate) {
    match estimate.cardinality {
        Cardinality::Estimated(value) => println!(
            "window {} (start {}): ~{:.0} distinct users",
            estimate.window_index, estimate.window_start, value
        ),
        Cardinality::Saturated { capacity } => println!(
            "window {} (start {}): saturated {} cells, at least {:.0} distinct users",
            estimate.window_index,
            estimate.window_start,
            capacity,
            estimate.cardinality.lower_bound()
        ),
    }
}

fn main() -> Result<(), Error> {
    let mut manager: WindowManager = WindowManager::new(WindowConfig::default())?;
    let mut rng = StdRng::seed_from_u64(42);

    // five minutes of events, about one in a hundred arriving a few minutes late
    let start = 1_700_000_000;
    let mut ts = start;
    while ts < start + 300 {
        let event_ts = if rng.gen_ratio(1, 100) { ts - 150 } else { ts };
        let user_id = format!("user-{}", rng.gen_range(0..20_000));
        match manager.observe(event_ts, user_id.as_str()) {
            Ok(Some(estimate)) => print(&estimate),
            Ok(None) => {}
            Err(Error::LateEvent { .. }) => {}
            Err(e) => return Err(e),
        }
        if rng.gen_ratio(1, 100) {
            ts += 1;
        }
    }
    if let Some(estimate) = manager.flush() {
        print(&estimate);
    }

    let stats = manager.stats();
    println!(
        "observed {} events, dropped {} late events, emitted {} windows",
        stats.observed, stats.late, stats.emitted
    );
    Ok(())
}
