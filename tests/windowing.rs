use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use test_case::test_case;
use windowed_cardinality::{
    Cardinality, Error, LinearCounter, WindowConfig, WindowEstimate, WindowManager, WindowState,
};

fn manager(window_length_seconds: i64, estimator_capacity: usize) -> WindowManager {
    WindowManager::new(WindowConfig::new(window_length_seconds, estimator_capacity).unwrap())
        .unwrap()
}

/// Drive `events` through a fresh manager and collect every emitted window, flush included.
fn run(m: &mut WindowManager, events: &[(i64, String)]) -> Vec<WindowEstimate> {
    let mut emitted: Vec<WindowEstimate> = events
        .iter()
        .filter_map(|(ts, uid)| m.observe(*ts, uid.as_str()).unwrap())
        .collect();
    emitted.extend(m.flush());
    emitted
}

fn relative_error(cardinality: Cardinality, actual: usize) -> f64 {
    (cardinality.value().unwrap() - actual as f64).abs() / actual as f64
}

#[test]
fn test_empty_estimator() {
    let e = LinearCounter::<wyhash::WyHash>::new(1000).unwrap();
    assert_eq!(e.estimate(), Ok(0.0));
}

#[test]
fn test_window_boundary_emission() {
    let mut m = manager(60, 60_000);
    assert_eq!(m.observe(60, "a"), Ok(None));
    assert_eq!(m.observe(60, "b"), Ok(None));

    let first = m.observe(121, "c").unwrap().unwrap();
    assert_eq!(first.window_index, 1);
    assert_eq!(first.window_start, 60);
    assert!(relative_error(first.cardinality, 2) < 0.01);

    let last = m.flush().unwrap();
    assert_eq!(last.window_index, 2);
    assert!(relative_error(last.cardinality, 1) < 0.01);
    assert_eq!(m.flush(), None);
}

#[test]
fn test_late_event_rejected() {
    let mut m = manager(60, 60_000);
    let emitted = m.observe(0, "u0").unwrap();
    assert_eq!(emitted, None);
    let first = m.observe(300, "u1").unwrap().unwrap();
    assert_eq!(m.state(), WindowState::Active(5));
    let before = m.current_estimate();

    let late = m.observe(3 * 60 + 10, "u2");
    assert_eq!(
        late,
        Err(Error::LateEvent {
            timestamp: 190,
            window_index: 3,
            current_window_index: 5
        })
    );
    assert_eq!(m.current_estimate(), before);
    assert_eq!(first.window_index, 0);

    // the rejected user only counts once it arrives in time
    let last = m.flush().unwrap();
    assert!(relative_error(last.cardinality, 1) < 0.01);
}

#[test]
fn test_same_user_counted_in_each_window() {
    let mut m = manager(60, 60_000);
    let events: Vec<(i64, String)> = (0..3)
        .flat_map(|w| (0..5).map(move |ts| (w * 60 + ts, "same-user".to_string())))
        .collect();
    let emitted = run(&mut m, &events);
    assert_eq!(emitted.len(), 3);
    for (w, estimate) in emitted.iter().enumerate() {
        assert_eq!(estimate.window_index, w as i64);
        assert!(relative_error(estimate.cardinality, 1) < 0.01);
    }
}

#[test_case(60, 60_000, 10_000; "default window, a sixth of capacity")]
#[test_case(60, 60_000, 30_000; "default window, half of capacity")]
#[test_case(10, 8_192, 2_000; "short window")]
fn test_random_stream(window_length_seconds: i64, estimator_capacity: usize, users: usize) {
    let mut rng = StdRng::seed_from_u64(12345);
    let windows = 4;
    let mut events = Vec::new();
    for w in 0..windows {
        // every user shows up at least once, plus repeats
        for u in 0..users {
            events.push((w, format!("user-{}", u)));
        }
        for _ in 0..users {
            events.push((w, format!("user-{}", rng.gen_range(0..users))));
        }
    }
    let events: Vec<(i64, String)> = events
        .into_iter()
        .map(|(w, uid)| {
            let ts = w * window_length_seconds + rng.gen_range(0..window_length_seconds);
            (ts, uid)
        })
        .collect();
    // non-decreasing within the stream, order inside a window does not matter
    let mut events = events;
    events.sort_by_key(|(ts, _)| *ts);

    let mut m = manager(window_length_seconds, estimator_capacity);
    let emitted = run(&mut m, &events);

    assert_eq!(emitted.len(), windows as usize);
    for (w, estimate) in emitted.iter().enumerate() {
        assert_eq!(estimate.window_index, w as i64);
        assert_eq!(estimate.window_start, w as i64 * window_length_seconds);
        let error = relative_error(estimate.cardinality, users);
        assert!(error < 0.03, "window {} relative error {}", w, error);
    }
    assert_eq!(m.stats().observed, events.len() as u64);
    assert_eq!(m.stats().late, 0);
    assert_eq!(m.stats().emitted, windows as u64);
}

#[test]
fn test_undersized_capacity_saturates() {
    let mut m = manager(60, 64);
    for u in 0..10_000 {
        m.observe(0, &u).unwrap();
    }
    let estimate = m.flush().unwrap();
    assert_eq!(estimate.cardinality, Cardinality::Saturated { capacity: 64 });
    assert!(estimate.cardinality.lower_bound() > 64.0);
}

#[test]
fn test_idempotent_add() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..100 {
        let uid = format!("user-{}", rng.gen::<u64>());
        let mut once = LinearCounter::<wyhash::WyHash>::new(1000).unwrap();
        once.add(&uid);
        let mut many = LinearCounter::<wyhash::WyHash>::new(1000).unwrap();
        for _ in 0..rng.gen_range(1..10) {
            many.add(&uid);
        }
        assert_eq!(once.estimate(), many.estimate());
    }
}
