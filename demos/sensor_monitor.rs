//! Sensor Monitoring with a Hopfield Sentinel
//!
//! Streams simulated readings from a pump (temperature, pressure,
//! vibration) through a [`Monitor`]. Normal operation hovers inside the
//! configured ranges; a bearing fault halfway through pushes vibration and
//! temperature out. Each detection prints the score and the feature whose
//! slice contributes most to the window's energy.
//!
//! The detector is snapshotted to disk at the end and reloaded to show that
//! the restored copy scores the next window identically.
//!
//! Run: RUST_LOG=debug cargo run --example sensor_monitor

use hopfield_sentinel::detection::{DetectorSnapshot, ThresholdStats};
use hopfield_sentinel::{
    AnomalyDetector, DetectorConfig, LearningRule, Monitor, MonitorEvent, ThresholdSpec,
    TrainingData,
};
use rand::prelude::*;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

const FEATURES: [&str; 3] = ["temperature", "pressure", "vibration"];

fn reading(rng: &mut StdRng, faulty: bool) -> HashMap<String, f64> {
    let (temp, vibration) = if faulty {
        (82.0 + rng.gen::<f64>() * 10.0, 55.0 + rng.gen::<f64>() * 20.0)
    } else {
        (65.0 + rng.gen::<f64>() * 10.0, 10.0 + rng.gen::<f64>() * 25.0)
    };
    let pressure = 95.0 + rng.gen::<f64>() * 15.0;

    [
        ("temperature".to_string(), temp),
        ("pressure".to_string(), pressure),
        ("vibration".to_string(), vibration),
    ]
    .into_iter()
    .collect()
}

fn print_stats(stats: &ThresholdStats) {
    let fmt = |v: Option<f64>| v.map_or("-".to_string(), |v| format!("{:.3}", v));
    println!(
        "  threshold {:.3}  p50 {}  p95 {}  p99 {}",
        stats.threshold,
        fmt(stats.p50),
        fmt(stats.p95),
        fmt(stats.p99)
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("\n{}", "=".repeat(70));
    println!("HOPFIELD SENTINEL: pump monitoring");
    println!("{}\n", "=".repeat(70));

    let mut config = DetectorConfig::new(FEATURES.len());
    config.snapshot_length = 8;
    config.network.learning_rule = LearningRule::Storkey;
    config.network.seed = Some(2024);

    let mut detector = AnomalyDetector::new(config)?;
    detector.set_thresholds(
        [
            ("temperature", ThresholdSpec::Range { min: 60.0, max: 80.0 }),
            ("pressure", ThresholdSpec::Below { value: 120.0 }),
            ("vibration", ThresholdSpec::Below { value: 50.0 }),
        ],
        Some(&FEATURES[..]),
    )?;

    let report = detector.train(TrainingData::Defaults)?;
    println!(
        "Trained {} patterns on {} neurons (capacity estimate {})",
        report.patterns,
        detector.pattern_size(),
        report.capacity
    );
    if let Some(warning) = &report.warning {
        println!("  note: {}", warning);
    }

    let mut monitor = Monitor::new(detector);
    let flagged = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&flagged);
    monitor.on_event(move |event: &MonitorEvent<'_>| {
        if let MonitorEvent::Anomaly(result) = event {
            let top = result
                .feature_impact
                .first()
                .map(|i| i.feature.clone())
                .unwrap_or_default();
            sink.borrow_mut().push(top);
        }
    });

    let mut rng = StdRng::seed_from_u64(7);
    println!("\n{:>5}  {:>8}  {:>9}  {:<8}  top feature", "step", "score", "threshold", "status");
    println!("{}", "-".repeat(60));
    for step in 0..40 {
        let faulty = (20..28).contains(&step);
        let point = reading(&mut rng, faulty);
        if let Some(result) = monitor.process(&point)? {
            let top = result
                .feature_impact
                .first()
                .map(|i| format!("{} ({:+.2})", i.feature, i.energy_delta))
                .unwrap_or_default();
            println!(
                "{:>5}  {:>8.3}  {:>9.3}  {:<8}  {}",
                step,
                result.anomaly_score,
                result.threshold,
                if result.is_anomaly { "ANOMALY" } else { "ok" },
                top
            );
        }
    }

    println!("\nAnomalous windows: {}", flagged.borrow().len());
    let mut counts: HashMap<String, usize> = HashMap::new();
    for feature in flagged.borrow().iter() {
        *counts.entry(feature.clone()).or_default() += 1;
    }
    for (feature, count) in &counts {
        println!("  {:<12} top contributor {} times", feature, count);
    }
    print_stats(&monitor.detector().threshold_stats());

    // Persist and restore
    let mut detector = monitor.into_detector();
    let dir = std::env::temp_dir().join("hopfield_sentinel_demo");
    std::fs::create_dir_all(&dir)?;
    let path = dir.join("detector.json");
    detector.snapshot().save(&path)?;
    let mut restored = AnomalyDetector::from_snapshot(DetectorSnapshot::load(&path)?)?;

    let point = reading(&mut rng, false);
    detector.add_data_point(&point)?;
    restored.add_data_point(&point)?;
    let a = detector.detect()?;
    let b = restored.detect()?;
    println!(
        "\nSnapshot at {} restores identically: {}",
        path.display(),
        a == b
    );

    Ok(())
}
