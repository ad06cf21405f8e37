use std::{env, process::ExitCode};

use trail_telemetry::{
    codec,
    data_types::Fix,
    util::{time::Benchmark, DateTimeUtils},
    RecordingConfig, Result, SessionBuilder,
};

fn replay(fixes_path: &str, config_path: Option<&str>) -> Result<()> {
    let config = match config_path {
        Some(path) => RecordingConfig::load(path)?,
        None => RecordingConfig::from_current_dir()?,
    };

    let fixes: Vec<Fix> = serde_json::from_str(&std::fs::read_to_string(fixes_path)?)?;
    let start_time_ms = fixes.first().map_or(0, |fix| fix.time_ms);
    let stop_time_ms = fixes.last().map_or(start_time_ms, |fix| fix.time_ms);

    let mut session = SessionBuilder::new()
        .with_config(config)
        .starting_at(start_time_ms)
        .build();

    Benchmark::measure("replay", || {
        for fix in &fixes {
            session.on_fix(fix);
        }
    });

    println!(
        "{} fixes, {} accepted, {} rejected",
        fixes.len(),
        session.accepted_points(),
        session.rejected_fixes()
    );

    for (index, interval) in session.intervals().iter().enumerate() {
        println!(
            "#{:<3} {:>8.0} m {:>8.0} m  {:>6.2} m/s  +{:.0}/-{:.0} m",
            index + 1,
            interval.start_distance_m,
            interval.distance_m,
            interval.speed(),
            interval.gain_m.unwrap_or_default(),
            interval.loss_m.unwrap_or_default(),
        );
    }

    if let Some(path) = session.encoded_path() {
        println!("path: {}", path);
    }

    let stats = session.finish(stop_time_ms);
    if let Some(start) = stats.start_time_ms.and_then(DateTimeUtils::timestamp_to_zulu) {
        println!("started {}", start);
    }
    println!("{}", stats);
    println!("{}", codec::encode_statistics(&stats)?);

    Ok(())
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let Some(fixes_path) = args.get(1) else {
        eprintln!("usage: trail-telemetry <fixes.json> [config.toml]");
        return ExitCode::FAILURE;
    };

    match replay(fixes_path, args.get(2).map(String::as_str)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}
