use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use parkade::engine::{Facility, OccupancyCurve, PricingPolicy, TimeBands};
use parkade::model::{HOUR_MS, Spot, SpotId, SpotKind, VehicleId};


fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let idx = ((sorted.len() as f64) * p / 100.0) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn print_latency(label: &str, latencies: &mut [Duration]) {
    latencies.sort();
    let total: Duration = latencies.iter().sum();
    let avg = total / latencies.len() as u32;
    println!("  {label}:");
    println!(
        "    n={}, avg={:.3}ms, p50={:.3}ms, p95={:.3}ms, p99={:.3}ms, max={:.3}ms",
        latencies.len(),
        avg.as_secs_f64() * 1000.0,
        percentile(latencies, 50.0).as_secs_f64() * 1000.0,
        percentile(latencies, 95.0).as_secs_f64() * 1000.0,
        percentile(latencies, 99.0).as_secs_f64() * 1000.0,
        latencies.last().unwrap().as_secs_f64() * 1000.0,
    );
}

fn bench_policy() -> PricingPolicy {
    PricingPolicy {
        time_bands: TimeBands::commuter(),
        occupancy_curve: OccupancyCurve::stepped(),
        priority_weight: 0.1,
    }
}

fn journal_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("parkade_bench");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    let _ = std::fs::remove_file(&path);
    path
}

/// Four zones, four floors each; spots dealt round-robin across them.
fn build_layout(f: &mut Facility, n_spots: usize) {
    let zones = ["A", "B", "C", "D"];
    let floors = 4;
    for (zi, zone) in zones.iter().enumerate() {
        let base = 6.0 + 2.0 * zi as f64;
        f.add_zone(*zone, base).unwrap();
        for fl in 1..=floors {
            f.add_floor(*zone, format!("{zone}{fl}"), base).unwrap();
        }
    }
    for i in 0..n_spots {
        let zone = zones[i % zones.len()];
        let fl = (i / zones.len()) % floors + 1;
        let base = 6.0 + 2.0 * (i % zones.len()) as f64;
        let spot = Spot::new(
            SpotId::new(format!("{zone}{fl}-{i}")),
            SpotKind::Standard,
            zone,
            format!("{zone}{fl}"),
            base,
            (i % 5 + 1) as u8,
        );
        f.register_spot(spot).unwrap();
    }
}

fn phase1_sequential_sessions(n_ops: usize) {
    let path = journal_path("phase1.journal");
    let mut f = Facility::open(&path, bench_policy(), 64).unwrap();
    build_layout(&mut f, 32);

    let spot_ids: Vec<SpotId> = f.spots_in_order().map(|s| s.id.clone()).collect();
    let mut latencies = Vec::with_capacity(n_ops);
    let start = Instant::now();

    // Each park and each leave is one journal append + fsync.
    for i in 0..n_ops {
        let car = VehicleId::new(format!("CAR-{i}"));
        let spot = spot_ids[i % spot_ids.len()].clone();
        let t = Instant::now();
        f.park(car.clone(), spot, (i as i64) * HOUR_MS).unwrap();
        f.leave(&car, (i as i64) * HOUR_MS + HOUR_MS).unwrap();
        latencies.push(t.elapsed());
    }

    let elapsed = start.elapsed();
    let ops = (n_ops * 2) as f64 / elapsed.as_secs_f64();
    println!(
        "  {n_ops} park/leave pairs in {:.2}s = {ops:.0} mutations/sec",
        elapsed.as_secs_f64()
    );
    print_latency("park+leave latency", &mut latencies);
}

fn phase2_ranked_views(n_spots: usize, n_reads: usize) {
    let mut f = Facility::in_memory(bench_policy(), n_spots);
    build_layout(&mut f, n_spots);

    // Fill about 40% so the availability view has real work to do.
    let targets: Vec<SpotId> = f
        .spots_in_order()
        .enumerate()
        .filter(|(i, _)| i % 5 < 2)
        .map(|(_, s)| s.id.clone())
        .collect();
    for (i, spot) in targets.iter().enumerate() {
        f.park(VehicleId::new(format!("CAR-{i}")), spot.clone(), 9 * HOUR_MS)
            .unwrap();
    }
    println!("  {} spots, {} occupied", n_spots, targets.len());

    let mut by_price = Vec::with_capacity(n_reads);
    let mut by_priority = Vec::with_capacity(n_reads);
    let mut by_availability = Vec::with_capacity(n_reads);
    for _ in 0..n_reads {
        let t = Instant::now();
        let ranked = f.rank_by_price();
        by_price.push(t.elapsed());
        assert_eq!(ranked.len(), n_spots);

        let t = Instant::now();
        let _ = f.rank_by_priority();
        by_priority.push(t.elapsed());

        let t = Instant::now();
        let _ = f.rank_by_availability();
        by_availability.push(t.elapsed());
    }

    print_latency("rank_by_price", &mut by_price);
    print_latency("rank_by_priority", &mut by_priority);
    print_latency("rank_by_availability", &mut by_availability);
}

fn phase3_churn_with_compaction(n_ops: usize) -> PathBuf {
    let path = journal_path("phase3.journal");
    let threshold = 500u64;
    let mut f = Facility::open(&path, bench_policy(), 256).unwrap();
    build_layout(&mut f, 128);

    let spot_ids: Vec<SpotId> = f.spots_in_order().map(|s| s.id.clone()).collect();
    let mut mutation_latencies = Vec::with_capacity(n_ops);
    let mut compaction_pauses = Vec::new();

    for i in 0..n_ops {
        let car = VehicleId::new(format!("CAR-{i}"));
        let spot = spot_ids[i % spot_ids.len()].clone();
        let t = Instant::now();
        f.park(car.clone(), spot, (i as i64) * HOUR_MS).unwrap();
        f.leave(&car, (i as i64) * HOUR_MS + HOUR_MS).unwrap();
        mutation_latencies.push(t.elapsed());

        if f.journal_appends_since_compact() > threshold {
            let t = Instant::now();
            f.compact().unwrap();
            compaction_pauses.push(t.elapsed());
        }
    }

    // Leave a resident population behind for the replay phase.
    for (i, spot) in spot_ids.iter().take(64).enumerate() {
        f.park(VehicleId::new(format!("STAYER-{i}")), spot.clone(), 0)
            .unwrap();
    }

    println!(
        "  {} compactions over {n_ops} park/leave pairs (threshold {threshold})",
        compaction_pauses.len()
    );
    print_latency("park+leave latency", &mut mutation_latencies);
    if !compaction_pauses.is_empty() {
        print_latency("compaction pause", &mut compaction_pauses);
    }
    path
}

fn phase4_replay(path: &Path) {
    let t = Instant::now();
    let f = Facility::open(path, bench_policy(), 256).unwrap();
    let elapsed = t.elapsed();
    let status = f.status();
    println!(
        "  rebuilt {} spots / {} active sessions in {:.2}ms",
        status.spots,
        status.active_sessions,
        elapsed.as_secs_f64() * 1000.0
    );
}

fn main() {
    let n_spots: usize = std::env::var("PARKADE_BENCH_SPOTS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(2_000);
    let n_ops: usize = std::env::var("PARKADE_BENCH_OPS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(2_000);

    println!("=== parkade stress benchmark ===");
    println!("spots: {n_spots}, ops: {n_ops}\n");

    println!("[phase 1] journalled session throughput");
    phase1_sequential_sessions(n_ops);

    println!("\n[phase 2] ranked views");
    phase2_ranked_views(n_spots, 200);

    println!("\n[phase 3] churn with threshold compaction");
    let path = phase3_churn_with_compaction(n_ops);

    println!("\n[phase 4] restart replay");
    phase4_replay(&path);

    println!("\n=== benchmark complete ===");
}
