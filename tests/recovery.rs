use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use parkade::engine::{Facility, FacilityError, OccupancyCurve, PricingPolicy, TimeBands};
use parkade::model::{HOUR_MS, Ms, Spot, SpotId, SpotKind, VehicleId};

// ── Test infrastructure ──────────────────────────────────────

const H: Ms = HOUR_MS;

fn policy() -> PricingPolicy {
    PricingPolicy {
        time_bands: TimeBands::commuter(),
        occupancy_curve: OccupancyCurve::from_steps(vec![(0.5, 1.2), (0.8, 1.5)]),
        priority_weight: 0.1,
    }
}

fn journal_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("parkade_recovery_test");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    let _ = fs::remove_file(&path);
    path
}

fn seed(f: &mut Facility) {
    f.add_zone("North", 10.0).unwrap();
    f.add_zone("South", 8.0).unwrap();
    f.add_floor("North", "N1", 10.0).unwrap();
    f.add_floor("South", "S1", 8.0).unwrap();
    for (id, zone, floor, rate, priority) in [
        ("N-1", "North", "N1", 10.0, 2),
        ("N-2", "North", "N1", 10.0, 1),
        ("S-1", "South", "S1", 8.0, 1),
        ("S-2", "South", "S1", 8.0, 1),
    ] {
        let spot = Spot::new(SpotId::new(id), SpotKind::Standard, zone, floor, rate, priority);
        f.register_spot(spot).unwrap();
    }
}

/// Everything replay has to get right: spot order and flags, active
/// sessions with their quoted rates, and the occupancy rollup.
fn fingerprint(f: &Facility) -> (Vec<(String, bool)>, Vec<(String, String, f64)>, usize) {
    let spots = f
        .spots_in_order()
        .map(|s| (s.id.to_string(), s.occupied))
        .collect();
    let sessions = f
        .active_sessions()
        .map(|s| (s.vehicle.to_string(), s.spot.to_string(), s.quoted_rate))
        .collect();
    (spots, sessions, f.status().occupied)
}

fn append_garbage(path: &Path, bytes: &[u8]) {
    let mut file = OpenOptions::new().append(true).open(path).unwrap();
    file.write_all(bytes).unwrap();
}

// ── Tests ────────────────────────────────────────────────────

#[test]
fn state_survives_repeated_restarts() {
    let path = journal_path("restarts.journal");

    let expected = {
        let mut f = Facility::open(&path, policy(), 10).unwrap();
        seed(&mut f);
        f.park(VehicleId::new("CAR-1"), SpotId::new("N-1"), 9 * H).unwrap();
        f.park(VehicleId::new("CAR-2"), SpotId::new("S-1"), 9 * H).unwrap();
        fingerprint(&f)
    };

    // First restart: leave one car, remove a freed spot.
    let expected = {
        let mut f = Facility::open(&path, policy(), 10).unwrap();
        assert_eq!(fingerprint(&f), expected);
        f.leave(&VehicleId::new("CAR-2"), 11 * H).unwrap();
        f.remove_spot(&SpotId::new("S-2")).unwrap();
        fingerprint(&f)
    };

    // Second restart: everything above still holds.
    let f = Facility::open(&path, policy(), 10).unwrap();
    assert_eq!(fingerprint(&f), expected);
    assert_eq!(f.status().spots, 3);
    assert_eq!(f.status().active_sessions, 1);
}

#[test]
fn reopen_with_a_lower_session_cap_is_drain_only() {
    let path = journal_path("shrunken_cap.journal");

    {
        let mut f = Facility::open(&path, policy(), 8).unwrap();
        seed(&mut f);
        f.park(VehicleId::new("CAR-1"), SpotId::new("N-1"), 9 * H).unwrap();
        f.park(VehicleId::new("CAR-2"), SpotId::new("N-2"), 9 * H).unwrap();
        f.park(VehicleId::new("CAR-3"), SpotId::new("S-1"), 10 * H).unwrap();
    }

    // Same journal, the operator lowered the cap below the live count.
    // Replay must still rebuild every session; only new admissions are
    // refused until the ledger drains under the new bound.
    let mut f = Facility::open(&path, policy(), 2).unwrap();
    assert_eq!(f.active_sessions().count(), 3);
    assert!(matches!(
        f.park(VehicleId::new("CAR-4"), SpotId::new("S-2"), 11 * H),
        Err(FacilityError::LedgerFull(2))
    ));

    f.leave(&VehicleId::new("CAR-1"), 12 * H).unwrap();
    assert!(matches!(
        f.park(VehicleId::new("CAR-4"), SpotId::new("S-2"), 12 * H),
        Err(FacilityError::LedgerFull(2))
    ));

    f.leave(&VehicleId::new("CAR-2"), 13 * H).unwrap();
    f.park(VehicleId::new("CAR-4"), SpotId::new("S-2"), 13 * H).unwrap();
    assert_eq!(f.active_sessions().count(), 2);
}

#[test]
fn torn_tail_write_is_dropped() {
    let path = journal_path("torn_tail.journal");

    let expected = {
        let mut f = Facility::open(&path, policy(), 10).unwrap();
        seed(&mut f);
        f.park(VehicleId::new("CAR-1"), SpotId::new("N-1"), 9 * H).unwrap();
        fingerprint(&f)
    };

    // A crash mid-append leaves a partial record at the tail.
    append_garbage(&path, &[0x2a, 0x00, 0x00, 0x00, 0x01, 0x02, 0x03]);

    let f = Facility::open(&path, policy(), 10).unwrap();
    assert_eq!(fingerprint(&f), expected);
}

#[test]
fn corrupt_tail_record_is_dropped() {
    let path = journal_path("corrupt_tail.journal");

    let before_park = {
        let mut f = Facility::open(&path, policy(), 10).unwrap();
        seed(&mut f);
        let fp = fingerprint(&f);
        f.park(VehicleId::new("CAR-1"), SpotId::new("N-1"), 9 * H).unwrap();
        fp
    };

    // Flip the last byte: the final record's checksum no longer matches,
    // so replay keeps everything before the park and drops the park.
    let mut bytes = fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    fs::write(&path, &bytes).unwrap();

    let f = Facility::open(&path, policy(), 10).unwrap();
    assert_eq!(fingerprint(&f), before_park);
    assert!(!f.spot(&SpotId::new("N-1")).unwrap().occupied);
}

#[test]
fn compaction_is_invisible_to_replay() {
    let compacted_path = journal_path("compacted.journal");
    let plain_path = journal_path("uncompacted.journal");

    let churn = |f: &mut Facility| {
        seed(f);
        for i in 0..8 {
            let car = VehicleId::new(format!("CAR-{i}"));
            f.park(car.clone(), SpotId::new("N-1"), i * H).unwrap();
            f.leave(&car, (i + 1) * H).unwrap();
        }
        f.park(VehicleId::new("STAYER"), SpotId::new("S-1"), 20 * H).unwrap();
    };

    {
        let mut f = Facility::open(&compacted_path, policy(), 10).unwrap();
        churn(&mut f);
        f.compact().unwrap();
    }
    {
        let mut f = Facility::open(&plain_path, policy(), 10).unwrap();
        churn(&mut f);
    }

    let compacted = Facility::open(&compacted_path, policy(), 10).unwrap();
    let plain = Facility::open(&plain_path, policy(), 10).unwrap();
    assert_eq!(fingerprint(&compacted), fingerprint(&plain));

    let small = fs::metadata(&compacted_path).unwrap().len();
    let large = fs::metadata(&plain_path).unwrap().len();
    assert!(small < large, "compacted journal should shrink: {small} < {large}");
}

#[test]
fn compact_when_threshold_crossed() {
    let path = journal_path("threshold.journal");
    let threshold = 10;

    let mut f = Facility::open(&path, policy(), 10).unwrap();
    seed(&mut f);

    // The housekeeping loop a caller runs after each batch of mutations.
    for i in 0..30 {
        let car = VehicleId::new(format!("CAR-{i}"));
        f.park(car.clone(), SpotId::new("N-1"), i * H).unwrap();
        f.leave(&car, i * H + H / 2).unwrap();
        if f.journal_appends_since_compact() > threshold {
            f.compact().unwrap();
            assert_eq!(f.journal_appends_since_compact(), 0);
        }
    }
    assert!(f.journal_appends_since_compact() <= threshold + 1);

    // The churn left nothing behind but the structure.
    let reopened = Facility::open(&path, policy(), 10).unwrap();
    assert_eq!(reopened.status().spots, 4);
    assert_eq!(reopened.status().active_sessions, 0);
    assert_eq!(reopened.status().occupied, 0);
}
