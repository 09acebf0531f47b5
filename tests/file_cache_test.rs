use chrono::{TimeDelta, TimeZone, Utc};
use std::fs::{self, File};
use std::thread;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

use claude_quota::cache::UsageCache;
use claude_quota::file_cache::{CacheEntry, FileCache, RETENTION};
use claude_quota::models::UsageSnapshot;

fn snapshot_a() -> UsageSnapshot {
    UsageSnapshot {
        block_percentage: 42.5,
        block_reset_time: Some(Utc.with_ymd_and_hms(2026, 3, 1, 15, 0, 0).unwrap()),
        weekly_percentage: 18.0,
        opus_percentage: 7.25,
        sonnet_percentage: 11.0,
        week_reset_time: Some(Utc.with_ymd_and_hms(2026, 3, 5, 9, 30, 0).unwrap()),
        is_stale: false,
        fetched_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
    }
}

fn snapshot_b() -> UsageSnapshot {
    UsageSnapshot {
        block_percentage: 3.0,
        weekly_percentage: 91.0,
        fetched_at: Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap(),
        ..Default::default()
    }
}

fn age_file(path: &std::path::Path, age: Duration) {
    let file = File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() - age).unwrap();
}

#[test]
fn round_trip_preserves_every_field() {
    let tmp = TempDir::new().unwrap();
    let cache = FileCache::new(tmp.path(), Duration::from_secs(60));

    cache.store("/home/dev/project", &snapshot_a());
    let got = cache.get("/home/dev/project").unwrap();
    assert_eq!(got, snapshot_a());
    assert!(!got.is_stale);
}

#[test]
fn keys_are_isolated() {
    let tmp = TempDir::new().unwrap();
    let cache = FileCache::new(tmp.path(), Duration::from_secs(60));

    cache.store("x", &snapshot_a());
    cache.store("y", &snapshot_b());

    assert_eq!(cache.get("x").unwrap(), snapshot_a());
    assert_eq!(cache.get("y").unwrap(), snapshot_b());
    assert!(cache.get("z").is_none());
}

#[test]
fn raw_key_never_appears_on_disk() {
    let tmp = TempDir::new().unwrap();
    let cache = FileCache::new(tmp.path(), Duration::from_secs(60));
    let key = "/tmp/with spaces/and:colons/../weird";
    cache.store(key, &snapshot_a());

    let names: Vec<String> = fs::read_dir(tmp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 1);
    assert_eq!(names[0].len(), 64 + ".json".len());
    assert!(names[0].ends_with(".json"));
    assert!(!names[0].contains("weird"));
}

#[test]
fn past_ttl_is_stale_with_fields_unchanged() {
    let tmp = TempDir::new().unwrap();
    let cache = FileCache::new(tmp.path(), Duration::from_millis(40));

    cache.store("/w", &snapshot_a());
    thread::sleep(Duration::from_millis(120));

    let got = cache.get("/w").unwrap();
    assert!(got.is_stale);
    assert_eq!(
        UsageSnapshot {
            is_stale: false,
            ..got
        },
        snapshot_a()
    );
}

#[test]
fn stored_ttl_wins_over_reader_ttl() {
    let tmp = TempDir::new().unwrap();
    let writer = FileCache::new(tmp.path(), Duration::from_secs(3600));
    writer.store("/w", &snapshot_a());

    // a reader configured with a tiny TTL still honors the hour the entry was written with
    let reader = FileCache::new(tmp.path(), Duration::from_millis(1));
    thread::sleep(Duration::from_millis(20));
    assert!(!reader.get("/w").unwrap().is_stale);

    // and an entry written with a short TTL goes stale for a patient reader
    let entry = CacheEntry {
        data: snapshot_b(),
        stored_at: Utc::now() - TimeDelta::minutes(5),
        ttl: "30s".into(),
    };
    fs::write(writer.key_path("/old"), serde_json::to_vec(&entry).unwrap()).unwrap();
    assert!(reader.get("/old").unwrap().is_stale);
    assert!(writer.get("/old").unwrap().is_stale);
}

#[test]
fn missing_directory_and_torn_files_are_misses() {
    let tmp = TempDir::new().unwrap();
    let cache = FileCache::new(tmp.path().join("never-created"), Duration::from_secs(60));
    assert!(cache.get("/w").is_none());

    let cache = FileCache::new(tmp.path(), Duration::from_secs(60));
    cache.store("/w", &snapshot_a());
    let full = fs::read(cache.key_path("/w")).unwrap();
    fs::write(cache.key_path("/w"), &full[..full.len() / 2]).unwrap();
    assert!(cache.get("/w").is_none());

    fs::write(cache.key_path("/w"), b"").unwrap();
    assert!(cache.get("/w").is_none());

    fs::write(cache.key_path("/w"), b"[1,2,3]").unwrap();
    assert!(cache.get("/w").is_none());
}

#[test]
fn sequential_writers_keep_each_others_entries() {
    let tmp = TempDir::new().unwrap();
    let first = FileCache::new(tmp.path(), Duration::from_secs(60));
    let second = FileCache::new(tmp.path(), Duration::from_secs(60));

    first.store("/pane-1", &snapshot_a());
    second.store("/pane-2", &snapshot_b());

    assert_eq!(first.get("/pane-1").unwrap(), snapshot_a());
    assert_eq!(first.get("/pane-2").unwrap(), snapshot_b());
    assert_eq!(second.get("/pane-1").unwrap(), snapshot_a());
}

#[test]
fn concurrent_writers_on_distinct_keys() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().to_path_buf();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let dir = dir.clone();
            thread::spawn(move || {
                let cache = FileCache::new(dir, Duration::from_secs(60));
                for round in 0..5 {
                    let snap = UsageSnapshot {
                        block_percentage: (i * 10 + round) as f64,
                        ..Default::default()
                    };
                    cache.store(&format!("/project-{i}"), &snap);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let cache = FileCache::new(&dir, Duration::from_secs(60));
    for i in 0..8 {
        let got = cache.get(&format!("/project-{i}")).unwrap();
        assert_eq!(got.block_percentage, (i * 10 + 4) as f64);
    }
}

#[test]
fn cleanup_removes_only_files_past_retention() {
    let tmp = TempDir::new().unwrap();
    let cache = FileCache::new(tmp.path(), Duration::from_secs(60));

    cache.store("/old", &snapshot_a());
    cache.store("/recent", &snapshot_b());
    let stray = tmp.path().join("stray.tmp");
    fs::write(&stray, b"leftover").unwrap();

    age_file(&cache.key_path("/old"), RETENTION + Duration::from_secs(3600));
    age_file(&stray, RETENTION + Duration::from_secs(60));
    age_file(&cache.key_path("/recent"), RETENTION - Duration::from_secs(3600));

    // cleanup runs as part of any store
    cache.store("/trigger", &snapshot_b());

    assert!(!cache.key_path("/old").exists());
    assert!(!stray.exists());
    assert!(cache.key_path("/recent").exists());
    assert!(cache.key_path("/trigger").exists());
    assert!(cache.get("/old").is_none());
}

#[test]
fn cleanup_leaves_subdirectories_alone() {
    let tmp = TempDir::new().unwrap();
    let sub = tmp.path().join("nested");
    fs::create_dir(&sub).unwrap();
    let inner = sub.join("keep.json");
    fs::write(&inner, b"{}").unwrap();
    age_file(&inner, RETENTION * 2);

    let cache = FileCache::new(tmp.path(), Duration::from_secs(60));
    assert_eq!(cache.cleanup(), 0);
    assert!(inner.exists());
}
