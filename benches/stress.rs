//! In-process stress run against a throwaway WAL: resolution reads and
//! range-edit writes, latency percentiles printed per operation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Datelike, NaiveDate, NaiveTime};
use ulid::Ulid;

use rota::calendar::{date_range, month_grid};
use rota::engine::Engine;
use rota::model::{DeptId, ShiftEntry, StaffId, Weekday};
use rota::notify::NotifyHub;

const DEPARTMENTS: usize = 10;
const STAFF_PER_DEPARTMENT: usize = 20;

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

fn t(h: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, 0, 0).unwrap()
}

async fn setup(engine: &Engine) -> Vec<(DeptId, Vec<StaffId>)> {
    let mut departments = Vec::new();
    for di in 0..DEPARTMENTS {
        let dept = Ulid::new();
        let mut staff = Vec::new();
        for si in 0..STAFF_PER_DEPARTMENT {
            let id = Ulid::new();
            engine
                .register_staff(id, format!("Dr. {di:02}-{si:02}"), Some(dept))
                .await
                .unwrap();
            for weekday in [
                Weekday::Monday,
                Weekday::Tuesday,
                Weekday::Wednesday,
                Weekday::Thursday,
                Weekday::Friday,
            ] {
                engine
                    .set_default(id, weekday, ShiftEntry::Working { start: t(8), end: t(16) })
                    .await
                    .unwrap();
            }
            staff.push(id);
        }
        departments.push((dept, staff));
    }
    println!(
        "  created {} departments × {} staff",
        DEPARTMENTS, STAFF_PER_DEPARTMENT
    );
    departments
}

#[tokio::main]
async fn main() {
    let dir = std::env::temp_dir().join("rota_bench");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("stress_{}.wal", Ulid::new()));

    let engine = Engine::open(path.clone(), Arc::new(NotifyHub::new())).unwrap();

    println!("setup:");
    let departments = setup(&engine).await;

    let june: NaiveDate = "2024-06-01".parse().unwrap();
    let month: Vec<NaiveDate> = month_grid(june.with_day(15).unwrap());

    println!("writes:");
    let mut latencies = Vec::new();
    for (_, staff) in &departments {
        for &id in staff {
            let week: Vec<NaiveDate> =
                date_range("2024-06-10".parse().unwrap(), "2024-06-14".parse().unwrap()).collect();
            let started = Instant::now();
            engine.assign_working_range(id, &week, t(9), t(13)).await.unwrap();
            latencies.push(started.elapsed());
        }
    }
    print_latency("assign_working_range (5 dates)", &mut latencies);

    println!("reads:");
    let mut latencies = Vec::new();
    for (_, staff) in &departments {
        for &id in staff {
            for &date in month.iter().take(7) {
                let started = Instant::now();
                engine.resolve_day(id, date).await.unwrap();
                latencies.push(started.elapsed());
            }
        }
    }
    print_latency("resolve_day", &mut latencies);

    let mut latencies = Vec::new();
    for (_, staff) in &departments {
        for &id in staff {
            let started = Instant::now();
            engine.resolve_range(id, month[0], month[41]).await.unwrap();
            latencies.push(started.elapsed());
        }
    }
    print_latency("resolve_range (42 dates)", &mut latencies);

    let mut latencies = Vec::new();
    for (dept, _) in &departments {
        for &date in month.iter().take(7) {
            let started = Instant::now();
            engine.resolve_department_day(*dept, date).await.unwrap();
            latencies.push(started.elapsed());
        }
    }
    print_latency("resolve_department_day (20 staff)", &mut latencies);

    let mut latencies = Vec::new();
    for (dept, _) in &departments {
        let started = Instant::now();
        engine
            .resolve_department_range(*dept, month[0], month[41])
            .await
            .unwrap();
        latencies.push(started.elapsed());
    }
    print_latency("resolve_department_range (20 staff × 42 dates)", &mut latencies);

    let _ = std::fs::remove_file(&path);
}
