use chrono::Duration;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use slotbook_booking::{available_dates, generate, BusinessZone, CalendarDay, OpenWindow};

// A month of windows: mornings and afternoons, every day
fn create_month_of_windows(zone: BusinessZone, first_day: CalendarDay) -> Vec<OpenWindow> {
    let mut windows = Vec::new();
    let mut day = first_day;
    for _ in 0..30 {
        for (from, to) in [(8, 12), (13, 18)] {
            let start = zone.at(day, from, 0).unwrap();
            let end = zone.at(day, to, 0).unwrap();
            windows.push(OpenWindow::new(zone, start, end, None).unwrap());
        }
        day = day.succ().unwrap();
    }
    windows
}

fn benchmark_generate_slots(c: &mut Criterion) {
    let zone = BusinessZone::default();
    let first_day = CalendarDay::from_ymd(2025, 4, 1).unwrap();
    let windows = create_month_of_windows(zone, first_day);
    let mid_month = CalendarDay::new(first_day.date() + Duration::days(15));

    let mut group = c.benchmark_group("generate_slots");

    group.bench_function("thirty_minute_service", |b| {
        b.iter(|| generate(black_box(&windows), black_box(mid_month), black_box(30)))
    });

    group.bench_function("ninety_minute_service", |b| {
        b.iter(|| generate(black_box(&windows), black_box(mid_month), black_box(90)))
    });

    group.bench_function("available_dates", |b| {
        b.iter(|| available_dates(black_box(&windows)))
    });

    group.finish();
}

criterion_group!(benches, benchmark_generate_slots);
criterion_main!(benches);
