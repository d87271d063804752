use criterion::{black_box, criterion_group, criterion_main, Criterion};
use geomag::field::synthesis::QueryPoint;
use geomag::models::store::CoefficientStore;
use geomag::{geomagnetic_field_with, par_geomagnetic_field, sun_compass_declination};

fn criterion_benchmark(c: &mut Criterion) {
    let store = CoefficientStore::embedded().expect("Could not load coefficient tables");
    let point = QueryPoint::new(2015.0, 0.0, 45.0, 0.0);
    let grid = grid_points();

    c.bench_function("Field at one point", |b| {
        b.iter(|| geomagnetic_field_with(&store, black_box(&point), None))
    });
    c.bench_function("Field over a global grid", |b| {
        b.iter(|| {
            grid.iter()
                .map(|p| geomagnetic_field_with(&store, p, None).expect("Could not evaluate"))
                .count()
        })
    });
    c.bench_function("Parallel field over a global grid", |b| {
        b.iter(|| par_geomagnetic_field(&store, black_box(&grid), None))
    });
    c.bench_function("Sun compass", |b| {
        b.iter(|| sun_compass_declination(black_box("2018:06:21:12:00"), -7.0, 40.0, -105.0, 0.0))
    });
}

/// One point every 2 degrees of latitude and longitude
fn grid_points() -> Vec<QueryPoint> {
    let mut points = vec![];
    for lat in (-89..=89).step_by(2) {
        for lon in (0..360).step_by(2) {
            points.push(QueryPoint::new(2017.5, 0.0, lat as f64, lon as f64));
        }
    }
    points
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
