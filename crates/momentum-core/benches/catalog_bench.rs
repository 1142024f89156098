//! # Catalog Benchmarks
//!
//! Read-path benchmarks for momentum-core over populated catalogs.
//!
//! Run with: `cargo bench -p momentum-core`

use chrono::{TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use momentum_core::{Catalog, CatalogRead, NewBuild, NewProject, NewRelease, ReleaseStatus};
use std::hint::black_box;

/// Create a catalog with `projects` projects of `releases` releases, five builds each.
fn create_catalog(projects: u64, releases: u64) -> Catalog {
    let catalog = Catalog::in_memory().expect("catalog");
    let scope = catalog.db().write().expect("write");
    let mut seconds = 0;

    for p in 0..projects {
        let project = scope
            .insert_project(NewProject {
                name: format!("Project {}", p),
                slug: format!("p{}", p),
            })
            .expect("project");
        for r in 0..releases {
            seconds += 1;
            let created = Utc.timestamp_opt(1_700_000_000 + seconds, 0).single().expect("ts");
            let status = ReleaseStatus::ALL[(r % 5) as usize];
            let release = scope
                .insert_release(
                    NewRelease::new(project.id, format!("{}.{}.0", p, r), status).created_at(created),
                )
                .expect("release");
            for b in 0..5 {
                scope
                    .insert_build(
                        NewBuild::new(release.id, b, format!("https://x/{}/{}/{}", p, r, b))
                            .built_at(created),
                    )
                    .expect("build");
            }
        }
    }

    scope.commit().expect("commit");
    catalog
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_list_projects(c: &mut Criterion) {
    let mut group = c.benchmark_group("list_projects");

    for releases in [10, 100, 1000].iter() {
        let catalog = create_catalog(10, *releases);
        group.bench_with_input(BenchmarkId::from_parameter(releases), releases, |b, _| {
            b.iter(|| black_box(catalog.list_projects().expect("list")));
        });
    }

    group.finish();
}

fn bench_latest_releases(c: &mut Criterion) {
    let mut group = c.benchmark_group("latest_releases");

    for releases in [10, 100, 1000].iter() {
        let catalog = create_catalog(1, *releases);
        group.bench_with_input(BenchmarkId::from_parameter(releases), releases, |b, _| {
            b.iter(|| black_box(catalog.latest_releases("p0").expect("latest")));
        });
    }

    group.finish();
}

fn bench_slug_lookup(c: &mut Criterion) {
    let catalog = create_catalog(1000, 1);

    c.bench_function("project_by_slug", |b| {
        b.iter(|| {
            let scope = catalog.db().read().expect("read");
            black_box(scope.project_by_slug("p500").expect("lookup"))
        });
    });
}

criterion_group!(
    benches,
    bench_list_projects,
    bench_latest_releases,
    bench_slug_lookup
);
criterion_main!(benches);
