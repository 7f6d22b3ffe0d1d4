//! Benchmarks for path resolution and frame sampling.
//!
//! Run with: cargo bench
//!
//! The directory tree is generated in a temporary directory; no fixtures are
//! needed.

use std::{fs, hint::black_box, path::Path};

use criterion::Criterion;
use video_tool::{Traversal, discover_videos, is_video_file, sampling_stride};

const EXTENSIONS: [&str; 9] = ["mp4", "avi", "mkv", "MOV", "txt", "flv", "gif", "wmv", "webm"];

fn build_tree(root: &Path, depth: usize, files_per_directory: usize) {
    for index in 0..files_per_directory {
        let extension = EXTENSIONS[index % EXTENSIONS.len()];
        fs::write(root.join(format!("clip_{index:03}.{extension}")), b"").unwrap();
    }
    if depth > 0 {
        for branch in 0..3 {
            let child = root.join(format!("dir_{branch}"));
            fs::create_dir(&child).unwrap();
            build_tree(&child, depth - 1, files_per_directory);
        }
    }
}

fn benchmark_discovery(criterion: &mut Criterion) {
    let directory = tempfile::tempdir().unwrap();
    build_tree(directory.path(), 3, 40);

    criterion.bench_function("discover videos (flat)", |bencher| {
        bencher.iter(|| discover_videos(black_box(directory.path()), Traversal::Flat).unwrap());
    });

    criterion.bench_function("discover videos (recursive, 40 dirs)", |bencher| {
        bencher.iter(|| {
            discover_videos(black_box(directory.path()), Traversal::Recursive).unwrap()
        });
    });
}

fn benchmark_filters(criterion: &mut Criterion) {
    let names: Vec<String> = (0..1_000)
        .map(|index| format!("clip_{index}.{}", EXTENSIONS[index % EXTENSIONS.len()]))
        .collect();

    criterion.bench_function("extension filter (1000 names)", |bencher| {
        bencher.iter(|| {
            names
                .iter()
                .filter(|name| is_video_file(black_box(name.as_str())))
                .count()
        });
    });

    criterion.bench_function("sampling stride", |bencher| {
        bencher.iter(|| {
            [23.976, 25.0, 29.97, 30.0, 59.94, 0.5]
                .iter()
                .map(|rate| sampling_stride(black_box(*rate)))
                .sum::<u64>()
        });
    });
}

criterion::criterion_group!(benches, benchmark_discovery, benchmark_filters);
criterion::criterion_main!(benches);
