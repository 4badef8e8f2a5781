//! 変換処理のスループット測定
//!
//! キャッシュなしの変換、キャッシュヒット、リサイズ付き変換を比較

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use image_convert::codec::standard::StandardCodec;
use image_convert::core::{Job, OutputFormat};
use image_convert::services::{ConvertOptions, Converter};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

fn write_sample(dir: &Path, name: &str, size: u32) -> PathBuf {
    let path = dir.join(name);
    image::RgbImage::from_fn(size, size, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    })
    .save(&path)
    .unwrap();
    path
}

fn keep_original() -> ConvertOptions {
    ConvertOptions {
        keep_original: true,
        ..ConvertOptions::default()
    }
}

fn benchmark_conversion(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let source = write_sample(temp_dir.path(), "sample.png", 512);

    let mut group = c.benchmark_group("Convert 512x512 PNG");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(20);

    for format in [OutputFormat::Jpg, OutputFormat::Webp] {
        group.bench_function(format!("to {format}"), |b| {
            b.iter_batched(
                || Converter::new(StandardCodec::new(), keep_original()),
                |converter| {
                    let result = converter.convert(&Job::new(source.clone(), format));
                    std::hint::black_box(result)
                },
                BatchSize::PerIteration,
            )
        });
    }

    group.bench_function("to jpg with resize", |b| {
        let options = ConvertOptions {
            max_dimension: 128,
            ..keep_original()
        };
        b.iter_batched(
            || Converter::new(StandardCodec::new(), options.clone()),
            |converter| {
                let result = converter.convert(&Job::new(source.clone(), OutputFormat::Jpg));
                std::hint::black_box(result)
            },
            BatchSize::PerIteration,
        )
    });

    group.finish();
}

fn benchmark_cache_hit(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let source = write_sample(temp_dir.path(), "cached.png", 512);
    let converter = Converter::new(StandardCodec::new(), keep_original());
    let job = Job::new(source, OutputFormat::Jpg);
    // 1回目でキャッシュに載せる
    converter.convert(&job);

    c.bench_function("Convert cache hit", |b| {
        b.iter(|| std::hint::black_box(converter.convert(&job)))
    });
}

criterion_group!(benches, benchmark_conversion, benchmark_cache_hit);
criterion_main!(benches);
