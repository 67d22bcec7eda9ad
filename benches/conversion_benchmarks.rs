//! Benchmarks for frame conversion and decoding.
//!
//! Run with: cargo bench
//!
//! The decode benchmarks require fixture files from
//! `tests/fixtures/generate_fixtures.sh`; the conversion benchmarks do not.

use std::{hint::black_box, path::Path};

use criterion::{BenchmarkId, Criterion};
use framegrab::{
    ColorRange, ColorSpace, CropRectangle, FfmpegLogLevel, FrameConverter, NativePicture, Plane,
    VideoSession,
};

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

fn yuv420_picture(width: u32, height: u32) -> NativePicture {
    let luma = (width * height) as usize;
    let chroma = (width.div_ceil(2) * height.div_ceil(2)) as usize;
    NativePicture::new(
        ColorSpace::Yuv420(ColorRange::Limited),
        width,
        height,
        vec![
            Plane::new((0..luma).map(|i| (i % 220 + 16) as u16).collect(), width as usize),
            Plane::new(vec![110; chroma], width.div_ceil(2) as usize),
            Plane::new(vec![150; chroma], width.div_ceil(2) as usize),
        ],
    )
}

fn rgb_picture(width: u32, height: u32) -> NativePicture {
    let samples = (0..(width * height * 3) as usize).map(|i| (i % 256) as u16).collect();
    NativePicture::rgb(width, height, samples)
}

fn benchmark_conversion(criterion: &mut Criterion) {
    let converter = FrameConverter::new();
    let mut group = criterion.benchmark_group("convert");

    for (width, height) in [(640, 360), (1920, 1080)] {
        let label = format!("{width}x{height}");

        let rgb = rgb_picture(width, height);
        group.bench_with_input(BenchmarkId::new("rgb direct", &label), &rgb, |bencher, picture| {
            bencher.iter(|| converter.convert(black_box(picture), 0).unwrap());
        });

        let cropped = rgb_picture(width, height + 8).with_crop(CropRectangle::new(0, 0, width, height));
        group.bench_with_input(BenchmarkId::new("rgb cropped", &label), &cropped, |bencher, picture| {
            bencher.iter(|| converter.convert(black_box(picture), 0).unwrap());
        });

        let yuv = yuv420_picture(width, height);
        group.bench_with_input(BenchmarkId::new("yuv420", &label), &yuv, |bencher, picture| {
            bencher.iter(|| converter.convert(black_box(picture), 0).unwrap());
        });
    }

    group.finish();
}

fn benchmark_decoding(criterion: &mut Criterion) {
    framegrab::set_ffmpeg_log_level(FfmpegLogLevel::Error);

    if !Path::new(SAMPLE_VIDEO).exists() {
        eprintln!("Skipping decode benchmarks: fixture not found");
        return;
    }

    criterion.bench_function("frame_at (first frame)", |bencher| {
        bencher.iter(|| {
            let mut session = VideoSession::open(SAMPLE_VIDEO).unwrap();
            session.frame_at(0).unwrap()
        });
    });

    criterion.bench_function("frame_at (last frame, seek)", |bencher| {
        bencher.iter(|| {
            let mut session = VideoSession::open(SAMPLE_VIDEO).unwrap();
            let last = session.metadata().total_frames - 1;
            session.frame_at(last).unwrap()
        });
    });

    criterion.bench_function("all_frames", |bencher| {
        bencher.iter(|| {
            let mut session = VideoSession::open(SAMPLE_VIDEO).unwrap();
            session.all_frames().unwrap().len()
        });
    });
}

criterion::criterion_group!(benches, benchmark_conversion, benchmark_decoding);
criterion::criterion_main!(benches);
