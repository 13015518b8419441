//! Benchmarks for command building and probe parsing
//!
//! Covers argument-vector assembly for single and multi-output commands
//! and parsing of ffprobe JSON.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ffpipe_av::probe::parse_output;
use ffpipe_av::{Codec, Ffmpeg, Format, InputStream, OutputStream, PixelFormat};

/// Sample ffprobe JSON output for a camera stream
const FFPROBE_CAMERA: &str = r#"{
    "streams": [
        {
            "index": 0,
            "codec_type": "video",
            "codec_name": "h264",
            "codec_tag_string": "[0][0][0][0]",
            "profile": "High",
            "width": 1920,
            "height": 1080,
            "pix_fmt": "yuvj420p",
            "r_frame_rate": "25/1",
            "avg_frame_rate": "25/1",
            "time_base": "1/90000"
        },
        {
            "index": 1,
            "codec_type": "audio",
            "codec_name": "pcm_alaw",
            "sample_rate": "8000",
            "channels": 1
        }
    ],
    "format": {
        "filename": "rtsp://camera/stream",
        "format_name": "rtsp",
        "nb_streams": 2
    }
}"#;

fn raw_pipe_command() -> Ffmpeg {
    let mut ffmpeg = Ffmpeg::new(InputStream::new("rtsp://camera/stream").unwrap());
    let mut output = OutputStream::pipe();
    output.set_muxer(Format::raw_video_muxer()).unwrap();
    output.set_encoder(Codec::video_encoder()).unwrap();
    output.set("pix_fmt", PixelFormat::Bgr24).unwrap();
    output.set("frame_rate", 25.0).unwrap();
    ffmpeg.add_output(output).unwrap();
    ffmpeg
}

fn multi_output_command(outputs: usize) -> Ffmpeg {
    let mut ffmpeg = Ffmpeg::new(InputStream::new("clip.mp4").unwrap());
    for i in 0..outputs {
        let mut output = OutputStream::new(format!("out_{i}.mp4"));
        output.set_encoder(Codec::libx264()).unwrap();
        output.set_muxer(Format::mp4()).unwrap();
        output.set("duration", 10).unwrap();
        output.set("overwrite", true).unwrap();
        ffmpeg.add_output(output).unwrap();
    }
    ffmpeg
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");

    let pipe = raw_pipe_command();
    group.bench_function("raw_pipe", |b| {
        b.iter(|| black_box(&pipe).build());
    });

    for outputs in [1, 4, 16] {
        let ffmpeg = multi_output_command(outputs);
        group.bench_with_input(BenchmarkId::new("outputs", outputs), &ffmpeg, |b, ffmpeg| {
            b.iter(|| black_box(ffmpeg).build());
        });
    }

    group.finish();
}

fn bench_construct(c: &mut Criterion) {
    let mut group = c.benchmark_group("construct");

    group.bench_function("raw_pipe", |b| {
        b.iter(raw_pipe_command);
    });

    group.finish();
}

fn bench_probe_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("probe_parsing");

    group.throughput(Throughput::Bytes(FFPROBE_CAMERA.len() as u64));
    group.bench_with_input(
        BenchmarkId::new("ffprobe", "camera"),
        &FFPROBE_CAMERA,
        |b, json| {
            b.iter(|| parse_output(black_box(json.as_bytes())).unwrap());
        },
    );

    group.finish();
}

criterion_group!(benches, bench_build, bench_construct, bench_probe_parsing);
criterion_main!(benches);
