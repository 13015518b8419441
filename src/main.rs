mod cli;

use ffpipe::config::{self, Config};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{BuildArgs, Cli, Commands};
use ffpipe_av::tools::{count_gpus, list_hwaccels};
use ffpipe_av::{
    check_tool, Ffmpeg, InputStream, OutputStream, PixelFormat, Probe, Source, VideoCapture,
};
use ffpipe_media::{Frame, FrameData};
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "ffpipe=trace,ffpipe_av=trace,ffpipe_media=debug".to_string()
        } else {
            "ffpipe=info,ffpipe_av=info,ffpipe_media=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Probe { source, json } => probe_source(&source, json, cli.config.as_deref()),
        Commands::Build(args) => build_command(&args, cli.config.as_deref()),
        Commands::Capture {
            source,
            frames,
            out_dir,
            fps,
        } => capture_frames(&source, frames, &out_dir, fps, cli.config.as_deref()),
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("ffpipe {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Fail early on local paths that do not exist; devices and URLs are left to ffmpeg.
fn check_source(source: &Source) -> Result<()> {
    if let Source::Location(location) = source {
        if !location.contains("://") && !Path::new(location).exists() {
            anyhow::bail!("Source does not exist: {}", location);
        }
    }
    Ok(())
}

fn probe_source(source: &str, json: bool, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let source = Source::from(source);
    check_source(&source)?;

    let tools = config.tools.resolve()?;
    let mut probe = Probe::with_program(&tools.ffprobe, source)?;
    config.probe.apply(&mut probe)?;

    let path = probe.path();
    tracing::debug!("Probing {}", path);
    let info = probe.info()?;

    if json {
        let json_str = serde_json::to_string_pretty(info)?;
        println!("{}", json_str);
    } else {
        println!("Source: {}", path);
        println!("Size: {}x{}", info.width, info.height);
        println!("Frame rate: {:.3} fps", info.r_frame_rate);
        if let Some(ref codec) = info.codec_name {
            print!("Codec: {}", codec);
            if let Some(ref tag) = info.tag {
                print!(" ({})", tag);
            }
            println!();
        }
        if let Some(ref pix_fmt) = info.pix_fmt {
            println!("Pixel format: {}", pix_fmt);
        }
        println!("Other fields: {}", info.others.len());
    }

    Ok(())
}

fn build_command(args: &BuildArgs, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let tools = if args.run {
        config.tools.resolve()?
    } else {
        config.tools.toolchain()
    };

    let mut input = InputStream::new(args.input.as_str())?;
    if let Some(ref seek) = args.seek {
        input.set("seek", seek.as_str()).context("Invalid --seek")?;
    }

    let mut output = OutputStream::new(args.output.as_str());
    if let Some(ref codec) = args.codec {
        output.set_encoder_by_name(codec)?;
    }
    if let Some(ref format) = args.format {
        output.set_muxer_by_name(format)?;
    }
    if let Some(ref to) = args.to {
        output.set("to", to.as_str()).context("Invalid --to")?;
    }
    if let Some(duration) = args.duration {
        output.set("duration", duration).context("Invalid --duration")?;
    }
    if let Some(ref filter) = args.video_filter {
        output.add_video_filter(filter)?;
    }
    output.set("overwrite", args.overwrite)?;

    let mut ffmpeg = Ffmpeg::with_program(&tools.ffmpeg, input);
    config.ffmpeg.apply(&mut ffmpeg)?;
    ffmpeg.add_output(output)?;

    println!("{}", ffmpeg);

    if args.run {
        tracing::info!("Running {}", ffmpeg.program());
        ffmpeg.run_to_completion()?;
        println!("✓ Finished writing {}", args.output);
    }

    Ok(())
}

fn capture_frames(
    source: &str,
    frames: usize,
    out_dir: &Path,
    fps: Option<f64>,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let source = Source::from(source);
    check_source(&source)?;

    let pixel_format: PixelFormat = config.capture.pixel_format.parse()?;
    let encoding = config.capture.encoding()?;
    let fps = fps.or(config.capture.fps);
    let tools = config.tools.resolve()?;

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", out_dir))?;

    let mut capture = VideoCapture::new(source, fps, pixel_format, &tools)?;
    config.ffmpeg.apply(capture.capture_mut().ffmpeg_mut())?;
    config.probe.apply(capture.capture_mut().probe_mut())?;

    let (width, height) = {
        let reader = capture.run()?;
        (reader.width(), reader.height())
    };
    tracing::info!("Capturing {} frames of {}x{}", frames, width, height);

    let mut saved = 0;
    while saved < frames {
        let Some(frame) = capture.read()? else {
            break;
        };
        let frame = match pixel_format {
            PixelFormat::Bgr24 => bgr_to_rgb(frame),
            _ => frame,
        };
        let path = out_dir.join(format!("frame_{:05}.{}", saved, encoding.extension()));
        frame
            .save(&path, encoding, config.capture.quality, true)
            .with_context(|| format!("Failed to save {:?}", path))?;
        println!("Saved {}", path.display());
        saved += 1;
    }

    capture.release()?;

    if saved < frames {
        tracing::warn!("Source ended after {} of {} frames", saved, frames);
    }

    Ok(())
}

/// Image files are written as RGB.
fn bgr_to_rgb(frame: Frame) -> Frame {
    match frame.into_data() {
        FrameData::Array(mut array) => {
            for pixel in array.data_mut().chunks_exact_mut(3) {
                pixel.swap(0, 2);
            }
            Frame::from_array(&array)
        }
        FrameData::Buffer(buffer) => Frame::from_bytes(buffer),
    }
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let toolchain = config.tools.toolchain();

    println!("Checking external tools...\n");

    let tools = [check_tool(&toolchain.ffmpeg), check_tool(&toolchain.ffprobe)];
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    if tools[0].available {
        match list_hwaccels(&toolchain.ffmpeg) {
            Ok(methods) if methods.is_empty() => println!("\nHardware acceleration: none"),
            Ok(methods) => println!("\nHardware acceleration: {}", methods.join(", ")),
            Err(e) => tracing::warn!("Could not list hardware accelerators: {}", e),
        }
    }
    println!("NVIDIA GPUs: {}", count_gpus());

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install ffmpeg to enable all features.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    let tools = config.tools.toolchain();
    println!("  ffmpeg: {}", tools.ffmpeg);
    println!("  ffprobe: {}", tools.ffprobe);
    println!("  Log level: {}", config.ffmpeg.loglevel);
    println!(
        "  Capture: {} -> {} (quality {})",
        config.capture.pixel_format, config.capture.image_format, config.capture.quality
    );
    if let Some(fps) = config.capture.fps {
        println!("  Capture rate: {} fps", fps);
    }

    Ok(())
}
