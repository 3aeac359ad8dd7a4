use anyhow::Result;
use blobcount::{
    blobs::BlobExtractor,
    config::{self, MotionConfig},
    display::Display,
    filter::MorphFilter,
    render::{self, Renderer},
    subtractor::Subtractor,
    video::{VideoSource, VideoWriter},
};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Highlights any foreground movement in a video
#[derive(Parser, Debug)]
#[command(author, version, long_about = None)]
struct Args {
    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Video file to analyse
    #[arg(short, long)]
    source: Option<String>,

    /// Record the annotated video to this file
    #[arg(short, long)]
    output: Option<String>,
}

fn main() -> Result<()> {
    blobcount::init_logging("blobcount=info,motion_detector=info");
    let args = Args::parse();

    let mut cfg: MotionConfig = config::load_or_default(args.config.as_deref())?;
    if let Some(source) = args.source {
        cfg.video.source = source;
    }
    if args.output.is_some() {
        cfg.video.output = args.output;
    }

    let mut source = VideoSource::open(&cfg.video.source)?.with_scale(cfg.video.scale);
    let mut subtractor = Subtractor::new(&cfg.subtractor)?;
    let filter = MorphFilter::new(&cfg.filter)?;
    let extractor = BlobExtractor::new(cfg.min_area, None);
    let renderer = Renderer::new(cfg.palette.clone());

    let display = Display::open(&cfg.windows)?;
    let frame_window = display.windows().get(0).map_or("Frame", |w| w.name.as_str());
    let mask_window = display.windows().get(1).map_or("BG Mask", |w| w.name.as_str());

    let fps = source
        .fps()
        .ok()
        .filter(|fps| *fps > 0.0)
        .unwrap_or(cfg.video.fps);
    let mut writer = cfg.video.output.as_ref().map(|path| VideoWriter::new(path, fps));

    let mut frames_with_motion = 0u64;

    while let Some(mut frame) = source.read()? {
        let mask = filter.apply(&subtractor.apply(&frame)?)?;
        let blobs = extractor.extract(&mask)?;

        if !blobs.is_empty() {
            frames_with_motion += 1;
            renderer.draw_banner(&mut frame, &cfg.banner_text)?;
        }

        for blob in &blobs {
            renderer.draw_outline(&mut frame, &blob.contour, 3)?;
            renderer.draw_marker(&mut frame, &blob.bbox)?;
        }

        let result = render::masked(&frame, &mask)?;

        display.show(frame_window, &frame)?;
        display.show(mask_window, &result)?;

        if let Some(writer) = writer.as_mut() {
            writer.feed(&frame)?;
        }

        if display.should_quit(cfg.video.wait_ms)? {
            info!("quit requested");
            break;
        }
    }

    info!(
        "end of video: motion in {} of {} frames with {}",
        frames_with_motion,
        source.frames_read(),
        subtractor.name()
    );

    if let Some(mut writer) = writer {
        writer.release()?;
    }
    source.release()?;
    display.close()?;

    Ok(())
}
