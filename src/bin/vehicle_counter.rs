use anyhow::Result;
use blobcount::{
    blobs::BlobExtractor,
    config::{self, VehicleCounterConfig},
    display::Display,
    filter::MorphFilter,
    render::Renderer,
    roi::Roi,
    snapshot,
    subtractor::Subtractor,
    tracker::CounterConfig,
    video::{VideoSource, VideoWriter},
    EntryCounter, VehicleClass,
};
use clap::Parser;
use opencv::prelude::*;
use std::path::PathBuf;
use tracing::{info, warn};

/// Counts cars and trucks entering a region of interest through its top edge
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
    blobcount::init_logging("blobcount=info,vehicle_counter=info");
    let args = Args::parse();

    let mut cfg: VehicleCounterConfig = config::load_or_default(args.config.as_deref())?;
    if let Some(source) = args.source {
        cfg.video.source = source;
    }
    if args.output.is_some() {
        cfg.video.output = args.output;
    }

    let mut source = VideoSource::open(&cfg.video.source)?.with_scale(cfg.video.scale);
    let first = source.first()?;

    let roi = match cfg.roi {
        Some(roi) => roi,
        None => Roi::select("Select ROI", &first)?,
    };
    roi.validate(first.cols(), first.rows())?;

    let min_area = cfg.min_area_for(roi.area());
    info!(
        "region of interest {:?}, blob area {}..={}",
        roi, min_area, cfg.max_area
    );

    let mut subtractor = Subtractor::new(&cfg.subtractor)?;
    let filter = MorphFilter::new(&cfg.filter)?;
    let extractor = BlobExtractor::new(min_area, Some(cfg.max_area));
    let mut counter = EntryCounter::with_config(CounterConfig {
        min_area,
        ..cfg.counter.clone()
    });
    let (entry_line, exit_line) = (counter.config().entry_line, counter.config().exit_line);

    let renderer = Renderer::new(cfg.palette.clone());
    let display = Display::open(&cfg.windows)?;
    let frame_window = display.windows().get(0).map_or("Frame", |w| w.name.as_str());
    let mask_window = display.windows().get(1).map_or("Mask", |w| w.name.as_str());

    let fps = source
        .fps()
        .ok()
        .filter(|fps| *fps > 0.0)
        .unwrap_or(cfg.video.fps);
    let mut writer = cfg.video.output.as_ref().map(|path| VideoWriter::new(path, fps));

    while let Some(mut frame) = source.read()? {
        let mut view = roi.view(&frame)?;
        let mask = filter.apply(&subtractor.apply(&view)?)?;

        for blob in extractor.extract(&mask)? {
            let (cx, cy) = blob.centroid();
            let reg = counter.register(cx, cy, blob.area);
            let label = reg.class.display_label();

            if reg.counted && reg.class != VehicleClass::Ignore {
                if let (Some(id), Some(dir)) = (reg.id, cfg.crops_dir.as_deref()) {
                    if let Err(err) = snapshot::save_crop(dir, &view, &blob.bbox, label, id) {
                        warn!("unable to save vehicle {}: {}", id, err);
                    }
                }
            }

            renderer.draw_detection(&mut view, &blob.bbox, label)?;
        }

        counter.end_frame();

        for track in counter.tracks() {
            renderer.draw_trail(&mut view, track)?;
        }
        renderer.draw_entry_lines(&mut view, roi.width, entry_line, exit_line)?;
        renderer.draw_counts(&mut frame, &counter.counts())?;

        display.show(frame_window, &frame)?;
        display.show(mask_window, &mask)?;

        if let Some(writer) = writer.as_mut() {
            writer.feed(&frame)?;
        }

        if display.should_quit(cfg.video.wait_ms)? {
            info!("quit requested");
            break;
        }
    }

    let counts = counter.counts();
    info!(
        "finished after {} frames with {}: {} cars, {} trucks",
        source.frames_read(),
        subtractor.name(),
        counts.cars,
        counts.trucks
    );

    if let Some(mut writer) = writer {
        writer.release()?;
    }
    source.release()?;
    display.close()?;

    Ok(())
}
