//! Offline frame-dump runner.
//!
//! Replays raw detector output dumps through the post-processing pipeline:
//! decodes and filters boxes, appends the occupancy row to the log file and
//! optionally applies face redaction to a source image.

use std::fs::File;
use std::io::BufReader;

use anyhow::{bail, Context, Result};
use clap::Parser;
use ndarray::ArrayD;
use serde::Deserialize;

use occuscan::config::Args;
use occuscan::decoder::AnchorTemplate;
use occuscan::labels::{load_anchors, read_class_names};
use occuscan::redact;
use occuscan::{Pipeline, ReportWriter};

/// One frame's worth of raw detector output plus the original image size.
#[derive(Deserialize)]
struct FrameDump {
    org_w: u32,
    org_h: u32,
    outputs: Vec<ArrayD<f32>>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let names = read_class_names(&args.names)
        .with_context(|| format!("reading class names from {}", args.names.display()))?;
    let anchors = load_anchors(&args.anchors)
        .with_context(|| format!("reading anchors from {}", args.anchors.display()))?;

    if anchors.len() != args.strides.len() || anchors.len() != args.xyscale.len() {
        bail!(
            "{} anchor scales but {} strides / {} xyscale factors",
            anchors.len(),
            args.strides.len(),
            args.xyscale.len()
        );
    }
    let templates: Vec<AnchorTemplate> = anchors
        .into_iter()
        .zip(args.strides.iter().zip(&args.xyscale))
        .map(|(set, (&stride, &xy_scale))| AnchorTemplate::new(set, stride, xy_scale))
        .collect();

    let config = args.pipeline_config(names.len())?;
    let pipeline = Pipeline::new(config, templates);

    let file = File::open(&args.frame)
        .with_context(|| format!("opening frame dump {}", args.frame.display()))?;
    let dump: FrameDump =
        serde_json::from_reader(BufReader::new(file)).context("parsing frame dump")?;

    let analysis = pipeline.process(&dump.outputs, dump.org_w, dump.org_h)?;

    for d in &analysis.detections {
        let name = names
            .get(d.bbox.class_id)
            .map(String::as_str)
            .unwrap_or("unknown");
        println!(
            "{}: {:.2} ({:.0}, {:.0}, {:.0}, {:.0})",
            name, d.bbox.score, d.bbox.xmin, d.bbox.ymin, d.bbox.xmax, d.bbox.ymax
        );
    }

    // The distancing predicate runs outside this tool; replay with zeros
    // unless the caller measured it.
    let report = analysis.report(0, 0.0, 0.0);
    println!("{}", report.summary());

    let mut writer = ReportWriter::open(&args.log)?;
    writer.append(&report)?;
    log::info!(
        "{}: {} boxes, {} people -> {}",
        args.frame.display(),
        analysis.detections.len(),
        analysis.people.len(),
        args.log.display()
    );

    if let (Some(image_path), Some(out_path)) = (&args.image, &args.out) {
        let mut img = image::open(image_path)
            .with_context(|| format!("opening {}", image_path.display()))?
            .to_rgb8();
        // Redact before anything is drawn on top.
        redact::redact_all(&mut img, &analysis.detections, redact::DEFAULT_BLOCKS);
        img.save(out_path)
            .with_context(|| format!("saving {}", out_path.display()))?;
        println!("redacted image written to {}", out_path.display());
    }

    Ok(())
}
