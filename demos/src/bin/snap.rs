use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use openscan::prelude::*;
use openscan_demos::{stats, ScanArgs};

/// Snaps one image from the simulated scanner and prints per-channel statistics.
#[derive(Debug, Parser)]
struct Arg {
    #[command(flatten)]
    scan: ScanArgs,
    /// Region of interest as x,y,width,height
    #[arg(long, value_delimiter = ',', num_args = 4)]
    roi: Option<Vec<u32>>,
}

fn main() -> Result<()> {
    let arg = Arg::parse();
    arg.scan.init_tracing();

    let option = OpenScanOption {
        config: arg.scan.config()?,
        ..Default::default()
    };
    let mut device = OpenScan::open(
        Simulated::default(),
        Arc::new(RingBufferSink::new(1)),
        option,
    )?;
    if let Some(&[x, y, w, h]) = arg.roi.as_deref() {
        device.set_roi(x, y, w, h)?;
    }

    device.snap_image()?;

    println!(
        "{}x{} pixels, magnification {:.2}",
        device.image_width(),
        device.image_height(),
        device.magnification()
    );
    (0..device.number_of_channels()).for_each(|i| {
        let pixels = device
            .image_buffer(i)
            .map(|bytes| {
                bytes
                    .chunks_exact(2)
                    .map(|b| u16::from_le_bytes([b[0], b[1]]))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        let (min, max, mean) = stats(&pixels);
        println!(
            "{:>6}: min {:>5}, max {:>5}, mean {:>9.2}",
            device.channel_name(i).unwrap_or_default(),
            min,
            max,
            mean
        );
    });

    device.close()?;
    Ok(())
}
