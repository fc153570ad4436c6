use std::{sync::Arc, time::Duration};

use anyhow::Result;
use clap::Parser;
use openscan::prelude::*;
use openscan_demos::{stats, ScanArgs};

/// Runs a sequence acquisition on the simulated scanner and prints every delivered frame.
#[derive(Debug, Parser)]
struct Arg {
    #[command(flatten)]
    scan: ScanArgs,
    /// Number of frames. Runs until the duration elapses if omitted
    #[arg(long)]
    count: Option<u64>,
    /// Duration of a continuous acquisition in seconds
    #[arg(long, default_value_t = 2.0)]
    duration: f64,
    /// Capacity of the image sink
    #[arg(long, default_value_t = 8)]
    capacity: usize,
    /// Fail when the sink overflows instead of clearing it
    #[arg(long)]
    stop_on_overflow: bool,
}

fn main() -> Result<()> {
    let arg = Arg::parse();
    arg.scan.init_tracing();

    let sink = Arc::new(RingBufferSink::new(arg.capacity));
    let option = OpenScanOption {
        config: arg.scan.config()?,
        ..Default::default()
    };
    let mut device = OpenScan::open(Simulated::default(), sink.clone(), option)?;
    let events = device.events();

    match arg.count {
        Some(count) => device.start_sequence_acquisition(count, arg.stop_on_overflow)?,
        None => {
            device.start_continuous_acquisition()?;
            std::thread::sleep(Duration::from_secs_f64(arg.duration));
            device.stop_sequence_acquisition(false)?;
        }
    }

    loop {
        match events.recv_blocking()? {
            SequenceEvent::FrameDelivered { index } => {
                sink.drain().iter().for_each(|image| {
                    let (min, max, mean) = stats(image.pixels());
                    println!(
                        "frame {:>4} {:>6}: min {:>5}, max {:>5}, mean {:>9.2}",
                        index,
                        image
                            .metadata()
                            .get("CameraChannelName")
                            .map(String::as_str)
                            .unwrap_or_default(),
                        min,
                        max,
                        mean
                    );
                });
            }
            SequenceEvent::Finished(outcome) => {
                println!("{:?}", outcome);
                break;
            }
        }
    }

    device.close()?;
    Ok(())
}
