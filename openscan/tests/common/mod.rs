#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use openscan::{
    link::{Audit, AuditOption, EmulatorOption},
    prelude::*,
};

pub fn option(config: ScanConfig) -> OpenScanOption {
    OpenScanOption {
        scanner: ScannerOption {
            poll: PollOption {
                interval: Duration::from_millis(1),
                timeout: Some(Duration::from_secs(10)),
            },
            reader: FrameReaderOption {
                interval: Duration::from_millis(1),
                stall_timeout: Some(Duration::from_millis(200)),
                ..Default::default()
            },
            ..Default::default()
        },
        config,
        ..Default::default()
    }
}

pub fn config(channel_mode: ChannelMode, kalman: KalmanConfig) -> anyhow::Result<ScanConfig> {
    Ok(ScanConfig {
        resolution: Resolution::new(256)?,
        channel_mode,
        kalman,
        ..Default::default()
    })
}

pub fn audit(emulator: EmulatorOption) -> Audit {
    Audit::new(AuditOption {
        emulator,
        broken: false,
    })
}

pub fn open(
    link: Audit,
    sink: Arc<RingBufferSink>,
    config: ScanConfig,
) -> anyhow::Result<OpenScan<Audit>> {
    Ok(OpenScan::open(link, sink, option(config))?)
}

pub fn wait_finished(
    events: &async_channel::Receiver<SequenceEvent>,
) -> anyhow::Result<(Vec<u64>, SequenceOutcome)> {
    let mut delivered = Vec::new();
    loop {
        match events.recv_blocking()? {
            SequenceEvent::FrameDelivered { index } => delivered.push(index),
            SequenceEvent::Finished(outcome) => return Ok((delivered, outcome)),
        }
    }
}
