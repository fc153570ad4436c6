mod common;

use std::sync::Arc;

use openscan::{link::EmulatorOption, prelude::*};
use openscan_core::fpga::{ControlI32, ControlU16, Register};

use common::*;

#[test]
fn busy_while_capturing() -> anyhow::Result<()> {
    let link = audit(EmulatorOption {
        frame_latency_polls: 20,
        ..Default::default()
    });
    let sink = Arc::new(RingBufferSink::new(64));
    let mut device = open(
        link,
        sink.clone(),
        config(ChannelMode::Averaged, KalmanConfig::default())?,
    )?;

    device.start_sequence_acquisition(10, true)?;
    assert!(device.is_capturing());
    assert_eq!(
        Err(OpenScanError::Busy),
        device.start_sequence_acquisition(10, true)
    );
    assert_eq!(
        Err(OpenScanError::Busy),
        device.set_resolution(Resolution::new(512)?)
    );
    assert_eq!(Err(OpenScanError::Busy), device.snap_image());
    assert_eq!(Err(OpenScanError::Busy), device.set_roi(0, 0, 8, 8));
    assert!(device.debug_indicators().is_err());
    assert_eq!(256, device.resolution().pixels());

    device.stop_sequence_acquisition(true)?;
    assert!(!device.is_capturing());
    assert!(matches!(
        device.last_outcome(),
        Some(SequenceOutcome::Stopped { .. })
    ));

    device.start_sequence_acquisition(1, true)?;
    device.stop_sequence_acquisition(true)?;
    device.close()?;
    Ok(())
}

#[test]
fn stop_is_idempotent() -> anyhow::Result<()> {
    let sink = Arc::new(RingBufferSink::new(4));
    let mut device = open(
        audit(EmulatorOption::default()),
        sink,
        config(ChannelMode::Averaged, KalmanConfig::default())?,
    )?;
    device.stop_sequence_acquisition(true)?;
    device.stop_sequence_acquisition(false)?;
    assert!(device.last_outcome().is_none());
    Ok(())
}

#[test]
fn zero_count_does_nothing() -> anyhow::Result<()> {
    let link = audit(EmulatorOption::default());
    let sink = Arc::new(RingBufferSink::new(4));
    let mut device = open(
        link.clone(),
        sink.clone(),
        config(ChannelMode::Averaged, KalmanConfig::default())?,
    )?;
    device.start_sequence_acquisition(0, true)?;
    assert!(!device.is_capturing());
    assert!(device.is_dirty());
    assert!(link.writes_to(ControlI32::FrameNumber.addr()).is_empty());
    assert!(sink.is_empty());
    Ok(())
}

#[rstest::rstest]
#[test]
#[case::grouped(3, vec![0, 1, 0, 1, 0, 1], 3, false)]
#[case::progressive(4, vec![0, 1, 0, 1], 4, true)]
fn frame_number_order(
    #[case] expect_delivered: u64,
    #[case] expect_frame_numbers: Vec<u32>,
    #[case] count: u64,
    #[case] progressive: bool,
) -> anyhow::Result<()> {
    let link = audit(EmulatorOption::default());
    let sink = Arc::new(RingBufferSink::new(16));
    let kalman = KalmanConfig::default()
        .with_frames(2)?
        .with_progressive(progressive);
    let mut device = open(
        link.clone(),
        sink.clone(),
        config(ChannelMode::Averaged, kalman)?,
    )?;
    let events = device.events();

    device.start_sequence_acquisition(count, true)?;
    let (delivered, outcome) = wait_finished(&events)?;

    assert_eq!(
        SequenceOutcome::Completed {
            frames: expect_delivered
        },
        outcome
    );
    assert_eq!((0..expect_delivered).collect::<Vec<_>>(), delivered);
    assert_eq!(expect_delivered as usize, sink.len());
    assert_eq!(
        expect_frame_numbers,
        link.writes_to(ControlI32::FrameNumber.addr())
    );
    assert_eq!(
        expect_frame_numbers
            .iter()
            .map(|&n| if n == 0 { 32768 } else { 16384 })
            .collect::<Vec<_>>(),
        link.writes_to(ControlU16::KalmanGain.addr())
    );
    assert_eq!(
        expect_frame_numbers.len(),
        link.with_emulator(|e| e.completed_frames())
    );

    device.stop_sequence_acquisition(true)?;
    assert_eq!(Some(&outcome), device.last_outcome());
    Ok(())
}

#[test]
fn waveform_is_not_reloaded_between_frames() -> anyhow::Result<()> {
    let link = audit(EmulatorOption::default());
    let sink = Arc::new(RingBufferSink::new(16));
    let mut device = open(
        link.clone(),
        sink,
        config(ChannelMode::Averaged, KalmanConfig::default())?,
    )?;
    let events = device.events();

    device.start_sequence_acquisition(3, true)?;
    wait_finished(&events)?;
    assert!(!device.is_capturing());
    device.start_sequence_acquisition(2, true)?;
    wait_finished(&events)?;

    let init = link
        .writes_to(ControlU16::Current.addr())
        .into_iter()
        .filter(|&code| code == u32::from(ScanState::Init.code()))
        .count();
    assert_eq!(1, init);
    assert_eq!(5, link.writes_to(ControlI32::FrameNumber.addr()).len());
    Ok(())
}

#[rstest::rstest]
#[test]
#[case::retry(SequenceOutcome::Completed { frames: 3 }, ChannelMode::Averaged, false)]
#[case::stop(
    SequenceOutcome::Failed { frames: 1, error: OpenScanError::SinkOverflow },
    ChannelMode::Averaged,
    true
)]
#[case::retry_both_channels(
    SequenceOutcome::Completed { frames: 3 },
    ChannelMode::RawAndAveraged,
    false
)]
#[case::stop_both_channels(
    SequenceOutcome::Failed { frames: 1, error: OpenScanError::SinkOverflow },
    ChannelMode::RawAndAveraged,
    true
)]
fn sink_overflow(
    #[case] expect: SequenceOutcome,
    #[case] channel_mode: ChannelMode,
    #[case] stop_on_overflow: bool,
) -> anyhow::Result<()> {
    let channels = channel_mode.channels();
    let sink = Arc::new(RingBufferSink::new(channels.len()));
    let mut device = open(
        audit(EmulatorOption::default()),
        sink.clone(),
        config(channel_mode, KalmanConfig::default())?,
    )?;
    let events = device.events();

    device.start_sequence_acquisition(3, stop_on_overflow)?;
    let (_, outcome) = wait_finished(&events)?;

    assert_eq!(expect, outcome);
    assert_eq!(
        channels.iter().map(ToString::to_string).collect::<Vec<_>>(),
        sink.drain()
            .iter()
            .filter_map(|image| image.metadata().get("CameraChannelName").cloned())
            .collect::<Vec<_>>()
    );
    Ok(())
}

#[test]
fn link_failure_aborts_sequence() -> anyhow::Result<()> {
    let link = audit(EmulatorOption {
        frame_latency_polls: 200,
        ..Default::default()
    });
    let sink = Arc::new(RingBufferSink::new(16));
    let mut device = open(
        link.clone(),
        sink,
        config(ChannelMode::Averaged, KalmanConfig::default())?,
    )?;
    let events = device.events();

    device.start_sequence_acquisition(10, true)?;
    assert_eq!(
        SequenceEvent::FrameDelivered { index: 0 },
        events.recv_blocking()?
    );
    link.break_down();
    let (_, outcome) = wait_finished(&events)?;

    match outcome {
        SequenceOutcome::Failed { frames, error } => {
            assert!((1..10).contains(&frames));
            assert_eq!(
                OpenScanError::Driver(ScanDriverError::Link(LinkError::new("broken"))),
                error
            );
        }
        outcome => anyhow::bail!("unexpected outcome: {:?}", outcome),
    }

    link.repair();
    device.start_sequence_acquisition(1, true)?;
    let (delivered, outcome) = wait_finished(&events)?;
    assert_eq!(vec![0], delivered);
    assert_eq!(SequenceOutcome::Completed { frames: 1 }, outcome);
    Ok(())
}

#[test]
fn continuous_acquisition() -> anyhow::Result<()> {
    let link = audit(EmulatorOption::default());
    let sink = Arc::new(RingBufferSink::new(2));
    let mut device = open(
        link.clone(),
        sink.clone(),
        config(ChannelMode::RawAndAveraged, KalmanConfig::default())?,
    )?;
    let events = device.events();

    device.start_continuous_acquisition()?;
    (0..5).try_for_each(|i| {
        assert_eq!(SequenceEvent::FrameDelivered { index: i }, events.recv_blocking()?);
        anyhow::Ok(())
    })?;
    device.stop_sequence_acquisition(true)?;

    let Some(SequenceOutcome::Stopped { frames }) = device.last_outcome().cloned() else {
        anyhow::bail!("sequence did not stop");
    };
    assert!(frames >= 5);
    assert_eq!(2, sink.len());
    assert!(!link.with_emulator(|e| e.is_scanning()));
    Ok(())
}

#[test]
fn drop_stops_sequence() -> anyhow::Result<()> {
    let link = audit(EmulatorOption {
        frame_latency_polls: 20,
        ..Default::default()
    });
    let sink = Arc::new(RingBufferSink::new(16));
    let mut device = open(
        link.clone(),
        sink,
        config(ChannelMode::Averaged, KalmanConfig::default())?,
    )?;
    device.start_sequence_acquisition(100, true)?;
    drop(device);

    assert!(!link.is_open());
    assert_eq!(
        ScanState::Idle.code(),
        link.with_emulator(|e| e.state_code())
    );
    Ok(())
}

#[test]
fn roi_applies_to_sequence() -> anyhow::Result<()> {
    let sink = Arc::new(RingBufferSink::new(4));
    let mut device = open(
        audit(EmulatorOption::default()),
        sink.clone(),
        config(ChannelMode::RawAndAveraged, KalmanConfig::default())?,
    )?;
    let events = device.events();
    device.set_roi(16, 32, 64, 8)?;

    device.start_sequence_acquisition(1, true)?;
    wait_finished(&events)?;

    let images = sink.drain();
    assert_eq!(2, images.len());
    images.iter().enumerate().for_each(|(i, image)| {
        assert_eq!(64, image.width());
        assert_eq!(8, image.height());
        assert_eq!(64 * 8, image.pixels().len());
        assert_eq!(
            Some(&i.to_string()),
            image.metadata().get("OpenScan-CameraChannelIndex")
        );
    });
    Ok(())
}
