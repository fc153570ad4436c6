use clap::{Args, ValueEnum};
use openscan::prelude::*;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Channels {
    Raw,
    Averaged,
    Both,
}

impl From<Channels> for ChannelMode {
    fn from(channels: Channels) -> Self {
        match channels {
            Channels::Raw => ChannelMode::Raw,
            Channels::Averaged => ChannelMode::Averaged,
            Channels::Both => ChannelMode::RawAndAveraged,
        }
    }
}

/// Scan parameters shared by the demos.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Pixels per side
    #[arg(long, default_value_t = 256)]
    pub resolution: u32,
    /// Pixel rate in MHz
    #[arg(long, default_value_t = 1.25)]
    pub scan_rate: f64,
    /// Zoom factor
    #[arg(long, default_value_t = 1.0)]
    pub zoom: f64,
    /// Fast axis galvo offset in volts
    #[arg(long, default_value_t = 0.0)]
    pub offset_x: f64,
    /// Slow axis galvo offset in volts
    #[arg(long, default_value_t = 0.0)]
    pub offset_y: f64,
    /// Frames per Kalman group
    #[arg(long, default_value_t = 1)]
    pub kalman: u32,
    /// Deliver every frame of a Kalman group
    #[arg(long)]
    pub progressive: bool,
    /// Delivered channels
    #[arg(long, value_enum, default_value_t = Channels::Both)]
    pub channels: Channels,
    /// Log level
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log: LogLevel,
}

impl ScanArgs {
    pub fn init_tracing(&self) {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::from(self.log))
            .init();
    }

    pub fn config(&self) -> anyhow::Result<ScanConfig> {
        Ok(ScanConfig {
            scan_rate: ScanRate::new(self.scan_rate)?,
            resolution: Resolution::new(self.resolution)?,
            zoom: Zoom::new(self.zoom)?,
            offset_x: GalvoOffset::new(self.offset_x)?,
            offset_y: GalvoOffset::new(self.offset_y)?,
            channel_mode: self.channels.into(),
            kalman: KalmanConfig::default()
                .with_frames(self.kalman)?
                .with_progressive(self.progressive),
        })
    }
}

/// Minimum, maximum and mean of `pixels`.
pub fn stats(pixels: &[u16]) -> (u16, u16, f64) {
    let (min, max, sum) = pixels
        .iter()
        .fold((u16::MAX, u16::MIN, 0u64), |(min, max, sum), &p| {
            (min.min(p), max.max(p), sum + p as u64)
        });
    let mean = if pixels.is_empty() {
        0.0
    } else {
        sum as f64 / pixels.len() as f64
    };
    (min, max, mean)
}
