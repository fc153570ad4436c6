use derive_more::Display;

/// An image channel delivered to the host.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Samples of the latest frame.
    #[display("Raw")]
    Raw,
    /// Running average over the Kalman group.
    #[display("Kalman")]
    Averaged,
}

/// Which channels are delivered to the host.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChannelMode {
    /// Raw samples only.
    Raw,
    /// Averaged samples only.
    Averaged,
    /// Raw and averaged samples as two channels.
    #[default]
    RawAndAveraged,
}

impl ChannelMode {
    /// Channels in delivery order.
    #[must_use]
    pub const fn channels(self) -> &'static [Channel] {
        match self {
            Self::Raw => &[Channel::Raw],
            Self::Averaged => &[Channel::Averaged],
            Self::RawAndAveraged => &[Channel::Raw, Channel::Averaged],
        }
    }
}
