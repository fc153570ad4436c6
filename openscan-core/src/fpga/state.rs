use derive_more::Display;

/// State codes written to [`ControlU16::Current`].
///
/// [`ControlU16::Current`]: super::ControlU16::Current
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ScanState {
    /// Quiescent. The only state from which an acquisition may begin.
    Idle = 0,
    /// Flags cleared, streaming write paths disabled.
    Init = 1,
    /// Waveform upload in progress.
    Write = 2,
    /// Scanning a frame.
    Scan = 3,
    /// Between two frames of a sequence.
    Blank = 4,
    /// Scan halted on request.
    Stop = 5,
    /// Last frame read back.
    Done = 6,
}

impl ScanState {
    /// The code written to the state register.
    #[must_use]
    pub const fn code(self) -> u16 {
        self as u16
    }
}

impl TryFrom<u16> for ScanState {
    type Error = u16;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => Self::Idle,
            1 => Self::Init,
            2 => Self::Write,
            3 => Self::Scan,
            4 => Self::Blank,
            5 => Self::Stop,
            6 => Self::Done,
            _ => return Err(code),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    #[test]
    #[case(Ok(ScanState::Idle), 0)]
    #[case(Ok(ScanState::Init), 1)]
    #[case(Ok(ScanState::Write), 2)]
    #[case(Ok(ScanState::Scan), 3)]
    #[case(Ok(ScanState::Blank), 4)]
    #[case(Ok(ScanState::Stop), 5)]
    #[case(Ok(ScanState::Done), 6)]
    #[case(Err(7), 7)]
    #[case(Err(0xFFFF), 0xFFFF)]
    fn try_from_code(#[case] expect: Result<ScanState, u16>, #[case] code: u16) {
        assert_eq!(expect, ScanState::try_from(code));
    }
}
