/// A gain in Q1.15 fixed point, as written to the gain registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KalmanGain(u16);

impl KalmanGain {
    /// Gain of 1.0. Resets the running average to the incoming frame.
    pub const ONE: Self = Self(1 << 15);

    /// Creates a gain from its Q1.15 code.
    #[must_use]
    pub const fn from_code(code: u16) -> Self {
        Self(code)
    }

    /// Converts `value`, clamped to [0, 1], to the nearest representable gain.
    #[must_use]
    pub fn from_value(value: f64) -> Self {
        Self((value.clamp(0.0, 1.0) * Self::ONE.0 as f64).round() as u16)
    }

    /// Q1.15 code.
    #[must_use]
    pub const fn code(self) -> u16 {
        self.0
    }

    /// Gain as a real number.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0 as f64 / Self::ONE.0 as f64
    }
}

impl core::fmt::Display for KalmanGain {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:.5}", self.value())
    }
}

/// Per-frame gain of a Kalman group.
///
/// Frame `i` of a group is blended with gain `1 / (i + 1)`, which keeps the running average equal to the
/// unweighted mean of the frames seen so far.
#[must_use]
pub fn gain(index: u32) -> f64 {
    1.0 / (index as f64 + 1.0)
}
