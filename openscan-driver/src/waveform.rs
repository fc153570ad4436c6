use getset::Getters;

use crate::{
    config::{Resolution, ScanConfig},
    error::{Axis, ScanDriverError},
};

/// Undershoot samples prepended to every line.
pub const X_UNDERSHOOT: usize = 50;
/// Retrace samples appended to every line.
pub const X_RETRACE_LEN: usize = 438;
/// DAC counts per volt.
pub const DAC_COUNTS_PER_VOLT: f64 = 3276.8;
/// DAC code of 0 V.
pub const DAC_HALF_SCALE: f64 = 32768.0;

const SCAN_START: f64 = -0.5;
const SCAN_END: f64 = 0.5;

/// Galvo drive codes of one frame.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct Waveform {
    /// Fast axis codes of one line, including undershoot and retrace.
    x: Vec<u16>,
    /// Slow axis codes, one per line.
    y: Vec<u16>,
}

impl Waveform {
    /// Generates the waveform for `resolution` at the given zoom and offsets (in volts).
    ///
    /// # Errors
    ///
    /// Returns [`ScanDriverError::WaveformOutOfRange`] if any sample maps outside the DAC range.
    pub fn generate(
        resolution: Resolution,
        zoom: f64,
        offset_x: f64,
        offset_y: f64,
    ) -> Result<Self, ScanDriverError> {
        let len = resolution.pixels() as usize;
        let scale = |axis: Axis, samples: Vec<f64>, offset: f64| {
            samples
                .into_iter()
                .enumerate()
                .map(|(index, p)| {
                    volts_to_dac(p, zoom, offset).map_err(|code| {
                        ScanDriverError::WaveformOutOfRange { axis, index, code }
                    })
                })
                .collect::<Result<Vec<_>, _>>()
        };
        Ok(Self {
            x: scale(
                Axis::X,
                galvo_waveform(len, X_RETRACE_LEN, X_UNDERSHOOT, SCAN_START, SCAN_END),
                offset_x,
            )?,
            y: scale(
                Axis::Y,
                galvo_waveform(len, 0, 0, SCAN_START, SCAN_END),
                offset_y,
            )?,
        })
    }

    /// Generates the waveform for `config`.
    ///
    /// # Errors
    ///
    /// See [`Waveform::generate`].
    pub fn from_config(config: &ScanConfig) -> Result<Self, ScanDriverError> {
        Self::generate(
            config.resolution,
            config.zoom.value(),
            config.offset_x.volts(),
            config.offset_y.volts(),
        )
    }

    /// Samples per line.
    #[must_use]
    pub fn elements_per_line(&self) -> usize {
        self.x.len()
    }

    /// Number of lines.
    #[must_use]
    pub fn lines(&self) -> usize {
        self.y.len()
    }

    /// Total samples of one frame.
    #[must_use]
    pub fn total_elements(&self) -> usize {
        self.elements_per_line() * self.lines()
    }

    /// Upload words of `line`: X code in the high half, Y code in the low half.
    pub fn packed_line(&self, line: usize) -> impl Iterator<Item = u32> + '_ {
        let y = self.y[line] as u32;
        self.x.iter().map(move |&x| ((x as u32) << 16) | y)
    }

    /// The first upload word, used to pre-position the galvos.
    #[must_use]
    pub fn first_sample(&self) -> u32 {
        ((self.x[0] as u32) << 16) | self.y[0] as u32
    }
}

/// Linear ramp from `scan_start` to `scan_end` over `len` samples, with `undershoot_len` samples
/// continuing the ramp before it and a cubic retrace of `retrace_len` samples back to the undershoot start.
pub fn galvo_waveform(
    len: usize,
    retrace_len: usize,
    undershoot_len: usize,
    scan_start: f64,
    scan_end: f64,
) -> Vec<f64> {
    let amplitude = scan_end - scan_start;
    let step = amplitude / (len - 1) as f64;
    let undershoot_start = scan_start - undershoot_len as f64 * step;
    let linear_len = undershoot_len + len;

    let mut waveform = Vec::with_capacity(linear_len + retrace_len);
    waveform.extend(
        (0..linear_len).map(|i| undershoot_start + amplitude * (i as f64 / (len - 1) as f64)),
    );
    waveform.extend(spline_interpolate(
        retrace_len,
        scan_end,
        undershoot_start,
        step,
        step,
    ));
    waveform
}

/// Samples at `x = 0..n` the cubic that starts at `y_first` with slope `slope_first`
/// and reaches `y_last` with slope `slope_last` at `x = n`.
pub fn spline_interpolate(
    n: usize,
    y_first: f64,
    y_last: f64,
    slope_first: f64,
    slope_last: f64,
) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let nf = n as f64;
    let n2 = nf * nf;
    let n3 = n2 * nf;
    let c0 = slope_first / n2 + 2.0 * y_first / n3 + slope_last / n2 - 2.0 * y_last / n3;
    let c1 = 3.0 * y_last / n2 - slope_last / nf - 2.0 * slope_first / nf - 3.0 * y_first / n2;
    let c2 = slope_first;
    let c3 = y_first;
    (0..n)
        .map(|x| {
            let x = x as f64;
            ((c0 * x + c1) * x + c2) * x + c3
        })
        .collect()
}

/// Maps a normalized sample to a DAC code. Returns the unclamped code on overflow.
pub fn volts_to_dac(p: f64, zoom: f64, offset: f64) -> Result<u16, f64> {
    let code =
        (p / zoom * DAC_COUNTS_PER_VOLT + DAC_HALF_SCALE + offset * DAC_COUNTS_PER_VOLT).round();
    if (0.0..=u16::MAX as f64).contains(&code) {
        Ok(code as u16)
    } else {
        Err(code)
    }
}
