use rand::{rngs::SmallRng, Rng, SeedableRng};

/// Synthetic sample seen through the galvo positions.
#[derive(Debug)]
pub(crate) struct Specimen {
    rng: SmallRng,
    noise: u16,
}

impl Specimen {
    pub fn new(seed: u64, noise: u16) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            noise,
        }
    }

    /// Noise-free intensity at the DAC codes `x` and `y`: a checkerboard with 2048-code cells.
    pub fn intensity(x: u16, y: u16) -> u16 {
        if ((x >> 11) ^ (y >> 11)) & 1 == 0 {
            1024
        } else {
            9216
        }
    }

    pub fn sample(&mut self, x: u16, y: u16) -> u16 {
        let noise = if self.noise == 0 {
            0
        } else {
            self.rng.random_range(0..=self.noise)
        };
        Self::intensity(x, y).saturating_add(noise)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    #[test]
    #[case(1024, 0, 0)]
    #[case(9216, 2048, 0)]
    #[case(9216, 0, 2048)]
    #[case(1024, 2048, 2048)]
    #[case(1024, 2047, 2047)]
    fn intensity(#[case] expect: u16, #[case] x: u16, #[case] y: u16) {
        assert_eq!(expect, Specimen::intensity(x, y));
    }

    #[rstest::rstest]
    #[test]
    #[case(0)]
    #[case(64)]
    fn sample_is_bounded(#[case] noise: u16) {
        let mut specimen = Specimen::new(1, noise);
        (0..1000).for_each(|_| {
            let v = specimen.sample(0, 0);
            assert!((1024..=1024 + noise).contains(&v));
        });
    }

    #[test]
    fn sample_is_deterministic() {
        let mut a = Specimen::new(7, 64);
        let mut b = Specimen::new(7, 64);
        (0..100).for_each(|i| assert_eq!(a.sample(i, i), b.sample(i, i)));
    }
}
