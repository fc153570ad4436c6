use core::time::Duration;

pub use spin_sleep::{SpinSleeper, SpinStrategy};

#[cfg(target_os = "windows")]
unsafe extern "system" {
    fn timeBeginPeriod(u: u32) -> u32;
    fn timeEndPeriod(u: u32) -> u32;
}

/// A trait for sleep operations.
pub trait Sleep: core::fmt::Debug {
    /// Sleep for the specified duration.
    fn sleep(&self, duration: Duration);
}

// GRCOV_EXCL_START
impl Sleep for Box<dyn Sleep + Send> {
    fn sleep(&self, duration: Duration) {
        self.as_ref().sleep(duration);
    }
}
// GRCOV_EXCL_STOP

/// A sleeper that uses [`std::thread::sleep`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StdSleeper;

impl Sleep for StdSleeper {
    fn sleep(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }

        #[cfg(target_os = "windows")]
        unsafe {
            timeBeginPeriod(1);
        }
        std::thread::sleep(duration);
        #[cfg(target_os = "windows")]
        unsafe {
            timeEndPeriod(1);
        }
    }
}

impl Sleep for SpinSleeper {
    fn sleep(&self, duration: Duration) {
        SpinSleeper::sleep(*self, duration);
    }
}

/// A sleeper that uses a spin loop to wait until the deadline is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpinWaitSleeper;

impl Sleep for SpinWaitSleeper {
    fn sleep(&self, duration: Duration) {
        use std::time::Instant;

        let deadline = Instant::now() + duration;
        while Instant::now() < deadline {
            core::hint::spin_loop();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    #[rstest::rstest]
    #[test]
    #[case::std(Box::new(StdSleeper))]
    #[case::spin(Box::new(SpinSleeper::default()))]
    #[case::spin_wait(Box::new(SpinWaitSleeper))]
    fn sleeps_at_least(#[case] sleeper: Box<dyn Sleep + Send>) {
        {
            let start = Instant::now();
            sleeper.sleep(Duration::from_millis(5));
            assert!(Duration::from_millis(5) <= start.elapsed());
        }
        {
            let start = Instant::now();
            sleeper.sleep(Duration::ZERO);
            assert!(Duration::ZERO <= start.elapsed());
        }
    }
}
