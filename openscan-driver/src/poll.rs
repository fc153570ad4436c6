use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use openscan_core::{
    fpga::IndicatorBool,
    link::{Link, RegisterIo},
    sleep::Sleep,
};

use crate::error::ScanDriverError;

/// The option of indicator polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PollOption {
    /// The duration between two reads of the indicator.
    pub interval: Duration,
    /// If `None`, polling continues until the indicator is set or a stop is requested.
    pub timeout: Option<Duration>,
}

impl Default for PollOption {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(10),
            timeout: None,
        }
    }
}

/// A lock-guarded stop request shared between an acquisition and its owner.
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    requested: Arc<Mutex<bool>>,
}

impl StopToken {
    /// Creates a token with no stop requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a stop.
    pub fn request(&self) {
        match self.requested.lock() {
            Ok(mut requested) => *requested = true,
            Err(poisoned) => *poisoned.into_inner() = true,
        }
    }

    /// Checks if a stop has been requested. A poisoned lock counts as a request.
    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.requested.lock().map(|r| *r).unwrap_or(true)
    }
}

/// Polls `indicator` until it is set.
///
/// # Errors
///
/// Returns [`ScanDriverError::Cancelled`] if `stop` is requested first, and [`ScanDriverError::ScanTimeout`]
/// if `option.timeout` elapses first.
pub fn wait_for<L: Link + ?Sized, S: Sleep>(
    link: &mut L,
    sleeper: &S,
    indicator: IndicatorBool,
    option: &PollOption,
    stop: &StopToken,
) -> Result<(), ScanDriverError> {
    let start = Instant::now();
    loop {
        if link.read(indicator)? {
            return Ok(());
        }
        if stop.is_requested() {
            return Err(ScanDriverError::Cancelled);
        }
        if let Some(timeout) = option.timeout {
            if start.elapsed() > timeout {
                return Err(ScanDriverError::ScanTimeout(timeout));
            }
        }
        sleeper.sleep(option.interval);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use openscan_core::{
        fpga::{Bitfile, Fifo},
        link::LinkError,
        sleep::SpinWaitSleeper,
    };

    use super::*;

    #[derive(Default)]
    struct PollLink {
        regs: HashMap<u32, u32>,
        set_after: Option<usize>,
        reads: usize,
        down: bool,
    }

    impl Link for PollLink {
        fn open(&mut self, _: &Bitfile) -> Result<(), LinkError> {
            Ok(())
        }

        fn close(&mut self) -> Result<(), LinkError> {
            Ok(())
        }

        fn is_open(&self) -> bool {
            true
        }

        fn reset(&mut self) -> Result<(), LinkError> {
            Ok(())
        }

        fn read_bool(&mut self, _: u32) -> Result<bool, LinkError> {
            if self.down {
                return Err(LinkError::new("link is down"));
            }
            self.reads += 1;
            Ok(self.set_after.is_some_and(|n| self.reads > n))
        }

        fn write_bool(&mut self, addr: u32, value: bool) -> Result<(), LinkError> {
            self.regs.insert(addr, value as u32);
            Ok(())
        }

        fn read_u16(&mut self, addr: u32) -> Result<u16, LinkError> {
            Ok(self.regs.get(&addr).copied().unwrap_or_default() as u16)
        }

        fn write_u16(&mut self, addr: u32, value: u16) -> Result<(), LinkError> {
            self.regs.insert(addr, value as u32);
            Ok(())
        }

        fn read_i32(&mut self, addr: u32) -> Result<i32, LinkError> {
            Ok(self.regs.get(&addr).copied().unwrap_or_default() as i32)
        }

        fn write_i32(&mut self, addr: u32, value: i32) -> Result<(), LinkError> {
            self.regs.insert(addr, value as u32);
            Ok(())
        }

        fn read_u32(&mut self, addr: u32) -> Result<u32, LinkError> {
            Ok(self.regs.get(&addr).copied().unwrap_or_default())
        }

        fn write_u32(&mut self, addr: u32, value: u32) -> Result<(), LinkError> {
            self.regs.insert(addr, value);
            Ok(())
        }

        fn write_fifo(&mut self, _: Fifo, _: &[u32], _: Duration) -> Result<usize, LinkError> {
            Ok(0)
        }

        fn read_fifo(&mut self, _: Fifo, _: &mut [u32], _: Duration) -> Result<usize, LinkError> {
            Ok(0)
        }
    }

    #[test]
    fn wait_until_set() -> anyhow::Result<()> {
        let mut link = PollLink {
            set_after: Some(3),
            ..Default::default()
        };
        wait_for(
            &mut link,
            &SpinWaitSleeper,
            IndicatorBool::FrameAcquisitionFinish,
            &PollOption {
                interval: Duration::from_millis(1),
                timeout: None,
            },
            &StopToken::new(),
        )?;
        assert_eq!(4, link.reads);
        Ok(())
    }

    #[test]
    fn timeout() {
        let mut link = PollLink::default();
        let timeout = Duration::from_millis(20);
        assert_eq!(
            Err(ScanDriverError::ScanTimeout(timeout)),
            wait_for(
                &mut link,
                &SpinWaitSleeper,
                IndicatorBool::FrameAcquisitionFinish,
                &PollOption {
                    interval: Duration::from_millis(1),
                    timeout: Some(timeout),
                },
                &StopToken::new(),
            )
        );
        assert!(link.reads > 1);
    }

    #[test]
    fn cancelled() {
        let mut link = PollLink::default();
        let stop = StopToken::new();
        stop.request();
        assert_eq!(
            Err(ScanDriverError::Cancelled),
            wait_for(
                &mut link,
                &SpinWaitSleeper,
                IndicatorBool::FrameAcquisitionFinish,
                &PollOption::default(),
                &stop,
            )
        );
        assert_eq!(1, link.reads);
    }

    #[test]
    fn link_error() {
        let mut link = PollLink {
            down: true,
            ..Default::default()
        };
        assert_eq!(
            Err(ScanDriverError::Link(LinkError::new("link is down"))),
            wait_for(
                &mut link,
                &SpinWaitSleeper,
                IndicatorBool::FrameAcquisitionFinish,
                &PollOption::default(),
                &StopToken::new(),
            )
        );
    }

    #[test]
    fn stop_token_is_shared() {
        let stop = StopToken::new();
        let clone = stop.clone();
        assert!(!stop.is_requested());
        clone.request();
        assert!(stop.is_requested());
    }
}
