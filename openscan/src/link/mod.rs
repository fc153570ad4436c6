#[cfg_attr(docsrs, doc(cfg(feature = "link-audit")))]
#[cfg(feature = "link-audit")]
#[doc(hidden)]
pub mod audit;
#[cfg_attr(docsrs, doc(cfg(feature = "link-simulated")))]
#[cfg(feature = "link-simulated")]
mod simulated;

#[cfg(feature = "link-audit")]
pub use audit::{Audit, AuditOption, RegisterWrite};
#[cfg(feature = "link-simulated")]
pub use simulated::Simulated;

#[cfg(any(feature = "link-audit", feature = "link-simulated"))]
pub use openscan_fpga_emulator::{EmulatorOption, FPGAEmulator};

#[cfg(any(feature = "link-audit", feature = "link-simulated"))]
fn check_signature(
    bitfile: &openscan_core::fpga::Bitfile,
    signature: &str,
) -> Result<(), openscan_core::link::LinkError> {
    use openscan_core::link::{status, LinkError};

    if bitfile.signature == signature {
        Ok(())
    } else {
        Err(LinkError::with_status(
            status::SIGNATURE_MISMATCH,
            format!(
                "Signature of {} ({}) does not match the target ({})",
                bitfile.name, bitfile.signature, signature
            ),
        ))
    }
}

#[cfg(any(feature = "link-audit", feature = "link-simulated"))]
fn invalid_session() -> openscan_core::link::LinkError {
    use openscan_core::link::{status, LinkError};

    LinkError::with_status(status::INVALID_SESSION, "session is not open")
}
