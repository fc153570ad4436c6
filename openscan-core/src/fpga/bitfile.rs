/// Identity of the FPGA image the scan engine is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bitfile {
    /// File name of the bitfile.
    pub name: String,
    /// Signature the target must report.
    pub signature: String,
}

impl Bitfile {
    /// File name of the OpenScan host bitfile.
    pub const OPEN_SCAN_NAME: &'static str = "NiFpga_OpenScanFPGAHost.lvbitx";
    /// Signature of the OpenScan host bitfile.
    pub const OPEN_SCAN_SIGNATURE: &'static str = "1B9F10A03F4A31562B1AF5E292E145E9";
}

impl Default for Bitfile {
    fn default() -> Self {
        Self {
            name: Self::OPEN_SCAN_NAME.to_string(),
            signature: Self::OPEN_SCAN_SIGNATURE.to_string(),
        }
    }
}
