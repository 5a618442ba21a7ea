use std::fmt;
use std::str::FromStr;

use crate::error::CompressError;

/// Quality selector offered to users. Lower quality means a smaller file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompressionLevel {
    Low,
    #[default]
    Medium,
    High,
}

/// Named `PDFSETTINGS` presets understood by Ghostscript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    /// 72 dpi images, maximum compression.
    Screen,
    /// 150 dpi images.
    Ebook,
    /// 300 dpi images, minimal compression.
    Printer,
}

impl CompressionLevel {
    pub const ALL: [CompressionLevel; 3] = [
        CompressionLevel::Low,
        CompressionLevel::Medium,
        CompressionLevel::High,
    ];

    pub fn preset(self) -> Preset {
        match self {
            CompressionLevel::Low => Preset::Screen,
            CompressionLevel::Medium => Preset::Ebook,
            CompressionLevel::High => Preset::Printer,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CompressionLevel::Low => "low",
            CompressionLevel::Medium => "medium",
            CompressionLevel::High => "high",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            CompressionLevel::Low => "max compression, lower quality",
            CompressionLevel::Medium => "balanced compression and quality",
            CompressionLevel::High => "minimal compression, higher quality",
        }
    }
}

impl Preset {
    pub fn as_str(self) -> &'static str {
        match self {
            Preset::Screen => "screen",
            Preset::Ebook => "ebook",
            Preset::Printer => "printer",
        }
    }

    /// The `-dPDFSETTINGS` argument for this preset.
    pub fn pdf_settings_arg(self) -> String {
        format!("-dPDFSETTINGS=/{}", self.as_str())
    }
}

impl FromStr for CompressionLevel {
    type Err = CompressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CompressionLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| CompressError::InvalidArgument(format!("invalid compression level: {s:?}")))
    }
}

impl fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
