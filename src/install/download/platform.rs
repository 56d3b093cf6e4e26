//! Platform detection for release asset disambiguation

use once_cell::sync::OnceCell;

/// Operating system family as it appears in release asset names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Linux,
    MacOs,
    Windows,
    Other,
}

/// CPU architecture as it appears in release asset names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    X8664,
    Aarch64,
    Other,
}

/// Current platform, used to pick between similarly named assets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub os: Os,
    pub arch: Arch,
}

/// Global cache for platform detection (initialized once, used everywhere)
static PLATFORM_CACHE: OnceCell<Platform> = OnceCell::new();

impl Platform {
    /// Detect current platform (cached after first call)
    pub fn detect() -> Self {
        *PLATFORM_CACHE.get_or_init(|| Self::from_consts(std::env::consts::OS, std::env::consts::ARCH))
    }

    pub fn from_consts(os: &str, arch: &str) -> Self {
        let os = match os {
            "linux" => Os::Linux,
            "macos" => Os::MacOs,
            "windows" => Os::Windows,
            _ => Os::Other,
        };
        let arch = match arch {
            "x86_64" => Arch::X8664,
            "aarch64" => Arch::Aarch64,
            _ => Arch::Other,
        };
        Self { os, arch }
    }

    /// Lowercase name fragments that identify this OS in an asset name
    pub fn os_tokens(&self) -> &'static [&'static str] {
        match self.os {
            Os::Linux => &["linux"],
            Os::MacOs => &["macos", "darwin", "apple"],
            Os::Windows => &["windows", "win64", ".exe"],
            Os::Other => &[],
        }
    }

    /// Lowercase name fragments that identify this architecture in an asset name
    pub fn arch_tokens(&self) -> &'static [&'static str] {
        match self.arch {
            Arch::X8664 => &["x86_64", "amd64", "x64"],
            Arch::Aarch64 => &["aarch64", "arm64"],
            Arch::Other => &[],
        }
    }
}
