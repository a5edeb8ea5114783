use std::fmt;
use std::str::FromStr;

pub const DEFAULT_CHANNEL: &str = "main";
pub const DEFAULT_MODULE: &str = "runtime";

#[derive(Debug, thiserror::Error)]
pub enum RefError {
    #[error("malformed package ref: {0:?}")]
    Malformed(String),
}

/// Hardware architecture a layer is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    Arm64,
    X86_64,
    Unknown,
}

impl Arch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::Arm64 => "arm64",
            Arch::X86_64 => "x86_64",
            Arch::Unknown => "unknown",
        }
    }

    /// The multiarch library triplet of this architecture.
    pub fn triplet(&self) -> Option<&'static str> {
        match self {
            Arch::Arm64 => Some("aarch64-linux-gnu"),
            Arch::X86_64 => Some("x86_64-linux-gnu"),
            Arch::Unknown => None,
        }
    }
}

impl From<&str> for Arch {
    fn from(s: &str) -> Self {
        match s {
            "arm64" => Arch::Arm64,
            "x86_64" => Arch::X86_64,
            _ => Arch::Unknown,
        }
    }
}

impl FromStr for Arch {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(s.into())
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A package reference, `appId/version/arch` in its local form. Remote
/// forms may prepend a channel and append a module segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ref {
    pub app_id: String,
    pub version: String,
    pub arch: Arch,
    pub channel: String,
    pub module: String,
}

impl Ref {
    pub fn new(app_id: impl Into<String>, version: impl Into<String>, arch: Arch) -> Self {
        Self {
            app_id: app_id.into(),
            version: version.into(),
            arch,
            channel: DEFAULT_CHANNEL.to_string(),
            module: DEFAULT_MODULE.to_string(),
        }
    }

    /// Parse `appId/version/arch`, `channel/appId/version/arch` or
    /// `channel/appId/version/arch/module`.
    pub fn parse(raw: &str) -> Result<Self, RefError> {
        let segments: Vec<&str> = raw.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(RefError::Malformed(raw.to_string()));
        }

        let (channel, app_id, version, arch, module) = match segments.as_slice() {
            [app_id, version, arch] => (DEFAULT_CHANNEL, *app_id, *version, *arch, DEFAULT_MODULE),
            [channel, app_id, version, arch] => (*channel, *app_id, *version, *arch, DEFAULT_MODULE),
            [channel, app_id, version, arch, module] => {
                (*channel, *app_id, *version, *arch, *module)
            }
            _ => return Err(RefError::Malformed(raw.to_string())),
        };

        Ok(Self {
            app_id: app_id.to_string(),
            version: version.to_string(),
            arch: arch.into(),
            channel: channel.to_string(),
            module: module.to_string(),
        })
    }

    /// Canonical local ref string, `appId/version/arch`.
    pub fn to_local_string(&self) -> String {
        format!("{}/{}/{}", self.app_id, self.version, self.arch)
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_local_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_parse_local_ref() -> Result<()> {
        let r = Ref::parse("org.example.App/1.0.0/x86_64")?;
        assert_eq!(r.app_id, "org.example.App");
        assert_eq!(r.version, "1.0.0");
        assert_eq!(r.arch, Arch::X86_64);
        assert_eq!(r.channel, DEFAULT_CHANNEL);
        assert_eq!(r.module, DEFAULT_MODULE);
        Ok(())
    }

    #[test]
    fn test_ref_round_trip() -> Result<()> {
        for raw in ["org.example.App/1.0.0/x86_64", "org.deepin.calculator/5.7.1/arm64"] {
            let r = Ref::parse(raw)?;
            assert_eq!(r.to_local_string(), raw);
        }
        Ok(())
    }

    #[test]
    fn test_parse_channel_and_module() -> Result<()> {
        let r = Ref::parse("stable/org.example.App/1.0.0/arm64/devel")?;
        assert_eq!(r.channel, "stable");
        assert_eq!(r.module, "devel");
        assert_eq!(r.arch, Arch::Arm64);
        Ok(())
    }

    #[test]
    fn test_unknown_arch_is_preserved() -> Result<()> {
        let r = Ref::parse("org.example.App/1.0.0/riscv64")?;
        assert_eq!(r.arch, Arch::Unknown);
        Ok(())
    }

    #[test]
    fn test_malformed_refs() {
        assert!(Ref::parse("").is_err());
        assert!(Ref::parse("org.example.App").is_err());
        assert!(Ref::parse("org.example.App/1.0.0").is_err());
        assert!(Ref::parse("org.example.App//x86_64").is_err());
        assert!(Ref::parse("a/b/c/d/e/f").is_err());
    }
}
