//! `swisscv version`
//!
//! Everything here comes from `SWISSCV_*` variables set by `build.rs`, so a
//! batch of personas can be matched to the exact binary that sampled it.

use std::fmt;

/// Source control state of the build
#[derive(Debug, Clone, Copy)]
pub struct GitRevision {
    pub hash: &'static str,
    pub branch: &'static str,
    /// "true", "false" or "unknown" outside a checkout
    dirty: &'static str,
}

impl GitRevision {
    pub fn is_dirty(&self) -> bool {
        self.dirty == "true"
    }
}

/// Build metadata compiled into the binary
#[derive(Debug, Clone, Copy)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub git: GitRevision,
    pub built_at: &'static str,
    pub profile: &'static str,
    pub target: &'static str,
    pub host: &'static str,
    pub rustc: &'static str,
}

const BUILD: BuildInfo = BuildInfo {
    name: env!("CARGO_PKG_NAME"),
    version: env!("CARGO_PKG_VERSION"),
    git: GitRevision {
        hash: env!("SWISSCV_GIT_HASH"),
        branch: env!("SWISSCV_GIT_BRANCH"),
        dirty: env!("SWISSCV_GIT_DIRTY"),
    },
    built_at: env!("SWISSCV_BUILD_TIMESTAMP"),
    profile: env!("SWISSCV_PROFILE"),
    target: env!("SWISSCV_TARGET"),
    host: env!("SWISSCV_HOST"),
    rustc: env!("SWISSCV_RUSTC_VERSION"),
};

impl BuildInfo {
    /// `<version>-<hash>`, with `-dirty` appended for uncommitted builds
    pub fn full_version(&self) -> String {
        let suffix = if self.git.is_dirty() { "-dirty" } else { "" };
        format!("{}-{}{}", self.version, self.git.hash, suffix)
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hash = if self.git.is_dirty() {
            format!("{} (dirty)", self.git.hash)
        } else {
            self.git.hash.to_string()
        };

        writeln!(f, "{} {}\n", self.name, self.full_version())?;

        let sections: [(&str, Vec<(&str, &str)>); 2] = [
            (
                "Build Information",
                vec![
                    ("Version", self.version),
                    ("Git Hash", hash.as_str()),
                    ("Git Branch", self.git.branch),
                    ("Built", self.built_at),
                    ("Profile", self.profile),
                ],
            ),
            (
                "Toolchain",
                vec![("Target", self.target), ("Host", self.host), ("Rustc", self.rustc)],
            ),
        ];

        for (index, (title, rows)) in sections.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{}:", title)?;
            for (label, value) in rows {
                writeln!(f, "  {:<12}{}", format!("{}:", label), value)?;
            }
        }
        Ok(())
    }
}

pub fn build_info() -> BuildInfo {
    BUILD
}

pub fn print_version() {
    print!("{}", BUILD);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_matches_package() {
        let info = build_info();
        assert_eq!(info.name, "swisscv");
        assert!(!info.version.is_empty());
    }

    #[test]
    fn test_full_version_joins_version_and_hash() {
        let info = build_info();
        let full = info.full_version();
        assert!(full.starts_with(&format!("{}-{}", info.version, info.git.hash)));
        assert_eq!(full.ends_with("-dirty"), info.git.is_dirty());
    }

    #[test]
    fn test_report_lists_labelled_rows() {
        let report = build_info().to_string();
        assert!(report.contains("Build Information:"));
        assert!(report.contains("  Version:"));
        assert!(report.contains("  Git Hash:"));
        assert!(report.contains("  Target:"));
        assert!(report.contains("Toolchain:"));
    }
}
