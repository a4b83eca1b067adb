use anyhow::Result;
use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub git_hash: &'static str,
    pub build_date: &'static str,
}

impl VersionInfo {
    pub fn current() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            git_hash: env!("GIT_HASH"),
            build_date: env!("BUILD_DATE"),
        }
    }
}

pub fn cmd_version() -> Result<()> {
    let info = VersionInfo::current();
    println!("{} {}", info.name, info.version);
    println!("commit: {}", info.git_hash);
    println!("built:  {}", info.build_date);
    Ok(())
}
