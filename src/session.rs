//! 断点会话文件：批量加载与保存用户断点

use anyhow::{self, Context};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::debugger::BreakpointRecord;

/// 会话文件；地址在解析时校验，非法区间或越界地址使整个文件加载失败
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
pub struct SessionFile {
    #[serde(default)]
    pub breakpoints: Vec<BreakpointRecord>,
}

impl SessionFile {
    pub fn new(path: impl AsRef<Path>) -> anyhow::Result<SessionFile> {
        let toml_str = std::fs::read_to_string(&path)
            .with_context(|| format!("无法读取会话文件: {:?}", &path.as_ref().as_os_str()))?;
        let session: SessionFile = toml::from_str(&toml_str)
            .with_context(|| format!("无法解析会话文件: {:?}", &path.as_ref().as_os_str()))?;
        anyhow::Ok(session)
    }

    pub fn from_breakpoints(breakpoints: Vec<BreakpointRecord>) -> Self {
        Self { breakpoints }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let toml_str = toml::to_string(self).context("无法序列化会话")?;
        std::fs::write(&path, toml_str)
            .with_context(|| format!("无法写入会话文件: {:?}", &path.as_ref().as_os_str()))?;
        Ok(())
    }
}
