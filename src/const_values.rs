use anyhow::{self, Context};
use serde::Deserialize;
use std::path::Path;

use crate::debugger::CpuContext;

/// 默认的最近变更记录容量
pub const EVENT_LIST_SIZE: usize = 64;

#[derive(Deserialize, Debug, Clone)]
pub struct DebugConfig {
    #[serde(default = "default_event_list_size")]
    pub event_list_size: usize,
}

fn default_event_list_size() -> usize {
    EVENT_LIST_SIZE
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            event_list_size: EVENT_LIST_SIZE,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct SessionConfig {
    /// 会话开始时激活的处理器上下文
    #[serde(default)]
    pub active_contexts: Vec<CpuContext>,
}

/// 调试器配置（来自 profile/config.toml）
#[derive(Deserialize, Debug, Clone, Default)]
pub struct DebuggerConfig {
    #[serde(default)]
    pub debug: DebugConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl DebuggerConfig {
    pub fn new(path: impl AsRef<Path>) -> anyhow::Result<DebuggerConfig> {
        let toml_str = std::fs::read_to_string(&path)
            .with_context(|| format!("无法读取配置文件: {:?}", &path.as_ref().as_os_str()))?;
        Self::parse(&toml_str)
            .with_context(|| format!("无法解析配置文件: {:?}", &path.as_ref().as_os_str()))
    }

    pub fn parse(toml_str: &str) -> anyhow::Result<DebuggerConfig> {
        let config: DebuggerConfig = toml::from_str(toml_str)?;
        anyhow::Ok(config)
    }
}
