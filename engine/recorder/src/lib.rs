//! 记录型执行引擎：保存最近一次同步下来的断点集合
//!
//! 用于无真实引擎时的命令行运行和测试。克隆出的句柄共享同一份状态。

use engine_api::{BreakpointEngine, InteropBreakpoint};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Default)]
struct Inner {
    breakpoints: Vec<InteropBreakpoint>,
    pushes: u64,
}

/// 记录型引擎
#[derive(Debug, Clone)]
pub struct Recorder {
    name: String,
    inner: Arc<Mutex<Inner>>,
}

impl Recorder {
    /// 创建新的记录型引擎
    pub fn new(name: String) -> Self {
        Self {
            name,
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    /// 最近一次同步的断点集合
    pub fn breakpoints(&self) -> Vec<InteropBreakpoint> {
        self.lock(|inner| inner.breakpoints.clone())
    }

    /// 累计同步次数
    pub fn pushes(&self) -> u64 {
        self.lock(|inner| inner.pushes)
    }

    fn lock<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut inner)
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new("recorder".to_string())
    }
}

impl BreakpointEngine for Recorder {
    fn set_breakpoints(&mut self, records: &[InteropBreakpoint], count: u32) {
        // 以 count 为准，与真实引擎的读取方式一致
        let count = (count as usize).min(records.len());
        self.lock(|inner| {
            inner.breakpoints = records[..count].to_vec();
            inner.pushes += 1;
        });
    }

    fn name(&self) -> &str {
        &self.name
    }
}
