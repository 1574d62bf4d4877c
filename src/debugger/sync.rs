//! 断点同步：把过滤后的合并断点集合整体推送给执行引擎

use engine_api::{BreakpointEngine, InteropBreakpoint};
use rustc_hash::FxHashSet;
use tracing::debug;

use super::breakpoints::{BreakpointRecord, CpuContext};

/// 合并并编码：用户断点在前，断言断点在后，只保留激活上下文中的断点
pub fn build_breakpoints(
    user: &[BreakpointRecord],
    asserts: &[BreakpointRecord],
    active_contexts: &FxHashSet<CpuContext>,
) -> Vec<InteropBreakpoint> {
    user.iter()
        .chain(asserts.iter())
        .filter(|bp| active_contexts.contains(&bp.cpu_context))
        .map(BreakpointRecord::to_interop)
        .collect()
}

/// 执行引擎同步桥
pub struct SyncBridge {
    engine: Box<dyn BreakpointEngine>,
    pushes: u64,
}

impl SyncBridge {
    pub fn new(engine: Box<dyn BreakpointEngine>) -> Self {
        Self { engine, pushes: 0 }
    }

    /// 重建完整断点数组并一次性推送，返回推送条数
    pub fn sync(
        &mut self,
        user: &[BreakpointRecord],
        asserts: &[BreakpointRecord],
        active_contexts: &FxHashSet<CpuContext>,
    ) -> usize {
        let breakpoints = build_breakpoints(user, asserts, active_contexts);
        // 断点数量受界面操作限制，不会超过 u32
        let count = u32::try_from(breakpoints.len()).unwrap_or(u32::MAX);
        self.engine.set_breakpoints(&breakpoints, count);
        self.pushes += 1;
        debug!(
            engine = self.engine.name(),
            count,
            user = user.len(),
            asserts = asserts.len(),
            "断点已同步到执行引擎"
        );
        breakpoints.len()
    }

    /// 累计推送次数
    pub fn pushes(&self) -> u64 {
        self.pushes
    }
}
