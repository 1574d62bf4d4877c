//! 用户断点存储
//!
//! 用户断点列表与激活的处理器上下文集合共同组成一个不可变快照。
//! 每次修改都基于当前快照构造新快照，再整体替换指针；读者只会看到
//! 修改前或修改后的完整快照。

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use rustc_hash::FxHashSet;

use super::breakpoints::{BreakpointRecord, CpuContext, MemoryKind};
use super::matcher;

/// 断点存储快照
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub breakpoints: Vec<BreakpointRecord>,
    pub active_contexts: FxHashSet<CpuContext>,
}

/// 断点存储
#[derive(Debug, Default)]
pub struct BreakpointStore {
    current: RwLock<Arc<Snapshot>>,
    /// 串行化“读取-修改-发布”
    writer: Mutex<()>,
}

impl BreakpointStore {
    /// 创建新的断点存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前快照
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 基于当前快照修改并发布，返回修改函数的结果
    fn update<R>(&self, f: impl FnOnce(&mut Snapshot) -> R) -> R {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = Snapshot::clone(&self.snapshot());
        let result = f(&mut next);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(next);
        result
    }

    /// 追加断点
    pub fn push(&self, record: BreakpointRecord) {
        self.update(|snap| snap.breakpoints.push(record));
    }

    /// 移除第一个与之相等的断点
    pub fn remove(&self, record: &BreakpointRecord) -> bool {
        self.update(|snap| {
            match snap.breakpoints.iter().position(|bp| bp == record) {
                Some(index) => {
                    snap.breakpoints.remove(index);
                    true
                }
                None => false,
            }
        })
    }

    /// 用 `updated` 原位替换 `original`；`original` 不存在时追加
    ///
    /// 返回是否为原位替换。
    pub fn upsert(&self, original: &BreakpointRecord, updated: BreakpointRecord) -> bool {
        self.update(|snap| {
            match snap.breakpoints.iter().position(|bp| bp == original) {
                Some(index) => {
                    snap.breakpoints[index] = updated;
                    true
                }
                None => {
                    snap.breakpoints.push(updated);
                    false
                }
            }
        })
    }

    /// 整体替换断点列表
    pub fn replace_all(&self, records: Vec<BreakpointRecord>) {
        self.update(|snap| snap.breakpoints = records);
    }

    /// 翻转精确匹配断点的启用状态，返回修改后的断点
    pub fn toggle_enabled(
        &self,
        address: u32,
        memory_kind: MemoryKind,
        cpu_context: CpuContext,
    ) -> Option<BreakpointRecord> {
        // 未命中时不发布新快照
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.snapshot();
        let index = matcher::find_exact(&current.breakpoints, address, memory_kind, cpu_context)?;

        let mut next = Snapshot::clone(&current);
        let bp = &mut next.breakpoints[index];
        bp.enabled = !bp.enabled;
        let updated = bp.clone();
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(next);
        Some(updated)
    }

    /// 激活处理器上下文，返回集合是否变化
    pub fn activate(&self, cpu_context: CpuContext) -> bool {
        self.update(|snap| snap.active_contexts.insert(cpu_context))
    }

    /// 停用处理器上下文，返回集合是否变化
    pub fn deactivate(&self, cpu_context: CpuContext) -> bool {
        self.update(|snap| snap.active_contexts.remove(&cpu_context))
    }
}
