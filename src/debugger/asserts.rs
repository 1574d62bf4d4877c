//! 断言断点列表
//!
//! 由外部（静态分析）维护；本模块只读取快照。

use std::sync::{Arc, PoisonError, RwLock};

use super::breakpoints::BreakpointRecord;

/// 共享的断言断点列表句柄
///
/// 克隆出的句柄指向同一份列表。外部维护方通过 [`AssertList::publish`]
/// 整体发布新列表，读者拿到的始终是某一次完整发布的结果。
#[derive(Debug, Clone, Default)]
pub struct AssertList {
    inner: Arc<RwLock<Arc<Vec<BreakpointRecord>>>>,
}

impl AssertList {
    pub fn new(records: Vec<BreakpointRecord>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(records))),
        }
    }

    /// 发布新列表
    pub fn publish(&self, records: Vec<BreakpointRecord>) {
        let mut current = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *current = Arc::new(records);
    }

    /// 当前列表快照
    pub fn snapshot(&self) -> Arc<Vec<BreakpointRecord>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
