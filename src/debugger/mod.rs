//! 调试会话：断点管理与执行引擎同步
//!
//! [`Debugger`] 由调试会话创建并持有，以引用形式交给界面视图和引擎回调。
//! 所有修改操作都遵循同一流程：发布新快照 → 广播变更 → 整体同步到引擎。
//! 查找与编号解析只读取快照，可以在引擎回调线程中与修改并发执行。

pub mod asserts;
pub mod breakpoints;
pub mod matcher;
pub mod notify;
pub mod resolver;
pub mod store;
pub mod sync;

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use engine_api::BreakpointEngine;
use tracing::{debug, info};

pub use asserts::AssertList;
pub use breakpoints::{
    AddressError, AddressInfo, AddressMode, BreakpointRecord, CpuContext, MAX_ADDRESS, MemoryKind,
    TriggerFlags,
};
pub use notify::{BreakpointEvent, BreakpointObserver, ChangeKind};
pub use resolver::{BreakpointId, BreakpointKind, IdResolver, ResolvedBreakpoint};
pub use store::{BreakpointStore, Snapshot};

use crate::const_values::DebuggerConfig;
use notify::ChangeNotifier;
use sync::SyncBridge;

/// 编辑结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Accepted(BreakpointRecord),
    Rejected,
}

/// 断点编辑协作方（通常是编辑对话框）
pub trait BreakpointEditor {
    /// 对新建或已有断点提出修改；拒绝时不产生任何效果
    fn propose(&mut self, record: BreakpointRecord) -> EditOutcome;
}

impl<F> BreakpointEditor for F
where
    F: FnMut(BreakpointRecord) -> EditOutcome,
{
    fn propose(&mut self, record: BreakpointRecord) -> EditOutcome {
        self(record)
    }
}

pub struct Debugger {
    store: BreakpointStore,
    asserts: RwLock<Option<AssertList>>,
    notifier: ChangeNotifier,
    bridge: Mutex<SyncBridge>,
}

impl Debugger {
    /// 创建一个新的调试会话，`journal_size` 为最近变更记录容量
    pub fn new(engine: Box<dyn BreakpointEngine>, journal_size: usize) -> Self {
        Self {
            store: BreakpointStore::new(),
            asserts: RwLock::new(None),
            notifier: ChangeNotifier::new(journal_size),
            bridge: Mutex::new(SyncBridge::new(engine)),
        }
    }

    /// 按配置创建调试会话并激活配置中的处理器上下文
    pub fn with_config(engine: Box<dyn BreakpointEngine>, config: &DebuggerConfig) -> Self {
        let debugger = Self::new(engine, config.debug.event_list_size);
        for &ctx in &config.session.active_contexts {
            debugger.activate_context(ctx);
        }
        debugger
    }

    /// 设置断言断点列表；None 视为空列表
    ///
    /// 不会触发同步，外部维护方发布新列表后应调用 [`Debugger::refresh`]。
    pub fn set_asserts(&self, asserts: Option<AssertList>) {
        *self.asserts.write().unwrap_or_else(PoisonError::into_inner) = asserts;
    }

    fn assert_snapshot(&self) -> Arc<Vec<BreakpointRecord>> {
        self.asserts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(AssertList::snapshot)
            .unwrap_or_default()
    }

    /// 用户断点列表副本
    pub fn breakpoints(&self) -> Vec<BreakpointRecord> {
        self.store.snapshot().breakpoints.clone()
    }

    /// 已激活的处理器上下文
    pub fn active_contexts(&self) -> Vec<CpuContext> {
        let mut contexts: Vec<_> = self.store.snapshot().active_contexts.iter().copied().collect();
        contexts.sort_by_key(|ctx| ctx.as_u32());
        contexts
    }

    /// 添加断点
    pub fn add(&self, record: BreakpointRecord) {
        debug!(breakpoint = %record, "添加断点");
        self.store.push(record.clone());
        self.changed(ChangeKind::Added, Some(record));
    }

    /// 移除断点，断点不存在时不报错
    pub fn remove(&self, record: &BreakpointRecord) -> bool {
        let removed = self.store.remove(record);
        debug!(breakpoint = %record, removed, "移除断点");
        self.changed(ChangeKind::Removed, Some(record.clone()));
        removed
    }

    /// 通过编辑协作方新建或修改断点，返回修改是否被接受
    ///
    /// 接受后：原断点存在则原位替换，否则追加。
    pub fn edit(&self, record: BreakpointRecord, editor: &mut dyn BreakpointEditor) -> bool {
        match editor.propose(record.clone()) {
            EditOutcome::Accepted(updated) => {
                let in_place = self.store.upsert(&record, updated.clone());
                debug!(breakpoint = %updated, in_place, "编辑断点");
                self.changed(ChangeKind::Edited, Some(updated));
                true
            }
            EditOutcome::Rejected => false,
        }
    }

    /// 整体替换用户断点（加载会话时使用）
    pub fn replace_all(&self, records: Vec<BreakpointRecord>) {
        info!(count = records.len(), "替换全部断点");
        self.store.replace_all(records);
        self.changed(ChangeKind::Replaced, None);
    }

    /// 激活处理器上下文；只同步，不广播变更
    pub fn activate_context(&self, cpu_context: CpuContext) {
        self.store.activate(cpu_context);
        debug!(?cpu_context, "激活处理器上下文");
        self.sync();
    }

    /// 停用处理器上下文；只同步，不广播变更
    pub fn deactivate_context(&self, cpu_context: CpuContext) {
        self.store.deactivate(cpu_context);
        debug!(?cpu_context, "停用处理器上下文");
        self.sync();
    }

    /// 翻转精确匹配断点的启用状态，返回是否找到匹配
    pub fn enable_disable(&self, info: AddressInfo, cpu_context: CpuContext) -> bool {
        let Some(address) = info.valid_address() else {
            return false;
        };
        match self.store.toggle_enabled(address, info.memory_kind, cpu_context) {
            Some(updated) => {
                self.changed(ChangeKind::Toggled, Some(updated));
                true
            }
            None => false,
        }
    }

    /// 在指定位置切换断点：已有则删除，没有则按默认标志创建
    ///
    /// 程序 ROM 上默认只在执行时中断，其它内存读写执行都中断。
    pub fn toggle_breakpoint(&self, info: AddressInfo, cpu_context: CpuContext) {
        let Some(address) = info
            .valid_address()
            .and_then(|address| AddressMode::single(address).ok())
        else {
            return;
        };

        match self.find_exact(info, cpu_context) {
            Some(existing) => {
                self.remove(&existing);
            }
            None => {
                let trigger = if info.memory_kind == MemoryKind::PrgRom {
                    TriggerFlags::EXEC
                } else {
                    TriggerFlags::ALL
                };
                let record = BreakpointRecord::new(cpu_context, info.memory_kind, address)
                    .with_trigger(trigger);
                self.add(record);
            }
        }
    }

    /// 无修改地广播一次变更并重新同步
    pub fn refresh(&self, record: Option<BreakpointRecord>) {
        self.changed(ChangeKind::Refreshed, record);
    }

    /// 单地址精确查找
    pub fn find_exact(&self, info: AddressInfo, cpu_context: CpuContext) -> Option<BreakpointRecord> {
        let address = info.valid_address()?;
        let snap = self.store.snapshot();
        matcher::find_exact(&snap.breakpoints, address, info.memory_kind, cpu_context)
            .map(|index| snap.breakpoints[index].clone())
    }

    /// 按起止地址查找
    pub fn find_range(&self, start: u32, end: u32, memory_kind: MemoryKind) -> Option<BreakpointRecord> {
        let snap = self.store.snapshot();
        matcher::find_range(&snap.breakpoints, start, end, memory_kind)
            .map(|index| snap.breakpoints[index].clone())
    }

    /// 把引擎上报的断点编号解析为断点
    pub fn resolve(&self, engine_id: i32) -> Option<ResolvedBreakpoint> {
        let snap = self.store.snapshot();
        let asserts = self.assert_snapshot();
        IdResolver::new(&snap.breakpoints, &asserts).resolve(engine_id)
    }

    /// 带标签编号对应的引擎编号
    pub fn engine_id(&self, id: BreakpointId) -> Option<i32> {
        let snap = self.store.snapshot();
        let asserts = self.assert_snapshot();
        IdResolver::new(&snap.breakpoints, &asserts).engine_id(id)
    }

    pub fn add_observer(&self, observer: Box<dyn BreakpointObserver>) {
        self.notifier.add_observer(observer);
    }

    pub fn subscribe(&self) -> crossbeam_channel::Receiver<BreakpointEvent> {
        self.notifier.subscribe()
    }

    /// 取出最近的变更记录
    pub fn take_changes(&self) -> Vec<BreakpointEvent> {
        self.notifier.take_changes()
    }

    /// 累计同步次数
    pub fn sync_count(&self) -> u64 {
        self.bridge
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pushes()
    }

    fn changed(&self, kind: ChangeKind, record: Option<BreakpointRecord>) {
        self.notifier.notify(BreakpointEvent { kind, record });
        self.sync();
    }

    /// 两个列表在本轮同步开始时各读取一次
    fn sync(&self) -> usize {
        let mut bridge = self.bridge.lock().unwrap_or_else(PoisonError::into_inner);
        let snap = self.store.snapshot();
        let asserts = self.assert_snapshot();
        bridge.sync(&snap.breakpoints, &asserts, &snap.active_contexts)
    }
}
