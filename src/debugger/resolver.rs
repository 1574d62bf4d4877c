//! 引擎断点编号解析
//!
//! 引擎看到的编号空间是 `[0, U)` 用户断点，紧接 `[U, U + A)` 断言断点。
//! 内部一律使用带标签的 [`BreakpointId`]，只在引擎边界与整数编号互转。

use super::breakpoints::BreakpointRecord;

/// 断点来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BreakpointKind {
    User,
    Assert,
}

/// 带标签的断点编号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BreakpointId {
    pub kind: BreakpointKind,
    pub index: usize,
}

impl BreakpointId {
    pub fn user(index: usize) -> Self {
        Self {
            kind: BreakpointKind::User,
            index,
        }
    }

    pub fn assert(index: usize) -> Self {
        Self {
            kind: BreakpointKind::Assert,
            index,
        }
    }

    /// 由引擎编号换算
    pub fn from_engine_id(id: i32, user_count: usize, assert_count: usize) -> Option<Self> {
        let id = usize::try_from(id).ok()?;
        if id < user_count {
            Some(Self::user(id))
        } else if id - user_count < assert_count {
            Some(Self::assert(id - user_count))
        } else {
            None
        }
    }

    /// 换算为引擎编号
    pub fn to_engine_id(self, user_count: usize) -> Option<i32> {
        let flat = match self.kind {
            BreakpointKind::User => self.index,
            BreakpointKind::Assert => user_count.checked_add(self.index)?,
        };
        i32::try_from(flat).ok()
    }
}

/// 解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBreakpoint {
    pub id: BreakpointId,
    pub record: BreakpointRecord,
}

/// 在一组快照上解析编号
pub struct IdResolver<'a> {
    user: &'a [BreakpointRecord],
    asserts: &'a [BreakpointRecord],
}

impl<'a> IdResolver<'a> {
    pub fn new(user: &'a [BreakpointRecord], asserts: &'a [BreakpointRecord]) -> Self {
        Self { user, asserts }
    }

    pub fn get(&self, id: BreakpointId) -> Option<&'a BreakpointRecord> {
        match id.kind {
            BreakpointKind::User => self.user.get(id.index),
            BreakpointKind::Assert => self.asserts.get(id.index),
        }
    }

    pub fn resolve(&self, engine_id: i32) -> Option<ResolvedBreakpoint> {
        let id = BreakpointId::from_engine_id(engine_id, self.user.len(), self.asserts.len())?;
        self.get(id).map(|record| ResolvedBreakpoint {
            id,
            record: record.clone(),
        })
    }

    pub fn engine_id(&self, id: BreakpointId) -> Option<i32> {
        self.get(id)?;
        id.to_engine_id(self.user.len())
    }
}
