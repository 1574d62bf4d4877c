//! 断点定义

use std::fmt;

use clap::ValueEnum;
use engine_api::{
    BREAK_ON_EXEC, BREAK_ON_READ, BREAK_ON_WRITE, InteropBreakpoint, encode_condition,
    is_truncated,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// 处理器上下文（断点作用于哪一个被模拟的CPU核心）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[repr(u32)]
pub enum CpuContext {
    Cpu = 0,
    Spc = 1,
    NecDsp = 2,
    Sa1 = 3,
    Gsu = 4,
    Cx4 = 5,
    Gameboy = 6,
}

impl CpuContext {
    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

/// 内存空间类型（地址按哪一块存储解释）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[repr(u32)]
pub enum MemoryKind {
    CpuMemory = 0,
    SpcMemory,
    Sa1Memory,
    NecDspMemory,
    GsuMemory,
    Cx4Memory,
    GameboyMemory,
    PrgRom,
    WorkRam,
    SaveRam,
    VideoRam,
    SpriteRam,
    CgRam,
    SpcRam,
    SpcRom,
    DspProgramRom,
    DspDataRom,
    DspDataRam,
    Sa1InternalRam,
    GsuWorkRam,
    Cx4DataRam,
    GbPrgRom,
    GbWorkRam,
    GbCartRam,
    GbHighRam,
    GbBootRom,
    GbVideoRam,
    GbSpriteRam,
    Register,
}

impl MemoryKind {
    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

/// 触发条件：读 / 写 / 执行，三者互相独立
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerFlags {
    pub read: bool,
    pub write: bool,
    pub exec: bool,
}

impl TriggerFlags {
    pub const ALL: TriggerFlags = TriggerFlags {
        read: true,
        write: true,
        exec: true,
    };

    pub const EXEC: TriggerFlags = TriggerFlags {
        read: false,
        write: false,
        exec: true,
    };

    /// 引擎侧位标志
    pub fn bits(self) -> u32 {
        let mut bits = 0;
        if self.exec {
            bits |= BREAK_ON_EXEC;
        }
        if self.read {
            bits |= BREAK_ON_READ;
        }
        if self.write {
            bits |= BREAK_ON_WRITE;
        }
        bits
    }
}

impl fmt::Display for TriggerFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |set: bool, c: char| if set { c } else { '-' };
        write!(
            f,
            "{}{}{}",
            flag(self.read, 'R'),
            flag(self.write, 'W'),
            flag(self.exec, 'X')
        )
    }
}

/// 引擎侧地址为有符号 32 位，记录中的地址不得超过该值
pub const MAX_ADDRESS: u32 = i32::MAX as u32;

/// 地址错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("地址区间非法: {start:#x} > {end:#x}")]
    InvertedRange { start: u32, end: u32 },
    #[error("地址 {address:#x} 超出引擎地址范围")]
    Overflow { address: u32 },
}

/// 地址模式：单地址或闭区间
///
/// 只能通过 [`AddressMode::single`] / [`AddressMode::new`] 构造：
/// 起止相同即为单地址，起点不大于终点，且不超过 [`MAX_ADDRESS`]。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAddress", into = "RawAddress")]
pub struct AddressMode {
    start: u32,
    end: u32,
}

/// 会话文件中的地址写法：`address = 0x8000` 或 `address = { start = .., end = .. }`
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawAddress {
    Single(u32),
    Range { start: u32, end: u32 },
}

impl TryFrom<RawAddress> for AddressMode {
    type Error = AddressError;

    fn try_from(raw: RawAddress) -> Result<Self, Self::Error> {
        match raw {
            RawAddress::Single(address) => AddressMode::single(address),
            RawAddress::Range { start, end } => AddressMode::new(start, end),
        }
    }
}

impl From<AddressMode> for RawAddress {
    fn from(mode: AddressMode) -> Self {
        if mode.is_range() {
            RawAddress::Range {
                start: mode.start,
                end: mode.end,
            }
        } else {
            RawAddress::Single(mode.start)
        }
    }
}

impl AddressMode {
    pub fn single(address: u32) -> Result<Self, AddressError> {
        Self::new(address, address)
    }

    /// 按起止地址构造，起止相同时视为单地址
    pub fn new(start: u32, end: u32) -> Result<Self, AddressError> {
        if start > end {
            return Err(AddressError::InvertedRange { start, end });
        }
        if end > MAX_ADDRESS {
            return Err(AddressError::Overflow { address: end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn is_range(&self) -> bool {
        self.start != self.end
    }

    /// 引擎侧的起止地址
    pub fn wire_bounds(&self) -> (i32, i32) {
        // 构造时已限定不超过 MAX_ADDRESS
        (self.start as i32, self.end as i32)
    }
}

impl fmt::Display for AddressMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_range() {
            write!(f, "${:04X}-${:04X}", self.start, self.end)
        } else {
            write!(f, "${:04X}", self.start)
        }
    }
}

/// 调试界面上的一个地址位置；地址为负表示无效位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressInfo {
    pub address: i32,
    pub memory_kind: MemoryKind,
}

impl AddressInfo {
    pub fn new(address: i32, memory_kind: MemoryKind) -> Self {
        Self {
            address,
            memory_kind,
        }
    }

    /// 有效地址
    pub fn valid_address(&self) -> Option<u32> {
        u32::try_from(self.address).ok()
    }
}

fn default_true() -> bool {
    true
}

/// 断点信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakpointRecord {
    pub cpu_context: CpuContext,
    pub memory_kind: MemoryKind,
    #[serde(default)]
    pub trigger: TriggerFlags,
    pub address: AddressMode,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub mark_event: bool,
    /// 条件表达式，空字符串表示无条件
    #[serde(default)]
    pub condition: String,
}

impl BreakpointRecord {
    /// 创建一个已启用、无触发条件的断点
    pub fn new(cpu_context: CpuContext, memory_kind: MemoryKind, address: AddressMode) -> Self {
        Self {
            cpu_context,
            memory_kind,
            trigger: TriggerFlags::default(),
            address,
            enabled: true,
            mark_event: false,
            condition: String::new(),
        }
    }

    pub fn with_trigger(mut self, trigger: TriggerFlags) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = condition.into();
        self
    }

    /// 单地址精确匹配：内存类型、处理器上下文一致且地址相等
    ///
    /// 区间断点不参与精确匹配，与触发条件无关。
    pub fn matches(&self, address: u32, memory_kind: MemoryKind, cpu_context: CpuContext) -> bool {
        self.memory_kind == memory_kind
            && self.cpu_context == cpu_context
            && !self.address.is_range()
            && self.address.start() == address
    }

    /// 转换为引擎侧记录
    pub fn to_interop(&self) -> InteropBreakpoint {
        if is_truncated(&self.condition) {
            debug!(
                len = self.condition.len(),
                address = %self.address,
                "条件表达式过长，已截断"
            );
        }
        let (start_address, end_address) = self.address.wire_bounds();
        InteropBreakpoint {
            cpu_context: self.cpu_context.as_u32(),
            memory_kind: self.memory_kind.as_u32(),
            trigger_flags: self.trigger.bits(),
            start_address,
            end_address,
            enabled: self.enabled,
            mark_event: self.mark_event,
            condition: encode_condition(&self.condition),
        }
    }
}

impl fmt::Display for BreakpointRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:?}] {:?} {} {}",
            self.cpu_context, self.memory_kind, self.address, self.trigger
        )?;
        if !self.enabled {
            write!(f, " (disabled)")?;
        }
        if !self.condition.is_empty() {
            write!(f, " if {}", self.condition)?;
        }
        Ok(())
    }
}
