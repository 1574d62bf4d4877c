//! 断点查找
//!
//! 两种查找都按列表顺序扫描，返回第一个命中的下标。列表中靠后的重复断点
//! 因此永远不会被查到，但插入时并不拒绝重复。

use super::breakpoints::{BreakpointRecord, CpuContext, MemoryKind};

/// 单地址精确查找
pub fn find_exact(
    breakpoints: &[BreakpointRecord],
    address: u32,
    memory_kind: MemoryKind,
    cpu_context: CpuContext,
) -> Option<usize> {
    breakpoints
        .iter()
        .position(|bp| bp.matches(address, memory_kind, cpu_context))
}

/// 按起止地址查找（用于界面高亮，不是命中检测）
///
/// `start == end` 时只匹配单地址断点；否则只匹配起止地址完全相同的区间断点，
/// 不考虑区间重叠。不区分处理器上下文。
pub fn find_range(
    breakpoints: &[BreakpointRecord],
    start: u32,
    end: u32,
    memory_kind: MemoryKind,
) -> Option<usize> {
    breakpoints.iter().position(|bp| {
        bp.memory_kind == memory_kind && bp.address.start() == start && bp.address.end() == end
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debugger::breakpoints::AddressMode;

    fn single(address: u32, memory_kind: MemoryKind, cpu_context: CpuContext) -> BreakpointRecord {
        BreakpointRecord::new(cpu_context, memory_kind, AddressMode::single(address).unwrap())
    }

    fn range(start: u32, end: u32, memory_kind: MemoryKind) -> BreakpointRecord {
        BreakpointRecord::new(CpuContext::Cpu, memory_kind, AddressMode::new(start, end).unwrap())
    }

    #[test]
    fn test_exact_first_match_wins() {
        let mut dup = single(0x8000, MemoryKind::WorkRam, CpuContext::Cpu);
        dup.condition = "X == 1".to_string();
        let list = vec![
            single(0x7FFF, MemoryKind::WorkRam, CpuContext::Cpu),
            single(0x8000, MemoryKind::WorkRam, CpuContext::Cpu),
            dup,
        ];
        assert_eq!(find_exact(&list, 0x8000, MemoryKind::WorkRam, CpuContext::Cpu), Some(1));
        assert_eq!(find_exact(&list, 0x8000, MemoryKind::WorkRam, CpuContext::Spc), None);
        assert_eq!(find_exact(&list, 0x8000, MemoryKind::SaveRam, CpuContext::Cpu), None);
        assert_eq!(find_exact(&[], 0x8000, MemoryKind::WorkRam, CpuContext::Cpu), None);
    }

    #[test]
    fn test_single_and_range_lookup_disjoint() {
        let list = vec![single(0x8000, MemoryKind::PrgRom, CpuContext::Cpu)];
        assert_eq!(find_range(&list, 0x8000, 0x8000, MemoryKind::PrgRom), Some(0));
        assert_eq!(find_range(&list, 0x8000, 0x8010, MemoryKind::PrgRom), None);

        let list = vec![range(0x8000, 0x8010, MemoryKind::PrgRom)];
        assert_eq!(find_range(&list, 0x8000, 0x8010, MemoryKind::PrgRom), Some(0));
        assert_eq!(find_range(&list, 0x8000, 0x8000, MemoryKind::PrgRom), None);
    }

    #[test]
    fn test_range_requires_exact_bounds() {
        let list = vec![
            range(0x8000, 0x8010, MemoryKind::WorkRam),
            range(0x8000, 0x8020, MemoryKind::WorkRam),
        ];
        assert_eq!(find_range(&list, 0x8000, 0x8020, MemoryKind::WorkRam), Some(1));
        assert_eq!(find_range(&list, 0x8004, 0x8008, MemoryKind::WorkRam), None);
        assert_eq!(find_range(&list, 0x8000, 0x8010, MemoryKind::SaveRam), None);
        assert_eq!(find_range(&list, 0x8010, 0x8000, MemoryKind::WorkRam), None);
    }

    #[test]
    fn test_range_lookup_ignores_context() {
        let list = vec![single(0x20, MemoryKind::WorkRam, CpuContext::Sa1)];
        assert_eq!(find_range(&list, 0x20, 0x20, MemoryKind::WorkRam), Some(0));
    }
}
