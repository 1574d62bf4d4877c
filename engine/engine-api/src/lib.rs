//! 执行引擎断点接口定义
//!
//! 前端与执行引擎之间只交换一种数据：扁平的断点记录数组。
//! 每次同步都是整体替换，引擎没有增量更新入口。

/// 条件表达式缓冲区长度（字节）
pub const CONDITION_LEN: usize = 1000;

/// 单条线格式记录的字节长度（紧凑排列，不含对齐填充）
pub const RECORD_LEN: usize = 4 * 5 + 2 + CONDITION_LEN;

/// 触发标志位
pub const BREAK_ON_EXEC: u32 = 0x01;
pub const BREAK_ON_READ: u32 = 0x02;
pub const BREAK_ON_WRITE: u32 = 0x04;

/// 引擎侧断点记录
///
/// 字段顺序与引擎的二进制布局一致，不可调整。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct InteropBreakpoint {
    pub cpu_context: u32,
    pub memory_kind: u32,
    pub trigger_flags: u32,
    pub start_address: i32,
    pub end_address: i32,
    pub enabled: bool,
    pub mark_event: bool,
    pub condition: [u8; CONDITION_LEN],
}

impl Default for InteropBreakpoint {
    fn default() -> Self {
        Self {
            cpu_context: 0,
            memory_kind: 0,
            trigger_flags: 0,
            start_address: 0,
            end_address: 0,
            enabled: false,
            mark_event: false,
            condition: [0; CONDITION_LEN],
        }
    }
}

/// 将条件表达式编码为定长缓冲区
///
/// 超过 [`CONDITION_LEN`] 字节的部分被截断，不报错；剩余空间以 0 填充。
/// 截断按字节进行，可能切开一个多字节 UTF-8 字符。
pub fn encode_condition(text: &str) -> [u8; CONDITION_LEN] {
    let mut buf = [0u8; CONDITION_LEN];
    let bytes = text.as_bytes();
    let len = bytes.len().min(CONDITION_LEN);
    buf[..len].copy_from_slice(&bytes[..len]);
    buf
}

/// 判断条件表达式在编码时是否会被截断
pub fn is_truncated(text: &str) -> bool {
    text.len() > CONDITION_LEN
}

impl InteropBreakpoint {
    /// 条件表达式文本（到第一个 0 字节为止）
    pub fn condition_text(&self) -> String {
        let end = self
            .condition
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(CONDITION_LEN);
        String::from_utf8_lossy(&self.condition[..end]).into_owned()
    }

    /// 按小端序输出紧凑字节镜像
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(RECORD_LEN);
        out.extend_from_slice(&self.cpu_context.to_le_bytes());
        out.extend_from_slice(&self.memory_kind.to_le_bytes());
        out.extend_from_slice(&self.trigger_flags.to_le_bytes());
        out.extend_from_slice(&self.start_address.to_le_bytes());
        out.extend_from_slice(&self.end_address.to_le_bytes());
        out.push(self.enabled as u8);
        out.push(self.mark_event as u8);
        out.extend_from_slice(&self.condition);
        out
    }
}

/// 执行引擎的断点接收接口
/// 所有执行引擎（或其传输代理）都必须实现此 trait
pub trait BreakpointEngine: Send {
    /// 整体替换引擎当前持有的断点集合
    ///
    /// # 参数
    /// - records: 已按合并顺序排好的断点记录
    /// - count: 记录条数，等于 `records.len()`
    ///
    /// 调用方不关心引擎侧的处理结果，传输失败由实现方自行处理。
    fn set_breakpoints(&mut self, records: &[InteropBreakpoint], count: u32);

    /// 获取引擎名称（用于调试）
    fn name(&self) -> &str {
        "unknown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_exact_length_unchanged() {
        let text = "a".repeat(CONDITION_LEN);
        let buf = encode_condition(&text);
        assert_eq!(&buf[..], text.as_bytes());
        assert!(!is_truncated(&text));
    }

    #[test]
    fn test_condition_overflow_truncated() {
        let text = format!("{}b", "a".repeat(CONDITION_LEN));
        let buf = encode_condition(&text);
        assert_eq!(&buf[..], &text.as_bytes()[..CONDITION_LEN]);
        assert!(buf.iter().all(|&b| b == b'a'));
        assert!(is_truncated(&text));
    }

    #[test]
    fn test_condition_zero_filled_tail() {
        let buf = encode_condition("A == $10");
        assert_eq!(&buf[..8], b"A == $10");
        assert!(buf[8..].iter().all(|&b| b == 0));

        let record = InteropBreakpoint {
            condition: buf,
            ..Default::default()
        };
        assert_eq!(record.condition_text(), "A == $10");
    }

    #[test]
    fn test_byte_image_layout() {
        let record = InteropBreakpoint {
            cpu_context: 3,
            memory_kind: 7,
            trigger_flags: BREAK_ON_EXEC | BREAK_ON_WRITE,
            start_address: 0x8000,
            end_address: 0x8010,
            enabled: true,
            mark_event: false,
            condition: encode_condition("X > 2"),
        };
        let bytes = record.to_bytes();
        assert_eq!(bytes.len(), RECORD_LEN);
        assert_eq!(&bytes[0..4], &[3, 0, 0, 0]);
        assert_eq!(&bytes[8..12], &[5, 0, 0, 0]);
        assert_eq!(&bytes[12..16], &[0x00, 0x80, 0, 0]);
        assert_eq!(bytes[20], 1);
        assert_eq!(bytes[21], 0);
        assert_eq!(&bytes[22..27], b"X > 2");
        assert!(bytes[27..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_truncation_splits_multibyte_char() {
        // 'é' 为两字节 0xC3 0xA9，第 1000 字节正好落在它的第一个字节上
        let text = format!("{}é", "a".repeat(CONDITION_LEN - 1));
        assert!(is_truncated(&text));

        let buf = encode_condition(&text);
        assert_eq!(buf[CONDITION_LEN - 1], 0xC3);
        assert!(std::str::from_utf8(&buf).is_err());

        let record = InteropBreakpoint {
            condition: buf,
            ..Default::default()
        };
        let decoded = record.condition_text();
        assert_eq!(decoded, format!("{}\u{FFFD}", "a".repeat(CONDITION_LEN - 1)));
    }
}
