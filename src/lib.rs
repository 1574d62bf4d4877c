//! 多CPU模拟器调试器的断点管理与执行引擎同步
pub mod const_values;
pub mod debugger;
pub mod session;
pub mod utils;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use recorder::Recorder;
use tracing::{debug, info, warn};

use crate::const_values::DebuggerConfig;
use crate::debugger::{AddressInfo, BreakpointId, CpuContext, Debugger, MemoryKind};
use crate::session::SessionFile;

/// 断点会话工具
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// 配置文件地址
    #[arg(short, long, default_value = "profile/config.toml")]
    pub config: String,

    /// 断点会话文件
    #[arg(short, long)]
    pub session: Option<String>,

    /// 额外激活的处理器上下文
    #[arg(short = 'x', long = "context", value_enum)]
    pub contexts: Vec<CpuContext>,

    /// 在该地址切换断点（十六进制可带 0x 或 $ 前缀）
    #[arg(short, long, value_parser = parse_address)]
    pub toggle: Option<i32>,

    /// 切换断点使用的内存类型
    #[arg(short, long, value_enum, default_value = "prg-rom")]
    pub kind: MemoryKind,

    /// 解析引擎上报的断点编号
    #[arg(short, long, allow_negative_numbers = true)]
    pub resolve: Vec<i32>,

    /// 输出推送给引擎的线格式记录
    #[arg(long)]
    pub dump: bool,

    /// 把最终的断点列表保存到该文件
    #[arg(long)]
    pub save: Option<String>,
}

/// 解析地址：`0x8000`、`$8000` 为十六进制，其余按十进制
pub fn parse_address(s: &str) -> Result<i32, String> {
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix('$')) {
        i32::from_str_radix(hex, 16)
    } else {
        s.parse::<i32>()
    };
    parsed.map_err(|e| format!("无效地址 '{}': {}", s, e))
}

fn config_path(config: &str) -> PathBuf {
    let path = PathBuf::from(config);
    if path.is_absolute() {
        path
    } else {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(path)
    }
}

pub fn run_session(args: Args) -> Result<()> {
    let config = DebuggerConfig::new(config_path(&args.config))?;
    info!(
        event_list_size = config.debug.event_list_size,
        contexts = ?config.session.active_contexts,
        "加载调试器配置"
    );

    let engine = Recorder::new("recorder".to_string());
    let debugger = Debugger::with_config(Box::new(engine.clone()), &config);
    for &ctx in &args.contexts {
        debugger.activate_context(ctx);
    }

    if let Some(path) = &args.session {
        info!(path = %path, "加载断点会话");
        let session = SessionFile::new(path)?;
        debugger.replace_all(session.breakpoints);
    }

    if let Some(address) = args.toggle {
        let ctx = debugger
            .active_contexts()
            .first()
            .copied()
            .unwrap_or(CpuContext::Cpu);
        info!(address = %format!("{:#x}", address), ?ctx, kind = ?args.kind, "切换断点");
        debugger.toggle_breakpoint(AddressInfo::new(address, args.kind), ctx);
    }

    for (index, bp) in debugger.breakpoints().iter().enumerate() {
        let id = debugger.engine_id(BreakpointId::user(index));
        info!(?id, breakpoint = %bp, "用户断点");
    }

    let pushed = engine.breakpoints();
    info!(
        count = pushed.len(),
        syncs = debugger.sync_count(),
        engine_pushes = engine.pushes(),
        "引擎断点集合"
    );
    if args.dump {
        for (index, bp) in pushed.iter().enumerate() {
            let bytes = bp.to_bytes();
            info!(
                index,
                header = %hex::encode(&bytes[..22]),
                condition = %bp.condition_text(),
                "线格式记录"
            );
        }
    }

    for &id in &args.resolve {
        match debugger.resolve(id) {
            Some(hit) => info!(
                id,
                kind = ?hit.id.kind,
                index = hit.id.index,
                breakpoint = %hit.record,
                "解析断点编号"
            ),
            None => warn!(id, "断点编号无对应断点"),
        }
    }

    if let Some(path) = &args.save {
        SessionFile::from_breakpoints(debugger.breakpoints()).save(path)?;
        info!(path = %path, "断点会话已保存");
    }

    for change in debugger.take_changes() {
        debug!(kind = ?change.kind, record = ?change.record, "变更记录");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("0x8000"), Ok(0x8000));
        assert_eq!(parse_address("$7E00"), Ok(0x7E00));
        assert_eq!(parse_address("42"), Ok(42));
        assert_eq!(parse_address("-1"), Ok(-1));
        assert!(parse_address("0xZZ").is_err());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "bpsync", "-x", "sa1", "--context", "gsu", "-t", "$8000", "-k", "work-ram", "-r", "0",
            "-r", "-1",
        ])
        .unwrap();
        assert_eq!(args.contexts, vec![CpuContext::Sa1, CpuContext::Gsu]);
        assert_eq!(args.toggle, Some(0x8000));
        assert_eq!(args.kind, MemoryKind::WorkRam);
        assert_eq!(args.resolve, vec![0, -1]);
        assert_eq!(args.config, "profile/config.toml");
    }

    #[test]
    fn test_run_session_with_profile() {
        let save = std::env::temp_dir().join(format!("bpsync-run-{}.toml", std::process::id()));
        let args = Args {
            config: "profile/config.toml".to_string(),
            session: Some(format!("{}/profile/session.toml", env!("CARGO_MANIFEST_DIR"))),
            contexts: vec![CpuContext::Sa1],
            toggle: Some(0x8000),
            kind: MemoryKind::PrgRom,
            resolve: vec![0, 3, 99],
            dump: true,
            save: Some(save.to_string_lossy().into_owned()),
        };
        run_session(args).unwrap();

        // 第一个激活上下文上的 0x8000 断点被切换移除
        let saved = SessionFile::new(&save).unwrap().breakpoints;
        std::fs::remove_file(&save).unwrap();
        assert_eq!(saved.len(), 3);
        assert!(saved.iter().all(|bp| bp.memory_kind != MemoryKind::PrgRom));
    }
}
