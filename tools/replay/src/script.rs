//! 回放脚本.

use serde::Deserialize;
use std::path::Path;

/// 单个查看器事件.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// 开启工具.
    Enable,
    /// 关闭工具.
    Disable,
    /// 切换工具.
    Toggle,
    /// 按下.
    Down { x: f64, y: f64 },
    /// 移动.
    Move { x: f64, y: f64 },
    /// 抬起.
    Up,
    /// 切换到第 `z` 层切片.
    Slice { z: i32 },
    /// 清空选区.
    Clear,
    /// 只计算体素, 不发请求.
    Voxels,
    /// 导出.
    Export,
    /// 提交分析.
    Analyze,
    /// 推进虚拟时钟.
    Wait { ms: u64 },
}

/// 事件序列.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Script {
    /// 按顺序回放的事件.
    pub events: Vec<Event>,
}

impl Script {
    /// 读取 JSON 脚本.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
        serde_json::from_str(&text).map_err(|e| format!("{}: {e}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::{Event, Script};

    #[test]
    fn test_parse() {
        let s: Script = serde_json::from_str(
            r#"{ "events": [
                { "event": "enable" },
                { "event": "down", "x": 1.5, "y": 2 },
                { "event": "slice", "z": 36 },
                { "event": "wait", "ms": 150 },
                { "event": "export" }
            ] }"#,
        )
        .unwrap();
        assert_eq!(
            s.events,
            vec![
                Event::Enable,
                Event::Down { x: 1.5, y: 2.0 },
                Event::Slice { z: 36 },
                Event::Wait { ms: 150 },
                Event::Export,
            ]
        );
    }
}
