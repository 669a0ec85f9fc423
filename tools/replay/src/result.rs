//! 回放结果.

use lasso_berry::readout::CoordinateReadout;
use std::io::{self, Write};

/// 单个事件之后值得报告的结果.
#[derive(Debug)]
pub enum Outcome {
    /// 新套索的序号及其顶点数.
    Lasso { index: usize, points: usize },
    /// 体素个数.
    Voxels(usize),
    /// 导出结果已保存.
    Saved { path: String, bytes: usize, shape: Option<(usize, usize, usize)> },
    /// 分析任务的进度页面.
    Progress(String),
    /// 坐标读数.
    Readout(CoordinateReadout),
    /// 面向用户的错误提示.
    Failed(String),
}

/// 将 `outcome` 写进 `w` 中.
fn describe_into<W: Write>(step: usize, outcome: &Outcome, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    write!(w, "#{step:<4}")?;
    match outcome {
        Outcome::Lasso { index, points } => write!(w, "{S4}lasso #{index}: {points} point(s)"),
        Outcome::Voxels(n) => write!(w, "{S4}{n} unique voxel(s)"),
        Outcome::Saved { path, bytes, shape } => {
            write!(w, "{S4}saved {bytes} bytes to {path}")?;
            match shape {
                Some((x, y, z)) => write!(w, " ({x}x{y}x{z})"),
                None => write!(w, " (/)"),
            }
        }
        Outcome::Progress(url) => write!(w, "{S4}analysis running at {url}"),
        Outcome::Readout(r) => write!(w, "{S4}cursor at ({}, {}, {})", r.x, r.y, r.z),
        Outcome::Failed(msg) => write!(w, "{S4}error: {msg}"),
    }
}

/// 回放的最终结果.
#[derive(Debug, Default)]
pub struct ReplayResult {
    data: Vec<(usize, Outcome)>,
}

impl ReplayResult {
    /// 记录第 `step` 个事件的结果.
    #[inline]
    pub fn push(&mut self, step: usize, outcome: Outcome) {
        self.data.push((step, outcome));
    }

    /// 失败的事件个数.
    pub fn failures(&self) -> usize {
        self.data
            .iter()
            .filter(|(_, o)| matches!(o, Outcome::Failed(_)))
            .count()
    }

    /// 打印结果.
    pub fn describe(&self) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        utils::sep_to(&mut out)?;
        for (step, outcome) in &self.data {
            describe_into(*step, outcome, &mut out)?;
            writeln!(out)?;
        }
        utils::sep_to(&mut out)?;
        writeln!(out, "{} event(s) reported, {} failed", self.data.len(), self.failures())
    }
}
