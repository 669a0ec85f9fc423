//! 运行时错误.

use std::fmt;

use thiserror::Error;

use crate::download::DownloadError;
use crate::export::TransportError;
use crate::raster::InvalidSelection;

/// 对外的两种体素提交操作.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Operation {
    /// 导出为 NIfTI 文件.
    Export,

    /// 提交分析任务.
    Analyze,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Export => f.write_str("export"),
            Operation::Analyze => f.write_str("analyze"),
        }
    }
}

/// 分割子系统的全部错误.
///
/// 所有由外部触发的失败都在触发处以该类型返回, 不会 panic.
#[derive(Debug, Error)]
pub enum SegmentError {
    /// 启动时缺少必需的能力 (查看器、绘制表面或坐标变换). 整个功能被禁用.
    #[error("segmentation unavailable: {0}")]
    Initialization(String),

    /// 套索不合法 (非共面且策略为拒绝). 退化套索不算错误.
    #[error(transparent)]
    InvalidSelection(#[from] InvalidSelection),

    /// 在空体素集上请求导出/分析.
    #[error("no voxels to {0}")]
    Precondition(Operation),

    /// 同类请求尚未完成.
    #[error("an {0} request is already in flight")]
    RequestInFlight(Operation),

    /// 非 2xx 状态或网络错误.
    #[error("{op} request failed: {source}")]
    Transport {
        /// 出错的操作.
        op: Operation,
        /// 底层错误.
        #[source]
        source: TransportError,
    },

    /// 保存或校验下载结果失败.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// 配置不可读或不合法.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SegmentError {
    /// 面向用户的提示文本. 所有错误都是非致命的.
    pub fn user_message(&self) -> String {
        match self {
            SegmentError::Precondition(Operation::Export) => {
                "No voxels to export. Please create a lasso first.".to_string()
            }
            SegmentError::Precondition(Operation::Analyze) => {
                "No voxels to analyze. Please create a lasso first.".to_string()
            }
            SegmentError::RequestInFlight(op) => {
                format!("Please wait, the previous {op} request is still running.")
            }
            SegmentError::Transport { op, source } => {
                let head = match op {
                    Operation::Export => "An error occurred while exporting the NIfTI file.",
                    Operation::Analyze => "An error occurred while analyzing the lesion.",
                };
                match source.server_message() {
                    Some(msg) => format!("{head} ({msg})"),
                    None => head.to_string(),
                }
            }
            other => other.to_string(),
        }
    }
}

/// 分割子系统运行时结果.
pub type SegmentResult<T> = Result<T, SegmentError>;
