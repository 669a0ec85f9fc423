//! 导出 / 分析流水线.
//!
//! 两个操作都以非空体素集为前提. 空集直接返回 [`SegmentError::Precondition`], 不发出任何请求.
//! 请求发出后不重试、不退避、不取消. 同类请求尚未完成时, 新的请求直接被拒绝.

use std::cell::Cell;

use serde::Deserialize;
use thiserror::Error;

use crate::config::SegmenterConfig;
use crate::consts::endpoint;
use crate::download::Materialized;
use crate::voxel::VoxelSet;
use crate::{Operation, SegmentError, SegmentResult};

/// 一次 POST 请求. `path` 相对于后端根地址.
#[derive(Clone, Debug, PartialEq)]
pub struct PostRequest {
    /// 请求路径.
    pub path: String,
    /// 请求头.
    pub headers: Vec<(&'static str, String)>,
    /// 请求体.
    pub body: Vec<u8>,
}

impl PostRequest {
    /// 查找请求头 (名字大小写不敏感).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// 后端响应.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransportResponse {
    /// HTTP 状态码.
    pub status: u16,
    /// `Content-Type` 头.
    pub content_type: Option<String>,
    /// 响应体.
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// 是否为 2xx?
    #[inline]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 传输层错误.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum TransportError {
    /// 非 2xx 状态, 且响应体是带错误信息的 JSON.
    #[error("server responded {status}: {message}")]
    Rejected {
        /// 状态码.
        status: u16,
        /// 服务端给出的信息.
        message: String,
    },

    /// 非 2xx 状态, 响应体无法解析.
    #[error("server responded {status}")]
    Status {
        /// 状态码.
        status: u16,
    },

    /// 网络错误.
    #[error("network error: {0}")]
    Network(String),

    /// 成功状态下的响应体不符合约定.
    #[error("malformed response: {0}")]
    Decode(String),
}

impl TransportError {
    /// 服务端给出的错误信息 (如果有).
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message, .. } => Some(message),
            _ => None,
        }
    }

    /// 将非 2xx 响应解析为错误. 优先读取 JSON 中的 `error`, 其次 `message`.
    fn from_failed(resp: &TransportResponse) -> Self {
        #[derive(Deserialize)]
        struct ErrorBody {
            error: Option<String>,
            message: Option<String>,
        }

        match serde_json::from_slice::<ErrorBody>(&resp.body) {
            Ok(ErrorBody {
                error: Some(message),
                ..
            })
            | Ok(ErrorBody {
                error: None,
                message: Some(message),
            }) => Self::Rejected {
                status: resp.status,
                message,
            },
            _ => Self::Status {
                status: resp.status,
            },
        }
    }
}

/// 发送 POST 请求的能力. 生产环境见 `ReqwestTransport`.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// 发送请求并读取完整响应.
    async fn post(&self, request: PostRequest) -> Result<TransportResponse, TransportError>;
}

/// 分析任务凭据.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct AnalyzeTicket {
    /// 后端任务 id.
    pub task_id: String,
}

impl AnalyzeTicket {
    /// 以 `progress_path` 为基础的进度页面地址.
    #[inline]
    pub fn progress_url(&self, progress_path: &str) -> String {
        format!("{progress_path}?task_id={}", self.task_id)
    }
}

/// 请求进行中标记. 析构时自动释放.
struct InFlight<'a>(&'a Cell<bool>);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a Cell<bool>) -> Option<Self> {
        (!flag.replace(true)).then(|| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// 导出 / 分析流水线.
///
/// 内部以 `Cell` 记录请求状态, 因此只能由单个逻辑所有者使用.
pub struct ExportPipeline<T> {
    transport: T,
    materialize_path: String,
    analyze_path: String,
    download_name: String,
    exporting: Cell<bool>,
    analyzing: Cell<bool>,
}

impl<T: Transport> ExportPipeline<T> {
    /// 以 `config` 中的路径与文件名创建.
    pub fn new(transport: T, config: &SegmenterConfig) -> Self {
        Self {
            transport,
            materialize_path: config.materialize_path.clone(),
            analyze_path: config.analyze_path.clone(),
            download_name: config.download_name.clone(),
            exporting: Cell::new(false),
            analyzing: Cell::new(false),
        }
    }

    /// 底层传输.
    #[inline]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// 同类请求是否正在进行?
    pub fn is_in_flight(&self, op: Operation) -> bool {
        match op {
            Operation::Export => self.exporting.get(),
            Operation::Analyze => self.analyzing.get(),
        }
    }

    /// 将 `voxels` 提交到 `POST /voxel_to_nifti/`, 成功时返回二进制结果.
    pub async fn materialize(&self, voxels: &VoxelSet) -> SegmentResult<Materialized> {
        let op = Operation::Export;
        let body = Self::prepare(voxels, op)?;
        let _guard = InFlight::acquire(&self.exporting).ok_or(SegmentError::RequestInFlight(op))?;

        let request = PostRequest {
            path: self.materialize_path.clone(),
            headers: vec![
                ("Content-Type", endpoint::JSON.to_string()),
                ("Accept", endpoint::GZIP.to_string()),
            ],
            body,
        };
        let resp = self.send(request, op).await?;
        log::info!("Materialized {} voxels into {} bytes", voxels.len(), resp.body.len());
        Ok(Materialized::new(self.download_name.clone(), resp.body))
    }

    /// 将 `voxels` 提交到 `POST /analyze_voxels/`, 成功时返回任务凭据.
    pub async fn analyze(&self, voxels: &VoxelSet, csrf_token: &str) -> SegmentResult<AnalyzeTicket> {
        let op = Operation::Analyze;
        let body = Self::prepare(voxels, op)?;
        let _guard = InFlight::acquire(&self.analyzing).ok_or(SegmentError::RequestInFlight(op))?;

        let request = PostRequest {
            path: self.analyze_path.clone(),
            headers: vec![
                ("Content-Type", endpoint::JSON.to_string()),
                (endpoint::CSRF_HEADER, csrf_token.to_string()),
            ],
            body,
        };
        let resp = self.send(request, op).await?;
        let ticket: AnalyzeTicket = serde_json::from_slice(&resp.body).map_err(|e| {
            SegmentError::Transport {
                op,
                source: TransportError::Decode(e.to_string()),
            }
        })?;
        log::info!("Analysis task `{}` accepted", ticket.task_id);
        Ok(ticket)
    }

    /// 前置检查并序列化.
    fn prepare(voxels: &VoxelSet, op: Operation) -> SegmentResult<Vec<u8>> {
        if voxels.is_empty() {
            return Err(SegmentError::Precondition(op));
        }
        voxels.to_json().map_err(|e| SegmentError::Transport {
            op,
            source: TransportError::Decode(e.to_string()),
        })
    }

    async fn send(&self, request: PostRequest, op: Operation) -> SegmentResult<TransportResponse> {
        log::debug!("POST {} ({} bytes)", request.path, request.body.len());
        let resp = self
            .transport
            .post(request)
            .await
            .map_err(|source| SegmentError::Transport { op, source })?;
        if !resp.is_success() {
            let source = TransportError::from_failed(&resp);
            log::warn!("{op} request failed: {source}");
            return Err(SegmentError::Transport { op, source });
        }
        Ok(resp)
    }
}
