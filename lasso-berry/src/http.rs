//! 基于 `reqwest` 的 [`Transport`] 实现.

use reqwest::header::CONTENT_TYPE;

use crate::export::{PostRequest, Transport, TransportError, TransportResponse};
use crate::{SegmentError, SegmentResult};

/// 向固定根地址发送 POST 请求.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    /// 以 `base_url` (如 `http://localhost:8000`) 创建. 末尾的 `/` 会被去掉.
    pub fn new(base_url: &str) -> SegmentResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("lasso-berry/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SegmentError::Config(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// 根地址.
    #[inline]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Transport for ReqwestTransport {
    async fn post(&self, request: PostRequest) -> Result<TransportResponse, TransportError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.client.post(&url).body(request.body);
        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp
            .bytes()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?
            .to_vec();

        Ok(TransportResponse {
            status,
            content_type,
            body,
        })
    }
}
