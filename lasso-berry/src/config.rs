//! 引擎配置.
//!
//! 所有字段都有默认值, 配置文件 (JSON) 中缺省的字段取默认值.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts::{endpoint, READOUT_DEBOUNCE_MS};
use crate::raster::{PlanarityPolicy, ScanExtent};
use crate::{SegmentError, SegmentResult};

/// 分割引擎配置.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    /// 栅格化扫描范围.
    pub scan_extent: ScanExtent,

    /// 非共面套索的处理方式.
    pub planarity: PlanarityPolicy,

    /// 后端根地址, 如 `https://example.org`. 为空时不进行任何网络请求.
    pub base_url: Option<String>,

    /// 导出 NIfTI 的路径.
    pub materialize_path: String,

    /// 提交分析的路径.
    pub analyze_path: String,

    /// 分析进度页面的路径.
    pub progress_path: String,

    /// 导出结果的文件名.
    pub download_name: String,

    /// 导出结果的保存目录. 为空时使用系统下载目录.
    pub download_dir: Option<PathBuf>,

    /// 坐标读数去抖延迟 (毫秒).
    pub readout_debounce_ms: u64,

    /// 保存 CSRF token 的 cookie 名.
    pub csrf_cookie: String,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            scan_extent: ScanExtent::default(),
            planarity: PlanarityPolicy::default(),
            base_url: None,
            materialize_path: endpoint::VOXEL_TO_NIFTI.to_string(),
            analyze_path: endpoint::ANALYZE_VOXELS.to_string(),
            progress_path: endpoint::ANALYZE_PROGRESS.to_string(),
            download_name: endpoint::DOWNLOAD_NAME.to_string(),
            download_dir: None,
            readout_debounce_ms: READOUT_DEBOUNCE_MS,
            csrf_cookie: endpoint::CSRF_COOKIE.to_string(),
        }
    }
}

impl SegmenterConfig {
    /// 从 JSON 文本解析.
    pub fn from_json_str(s: &str) -> SegmentResult<Self> {
        serde_json::from_str(s).map_err(|e| SegmentError::Config(e.to_string()))
    }

    /// 打开 JSON 配置文件. `path` 为本地路径.
    pub fn open<P: AsRef<Path>>(path: P) -> SegmentResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| SegmentError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }

    /// 坐标读数去抖延迟.
    #[inline]
    pub fn readout_debounce(&self) -> Duration {
        Duration::from_millis(self.readout_debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::SegmenterConfig;
    use crate::raster::{PlanarityPolicy, ScanExtent};
    use crate::SegmentError;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let c = SegmenterConfig::default();
        assert_eq!(c.materialize_path, "/voxel_to_nifti/");
        assert_eq!(c.analyze_path, "/analyze_voxels/");
        assert_eq!(c.download_name, "segmented_image.nii.gz");
        assert_eq!(c.readout_debounce().as_millis(), 100);
        assert_eq!(c.planarity, PlanarityPolicy::Warn);
        assert!(c.base_url.is_none());
    }

    #[test]
    fn test_partial_json() {
        let c = SegmenterConfig::from_json_str(
            r#"{
                "base_url": "http://localhost:8000",
                "planarity": "reject",
                "scan_extent": { "min_x": 0, "min_y": 0, "max_x": 999, "max_y": 999 }
            }"#,
        )
        .unwrap();
        assert_eq!(c.base_url.as_deref(), Some("http://localhost:8000"));
        assert_eq!(c.planarity, PlanarityPolicy::Reject);
        assert_eq!(c.scan_extent, ScanExtent::from_bounds(0, 0, 999, 999).unwrap());
        assert_eq!(c.csrf_cookie, "csrftoken");
    }

    #[test]
    fn test_inverted_extent_rejected() {
        let e = SegmenterConfig::from_json_str(
            r#"{ "scan_extent": { "min_x": 10, "min_y": 10, "max_x": 0, "max_y": 0 } }"#,
        )
        .unwrap_err();
        assert!(matches!(e, SegmentError::Config(ref m) if m.contains("inverted")));
    }

    #[test]
    fn test_bad_json() {
        let e = SegmenterConfig::from_json_str("{ planarity: 1 }").unwrap_err();
        assert!(matches!(e, SegmentError::Config(_)));
    }

    #[test]
    fn test_open_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{ "readout_debounce_ms": 250 }}"#).unwrap();
        let c = SegmenterConfig::open(f.path()).unwrap();
        assert_eq!(c.readout_debounce_ms, 250);

        let missing = SegmenterConfig::open("/definitely/not/here.json").unwrap_err();
        assert!(matches!(missing, SegmentError::Config(_)));
    }
}
