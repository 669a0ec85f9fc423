//! 通用常量.

use crate::draw::Rgba;

/// 绘制反馈所用的颜色.
pub mod color {
    use super::Rgba;

    /// 绘制过程中实时预览笔画的颜色 (品红).
    pub const PREVIEW_STROKE: Rgba = Rgba::opaque(255, 0, 255);

    /// 已完成套索的填充颜色, 即 `rgba(255, 0, 0, 0.5)`.
    pub const LASSO_FILL: Rgba = Rgba::new(255, 0, 0, 0.5);
}

/// 后端 HTTP 边界.
pub mod endpoint {
    /// 体素列表转 NIfTI 文件.
    pub const VOXEL_TO_NIFTI: &str = "/voxel_to_nifti/";

    /// 体素列表提交分析任务.
    pub const ANALYZE_VOXELS: &str = "/analyze_voxels/";

    /// 分析任务进度页面, 以 `task_id` 为查询参数.
    pub const ANALYZE_PROGRESS: &str = "/analyze_progress/";

    /// 导出结果的下载文件名.
    pub const DOWNLOAD_NAME: &str = "segmented_image.nii.gz";

    /// 携带 CSRF token 的请求头.
    pub const CSRF_HEADER: &str = "X-CSRFToken";

    /// 保存 CSRF token 的 cookie 名.
    pub const CSRF_COOKIE: &str = "csrftoken";

    /// JSON 请求体的 `Content-Type`.
    pub const JSON: &str = "application/json";

    /// 导出请求期望的响应类型.
    pub const GZIP: &str = "application/gzip";
}

/// 二值掩膜中被选中体素的值. 固定为 1, 不存在部分隶属.
pub const MASK_VALUE: u8 = 1;

/// 默认扫描范围宽度 (世界坐标单位).
pub const DEFAULT_SCAN_WIDTH: u32 = 1000;

/// 默认扫描范围高度 (世界坐标单位).
pub const DEFAULT_SCAN_HEIGHT: u32 = 1000;

/// 坐标读数的默认去抖延迟, 以毫秒为单位.
pub const READOUT_DEBOUNCE_MS: u64 = 100;
