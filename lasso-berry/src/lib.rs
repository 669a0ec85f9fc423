#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 在 3D 体数据 (NIfTI) 的单个切片视图上徒手绘制套索 (lasso),
//! 并将这些套索转换为去重后的 3D 体素坐标集合 (二值掩膜), 用于导出或提交分析.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 该 crate 不负责体数据的渲染, 也不负责切片/平面的维护.
//!   这些能力由宿主查看器通过 [`CoordinateTransform`] 和 [`DrawingSurface`] 提供.
//!   [`volume::SliceViewer`] 是一个基于仿射矩阵的参考实现.
//! 2. 所有状态都保存在调用者持有的 [`SegmentationSession`] 中, 不存在进程级单例.
//! 3. 栅格化在一次调用内同步完成, 不会在扫描中途让出.
//!
//! # 开发计划
//!
//! ### 屏幕笔画采集 ✅
//!
//! `Off -> Idle -> Drawing` 状态机. 抬笔时按切片过滤并生成套索.
//!
//! 实现位于 `lasso-berry/src/capture.rs`.
//!
//! ### 屏幕 -> 图像 -> 世界坐标流水线 ✅
//!
//! 1. 坐标变换只通过 [`CoordinateTransform`] 完成, 引擎本身不做变换数学;
//! 2. 世界坐标套索在每次请求体素时整体重算, 从不增量修补.
//!
//! 实现位于 `lasso-berry/src/transform.rs` 和 `lasso-berry/src/world.rs`.
//!
//! ### 多边形栅格化 ✅
//!
//! 包围盒 ∩ 扫描范围内逐整数网格点做射线交叉判定. 边界上的点视为内部.
//! 扫描顺序为 x 外层、y 内层, 均递增.
//!
//! 实现位于 `lasso-berry/src/raster.rs`.
//!
//! ### 跨套索体素去重 ✅
//!
//! 精确坐标相等 (非 epsilon) 去重, 保留首次插入顺序.
//!
//! 实现位于 `lasso-berry/src/voxel.rs`.
//!
//! ### 导出 / 分析 ✅
//!
//! 两个 HTTP 边界: `POST /voxel_to_nifti/` 与 `POST /analyze_voxels/`.
//! 空体素集直接拒绝, 不发请求; 同类请求未完成时拒绝重复提交.
//!
//! 实现位于 `lasso-berry/src/export.rs` 和 `lasso-berry/src/http.rs`.
//!
//! ### 小功能 ✅
//!
//! 1. 基于 NIfTI 头部 (sform/qform) 的参考坐标变换. ✅
//! 2. 查看器 "帧已渲染 / 切片已变更" 观察者注册. ✅
//! 3. 单槽延迟调度的坐标读数 (就近取偶). ✅
//! 4. 下载结果的保存与 gzip NIfTI 头部校验. ✅

/// 三维非负索引, 一般用于表示体数据形状 `(x, y, z)`.
pub type Idx3d = (usize, usize, usize);

/// 浮点三维向量.
type Vec3F = (f64, f64, f64);

/// 导出到后端的体素元组 `[x, y, z, 1]`.
pub type VoxelTuple = [f64; 4];

pub mod consts;

mod error;
mod point;

pub use error::{Operation, SegmentError, SegmentResult};
pub use point::{ImagePoint, ScreenPoint, WorldPoint};

pub mod capture;
pub mod config;
pub mod csrf;
pub mod download;
pub mod draw;
pub mod export;
pub mod hooks;
pub mod lasso;
pub mod raster;
pub mod readout;
pub mod session;
pub mod transform;
pub mod volume;
pub mod voxel;
pub mod world;

cfg_if::cfg_if! {
    if #[cfg(feature = "http")] {
        mod http;

        pub use http::ReqwestTransport;
    }
}

pub use capture::{StrokeCapture, ToolState};
pub use config::SegmenterConfig;
pub use draw::{CommandList, DrawCommand, DrawingSurface, Rgba};
pub use export::{AnalyzeTicket, ExportPipeline, Transport, TransportError};
pub use lasso::{Lasso, LassoRegistry};
pub use raster::{InvalidSelection, PlanarityPolicy, Rasterizer, ScanExtent};
pub use session::{Capabilities, SegmentationSession};
pub use transform::{CoordinateTransform, SliceView};
pub use voxel::{Voxel, VoxelSet};
pub use world::{WorldLasso, WorldLassoRegistry};

pub mod prelude;
