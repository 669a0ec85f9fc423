//! 基于仿射矩阵的参考坐标变换.
//!
//! [`VolumeGeometry`] 描述体数据网格到世界坐标 (mm) 的映射, 可以从 NIfTI 头部读取.
//! [`SliceViewer`] 在其上实现 [`CoordinateTransform`], 可作为宿主查看器的替身.

use nalgebra::{Matrix3, Matrix4, Point3, Quaternion, UnitQuaternion, Vector3};
use ndarray::Array2;
use nifti::NiftiHeader;
use num::ToPrimitive;
use once_cell::sync::Lazy;
use thiserror::Error;

use crate::transform::{CoordinateTransform, SliceView};
use crate::{Idx3d, ImagePoint, ScreenPoint, WorldPoint};

/// 奇异判定阈值.
const SINGULAR_EPS: f64 = 1e-12;

/// 构造 [`VolumeGeometry`] 时的错误.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum GeometryError {
    /// 仿射矩阵不是 4x4.
    #[error("affine must be 4x4, got {0}x{1}")]
    BadAffineShape(usize, usize),

    /// 仿射矩阵不可逆.
    #[error("affine is singular")]
    SingularAffine,

    /// 形状中有为 0 的维度.
    #[error("volume shape {0:?} is empty")]
    EmptyShape(Idx3d),
}

/// MNI152 2mm 模板的网格.
static MNI152_2MM: Lazy<VolumeGeometry> = Lazy::new(|| {
    VolumeGeometry::from_rows(
        (91, 109, 91),
        [
            [-2.0, 0.0, 0.0, 90.0],
            [0.0, 2.0, 0.0, -126.0],
            [0.0, 0.0, 2.0, -72.0],
        ],
    )
    .expect("MNI152 affine is invertible")
});

/// 体数据网格: 形状 `(x, y, z)` 与 4x4 仿射矩阵.
#[derive(Clone, Debug, PartialEq)]
pub struct VolumeGeometry {
    shape: Idx3d,
    affine: Matrix4<f64>,
    inverse: Matrix4<f64>,
}

impl VolumeGeometry {
    /// 以形状和 4x4 仿射矩阵构建. 只使用矩阵的前三行, 最后一行视为 `[0, 0, 0, 1]`.
    pub fn new(shape: Idx3d, affine: Array2<f64>) -> Result<Self, GeometryError> {
        let (r, c) = affine.dim();
        if (r, c) != (4, 4) {
            return Err(GeometryError::BadAffineShape(r, c));
        }
        let affine = Matrix4::from_fn(|i, j| match (i, j) {
            (3, 3) => 1.0,
            (3, _) => 0.0,
            _ => affine[[i, j]],
        });
        Self::with_affine(shape, affine)
    }

    /// 以仿射矩阵的前三行构建.
    pub fn from_rows(shape: Idx3d, rows: [[f64; 4]; 3]) -> Result<Self, GeometryError> {
        let [x, y, z] = rows;
        #[rustfmt::skip]
        let affine = Matrix4::new(
            x[0], x[1], x[2], x[3],
            y[0], y[1], y[2], y[3],
            z[0], z[1], z[2], z[3],
            0.0, 0.0, 0.0, 1.0,
        );
        Self::with_affine(shape, affine)
    }

    fn with_affine(shape: Idx3d, affine: Matrix4<f64>) -> Result<Self, GeometryError> {
        let (nx, ny, nz) = shape;
        if nx == 0 || ny == 0 || nz == 0 {
            return Err(GeometryError::EmptyShape(shape));
        }
        let det = affine.fixed_view::<3, 3>(0, 0).determinant();
        if !det.is_finite() || det.abs() < SINGULAR_EPS {
            return Err(GeometryError::SingularAffine);
        }
        let inverse = affine.try_inverse().ok_or(GeometryError::SingularAffine)?;
        Ok(Self {
            shape,
            affine,
            inverse,
        })
    }

    /// 从 NIfTI 头部读取.
    ///
    /// 优先使用 sform (`sform_code > 0`), 其次 qform (`qform_code > 0`),
    /// 都没有时退化为以 `pixdim` 为对角线的缩放.
    pub fn from_header(header: &NiftiHeader) -> Result<Self, GeometryError> {
        let [_, nx, ny, nz, ..] = header.dim;
        let shape = (nx as usize, ny as usize, nz as usize);
        let [qfac, dx, dy, dz, ..] = header.pixdim.map(f64::from);

        if header.sform_code > 0 {
            let rows = [header.srow_x, header.srow_y, header.srow_z].map(|row| row.map(f64::from));
            return Self::from_rows(shape, rows);
        }
        if header.qform_code <= 0 {
            let scale = Matrix3::from_diagonal(&Vector3::new(dx, dy, dz));
            return Self::with_affine(shape, scale.to_homogeneous());
        }

        // qform: 四元数只存 (b, c, d), a 由单位长度推出.
        let [b, c, d] = [header.quatern_b, header.quatern_c, header.quatern_d].map(f64::from);
        let a = (1.0 - (b * b + c * c + d * d)).max(0.0).sqrt();
        let rotation = UnitQuaternion::from_quaternion(Quaternion::new(a, b, c, d))
            .to_rotation_matrix()
            .into_inner();
        let qfac = if qfac < 0.0 { -1.0 } else { 1.0 };
        let linear = rotation * Matrix3::from_diagonal(&Vector3::new(dx, dy, dz * qfac));
        let offset = Vector3::new(header.quatern_x, header.quatern_y, header.quatern_z).map(f64::from);

        let mut affine = linear.to_homogeneous();
        affine.fixed_view_mut::<3, 1>(0, 3).copy_from(&offset);
        Self::with_affine(shape, affine)
    }

    /// MNI152 2mm 模板: 91x109x91.
    #[inline]
    pub fn mni152_2mm() -> &'static Self {
        &MNI152_2MM
    }

    /// 形状 `(x, y, z)`.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.shape
    }

    /// 4x4 仿射矩阵.
    pub fn affine(&self) -> Array2<f64> {
        Array2::from_shape_fn((4, 4), |(i, j)| self.affine[(i, j)])
    }

    /// 图像索引 -> 世界坐标.
    pub fn index_to_world(&self, p: ImagePoint) -> WorldPoint {
        let v = self
            .affine
            .transform_point(&Point3::new(f64::from(p.x), f64::from(p.y), f64::from(p.z)));
        WorldPoint::new(v.x, v.y, v.z)
    }

    /// 世界坐标 -> 连续的图像坐标 (不取整).
    pub fn world_to_continuous(&self, p: WorldPoint) -> (f64, f64, f64) {
        let v = self.inverse.transform_point(&Point3::new(p.x, p.y, p.z));
        (v.x, v.y, v.z)
    }

    /// 世界坐标 -> 最近的图像索引. 超出 `i32` 范围或非有限值时返回 `None`.
    pub fn world_to_index(&self, p: WorldPoint) -> Option<ImagePoint> {
        let (x, y, z) = self.world_to_continuous(p);
        Some(ImagePoint::new(
            x.round().to_i32()?,
            y.round().to_i32()?,
            z.round().to_i32()?,
        ))
    }

    /// 索引是否位于网格之内?
    #[inline]
    pub fn contains_index(&self, p: &ImagePoint) -> bool {
        let (nx, ny, nz) = self.shape;
        let inside = |v: i32, n: usize| v.to_usize().is_some_and(|v| v < n);
        inside(p.x, nx) && inside(p.y, ny) && inside(p.z, nz)
    }
}

/// 单个视图的屏幕映射: `屏幕 = 索引 * scale + offset`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScreenMapping {
    /// 每个体素的屏幕像素数.
    pub scale: f64,
    /// 水平偏移.
    pub offset_x: f64,
    /// 垂直偏移.
    pub offset_y: f64,
}

impl Default for ScreenMapping {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

impl ScreenMapping {
    #[inline]
    fn index_of(s: f64, offset: f64, scale: f64) -> i32 {
        ((s - offset) / scale).floor().to_i32().unwrap_or(i32::MIN)
    }
}

/// 基于 [`VolumeGeometry`] 的参考查看器.
///
/// 屏幕 x / y 对应图像 x / y, 光标的 z 即当前切片.
/// 渲染反馈 (世界 -> 屏幕) 使用当前活动视图的映射.
#[derive(Clone, Debug)]
pub struct SliceViewer {
    geometry: VolumeGeometry,
    mappings: [ScreenMapping; 3],
    active: SliceView,
    cursor: ImagePoint,
}

impl SliceViewer {
    /// 创建, 光标位于网格中心.
    pub fn new(geometry: VolumeGeometry) -> Self {
        let (nx, ny, nz) = geometry.shape();
        let half = |n: usize| (n / 2).to_i32().unwrap_or(i32::MAX);
        Self {
            cursor: ImagePoint::new(half(nx), half(ny), half(nz)),
            geometry,
            mappings: [ScreenMapping::default(); 3],
            active: SliceView::Axial,
        }
    }

    /// 当前活动视图.
    #[inline]
    pub fn active_view(&self) -> SliceView {
        self.active
    }

    /// 切换活动视图.
    #[inline]
    pub fn set_active_view(&mut self, view: SliceView) {
        self.active = view;
    }

    /// 网格.
    #[inline]
    pub fn geometry(&self) -> &VolumeGeometry {
        &self.geometry
    }

    /// 某个视图的屏幕映射.
    #[inline]
    pub fn mapping(&self, view: SliceView) -> ScreenMapping {
        self.mappings[view.index()]
    }

    /// 设置某个视图的屏幕映射. `scale` 必须为正.
    pub fn set_mapping(&mut self, view: SliceView, mapping: ScreenMapping) -> bool {
        if mapping.scale <= 0.0 || !mapping.scale.is_finite() {
            return false;
        }
        self.mappings[view.index()] = mapping;
        true
    }

    /// 光标.
    #[inline]
    pub fn cursor(&self) -> ImagePoint {
        self.cursor
    }

    /// 移动光标. 超出网格时不移动并返回 `false`.
    pub fn set_cursor(&mut self, cursor: ImagePoint) -> bool {
        if !self.geometry.contains_index(&cursor) {
            return false;
        }
        self.cursor = cursor;
        true
    }

    /// 切换到第 `z` 层切片.
    #[inline]
    pub fn set_slice(&mut self, z: i32) -> bool {
        self.set_cursor(ImagePoint { z, ..self.cursor })
    }
}

impl CoordinateTransform for SliceViewer {
    fn screen_to_image_x(&self, x: f64, view: SliceView) -> i32 {
        let m = self.mapping(view);
        ScreenMapping::index_of(x, m.offset_x, m.scale)
    }

    fn screen_to_image_y(&self, y: f64, view: SliceView) -> i32 {
        let m = self.mapping(view);
        ScreenMapping::index_of(y, m.offset_y, m.scale)
    }

    #[inline]
    fn current_slice(&self) -> i32 {
        self.cursor.z
    }

    #[inline]
    fn image_to_world(&self, point: ImagePoint) -> WorldPoint {
        self.geometry.index_to_world(point)
    }

    fn world_to_screen(&self, point: WorldPoint) -> ScreenPoint {
        let m = self.mapping(self.active);
        let (x, y, _) = self.geometry.world_to_continuous(point);
        ScreenPoint::new(x * m.scale + m.offset_x, y * m.scale + m.offset_y)
    }

    #[inline]
    fn intersects_slice(&self, point: &ImagePoint) -> bool {
        point.z == self.cursor.z && self.geometry.contains_index(point)
    }
}
