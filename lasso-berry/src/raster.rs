//! 多边形栅格化.
//!
//! 对一个闭合多边形, 枚举其包围盒 (与扫描范围取交) 内的每个整数网格点,
//! 以射线交叉 (crossing number) 判定内外.
//!
//! # 约定
//!
//! - 边界规则: 落在某条边 (含顶点) 上的网格点视为内部;
//! - 扫描顺序: x 外层、y 内层, 均递增 (列优先). 顺序是确定的;
//! - 顶点数少于 3 的多边形不包含任何网格点;
//! - 复杂度为 O(包围盒面积), 不做任何降采样.

use itertools::Itertools;
use num::ToPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{DEFAULT_SCAN_HEIGHT, DEFAULT_SCAN_WIDTH};
use crate::world::WorldLasso;
use crate::WorldPoint;

/// 判定点是否落在边上时, 叉积允许的误差.
const ON_EDGE_EPS: f64 = 1e-9;

/// 套索不合法.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum InvalidSelection {
    /// 套索顶点的 z 不一致.
    #[error("lasso is not planar: vertex {vertex} has z = {found}, expected {expected}")]
    NonPlanar {
        /// 第一个偏离平面的顶点序号.
        vertex: usize,
        /// 首个顶点的 z.
        expected: f64,
        /// 偏离顶点的 z.
        found: f64,
    },
}

/// 遇到非共面套索时的处理方式.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanarityPolicy {
    /// 记录警告, 仍然以首个顶点的 z 标记全部内部点.
    #[default]
    Warn,

    /// 拒绝该套索, 返回 [`InvalidSelection::NonPlanar`].
    Reject,
}

/// 栅格化所考虑的坐标范围 (闭区间, 世界坐标单位).
///
/// 反序列化时同样检查 `min <= max`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ScanBounds")]
pub struct ScanExtent {
    min_x: i64,
    min_y: i64,
    max_x: i64,
    max_y: i64,
}

/// 未经检查的 [`ScanExtent`].
#[derive(Deserialize)]
struct ScanBounds {
    min_x: i64,
    min_y: i64,
    max_x: i64,
    max_y: i64,
}

impl TryFrom<ScanBounds> for ScanExtent {
    type Error = String;

    fn try_from(b: ScanBounds) -> Result<Self, Self::Error> {
        Self::from_bounds(b.min_x, b.min_y, b.max_x, b.max_y).ok_or_else(|| {
            format!(
                "scan extent is inverted: x {}..={}, y {}..={}",
                b.min_x, b.max_x, b.min_y, b.max_y
            )
        })
    }
}

/// 以原点为中心, 1000 × 1000.
impl Default for ScanExtent {
    fn default() -> Self {
        Self::centered(DEFAULT_SCAN_WIDTH, DEFAULT_SCAN_HEIGHT)
    }
}

impl ScanExtent {
    /// 以原点为中心、宽 `width` 高 `height` 的范围.
    pub fn centered(width: u32, height: u32) -> Self {
        let (hw, hh) = (i64::from(width / 2), i64::from(height / 2));
        Self {
            min_x: -hw,
            min_y: -hh,
            max_x: i64::from(width) - hw,
            max_y: i64::from(height) - hh,
        }
    }

    /// 由闭区间端点构建. 若任一方向下界大于上界则返回 `None`.
    pub fn from_bounds(min_x: i64, min_y: i64, max_x: i64, max_y: i64) -> Option<Self> {
        (min_x <= max_x && min_y <= max_y).then_some(Self {
            min_x,
            min_y,
            max_x,
            max_y,
        })
    }

    /// `(min_x, min_y, max_x, max_y)`.
    #[inline]
    pub fn bounds(&self) -> (i64, i64, i64, i64) {
        (self.min_x, self.min_y, self.max_x, self.max_y)
    }
}

/// 轴对齐包围盒.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundingBox {
    /// x 下界.
    pub min_x: f64,
    /// y 下界.
    pub min_y: f64,
    /// x 上界.
    pub max_x: f64,
    /// y 上界.
    pub max_y: f64,
}

impl BoundingBox {
    /// 计算 `points` 在 xy 平面上的包围盒. 空输入返回 `None`.
    pub fn of(points: &[WorldPoint]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let init = Self {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        Some(rest.iter().fold(init, |b, p| Self {
            min_x: b.min_x.min(p.x),
            min_y: b.min_y.min(p.y),
            max_x: b.max_x.max(p.x),
            max_y: b.max_y.max(p.y),
        }))
    }

    /// 点是否位于包围盒内 (含边界)?
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }

    /// 包围盒内、且位于 `extent` 内的整数网格范围 `((x0, x1), (y0, y1))`, 均为闭区间.
    /// 无交集时返回 `None`.
    fn grid(&self, extent: &ScanExtent) -> Option<((i64, i64), (i64, i64))> {
        Some((
            grid_axis(self.min_x, self.max_x, extent.min_x, extent.max_x)?,
            grid_axis(self.min_y, self.max_y, extent.min_y, extent.max_y)?,
        ))
    }
}

/// 先截断到 `[min, max]` 再取整, 包围盒超出 `i64` 时仍保留扫描范围内的部分.
#[inline]
fn grid_axis(lo: f64, hi: f64, min: i64, max: i64) -> Option<(i64, i64)> {
    let lo = lo.ceil().max(min as f64);
    let hi = hi.floor().min(max as f64);
    if lo > hi {
        return None;
    }
    Some((lo.to_i64()?, hi.to_i64()?))
}

/// 点 `(px, py)` 是否落在线段 `ab` 上?
#[inline]
fn on_segment(px: f64, py: f64, a: &WorldPoint, b: &WorldPoint) -> bool {
    let cross = (b.x - a.x) * (py - a.y) - (b.y - a.y) * (px - a.x);
    cross.abs() <= ON_EDGE_EPS
        && a.x.min(b.x) <= px
        && px <= a.x.max(b.x)
        && a.y.min(b.y) <= py
        && py <= a.y.max(b.y)
}

/// 判断点 `(x, y)` 是否位于闭合多边形 `polygon` (只看 xy 分量) 之内.
///
/// 边界上的点视为内部. 顶点数少于 3 时恒为 `false`.
pub fn contains(polygon: &[WorldPoint], x: f64, y: f64) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let edges = || polygon.iter().circular_tuple_windows::<(_, _)>();
    if edges().any(|(a, b)| on_segment(x, y, a, b)) {
        return true;
    }

    let mut inside = false;
    for (a, b) in edges() {
        if (a.y > y) != (b.y > y) {
            let cross_x = a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y);
            if x < cross_x {
                inside = !inside;
            }
        }
    }
    inside
}

/// 多边形栅格化器.
#[derive(Copy, Clone, Debug, Default)]
pub struct Rasterizer {
    extent: ScanExtent,
    policy: PlanarityPolicy,
}

impl Rasterizer {
    /// 以给定扫描范围和共面策略创建.
    #[inline]
    pub fn new(extent: ScanExtent, policy: PlanarityPolicy) -> Self {
        Self { extent, policy }
    }

    /// 扫描范围.
    #[inline]
    pub fn extent(&self) -> ScanExtent {
        self.extent
    }

    /// 枚举 `lasso` 内部的全部整数网格点, 每个点都带上套索的 z (首个顶点的 z).
    ///
    /// # 返回值
    ///
    /// - 共面策略为 [`PlanarityPolicy::Reject`] 且套索非共面时, 返回 `Err`;
    /// - 其它情况返回 `Ok`, 顶点少于 3 个时结果为空.
    pub fn rasterize(&self, lasso: &WorldLasso) -> Result<Vec<WorldPoint>, InvalidSelection> {
        let points = lasso.points();
        let Some(z) = lasso.z() else {
            return Ok(vec![]);
        };
        if let Some(vertex) = lasso.first_off_plane() {
            let err = InvalidSelection::NonPlanar {
                vertex,
                expected: z,
                found: points[vertex].z,
            };
            match self.policy {
                PlanarityPolicy::Reject => return Err(err),
                PlanarityPolicy::Warn => log::warn!("{err}; tagging interior with z = {z}"),
            }
        }
        if points.len() < 3 {
            return Ok(vec![]);
        }

        let Some(((x0, x1), (y0, y1))) = BoundingBox::of(points).and_then(|b| b.grid(&self.extent))
        else {
            return Ok(vec![]);
        };
        let mut inside = vec![];
        for x in x0..=x1 {
            for y in y0..=y1 {
                let (fx, fy) = (x as f64, y as f64);
                if contains(points, fx, fy) {
                    inside.push(WorldPoint::new(fx, fy, z));
                }
            }
        }
        Ok(inside)
    }

    /// 按顺序栅格化全部套索. 结果与输入一一对应.
    ///
    /// 打开 `rayon` feature 时各套索并行计算, 但结果顺序不变, 且函数仍在全部完成后才返回.
    pub fn rasterize_all(
        &self,
        lassos: &[WorldLasso],
    ) -> Result<Vec<Vec<WorldPoint>>, InvalidSelection> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "rayon")] {
                use rayon::prelude::*;
                lassos.par_iter().map(|l| self.rasterize(l)).collect()
            } else {
                lassos.iter().map(|l| self.rasterize(l)).collect()
            }
        }
    }
}
