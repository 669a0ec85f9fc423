//! 坐标变换适配器.
//!
//! 引擎只消费这里的能力, 本身不做任何变换数学.

use crate::{ImagePoint, ScreenPoint, WorldPoint};

/// 屏幕上的切片视图. 不同视图可以使用互相独立的屏幕变换.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum SliceView {
    /// 水平切片.
    Axial,

    /// 冠状切片.
    Coronal,

    /// 矢状切片.
    Sagittal,
}

impl SliceView {
    /// 全部视图.
    pub const ALL: [SliceView; 3] = [Self::Axial, Self::Coronal, Self::Sagittal];

    #[inline]
    pub(crate) fn index(self) -> usize {
        match self {
            Self::Axial => 0,
            Self::Coronal => 1,
            Self::Sagittal => 2,
        }
    }
}

/// 宿主查看器提供的 屏幕 <-> 图像 <-> 世界 坐标能力.
pub trait CoordinateTransform {
    /// 屏幕 x -> 图像 x 索引. `view` 是绘制时所用的切片视图.
    fn screen_to_image_x(&self, x: f64, view: SliceView) -> i32;

    /// 屏幕 y -> 图像 y 索引. `view` 是绘制时所用的切片视图.
    fn screen_to_image_y(&self, y: f64, view: SliceView) -> i32;

    /// 当前可见切片的 z 索引.
    fn current_slice(&self) -> i32;

    /// 图像索引 -> 世界坐标.
    fn image_to_world(&self, point: ImagePoint) -> WorldPoint;

    /// 世界坐标 -> 屏幕坐标, 仅用于渲染反馈.
    fn world_to_screen(&self, point: WorldPoint) -> ScreenPoint;

    /// 该点是否位于当前可见的切片平面上?
    fn intersects_slice(&self, point: &ImagePoint) -> bool;

    /// 将屏幕点投影到图像空间, z 取当前切片.
    #[inline]
    fn screen_to_image(&self, point: ScreenPoint, view: SliceView) -> ImagePoint {
        ImagePoint::new(
            self.screen_to_image_x(point.x, view),
            self.screen_to_image_y(point.y, view),
            self.current_slice(),
        )
    }

    /// 图像索引 -> 屏幕坐标. 经由世界坐标完成.
    #[inline]
    fn image_to_screen(&self, point: ImagePoint) -> ScreenPoint {
        self.world_to_screen(self.image_to_world(point))
    }
}
