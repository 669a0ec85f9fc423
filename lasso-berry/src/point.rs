//! 三种坐标系下的点.

/// 绘制表面上的像素坐标, 在采集时刻记录.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScreenPoint {
    /// 水平方向.
    pub x: f64,
    /// 垂直方向.
    pub y: f64,
}

impl ScreenPoint {
    /// 直接初始化.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// 体数据原生网格中的体素索引.
///
/// 使用有符号整数, 这样投影到体数据之外的点也可以被表示, 然后被切片判定拒绝.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImagePoint {
    /// 第一维索引.
    pub x: i32,
    /// 第二维索引.
    pub y: i32,
    /// 第三维索引, 即切片号.
    pub z: i32,
}

impl ImagePoint {
    /// 直接初始化.
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// 经体数据空间变换后的物理坐标. 只作临时使用, 不作为记录.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WorldPoint {
    /// x 分量.
    pub x: f64,
    /// y 分量.
    pub y: f64,
    /// z 分量.
    pub z: f64,
}

impl WorldPoint {
    /// 直接初始化.
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub(crate) fn as_tuple(&self) -> crate::Vec3F {
        (self.x, self.y, self.z)
    }
}
