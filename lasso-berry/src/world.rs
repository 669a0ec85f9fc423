//! 世界坐标投影.

use crate::lasso::LassoRegistry;
use crate::transform::CoordinateTransform;
use crate::WorldPoint;

/// 世界坐标下的套索.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorldLasso {
    points: Vec<WorldPoint>,
}

impl WorldLasso {
    /// 直接初始化.
    #[inline]
    pub fn new(points: Vec<WorldPoint>) -> Self {
        Self { points }
    }

    /// 顶点序列.
    #[inline]
    pub fn points(&self) -> &[WorldPoint] {
        &self.points
    }

    /// 顶点个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// 是否没有任何顶点?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 首个顶点的 z. 空套索返回 `None`.
    #[inline]
    pub fn z(&self) -> Option<f64> {
        self.points.first().map(|p| p.z)
    }

    /// 找到第一个与首点 z 不同的顶点, 返回其序号. 共面时返回 `None`.
    pub fn first_off_plane(&self) -> Option<usize> {
        let z = self.z()?;
        self.points.iter().position(|p| p.z != z)
    }
}

/// 与 [`LassoRegistry`] 一一对应的世界坐标套索集合.
///
/// 它总是从注册表整体重新推导, 从不独立存储或增量修补.
#[derive(Clone, Debug, Default)]
pub struct WorldLassoRegistry {
    lassos: Vec<WorldLasso>,
}

impl WorldLassoRegistry {
    /// 按注册表顺序, 对每个套索逐点做 图像 -> 世界 变换.
    pub fn project(registry: &LassoRegistry, transform: &dyn CoordinateTransform) -> Self {
        let lassos = registry
            .iter()
            .map(|lasso| {
                WorldLasso::new(
                    lasso
                        .points()
                        .iter()
                        .map(|&p| transform.image_to_world(p))
                        .collect(),
                )
            })
            .collect();
        Self { lassos }
    }

    /// 丢弃旧结果, 从 `registry` 整体重算.
    #[inline]
    pub fn reproject(&mut self, registry: &LassoRegistry, transform: &dyn CoordinateTransform) {
        *self = Self::project(registry, transform);
    }

    /// 清空.
    #[inline]
    pub fn clear(&mut self) {
        self.lassos.clear();
    }

    /// 套索个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.lassos.len()
    }

    /// 是否为空?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lassos.is_empty()
    }

    /// 按注册表顺序迭代.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, WorldLasso> {
        self.lassos.iter()
    }

    /// 底层切片.
    #[inline]
    pub fn as_slice(&self) -> &[WorldLasso] {
        &self.lassos
    }
}

#[cfg(test)]
mod tests {
    use super::{WorldLasso, WorldLassoRegistry};
    use crate::capture::tests::UnitViewer;
    use crate::lasso::{Lasso, LassoRegistry};
    use crate::{ImagePoint, WorldPoint};

    #[test]
    fn test_project_follows_registry() {
        let viewer = UnitViewer { slice: 0, size: 8 };
        let mut reg = LassoRegistry::new();
        reg.append(Lasso::new(vec![ImagePoint::new(1, 2, 3)]));
        reg.append(Lasso::default());

        let mut world = WorldLassoRegistry::project(&reg, &viewer);
        assert_eq!(world.len(), 2);
        assert_eq!(world.as_slice()[0].points(), [WorldPoint::new(1.0, 2.0, 3.0)]);
        assert!(world.as_slice()[1].is_empty());

        // 注册表变化后整体重算, 不会残留旧结果.
        reg.clear();
        reg.append(Lasso::new(vec![ImagePoint::new(4, 4, 4)]));
        world.reproject(&reg, &viewer);
        assert_eq!(world.len(), 1);
        assert_eq!(world.as_slice()[0].z(), Some(4.0));
    }

    #[test]
    fn test_first_off_plane() {
        let planar = WorldLasso::new(vec![WorldPoint::new(0.0, 0.0, 2.0); 3]);
        assert_eq!(planar.first_off_plane(), None);

        let bent = WorldLasso::new(vec![
            WorldPoint::new(0.0, 0.0, 2.0),
            WorldPoint::new(1.0, 0.0, 2.0),
            WorldPoint::new(1.0, 1.0, 4.0),
        ]);
        assert_eq!(bent.first_off_plane(), Some(2));
        assert_eq!(WorldLasso::default().first_off_plane(), None);
    }
}
