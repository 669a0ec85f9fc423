//! 套索与套索注册表.

use crate::ImagePoint;

/// 用户绘制的一个闭合多边形, 由图像空间的点组成 (末点隐式连接首点).
///
/// 创建后不可变. 点数少于 3 的套索是退化的, 但仍然被接受.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Lasso {
    points: Vec<ImagePoint>,
}

impl Lasso {
    /// 由已经过滤好的点序列创建套索.
    #[inline]
    pub fn new(points: Vec<ImagePoint>) -> Self {
        Self { points }
    }

    /// 顶点序列.
    #[inline]
    pub fn points(&self) -> &[ImagePoint] {
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

    /// 不足以围成面积的套索 (少于 3 个点).
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 3
    }

    /// 套索所在切片. 空套索返回 `None`.
    #[inline]
    pub fn z(&self) -> Option<i32> {
        self.points.first().map(|p| p.z)
    }
}

/// 已完成套索的有序集合. 只追加, 只能整体清空.
///
/// 这是用户选区唯一的事实来源. 不提供单个删除或编辑.
#[derive(Clone, Debug, Default)]
pub struct LassoRegistry {
    lassos: Vec<Lasso>,
}

impl LassoRegistry {
    /// 空注册表.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个套索, 返回它的序号.
    pub fn append(&mut self, lasso: Lasso) -> usize {
        self.lassos.push(lasso);
        self.lassos.len() - 1
    }

    /// 清空全部套索.
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

    /// 按序号获取套索.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Lasso> {
        self.lassos.get(index)
    }

    /// 按追加顺序迭代.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Lasso> {
        self.lassos.iter()
    }

    /// 全部套索的顶点总数.
    pub fn point_count(&self) -> usize {
        self.lassos.iter().map(Lasso::len).sum()
    }
}

impl<'a> IntoIterator for &'a LassoRegistry {
    type Item = &'a Lasso;
    type IntoIter = std::slice::Iter<'a, Lasso>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{Lasso, LassoRegistry};
    use crate::ImagePoint;

    fn square(z: i32) -> Lasso {
        Lasso::new(vec![
            ImagePoint::new(0, 0, z),
            ImagePoint::new(0, 10, z),
            ImagePoint::new(10, 10, z),
            ImagePoint::new(10, 0, z),
        ])
    }

    #[test]
    fn test_registry_append_order() {
        let mut reg = LassoRegistry::new();
        assert_eq!(reg.append(square(1)), 0);
        assert_eq!(reg.append(square(2)), 1);
        assert_eq!(reg.append(Lasso::default()), 2);

        let zs: Vec<_> = reg.iter().map(Lasso::z).collect();
        assert_eq!(zs, [Some(1), Some(2), None]);
        assert_eq!(reg.point_count(), 8);
    }

    #[test]
    fn test_registry_clear() {
        let mut reg = LassoRegistry::new();
        reg.append(square(3));
        reg.clear();
        assert!(reg.is_empty());
        assert!(reg.get(0).is_none());
    }

    #[test]
    fn test_degenerate() {
        assert!(Lasso::default().is_degenerate());
        assert!(Lasso::new(vec![ImagePoint::new(1, 1, 0); 2]).is_degenerate());
        assert!(!square(0).is_degenerate());
    }
}
