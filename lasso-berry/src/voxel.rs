//! 体素去重与聚合.

use std::collections::HashSet;

use ordered_float::OrderedFloat;
use serde::ser::{SerializeSeq, SerializeTuple};
use serde::{Serialize, Serializer};

use crate::consts::MASK_VALUE;
use crate::{VoxelTuple, WorldPoint};

/// 精确相等的哈希键. `OrderedFloat` 把 `0.0` 与 `-0.0` 视为相同.
type VoxelKey = (OrderedFloat<f64>, OrderedFloat<f64>, OrderedFloat<f64>);

#[inline]
fn key_of(p: &WorldPoint) -> VoxelKey {
    let (x, y, z) = p.as_tuple();
    (OrderedFloat(x), OrderedFloat(y), OrderedFloat(z))
}

/// 被选中的体素. 掩膜值固定为 [`MASK_VALUE`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Voxel {
    point: WorldPoint,
}

impl Voxel {
    /// 体素坐标.
    #[inline]
    pub fn point(&self) -> WorldPoint {
        self.point
    }

    /// `[x, y, z, 1]`.
    #[inline]
    pub fn to_tuple(&self) -> VoxelTuple {
        let p = self.point;
        [p.x, p.y, p.z, f64::from(MASK_VALUE)]
    }
}

/// 序列化为 `[x, y, z, 1]`.
impl Serialize for Voxel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut t = serializer.serialize_tuple(4)?;
        t.serialize_element(&self.point.x)?;
        t.serialize_element(&self.point.y)?;
        t.serialize_element(&self.point.z)?;
        t.serialize_element(&MASK_VALUE)?;
        t.end()
    }
}

/// 有序、以坐标精确相等去重的体素集合. 顺序为首次插入顺序, 不排序.
#[derive(Clone, Debug, Default)]
pub struct VoxelSet {
    voxels: Vec<Voxel>,
    seen: HashSet<VoxelKey>,
}

impl VoxelSet {
    /// 空集合.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 按顺序合并各套索的内部点. 已出现过的坐标被跳过.
    pub fn aggregate<I, P>(interiors: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: IntoIterator<Item = WorldPoint>,
    {
        let mut set = Self::new();
        for interior in interiors {
            set.extend(interior);
        }
        set
    }

    /// 插入一个坐标. 若该坐标此前不存在则返回 `true`.
    pub fn insert(&mut self, point: WorldPoint) -> bool {
        if !self.seen.insert(key_of(&point)) {
            return false;
        }
        self.voxels.push(Voxel { point });
        true
    }

    /// 是否已包含该坐标?
    #[inline]
    pub fn contains(&self, point: &WorldPoint) -> bool {
        self.seen.contains(&key_of(point))
    }

    /// 体素个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    /// 是否为空?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    /// 清空.
    #[inline]
    pub fn clear(&mut self) {
        self.voxels.clear();
        self.seen.clear();
    }

    /// 按插入顺序迭代.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Voxel> {
        self.voxels.iter()
    }

    /// 扁平的 `[x, y, z, 1]` 序列.
    pub fn to_tuples(&self) -> Vec<VoxelTuple> {
        self.voxels.iter().map(Voxel::to_tuple).collect()
    }

    /// 序列化为 JSON 数组 `[[x, y, z, 1], ...]`.
    #[inline]
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

impl Extend<WorldPoint> for VoxelSet {
    fn extend<T: IntoIterator<Item = WorldPoint>>(&mut self, iter: T) {
        for p in iter {
            self.insert(p);
        }
    }
}

impl<'a> IntoIterator for &'a VoxelSet {
    type Item = &'a Voxel;
    type IntoIter = std::slice::Iter<'a, Voxel>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for VoxelSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.voxels.len()))?;
        for v in &self.voxels {
            seq.serialize_element(v)?;
        }
        seq.end()
    }
}
