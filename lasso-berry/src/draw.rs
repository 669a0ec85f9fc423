//! 绘制表面能力.
//!
//! 引擎只通过 [`DrawingSurface`] 输出两类反馈: 绘制中的实时笔画, 以及套索完成后的填充多边形.

use crate::ScreenPoint;

/// 带透明度的颜色. `a` 取值 `[0.0, 1.0]`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Rgba {
    /// 红.
    pub r: u8,
    /// 绿.
    pub g: u8,
    /// 蓝.
    pub b: u8,
    /// 不透明度.
    pub a: f32,
}

impl Rgba {
    /// 直接初始化.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// 完全不透明的颜色.
    #[inline]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 1.0)
    }
}

/// 宿主提供的 2D 绘制上下文.
pub trait DrawingSurface {
    /// 以 `color` 描出一条折线 (不闭合).
    fn stroke_path(&mut self, points: &[ScreenPoint], color: Rgba);

    /// 以 `color` 填充一个闭合多边形.
    fn fill_polygon(&mut self, points: &[ScreenPoint], color: Rgba);
}

/// 一条被记录下来的绘制指令.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// 折线.
    Stroke {
        /// 顶点.
        points: Vec<ScreenPoint>,
        /// 颜色.
        color: Rgba,
    },

    /// 填充多边形.
    Fill {
        /// 顶点.
        points: Vec<ScreenPoint>,
        /// 颜色.
        color: Rgba,
    },
}

impl DrawCommand {
    /// 是否是填充指令?
    #[inline]
    pub fn is_fill(&self) -> bool {
        matches!(self, Self::Fill { .. })
    }

    /// 指令的顶点.
    #[inline]
    pub fn points(&self) -> &[ScreenPoint] {
        match self {
            Self::Stroke { points, .. } | Self::Fill { points, .. } => points,
        }
    }
}

/// 只记录指令、不做任何绘制的表面. 宿主可以在自己的渲染周期内回放这些指令.
#[derive(Clone, Debug, Default)]
pub struct CommandList {
    commands: Vec<DrawCommand>,
}

impl CommandList {
    /// 空列表.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 已记录的全部指令.
    #[inline]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// 已记录的填充指令个数.
    #[inline]
    pub fn fill_count(&self) -> usize {
        self.commands.iter().filter(|c| c.is_fill()).count()
    }

    /// 指令总数.
    #[inline]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// 是否没有任何指令?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// 取出并清空全部指令.
    #[inline]
    pub fn drain(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl DrawingSurface for CommandList {
    fn stroke_path(&mut self, points: &[ScreenPoint], color: Rgba) {
        self.commands.push(DrawCommand::Stroke {
            points: points.to_vec(),
            color,
        });
    }

    fn fill_polygon(&mut self, points: &[ScreenPoint], color: Rgba) {
        self.commands.push(DrawCommand::Fill {
            points: points.to_vec(),
            color,
        });
    }
}
