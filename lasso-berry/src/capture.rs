//! 屏幕笔画采集.
//!
//! 状态机 `Off -> Idle -> Drawing -> Idle`. 抬笔时将缓冲的屏幕点投影到图像空间,
//! 只保留位于当前切片上的点, 形成一个套索.

use std::collections::HashSet;

use crate::consts::color::{LASSO_FILL, PREVIEW_STROKE};
use crate::draw::DrawingSurface;
use crate::lasso::Lasso;
use crate::transform::{CoordinateTransform, SliceView};
use crate::{ImagePoint, ScreenPoint};

/// 套索工具状态.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ToolState {
    /// 工具关闭, 不响应指针事件.
    Off,

    /// 工具开启, 等待按下.
    Idle,

    /// 正在绘制.
    Drawing,
}

impl ToolState {
    /// 工具是否开启?
    #[inline]
    pub fn is_on(&self) -> bool {
        !matches!(self, Self::Off)
    }
}

/// 单个绘制视图上的笔画采集器.
#[derive(Debug)]
pub struct StrokeCapture {
    view: SliceView,
    state: ToolState,
    /// 当前笔画的屏幕点. 只在 `Drawing` 状态下非空.
    buffer: Vec<ScreenPoint>,
}

impl Default for StrokeCapture {
    fn default() -> Self {
        Self::new(SliceView::Axial)
    }
}

impl StrokeCapture {
    /// 在 `view` 上创建采集器, 初始为关闭状态.
    pub fn new(view: SliceView) -> Self {
        Self {
            view,
            state: ToolState::Off,
            buffer: vec![],
        }
    }

    /// 当前状态.
    #[inline]
    pub fn state(&self) -> ToolState {
        self.state
    }

    /// 绘制所用的切片视图.
    #[inline]
    pub fn view(&self) -> SliceView {
        self.view
    }

    /// 当前笔画已缓冲的点.
    #[inline]
    pub fn buffered(&self) -> &[ScreenPoint] {
        &self.buffer
    }

    /// 开启工具. 如果状态发生了变化则返回 `true`.
    pub fn enable(&mut self) -> bool {
        if self.state.is_on() {
            return false;
        }
        self.state = ToolState::Idle;
        true
    }

    /// 关闭工具并丢弃未完成的笔画. 如果状态发生了变化则返回 `true`.
    pub fn disable(&mut self) -> bool {
        if !self.state.is_on() {
            return false;
        }
        if !self.buffer.is_empty() {
            log::debug!("Discarding {} buffered stroke points", self.buffer.len());
        }
        self.buffer.clear();
        self.state = ToolState::Off;
        true
    }

    /// 按下. 开启状态下开始一条新笔画.
    pub fn pointer_down(&mut self, point: ScreenPoint) {
        if !self.state.is_on() {
            return;
        }
        self.buffer.clear();
        self.buffer.push(point);
        self.state = ToolState::Drawing;
    }

    /// 移动. 绘制状态下追加点, 并以未过滤的全部缓冲点渲染实时预览.
    pub fn pointer_move(&mut self, point: ScreenPoint, surface: &mut dyn DrawingSurface) {
        if self.state != ToolState::Drawing {
            return;
        }
        self.buffer.push(point);
        surface.stroke_path(&self.buffer, PREVIEW_STROKE);
    }

    /// 抬起. 绘制状态下结束笔画并返回新套索; 其它状态返回 `None`.
    ///
    /// 每个缓冲点被投影到图像空间 (z 取当前切片), 仅保留满足切片判定的点;
    /// 与已保留点完全相同的图像点被跳过. 保留点不足 2 个时仍会生成一个 (退化的) 套索.
    pub fn pointer_up(
        &mut self,
        transform: &dyn CoordinateTransform,
        surface: &mut dyn DrawingSurface,
    ) -> Option<Lasso> {
        if self.state != ToolState::Drawing {
            return None;
        }
        self.state = ToolState::Idle;
        let stroke = std::mem::take(&mut self.buffer);

        let mut seen = HashSet::<ImagePoint>::with_capacity(stroke.len());
        let mut kept = Vec::with_capacity(stroke.len());
        let mut outline = Vec::with_capacity(stroke.len());
        for p in stroke.iter().copied() {
            let image = transform.screen_to_image(p, self.view);
            if transform.intersects_slice(&image) && seen.insert(image) {
                kept.push(image);
                outline.push(p);
            }
        }

        if !outline.is_empty() {
            surface.fill_polygon(&outline, LASSO_FILL);
        }
        log::debug!(
            "Stroke released: {} of {} points kept on slice {}",
            kept.len(),
            stroke.len(),
            transform.current_slice()
        );
        Some(Lasso::new(kept))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{StrokeCapture, ToolState};
    use crate::draw::{CommandList, DrawCommand};
    use crate::transform::{CoordinateTransform, SliceView};
    use crate::{ImagePoint, ScreenPoint, WorldPoint};

    /// 1 像素 = 1 体素, 世界坐标 = 图像索引. 切片范围为 `[0, size)`.
    pub(crate) struct UnitViewer {
        pub slice: i32,
        pub size: i32,
    }

    impl CoordinateTransform for UnitViewer {
        fn screen_to_image_x(&self, x: f64, _: SliceView) -> i32 {
            x.floor() as i32
        }

        fn screen_to_image_y(&self, y: f64, _: SliceView) -> i32 {
            y.floor() as i32
        }

        fn current_slice(&self) -> i32 {
            self.slice
        }

        fn image_to_world(&self, p: ImagePoint) -> WorldPoint {
            WorldPoint::new(p.x as f64, p.y as f64, p.z as f64)
        }

        fn world_to_screen(&self, p: WorldPoint) -> ScreenPoint {
            ScreenPoint::new(p.x, p.y)
        }

        fn intersects_slice(&self, p: &ImagePoint) -> bool {
            let r = 0..self.size;
            p.z == self.slice && r.contains(&p.x) && r.contains(&p.y)
        }
    }

    fn sp(x: f64, y: f64) -> ScreenPoint {
        ScreenPoint::new(x, y)
    }

    #[test]
    fn test_state_transitions() {
        let mut c = StrokeCapture::default();
        assert_eq!(c.state(), ToolState::Off);

        // 关闭时不响应
        c.pointer_down(sp(1.0, 1.0));
        assert_eq!(c.state(), ToolState::Off);

        assert!(c.enable());
        assert!(!c.enable());
        assert_eq!(c.state(), ToolState::Idle);

        c.pointer_down(sp(1.0, 1.0));
        assert_eq!(c.state(), ToolState::Drawing);

        assert!(c.disable());
        assert_eq!(c.state(), ToolState::Off);
        assert!(c.buffered().is_empty());
    }

    #[test]
    fn test_preview_is_unfiltered() {
        let viewer = UnitViewer { slice: 0, size: 4 };
        let mut c = StrokeCapture::default();
        let mut surface = CommandList::new();
        c.enable();
        c.pointer_down(sp(1.0, 1.0));
        c.pointer_move(sp(100.0, 100.0), &mut surface);

        let [DrawCommand::Stroke { points, .. }] = surface.commands() else {
            panic!("expected exactly one preview stroke");
        };
        assert_eq!(points.len(), 2);

        let lasso = c.pointer_up(&viewer, &mut surface).unwrap();
        // (100, 100) 不在切片上.
        assert_eq!(lasso.points(), [ImagePoint::new(1, 1, 0)]);
        assert_eq!(c.state(), ToolState::Idle);
    }

    #[test]
    fn test_release_filters_and_dedups() {
        let viewer = UnitViewer { slice: 7, size: 20 };
        let mut c = StrokeCapture::default();
        let mut surface = CommandList::new();
        c.enable();
        c.pointer_down(sp(2.2, 2.7));
        for p in [sp(2.9, 2.1), sp(10.0, 2.0), sp(-1.0, 5.0), sp(10.5, 10.5), sp(2.0, 10.0)] {
            c.pointer_move(p, &mut surface);
        }
        let lasso = c.pointer_up(&viewer, &mut surface).unwrap();
        assert_eq!(
            lasso.points(),
            [
                ImagePoint::new(2, 2, 7),
                ImagePoint::new(10, 2, 7),
                ImagePoint::new(10, 10, 7),
                ImagePoint::new(2, 10, 7),
            ]
        );
        assert_eq!(surface.fill_count(), 1);
    }

    #[test]
    fn test_release_off_slice_is_degenerate() {
        let viewer = UnitViewer { slice: 0, size: 4 };
        let mut c = StrokeCapture::default();
        let mut surface = CommandList::new();
        c.enable();
        c.pointer_down(sp(50.0, 50.0));
        let lasso = c.pointer_up(&viewer, &mut surface).unwrap();
        assert!(lasso.is_empty());
        assert_eq!(surface.fill_count(), 0);

        // 空闲状态下抬起不产生套索.
        assert!(c.pointer_up(&viewer, &mut surface).is_none());
    }
}
