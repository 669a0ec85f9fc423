//! 分割会话: 持有全部可变状态, 由调用者拥有.

use std::time::Instant;

use crate::capture::{StrokeCapture, ToolState};
use crate::config::SegmenterConfig;
use crate::consts::color::LASSO_FILL;
use crate::download::Materialized;
use crate::draw::DrawingSurface;
use crate::export::{AnalyzeTicket, ExportPipeline, Transport};
use crate::hooks::ViewerObserver;
use crate::lasso::LassoRegistry;
use crate::raster::Rasterizer;
use crate::readout::{CoordinateReadout, DelayedSlot};
use crate::transform::{CoordinateTransform, SliceView};
use crate::voxel::VoxelSet;
use crate::world::WorldLassoRegistry;
use crate::{ImagePoint, ScreenPoint, SegmentError, SegmentResult};

/// 宿主在启动时能够提供的能力.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// 查看器本身.
    pub viewer: bool,
    /// 可绘制的 2D 表面.
    pub drawing_surface: bool,
    /// 坐标变换.
    pub transform: bool,
}

impl Capabilities {
    /// 全部就绪.
    pub const ALL: Self = Self {
        viewer: true,
        drawing_surface: true,
        transform: true,
    };

    /// 缺失的能力名.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            (self.viewer, "viewer"),
            (self.drawing_surface, "drawing surface"),
            (self.transform, "coordinate transform"),
        ]
        .into_iter()
        .filter_map(|(present, name)| (!present).then_some(name))
        .collect()
    }
}

/// 分割会话.
///
/// 套索、世界坐标套索和体素集三者只在这里保存. 后两者是派生状态,
/// 每次请求体素时重新计算.
#[derive(Debug)]
pub struct SegmentationSession {
    config: SegmenterConfig,
    capture: StrokeCapture,
    lassos: LassoRegistry,
    world: WorldLassoRegistry,
    voxels: VoxelSet,
    rasterizer: Rasterizer,
    readout: DelayedSlot<CoordinateReadout>,
}

impl SegmentationSession {
    /// 检查能力后创建. 缺少任何一项时返回 [`SegmentError::Initialization`].
    pub fn try_start(config: SegmenterConfig, caps: Capabilities) -> SegmentResult<Self> {
        Self::try_start_with_view(config, caps, SliceView::Axial)
    }

    /// 同 [`Self::try_start`], 在给定视图上绘制.
    pub fn try_start_with_view(
        config: SegmenterConfig,
        caps: Capabilities,
        view: SliceView,
    ) -> SegmentResult<Self> {
        let missing = caps.missing();
        if !missing.is_empty() {
            return Err(SegmentError::Initialization(format!(
                "missing {}",
                missing.join(", ")
            )));
        }
        Ok(Self {
            capture: StrokeCapture::new(view),
            lassos: LassoRegistry::new(),
            world: WorldLassoRegistry::default(),
            voxels: VoxelSet::new(),
            rasterizer: Rasterizer::new(config.scan_extent, config.planarity),
            readout: DelayedSlot::new(config.readout_debounce()),
            config,
        })
    }

    /// 同 [`Self::try_start`], 但失败时只记录日志, 整个功能被禁用.
    pub fn start(config: SegmenterConfig, caps: Capabilities) -> Option<Self> {
        match Self::try_start(config, caps) {
            Ok(session) => Some(session),
            Err(e) => {
                log::error!("Segmentation disabled: {e}");
                None
            }
        }
    }

    /// 配置.
    #[inline]
    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// 工具状态.
    #[inline]
    pub fn tool_state(&self) -> ToolState {
        self.capture.state()
    }

    /// 开启工具.
    #[inline]
    pub fn enable_tool(&mut self) -> bool {
        self.capture.enable()
    }

    /// 关闭工具, 丢弃未完成的笔画.
    #[inline]
    pub fn disable_tool(&mut self) -> bool {
        self.capture.disable()
    }

    /// 切换工具开关, 返回新的状态.
    pub fn toggle_tool(&mut self) -> ToolState {
        if self.capture.state().is_on() {
            self.capture.disable();
        } else {
            self.capture.enable();
        }
        self.capture.state()
    }

    /// 按下.
    #[inline]
    pub fn pointer_down(&mut self, point: ScreenPoint) {
        self.capture.pointer_down(point);
    }

    /// 移动.
    #[inline]
    pub fn pointer_move(&mut self, point: ScreenPoint, surface: &mut dyn DrawingSurface) {
        self.capture.pointer_move(point, surface);
    }

    /// 抬起. 生成套索时返回其序号.
    pub fn pointer_up(
        &mut self,
        transform: &dyn CoordinateTransform,
        surface: &mut dyn DrawingSurface,
    ) -> Option<usize> {
        let lasso = self.capture.pointer_up(transform, surface)?;
        if lasso.is_degenerate() {
            log::warn!(
                "Lasso with {} point(s) on slice {} encloses nothing",
                lasso.len(),
                transform.current_slice()
            );
        }
        let index = self.lassos.append(lasso);
        log::debug!("Lasso #{index} stored ({} in total)", self.lassos.len());
        Some(index)
    }

    /// 已保存的套索.
    #[inline]
    pub fn lassos(&self) -> &LassoRegistry {
        &self.lassos
    }

    /// 上次计算得到的世界坐标套索.
    #[inline]
    pub fn world_lassos(&self) -> &WorldLassoRegistry {
        &self.world
    }

    /// 上次计算得到的体素集.
    #[inline]
    pub fn voxels(&self) -> &VoxelSet {
        &self.voxels
    }

    /// 清空套索及其派生状态.
    pub fn clear(&mut self) {
        self.lassos.clear();
        self.world.clear();
        self.voxels.clear();
        log::debug!("Selection cleared");
    }

    /// 重新投影全部套索, 栅格化并去重.
    ///
    /// 失败时体素集被清空, 不会保留上一次的结果.
    pub fn compute_voxels(&mut self, transform: &dyn CoordinateTransform) -> SegmentResult<&VoxelSet> {
        self.voxels.clear();
        self.world.reproject(&self.lassos, transform);
        let interiors = self.rasterizer.rasterize_all(self.world.as_slice())?;
        self.voxels = VoxelSet::aggregate(interiors);
        log::info!(
            "{} lasso(s) -> {} unique voxel(s)",
            self.lassos.len(),
            self.voxels.len()
        );
        Ok(&self.voxels)
    }

    /// 重新计算体素并导出.
    pub async fn export<T: Transport>(
        &mut self,
        transform: &dyn CoordinateTransform,
        pipeline: &ExportPipeline<T>,
    ) -> SegmentResult<Materialized> {
        let voxels = self.compute_voxels(transform)?;
        pipeline.materialize(voxels).await
    }

    /// 重新计算体素并提交分析.
    pub async fn analyze<T: Transport>(
        &mut self,
        transform: &dyn CoordinateTransform,
        pipeline: &ExportPipeline<T>,
        csrf_token: &str,
    ) -> SegmentResult<AnalyzeTicket> {
        let voxels = self.compute_voxels(transform)?;
        pipeline.analyze(voxels, csrf_token).await
    }

    /// 重绘当前切片上的全部套索. 可见点少于 2 个的套索被跳过.
    pub fn redraw(&self, transform: &dyn CoordinateTransform, surface: &mut dyn DrawingSurface) {
        for lasso in &self.lassos {
            let outline: Vec<_> = lasso
                .points()
                .iter()
                .filter(|p| transform.intersects_slice(p))
                .map(|&p| transform.image_to_screen(p))
                .collect();
            if outline.len() > 1 {
                surface.fill_polygon(&outline, LASSO_FILL);
            }
        }
    }

    /// 在 `now` 记录光标位置, 延迟后由 [`Self::poll_readout`] 取出.
    pub fn schedule_readout(&mut self, transform: &dyn CoordinateTransform, cursor: ImagePoint, now: Instant) {
        let readout = CoordinateReadout::from(transform.image_to_world(cursor));
        self.readout.schedule(readout, now);
    }

    /// 取出已到期的坐标读数.
    #[inline]
    pub fn poll_readout(&mut self, now: Instant) -> Option<CoordinateReadout> {
        self.readout.poll(now)
    }
}

impl ViewerObserver for SegmentationSession {
    fn on_frame_rendered(&mut self, viewer: &dyn CoordinateTransform, surface: &mut dyn DrawingSurface) {
        self.redraw(viewer, surface);
    }

    fn on_slice_changed(&mut self, viewer: &dyn CoordinateTransform, cursor: ImagePoint, now: Instant) {
        self.schedule_readout(viewer, cursor, now);
    }
}

#[cfg(test)]
mod tests {
    use super::{Capabilities, SegmentationSession};
    use crate::capture::tests::UnitViewer;
    use crate::capture::ToolState;
    use crate::config::SegmenterConfig;
    use crate::draw::{CommandList, DrawCommand};
    use crate::export::tests::Recorder;
    use crate::export::ExportPipeline;
    use crate::hooks::ViewerHooks;
    use crate::raster::{InvalidSelection, PlanarityPolicy};
    use crate::readout::CoordinateReadout;
    use crate::transform::{CoordinateTransform, SliceView};
    use crate::{ImagePoint, Operation, ScreenPoint, SegmentError, WorldPoint};
    use futures::executor::block_on;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::{Duration, Instant};

    fn session() -> SegmentationSession {
        SegmentationSession::try_start(SegmenterConfig::default(), Capabilities::ALL).unwrap()
    }

    fn draw(s: &mut SegmentationSession, viewer: &UnitViewer, xy: &[(f64, f64)]) -> Option<usize> {
        let mut surface = CommandList::new();
        let (first, rest) = xy.split_first()?;
        s.pointer_down(ScreenPoint::new(first.0, first.1));
        for &(x, y) in rest {
            s.pointer_move(ScreenPoint::new(x, y), &mut surface);
        }
        s.pointer_up(viewer, &mut surface)
    }

    const SQUARE: [(f64, f64); 4] = [(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)];

    #[test]
    fn test_missing_capability() {
        let caps = Capabilities {
            drawing_surface: false,
            ..Capabilities::ALL
        };
        assert_eq!(caps.missing(), vec!["drawing surface"]);
        let e = SegmentationSession::try_start(SegmenterConfig::default(), caps).unwrap_err();
        assert!(matches!(e, SegmentError::Initialization(_)));
        assert!(SegmentationSession::start(SegmenterConfig::default(), Capabilities::default()).is_none());
    }

    #[test]
    fn test_tool_toggle() {
        let mut s = session();
        let viewer = UnitViewer { slice: 5, size: 20 };
        assert_eq!(s.tool_state(), ToolState::Off);
        assert_eq!(draw(&mut s, &viewer, &SQUARE), None);

        assert_eq!(s.toggle_tool(), ToolState::Idle);
        assert_eq!(draw(&mut s, &viewer, &SQUARE), Some(0));
        assert_eq!(s.toggle_tool(), ToolState::Off);
        assert!(!s.disable_tool());
        assert_eq!(s.lassos().len(), 1);
    }

    #[test]
    fn test_square_on_slice_five() {
        let _ = simple_logger::init_with_level(log::Level::Debug);
        let mut s = session();
        let viewer = UnitViewer { slice: 5, size: 20 };
        s.enable_tool();
        draw(&mut s, &viewer, &SQUARE);

        let voxels = s.compute_voxels(&viewer).unwrap();
        assert_eq!(voxels.len(), 121);
        assert!(voxels.iter().all(|v| v.point().z == 5.0));
        assert_eq!(s.world_lassos().len(), 1);
    }

    #[test]
    fn test_same_square_twice() {
        let mut s = session();
        let viewer = UnitViewer { slice: 5, size: 20 };
        s.enable_tool();
        draw(&mut s, &viewer, &SQUARE);
        draw(&mut s, &viewer, &SQUARE);
        assert_eq!(s.lassos().len(), 2);
        assert_eq!(s.compute_voxels(&viewer).unwrap().len(), 121);
    }

    /// 世界 z 随 x 变化的查看器.
    struct Tilted(UnitViewer);

    impl CoordinateTransform for Tilted {
        fn screen_to_image_x(&self, x: f64, view: SliceView) -> i32 {
            self.0.screen_to_image_x(x, view)
        }

        fn screen_to_image_y(&self, y: f64, view: SliceView) -> i32 {
            self.0.screen_to_image_y(y, view)
        }

        fn current_slice(&self) -> i32 {
            self.0.current_slice()
        }

        fn image_to_world(&self, p: ImagePoint) -> WorldPoint {
            let w = self.0.image_to_world(p);
            WorldPoint::new(w.x, w.y, w.z + w.x / 10.0)
        }

        fn world_to_screen(&self, p: WorldPoint) -> ScreenPoint {
            self.0.world_to_screen(p)
        }

        fn intersects_slice(&self, p: &ImagePoint) -> bool {
            self.0.intersects_slice(p)
        }
    }

    #[test]
    fn test_failed_recompute_drops_old_voxels() {
        let config = SegmenterConfig {
            planarity: PlanarityPolicy::Reject,
            ..Default::default()
        };
        let mut s = SegmentationSession::try_start(config, Capabilities::ALL).unwrap();
        let viewer = UnitViewer { slice: 5, size: 20 };
        s.enable_tool();
        draw(&mut s, &viewer, &SQUARE);
        assert_eq!(s.compute_voxels(&viewer).unwrap().len(), 121);

        draw(&mut s, &viewer, &[(2.0, 2.0), (2.0, 6.0), (6.0, 6.0)]);
        let e = s.compute_voxels(&Tilted(viewer)).unwrap_err();
        assert!(matches!(
            e,
            SegmentError::InvalidSelection(InvalidSelection::NonPlanar { .. })
        ));
        assert!(s.voxels().is_empty());
        assert_eq!(s.world_lassos().len(), 2);

        // 换回共面的查看器即可恢复.
        let viewer = UnitViewer { slice: 5, size: 20 };
        assert_eq!(s.compute_voxels(&viewer).unwrap().len(), 121);
    }

    #[test]
    fn test_degenerate_lasso_contributes_nothing() {
        let mut s = session();
        let viewer = UnitViewer { slice: 0, size: 20 };
        s.enable_tool();
        // 只有一个点落在体数据内.
        draw(&mut s, &viewer, &[(3.0, 3.0), (-5.0, 3.0), (3.0, 50.0)]);
        assert!(s.lassos().get(0).unwrap().is_degenerate());
        assert!(s.compute_voxels(&viewer).unwrap().is_empty());
    }

    #[test]
    fn test_clear_then_export() {
        let mut s = session();
        let viewer = UnitViewer { slice: 5, size: 20 };
        s.enable_tool();
        draw(&mut s, &viewer, &SQUARE);
        s.compute_voxels(&viewer).unwrap();
        s.clear();
        assert!(s.lassos().is_empty());
        assert!(s.world_lassos().is_empty());
        assert!(s.voxels().is_empty());

        let pipeline = ExportPipeline::new(Recorder::default(), s.config());
        let e = block_on(s.export(&viewer, &pipeline)).unwrap_err();
        assert!(matches!(e, SegmentError::Precondition(Operation::Export)));
        let e = block_on(s.analyze(&viewer, &pipeline, "tok")).unwrap_err();
        assert!(matches!(e, SegmentError::Precondition(Operation::Analyze)));
        assert!(pipeline.transport().requests.borrow().is_empty());
    }

    #[test]
    fn test_export_sends_aggregated_voxels() {
        let mut s = session();
        let viewer = UnitViewer { slice: 2, size: 20 };
        s.enable_tool();
        draw(&mut s, &viewer, &[(0.0, 0.0), (0.0, 2.0), (2.0, 2.0), (2.0, 0.0)]);
        draw(&mut s, &viewer, &[(1.0, 1.0), (1.0, 3.0), (3.0, 3.0), (3.0, 1.0)]);

        let pipeline = ExportPipeline::new(
            Recorder::default()
                .reply(200, b"\x1f\x8b")
                .reply(200, br#"{"task_id": "t-1"}"#),
            s.config(),
        );
        let out = block_on(s.export(&viewer, &pipeline)).unwrap();
        assert_eq!(out.bytes(), b"\x1f\x8b");
        // 9 + 9 - 4 个重叠点.
        assert_eq!(s.voxels().len(), 14);

        let ticket = block_on(s.analyze(&viewer, &pipeline, "tok")).unwrap();
        assert_eq!(ticket.task_id, "t-1");

        let reqs = pipeline.transport().requests.borrow();
        assert_eq!(reqs.len(), 2);
        let sent: Vec<[f64; 4]> = serde_json::from_slice(&reqs[0].body).unwrap();
        assert_eq!(sent, s.voxels().to_tuples());
        assert_eq!(reqs[0].body, reqs[1].body);
    }

    #[test]
    fn test_redraw_current_slice_only() {
        let mut s = session();
        let mut viewer = UnitViewer { slice: 5, size: 20 };
        s.enable_tool();
        draw(&mut s, &viewer, &SQUARE);
        draw(&mut s, &viewer, &[(1.0, 1.0)]);

        let mut surface = CommandList::new();
        s.redraw(&viewer, &mut surface);
        assert_eq!(surface.fill_count(), 1);
        let DrawCommand::Fill { points, .. } = &surface.commands()[0] else {
            panic!("expected a fill");
        };
        assert_eq!(points.len(), 4);

        viewer.slice = 6;
        let mut surface = CommandList::new();
        s.redraw(&viewer, &mut surface);
        assert!(surface.is_empty());
    }

    #[test]
    fn test_observer_hooks() {
        let viewer = UnitViewer { slice: 5, size: 20 };
        let s = Rc::new(RefCell::new(session()));
        let mut hooks = ViewerHooks::new();
        hooks.subscribe(&s);

        s.borrow_mut().enable_tool();
        draw(&mut s.borrow_mut(), &viewer, &SQUARE);

        let mut surface = CommandList::new();
        hooks.frame_rendered(&viewer, &mut surface);
        assert_eq!(surface.fill_count(), 1);

        let t0 = Instant::now();
        hooks.slice_changed(&viewer, ImagePoint::new(1, 2, 5), t0);
        hooks.slice_changed(&viewer, ImagePoint::new(3, 3, 5), t0 + Duration::from_millis(40));
        assert_eq!(s.borrow_mut().poll_readout(t0 + Duration::from_millis(100)), None);
        assert_eq!(
            s.borrow_mut().poll_readout(t0 + Duration::from_millis(140)),
            Some(CoordinateReadout { x: 4, y: 4, z: 6 })
        );
    }
}
