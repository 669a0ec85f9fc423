//! 程序运行函数.

use crate::result::{Outcome, ReplayResult};
use crate::script::{Event, Script};
use lasso_berry::download::Materialized;
use lasso_berry::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// 回放所需的全部状态.
struct Replayer {
    viewer: SliceViewer,
    session: Rc<RefCell<SegmentationSession>>,
    hooks: ViewerHooks,
    surface: CommandList,
    pipeline: Option<ExportPipeline<ReqwestTransport>>,
    csrf_token: Option<String>,
    clock: Instant,
}

impl Replayer {
    fn new(config: SegmenterConfig) -> SegmentResult<Self> {
        let pipeline = match config.base_url.as_deref() {
            Some(url) => Some(ExportPipeline::new(ReqwestTransport::new(url)?, &config)),
            None => {
                log::info!("No base_url configured, export and analyze will only count voxels");
                None
            }
        };
        let csrf_token = utils::csrf_token_from_env(&config.csrf_cookie);
        let session = SegmentationSession::try_start(config, Capabilities::ALL)?;
        let session = Rc::new(RefCell::new(session));
        let mut hooks = ViewerHooks::new();
        hooks.subscribe(&session);

        Ok(Self {
            viewer: SliceViewer::new(VolumeGeometry::mni152_2mm().clone()),
            session,
            hooks,
            surface: CommandList::new(),
            pipeline,
            csrf_token,
            clock: Instant::now(),
        })
    }

    /// 重新计算体素. 不在 `await` 期间持有会话的借用.
    fn voxels(&self) -> SegmentResult<VoxelSet> {
        Ok(self.session.borrow_mut().compute_voxels(&self.viewer)?.clone())
    }

    fn save(&self, file: Materialized) -> SegmentResult<Outcome> {
        let shape = match file.inspect() {
            Ok(summary) => Some(summary.shape),
            Err(e) => {
                log::warn!("Downloaded file does not look like a NIfTI volume: {e}");
                None
            }
        };
        let config = self.session.borrow().config().clone();
        let path = match &config.download_dir {
            Some(dir) => file.save_to(dir)?,
            None => file.save_default()?,
        };
        Ok(Outcome::Saved {
            path: path.display().to_string(),
            bytes: file.len(),
            shape,
        })
    }

    async fn step(&mut self, event: &Event) -> SegmentResult<Option<Outcome>> {
        match *event {
            Event::Enable => {
                self.session.borrow_mut().enable_tool();
            }
            Event::Disable => {
                self.session.borrow_mut().disable_tool();
            }
            Event::Toggle => {
                let state = self.session.borrow_mut().toggle_tool();
                log::debug!("Tool is now {state:?}");
            }
            Event::Down { x, y } => self.session.borrow_mut().pointer_down(ScreenPoint::new(x, y)),
            Event::Move { x, y } => self
                .session
                .borrow_mut()
                .pointer_move(ScreenPoint::new(x, y), &mut self.surface),
            Event::Up => {
                let index = self
                    .session
                    .borrow_mut()
                    .pointer_up(&self.viewer, &mut self.surface);
                self.hooks.frame_rendered(&self.viewer, &mut self.surface);
                if let Some(index) = index {
                    let session = self.session.borrow();
                    let points = session.lassos().get(index).map_or(0, |l| l.len());
                    return Ok(Some(Outcome::Lasso { index, points }));
                }
            }
            Event::Slice { z } => {
                if self.viewer.set_slice(z) {
                    self.hooks
                        .slice_changed(&self.viewer, self.viewer.cursor(), self.clock);
                    self.hooks.frame_rendered(&self.viewer, &mut self.surface);
                } else {
                    log::warn!("Slice {z} is outside the volume");
                }
            }
            Event::Clear => self.session.borrow_mut().clear(),
            Event::Voxels => return Ok(Some(Outcome::Voxels(self.voxels()?.len()))),
            Event::Export => {
                let voxels = self.voxels()?;
                let Some(pipeline) = &self.pipeline else {
                    return Ok(Some(Outcome::Voxels(voxels.len())));
                };
                let file = pipeline.materialize(&voxels).await?;
                return self.save(file).map(Some);
            }
            Event::Analyze => {
                let voxels = self.voxels()?;
                let Some(pipeline) = &self.pipeline else {
                    return Ok(Some(Outcome::Voxels(voxels.len())));
                };
                let token = self.csrf_token.as_deref().unwrap_or_default();
                if token.is_empty() {
                    log::warn!("No CSRF token found, the request will likely be rejected");
                }
                let ticket = pipeline.analyze(&voxels, token).await?;
                let progress = self.session.borrow().config().progress_path.clone();
                return Ok(Some(Outcome::Progress(ticket.progress_url(&progress))));
            }
            Event::Wait { ms } => self.clock += Duration::from_millis(ms),
        }
        Ok(None)
    }
}

/// 实际运行.
pub async fn run(script: &Script, config: SegmenterConfig) -> SegmentResult<ReplayResult> {
    let mut replayer = Replayer::new(config)?;
    let mut result = ReplayResult::default();

    println!("Replaying {} event(s)...", script.events.len());
    for (i, event) in script.events.iter().enumerate() {
        match replayer.step(event).await {
            Ok(Some(outcome)) => result.push(i, outcome),
            Ok(None) => {}
            Err(e) => {
                log::warn!("Event #{i} ({event:?}) failed: {e}");
                result.push(i, Outcome::Failed(e.user_message()));
            }
        }
        let readout = replayer.session.borrow_mut().poll_readout(replayer.clock);
        if let Some(readout) = readout {
            result.push(i, Outcome::Readout(readout));
        }
    }
    log::debug!("{} draw command(s) recorded", replayer.surface.len());
    Ok(result)
}
