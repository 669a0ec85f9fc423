//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx3d, VoxelTuple};
pub use crate::{ImagePoint, ScreenPoint, WorldPoint};
pub use crate::{Operation, SegmentError, SegmentResult};

pub use crate::capture::ToolState;
pub use crate::config::SegmenterConfig;
pub use crate::draw::{CommandList, DrawingSurface, Rgba};
pub use crate::export::{AnalyzeTicket, ExportPipeline, Transport};
pub use crate::hooks::{ViewerHooks, ViewerObserver};
pub use crate::raster::{PlanarityPolicy, ScanExtent};
pub use crate::readout::CoordinateReadout;
pub use crate::session::{Capabilities, SegmentationSession};
pub use crate::transform::{CoordinateTransform, SliceView};
pub use crate::volume::{SliceViewer, VolumeGeometry};
pub use crate::voxel::VoxelSet;

pub use crate::consts::color::{LASSO_FILL, PREVIEW_STROKE};
pub use crate::consts::MASK_VALUE;

#[cfg(feature = "http")]
pub use crate::ReqwestTransport;
