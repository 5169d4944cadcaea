use crate::frames::FrameSet;
use crate::region::RegionKind;
use crate::tasks::loader::PreloadReport;

/// Emitted by a loader task once its region's preload has resolved.
#[derive(Debug, Clone)]
pub struct FramesReady {
    pub region: RegionKind,
    pub frames: FrameSet,
    pub report: PreloadReport,
}

#[derive(Debug, Clone)]
pub enum ViewerEvent {
    FramesReady(FramesReady),
    Cancelled,
}
