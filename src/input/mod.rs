// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// 抽帧系统 (Frame Extraction)
///
/// 为检测循环提供单帧画面
/// - PlayerFrameSource: 读取播放器当前画面
/// - SnapshotExtractor: 独立打开视频, 在指定时间点截取一帧
pub mod player_source;
pub mod snapshot;

use std::sync::Arc;

use crate::config::{FrameSourceKind, PlayerConfig};
use crate::error::ExtractError;
use crate::frame::VideoFrame;
use crate::player::FrameHandle;

pub use player_source::PlayerFrameSource;
pub use snapshot::SnapshotExtractor;

/// 抽帧接口; `Ok(None)` 表示暂时没有可用画面
pub trait FrameExtractor: Send + Sync {
    fn extract_frame(&self, video_url: &str) -> Result<Option<VideoFrame>, ExtractError>;
}

/// 按配置创建抽帧器
pub fn build_extractor(config: &PlayerConfig, player: FrameHandle) -> Arc<dyn FrameExtractor> {
    match config.frame_source {
        FrameSourceKind::Player => Arc::new(PlayerFrameSource::new(player)),
        FrameSourceKind::Snapshot => Arc::new(SnapshotExtractor::new(
            config.snapshot_at_ms,
            config.scale_filter.clone(),
        )),
    }
}
