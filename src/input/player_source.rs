// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 播放器画面抽帧

use super::FrameExtractor;
use crate::error::ExtractError;
use crate::frame::VideoFrame;
use crate::player::FrameHandle;

/// 直接返回播放器最近解码的一帧
pub struct PlayerFrameSource {
    player: FrameHandle,
}

impl PlayerFrameSource {
    pub fn new(player: FrameHandle) -> Self {
        Self { player }
    }
}

impl FrameExtractor for PlayerFrameSource {
    // 播放器只播放一个源, 地址参数仅用于接口一致
    fn extract_frame(&self, _video_url: &str) -> Result<Option<VideoFrame>, ExtractError> {
        Ok(self.player.latest())
    }
}
