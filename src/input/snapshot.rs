// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 时间点截帧 - 每次调用独立打开视频, 取指定时间点的第一帧后立即中止管线

use std::sync::{Arc, Mutex};

use ez_ffmpeg::filter::frame_filter::FrameFilter;
use ez_ffmpeg::filter::frame_filter_context::FrameFilterContext;
use ez_ffmpeg::{AVMediaType, Frame};
use tracing::{debug, warn};

use super::FrameExtractor;
use crate::error::{ExtractError, PipelineError};
use crate::frame::VideoFrame;
use crate::player::decode_filter::{frame_pts_ms, frame_to_rgba};
use crate::player::decoder::{open_input, run_pipeline};

/// 截帧完成后用于中止管线的标记
const CAPTURED: &str = "snapshot captured";

type Slot = Arc<Mutex<Option<VideoFrame>>>;

/// 抓取第一帧可用画面
struct SnapshotFilter {
    slot: Slot,
}

impl FrameFilter for SnapshotFilter {
    fn media_type(&self) -> AVMediaType {
        AVMediaType::AVMEDIA_TYPE_VIDEO
    }

    fn filter_frame(
        &mut self,
        frame: Frame,
        _ctx: &FrameFilterContext,
    ) -> Result<Option<Frame>, String> {
        match frame_to_rgba(&frame) {
            Ok((width, height, rgba)) => {
                let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
                let pts = frame_pts_ms(&frame).unwrap_or(0);
                *slot = Some(VideoFrame::new(rgba, width, height, 0).with_pts_ms(pts));
                Err(CAPTURED.to_string())
            }
            Err(reason) => {
                debug!("截帧跳过: {}", reason);
                Ok(None)
            }
        }
    }
}

/// 指定时间点截帧器
pub struct SnapshotExtractor {
    at_ms: u64,
    scale_filter: String,
}

impl SnapshotExtractor {
    pub fn new(at_ms: u64, scale_filter: String) -> Self {
        Self {
            at_ms,
            scale_filter,
        }
    }
}

impl FrameExtractor for SnapshotExtractor {
    fn extract_frame(&self, video_url: &str) -> Result<Option<VideoFrame>, ExtractError> {
        if video_url.trim().is_empty() {
            return Err(ExtractError::InvalidSource {
                url: video_url.to_string(),
                reason: "empty url".to_string(),
            });
        }

        let slot: Slot = Arc::new(Mutex::new(None));
        let filter = SnapshotFilter {
            slot: Arc::clone(&slot),
        };
        let start_us = (self.at_ms as i64).saturating_mul(1000);
        let input = open_input(video_url, Some(start_us), false);
        let result = run_pipeline(input, filter, &self.scale_filter);

        let captured = slot.lock().unwrap_or_else(|e| e.into_inner()).take();
        match (captured, result) {
            (Some(frame), _) => Ok(Some(frame)),
            (None, Ok(())) => {
                warn!("⚠️ {} 在 {}ms 之后没有可用画面", video_url, self.at_ms);
                Ok(None)
            }
            (None, Err(e)) => Err(extract_error(video_url, e)),
        }
    }
}

/// 打不开的输入视为无效地址, 其余为解码失败
fn extract_error(url: &str, error: PipelineError) -> ExtractError {
    let url = url.to_string();
    let reason = error.to_string();
    match error {
        PipelineError::Build(_) => ExtractError::InvalidSource { url, reason },
        PipelineError::Start(_) | PipelineError::Run(_) => ExtractError::Decode { url, reason },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_failure_is_invalid_source() {
        let err = extract_error("bad://url", PipelineError::Build("Protocol not found".into()));
        assert!(matches!(err, ExtractError::InvalidSource { ref url, .. } if url == "bad://url"));
        assert!(err.to_string().contains("Protocol not found"));
    }

    #[test]
    fn test_runtime_failures_are_decode_errors() {
        for error in [
            PipelineError::Start("no decoder".into()),
            PipelineError::Run("Invalid data found".into()),
        ] {
            assert!(matches!(
                extract_error("clip.mp4", error),
                ExtractError::Decode { .. }
            ));
        }
    }

    #[test]
    fn test_empty_url_rejected_without_decoding() {
        let extractor = SnapshotExtractor::new(0, String::new());
        assert!(matches!(
            extractor.extract_frame("  "),
            Err(ExtractError::InvalidSource { .. })
        ));
    }
}
