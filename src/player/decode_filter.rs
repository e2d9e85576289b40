// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// FFmpeg解码过滤器模块
/// FFmpeg decode filter module
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ez_ffmpeg::filter::frame_filter::FrameFilter;
use ez_ffmpeg::filter::frame_filter_context::FrameFilterContext;
use ez_ffmpeg::{AVMediaType, Frame};
use tracing::{debug, warn};

use super::PlayerShared;
use crate::frame::{yuv420p_to_rgba, VideoFrame};

/// 允许的最大分辨率
const MAX_DIMENSION: u32 = 4096;

/// 暂停时的轮询间隔
const PAUSE_POLL: Duration = Duration::from_millis(20);

/// 帧被丢弃的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    Empty,
    Resolution(u32, u32),
    DecodeError(i32),
    NullPlane,
    Stride(usize, usize),
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::Empty => write!(f, "空帧/损坏帧"),
            DropReason::Resolution(w, h) => write!(f, "非法分辨率 {}x{}", w, h),
            DropReason::DecodeError(flags) => write!(f, "解码错误标志=0x{:02x}", flags),
            DropReason::NullPlane => write!(f, "YUV指针为空"),
            DropReason::Stride(y, uv) => write!(f, "步长异常 y_stride={} uv_stride={}", y, uv),
        }
    }
}

/// YUV420P 帧 → RGBA 数据 (宽, 高, 像素)
pub(crate) fn frame_to_rgba(frame: &Frame) -> Result<(u32, u32, Vec<u8>), DropReason> {
    unsafe {
        // 基本检查：空帧或损坏帧
        if frame.as_ptr().is_null() || frame.is_empty() || frame.is_corrupt() {
            return Err(DropReason::Empty);
        }

        let raw = &*frame.as_ptr();
        let w = raw.width as u32;
        let h = raw.height as u32;

        // 检查分辨率合法性
        if raw.width <= 0 || raw.height <= 0 || w > MAX_DIMENSION || h > MAX_DIMENSION {
            return Err(DropReason::Resolution(w, h));
        }

        // 只丢弃严重错误的帧 (缺少参考帧、无效比特流)
        if raw.decode_error_flags & 0x03 != 0 {
            return Err(DropReason::DecodeError(raw.decode_error_flags));
        }

        let (y_plane, u_plane, v_plane) = (raw.data[0], raw.data[1], raw.data[2]);
        if y_plane.is_null() || u_plane.is_null() || v_plane.is_null() {
            return Err(DropReason::NullPlane);
        }

        let y_stride = raw.linesize[0];
        let uv_stride = raw.linesize[1];
        if y_stride < raw.width || uv_stride < (raw.width + 1) / 2 {
            return Err(DropReason::Stride(y_stride.max(0) as usize, uv_stride.max(0) as usize));
        }

        let (width, height) = (w as usize, h as usize);
        let (y_stride, uv_stride) = (y_stride as usize, uv_stride as usize);
        let chroma_rows = height.div_ceil(2);

        let y = std::slice::from_raw_parts(y_plane, y_stride * height);
        let u = std::slice::from_raw_parts(u_plane, uv_stride * chroma_rows);
        let v = std::slice::from_raw_parts(v_plane, uv_stride * chroma_rows);

        let mut rgba = vec![255u8; width * height * 4];
        yuv420p_to_rgba(y, u, v, y_stride, uv_stride, width, height, &mut rgba);
        Ok((w, h, rgba))
    }
}

/// 帧显示时间 (毫秒); 无时间戳或时间基无效时返回 None
pub(crate) fn frame_pts_ms(frame: &Frame) -> Option<u64> {
    unsafe {
        if frame.as_ptr().is_null() {
            return None;
        }
        let raw = &*frame.as_ptr();
        let pts = if raw.pts != i64::MIN {
            raw.pts
        } else {
            raw.best_effort_timestamp
        };
        let tb = raw.time_base;
        if pts == i64::MIN || pts < 0 || tb.num <= 0 || tb.den <= 0 {
            return None;
        }
        Some((pts as i128 * 1000 * tb.num as i128 / tb.den as i128) as u64)
    }
}

/// FFmpeg解码过滤器: 视频流 → RGBA帧 → 播放器最新帧槽位
pub struct DecodeFilter {
    pub count: usize,
    pub last: Instant,
    pub current_fps: f64,
    pub dropped_frames: usize, // 丢弃的帧数
    pub total_frames: usize,   // 总帧数
    pub generation: usize,     // 解码器代数ID
    frame_index: u64,
    last_pts_ms: u64,
    shared: Arc<PlayerShared>,
}

impl DecodeFilter {
    pub fn new(generation: usize, shared: Arc<PlayerShared>) -> Self {
        Self {
            count: 0,
            last: Instant::now(),
            current_fps: 0.0,
            dropped_frames: 0,
            total_frames: 0,
            generation,
            frame_index: 0,
            last_pts_ms: 0,
            shared,
        }
    }

    /// 每秒打印一次解码统计
    fn update_stats(&mut self) {
        let elapsed = self.last.elapsed().as_secs_f64();
        if elapsed < 1.0 {
            return;
        }
        self.current_fps = self.count as f64 / elapsed;
        let drop_rate = self.dropped_frames as f64 / self.total_frames.max(1) as f64 * 100.0;
        debug!(
            "📺 解码统计: 解码{}帧 | 实际{:.1}fps | 总帧{} | 丢弃{} ({:.1}%)",
            self.count, self.current_fps, self.total_frames, self.dropped_frames, drop_rate
        );
        self.last = Instant::now();
        self.count = 0;
    }
}

impl FrameFilter for DecodeFilter {
    fn media_type(&self) -> AVMediaType {
        AVMediaType::AVMEDIA_TYPE_VIDEO
    }

    fn init(&mut self, _ctx: &FrameFilterContext) -> Result<(), String> {
        debug!("✅ 解码线程启动 (Gen: {})", self.generation);
        Ok(())
    }

    fn filter_frame(
        &mut self,
        frame: Frame,
        _ctx: &FrameFilterContext,
    ) -> Result<Option<Frame>, String> {
        // 暂停: 阻塞管线直到恢复或被释放
        while self.shared.is_paused() && self.shared.is_current(self.generation) {
            std::thread::sleep(PAUSE_POLL);
        }

        // 检查解码器代数ID,如果已过期则停止解码
        if !self.shared.is_current(self.generation) {
            debug!("🛑 解码器已过期 (Gen: {}), 停止解码", self.generation);
            return Err("player released".to_string());
        }

        self.total_frames += 1;
        let (width, height, rgba) = match frame_to_rgba(&frame) {
            Ok(converted) => converted,
            Err(reason) => {
                self.dropped_frames += 1;
                if self.total_frames <= 10 {
                    warn!("⚠️ 丢弃帧 #{}: {}", self.total_frames, reason);
                }
                return Ok(None);
            }
        };

        self.count += 1;
        self.update_stats();

        if let Some(pts) = frame_pts_ms(&frame) {
            self.last_pts_ms = pts;
        }
        let decoded =
            VideoFrame::new(rgba, width, height, self.frame_index).with_pts_ms(self.last_pts_ms);
        self.frame_index += 1;
        self.shared.publish_frame(self.generation, decoded);

        Ok(Some(frame))
    }

    fn uninit(&mut self, _ctx: &FrameFilterContext) {
        debug!(
            "✅ 解码线程退出 (Gen: {}, 总帧{}, 丢弃{})",
            self.generation, self.total_frames, self.dropped_frames
        );
    }
}
