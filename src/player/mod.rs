// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// 视频播放器 (Video Player)
///
/// 独立解码线程, 负责拉流解码并对外发布播放状态
/// - Decoder:      FFmpeg 拉流解码 (每次 prepare 一个新线程)
/// - DecodeFilter: 帧过滤与 YUV → RGBA 转换, 写入最新帧槽位
/// - VideoPlayer:  生命周期控制 + 状态事件 (crossbeam 通道)
pub mod decode_filter;
pub mod decoder;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

use anyhow::{bail, Context, Result};
use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, info, warn};

use crate::config::PlayerConfig;
use crate::error::PlaybackError;
use crate::frame::VideoFrame;

pub use decode_filter::DecodeFilter;
pub use decoder::Decoder;

/// 播放状态 (与常见播放引擎的四态一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Buffering,
    Ready,
    Ended,
}

/// 播放器事件 (解码线程 → 监听者)
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    StateChanged(PlaybackState),
    Error(PlaybackError),
}

/// 解码参数
#[derive(Debug, Clone)]
pub struct PlaybackOptions {
    pub scale_filter: String,
    pub realtime: bool,
}

impl From<&PlayerConfig> for PlaybackOptions {
    fn from(config: &PlayerConfig) -> Self {
        Self {
            scale_filter: config.scale_filter.clone(),
            realtime: config.realtime,
        }
    }
}

/// 播放器与解码线程共享的状态
pub struct PlayerShared {
    generation: AtomicUsize, // 解码器代数ID, 每次 prepare/release 递增
    paused: AtomicBool,
    state: Mutex<PlaybackState>,
    latest_frame: Mutex<Option<VideoFrame>>,
    events: Sender<PlayerEvent>,
}

impl PlayerShared {
    fn new(events: Sender<PlayerEvent>) -> Self {
        Self {
            generation: AtomicUsize::new(0),
            paused: AtomicBool::new(false),
            state: Mutex::new(PlaybackState::Idle),
            latest_frame: Mutex::new(None),
            events,
        }
    }

    fn state_lock(&self) -> MutexGuard<'_, PlaybackState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn frame_lock(&self) -> MutexGuard<'_, Option<VideoFrame>> {
        self.latest_frame.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_current(&self, generation: usize) -> bool {
        self.generation.load(Ordering::Acquire) == generation
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    pub fn state(&self) -> PlaybackState {
        *self.state_lock()
    }

    /// 开始新一代解码, 旧解码线程在下一帧时自行退出
    fn next_generation(&self) -> usize {
        let _state = self.state_lock();
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// 状态切换; 过期代数或状态未变化时忽略
    pub fn transition(&self, generation: usize, next: PlaybackState) {
        let mut state = self.state_lock();
        if !self.is_current(generation) || *state == next {
            return;
        }
        debug!("播放状态: {:?} → {:?}", *state, next);
        *state = next;
        let _ = self.events.send(PlayerEvent::StateChanged(next));
    }

    /// 强制回到 Idle (release 使用, 不校验代数)
    fn force_idle(&self) {
        let mut state = self.state_lock();
        if *state != PlaybackState::Idle {
            *state = PlaybackState::Idle;
            let _ = self.events.send(PlayerEvent::StateChanged(PlaybackState::Idle));
        }
    }

    /// 发布新帧; 第一帧到达时进入 Ready
    pub fn publish_frame(&self, generation: usize, frame: VideoFrame) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        *self.frame_lock() = Some(frame);
        self.transition(generation, PlaybackState::Ready);
        true
    }

    /// 上报播放错误并回到 Idle
    pub fn report_error(&self, generation: usize, error: PlaybackError) {
        if !self.is_current(generation) {
            return;
        }
        let _ = self.events.send(PlayerEvent::Error(error));
        self.transition(generation, PlaybackState::Idle);
    }

    pub fn latest_frame(&self) -> Option<VideoFrame> {
        self.frame_lock().clone()
    }

    fn clear_frame(&self) {
        *self.frame_lock() = None;
    }
}

/// 视频播放器: 持有一个 FFmpeg 解码实例
pub struct VideoPlayer {
    options: PlaybackOptions,
    media_url: Option<String>,
    shared: Arc<PlayerShared>,
    play_when_ready: bool,
    decode_thread: Option<JoinHandle<()>>,
}

impl VideoPlayer {
    /// 创建空闲播放器, 返回事件接收端 (监听者)
    pub fn new(options: PlaybackOptions) -> (Self, Receiver<PlayerEvent>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        let player = Self {
            options,
            media_url: None,
            shared: Arc::new(PlayerShared::new(tx)),
            play_when_ready: false,
            decode_thread: None,
        };
        (player, rx)
    }

    pub fn set_media_item(&mut self, url: impl Into<String>) {
        self.media_url = Some(url.into());
    }

    /// 启动解码线程 (重复调用会从头重新播放)
    pub fn prepare(&mut self) -> Result<()> {
        let Some(url) = self.media_url.clone() else {
            bail!("no media item set");
        };

        let generation = self.shared.next_generation();
        self.shared.clear_frame();
        self.shared.transition(generation, PlaybackState::Buffering);

        let shared = Arc::clone(&self.shared);
        let options = self.options.clone();
        let handle = std::thread::Builder::new()
            .name(format!("decoder-{}", generation))
            .spawn(move || {
                Decoder::new(url, generation, options, shared).run();
            })
            .context("failed to spawn decoder thread")?;

        // 旧线程不等待, 由代数ID让其自行退出
        self.decode_thread = Some(handle);
        info!("▶️ 播放器已准备 (Gen: {})", generation);
        Ok(())
    }

    pub fn set_play_when_ready(&mut self, play_when_ready: bool) {
        self.play_when_ready = play_when_ready;
        self.shared.paused.store(!play_when_ready, Ordering::Relaxed);
    }

    pub fn play_when_ready(&self) -> bool {
        self.play_when_ready
    }

    /// 正在播放 = 已就绪且未暂停
    pub fn is_playing(&self) -> bool {
        self.play_when_ready && self.shared.state() == PlaybackState::Ready
    }

    pub fn state(&self) -> PlaybackState {
        self.shared.state()
    }

    /// 当前画面
    pub fn current_frame(&self) -> Option<VideoFrame> {
        self.shared.latest_frame()
    }

    /// 当前播放位置 = 最新画面的时间戳
    pub fn position_ms(&self) -> u64 {
        self.shared.latest_frame().map_or(0, |f| f.pts_ms)
    }

    /// 可跨线程读取当前画面的句柄
    pub fn frame_handle(&self) -> FrameHandle {
        FrameHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// 测试用: 直接切换当前代的播放状态
    #[cfg(test)]
    pub(crate) fn enter_state(&self, state: PlaybackState) {
        let generation = self.shared.generation.load(Ordering::Acquire);
        self.shared.transition(generation, state);
    }

    /// 释放解码资源
    pub fn release(&mut self) {
        self.shared.next_generation();
        self.shared.force_idle();
        self.shared.clear_frame();
        if let Some(handle) = self.decode_thread.take() {
            if handle.is_finished() {
                let _ = handle.join();
            } else {
                // FFmpeg 阻塞读取无法中断, 线程在下一帧或超时后退出
                warn!("⚠️ 解码线程仍在运行, 将在下一帧时退出");
            }
        }
    }
}

impl Drop for VideoPlayer {
    fn drop(&mut self) {
        self.release();
    }
}

/// 播放器当前画面的只读句柄
#[derive(Clone)]
pub struct FrameHandle {
    shared: Arc<PlayerShared>,
}

impl FrameHandle {
    pub fn latest(&self) -> Option<VideoFrame> {
        self.shared.latest_frame()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared() -> (Arc<PlayerShared>, Receiver<PlayerEvent>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Arc::new(PlayerShared::new(tx)), rx)
    }

    #[test]
    fn test_first_frame_makes_ready() {
        let (shared, rx) = shared();
        let gen = shared.next_generation();
        shared.transition(gen, PlaybackState::Buffering);

        assert!(shared.publish_frame(gen, VideoFrame::new(vec![0; 4], 1, 1, 0)));
        assert!(shared.publish_frame(gen, VideoFrame::new(vec![0; 4], 1, 1, 1)));

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                PlayerEvent::StateChanged(PlaybackState::Buffering),
                PlayerEvent::StateChanged(PlaybackState::Ready),
            ]
        );
        assert_eq!(shared.latest_frame().map(|f| f.index), Some(1));
    }

    #[test]
    fn test_position_follows_latest_frame() {
        let (mut player, _rx) = VideoPlayer::new(PlaybackOptions {
            scale_filter: String::new(),
            realtime: true,
        });
        assert_eq!(player.position_ms(), 0);

        let gen = player.shared.next_generation();
        player
            .shared
            .publish_frame(gen, VideoFrame::new(vec![0; 4], 1, 1, 7).with_pts_ms(2300));
        assert_eq!(player.position_ms(), 2300);

        player.release();
        assert_eq!(player.position_ms(), 0);
        assert_eq!(player.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_stale_generation_is_ignored() {
        let (shared, rx) = shared();
        let old = shared.next_generation();
        let _new = shared.next_generation();

        assert!(!shared.publish_frame(old, VideoFrame::new(vec![0; 4], 1, 1, 0)));
        shared.transition(old, PlaybackState::Ended);
        shared.report_error(old, PlaybackError::classify("Connection refused"));

        assert!(rx.try_recv().is_err());
        assert!(shared.latest_frame().is_none());
        assert_eq!(shared.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_error_goes_idle() {
        let (shared, rx) = shared();
        let gen = shared.next_generation();
        shared.transition(gen, PlaybackState::Buffering);
        shared.report_error(gen, PlaybackError::classify("Server returned 403 Forbidden"));

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[1], PlayerEvent::Error(PlaybackError::Io(_))));
        assert_eq!(events[2], PlayerEvent::StateChanged(PlaybackState::Idle));
    }

    #[test]
    fn test_prepare_without_media_fails() {
        let (mut player, _rx) = VideoPlayer::new(PlaybackOptions {
            scale_filter: String::new(),
            realtime: true,
        });
        assert!(player.prepare().is_err());
        assert_eq!(player.state(), PlaybackState::Idle);
        assert!(!player.is_playing());
    }
}
