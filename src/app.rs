// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 应用装配 (App wiring)
//!
//! 监听播放器事件, 驱动检测器的启动/停止与加载状态,
//! 播放错误转成短暂提示 (toast)。

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use tracing::{info, warn};

use crate::config::PlayerConfig;
use crate::detection::{DetectorOptions, QrDetector};
use crate::error::PlaybackError;
use crate::frame::VideoFrame;
use crate::input::build_extractor;
use crate::player::{PlaybackOptions, PlaybackState, PlayerEvent, VideoPlayer};
use crate::repository::QrCodeRepository;
use crate::scanner::{QrScanner, ScannerOptions};

/// 短暂提示
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub message: String,
    pub expires_at: Instant,
}

impl Toast {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

pub struct QrApp {
    player: VideoPlayer,
    events: Receiver<PlayerEvent>,
    detector: QrDetector,
    toast: Option<Toast>,
    toast_duration: Duration,
    last_error: Option<PlaybackError>,
}

impl QrApp {
    /// 按配置装配播放器、抽帧器、识别器与检测器
    pub fn new(config: &PlayerConfig) -> Self {
        let (mut player, events) = VideoPlayer::new(PlaybackOptions::from(config));
        player.set_media_item(config.video_url.clone());

        let extractor = build_extractor(config, player.frame_handle());
        let scanner = Arc::new(QrScanner::new(ScannerOptions {
            max_dimension: config.scan_max_dimension,
        }));
        let repository = QrCodeRepository::new(extractor, scanner);
        let detector = QrDetector::new(
            config.video_url.clone(),
            repository,
            DetectorOptions::from(config),
        );

        Self::with_parts(player, events, detector, config.toast_duration())
    }

    pub fn with_parts(
        player: VideoPlayer,
        events: Receiver<PlayerEvent>,
        detector: QrDetector,
        toast_duration: Duration,
    ) -> Self {
        Self {
            player,
            events,
            detector,
            toast: None,
            toast_duration,
            last_error: None,
        }
    }

    /// 开始播放 (就绪后自动开始检测)
    pub fn start(&mut self) -> Result<()> {
        self.player.set_play_when_ready(true);
        self.player.prepare().context("failed to prepare player")
    }

    /// 从头重新播放; 若上次已播完, 就绪时会清空列表
    pub fn restart(&mut self) -> Result<()> {
        info!("🔁 重新播放");
        self.player.prepare().context("failed to restart player")
    }

    /// 处理所有已到达的播放器事件, 返回处理数量
    pub fn pump_events(&mut self) -> usize {
        let pending: Vec<PlayerEvent> = self.events.try_iter().collect();
        for event in &pending {
            self.handle_event(event);
        }
        pending.len()
    }

    /// 等待下一个事件 (最多 `timeout`)
    pub fn wait_event(&mut self, timeout: Duration) -> Result<Option<PlayerEvent>> {
        match self.events.recv_timeout(timeout) {
            Ok(event) => {
                self.handle_event(&event);
                Ok(Some(event))
            }
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => anyhow::bail!("player event channel closed"),
        }
    }

    pub fn handle_event(&mut self, event: &PlayerEvent) {
        match event {
            PlayerEvent::StateChanged(state) => self.on_playback_state_changed(*state),
            PlayerEvent::Error(error) => self.on_player_error(error),
        }
    }

    fn on_playback_state_changed(&mut self, state: PlaybackState) {
        match state {
            PlaybackState::Ready => {
                // 视频就绪; 事件可能滞后于播放器, 以当前状态为准
                self.detector.set_loading(false);
                if self.player.is_playing() {
                    self.detector.start_detection();
                }
            }
            PlaybackState::Idle => {
                self.detector.set_loading(false);
                self.detector.stop_detection();
            }
            PlaybackState::Ended => {
                info!("🏁 播放结束");
                self.detector.set_loading(false);
                self.detector.mark_video_ended();
                self.detector.stop_detection();
            }
            PlaybackState::Buffering => {
                self.detector.set_loading(true);
            }
        }
    }

    fn on_player_error(&mut self, error: &PlaybackError) {
        warn!("⚠️ 播放错误: {}", error);
        self.show_toast(error.user_message());
        self.last_error = Some(error.clone());
    }

    pub fn show_toast(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast {
            message: message.into(),
            expires_at: Instant::now() + self.toast_duration,
        });
    }

    /// 当前未过期的提示
    pub fn active_toast(&mut self) -> Option<&Toast> {
        let now = Instant::now();
        if self.toast.as_ref().is_some_and(|t| t.is_expired(now)) {
            self.toast = None;
        }
        self.toast.as_ref()
    }

    pub fn last_error(&self) -> Option<&PlaybackError> {
        self.last_error.as_ref()
    }

    /// 手动切换检测 (界面按键)
    pub fn toggle_detection(&mut self) {
        let status = self.detector.status();
        if status.is_detecting && !status.stop_pending {
            self.detector.stop_detection();
        } else {
            self.detector.start_detection();
        }
    }

    /// 暂停/继续播放
    pub fn toggle_pause(&mut self) {
        let play = !self.player.play_when_ready();
        self.player.set_play_when_ready(play);
        if self.player.is_playing() {
            self.detector.start_detection();
        } else if !play {
            self.detector.stop_detection();
        }
    }

    pub fn detector(&self) -> &QrDetector {
        &self.detector
    }

    pub fn player(&self) -> &VideoPlayer {
        &self.player
    }

    pub fn current_frame(&self) -> Option<VideoFrame> {
        self.player.current_frame()
    }

    /// 停止检测并释放播放器
    pub fn release(&mut self) {
        self.detector.stop_detection();
        self.player.release();
    }
}
