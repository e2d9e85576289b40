// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 检测器 (Detector)
//! 职责: 定时抽帧 → 二维码识别 → 追加到可观察列表

use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info};

use super::types::{DetectionStatus, DetectorOptions};
use crate::frame::VideoFrame;
use crate::observable::Observable;
use crate::repository::QrCodeRepository;

/// 检测控制状态; 所有字段在同一把锁下修改
#[derive(Debug, Default)]
struct Control {
    detecting: bool,
    stop_pending: bool,
    video_ended: bool,
    ticket: u64,  // 每次 start/stop 递增, 用于作废挂起的停止
    session: u64, // 每启动一个工作线程递增
}

fn lock(control: &Mutex<Control>) -> MutexGuard<'_, Control> {
    control.lock().unwrap_or_else(|e| e.into_inner())
}

/// 二维码检测器
pub struct QrDetector {
    video_url: String,
    repository: QrCodeRepository,
    options: DetectorOptions,
    control: Arc<Mutex<Control>>,
    qr_codes: Observable<Vec<String>>,
    is_loading: Observable<bool>,
}

impl QrDetector {
    pub fn new(
        video_url: impl Into<String>,
        repository: QrCodeRepository,
        options: DetectorOptions,
    ) -> Self {
        Self {
            video_url: video_url.into(),
            repository,
            options,
            control: Arc::new(Mutex::new(Control::default())),
            qr_codes: Observable::default(),
            is_loading: Observable::new(true),
        }
    }

    /// 已识别的二维码列表
    pub fn qr_codes(&self) -> &Observable<Vec<String>> {
        &self.qr_codes
    }

    pub fn is_loading(&self) -> &Observable<bool> {
        &self.is_loading
    }

    pub fn set_loading(&self, loading: bool) {
        if self.is_loading.get() != loading {
            self.is_loading.set(loading);
        }
    }

    pub fn is_detecting(&self) -> bool {
        lock(&self.control).detecting
    }

    pub fn is_video_ended(&self) -> bool {
        lock(&self.control).video_ended
    }

    /// 标记播放结束, 下次启动检测时清空列表
    pub fn mark_video_ended(&self) {
        lock(&self.control).video_ended = true;
    }

    pub fn status(&self) -> DetectionStatus {
        let control = lock(&self.control);
        DetectionStatus {
            is_detecting: control.detecting,
            stop_pending: control.stop_pending,
            is_loading: self.is_loading.get(),
            is_video_ended: control.video_ended,
            session: control.session,
            code_count: self.qr_codes.with(Vec::len),
        }
    }

    /// 启动检测; 已在检测中时不做任何事并返回 false
    ///
    /// 停止请求尚未生效时再次启动会取消该停止, 沿用当前工作线程。
    pub fn start_detection(&self) -> bool {
        let mut control = lock(&self.control);
        if control.detecting && !control.stop_pending {
            debug!("检测已在运行 (会话 #{})", control.session);
            return false;
        }

        control.ticket += 1;
        control.stop_pending = false;

        if control.video_ended {
            info!("🔄 视频曾播放结束, 清空二维码列表");
            self.qr_codes.set(Vec::new());
            control.video_ended = false;
        }

        if control.detecting {
            info!("↩️ 取消挂起的停止, 继续检测会话 #{}", control.session);
            return true;
        }

        control.detecting = true;
        control.session += 1;
        let session = control.session;
        drop(control);

        let worker = DetectionWorker {
            session,
            video_url: self.video_url.clone(),
            repository: self.repository.clone(),
            control: Arc::clone(&self.control),
            qr_codes: self.qr_codes.clone(),
            poll_interval: self.options.poll_interval,
        };

        let spawned = thread::Builder::new()
            .name(format!("qr-detect-{}", session))
            .spawn(move || worker.run());

        if let Err(e) = spawned {
            error!("❌ 检测线程启动失败: {}", e);
            let mut control = lock(&self.control);
            if control.session == session {
                control.detecting = false;
            }
            return false;
        }
        true
    }

    /// 请求停止; 延迟 `stop_delay` 后才真正清除检测标志
    pub fn stop_detection(&self) {
        let mut control = lock(&self.control);
        if !control.detecting {
            return;
        }
        control.ticket += 1;
        control.stop_pending = true;
        let ticket = control.ticket;
        drop(control);

        let shared = Arc::clone(&self.control);
        let delay = self.options.stop_delay;
        let spawned = thread::Builder::new()
            .name("qr-detect-stop".to_string())
            .spawn(move || apply_stop(&shared, ticket, delay));

        if let Err(e) = spawned {
            error!("❌ 停止线程启动失败, 立即停止: {}", e);
            apply_stop(&self.control, ticket, Duration::ZERO);
        }
    }
}

impl Drop for QrDetector {
    fn drop(&mut self) {
        let mut control = lock(&self.control);
        control.detecting = false;
        control.stop_pending = false;
    }
}

/// 延迟后清除检测标志; 期间有新的 start/stop 时作废
fn apply_stop(control: &Mutex<Control>, ticket: u64, delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
    let mut control = lock(control);
    if control.ticket == ticket {
        control.detecting = false;
        control.stop_pending = false;
        info!("⏹️ 检测已停止 (会话 #{})", control.session);
    }
}

/// 检测工作线程
struct DetectionWorker {
    session: u64,
    video_url: String,
    repository: QrCodeRepository,
    control: Arc<Mutex<Control>>,
    qr_codes: Observable<Vec<String>>,
    poll_interval: Duration,
}

impl DetectionWorker {
    fn is_active(&self) -> bool {
        let control = lock(&self.control);
        control.detecting && control.session == self.session
    }

    /// 追加识别结果; 会话已结束时丢弃并返回 false
    ///
    /// 检查与追加在同一把锁下完成, 与 `start_detection` 的清空互斥。
    fn append(&self, frame: &VideoFrame, detected: Vec<String>) -> bool {
        let control = lock(&self.control);
        if !(control.detecting && control.session == self.session) {
            debug!(
                "会话 #{} 已结束, 丢弃帧 #{} 的 {} 个结果",
                self.session,
                frame.index,
                detected.len()
            );
            return false;
        }
        info!(
            "🎯 帧 #{} 识别到 {} 个二维码: {:?}",
            frame.index,
            detected.len(),
            detected
        );
        self.qr_codes.update(|codes| codes.extend(detected));
        true
    }

    fn run(self) {
        info!("🔍 检测会话 #{} 启动", self.session);
        let mut scanned = 0u64;

        while self.is_active() {
            if let Some(frame) = self.repository.extract_frame_from_video_url(&self.video_url) {
                scanned += 1;
                let detected = self.repository.detect_qr_codes(&frame);
                if !detected.is_empty() && !self.append(&frame, detected) {
                    break;
                }
            }

            thread::sleep(self.poll_interval);
        }

        info!("🔚 检测会话 #{} 结束, 共扫描 {} 帧", self.session, scanned);
    }
}
