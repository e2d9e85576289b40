// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// 检测系统数据结构定义
/// Data structures for QR detection
use std::time::Duration;

use crate::config::PlayerConfig;

/// 检测循环参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorOptions {
    /// 两次抽帧之间的间隔
    pub poll_interval: Duration,
    /// 停止请求生效前的延迟
    pub stop_delay: Duration,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            stop_delay: Duration::from_millis(100),
        }
    }
}

impl From<&PlayerConfig> for DetectorOptions {
    fn from(config: &PlayerConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            stop_delay: config.stop_delay(),
        }
    }
}

/// 检测状态快照 (检测模块 → 界面)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectionStatus {
    pub is_detecting: bool,
    pub stop_pending: bool,
    pub is_loading: bool,
    pub is_video_ended: bool,
    pub session: u64, // 检测会话序号
    pub code_count: usize,
}
