// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 运行配置 - 命令行参数 + JSON配置文件
//!
//! 优先级: 命令行 > 配置文件 > 默认值

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// 默认播放的示例视频
pub const DEFAULT_VIDEO_URL: &str =
    "https://videocdn.cdnpk.net/videos/bee37727-87f6-47f2-a2ac-47d741c1ccbc/horizontal/previews/videvo_watermarked/large.mp4";

const CONFIG_DIR_NAME: &str = "qr-video-player";
const CONFIG_FILE_NAME: &str = "config.json";

/// 抽帧来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FrameSourceKind {
    /// 播放器当前画面
    Player,
    /// 独立打开视频, 在固定时间点截帧
    Snapshot,
}

/// 公共命令行参数
#[derive(clap::Args, Debug, Clone, Default)]
pub struct PlayerArgs {
    /// 视频地址 (URL或本地文件)
    #[arg(short, long)]
    pub url: Option<String>,

    /// 配置文件路径 (默认: <config_dir>/qr-video-player/config.json)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 抽帧来源: player 或 snapshot
    #[arg(long, value_enum)]
    pub frame_source: Option<FrameSourceKind>,

    /// snapshot 模式的截帧时间点 (毫秒)
    #[arg(long)]
    pub snapshot_at_ms: Option<u64>,

    /// 轮询间隔 (毫秒)
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// FFmpeg 缩放滤镜, 如 "scale=1280:-2"
    #[arg(long)]
    pub scale: Option<String>,

    /// 日志级别 (trace/debug/info/warn/error), RUST_LOG 优先
    #[arg(long)]
    pub log_level: Option<String>,
}

/// 播放与检测参数配置
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    // === 播放 ===
    pub video_url: String,
    pub scale_filter: String, // 解码后缩放
    pub realtime: bool,       // 按原速读取 (readrate 1.0)

    // === 检测 ===
    pub poll_interval_ms: u64, // 两次抽帧之间的间隔
    pub stop_delay_ms: u64,    // 停止检测前的延迟
    pub frame_source: FrameSourceKind,
    pub snapshot_at_ms: u64,
    pub scan_max_dimension: u32, // 识别前的最长边限制, 0=不缩放

    // === 界面 ===
    pub player_height: f32,
    pub window_width: i32,
    pub window_height: i32,
    pub toast_duration_ms: u64,

    pub log_level: String,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            video_url: DEFAULT_VIDEO_URL.to_string(),
            scale_filter: "scale=1280:-2".to_string(),
            realtime: true,

            poll_interval_ms: 100,
            stop_delay_ms: 100,
            frame_source: FrameSourceKind::Player,
            snapshot_at_ms: 0,
            scan_max_dimension: 1280,

            player_height: 240.0,
            window_width: 480,
            window_height: 800,
            toast_duration_ms: 3500,

            log_level: "info".to_string(),
        }
    }
}

impl PlayerConfig {
    /// 默认配置文件位置
    pub fn default_path() -> PathBuf {
        match dirs::config_dir() {
            Some(dir) => dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME),
            None => PathBuf::from(CONFIG_FILE_NAME),
        }
    }

    /// 从JSON文件加载配置; 文件不存在时写入默认配置, 解析失败时回退默认值
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(config) => {
                    info!("✅ 配置已从 {} 加载", path.display());
                    config
                }
                Err(e) => {
                    warn!("⚠️  配置文件解析失败: {}, 使用默认值", e);
                    Self::default()
                }
            },
            Err(_) => {
                info!("📝 配置文件不存在,创建默认配置: {}", path.display());
                let config = Self::default();
                if let Err(e) = config.save(path) {
                    warn!("⚠️  默认配置写入失败: {:#}", e);
                }
                config
            }
        }
    }

    /// 保存配置到JSON文件
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("创建配置目录失败: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("序列化配置失败")?;
        fs::write(path, json).with_context(|| format!("保存配置失败: {}", path.display()))?;
        info!("💾 配置已保存到 {}", path.display());
        Ok(())
    }

    /// 加载配置文件并叠加命令行参数
    pub fn resolve(args: &PlayerArgs) -> Self {
        let path = args.config.clone().unwrap_or_else(Self::default_path);
        let mut config = Self::load(&path);
        config.apply_args(args);
        config
    }

    /// 命令行参数覆盖
    pub fn apply_args(&mut self, args: &PlayerArgs) {
        if let Some(url) = &args.url {
            self.video_url = url.clone();
        }
        if let Some(kind) = args.frame_source {
            self.frame_source = kind;
        }
        if let Some(at) = args.snapshot_at_ms {
            self.snapshot_at_ms = at;
        }
        if let Some(ms) = args.interval_ms {
            self.poll_interval_ms = ms;
        }
        if let Some(scale) = &args.scale {
            self.scale_filter = scale.clone();
        }
        if let Some(level) = &args.log_level {
            self.log_level = level.clone();
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn stop_delay(&self) -> Duration {
        Duration::from_millis(self.stop_delay_ms)
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration_ms)
    }

    /// 打印当前配置
    pub fn print_summary(&self) {
        info!("🎛️  当前配置:");
        info!("  视频地址: {}", self.video_url);
        info!("  抽帧来源: {:?}", self.frame_source);
        info!("  轮询间隔: {}ms", self.poll_interval_ms);
        info!("  停止延迟: {}ms", self.stop_delay_ms);
        info!("  缩放滤镜: {}", self.scale_filter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = PlayerConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_millis(100));
        assert_eq!(config.stop_delay(), Duration::from_millis(100));
        assert_eq!(config.frame_source, FrameSourceKind::Player);
        assert_eq!(config.video_url, DEFAULT_VIDEO_URL);
    }

    #[test]
    fn test_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = PlayerConfig::load(&path);
        assert_eq!(config, PlayerConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "poll_interval_ms": 250, "frame_source": "snapshot" }"#).unwrap();

        let config = PlayerConfig::load(&path);
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.frame_source, FrameSourceKind::Snapshot);
        assert_eq!(config.stop_delay_ms, 100);
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert_eq!(PlayerConfig::load(&path), PlayerConfig::default());
    }

    #[test]
    fn test_args_override_file() {
        let mut config = PlayerConfig::default();
        let args = PlayerArgs {
            url: Some("file.mp4".into()),
            interval_ms: Some(40),
            frame_source: Some(FrameSourceKind::Snapshot),
            ..Default::default()
        };
        config.apply_args(&args);
        assert_eq!(config.video_url, "file.mp4");
        assert_eq!(config.poll_interval_ms, 40);
        assert_eq!(config.frame_source, FrameSourceKind::Snapshot);
        assert_eq!(config.scale_filter, "scale=1280:-2");
    }
}
