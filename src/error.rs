// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 错误类型 (Error types)
//!
//! 播放错误按原因粗分为三类, 每类对应一条面向用户的提示。

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// 域名解析失败 → 视为无网络
static NO_NETWORK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(failed to resolve hostname|name or service not known|temporary failure in name resolution|nodename nor servname|no address associated with hostname|could not resolve host|network is unreachable)",
    )
    .expect("no-network pattern is valid")
});

/// 其他I/O类失败 (连接/超时/HTTP/文件)
static IO_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(input/output error|i/o error|connection (refused|reset|timed out)|timed out|server returned|http error|no such file or directory|broken pipe|end of file|protocol not found)",
    )
    .expect("io pattern is valid")
});

/// 播放错误 (Playback error)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("no network connection: {0}")]
    NoNetwork(String),
    #[error("i/o failure: {0}")]
    Io(String),
    #[error("unknown playback failure: {0}")]
    Unknown(String),
}

impl PlaybackError {
    /// 根据播放引擎的错误文本分类
    pub fn classify(message: &str) -> Self {
        let message = message.trim().to_string();
        if NO_NETWORK_PATTERN.is_match(&message) {
            PlaybackError::NoNetwork(message)
        } else if IO_PATTERN.is_match(&message) {
            PlaybackError::Io(message)
        } else {
            PlaybackError::Unknown(message)
        }
    }

    /// 面向用户的短提示 (toast)
    pub fn user_message(&self) -> &'static str {
        match self {
            PlaybackError::NoNetwork(_) => "Network error: No internet connection.",
            PlaybackError::Io(_) => "Network error",
            PlaybackError::Unknown(_) => "An unknown error occurred.",
        }
    }
}

/// 解码管线失败的阶段
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// 打开输入或构建滤镜图失败
    #[error("构建失败: {0}")]
    Build(String),
    #[error("启动失败: {0}")]
    Start(String),
    /// 运行中中断 (含过滤器主动中止)
    #[error("解码中断: {0}")]
    Run(String),
}

impl PipelineError {
    /// 引擎原始错误文本
    pub fn message(&self) -> &str {
        match self {
            PipelineError::Build(m) | PipelineError::Start(m) | PipelineError::Run(m) => m,
        }
    }
}

/// 抽帧错误 (Frame extraction error)
#[derive(Debug, Error)]
pub enum ExtractError {
    /// 视频地址无法打开
    #[error("invalid video source {url}: {reason}")]
    InvalidSource { url: String, reason: String },
    /// 解码过程失败
    #[error("failed to decode frame from {url}: {reason}")]
    Decode { url: String, reason: String },
}
