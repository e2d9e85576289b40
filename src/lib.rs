#![allow(clippy::type_complexity)]
// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
pub mod app; // 播放器事件 → 检测控制
pub mod config; // 运行配置
pub mod detection; // 二维码检测会话
pub mod error; // 错误类型
pub mod frame; // 视频帧
pub mod input; // 抽帧来源
pub mod logging;
pub mod observable; // 可观察值
pub mod player; // 视频播放器
pub mod renderer; // macroquad 界面
pub mod repository; // 抽帧 + 识别
pub mod scanner; // 二维码识别

pub use crate::app::QrApp;
pub use crate::config::{PlayerArgs, PlayerConfig};
pub use crate::detection::QrDetector;
pub use crate::error::{ExtractError, PlaybackError};
pub use crate::frame::VideoFrame;
pub use crate::observable::Observable;
pub use crate::player::{PlaybackState, PlayerEvent, VideoPlayer};
pub use crate::repository::QrCodeRepository;
pub use crate::scanner::{Barcode, BarcodeScanner, QrScanner};

/// 本地时间字符串, 各字段以 `delimiter` 分隔
pub fn timestamp_string(delimiter: &str) -> String {
    let t_now = chrono::Local::now();
    let fmt = format!(
        "%Y{}%m{}%d{}%H{}%M{}%S{}%3f",
        delimiter, delimiter, delimiter, delimiter, delimiter, delimiter
    );
    t_now.format(&fmt).to_string()
}
