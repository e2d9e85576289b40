// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// 检测系统 (Detection System)
///
/// 独立工作线程, 周期性抽帧识别二维码
/// - QrDetector: 检测会话控制 + 可观察结果列表
pub mod detector;
pub mod types;

pub use detector::QrDetector;
pub use types::{DetectionStatus, DetectorOptions};
