// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 二维码仓库 (QR code repository)
//! 职责: 抽帧 + 识别, 错误在此层记录并吞掉

use std::sync::Arc;

use tracing::{error, warn};

use crate::frame::VideoFrame;
use crate::input::FrameExtractor;
use crate::scanner::BarcodeScanner;

#[derive(Clone)]
pub struct QrCodeRepository {
    extractor: Arc<dyn FrameExtractor>,
    scanner: Arc<dyn BarcodeScanner>,
}

impl QrCodeRepository {
    pub fn new(extractor: Arc<dyn FrameExtractor>, scanner: Arc<dyn BarcodeScanner>) -> Self {
        Self { extractor, scanner }
    }

    /// 从视频地址取一帧; 地址无效或解码失败时记录日志并返回 None
    pub fn extract_frame_from_video_url(&self, video_url: &str) -> Option<VideoFrame> {
        match self.extractor.extract_frame(video_url) {
            Ok(frame) => frame,
            Err(e) => {
                error!("❌ 抽帧失败: {}", e);
                None
            }
        }
    }

    /// 识别帧内二维码, 返回可显示的文本
    pub fn detect_qr_codes(&self, frame: &VideoFrame) -> Vec<String> {
        let image = frame.to_luma();
        match self.scanner.process(&image) {
            Ok(barcodes) => barcodes
                .into_iter()
                .filter_map(|barcode| barcode.display_value)
                .collect(),
            Err(e) => {
                warn!("⚠️ 二维码识别失败 (帧 #{}): {:#}", frame.index, e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractError;
    use crate::scanner::{Barcode, BarcodeFormat};
    use image::GrayImage;

    struct FailingExtractor;

    impl FrameExtractor for FailingExtractor {
        fn extract_frame(&self, video_url: &str) -> Result<Option<VideoFrame>, ExtractError> {
            Err(ExtractError::InvalidSource {
                url: video_url.to_string(),
                reason: "bad url".into(),
            })
        }
    }

    struct FixedScanner(Vec<Option<&'static str>>);

    impl BarcodeScanner for FixedScanner {
        fn process(&self, _image: &GrayImage) -> anyhow::Result<Vec<Barcode>> {
            Ok(self
                .0
                .iter()
                .map(|v| Barcode {
                    format: BarcodeFormat::QrCode,
                    display_value: v.map(str::to_string),
                    corners: [(0, 0); 4],
                })
                .collect())
        }
    }

    struct BrokenScanner;

    impl BarcodeScanner for BrokenScanner {
        fn process(&self, _image: &GrayImage) -> anyhow::Result<Vec<Barcode>> {
            anyhow::bail!("recognizer unavailable")
        }
    }

    fn frame() -> VideoFrame {
        VideoFrame::new(vec![255; 4 * 4], 2, 2, 3)
    }

    #[test]
    fn test_invalid_source_yields_nothing() {
        let repo = QrCodeRepository::new(Arc::new(FailingExtractor), Arc::new(BrokenScanner));
        assert!(repo.extract_frame_from_video_url("not a url").is_none());
    }

    #[test]
    fn test_values_without_display_text_are_skipped() {
        let scanner = FixedScanner(vec![Some("a"), None, Some("b")]);
        let repo = QrCodeRepository::new(Arc::new(FailingExtractor), Arc::new(scanner));
        assert_eq!(repo.detect_qr_codes(&frame()), vec!["a", "b"]);
    }

    #[test]
    fn test_scanner_error_yields_empty() {
        let repo = QrCodeRepository::new(Arc::new(FailingExtractor), Arc::new(BrokenScanner));
        assert!(repo.detect_qr_codes(&frame()).is_empty());
    }
}
