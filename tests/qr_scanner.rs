// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
use std::sync::Arc;

use image::{GrayImage, Luma};
use qr_video_player::error::ExtractError;
use qr_video_player::input::FrameExtractor;
use qr_video_player::scanner::{BarcodeFormat, BarcodeScanner, QrScanner, ScannerOptions};
use qr_video_player::{QrCodeRepository, VideoFrame};
use qrcode::{Color, QrCode};

/// 渲染二维码灰度图: 每个模块 `module` 像素, 四周留4个模块的空白
fn render_qr(content: &str, module: u32) -> GrayImage {
    let code = QrCode::new(content.as_bytes()).unwrap();
    let width = code.width() as u32;
    let colors = code.to_colors();
    let quiet = 4;
    let size = (width + quiet * 2) * module;

    GrayImage::from_fn(size, size, |x, y| {
        let mx = (x / module) as i64 - quiet as i64;
        let my = (y / module) as i64 - quiet as i64;
        if mx < 0 || my < 0 || mx >= width as i64 || my >= width as i64 {
            return Luma([255]);
        }
        match colors[(my as u32 * width + mx as u32) as usize] {
            Color::Dark => Luma([0]),
            Color::Light => Luma([255]),
        }
    })
}

/// 灰度图铺到一张更大的白底RGBA帧中间
fn into_frame(qr: &GrayImage, width: u32, height: u32, index: u64) -> VideoFrame {
    let ox = (width - qr.width()) / 2;
    let oy = (height - qr.height()) / 2;
    let mut rgba = vec![255u8; (width * height * 4) as usize];
    for (x, y, p) in qr.enumerate_pixels() {
        let i = (((y + oy) * width + (x + ox)) * 4) as usize;
        rgba[i] = p[0];
        rgba[i + 1] = p[0];
        rgba[i + 2] = p[0];
    }
    VideoFrame::new(rgba, width, height, index)
}

struct FixedFrame(VideoFrame);

impl FrameExtractor for FixedFrame {
    fn extract_frame(&self, _video_url: &str) -> Result<Option<VideoFrame>, ExtractError> {
        Ok(Some(self.0.clone()))
    }
}

#[test]
fn test_scanner_decodes_rendered_code() {
    let image = render_qr("https://example.com/qr", 6);
    let scanner = QrScanner::default();

    let barcodes = scanner.process(&image).unwrap();
    assert_eq!(barcodes.len(), 1);
    assert_eq!(barcodes[0].format, BarcodeFormat::QrCode);
    assert_eq!(
        barcodes[0].display_value.as_deref(),
        Some("https://example.com/qr")
    );
}

#[test]
fn test_scanner_decodes_after_downscale() {
    let image = render_qr("downscaled", 10);
    let scanner = QrScanner::new(ScannerOptions {
        max_dimension: image.width() / 2,
    });

    let barcodes = scanner.process(&image).unwrap();
    assert_eq!(barcodes.len(), 1);
    assert_eq!(barcodes[0].display_value.as_deref(), Some("downscaled"));

    // 角点换算回原图坐标
    for (x, y) in barcodes[0].corners {
        assert!(x >= 0 && x <= image.width() as i32);
        assert!(y >= 0 && y <= image.height() as i32);
    }
}

#[test]
fn test_repository_detects_code_in_frame() {
    let qr = render_qr("frame-42", 5);
    let frame = into_frame(&qr, 640, 360, 42);
    let repository = QrCodeRepository::new(
        Arc::new(FixedFrame(frame)),
        Arc::new(QrScanner::default()),
    );

    let frame = repository
        .extract_frame_from_video_url("test://video")
        .unwrap();
    assert_eq!(frame.index, 42);
    assert_eq!(repository.detect_qr_codes(&frame), vec!["frame-42".to_string()]);
}

#[test]
fn test_repository_empty_frame_has_no_codes() {
    let frame = VideoFrame::new(vec![255u8; 320 * 240 * 4], 320, 240, 0);
    let repository = QrCodeRepository::new(
        Arc::new(FixedFrame(frame.clone())),
        Arc::new(QrScanner::default()),
    );
    assert!(repository.detect_qr_codes(&frame).is_empty());
}
