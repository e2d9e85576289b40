// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// 条码识别统一接口与实现
///
/// ## BarcodeScanner Trait
/// 输入单张灰度图, 输出识别到的条码集合
///
/// ## 实现
/// - **QrScanner**: 基于 rqrr 的二维码识别 (`qr.rs`)
///
/// ## 使用示例
/// ```rust,no_run
/// use qr_video_player::scanner::{BarcodeScanner, QrScanner, ScannerOptions};
///
/// # fn main() -> anyhow::Result<()> {
/// let scanner = QrScanner::new(ScannerOptions::default());
/// let image = image::open("frame.png")?.to_luma8();
/// for code in scanner.process(&image)? {
///     println!("{:?}", code.display_value);
/// }
/// # Ok(())
/// # }
/// ```
pub mod qr;

use anyhow::Result;
use image::GrayImage;

pub use qr::{QrScanner, ScannerOptions};

/// 条码格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarcodeFormat {
    QrCode,
}

/// 识别出的单个条码
#[derive(Debug, Clone, PartialEq)]
pub struct Barcode {
    pub format: BarcodeFormat,
    /// 可显示的文本内容; 定位成功但解码失败时为 None
    pub display_value: Option<String>,
    /// 四个角点 (原图坐标)
    pub corners: [(i32, i32); 4],
}

/// 条码识别客户端
pub trait BarcodeScanner: Send + Sync {
    fn process(&self, image: &GrayImage) -> Result<Vec<Barcode>>;
}
