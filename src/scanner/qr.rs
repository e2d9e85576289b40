// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! rqrr 二维码识别
//! 职责: 灰度图 → (可选缩放) → 定位网格 → 解码

use anyhow::{Context, Result};
use fast_image_resize as fr;
use image::GrayImage;
use tracing::debug;

use super::{Barcode, BarcodeFormat, BarcodeScanner};

/// 识别参数
#[derive(Debug, Clone)]
pub struct ScannerOptions {
    /// 最长边超过该值时先缩小, 0 表示不缩放
    pub max_dimension: u32,
}

impl Default for ScannerOptions {
    fn default() -> Self {
        Self {
            max_dimension: 1280,
        }
    }
}

/// 二维码识别器
#[derive(Debug, Clone, Default)]
pub struct QrScanner {
    options: ScannerOptions,
}

impl QrScanner {
    pub fn new(options: ScannerOptions) -> Self {
        Self { options }
    }

    /// 按最长边限制缩小, 返回 (图像, 缩放系数)
    fn fit(&self, image: &GrayImage) -> Result<(GrayImage, f32)> {
        let (w, h) = image.dimensions();
        let max = self.options.max_dimension;
        let longest = w.max(h);
        if max == 0 || longest <= max {
            return Ok((image.clone(), 1.0));
        }

        let scale = max as f32 / longest as f32;
        let dst_w = ((w as f32 * scale).round() as u32).max(1);
        let dst_h = ((h as f32 * scale).round() as u32).max(1);

        let src = fr::images::Image::from_vec_u8(w, h, image.as_raw().clone(), fr::PixelType::U8)
            .context("创建缩放源图像失败")?;
        let mut dst = fr::images::Image::new(dst_w, dst_h, fr::PixelType::U8);

        // 双线性插值
        let mut resizer = fr::Resizer::new();
        resizer
            .resize(
                &src,
                &mut dst,
                &fr::ResizeOptions::new()
                    .resize_alg(fr::ResizeAlg::Convolution(fr::FilterType::Bilinear)),
            )
            .context("缩放失败")?;

        let resized = GrayImage::from_raw(dst_w, dst_h, dst.buffer().to_vec())
            .context("缩放结果尺寸不匹配")?;
        Ok((resized, 1.0 / scale))
    }
}

impl BarcodeScanner for QrScanner {
    fn process(&self, image: &GrayImage) -> Result<Vec<Barcode>> {
        let (image, inv_scale) = self.fit(image)?;
        let (w, h) = image.dimensions();

        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            w as usize,
            h as usize,
            |x, y| image.get_pixel(x as u32, y as u32)[0],
        );
        let grids = prepared.detect_grids();

        let barcodes = grids
            .into_iter()
            .map(|grid| {
                let corners = grid.bounds.map(|p| {
                    (
                        (p.x as f32 * inv_scale).round() as i32,
                        (p.y as f32 * inv_scale).round() as i32,
                    )
                });
                let display_value = match grid.decode() {
                    Ok((_meta, content)) => Some(content),
                    Err(e) => {
                        debug!("二维码解码失败: {:?}", e);
                        None
                    }
                };
                Barcode {
                    format: BarcodeFormat::QrCode,
                    display_value,
                    corners,
                }
            })
            .collect();

        Ok(barcodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_image_has_no_codes() {
        let scanner = QrScanner::default();
        let image = GrayImage::from_pixel(64, 48, image::Luma([255]));
        assert!(scanner.process(&image).unwrap().is_empty());
    }

    #[test]
    fn test_fit_downscales_longest_side() {
        let scanner = QrScanner::new(ScannerOptions { max_dimension: 100 });
        let image = GrayImage::from_pixel(400, 200, image::Luma([128]));
        let (resized, inv) = scanner.fit(&image).unwrap();
        assert_eq!(resized.dimensions(), (100, 50));
        assert!((inv - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_fit_keeps_small_images() {
        let scanner = QrScanner::new(ScannerOptions { max_dimension: 0 });
        let image = GrayImage::from_pixel(4000, 10, image::Luma([0]));
        let (resized, inv) = scanner.fit(&image).unwrap();
        assert_eq!(resized.dimensions(), (4000, 10));
        assert_eq!(inv, 1.0);
    }
}
