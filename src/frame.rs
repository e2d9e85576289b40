// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 视频帧 (Video frame)
//!
//! 解码线程产出的RGBA帧, 供渲染与二维码识别共享。

use std::sync::Arc;

use image::{GrayImage, Luma};

/// 已解码帧 (解码线程 → 渲染线程 / 检测线程)
#[derive(Clone, Debug)]
pub struct VideoFrame {
    pub rgba_data: Arc<Vec<u8>>, // 使用Arc共享数据,避免复制
    pub width: u32,
    pub height: u32,
    pub index: u64, // 帧序号
    pub pts_ms: u64, // 显示时间戳 (毫秒)
}

impl VideoFrame {
    pub fn new(rgba_data: Vec<u8>, width: u32, height: u32, index: u64) -> Self {
        Self {
            rgba_data: Arc::new(rgba_data),
            width,
            height,
            index,
            pts_ms: 0,
        }
    }

    pub fn with_pts_ms(mut self, pts_ms: u64) -> Self {
        self.pts_ms = pts_ms;
        self
    }

    /// RGBA → 灰度 (BT.601 亮度, 整数系数)
    pub fn to_luma(&self) -> GrayImage {
        let mut gray = GrayImage::new(self.width, self.height);
        for (pixel, rgba) in gray.pixels_mut().zip(self.rgba_data.chunks_exact(4)) {
            let r = rgba[0] as u32;
            let g = rgba[1] as u32;
            let b = rgba[2] as u32;
            *pixel = Luma([((r * 77 + g * 150 + b * 29) >> 8) as u8]);
        }
        gray
    }
}

/// YUV420P平面 → RGBA (BT.601, 系数乘以128避免浮点)
///
/// `out` 长度必须为 `width * height * 4`。
#[allow(clippy::too_many_arguments)]
pub fn yuv420p_to_rgba(
    y_plane: &[u8],
    u_plane: &[u8],
    v_plane: &[u8],
    y_stride: usize,
    uv_stride: usize,
    width: usize,
    height: usize,
    out: &mut [u8],
) {
    debug_assert_eq!(out.len(), width * height * 4);

    for row in 0..height {
        let y_row = row * y_stride;
        let uv_row = (row >> 1) * uv_stride;
        let out_row = row * width * 4;

        for col in 0..width {
            let y_val = y_plane[y_row + col] as i32;
            let u_val = u_plane[uv_row + (col >> 1)] as i32 - 128;
            let v_val = v_plane[uv_row + (col >> 1)] as i32 - 128;

            let idx = out_row + col * 4;
            out[idx] = (y_val + ((v_val * 179) >> 7)).clamp(0, 255) as u8;
            out[idx + 1] = (y_val - ((u_val * 44) >> 7) - ((v_val * 91) >> 7)).clamp(0, 255) as u8;
            out[idx + 2] = (y_val + ((u_val * 227) >> 7)).clamp(0, 255) as u8;
            out[idx + 3] = 255;
        }
    }
}
