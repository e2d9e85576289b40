// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// 拉流解码器
/// Stream decoder with software decoding only
use std::sync::Arc;

use ez_ffmpeg::core::context::null_output::create_null_output;
use ez_ffmpeg::filter::frame_filter::FrameFilter;
use ez_ffmpeg::filter::frame_pipeline_builder::FramePipelineBuilder;
use ez_ffmpeg::{AVMediaType, FfmpegContext, Input};
use tracing::{debug, error, info};

use super::decode_filter::DecodeFilter;
use super::{PlaybackOptions, PlaybackState, PlayerShared};
use crate::error::{PipelineError, PlaybackError};

/// 网络读超时 (微秒), 断网时让解码尽快失败而不是无限阻塞
const RW_TIMEOUT_US: &str = "15000000";

/// 解码器 (每次 prepare 一个实例)
pub struct Decoder {
    url: String,
    generation: usize,
    options: PlaybackOptions,
    shared: Arc<PlayerShared>,
}

impl Decoder {
    pub fn new(
        url: String,
        generation: usize,
        options: PlaybackOptions,
        shared: Arc<PlayerShared>,
    ) -> Self {
        Self {
            url,
            generation,
            options,
            shared,
        }
    }

    /// 运行解码, 阻塞直到流结束、出错或被释放
    pub fn run(self) {
        info!("🎬 解码器启动 (Gen: {})", self.generation);
        info!("📹 流地址: {}", self.url);

        let filter = DecodeFilter::new(self.generation, Arc::clone(&self.shared));
        let input = open_input(&self.url, None, self.options.realtime);

        match run_pipeline(input, filter, &self.options.scale_filter) {
            Ok(()) => {
                info!("✅ 解码线程正常退出 (Gen: {})", self.generation);
                self.shared.transition(self.generation, PlaybackState::Ended);
            }
            Err(e) if self.shared.is_current(self.generation) => {
                error!("❌ 解码失败: {}", e);
                self.shared
                    .report_error(self.generation, PlaybackError::classify(e.message()));
            }
            Err(e) => {
                debug!("解码器已过期 (Gen: {}): {}", self.generation, e);
            }
        }
    }
}

/// 构造输入; `start_us` 为起始时间点, `realtime` 按原速读取
pub(crate) fn open_input(url: &str, start_us: Option<i64>, realtime: bool) -> Input {
    let mut input = Input::new(url);

    if url.starts_with("rtsp://") {
        // RTSP传输优化
        input = input.set_input_opts(
            [
                ("rtsp_transport", "tcp"),
                ("buffer_size", "67108864"),
                ("rtsp_flags", "prefer_tcp"),
            ]
            .into(),
        );
    } else if url.contains("://") {
        input = input.set_input_opts([("rw_timeout", RW_TIMEOUT_US)].into());
    }

    if let Some(start) = start_us {
        input = input.set_start_time_us(start);
    }
    if realtime {
        input = input.set_readrate(1.0);
    }
    input
}

/// 视频帧 → 自定义过滤器 → 空输出, 阻塞直到管线结束
pub(crate) fn run_pipeline(
    input: Input,
    filter: impl FrameFilter + 'static,
    scale_filter: &str,
) -> Result<(), PipelineError> {
    let pipe: FramePipelineBuilder = AVMediaType::AVMEDIA_TYPE_VIDEO.into();
    let pipe = pipe.filter("decode", Box::new(filter));
    let out = create_null_output().add_frame_pipeline(pipe);

    // 统一输出 YUV420P, 供 DecodeFilter 转换
    let filter_desc = if scale_filter.trim().is_empty() {
        "format=yuv420p".to_string()
    } else {
        format!("{},format=yuv420p", scale_filter.trim())
    };

    // 构建FFmpeg上下文
    let ctx = FfmpegContext::builder()
        .input(input)
        .filter_desc(filter_desc)
        .output(out)
        .build()
        .map_err(|e| PipelineError::Build(e.to_string()))?;

    let sch = ctx
        .start()
        .map_err(|e| PipelineError::Start(e.to_string()))?;
    debug!("✅ 解码管线启动成功");

    sch.wait().map_err(|e| PipelineError::Run(e.to_string()))
}
