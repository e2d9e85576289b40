// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// 二维码视频播放器 (QR Video Player)
///
/// 系统架构:
/// 1. 解码线程: 视频解码, 最新帧写入播放器 (独立工作线程)
/// 2. 检测线程: 每隔固定间隔抽帧识别二维码 (独立工作线程)
/// 3. 主线程:   渲染显示 (macroquad事件循环)
use clap::Parser;
use macroquad::window::Conf;
use qr_video_player::app::QrApp;
use qr_video_player::config::{PlayerArgs, PlayerConfig};
use qr_video_player::logging;
use qr_video_player::renderer::{self, Renderer};
use tracing::{error, info};

/// 二维码视频播放器参数
#[derive(Parser, Debug)]
#[command(author, version, about = "二维码视频播放器 - 播放视频并实时识别二维码", long_about = None)]
struct Cli {
    #[command(flatten)]
    player: PlayerArgs,
}

fn main() {
    let cli = Cli::parse();
    let config = PlayerConfig::resolve(&cli.player);
    logging::init(&config.log_level);
    config.print_summary();

    let conf = Conf {
        window_title: "QR Video Player".to_string(),
        window_width: config.window_width,
        window_height: config.window_height,
        high_dpi: false,
        ..Default::default()
    };

    macroquad::Window::from_config(conf, async move {
        let mut app = QrApp::new(&config);
        if let Err(e) = app.start() {
            error!("❌ 播放启动失败: {:#}", e);
            app.show_toast("An unknown error occurred.");
        }
        info!("▶️ 开始播放: {}", config.video_url);

        renderer::run(Renderer::new(app, &config)).await;
    });
}
