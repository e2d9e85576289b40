// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// 无界面扫描 (Headless QR scan)
///
/// 播放视频并把识别到的二维码逐行打印到标准输出,
/// 播放结束退出码 0, 播放错误退出码 1。
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use qr_video_player::app::QrApp;
use qr_video_player::config::{PlayerArgs, PlayerConfig};
use qr_video_player::player::{PlaybackState, PlayerEvent};
use qr_video_player::{logging, timestamp_string};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "无界面二维码扫描 - 打印视频中出现的二维码", long_about = None)]
struct Cli {
    #[command(flatten)]
    player: PlayerArgs,

    /// 识别到第一批二维码后立即退出
    #[arg(long)]
    once: bool,
}

/// 打印新增的二维码, 返回是否有输出
fn print_new_codes(app: &QrApp, printed: &mut usize) -> bool {
    let codes = app.detector().qr_codes().get();
    if codes.len() <= *printed {
        return false;
    }
    let now = timestamp_string(":");
    for code in &codes[*printed..] {
        println!("{}\t{}", now, code);
    }
    *printed = codes.len();
    true
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = PlayerConfig::resolve(&cli.player);
    logging::init(&config.log_level);
    config.print_summary();

    let mut app = QrApp::new(&config);
    let codes_rx = app.detector().qr_codes().subscribe();
    if let Err(e) = app.start() {
        error!("❌ 播放启动失败: {:#}", e);
        return ExitCode::FAILURE;
    }

    let mut printed = 0usize;
    let exit = loop {
        let event = match app.wait_event(Duration::from_millis(50)) {
            Ok(event) => event,
            Err(e) => {
                error!("❌ {:#}", e);
                break ExitCode::FAILURE;
            }
        };

        if codes_rx.try_iter().last().is_some()
            && print_new_codes(&app, &mut printed)
            && cli.once
        {
            break ExitCode::SUCCESS;
        }

        match event {
            Some(PlayerEvent::Error(e)) => {
                eprintln!("{}", e.user_message());
                break ExitCode::FAILURE;
            }
            Some(PlayerEvent::StateChanged(PlaybackState::Ended)) => {
                // 等最后一轮检测写入
                std::thread::sleep(config.poll_interval() + config.stop_delay());
                print_new_codes(&app, &mut printed);
                info!("🏁 播放结束, 共 {} 个二维码", printed);
                break ExitCode::SUCCESS;
            }
            _ => {}
        }
    };

    app.release();
    exit
}
