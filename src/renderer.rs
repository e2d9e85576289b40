// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 渲染器 (Renderer)
//! 上方视频画面 + 加载指示, 下方二维码列表 (egui), 播放错误以 toast 显示

use std::time::Instant;

use arboard::Clipboard;
use crossbeam_channel::Receiver;
use egui_macroquad::egui;
use macroquad::prelude::*;
use tracing::{error, info, warn};

use crate::app::QrApp;
use crate::config::PlayerConfig;
use crate::player::PlaybackState;

/// 视频下方状态栏高度
const STATUS_BAR_HEIGHT: f32 = 24.0;

pub struct Renderer {
    app: QrApp,
    player_height: f32,
    codes_rx: Receiver<Vec<String>>,
    codes: Vec<String>,
    last_frame: Option<Texture2D>,
    last_frame_index: Option<u64>,
    render_count: u64,
    render_last: Instant,
    render_fps: f64,
    clipboard: Option<Clipboard>,
    quit: bool,
}

impl Renderer {
    pub fn new(app: QrApp, config: &PlayerConfig) -> Self {
        info!("🎨 渲染器启动");
        let codes_rx = app.detector().qr_codes().subscribe();
        let codes = app.detector().qr_codes().get();
        Self {
            app,
            player_height: config.player_height,
            codes_rx,
            codes,
            last_frame: None,
            last_frame_index: None,
            render_count: 0,
            render_last: Instant::now(),
            render_fps: 0.0,
            clipboard: Clipboard::new().ok(),
            quit: false,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn update(&mut self) {
        self.app.pump_events();

        // 只保留最新的列表
        if let Some(codes) = self.codes_rx.try_iter().last() {
            self.codes = codes;
        }

        let Some(frame) = self.app.current_frame() else {
            return;
        };
        if self.last_frame_index == Some(frame.index) && self.last_frame.is_some() {
            return;
        }
        self.last_frame_index = Some(frame.index);

        // 只在分辨率变化时重建纹理，否则更新像素数据
        let needs_rebuild = match &self.last_frame {
            Some(tex) => tex.width() != frame.width as f32 || tex.height() != frame.height as f32,
            None => true,
        };

        if needs_rebuild {
            let texture =
                Texture2D::from_rgba8(frame.width as u16, frame.height as u16, &frame.rgba_data);
            texture.set_filter(FilterMode::Linear);
            self.last_frame = Some(texture);
        } else if let Some(tex) = &self.last_frame {
            let img = Image {
                bytes: frame.rgba_data.to_vec(),
                width: frame.width as u16,
                height: frame.height as u16,
            };
            tex.update(&img);
        }
    }

    pub fn handle_input(&mut self) {
        if is_key_pressed(KeyCode::Escape) {
            self.quit = true;
        }
        if is_key_pressed(KeyCode::Space) {
            self.app.toggle_detection();
        }
        if is_key_pressed(KeyCode::C) {
            if let Some(last) = self.codes.last().cloned() {
                self.copy_to_clipboard(&last);
            }
        }
        if is_key_pressed(KeyCode::P) {
            self.app.toggle_pause();
        }
        if is_key_pressed(KeyCode::R) {
            if let Err(e) = self.app.restart() {
                error!("❌ 重新播放失败: {:#}", e);
                self.app.show_toast("Restart failed");
            }
        }
    }

    pub fn draw(&mut self) {
        clear_background(WHITE);

        // 视频区域
        draw_rectangle(0.0, 0.0, screen_width(), self.player_height, BLACK);
        if let Some(texture) = &self.last_frame {
            // 等比缩放居中
            let scale = (screen_width() / texture.width()).min(self.player_height / texture.height());
            let w = texture.width() * scale;
            let h = texture.height() * scale;
            draw_texture_ex(
                texture,
                (screen_width() - w) / 2.0,
                (self.player_height - h) / 2.0,
                WHITE,
                DrawTextureParams {
                    dest_size: Some(vec2(w, h)),
                    ..Default::default()
                },
            );
        }

        if self.app.detector().is_loading().get() {
            draw_spinner(screen_width() / 2.0, self.player_height / 2.0);
        }

        // FPS统计
        self.render_count += 1;
        let now = Instant::now();
        if now.duration_since(self.render_last).as_secs() >= 1 {
            self.render_fps =
                self.render_count as f64 / now.duration_since(self.render_last).as_secs_f64();
            self.render_count = 0;
            self.render_last = now;
        }

        // 状态栏
        let status = self.app.detector().status();
        let state = match self.app.player().state() {
            PlaybackState::Idle => "idle",
            PlaybackState::Buffering => "buffering",
            PlaybackState::Ready if self.app.player().play_when_ready() => "playing",
            PlaybackState::Ready => "paused",
            PlaybackState::Ended => "ended",
        };
        let scanning = if status.is_detecting { "scanning" } else { "stopped" };
        let position = self.app.player().position_ms() / 1000;
        let line = format!(
            "{} {:02}:{:02} | {} | {} codes | {:.0} fps",
            state,
            position / 60,
            position % 60,
            scanning,
            status.code_count,
            self.render_fps
        );
        draw_rectangle(
            0.0,
            self.player_height,
            screen_width(),
            STATUS_BAR_HEIGHT,
            Color::from_rgba(230, 230, 230, 255),
        );
        draw_text(&line, 8.0, self.player_height + 17.0, 18.0, DARKGRAY);
    }

    pub fn draw_egui(&mut self) {
        let list_height = (screen_height() - self.player_height - STATUS_BAR_HEIGHT).max(0.0);
        let mut copied: Option<String> = None;
        let toast = self.app.active_toast().map(|t| t.message.clone());

        egui_macroquad::ui(|egui_ctx| {
            // 二维码列表
            egui::TopBottomPanel::bottom("qr_codes")
                .exact_height(list_height)
                .frame(egui::Frame::none().fill(egui::Color32::WHITE))
                .show(egui_ctx, |ui| {
                    egui::ScrollArea::vertical()
                        .auto_shrink([false, false])
                        .stick_to_bottom(true)
                        .show(ui, |ui| {
                            ui.spacing_mut().item_spacing.y = 1.0;
                            for code in &self.codes {
                                egui::Frame::none()
                                    .fill(egui::Color32::LIGHT_GRAY)
                                    .inner_margin(4.0)
                                    .show(ui, |ui| {
                                        ui.set_width(ui.available_width());
                                        let label = egui::Label::new(
                                            egui::RichText::new(code).color(egui::Color32::BLACK),
                                        )
                                        .sense(egui::Sense::click());
                                        if ui.add(label).clicked() {
                                            copied = Some(code.clone());
                                        }
                                    });
                            }
                        });
                });

            if let Some(message) = &toast {
                egui::Area::new(egui::Id::new("toast"))
                    .anchor(egui::Align2::CENTER_BOTTOM, egui::vec2(0.0, -40.0))
                    .show(egui_ctx, |ui| {
                        egui::Frame::popup(ui.style()).show(ui, |ui| {
                            ui.label(message);
                        });
                    });
            }
        });

        egui_macroquad::draw();

        if let Some(code) = copied {
            self.copy_to_clipboard(&code);
        }
    }

    fn copy_to_clipboard(&mut self, text: &str) {
        let Some(clipboard) = &mut self.clipboard else {
            warn!("⚠️ 剪贴板不可用");
            return;
        };
        match clipboard.set_text(text) {
            Ok(()) => {
                info!("✅ 已复制到剪贴板: {}", text);
                self.app.show_toast("Copied");
            }
            Err(e) => {
                error!("❌ 剪贴板复制失败: {}", e);
                self.app.show_toast("Copy failed");
            }
        }
    }

    pub fn release(&mut self) {
        self.app.release();
    }
}

/// 加载指示: 一圈渐隐圆点
fn draw_spinner(cx: f32, cy: f32) {
    const DOTS: usize = 8;
    const RADIUS: f32 = 18.0;
    let phase = (get_time() * 8.0) as usize % DOTS;
    for i in 0..DOTS {
        let angle = i as f32 / DOTS as f32 * std::f32::consts::TAU;
        let age = (phase + DOTS - i) % DOTS;
        let alpha = 1.0 - age as f32 / DOTS as f32;
        draw_circle(
            cx + angle.cos() * RADIUS,
            cy + angle.sin() * RADIUS,
            3.5,
            Color::new(1.0, 1.0, 1.0, alpha),
        );
    }
}

/// 主循环: 输入 → 更新 → 绘制, 直到按下 Esc
pub async fn run(mut renderer: Renderer) {
    loop {
        renderer.handle_input();
        renderer.update();
        renderer.draw();
        renderer.draw_egui();

        if renderer.should_quit() {
            break;
        }
        next_frame().await;
    }
    renderer.release();
    info!("👋 窗口已关闭");
}
