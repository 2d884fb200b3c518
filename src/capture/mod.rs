//! キャプチャループ本体。
//!
//! デバイスストリームを専有し、取得→検出→描画→(任意で)送信のティック
//! サイクルと Idle/Starting/Active/Stopped の状態機械を持つ。ティックは
//! インターバルタイマーで駆動し、停止時はタイマーごと破棄することで
//! 以降のティックを取り消す。

pub mod status;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{error, info, warn};
use tokio::sync::mpsc;
use tokio::time::{interval, Interval, MissedTickBehavior};

use crate::config::ClientConfig;
use crate::device::{CaptureDevice, DeviceStream, StreamRequest};
use crate::pose::PoseSource;
use crate::render::OverlayCanvas;
#[cfg(feature = "desktop")]
use crate::render::OverlayWindow;
use crate::sender::{SendCounters, TelemetrySender};
use status::{detail_summary, CameraStatus, PoseStatus, StatusBoard, NO_POSE_SUMMARY};

/// キャプチャループへの操作コマンド
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    StartCamera,
    StartDemo,
    ToggleSending,
    Stop,
    Status,
    Quit,
}

/// 状態機械のフェーズ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Starting,
    Active,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Camera,
    Demo,
}

pub struct CaptureLoop {
    cfg: ClientConfig,
    source: PoseSource,
    device: Box<dyn CaptureDevice>,
    sender: TelemetrySender,
    counters: Arc<SendCounters>,
    session_id: String,

    phase: Phase,
    mode: Option<Mode>,
    sending_enabled: bool,
    stream: Option<Box<dyn DeviceStream>>,
    canvas: Option<OverlayCanvas>,
    #[cfg(feature = "desktop")]
    window: Option<OverlayWindow>,
    pub board: StatusBoard,
    render_passes: u64,
}

impl CaptureLoop {
    pub fn new(
        cfg: ClientConfig,
        source: PoseSource,
        device: Box<dyn CaptureDevice>,
        sender: TelemetrySender,
        session_id: String,
    ) -> Self {
        let counters = sender.counters();
        Self {
            cfg,
            source,
            device,
            sender,
            counters,
            session_id,
            phase: Phase::Idle,
            mode: None,
            sending_enabled: false,
            stream: None,
            canvas: None,
            #[cfg(feature = "desktop")]
            window: None,
            board: StatusBoard::new(),
            render_passes: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn sending_enabled(&self) -> bool {
        self.sending_enabled
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn canvas(&self) -> Option<&OverlayCanvas> {
        self.canvas.as_ref()
    }

    /// 描画 (クリア含む) を行った回数
    pub fn render_passes(&self) -> u64 {
        self.render_passes
    }

    /// カメラモードで開始する。デバイス取得に失敗した場合は Idle に戻り、
    /// エラーはステータスとログで通知する。自動リトライはしない。
    pub fn start_camera(&mut self) {
        if !matches!(self.phase, Phase::Idle | Phase::Stopped) {
            warn!("start ignored, capture is {:?}", self.phase);
            return;
        }

        self.phase = Phase::Starting;
        self.board.camera = CameraStatus::Starting;

        let request = StreamRequest::new(self.cfg.camera_width, self.cfg.camera_height);
        match self.device.open(&request) {
            Ok(stream) => {
                self.mode = Some(Mode::Camera);
                self.stream = Some(stream);
                // 解像度が既に報告されていれば即 Active、まだなら
                // ティックでポーリングする
                self.try_activate();
            }
            Err(e) => {
                error!("failed to open capture device: {e:#}");
                self.phase = Phase::Idle;
                self.board.camera = CameraStatus::Error;
            }
        }
    }

    /// デモモードで開始する。デバイスは使わず即 Active になる。
    pub fn start_demo(&mut self) {
        if !matches!(self.phase, Phase::Idle | Phase::Stopped) {
            warn!("start ignored, capture is {:?}", self.phase);
            return;
        }

        self.phase = Phase::Starting;
        self.board.camera = CameraStatus::Starting;
        self.mode = Some(Mode::Demo);
        self.activate(self.cfg.demo_width, self.cfg.demo_height);
    }

    /// 送信の有効/無効を切り替える。Active 中のみ有効。
    pub fn toggle_sending(&mut self) {
        if self.phase != Phase::Active {
            warn!("sending toggle ignored while not active");
            return;
        }

        self.sending_enabled = !self.sending_enabled;
        self.board.sending = self.sending_enabled;
        info!(
            "frame sending {}",
            if self.sending_enabled { "enabled" } else { "disabled" }
        );
    }

    /// キャプチャを停止する。Active (または Starting) から抜けるときは
    /// 必ず: ティック停止、トラック停止、サーフェスクリア、送信無効化
    /// の 4 手順すべてを行う。
    pub fn stop(&mut self) {
        if !matches!(self.phase, Phase::Starting | Phase::Active) {
            return;
        }

        if let Some(mut stream) = self.stream.take() {
            stream.stop_all_tracks();
        }
        if let Some(canvas) = &mut self.canvas {
            canvas.clear();
        }
        #[cfg(feature = "desktop")]
        {
            self.window = None;
        }

        self.sending_enabled = false;
        self.mode = None;
        self.board.sending = false;
        self.board.camera = CameraStatus::Inactive;
        self.board.pose = PoseStatus::NoPose;
        self.board.summary = NO_POSE_SUMMARY.to_string();
        self.phase = Phase::Stopped;
        info!("capture stopped");
    }

    fn try_activate(&mut self) {
        let dims = self.stream.as_ref().and_then(|s| s.dimensions());
        if let Some((width, height)) = dims {
            self.activate(width, height);
        }
    }

    /// サーフェス解像度はこの遷移で固定され、Active 中は再読みしない。
    fn activate(&mut self, width: u32, height: u32) {
        self.canvas = Some(OverlayCanvas::new(width, height));

        #[cfg(feature = "desktop")]
        if self.cfg.view {
            match OverlayWindow::new("Pose Overlay", width, height) {
                Ok(window) => self.window = Some(window),
                Err(e) => warn!("failed to open window, continuing headless: {e:#}"),
            }
        }

        self.phase = Phase::Active;
        self.board.camera = match self.mode {
            Some(Mode::Camera) => CameraStatus::CameraActive,
            _ => CameraStatus::DemoActive,
        };
        info!("capture active at {width}x{height}");
    }

    /// 1 ティック分の処理。Starting では解像度の報告待ちのみ行う。
    pub fn tick(&mut self) {
        match self.phase {
            Phase::Starting => {
                self.try_activate();
                return;
            }
            Phase::Active => {}
            _ => return,
        }

        let now = Utc::now();
        let video = self
            .stream
            .as_mut()
            .and_then(|s| s.acquire_frame(now.timestamp_millis()));

        match self.source.next_frame(video.as_ref(), now, &self.session_id) {
            Some(frame) => {
                if let Some(canvas) = &mut self.canvas {
                    canvas.render(&frame);
                    self.render_passes += 1;
                }
                self.board.pose = if self.source.is_synthetic() || self.mode == Some(Mode::Demo) {
                    PoseStatus::Demo
                } else {
                    PoseStatus::Detected
                };
                self.board.summary = detail_summary(&frame);

                if self.sending_enabled {
                    self.sender.dispatch(&frame);
                }
            }
            None => {
                if let Some(canvas) = &mut self.canvas {
                    canvas.clear();
                    self.render_passes += 1;
                }
                self.board.pose = PoseStatus::NoPose;
                self.board.summary = NO_POSE_SUMMARY.to_string();
            }
        }

        #[cfg(feature = "desktop")]
        self.present_window();
    }

    #[cfg(feature = "desktop")]
    fn present_window(&mut self) {
        let Some(window) = &mut self.window else {
            return;
        };

        if !window.is_open() {
            info!("window closed, stopping capture");
            self.stop();
            return;
        }

        if let Some(canvas) = &self.canvas {
            if let Err(e) = window.present(canvas) {
                warn!("window present failed: {e:#}");
            }
        }
    }

    fn print_status(&self) {
        println!(
            "{}",
            self.board
                .line(self.counters.frames_sent(), self.counters.frames_dropped())
        );
        println!("  {}", self.board.summary);
    }

    fn tick_period(&self) -> Duration {
        // 1000fps 超の設定でも 0ms にはしない (interval は period 0 で panic する)
        Duration::from_millis((1000 / self.cfg.target_fps.max(1)).max(1) as u64)
    }

    /// コマンドを処理しながらティックを回す。Quit かチャネル切断で
    /// 停止処理をして抜ける。
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) -> Self {
        let mut ticker: Option<Interval> = None;
        let mut status_ticker = interval(Duration::from_secs(1));
        status_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            match self.phase {
                Phase::Starting | Phase::Active => {
                    if ticker.is_none() {
                        let mut iv = interval(self.tick_period());
                        iv.set_missed_tick_behavior(MissedTickBehavior::Skip);
                        ticker = Some(iv);
                    }
                }
                _ => ticker = None,
            }

            tokio::select! {
                cmd = commands.recv() => {
                    match cmd {
                        Some(Command::StartCamera) => {
                            self.start_camera();
                            self.print_status();
                        }
                        Some(Command::StartDemo) => {
                            self.start_demo();
                            self.print_status();
                        }
                        Some(Command::ToggleSending) => {
                            self.toggle_sending();
                            self.print_status();
                        }
                        Some(Command::Stop) => {
                            self.stop();
                            self.print_status();
                        }
                        Some(Command::Status) => self.print_status(),
                        Some(Command::Quit) | None => {
                            self.stop();
                            break;
                        }
                    }
                }
                _ = next_tick(&mut ticker) => self.tick(),
                _ = status_ticker.tick(), if self.phase == Phase::Active => {
                    self.print_status();
                }
            }
        }

        self
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(iv) => {
            iv.tick().await;
        }
        None => std::future::pending().await,
    }
}
