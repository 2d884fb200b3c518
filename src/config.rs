use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub collector: CollectorConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    /// 収集サーバのURL
    #[serde(default = "default_collector_url")]
    pub collector_url: String,
    /// ティック周波数 (Hz)
    #[serde(default = "default_target_fps")]
    pub target_fps: u32,
    /// オーバーレイウィンドウを表示するか
    #[serde(default = "default_view")]
    pub view: bool,
    /// 同時送信数の上限
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight_sends: usize,
    /// カメラへ要求する解像度 (実際の解像度はストリームが報告する)
    #[serde(default = "default_camera_width")]
    pub camera_width: u32,
    #[serde(default = "default_camera_height")]
    pub camera_height: u32,
    /// デモモードの描画解像度
    #[serde(default = "default_demo_width")]
    pub demo_width: u32,
    #[serde(default = "default_demo_height")]
    pub demo_height: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CollectorConfig {
    /// バインド先ホスト
    #[serde(default = "default_host")]
    pub host: String,
    /// 待ち受けポート (環境変数 PORT が優先される)
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_collector_url() -> String { "http://127.0.0.1:3000".to_string() }
fn default_target_fps() -> u32 { 60 }
fn default_view() -> bool { true }
fn default_max_in_flight() -> usize { 8 }
fn default_camera_width() -> u32 { 1280 }
fn default_camera_height() -> u32 { 720 }
fn default_demo_width() -> u32 { 640 }
fn default_demo_height() -> u32 { 480 }
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 3000 }

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            collector_url: default_collector_url(),
            target_fps: default_target_fps(),
            view: default_view(),
            max_in_flight_sends: default_max_in_flight(),
            camera_width: default_camera_width(),
            camera_height: default_camera_height(),
            demo_width: default_demo_width(),
            demo_height: default_demo_height(),
        }
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.as_ref().display()))?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// 設定ファイルが読めなければデフォルトで起動する
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::info!(
                    "config {} not loaded ({e:#}), using defaults",
                    path.as_ref().display()
                );
                Self::default()
            }
        }
    }
}
