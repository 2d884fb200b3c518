use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;

/// キャプチャデバイスへ要求するストリーム設定 (希望解像度)
#[derive(Debug, Clone, Copy)]
pub struct StreamRequest {
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl StreamRequest {
    pub fn new(ideal_width: u32, ideal_height: u32) -> Self {
        Self {
            ideal_width,
            ideal_height,
        }
    }
}

/// 1 フレーム分の映像データ (グレースケール、行優先)
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub timestamp_ms: i64,
    pub data: Vec<u8>,
}

/// 個別に停止できるメディアトラック
pub trait MediaTrack: Send {
    fn stop(&mut self);
    fn is_stopped(&self) -> bool;
}

/// キャプチャデバイス (カメラドライバ相当)
pub trait CaptureDevice: Send {
    /// ストリームを開く。権限拒否やデバイス不在は Err
    fn open(&mut self, request: &StreamRequest) -> Result<Box<dyn DeviceStream>>;
}

/// オープン済みのデバイスストリーム
pub trait DeviceStream: Send {
    /// 実際の解像度。メタデータ到着前は None
    fn dimensions(&self) -> Option<(u32, u32)>;

    /// 最新フレームを取得。未到着または停止後は None
    fn acquire_frame(&mut self, now_ms: i64) -> Option<VideoFrame>;

    /// 保持する全トラック
    fn tracks_mut(&mut self) -> &mut [Box<dyn MediaTrack>];

    /// 全トラックを個別に停止する
    fn stop_all_tracks(&mut self) {
        for track in self.tracks_mut() {
            track.stop();
        }
    }
}

// --- Test pattern device ---

/// ハードウェアなしでカメラ経路を動かすテストパターンデバイス
pub struct TestPatternDevice {
    stop_flag: Option<Arc<AtomicBool>>,
}

impl TestPatternDevice {
    pub fn new() -> Self {
        Self { stop_flag: None }
    }

    /// トラック停止を外部から観測するためのフラグを仕込む
    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = Some(flag);
        self
    }
}

impl Default for TestPatternDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureDevice for TestPatternDevice {
    fn open(&mut self, request: &StreamRequest) -> Result<Box<dyn DeviceStream>> {
        let track = PatternTrack {
            stopped: false,
            stop_flag: self.stop_flag.clone(),
        };
        Ok(Box::new(TestPatternStream {
            width: request.ideal_width,
            height: request.ideal_height,
            frame_count: 0,
            tracks: vec![Box::new(track)],
        }))
    }
}

struct PatternTrack {
    stopped: bool,
    stop_flag: Option<Arc<AtomicBool>>,
}

impl MediaTrack for PatternTrack {
    fn stop(&mut self) {
        self.stopped = true;
        if let Some(flag) = &self.stop_flag {
            flag.store(true, Ordering::Release);
        }
    }

    fn is_stopped(&self) -> bool {
        self.stopped
    }
}

struct TestPatternStream {
    width: u32,
    height: u32,
    frame_count: u64,
    tracks: Vec<Box<dyn MediaTrack>>,
}

impl DeviceStream for TestPatternStream {
    fn dimensions(&self) -> Option<(u32, u32)> {
        Some((self.width, self.height))
    }

    fn acquire_frame(&mut self, now_ms: i64) -> Option<VideoFrame> {
        if self.tracks.iter().any(|t| t.is_stopped()) {
            return None;
        }

        // 移動する縦バーのパターン
        let w = self.width as usize;
        let h = self.height as usize;
        let mut data = vec![0u8; w * h];
        let bar_x = (self.frame_count as usize * 4) % w;
        for y in 0..h {
            data[y * w + bar_x] = 255;
        }
        self.frame_count += 1;

        Some(VideoFrame {
            width: self.width,
            height: self.height,
            timestamp_ms: now_ms,
            data,
        })
    }

    fn tracks_mut(&mut self) -> &mut [Box<dyn MediaTrack>] {
        &mut self.tracks
    }
}
