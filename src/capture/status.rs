use crate::pose::{LandmarkIndex, PoseFrame};

/// フレームなしのときの概要テキスト
pub const NO_POSE_SUMMARY: &str = "No pose detected";

/// カメラ状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraStatus {
    Inactive,
    Starting,
    CameraActive,
    DemoActive,
    Error,
}

impl CameraStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Inactive => "Inactive",
            Self::Starting => "Starting",
            Self::CameraActive => "Camera Active",
            Self::DemoActive => "Demo Active",
            Self::Error => "Error",
        }
    }
}

/// 姿勢検出状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoseStatus {
    NoPose,
    Detected,
    Demo,
}

impl PoseStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoPose => "No Pose Detected",
            Self::Detected => "Pose Detected",
            Self::Demo => "Demo Mode",
        }
    }
}

/// 画面表示用のステータス一式
#[derive(Debug)]
pub struct StatusBoard {
    pub camera: CameraStatus,
    pub pose: PoseStatus,
    pub sending: bool,
    /// 直近ティックのランドマーク概要
    pub summary: String,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self {
            camera: CameraStatus::Inactive,
            pose: PoseStatus::NoPose,
            sending: false,
            summary: NO_POSE_SUMMARY.to_string(),
        }
    }

    /// 1 行のステータス表示を組み立てる
    pub fn line(&self, frames_sent: u64, frames_dropped: u64) -> String {
        format!(
            "camera: {} | pose: {} | sending: {} | sent: {} (dropped: {})",
            self.camera.label(),
            self.pose.label(),
            if self.sending { "Enabled" } else { "Disabled" },
            frames_sent,
            frames_dropped,
        )
    }
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

/// 主要ランドマークの位置を含む概要テキストを生成する
///
/// 位置は正規化座標を百分率にして小数 1 桁で表す。
pub fn detail_summary(frame: &PoseFrame) -> String {
    let key_points = [
        ("Nose", LandmarkIndex::Nose),
        ("L Shoulder", LandmarkIndex::LeftShoulder),
        ("R Shoulder", LandmarkIndex::RightShoulder),
        ("L Hip", LandmarkIndex::LeftHip),
        ("R Hip", LandmarkIndex::RightHip),
    ];

    let mut out = format!(
        "detected: {} landmarks | visible: {} | time: {} | session: {}",
        frame.landmarks.len(),
        frame.visible_count(),
        frame.captured_at.format("%H:%M:%S"),
        frame.session_id,
    );

    for (label, index) in key_points {
        let lm = frame.get(index);
        out.push_str(&format!(
            " | {}: ({:.1}, {:.1})",
            label,
            lm.x * 100.0,
            lm.y * 100.0
        ));
    }

    out
}
