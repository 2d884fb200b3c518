use crate::pose::LandmarkIndex;

/// 骨格の接続定義 (開始ランドマーク, 終了ランドマーク)
pub const SKELETON_CONNECTIONS: [(LandmarkIndex, LandmarkIndex); 18] = [
    // 肩と腕
    (LandmarkIndex::LeftShoulder, LandmarkIndex::RightShoulder),
    (LandmarkIndex::LeftShoulder, LandmarkIndex::LeftElbow),
    (LandmarkIndex::LeftElbow, LandmarkIndex::LeftWrist),
    (LandmarkIndex::RightShoulder, LandmarkIndex::RightElbow),
    (LandmarkIndex::RightElbow, LandmarkIndex::RightWrist),
    // 胴体
    (LandmarkIndex::LeftShoulder, LandmarkIndex::LeftHip),
    (LandmarkIndex::RightShoulder, LandmarkIndex::RightHip),
    (LandmarkIndex::LeftHip, LandmarkIndex::RightHip),
    // 左脚
    (LandmarkIndex::LeftHip, LandmarkIndex::LeftKnee),
    (LandmarkIndex::LeftKnee, LandmarkIndex::LeftAnkle),
    (LandmarkIndex::LeftAnkle, LandmarkIndex::LeftHeel),
    (LandmarkIndex::LeftHeel, LandmarkIndex::LeftFootIndex),
    // 右脚
    (LandmarkIndex::RightHip, LandmarkIndex::RightKnee),
    (LandmarkIndex::RightKnee, LandmarkIndex::RightAnkle),
    (LandmarkIndex::RightAnkle, LandmarkIndex::RightHeel),
    (LandmarkIndex::RightHeel, LandmarkIndex::RightFootIndex),
    // 足先
    (LandmarkIndex::LeftAnkle, LandmarkIndex::LeftFootIndex),
    (LandmarkIndex::RightAnkle, LandmarkIndex::RightFootIndex),
];

/// 接続線の色 (RGB)
pub const CONNECTION_COLOR: u32 = 0x00FF00; // 緑

/// ランドマークマーカーの色 (RGB)
pub const MARKER_COLOR: u32 = 0xFF0000; // 赤

/// マーカーの半径 (ピクセル)
pub const MARKER_RADIUS: i32 = 5;

/// マーカーを描画する可視性の閾値
pub const VISIBILITY_THRESHOLD: f32 = 0.5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_count() {
        assert_eq!(SKELETON_CONNECTIONS.len(), 18);
    }

    #[test]
    fn test_connections_within_layout() {
        for (start, end) in SKELETON_CONNECTIONS.iter() {
            assert!((*start as usize) < LandmarkIndex::COUNT);
            assert!((*end as usize) < LandmarkIndex::COUNT);
            assert_ne!(start, end);
        }
    }
}
