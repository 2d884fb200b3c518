use anyhow::Result;

use super::landmark::Landmark;
use crate::device::VideoFrame;

/// 外部の姿勢推定機能。モデル実体はこのクレートの外で構築され、
/// `Box<dyn PoseEstimator>` として渡される。
///
/// 入力: 映像フレームとタイムスタンプ (ミリ秒、単調増加)
/// 出力: 検出された姿勢ごとのランドマーク列 (0 件以上)。呼び出し側は
/// 先頭の姿勢のみ消費する
pub trait PoseEstimator: Send {
    fn detect_for_video(
        &mut self,
        frame: &VideoFrame,
        timestamp_ms: i64,
    ) -> Result<Vec<Vec<Landmark>>>;
}
