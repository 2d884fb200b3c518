use chrono::{DateTime, Utc};
use log::{info, warn};

use super::detector::PoseEstimator;
use super::landmark::PoseFrame;
use super::synthetic;
use crate::device::VideoFrame;

/// 姿勢ソース。起動時にどちらかの変種が選択され、セッション途中で
/// 切り替わることはない (検出失敗時のフォールバックを除く)。
pub enum PoseSource {
    /// 外部の推定モデルに委譲する
    Model(Box<dyn PoseEstimator>),
    /// 合成ランドマーク生成器
    Synthetic,
}

impl PoseSource {
    /// 推定機能の有無からソースを選択する。
    /// 機能が得られなかった場合はプロセス存続中ずっと合成モードになる。
    pub fn init(estimator: Option<Box<dyn PoseEstimator>>) -> Self {
        match estimator {
            Some(est) => Self::Model(est),
            None => {
                warn!("pose estimator unavailable, falling back to synthetic generation");
                Self::Synthetic
            }
        }
    }

    pub fn synthetic() -> Self {
        info!("using synthetic pose source");
        Self::Synthetic
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, Self::Synthetic)
    }

    /// 1 ティック分のフレームを得る。
    ///
    /// モデル変種はフレームがあれば検出を試み、検出エラー時はその
    /// ティックに限り合成生成で代替する。検出結果が 0 姿勢 (または
    /// 33 個に満たないランドマーク列) のときは None。
    pub fn next_frame(
        &mut self,
        frame: Option<&VideoFrame>,
        now: DateTime<Utc>,
        session_id: &str,
    ) -> Option<PoseFrame> {
        match self {
            Self::Model(estimator) => match frame {
                Some(video) => {
                    let timestamp_ms = now.timestamp_millis();
                    match estimator.detect_for_video(video, timestamp_ms) {
                        Ok(mut poses) => {
                            if poses.is_empty() {
                                return None;
                            }
                            let first = poses.swap_remove(0);
                            PoseFrame::from_landmarks(first, session_id.to_string(), now)
                        }
                        Err(e) => {
                            warn!("pose detection failed, using synthetic frame: {e:#}");
                            Some(synthetic_frame(now, session_id))
                        }
                    }
                }
                None => Some(synthetic_frame(now, session_id)),
            },
            Self::Synthetic => Some(synthetic_frame(now, session_id)),
        }
    }
}

fn synthetic_frame(now: DateTime<Utc>, session_id: &str) -> PoseFrame {
    let t = now.timestamp_millis() as f64 / 1000.0;
    PoseFrame::new(synthetic::generate(t), session_id.to_string(), now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::landmark::{Landmark, LandmarkIndex};
    use anyhow::{bail, Result};

    struct StubEstimator {
        poses: Vec<Vec<Landmark>>,
        fail: bool,
    }

    impl PoseEstimator for StubEstimator {
        fn detect_for_video(
            &mut self,
            _frame: &VideoFrame,
            _timestamp_ms: i64,
        ) -> Result<Vec<Vec<Landmark>>> {
            if self.fail {
                bail!("inference timed out");
            }
            Ok(self.poses.clone())
        }
    }

    fn video_frame() -> VideoFrame {
        VideoFrame {
            width: 64,
            height: 48,
            timestamp_ms: 0,
            data: vec![0; 64 * 48],
        }
    }

    #[test]
    fn test_init_without_estimator_is_synthetic() {
        let source = PoseSource::init(None);
        assert!(source.is_synthetic());
    }

    #[test]
    fn test_model_detects_first_pose() {
        let pose = vec![Landmark::new(0.25, 0.75, 0.0); LandmarkIndex::COUNT];
        let mut source = PoseSource::init(Some(Box::new(StubEstimator {
            poses: vec![pose],
            fail: false,
        })));

        let frame = source
            .next_frame(Some(&video_frame()), Utc::now(), "s1")
            .unwrap();
        assert_eq!(frame.session_id, "s1");
        assert_eq!(frame.landmarks[0].x, 0.25);
        assert_eq!(frame.landmarks[0].visibility, None);
    }

    #[test]
    fn test_model_zero_poses_is_no_frame() {
        let mut source = PoseSource::init(Some(Box::new(StubEstimator {
            poses: vec![],
            fail: false,
        })));
        assert!(source
            .next_frame(Some(&video_frame()), Utc::now(), "s1")
            .is_none());
    }

    #[test]
    fn test_model_wrong_arity_is_no_frame() {
        let mut source = PoseSource::init(Some(Box::new(StubEstimator {
            poses: vec![vec![Landmark::new(0.5, 0.5, 0.0); 5]],
            fail: false,
        })));
        assert!(source
            .next_frame(Some(&video_frame()), Utc::now(), "s1")
            .is_none());
    }

    #[test]
    fn test_model_error_falls_back_for_tick() {
        let mut source = PoseSource::init(Some(Box::new(StubEstimator {
            poses: vec![],
            fail: true,
        })));

        let frame = source
            .next_frame(Some(&video_frame()), Utc::now(), "s1")
            .unwrap();
        let vis = frame.landmarks[0].visibility.unwrap();
        assert!(vis >= 0.8 && vis <= 1.0);
        assert!(!source.is_synthetic());
    }

    #[test]
    fn test_model_without_device_frame_generates() {
        let mut source = PoseSource::init(Some(Box::new(StubEstimator {
            poses: vec![],
            fail: false,
        })));
        assert!(source.next_frame(None, Utc::now(), "s1").is_some());
    }

    #[test]
    fn test_synthetic_always_generates() {
        let now = Utc::now();
        let mut source = PoseSource::synthetic();
        let frame = source.next_frame(None, now, "s1").unwrap();
        assert_eq!(frame.landmarks.len(), LandmarkIndex::COUNT);
        assert_eq!(frame.captured_at, now);
    }
}
