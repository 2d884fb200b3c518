use super::landmark::{Landmark, LandmarkIndex};

/// デモ用の合成ランドマークを生成する
///
/// 壁時計時刻 `t` (秒) の滑らかな周期関数で、解剖学的に妥当な基準位置の
/// まわりを揺れる 33 ランドマークを返す。可視性は 0.8〜1.0 の一様乱数。
pub fn generate(t: f64) -> [Landmark; LandmarkIndex::COUNT] {
    let mut landmarks = [Landmark::default(); LandmarkIndex::COUNT];

    for (i, landmark) in landmarks.iter_mut().enumerate() {
        let phase = i as f64;
        let base_x = 0.5;
        let base_y = 0.3 + (phase / LandmarkIndex::COUNT as f64) * 0.4;

        let x = base_x + (t + phase * 0.1).sin() * 0.1;
        let y = base_y + (t + phase * 0.2).cos() * 0.05;
        let z = (t + phase * 0.15).sin() * 0.1;
        let visibility = 0.8 + fastrand::f32() * 0.2;

        *landmark = Landmark::with_visibility(x as f32, y as f32, z as f32, visibility);
    }

    landmarks
}
