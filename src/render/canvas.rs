use crate::pose::PoseFrame;
use crate::render::skeleton::{
    CONNECTION_COLOR, MARKER_COLOR, MARKER_RADIUS, SKELETON_CONNECTIONS, VISIBILITY_THRESHOLD,
};

/// オーバーレイ描画先のピクセルサーフェス
///
/// 解像度はセッション開始時に固定され、描画のたびに正規化座標から
/// ピクセル座標へ変換される。ピクセル座標は保持しない。
pub struct OverlayCanvas {
    buffer: Vec<u32>,
    width: usize,
    height: usize,
}

impl OverlayCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        let width = width as usize;
        let height = height as usize;
        Self {
            buffer: vec![0u32; width * height],
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width as u32
    }

    pub fn height(&self) -> u32 {
        self.height as u32
    }

    pub fn buffer(&self) -> &[u32] {
        &self.buffer
    }

    /// 全ピクセルをクリア
    pub fn clear(&mut self) {
        self.buffer.fill(0);
    }

    /// フレームを描画する。前フレームの描画は消去される。
    ///
    /// 接続線は 18 組の固定ペアすべてについて引き、マーカーは可視性が
    /// 閾値を超える (または未設定の) ランドマークにのみ置く。
    pub fn render(&mut self, frame: &PoseFrame) {
        self.clear();

        let w = self.width as u32;
        let h = self.height as u32;

        // 接続線
        for (start_idx, end_idx) in SKELETON_CONNECTIONS.iter() {
            let start = frame.get(*start_idx);
            let end = frame.get(*end_idx);
            let (x1, y1) = start.to_pixel(w, h);
            let (x2, y2) = end.to_pixel(w, h);
            self.draw_line(x1, y1, x2, y2, CONNECTION_COLOR);
        }

        // マーカー
        for landmark in frame.landmarks.iter() {
            if landmark.is_visible(VISIBILITY_THRESHOLD) {
                let (px, py) = landmark.to_pixel(w, h);
                self.draw_circle(px, py, MARKER_RADIUS, MARKER_COLOR);
            }
        }
    }

    /// Bresenhamのアルゴリズムで線を描画
    fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        let mut x = x0;
        let mut y = y0;

        loop {
            self.set_pixel(x, y, color);

            if x == x1 && y == y1 {
                break;
            }

            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// 円を描画（塗りつぶし）
    fn draw_circle(&mut self, cx: i32, cy: i32, radius: i32, color: u32) {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy <= radius * radius {
                    self.set_pixel(cx + dx, cy + dy, color);
                }
            }
        }
    }

    /// ピクセルをセット（境界チェック付き）
    fn set_pixel(&mut self, x: i32, y: i32, color: u32) {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
            self.buffer[y as usize * self.width + x as usize] = color;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{Landmark, LandmarkIndex};
    use chrono::Utc;

    fn frame_at(x: f32, y: f32, visibility: f32) -> PoseFrame {
        let landmarks = [Landmark::with_visibility(x, y, 0.0, visibility); LandmarkIndex::COUNT];
        PoseFrame::new(landmarks, "s1".to_string(), Utc::now())
    }

    #[test]
    fn test_render_draws_marker_at_scaled_position() {
        let mut canvas = OverlayCanvas::new(100, 60);
        canvas.render(&frame_at(0.25, 0.5, 1.0));
        assert_eq!(canvas.buffer()[30 * 100 + 25], MARKER_COLOR);
    }

    #[test]
    fn test_render_skips_low_visibility_markers() {
        let mut canvas = OverlayCanvas::new(64, 48);
        canvas.render(&frame_at(0.5, 0.5, 0.1));

        assert!(canvas.buffer().iter().all(|&p| p != MARKER_COLOR));
        // 接続線は可視性に関係なく描画される
        assert_eq!(canvas.buffer()[24 * 64 + 32], CONNECTION_COLOR);
    }

    #[test]
    fn test_render_unset_visibility_draws_marker() {
        let landmarks = [Landmark::new(0.5, 0.5, 0.0); LandmarkIndex::COUNT];
        let frame = PoseFrame::new(landmarks, "s1".to_string(), Utc::now());

        let mut canvas = OverlayCanvas::new(64, 48);
        canvas.render(&frame);
        assert_eq!(canvas.buffer()[24 * 64 + 32], MARKER_COLOR);
    }

    #[test]
    fn test_render_clears_previous_frame() {
        let mut canvas = OverlayCanvas::new(100, 100);
        canvas.render(&frame_at(0.1, 0.1, 1.0));
        assert_eq!(canvas.buffer()[10 * 100 + 10], MARKER_COLOR);

        canvas.render(&frame_at(0.9, 0.9, 1.0));
        assert_eq!(canvas.buffer()[10 * 100 + 10], 0);
    }

    #[test]
    fn test_clear_empties_buffer() {
        let mut canvas = OverlayCanvas::new(64, 48);
        canvas.render(&frame_at(0.5, 0.5, 1.0));
        assert!(canvas.buffer().iter().any(|&p| p != 0));

        canvas.clear();
        assert!(canvas.buffer().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_render_idempotent() {
        let frame = frame_at(0.3, 0.7, 1.0);
        let mut canvas = OverlayCanvas::new(64, 48);

        canvas.render(&frame);
        let first = canvas.buffer().to_vec();
        canvas.render(&frame);
        assert_eq!(canvas.buffer(), first.as_slice());
    }

    #[test]
    fn test_render_out_of_bounds_is_clipped() {
        let mut canvas = OverlayCanvas::new(64, 48);
        canvas.render(&frame_at(5.0, -3.0, 1.0));
        // パニックせず、バッファ外への書き込みも起きない
    }
}
