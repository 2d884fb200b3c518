use anyhow::Result;
use minifb::{Key, Window, WindowOptions};

use crate::render::canvas::OverlayCanvas;

/// minifbを使用したオーバーレイ表示ウィンドウ
pub struct OverlayWindow {
    window: Window,
}

impl OverlayWindow {
    /// ウィンドウを作成
    pub fn new(title: &str, width: u32, height: u32) -> Result<Self> {
        let window = Window::new(
            title,
            width as usize,
            height as usize,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )?;

        Ok(Self { window })
    }

    /// ウィンドウが開いているか (Esc で閉じる)
    pub fn is_open(&self) -> bool {
        self.window.is_open() && !self.window.is_key_down(Key::Escape)
    }

    /// キャンバスの内容をウィンドウに表示
    pub fn present(&mut self, canvas: &OverlayCanvas) -> Result<()> {
        self.window.update_with_buffer(
            canvas.buffer(),
            canvas.width() as usize,
            canvas.height() as usize,
        )?;
        Ok(())
    }
}
