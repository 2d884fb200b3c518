//! Capture client: acquires video frames, estimates (or synthesizes) a pose,
//! renders the skeleton overlay, and streams landmark frames to the collector.

use std::io::BufRead;

use anyhow::Result;
use tokio::sync::mpsc;
use uuid::Uuid;

use pose_relay::capture::{CaptureLoop, Command};
use pose_relay::config::Config;
use pose_relay::device::TestPatternDevice;
use pose_relay::pose::PoseSource;
use pose_relay::sender::TelemetrySender;

const CONFIG_PATH: &str = "pose_relay.toml";

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let config = Config::load_or_default(CONFIG_PATH);
    let client = config.client;

    // Session id is fixed for the lifetime of this process
    let session_id = Uuid::new_v4().to_string();

    println!("Capture Client ({})", env!("GIT_VERSION"));
    println!("Collector: {}", client.collector_url);
    println!("Target FPS: {}", client.target_fps);
    println!("View: {}", if client.view { "ON" } else { "OFF" });
    println!("Session: {session_id}");
    println!();
    println!("操作: [c] カメラ開始  [d] デモ開始  [t] 送信切替  [x] 停止  [s] 状態表示  [q] 終了");
    println!();

    let sender = TelemetrySender::new(&client.collector_url, client.max_in_flight_sends);
    let counters = sender.counters();

    // No on-device estimator is wired in yet, so the source degrades to
    // synthetic frames at init and logs that it did.
    let source = PoseSource::init(None);

    let capture = CaptureLoop::new(
        client,
        source,
        Box::new(TestPatternDevice::new()),
        sender,
        session_id,
    );

    let (tx, rx) = mpsc::channel(16);

    // Console input thread: single-letter commands + Enter
    {
        let tx = tx.clone();
        std::thread::spawn(move || pump_console_commands(std::io::stdin().lock(), &tx));
    }

    #[cfg(unix)]
    register_sigusr1_toggle(tx.clone())?;

    drop(tx);

    // The overlay window is not Send, so the loop runs on this task rather
    // than a spawned one.
    let done = capture.run(rx).await;

    println!();
    println!(
        "Session {} finished: sent={} dropped={}",
        done.session_id(),
        counters.frames_sent(),
        counters.frames_dropped()
    );
    Ok(())
}

/// コンソール入力を 1 行ずつコマンドへ変換して流し込む。EOF・読み取り
/// エラー・チャネル切断で戻る。
fn pump_console_commands(mut input: impl BufRead, tx: &mpsc::Sender<Command>) {
    let mut line = String::new();
    loop {
        line.clear();
        match input.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let cmd = match line.trim() {
            "c" => Command::StartCamera,
            "d" => Command::StartDemo,
            "t" => Command::ToggleSending,
            "x" => Command::Stop,
            "s" => Command::Status,
            "q" => Command::Quit,
            "" => continue,
            other => {
                eprintln!("[input] unknown command: {other}");
                continue;
            }
        };
        if tx.blocking_send(cmd).is_err() {
            break;
        }
    }
}

/// SIGUSR1 → 送信切替。シグナルハンドラではフラグを立てるだけにして、
/// 実際のコマンド送出はタスク側で行う。
#[cfg(unix)]
fn register_sigusr1_toggle(tx: mpsc::Sender<Command>) -> Result<()> {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    let flag = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGUSR1, Arc::clone(&flag))?;

    tokio::spawn(async move {
        let mut poll = tokio::time::interval(Duration::from_millis(200));
        loop {
            poll.tick().await;
            if flag.swap(false, Ordering::Relaxed)
                && tx.send(Command::ToggleSending).await.is_err()
            {
                break;
            }
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_commands_parsed_in_order() {
        let (tx, mut rx) = mpsc::channel(8);
        pump_console_commands("d\nt\nbogus\n\nq\n".as_bytes(), &tx);

        assert_eq!(rx.try_recv().unwrap(), Command::StartDemo);
        assert_eq!(rx.try_recv().unwrap(), Command::ToggleSending);
        assert_eq!(rx.try_recv().unwrap(), Command::Quit);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_console_reader_returns_at_eof() {
        let (tx, mut rx) = mpsc::channel(8);
        pump_console_commands(&b""[..], &tx);
        assert!(rx.try_recv().is_err());
    }
}
