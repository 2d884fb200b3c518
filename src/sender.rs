use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::warn;
use tokio::sync::Semaphore;

use crate::pose::PoseFrame;
use crate::protocol::LandmarkPayload;

/// 送信統計 (ステータス表示用)
#[derive(Debug, Default)]
pub struct SendCounters {
    sent: AtomicU64,
    dropped: AtomicU64,
}

impl SendCounters {
    /// 2xx 応答を得たフレーム数
    pub fn frames_sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    /// 同時送信数の上限により破棄されたフレーム数
    pub fn frames_dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// 収集サーバへフレームを送るテレメトリ送信器
///
/// 送信は fire-and-forget で、完了順は保証されない。失敗はログに残して
/// 破棄する (再送なし)。同時送信数はセマフォで制限され、許可が
/// 尽きている間のフレームは破棄される。
pub struct TelemetrySender {
    client: reqwest::Client,
    endpoint: String,
    permits: Arc<Semaphore>,
    counters: Arc<SendCounters>,
}

impl TelemetrySender {
    pub fn new(collector_url: &str, max_in_flight: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/pose-landmarks", collector_url.trim_end_matches('/')),
            permits: Arc::new(Semaphore::new(max_in_flight)),
            counters: Arc::new(SendCounters::default()),
        }
    }

    /// 送信先URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn counters(&self) -> Arc<SendCounters> {
        self.counters.clone()
    }

    /// フレームを送信タスクへ渡す。呼び出し側はブロックしない。
    pub fn dispatch(&self, frame: &PoseFrame) {
        let permit = match self.permits.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                let dropped = self.counters.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                if dropped == 1 || dropped % 100 == 0 {
                    warn!("send capacity exhausted, {dropped} frames dropped so far");
                }
                return;
            }
        };

        let payload = LandmarkPayload::from_frame(frame);
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let counters = self.counters.clone();

        tokio::spawn(async move {
            match client.post(&endpoint).json(&payload).send().await {
                Ok(resp) if resp.status().is_success() => {
                    counters.sent.fetch_add(1, Ordering::Relaxed);
                }
                Ok(resp) => {
                    warn!("collector rejected frame: {}", resp.status());
                }
                Err(e) => {
                    warn!("failed to send frame: {e}");
                }
            }
            drop(permit);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{Landmark, LandmarkIndex};
    use chrono::Utc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn test_frame() -> PoseFrame {
        let landmarks = [Landmark::with_visibility(0.5, 0.5, 0.0, 0.9); LandmarkIndex::COUNT];
        PoseFrame::new(landmarks, "s1".to_string(), Utc::now())
    }

    /// 1 リクエストだけ受けて指定のステータス行を返す素朴なHTTPレスポンダ
    async fn accept_one(listener: TcpListener, status_line: &'static str) -> String {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text
                    .lines()
                    .find_map(|l| l.to_ascii_lowercase().strip_prefix("content-length:").map(str::to_string))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }

        socket
            .write_all(format!("{status_line}\r\ncontent-length: 0\r\n\r\n").as_bytes())
            .await
            .unwrap();
        socket.flush().await.unwrap();

        String::from_utf8_lossy(&buf).to_string()
    }

    #[test]
    fn test_endpoint_construction() {
        let sender = TelemetrySender::new("http://127.0.0.1:3000/", 4);
        assert_eq!(sender.endpoint(), "http://127.0.0.1:3000/pose-landmarks");
    }

    #[tokio::test]
    async fn test_dispatch_posts_frame() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(accept_one(listener, "HTTP/1.1 200 OK"));

        let sender = TelemetrySender::new(&format!("http://{addr}"), 4);
        sender.dispatch(&test_frame());

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /pose-landmarks"));
        assert!(request.contains("\"sessionId\":\"s1\""));

        let counters = sender.counters();
        for _ in 0..100 {
            if counters.frames_sent() == 1 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(counters.frames_sent(), 1);
        assert_eq!(counters.frames_dropped(), 0);
    }

    #[tokio::test]
    async fn test_dispatch_drops_when_capacity_exhausted() {
        let sender = TelemetrySender::new("http://127.0.0.1:9", 0);
        sender.dispatch(&test_frame());
        sender.dispatch(&test_frame());

        let counters = sender.counters();
        assert_eq!(counters.frames_sent(), 0);
        assert_eq!(counters.frames_dropped(), 2);
    }

    #[tokio::test]
    async fn test_dispatch_rejected_response_leaves_counters_untouched() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(accept_one(listener, "HTTP/1.1 500 Internal Server Error"));

        let sender = TelemetrySender::new(&format!("http://{addr}"), 1);
        sender.dispatch(&test_frame());

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /pose-landmarks"));

        // 送信タスクが許可を返すまで待つ
        for _ in 0..100 {
            if sender.permits.available_permits() == 1 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(sender.permits.available_permits(), 1);

        let counters = sender.counters();
        assert_eq!(counters.frames_sent(), 0);
        assert_eq!(counters.frames_dropped(), 0);
    }

    #[tokio::test]
    async fn test_dispatch_connect_failure_releases_permit() {
        let sender = TelemetrySender::new("http://127.0.0.1:9", 1);
        sender.dispatch(&test_frame());

        for _ in 0..200 {
            if sender.permits.available_permits() == 1 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(sender.permits.available_permits(), 1);

        let counters = sender.counters();
        assert_eq!(counters.frames_sent(), 0);

        // 許可が戻っていれば次のフレームは破棄されない
        sender.dispatch(&test_frame());
        assert_eq!(counters.frames_dropped(), 0);
    }
}
