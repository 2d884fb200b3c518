//! Embedded monitor page served at `/`.

/// Minimal status page: polls `/health` and `/pose-data` and shows what the
/// collector is holding. Compiled in so the binary has no file dependencies.
pub const MONITOR_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Pose Collector</title>
<style>
  body { font-family: monospace; background: #111; color: #ddd; margin: 2em; }
  h1 { color: #0f0; font-size: 1.2em; }
  .stat { margin: 0.3em 0; }
  .value { color: #0f0; }
  table { border-collapse: collapse; margin-top: 1em; }
  td, th { border: 1px solid #444; padding: 0.3em 0.8em; text-align: left; }
</style>
</head>
<body>
<h1>Pose Collector</h1>
<div class="stat">status: <span class="value" id="status">-</span></div>
<div class="stat">stored entries: <span class="value" id="stored">-</span></div>
<div class="stat">last update: <span class="value" id="updated">-</span></div>
<table>
  <thead><tr><th>id</th><th>session</th><th>landmarks</th><th>received</th></tr></thead>
  <tbody id="entries"></tbody>
</table>
<script>
async function refresh() {
  try {
    const health = await (await fetch('/health')).json();
    document.getElementById('status').textContent = health.status;
    document.getElementById('stored').textContent = health.storedEntries;
    document.getElementById('updated').textContent = health.timestamp;

    const recent = await (await fetch('/pose-data?limit=5')).json();
    const rows = recent.data.map(e =>
      '<tr><td>' + e.id + '</td><td>' + e.sessionId + '</td><td>' +
      e.landmarks.length + '</td><td>' + e.receivedAt + '</td></tr>');
    document.getElementById('entries').innerHTML = rows.join('');
  } catch (err) {
    document.getElementById('status').textContent = 'unreachable';
  }
}
refresh();
setInterval(refresh, 2000);
</script>
</body>
</html>
"#;
