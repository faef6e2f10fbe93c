//! Server-rendered HTML for the preview viewer, history gallery and settings.
//!
//! Pages are plain strings with inline CSS/JS; there is no template engine.
//! Static chunks live in constants so only the dynamic parts go through
//! `format!`.

use crate::ImageRecord;

use std::fmt::Write;

const VIEWER_HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>SnapHook</title>
    <style>
        body { margin: 0; padding: 20px; background: #1e1e1e; display: flex; flex-direction: column;
               justify-content: center; align-items: center; min-height: 100vh; }
        .container { display: flex; flex-direction: column; align-items: center; gap: 20px; }
        img { max-width: 90vw; max-height: 85vh; box-shadow: 0 4px 20px rgba(0,0,0,0.5); }
        .waiting { color: #888; font-family: Arial; font-size: 24px; text-align: center; }
        .spinner { border: 4px solid #333; border-top: 4px solid #888; border-radius: 50%; width: 40px;
                   height: 40px; animation: spin 1s linear infinite; margin: 20px auto; }
        @keyframes spin { 0% { transform: rotate(0deg); } 100% { transform: rotate(360deg); } }
        .button-group { display: flex; gap: 10px; }
        .btn { padding: 12px 24px; color: white; border: none; border-radius: 4px; font-size: 16px;
               cursor: pointer; font-family: Arial; }
        .save-btn { background: #4CAF50; }
        .save-btn:hover { background: #45a049; }
        .history-btn { background: #2196F3; }
        .history-btn:hover { background: #0b7dda; }
    </style>
</head>
<body>
    <div class="container">
"#;

const VIEWER_TAIL: &str = r#"        <div class="button-group">
            <button class="btn save-btn" onclick="saveImage()">Save Screenshot</button>
            <button class="btn history-btn" onclick="window.location='/history'">View History</button>
        </div>
        <div class="waiting" style="display:none">
            <div class="spinner"></div>
            Waiting for screenshot...
        </div>
    </div>
    <script>
        const img = document.getElementById('screenshot');
        const waiting = document.querySelector('.waiting');
        const saveBtn = document.querySelector('.save-btn');

        img.onerror = function() {
            img.style.display = 'none';
            waiting.style.display = 'block';
            saveBtn.style.display = 'none';
        };

        const eventSource = new EventSource('/events');
        eventSource.onmessage = function() {
            img.src = '/image?t=' + Date.now();
            img.style.display = 'block';
            waiting.style.display = 'none';
            saveBtn.style.display = 'block';
        };

        function saveImage() {
            const timestamp = new Date().toISOString().replace(/[:.]/g, '-').slice(0, 19);
            const link = document.createElement('a');
            link.href = img.src;
            link.download = 'screenshot_' + timestamp + '.png';
            link.click();
        }
    </script>
</body>
</html>"#;

/// Viewer page showing the latest image, or `index` when given.
pub(crate) fn viewer(index: Option<usize>, cache_bust: u128) -> String {
    let src = match index {
        Some(i) => format!("/image?index={i}&t={cache_bust}"),
        None => format!("/image?t={cache_bust}"),
    };

    let mut html = String::with_capacity(VIEWER_HEAD.len() + VIEWER_TAIL.len() + 128);
    html.push_str(VIEWER_HEAD);
    let _ = writeln!(
        html,
        r#"        <img id="screenshot" src="{src}" alt="Latest screenshot">"#
    );
    html.push_str(VIEWER_TAIL);
    html
}

const HISTORY_HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>SnapHook - History</title>
    <style>
        body { margin: 0; padding: 20px; background: #1e1e1e; font-family: Arial; color: #fff; }
        h1 { text-align: center; color: #888; }
        .gallery { display: grid; grid-template-columns: repeat(auto-fill, minmax(200px, 1fr)); gap: 20px; padding: 20px; }
        .thumbnail { background: #2a2a2a; border-radius: 8px; overflow: hidden; position: relative; transition: transform 0.2s; }
        .thumbnail:hover { transform: scale(1.05); }
        .thumbnail img { width: 100%; height: 150px; object-fit: cover; cursor: pointer; }
        .thumbnail .info { padding: 10px; text-align: center; font-size: 12px; color: #888; }
        .delete-text { position: absolute; top: 8px; right: 8px; background: #f44336; color: white; padding: 6px 12px;
                       border-radius: 4px; font-size: 12px; font-weight: bold; cursor: pointer; opacity: 0; }
        .thumbnail:hover .delete-text { opacity: 1; }
        .btn { padding: 12px 24px; color: white; border: none; border-radius: 4px; font-size: 16px; cursor: pointer; margin: 10px; }
        .back-btn { background: #4CAF50; }
        .clear-btn { background: #f44336; }
        .button-group { text-align: center; margin: 20px 0; }
    </style>
</head>
<body>
"#;

const HISTORY_TAIL: &str = r#"    </div>
    <script>
        function deleteScreenshot(index, event) {
            event.stopPropagation();
            fetch('/delete', {
                method: 'POST',
                headers: {'Content-Type': 'application/x-www-form-urlencoded'},
                body: 'index=' + index
            })
            .then(r => r.json())
            .then(() => window.location.reload())
            .catch(err => alert('Failed to delete: ' + err));
        }

        function clearAll() {
            if (confirm('Clear all screenshot history? This cannot be undone.')) {
                fetch('/clear-all', { method: 'POST' })
                .then(r => r.json())
                .then(() => window.location.reload())
                .catch(err => alert('Failed to clear history: ' + err));
            }
        }
    </script>
</body>
</html>"#;

/// Gallery of `records` (oldest first on input), rendered newest first.
pub(crate) fn history(records: &[ImageRecord], capacity: usize) -> String {
    let mut html = String::with_capacity(HISTORY_HEAD.len() + HISTORY_TAIL.len() + records.len() * 320);
    html.push_str(HISTORY_HEAD);

    let _ = writeln!(
        html,
        "    <h1>Screenshot History ({}/{})</h1>",
        records.len(),
        capacity
    );
    html.push_str(
        r#"    <div class="button-group">
        <button class="btn back-btn" onclick="window.location='/'">Back to Latest</button>
        <button class="btn clear-btn" onclick="clearAll()">Clear All History</button>
    </div>
    <div class="gallery">
"#,
    );

    for (position, record) in records.iter().enumerate().rev() {
        let _ = write!(
            html,
            r#"        <div class="thumbnail">
            <img src="/image?index={position}" alt="Screenshot {seq}" onclick="window.location='/?index={position}'">
            <div class="delete-text" onclick="deleteScreenshot({position}, event)">Delete</div>
            <div class="info">Screenshot #{seq}</div>
        </div>
"#,
            seq = record.sequence,
        );
    }

    html.push_str(HISTORY_TAIL);
    html
}

/// Hotkey settings form. Submits to `POST /settings`.
pub(crate) fn settings() -> &'static str {
    r#"<!DOCTYPE html>
<html>
<head>
    <title>SnapHook Settings</title>
    <style>
        body { margin: 0; padding: 20px; background: #1e1e1e; color: #e0e0e0; font-family: Arial, sans-serif; }
        .container { max-width: 600px; margin: 0 auto; background: #2a2a2a; border-radius: 8px; padding: 30px; }
        .section { margin: 20px 0; padding: 20px; background: #333; border-radius: 4px; }
        .section h2 { margin-top: 0; color: #4CAF50; }
        label { display: block; margin-bottom: 8px; color: #bbb; }
        input[type="text"] { width: 100%; padding: 12px; background: #1e1e1e; border: 2px solid #444; border-radius: 4px;
                             color: #fff; font-size: 16px; box-sizing: border-box; }
        .hint { color: #888; font-size: 12px; margin-top: 5px; }
        .btn { padding: 12px 24px; background: #4CAF50; color: white; border: none; border-radius: 4px; font-size: 16px;
               cursor: pointer; margin-top: 15px; }
        .status { margin-top: 15px; padding: 10px; border-radius: 4px; display: none; }
        .status.success { background: #4CAF50; color: white; }
        .status.error { background: #f44336; color: white; }
    </style>
</head>
<body>
    <div class="container">
        <h1>SnapHook Settings</h1>
        <div class="section">
            <h2>Hotkey Configuration</h2>
            <label>Press your desired hotkey combination:</label>
            <input type="text" id="hotkeyInput" readonly placeholder="Click here and press keys..." value="">
            <div class="hint">Examples: Ctrl+Shift+S, Ctrl+Alt+S, PrintScreen</div>
            <button class="btn" onclick="saveHotkey()">Save Hotkey</button>
            <div id="status" class="status"></div>
        </div>
    </div>
    <script>
        const input = document.getElementById('hotkeyInput');
        const status = document.getElementById('status');

        input.addEventListener('keydown', function(e) {
            e.preventDefault();
            const keys = [];
            if (e.ctrlKey) keys.push('Ctrl');
            if (e.altKey) keys.push('Alt');
            if (e.shiftKey) keys.push('Shift');
            if (e.metaKey) keys.push('Win');

            const key = e.key;
            if (key === 'Control' || key === 'Alt' || key === 'Shift' || key === 'Meta') {
                return;
            }
            if (key === 'PrintScreen') {
                input.value = 'PrintScreen';
            } else {
                keys.push(key === ' ' ? 'Space' : key.toUpperCase());
                input.value = keys.join('+');
            }
        });

        function saveHotkey() {
            const hotkey = input.value;
            if (!hotkey) {
                showStatus('Please press a hotkey combination first', false);
                return;
            }
            fetch('/settings', {
                method: 'POST',
                headers: {'Content-Type': 'application/x-www-form-urlencoded'},
                body: 'hotkey=' + encodeURIComponent(hotkey)
            })
            .then(r => r.json())
            .then(data => showStatus(data.success ? 'Hotkey change requested' : 'Failed to change hotkey', data.success))
            .catch(() => showStatus('Error saving hotkey', false));
        }

        function showStatus(message, success) {
            status.textContent = message;
            status.className = 'status ' + (success ? 'success' : 'error');
            status.style.display = 'block';
        }
    </script>
</body>
</html>"#
}
