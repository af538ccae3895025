// Asynchronous preview rendering for staged attachments.
//
// Each attachment renders on its own task; completions arrive in whatever
// order the tasks finish, not in upload order.

use base64::Engine;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use super::types::Attachment;

/// A rendered preview ready for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub attachment_id: Uuid,
    pub attachment_name: String,
    /// `data:` URL suitable for an image element
    pub data_url: String,
    pub rendered_at: DateTime<Utc>,
}

/// Encode an attachment as a data URL
pub fn render_preview(attachment: &Attachment) -> Preview {
    let encoded = base64::engine::general_purpose::STANDARD.encode(&attachment.content);
    Preview {
        attachment_id: attachment.id,
        attachment_name: attachment.name.clone(),
        data_url: format!("data:{};base64,{}", attachment.mime_type, encoded),
        rendered_at: Utc::now(),
    }
}

#[derive(Debug)]
pub struct PreviewRenderer {
    tx: mpsc::UnboundedSender<Preview>,
    rx: mpsc::UnboundedReceiver<Preview>,
    in_flight: usize,
}

impl Default for PreviewRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewRenderer {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx, in_flight: 0 }
    }

    /// Start rendering a preview. Runs on a blocking task when a tokio
    /// runtime is available, inline otherwise.
    pub fn spawn(&mut self, attachment: Attachment) {
        self.in_flight += 1;
        let tx = self.tx.clone();

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || {
                    let preview = render_preview(&attachment);
                    // Receiver only goes away with the workflow itself
                    let _ = tx.send(preview);
                });
            }
            Err(_) => {
                let _ = tx.send(render_preview(&attachment));
            }
        }
    }

    /// Collect every preview that has finished rendering so far
    pub fn drain_ready(&mut self) -> Vec<Preview> {
        let mut ready = Vec::new();
        while let Ok(preview) = self.rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            ready.push(preview);
        }
        ready
    }

    /// Wait until every spawned render has completed
    pub async fn drain_all(&mut self) -> Vec<Preview> {
        let mut ready = self.drain_ready();
        while self.in_flight > 0 {
            match self.rx.recv().await {
                Some(preview) => {
                    self.in_flight -= 1;
                    ready.push(preview);
                }
                None => break,
            }
        }
        ready
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn png(name: &str) -> Attachment {
        Attachment {
            id: Uuid::new_v4(),
            name: name.to_string(),
            size_bytes: 3,
            mime_type: "image/png".to_string(),
            content: Bytes::from_static(b"abc"),
        }
    }

    #[test]
    fn test_render_preview_data_url() {
        let attachment = png("bin.png");
        let preview = render_preview(&attachment);
        assert_eq!(preview.attachment_id, attachment.id);
        assert_eq!(preview.attachment_name, "bin.png");
        assert_eq!(preview.data_url, "data:image/png;base64,YWJj");
    }

    #[test]
    fn test_renders_inline_without_runtime() {
        let mut renderer = PreviewRenderer::new();
        renderer.spawn(png("a.png"));
        let ready = renderer.drain_ready();
        assert_eq!(ready.len(), 1);
        assert_eq!(renderer.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_drain_all_collects_every_render() {
        let mut renderer = PreviewRenderer::new();
        for name in ["a.png", "b.png", "c.png"] {
            renderer.spawn(png(name));
        }

        let mut names: Vec<String> = renderer
            .drain_all()
            .await
            .into_iter()
            .map(|p| p.attachment_name)
            .collect();
        names.sort();

        assert_eq!(names, vec!["a.png", "b.png", "c.png"]);
        assert_eq!(renderer.in_flight(), 0);
    }
}
