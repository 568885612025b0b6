//! Console host: reads `<user_id> <command>` lines and prints replies.

use std::future::Future;
use std::path::PathBuf;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::bot::commands::{GachaPlugin, Reply};
use crate::render::image::cleanup_temp_file;

const IMAGE_MARKER: &str = "[图片] ";
const USAGE: &str = "用法：<用户ID> <指令>，例如 alice /tq十连";

/// Counters reported when a session ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub lines: usize,
    pub commands: usize,
}

/// The single ten-pull composite kept on disk. A new one replaces and
/// removes the previous; the last is removed on drop.
#[derive(Debug, Default)]
struct LatestComposite(Option<PathBuf>);

impl LatestComposite {
    fn replace(&mut self, path: PathBuf) {
        if let Some(previous) = self.0.replace(path) {
            cleanup_temp_file(&previous);
        }
    }
}

impl Drop for LatestComposite {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            cleanup_temp_file(&path);
        }
    }
}

/// Run against stdin/stdout until EOF or Ctrl-C.
pub async fn run_console(plugin: &mut GachaPlugin) -> Result<SessionStats> {
    let reader = BufReader::new(tokio::io::stdin());
    let mut writer = tokio::io::stdout();
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };
    run_session(plugin, reader, &mut writer, shutdown).await
}

/// Serve one line-oriented session until `reader` hits EOF or `shutdown`
/// resolves. Only the latest composite image stays on disk, and it is
/// removed when the session ends.
pub async fn run_session<R, W, F>(
    plugin: &mut GachaPlugin,
    reader: R,
    writer: &mut W,
    shutdown: F,
) -> Result<SessionStats>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    F: Future<Output = ()>,
{
    let mut lines = reader.lines();
    let mut stats = SessionStats::default();
    let mut composite = LatestComposite::default();
    tokio::pin!(shutdown);

    info!("Session started, waiting for commands");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("Input closed");
                    break;
                };
                stats.lines += 1;

                let line = line.trim();
                if line.is_empty() { continue; }

                let Some((user_id, message)) = line.split_once(char::is_whitespace) else {
                    write_block(writer, USAGE).await?;
                    continue;
                };

                if let Some(reply) = plugin.handle_line(user_id, message.trim()) {
                    stats.commands += 1;
                    send_reply(writer, &reply).await?;
                    if let (true, Some(path)) = (reply.composite, reply.image) {
                        composite.replace(path);
                    }
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown requested");
                break;
            }
        }
    }

    info!(
        "Session ended: {} lines, {} commands, {} users with history",
        stats.lines,
        stats.commands,
        plugin.tracker().user_count()
    );
    Ok(stats)
}

async fn send_reply<W: AsyncWrite + Unpin>(writer: &mut W, reply: &Reply) -> Result<()> {
    write_block(writer, &reply.text).await?;
    if let Some(path) = &reply.image {
        write_block(writer, &format!("{}{}", IMAGE_MARKER, path.display())).await?;
    }
    Ok(())
}

async fn write_block<W: AsyncWrite + Unpin>(writer: &mut W, text: &str) -> Result<()> {
    writer.write_all(text.as_bytes()).await?;
    writer.write_all(b"\n\n").await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GachaConfig;
    use crate::render::text::format_help;

    fn plugin() -> GachaPlugin {
        let mut config = GachaConfig::default();
        config.render.images_dir = PathBuf::from("/nonexistent/gacha-images");
        GachaPlugin::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_session_runs_until_eof() {
        let mut plugin = plugin();
        let input: &[u8] = "alice /tq十连\n\nbob hello\nalice tq非酋\ncarol\n".as_bytes();
        let mut output = Vec::new();

        let stats = run_session(&mut plugin, input, &mut output, std::future::pending())
            .await
            .unwrap();

        assert_eq!(stats, SessionStats { lines: 5, commands: 2 });
        assert_eq!(plugin.tracker().total_pulls("alice"), 10);

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("🎰 边狱巴士十连抽取 🎰"));
        assert!(text.contains("📊 非酋指数评测 📊"));
        assert!(text.ends_with(&format!("{}\n\n", USAGE)));
    }

    #[test]
    fn test_latest_composite_replaces_previous() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.png");
        let second = dir.path().join("second.png");
        std::fs::write(&first, b"x").unwrap();
        std::fs::write(&second, b"x").unwrap();

        let mut latest = LatestComposite::default();
        latest.replace(first.clone());
        latest.replace(second.clone());
        assert!(!first.exists());
        assert!(second.exists());

        drop(latest);
        assert!(!second.exists());
    }

    #[tokio::test]
    async fn test_session_removes_composites() {
        let dir = tempfile::tempdir().unwrap();
        let default_image = dir.path().join("default.png");
        image::RgbImage::from_pixel(4, 4, image::Rgb([1, 2, 3]))
            .save(&default_image)
            .unwrap();

        let mut config = GachaConfig::default();
        config.render.images_dir = dir.path().to_path_buf();
        let mut plugin = GachaPlugin::new(config).unwrap();

        let input: &[u8] = "alice tq十连\nalice tq单抽\nalice tq十连\n".as_bytes();
        let mut output = Vec::new();
        run_session(&mut plugin, input, &mut output, std::future::pending())
            .await
            .unwrap();

        let text = String::from_utf8(output).unwrap();
        let images: Vec<PathBuf> = text
            .split("\n\n")
            .filter_map(|block| block.strip_prefix(IMAGE_MARKER))
            .map(PathBuf::from)
            .collect();
        assert_eq!(images.len(), 3);
        assert_eq!(images[1], default_image);
        assert_ne!(images[0], images[2]);

        // Portraits stay, composites are gone.
        assert!(default_image.exists());
        assert!(!images[0].exists());
        assert!(!images[2].exists());
    }

    #[tokio::test]
    async fn test_unknown_command_gets_help() {
        let mut plugin = plugin();
        let input: &[u8] = b"alice tq\n";
        let mut output = Vec::new();

        run_session(&mut plugin, input, &mut output, std::future::pending())
            .await
            .unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), format!("{}\n\n", format_help()));
    }

    #[tokio::test]
    async fn test_shutdown_stops_session() {
        let mut plugin = plugin();
        let (reader, _keep_open) = tokio::io::duplex(64);
        let mut output = Vec::new();

        let stats = run_session(&mut plugin, BufReader::new(reader), &mut output, async {})
            .await
            .unwrap();

        assert_eq!(stats, SessionStats::default());
        assert!(output.is_empty());
    }
}
