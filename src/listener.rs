use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::processor::message_processor::{ChunkSummary, MessageProcessor};
use crate::protocol::framing::FrameBuffer;

/// Accepts tracker connections and ingests each one in its own task.
pub async fn start_tracker_listener(
    addr: SocketAddr,
    processor: Arc<MessageProcessor>,
    read_buffer_size: usize,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Tracker listener bound on {}", addr);

    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                let processor = processor.clone();
                tokio::spawn(async move {
                    info!("Tracker connected: {}", peer);
                    match handle_connection(stream, &processor, read_buffer_size).await {
                        Ok(bytes) => info!("Tracker {} disconnected after {} bytes", peer, bytes),
                        Err(e) => warn!("Tracker {} connection error: {}", peer, e),
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept tracker connection: {}", e);
                // Avoid a tight loop while file descriptors are exhausted
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }
}

/// Reads `stream` until EOF, ingesting complete records as they arrive.
/// Returns the number of bytes read. The pending tail is decoded on EOF
/// and on read errors alike.
pub async fn handle_connection<S>(
    mut stream: S,
    processor: &MessageProcessor,
    read_buffer_size: usize,
) -> std::io::Result<u64>
where
    S: AsyncRead + Unpin,
{
    let mut frames = FrameBuffer::new();
    let mut buf = vec![0u8; read_buffer_size.max(1)];
    let mut total: u64 = 0;

    let result = loop {
        let n = match stream.read(&mut buf).await {
            Ok(0) => break Ok(total),
            Ok(n) => n,
            Err(e) => break Err(e),
        };
        total += n as u64;

        if let Some(chunk) = frames.push(&buf[..n]) {
            debug!("Received: {:?}", chunk);
            log_summary(processor.process_chunk(&chunk).await);
        }
    };

    // A reset connection still delivers its last unterminated record
    if let Some(rest) = frames.finish() {
        debug!("Received at close: {:?}", rest);
        log_summary(processor.process_chunk(&rest).await);
    }

    result
}

fn log_summary(summary: ChunkSummary) {
    if summary.failed > 0 {
        warn!("{} event(s) lost in chunk", summary.failed);
    }
    debug!(
        "Chunk processed: {} status, {} position, {} ignored",
        summary.statuses, summary.positions, summary.ignored
    );
}
