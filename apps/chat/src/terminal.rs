//! Stdout-backed display region for the chat front end.

use std::io;

use async_trait::async_trait;
use client_core::DisplayRegion;
use shared::domain::Fragment;
use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    sync::Mutex,
};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Plain,
    Markup,
}

pub struct TerminalDisplay<W> {
    out: Mutex<W>,
    mode: RenderMode,
}

impl<W> TerminalDisplay<W> {
    pub fn new(out: W, mode: RenderMode) -> Self {
        Self {
            out: Mutex::new(out),
            mode,
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn render(&self, fragment: &Fragment) -> String {
        match self.mode {
            RenderMode::Plain => format!("{fragment}\n"),
            RenderMode::Markup => format!("{}\n", fragment.to_markup()),
        }
    }
}

#[async_trait]
impl<W> DisplayRegion for TerminalDisplay<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn append(&self, fragment: Fragment) {
        let rendered = self.render(&fragment);
        let mut out = self.out.lock().await;
        if let Err(error) = write_flushed(&mut *out, rendered.as_bytes()).await {
            warn!(%error, "chat: failed to write fragment to terminal");
        }
    }
}

async fn write_flushed<W>(out: &mut W, bytes: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    out.write_all(bytes).await?;
    out.flush().await
}
