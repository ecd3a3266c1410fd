//! Terminal key selection.

use async_trait::async_trait;
use muse::credential::{KeySelector, KeyStore};
use muse::{Error, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Prompts for an API key on the terminal and stores it in a [`KeyStore`].
#[derive(Debug, Clone)]
pub struct TerminalSelector {
    store: KeyStore,
}

impl TerminalSelector {
    /// Store selected keys in `store`.
    #[must_use]
    pub const fn new(store: KeyStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl KeySelector for TerminalSelector {
    async fn has_credential(&self) -> bool {
        self.store.is_set()
    }

    async fn request_selection(&self) -> Result<()> {
        let prompt = async {
            let mut stderr = tokio::io::stderr();
            stderr
                .write_all(b"This operation needs a selected API key.\nAPI key: ")
                .await?;
            stderr.flush().await
        };
        prompt
            .await
            .map_err(|e| Error::configuration(format!("cannot prompt for a key: {e}")))?;

        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .map_err(|e| Error::configuration(format!("cannot read a key: {e}")))?;

        if line.trim().is_empty() {
            return Err(Error::configuration("no API key entered"));
        }
        self.store.set(line);
        Ok(())
    }
}
