//! Printer adapters for sending ESC/POS data
//!
//! Counter printers are reached over raw TCP (usually port 9100). The
//! address may be an IP or a hostname; it is resolved on every job so a
//! printer that picked up a new DHCP lease keeps working.

use crate::error::{PrintError, PrintResult};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{info, instrument};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Trait for printer adapters
#[allow(async_fn_in_trait)]
pub trait Printer {
    /// Send raw ESC/POS data to the printer
    async fn print(&self, data: &[u8]) -> PrintResult<()>;
}

/// Network printer (raw TCP)
#[derive(Debug, Clone)]
pub struct NetworkPrinter {
    host: String,
    port: u16,
    timeout: Duration,
}

impl NetworkPrinter {
    /// Create a printer for `host` on `port`
    pub fn new(host: &str, port: u16) -> PrintResult<Self> {
        let host = host.trim();
        if host.is_empty() {
            return Err(PrintError::InvalidConfig("printer host is empty".to_string()));
        }
        if port == 0 {
            return Err(PrintError::InvalidConfig(format!("invalid port for {host}")));
        }
        Ok(Self {
            host: host.to_string(),
            port,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Set connection and write timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `host:port` as configured
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    async fn connect(&self) -> PrintResult<TcpStream> {
        tokio::time::timeout(self.timeout, TcpStream::connect((self.host.as_str(), self.port)))
            .await
            .map_err(|_| PrintError::Timeout(format!("Connection timeout: {}", self.addr())))?
            .map_err(|e| PrintError::Connection(format!("{}: {}", self.addr(), e)))
    }
}

impl Printer for NetworkPrinter {
    #[instrument(skip(self, data), fields(addr = %self.addr(), data_len = data.len()))]
    async fn print(&self, data: &[u8]) -> PrintResult<()> {
        let mut stream = self.connect().await?;
        info!("Connected, sending {} bytes", data.len());

        tokio::time::timeout(self.timeout, async {
            stream.write_all(data).await?;
            stream.flush().await?;
            stream.shutdown().await
        })
        .await
        .map_err(|_| PrintError::Timeout(format!("Write timeout: {}", self.addr())))??;

        info!("Print job sent");
        Ok(())
    }
}
