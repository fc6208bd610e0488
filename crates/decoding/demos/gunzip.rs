//! Decompresses a gzip file to stdout.
//!
//! ```text
//! cargo run -p micro-decoding --example gunzip -- archive.gz > archive
//! ```

use futures::StreamExt;
use micro_decoding::GzipCodec;
use std::process::ExitCode;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, stdout};
use tokio_util::codec::FramedRead;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> ExitCode {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).with_writer(std::io::stderr).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let Some(path) = std::env::args().nth(1) else {
        error!("usage: gunzip <file>");
        return ExitCode::FAILURE;
    };

    let file = match File::open(&path).await {
        Ok(file) => file,
        Err(e) => {
            error!(cause = %e, path = %path, "failed to open");
            return ExitCode::FAILURE;
        }
    };

    let mut frames = FramedRead::new(file, GzipCodec::new());
    let mut out = stdout();
    let mut total = 0usize;

    while let Some(frame) = frames.next().await {
        let bytes = match frame {
            Ok(bytes) => bytes,
            Err(e) if e.is_corrupt() => {
                error!(cause = %e, path = %path, "not a valid gzip file");
                return ExitCode::FAILURE;
            }
            Err(e) => {
                error!(cause = %e, path = %path, "failed to decode");
                return ExitCode::FAILURE;
            }
        };

        total += bytes.len();
        if let Err(e) = out.write_all(&bytes).await {
            error!(cause = %e, "failed to write stdout");
            return ExitCode::FAILURE;
        }
    }

    if let Err(e) = out.flush().await {
        error!(cause = %e, "failed to flush stdout");
        return ExitCode::FAILURE;
    }

    info!(path = %path, size = total, "decompressed");
    ExitCode::SUCCESS
}
