//! collabedit-host: stdio host for the collaborative edit protocol layer.
//!
//! Plays the host bridge over stdin/stdout with one JSON document per line:
//!
//! - a plain line is an inbound application message from the remote document
//! - a line prefixed with `!` is a local edit: applied to the buffer, then
//!   published back out
//! - every outbound message (edits and `info: ` diagnostics) is written to
//!   stdout as JSON
//!
//! Logs go to stderr (`RUST_LOG`, default `info`). Exit status 2 means the
//! bridge was missing a required capability.

mod editor;

use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use collabedit::protocol::value_from_json;
use collabedit::{ChannelBridge, CollabConfig, CollabSession, DocumentRef, HostEvent, Outbound, WireValue};
use log::{debug, error, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use uuid::Uuid;

use editor::LineBuffer;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("collabedit-host-io")
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to start I/O runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let (bridge, handle) = ChannelBridge::new();
    let session = match CollabSession::start(Arc::new(bridge), document_from_env(), config_from_env()) {
        Ok(session) => session,
        Err(e) => {
            error!("{e}");
            return ExitCode::from(e.exit_code());
        }
    };

    let (inbound_tx, outbound_rx) = handle.into_parts();
    let (local_tx, mut local_rx) = mpsc::unbounded_channel();
    runtime.spawn(read_stdin(inbound_tx, local_tx));
    let writer = runtime.spawn(write_stdout(outbound_rx));

    // Stand-in editor loop: drain remote edits, apply local ones.
    let queue = session.queue();
    let mut buffer = LineBuffer::new();
    loop {
        while let Ok(value) = local_rx.try_recv() {
            apply_local(&session, &mut buffer, &value);
        }

        if let Some(op) = queue.pop_timeout(Duration::from_millis(50)) {
            match buffer.apply(&op.edit) {
                Ok(()) => debug!("Applied remote {} at line {}", op.kind(), op.edit.line()),
                Err(e) => warn!("Remote {} not applied: {e}", op.kind()),
            }
            continue;
        }

        if session.supervisor().is_finished() && queue.is_empty() && local_rx.is_closed() {
            break;
        }
    }
    while let Ok(value) = local_rx.try_recv() {
        apply_local(&session, &mut buffer, &value);
    }

    let stats = session.stats();
    info!(
        "Session finished: {} received, {} applied, {} published, {} lines in buffer",
        stats.received,
        stats.enqueued,
        session.publisher().published(),
        buffer.lines().len()
    );
    for (n, line) in buffer.lines().iter().enumerate() {
        debug!("{n:>4} | {line}");
    }

    // Dropping the session releases the bridge, which lets the writer finish.
    drop(session);
    match runtime.block_on(writer) {
        Ok(Ok(())) => ExitCode::SUCCESS,
        Ok(Err(e)) => {
            error!("Writing to stdout failed: {e}");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("Writer task failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn apply_local(session: &CollabSession, buffer: &mut LineBuffer, value: &WireValue) {
    let op = match session.context().codec().decode(value) {
        Ok(op) => op,
        Err(e) => {
            warn!("Local edit rejected: {e}");
            return;
        }
    };
    if let Err(e) = buffer.apply(&op.edit) {
        warn!("Local {} not applied: {e}", op.kind());
        return;
    }
    if let Err(e) = session.publisher().publish(&op) {
        error!("{e}");
    }
}

async fn read_stdin(inbound: mpsc::UnboundedSender<HostEvent>, local: mpsc::UnboundedSender<WireValue>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!("Reading stdin failed: {e}");
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (is_local, json) = match line.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, line),
        };
        let value = match value_from_json(json) {
            Ok(value) => value,
            Err(e) => {
                warn!("Ignoring malformed JSON line: {e}");
                continue;
            }
        };

        let delivered = if is_local {
            local.send(value).is_ok()
        } else {
            inbound.send(HostEvent::message(value)).is_ok()
        };
        if !delivered {
            break;
        }
    }
    debug!("stdin closed");
}

async fn write_stdout(mut outbound: mpsc::UnboundedReceiver<Outbound>) -> std::io::Result<()> {
    let mut stdout = tokio::io::stdout();
    while let Some(message) = outbound.recv().await {
        let json = match message.to_json() {
            Ok(json) => json,
            Err(e) => {
                warn!("Dropping unserializable outbound message: {e}");
                continue;
            }
        };
        stdout.write_all(json.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }
    Ok(())
}

fn config_from_env() -> CollabConfig {
    let mut config = CollabConfig::default();

    if let Ok(value) = env::var("COLLABEDIT_ECHO_DIAGNOSTICS") {
        config.echo_diagnostics = !matches!(value.as_str(), "0" | "false" | "off" | "no");
    }
    if let Ok(value) = env::var("COLLABEDIT_QUEUE_HIGH_WATER") {
        match value.parse::<usize>() {
            Ok(0) => config.queue_high_water = None,
            Ok(limit) => config.queue_high_water = Some(limit),
            Err(e) => warn!("Ignoring COLLABEDIT_QUEUE_HIGH_WATER={value}: {e}"),
        }
    }
    config
}

fn document_from_env() -> DocumentRef {
    match env::var("COLLABEDIT_DOCUMENT_ID") {
        Ok(value) => match Uuid::parse_str(&value) {
            Ok(id) => DocumentRef::from_uuid(id),
            Err(e) => {
                warn!("Ignoring COLLABEDIT_DOCUMENT_ID={value}: {e}");
                DocumentRef::new()
            }
        },
        Err(_) => DocumentRef::new(),
    }
}
