use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::time::Duration;

use canvas::engine::{ReplayEngine, ReplayError};
use canvas::surface::Raster;
use clap::{Args, Parser, Subcommand};
use frames::{ClientMessage, DEFAULT_RADIUS, Encoding, Pixel, ServerMessage};
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

type WsStream = tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("health check failed: HTTP {0}")]
    Unhealthy(u16),
    #[error("websocket connect failed: {0}")]
    WsConnect(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("websocket transport failed: {0}")]
    WsTransport(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("websocket closed")]
    WsClosed,
    #[error("frame decode failed: {0}")]
    Decode(#[from] frames::CodecError),
    #[error("timed out waiting for websocket frame")]
    Timeout,
    #[error("server returned {code}: {message}")]
    ServerError { code: String, message: String },
    #[error("expected INIT as the first message, got {0}")]
    UnexpectedFirst(&'static str),
    #[error("invalid point `{0}`; expected X,Y")]
    InvalidPoint(String),
    #[error("{0}")]
    Brush(#[from] ReplayError),
    #[error("nothing to draw")]
    EmptyStroke,
    #[error("line {line}: {source}")]
    InvalidLine { line: usize, source: serde_json::Error },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl CliError {
    /// Socket failure after the handshake succeeded.
    fn transport(error: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WsTransport(Box::new(error))
    }
}

#[derive(Parser, Debug)]
#[command(name = "canvas-cli", about = "Shared pixel canvas websocket CLI")]
struct Cli {
    #[arg(long, env = "CANVAS_BASE_URL", default_value = "http://127.0.0.1:8000")]
    base_url: String,

    #[arg(long, env = "CANVAS_PATH", default_value = "/canvas")]
    path: String,

    #[arg(long, default_value_t = false, help = "Use protobuf binary frames")]
    binary: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone)]
struct CliContext {
    base_url: String,
    path: String,
    encoding: Encoding,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check `/healthz`.
    Ping,
    /// Print the current canvas as JSON.
    Snapshot,
    /// Stream updates and replay them onto an in-memory raster.
    Watch(WatchArgs),
    /// Draw one stroke through the given points.
    Draw(DrawArgs),
    /// Append pixels read as JSON lines.
    Import(ImportArgs),
    /// Clear the canvas for everyone.
    Clear,
}

#[derive(Args, Debug)]
struct WatchArgs {
    #[arg(long, default_value_t = canvas::consts::DEFAULT_WIDTH)]
    width: u32,

    #[arg(long, default_value_t = canvas::consts::DEFAULT_HEIGHT)]
    height: u32,

    #[arg(long, help = "Stop after this many messages, INIT included")]
    count: Option<usize>,
}

#[derive(Args, Debug)]
struct DrawArgs {
    #[arg(required = true, help = "Points as X,Y")]
    points: Vec<String>,

    #[arg(long, default_value = canvas::consts::DEFAULT_COLOR)]
    color: String,

    #[arg(long, default_value_t = DEFAULT_RADIUS)]
    radius: f64,
}

#[derive(Args, Debug)]
struct ImportArgs {
    #[arg(long, default_value = "-", help = "Input file path, or - for stdin")]
    input: String,

    #[arg(long, default_value_t = 500)]
    batch: usize,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let ctx = CliContext {
        base_url: cli.base_url,
        path: cli.path,
        encoding: if cli.binary { Encoding::Binary } else { Encoding::Json },
    };

    match cli.command {
        Command::Ping => run_ping(&ctx).await,
        Command::Snapshot => run_snapshot(&ctx).await,
        Command::Watch(args) => run_watch(&ctx, args).await,
        Command::Draw(args) => run_draw(&ctx, args).await,
        Command::Import(args) => run_import(&ctx, args).await,
        Command::Clear => run_clear(&ctx).await,
    }
}

async fn run_ping(cli: &CliContext) -> Result<(), CliError> {
    let client = reqwest::Client::new();
    let url = format!("{}/healthz", cli.base_url.trim_end_matches('/'));
    let status = client.get(url).send().await?.status();
    if !status.is_success() {
        return Err(CliError::Unhealthy(status.as_u16()));
    }
    println!("ok");
    Ok(())
}

async fn run_snapshot(cli: &CliContext) -> Result<(), CliError> {
    let (_stream, pixels) = connect(cli).await?;
    print_json(&serde_json::to_value(&pixels)?)
}

async fn run_watch(cli: &CliContext, args: WatchArgs) -> Result<(), CliError> {
    let (mut stream, pixels) = connect(cli).await?;
    let mut engine = ReplayEngine::new(Raster::new(args.width, args.height));
    engine.apply(ServerMessage::Init(pixels));
    print_status(&engine, "INIT");

    let mut seen = 1;
    while args.count.is_none_or(|limit| seen < limit) {
        let message = recv_next(&mut stream, None).await?;
        if let ServerMessage::Error { code, message: text } = &message {
            eprintln!("server error {code}: {text}");
        }
        let tag = message.tag();
        engine.apply(message);
        print_status(&engine, tag);
        seen += 1;
    }
    Ok(())
}

async fn run_draw(cli: &CliContext, args: DrawArgs) -> Result<(), CliError> {
    let mut engine = ReplayEngine::new(Raster::new(canvas::consts::DEFAULT_WIDTH, canvas::consts::DEFAULT_HEIGHT));
    engine.brush_mut().set_color(args.color)?;
    engine.brush_mut().set_radius(args.radius)?;

    engine.pointer_down();
    for point in &args.points {
        let (x, y) = parse_point(point)?;
        engine.pointer_move(x, y);
    }
    let Some(message) = engine.pointer_up() else {
        return Err(CliError::EmptyStroke);
    };

    let (mut stream, _) = connect(cli).await?;
    let count = send_and_confirm(&mut stream, cli.encoding, &message).await?;
    println!("drew {count} pixels");
    Ok(())
}

async fn run_import(cli: &CliContext, args: ImportArgs) -> Result<(), CliError> {
    let reader: Box<dyn BufRead> = if args.input == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        Box::new(BufReader::new(File::open(&args.input)?))
    };

    let (mut stream, _) = connect(cli).await?;
    let batch_size = args.batch.max(1);
    let mut batch = Vec::with_capacity(batch_size);
    let mut sent = 0;

    for (index, line) in reader.lines().enumerate() {
        let Some(pixel) = parse_pixel_line(&line?, index + 1)? else {
            continue;
        };
        batch.push(pixel);
        if batch.len() == batch_size {
            let message = ClientMessage::AppendPixels(std::mem::take(&mut batch));
            sent += send_and_confirm(&mut stream, cli.encoding, &message).await?;
        }
    }
    if !batch.is_empty() {
        sent += send_and_confirm(&mut stream, cli.encoding, &ClientMessage::AppendPixels(batch)).await?;
    }

    println!("imported {sent} pixels");
    Ok(())
}

async fn run_clear(cli: &CliContext) -> Result<(), CliError> {
    let (mut stream, _) = connect(cli).await?;
    send_and_confirm(&mut stream, cli.encoding, &ClientMessage::Clear).await?;
    println!("cleared");
    Ok(())
}

// =============================================================================
// WEBSOCKET
// =============================================================================

/// Connect and wait for INIT.
async fn connect(cli: &CliContext) -> Result<(WsStream, Vec<Pixel>), CliError> {
    let url = ws_url(&cli.base_url, &cli.path, cli.encoding)?;
    let (mut stream, _) = connect_async(url)
        .await
        .map_err(|error| CliError::WsConnect(Box::new(error)))?;

    match recv_next(&mut stream, Some(Duration::from_secs(5))).await? {
        ServerMessage::Init(pixels) => Ok((stream, pixels)),
        other => Err(CliError::UnexpectedFirst(other.tag())),
    }
}

/// Send a mutation and wait for its echo. Returns the number of pixels
/// confirmed. A server that does not echo to the sender is treated as
/// success once the wait elapses.
async fn send_and_confirm(stream: &mut WsStream, encoding: Encoding, message: &ClientMessage) -> Result<usize, CliError> {
    let frame = match encoding {
        Encoding::Json => Message::Text(frames::encode_client_text(message).into()),
        Encoding::Binary => Message::Binary(frames::encode_client_binary(message).into()),
    };
    stream
        .send(frame)
        .await
        .map_err(CliError::transport)?;

    let expected = match message {
        ClientMessage::AppendPixels(pixels) => pixels.len(),
        ClientMessage::Clear => 0,
    };

    loop {
        let reply = match recv_next(stream, Some(Duration::from_secs(2))).await {
            Ok(reply) => reply,
            Err(CliError::Timeout) => return Ok(expected),
            Err(e) => return Err(e),
        };
        match (message, reply) {
            (_, ServerMessage::Error { code, message: text }) => {
                return Err(CliError::ServerError { code, message: text });
            }
            (ClientMessage::AppendPixels(sent), ServerMessage::NewPixels(echo)) if echo == *sent => {
                return Ok(echo.len());
            }
            (ClientMessage::Clear, ServerMessage::Clear) => return Ok(0),
            _ => {}
        }
    }
}

async fn recv_next(stream: &mut WsStream, timeout: Option<Duration>) -> Result<ServerMessage, CliError> {
    let fut = async {
        loop {
            let Some(message) = stream.next().await else {
                return Err(CliError::WsClosed);
            };
            match message.map_err(CliError::transport)? {
                Message::Text(text) => return frames::decode_server_text(text.as_str()).map_err(CliError::from),
                Message::Binary(bytes) => return frames::decode_server_binary(&bytes).map_err(CliError::from),
                Message::Close(_) => return Err(CliError::WsClosed),
                _ => {}
            }
        }
    };

    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| CliError::Timeout)?,
        None => fut.await,
    }
}

fn ws_url(base_url: &str, path: &str, encoding: Encoding) -> Result<String, CliError> {
    let base = base_url.trim_end_matches('/');
    let query = match encoding {
        Encoding::Json => "",
        Encoding::Binary => "?encoding=binary",
    };
    if let Some(rest) = base.strip_prefix("http://") {
        return Ok(format!("ws://{rest}{path}{query}"));
    }
    if let Some(rest) = base.strip_prefix("https://") {
        return Ok(format!("wss://{rest}{path}{query}"));
    }

    Err(CliError::InvalidBaseUrl(base_url.to_owned()))
}

// =============================================================================
// PARSING / OUTPUT
// =============================================================================

fn parse_point(raw: &str) -> Result<(f64, f64), CliError> {
    let invalid = || CliError::InvalidPoint(raw.to_owned());
    let (x, y) = raw.split_once(',').ok_or_else(invalid)?;
    let x = x.trim().parse::<f64>().map_err(|_| invalid())?;
    let y = y.trim().parse::<f64>().map_err(|_| invalid())?;
    Ok((x, y))
}

/// One pixel per line; blank lines are skipped.
fn parse_pixel_line(line: &str, number: usize) -> Result<Option<Pixel>, CliError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|source| CliError::InvalidLine { line: number, source })
}

fn print_status(engine: &ReplayEngine<Raster>, tag: &str) {
    println!(
        "{tag:<10} pixels={} cells={}",
        engine.pixels().len(),
        engine.surface().painted_cells()
    );
}

fn print_json(value: &serde_json::Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
