//! # Reconnecting TCP client
//!
//! Keeps a TCP connection to a local echo server alive while the server goes
//! away and comes back.
//!
//! 1. First open: the client sends `ping1`, the server answers `PING1`.
//! 2. The server is killed and restarted 500ms later; the reconnector retries
//!    with fibonacci backoff and reopens. On reopen the client sends `ping2`.
//! 3. The server is killed for good; after `fail_after = 4` consecutive
//!    failures the reconnector gives up and reports the last connect error.
//!
//! ## Run
//! ```bash
//! RUST_LOG=redial=debug cargo run --example tcp_echo --features logging
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use redial::{
    BackoffPolicy, Config, ConnectionState, EventKind, Hooks, Link, LogWriter, Reconnector,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

// ---------------------------------------------------------------------------
// Echo server (uppercases every line)
// ---------------------------------------------------------------------------

struct EchoServer {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl EchoServer {
    async fn bind(addr: SocketAddr) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let token = CancellationToken::new();
        let task = tokio::spawn(serve(listener, token.clone()));
        println!("[server] listening on {addr}");
        Ok(Self { token, task })
    }

    /// Stops accepting and drops every open connection.
    async fn kill(self) {
        self.token.cancel();
        let _ = self.task.await;
        println!("[server] killed");
    }
}

async fn serve(listener: TcpListener, token: CancellationToken) {
    let mut conns = JoinSet::new();
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((sock, _)) => {
                    conns.spawn(echo(sock));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                    break;
                }
            },
        }
    }
    conns.shutdown().await;
}

async fn echo(sock: TcpStream) {
    let (rd, mut wr) = sock.into_split();
    let mut lines = BufReader::new(rd).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        println!("[server] received {line:?}");
        if wr
            .write_all(format!("{}\n", line.to_uppercase()).as_bytes())
            .await
            .is_err()
        {
            break;
        }
    }
}

// ---------------------------------------------------------------------------
// Client hooks
// ---------------------------------------------------------------------------

/// One live connection: outgoing line queue plus the task driving the socket.
struct Conn {
    outgoing: mpsc::UnboundedSender<String>,
    task: JoinHandle<()>,
}

struct TcpHooks {
    addr: SocketAddr,
    replies: mpsc::UnboundedSender<String>,
}

impl Hooks for TcpHooks {
    type Handle = Conn;

    fn create(&mut self, link: Link, first_open: bool) -> Conn {
        tracing::debug!(first_open, epoch = link.epoch(), "connecting");
        let (outgoing, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(drive(self.addr, link, rx, self.replies.clone()));
        Conn { outgoing, task }
    }

    fn destroy(&mut self, conn: Conn) {
        conn.task.abort();
    }

    fn on_open(&mut self, conn: &mut Conn, first_open: bool) {
        let msg = if first_open { "ping1" } else { "ping2" };
        println!("[client] open (first_open={first_open}), sending {msg}");
        let _ = conn.outgoing.send(msg.to_string());
    }

    fn on_close(&mut self, _conn: &mut Conn) {
        println!("[client] closed");
    }

    fn on_fail(&mut self, err: &redial::ReconnectError) {
        println!("[client] giving up: {err}");
    }
}

/// Connects, then pumps lines both ways until either side goes away.
async fn drive(
    addr: SocketAddr,
    link: Link,
    mut outgoing: mpsc::UnboundedReceiver<String>,
    replies: mpsc::UnboundedSender<String>,
) {
    let stream = match TcpStream::connect(addr).await {
        Ok(s) => s,
        Err(e) => {
            link.error(e);
            link.closed();
            return;
        }
    };
    link.opened();

    let (rd, mut wr) = stream.into_split();
    let mut lines = BufReader::new(rd).lines();
    loop {
        tokio::select! {
            msg = outgoing.recv() => {
                let Some(msg) = msg else { break };
                if let Err(e) = wr.write_all(format!("{msg}\n").as_bytes()).await {
                    link.error(e);
                    break;
                }
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let _ = replies.send(line);
                }
                Ok(None) => break,
                Err(e) => {
                    link.error(e);
                    break;
                }
            },
        }
    }
    link.closed();
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "redial=info".into()))
        .init();

    // Reserve a port, then keep rebinding the same address.
    let addr = TcpListener::bind("127.0.0.1:0").await?.local_addr()?;
    let server = EchoServer::bind(addr).await?;

    let (replies_tx, mut replies) = mpsc::unbounded_channel();
    let cfg = Config {
        name: Some("tcp-echo".into()),
        backoff: BackoffPolicy {
            initial: Duration::from_millis(200),
            max: Duration::from_secs(2),
            fail_after: Some(4),
            ..BackoffPolicy::fibonacci()
        },
        ..Config::default()
    };
    let hooks = TcpHooks {
        addr,
        replies: replies_tx,
    };
    let rc = Reconnector::builder(cfg, hooks)
        .with_subscriber(Arc::new(LogWriter::new()))
        .build()?;
    let mut events = rc.subscribe();

    rc.start().await?;
    let reply = replies.recv().await.ok_or("reply channel closed")?;
    println!("[client] got {reply:?}");
    assert_eq!(reply, "PING1");

    // Server restarts while the client is backing off.
    server.kill().await;
    tokio::time::sleep(Duration::from_millis(500)).await;
    let server = EchoServer::bind(addr).await?;

    let reply = replies.recv().await.ok_or("reply channel closed")?;
    println!("[client] got {reply:?}");
    assert_eq!(reply, "PING2");

    // Server gone for good.
    server.kill().await;
    let mut state = rc.watch_state();
    state.wait_for(|s| *s == ConnectionState::Failed).await?;

    while let Ok(ev) = events.try_recv() {
        if ev.kind == EventKind::Failed {
            println!(
                "[client] failed after {} attempts: {}",
                ev.attempt.unwrap_or_default(),
                ev.reason.as_deref().unwrap_or("unknown")
            );
        }
    }

    rc.shutdown().await;
    Ok(())
}
