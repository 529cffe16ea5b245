use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::handlers::handle_error;
use crate::error::{HttpError, ServerError};
use crate::middleware::logging::{log_connection, log_request};
use crate::protocol::parser::{
    BodyFraming, RequestHead, parse_chunk_size, parse_header_line, parse_request_line,
};
use crate::protocol::{Request, Response, Router};

const MAX_HEAD_LENGTH: usize = 8 * 1024;
const MAX_BODY_LENGTH: usize = 1024 * 1024;
const MAX_CHUNK_LINE_LENGTH: usize = 1024;

/// Minimal HTTP/1.1 server: one request per connection, routes dispatched
/// through a [`Router`].
///
/// Routes may be registered before or after `listen`; the router is shared
/// with the accept loop.
pub struct HttpServer {
    router: Arc<RwLock<Router>>,
    listener: Option<RunningListener>,
}

struct RunningListener {
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    accept_task: JoinHandle<()>,
}

impl Default for HttpServer {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpServer {
    pub fn new() -> Self {
        Self {
            router: Arc::new(RwLock::new(Router::new())),
            listener: None,
        }
    }

    /// Registers a GET handler. Re-registering a path replaces the handler.
    pub fn get<F>(&self, path: &str, handler: F)
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        self.router_mut().get(path, handler);
    }

    /// Registers a POST handler. Re-registering a path replaces the handler.
    pub fn post<F>(&self, path: &str, handler: F)
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        self.router_mut().post(path, handler);
    }

    pub fn router(&self) -> RwLockReadGuard<'_, Router> {
        self.router.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn router_mut(&self) -> RwLockWriteGuard<'_, Router> {
        self.router.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_listening(&self) -> bool {
        self.listener.is_some()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().map(|running| running.local_addr)
    }

    /// Binds `host:port` and starts accepting. Returns once the socket is
    /// listening, with the bound address (useful when `port` is 0).
    pub async fn listen(&mut self, port: u16, host: &str) -> Result<SocketAddr, ServerError> {
        let addr = format!("{}:{}", host, port);
        let listener = match TcpListener::bind(&addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("Failed to bind to {}: {}", addr, e);
                return Err(ServerError::Bind(addr, e));
            }
        };
        let local_addr = listener.local_addr()?;
        info!("HTTP server bound to {}", local_addr);

        let (shutdown, shutdown_rx) = oneshot::channel();
        let router = Arc::clone(&self.router);
        let accept_task = tokio::spawn(accept_loop(listener, router, shutdown_rx));

        self.listener = Some(RunningListener {
            local_addr,
            shutdown,
            accept_task,
        });
        Ok(local_addr)
    }

    /// Stops accepting and releases the port. Connections already accepted
    /// run to completion. Without a listener this is a no-op.
    pub async fn close(&mut self) -> Result<(), ServerError> {
        let Some(running) = self.listener.take() else {
            return Ok(());
        };

        // A send error means the loop is already gone; joining reports why.
        let _ = running.shutdown.send(());
        running
            .accept_task
            .await
            .map_err(|e| ServerError::AcceptLoop(e.to_string()))?;

        info!("HTTP server on {} closed", running.local_addr);
        Ok(())
    }
}

async fn accept_loop(
    listener: TcpListener,
    router: Arc<RwLock<Router>>,
    mut shutdown: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let router = Arc::clone(&router);

                    // Spawn a task per connection so accept loop doesn't block
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, peer, router).await {
                            warn!("Failed to serve {}: {}", peer, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }
}

/// Serves exactly one request on `stream`, then closes it.
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    router: Arc<RwLock<Router>>,
) -> Result<(), HttpError> {
    log_connection(&peer);
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let (response, method, target) = match read_head(&mut reader).await {
        Ok(Some(head)) => {
            let response = respond(&mut reader, &head, &router).await?;
            (response, head.method, head.target)
        }
        // Closed before sending anything.
        Ok(None) => return Ok(()),
        Err(HttpError::IoError(e)) => return Err(HttpError::IoError(e)),
        Err(e) => {
            handle_error(&e);
            (Response::from_error(&e), "-".to_string(), "-".to_string())
        }
    };

    log_request(&peer, &method, &target, response.status());
    write_half.write_all(&response.to_bytes()).await?;
    write_half.flush().await?;
    write_half.shutdown().await?;
    Ok(())
}

/// Routes `head` first; the body is only read once a handler matched.
async fn respond<R>(
    reader: &mut R,
    head: &RequestHead,
    router: &RwLock<Router>,
) -> Result<Response, HttpError>
where
    R: AsyncBufRead + Unpin,
{
    let route = router
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .route(head);
    let Some(route) = route else {
        return Ok(Response::not_found());
    };

    match read_body(reader, head).await {
        Ok(body) => Ok(route.respond(&body)),
        Err(HttpError::IoError(e)) => Err(HttpError::IoError(e)),
        Err(e) => {
            handle_error(&e);
            Ok(Response::from_error(&e))
        }
    }
}

/// Reads the request line and headers.
///
/// Returns `Ok(None)` if the peer closed the connection without sending a
/// request line. At most `MAX_HEAD_LENGTH + 1` bytes are consumed.
pub(crate) async fn read_head<R>(reader: &mut R) -> Result<Option<RequestHead>, HttpError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let mut budget = MAX_HEAD_LENGTH;

    if read_head_line(reader, &mut line, &mut budget).await? == 0 {
        return Ok(None);
    }
    let (method, target) = parse_request_line(&line)?;
    let mut head = RequestHead {
        method,
        target,
        ..RequestHead::default()
    };

    loop {
        if read_head_line(reader, &mut line, &mut budget).await? == 0 {
            return Err(HttpError::MalformedRequest(
                "connection closed before end of headers".into(),
            ));
        }
        if line == "\r\n" || line == "\n" {
            break;
        }
        let (name, value) = parse_header_line(&line)?;
        head.headers.insert(name, value);
    }

    Ok(Some(head))
}

/// Reads the whole body as framed by `Content-Length` or chunked encoding.
pub(crate) async fn read_body<R>(reader: &mut R, head: &RequestHead) -> Result<Vec<u8>, HttpError>
where
    R: AsyncBufRead + Unpin,
{
    match head.body_framing()? {
        BodyFraming::Length(length) => {
            if length > MAX_BODY_LENGTH {
                return Err(HttpError::BodyTooLarge(length));
            }
            let mut body = vec![0; length];
            reader.read_exact(&mut body).await.map_err(truncated_body)?;
            Ok(body)
        }
        BodyFraming::Chunked => read_chunked_body(reader).await,
    }
}

async fn read_chunked_body<R>(reader: &mut R) -> Result<Vec<u8>, HttpError>
where
    R: AsyncBufRead + Unpin,
{
    let mut body = Vec::new();
    let mut line = String::new();

    loop {
        let mut budget = MAX_CHUNK_LINE_LENGTH;
        if !read_line_within(reader, &mut line, &mut budget).await? {
            return Err(HttpError::MalformedRequest("chunk size line too long".into()));
        }
        let size = parse_chunk_size(&line)?;
        if size == 0 {
            break;
        }
        let total = body.len().saturating_add(size);
        if total > MAX_BODY_LENGTH {
            return Err(HttpError::BodyTooLarge(total));
        }
        let start = body.len();
        body.resize(total, 0);
        reader
            .read_exact(&mut body[start..])
            .await
            .map_err(truncated_body)?;

        let mut budget = 2;
        if !read_line_within(reader, &mut line, &mut budget).await?
            || (line != "\r\n" && line != "\n")
        {
            return Err(HttpError::MalformedRequest(
                "chunk data longer than its declared size".into(),
            ));
        }
    }

    // Trailer section, up to the terminating empty line.
    let mut budget = MAX_HEAD_LENGTH;
    loop {
        if read_head_line(reader, &mut line, &mut budget).await? == 0 {
            return Err(HttpError::MalformedRequest(
                "connection closed inside chunked body".into(),
            ));
        }
        if line == "\r\n" || line == "\n" {
            return Ok(body);
        }
    }
}

fn truncated_body(e: std::io::Error) -> HttpError {
    match e.kind() {
        std::io::ErrorKind::UnexpectedEof => {
            HttpError::MalformedRequest("body shorter than declared".into())
        }
        _ => HttpError::IoError(e),
    }
}

/// Reads one head line, charging it against `budget`.
async fn read_head_line<R>(
    reader: &mut R,
    line: &mut String,
    budget: &mut usize,
) -> Result<usize, HttpError>
where
    R: AsyncBufRead + Unpin,
{
    let before = *budget;
    if !read_line_within(reader, line, budget).await? {
        return Err(HttpError::HeadTooLarge(MAX_HEAD_LENGTH));
    }
    Ok(before - *budget)
}

/// Replaces `line` with the next line, consuming at most `budget + 1` bytes.
/// Returns `false` when the line does not fit; otherwise the bytes read are
/// deducted from `budget`. An empty `line` means end of input.
async fn read_line_within<R>(
    reader: &mut R,
    line: &mut String,
    budget: &mut usize,
) -> Result<bool, HttpError>
where
    R: AsyncBufRead + Unpin,
{
    let mut raw = Vec::new();
    let limit = u64::try_from(*budget).unwrap_or(u64::MAX).saturating_add(1);
    let n = (&mut *reader).take(limit).read_until(b'\n', &mut raw).await?;
    if n > *budget {
        return Ok(false);
    }
    *budget -= n;

    line.clear();
    line.push_str(
        std::str::from_utf8(&raw)
            .map_err(|_| HttpError::MalformedRequest("request line is not valid UTF-8".into()))?,
    );
    Ok(true)
}
