use crate::core::handler::RequestHandler;
use crate::utils::error::{CepError, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use url::Url;

const MAX_HEAD_BYTES: usize = 8 * 1024;
pub const HEAD_READ_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    detail: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failures: Vec<String>,
}

impl HttpResponse {
    fn json<T: Serialize>(status: u16, body: &T) -> Result<Self> {
        Ok(Self {
            status,
            body: serde_json::to_string(body)?,
        })
    }

    fn from_error(err: &CepError) -> Result<Self> {
        let failures: Vec<String> = match err {
            CepError::Unresolved { failures } => failures.iter().map(ToString::to_string).collect(),
            CepError::FirstResponseFailed { failure } => vec![failure.to_string()],
            _ => Vec::new(),
        };
        Self::json(
            err.status_code(),
            &ErrorBody {
                error: err.user_friendly_message(),
                detail: err.to_string(),
                failures,
            },
        )
    }

    fn plain_error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: serde_json::json!({ "error": message }).to_string(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        format!(
            "HTTP/1.1 {} {}\r\nContent-Type: application/json; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            self.status,
            reason_phrase(self.status),
            self.body.len(),
            self.body
        )
        .into_bytes()
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        431 => "Request Header Fields Too Large",
        502 => "Bad Gateway",
        504 => "Gateway Timeout",
        _ => "Internal Server Error",
    }
}

/// 接受連線直到 listener 出錯為止，每條連線一個任務
pub async fn serve(listener: TcpListener, handler: Arc<RequestHandler>) -> Result<()> {
    serve_with_head_timeout(listener, handler, HEAD_READ_TIMEOUT).await
}

/// 與 `serve` 相同，但可指定讀取請求標頭的期限
pub async fn serve_with_head_timeout(
    listener: TcpListener,
    handler: Arc<RequestHandler>,
    head_timeout: Duration,
) -> Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!("🚀 Listening on http://{}", addr);

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!("Failed to accept connection: {}", e);
                continue;
            }
        };

        let handler = Arc::clone(&handler);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, &handler, head_timeout).await {
                tracing::warn!("Connection from {} failed: {}", peer, e);
            }
        });
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    handler: &RequestHandler,
    head_timeout: Duration,
) -> Result<()> {
    // 標頭沒在期限內讀完就回 408 並關閉連線
    let response = match tokio::time::timeout(head_timeout, read_head(&mut stream)).await {
        Ok(head) => match head? {
            Some(head) => respond(&head, handler).await?,
            None => HttpResponse::plain_error(431, "request header too large"),
        },
        Err(_) => {
            tracing::debug!("Request head not received within {:?}", head_timeout);
            HttpResponse::plain_error(408, "request head not received in time")
        }
    };

    stream.write_all(&response.to_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}

/// 讀到空行為止；超過上限回傳 None
async fn read_head(stream: &mut TcpStream) -> Result<Option<String>> {
    let mut head = Vec::new();
    let mut chunk = [0u8; 1024];

    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        head.extend_from_slice(&chunk[..n]);

        if head.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
        if head.len() > MAX_HEAD_BYTES {
            return Ok(None);
        }
    }

    Ok(Some(String::from_utf8_lossy(&head).into_owned()))
}

pub async fn respond(head: &str, handler: &RequestHandler) -> Result<HttpResponse> {
    let mut parts = head.lines().next().unwrap_or_default().split_whitespace();
    let (Some(method), Some(target)) = (parts.next(), parts.next()) else {
        return Ok(HttpResponse::plain_error(400, "malformed request line"));
    };

    if method != "GET" {
        return Ok(HttpResponse::plain_error(405, "only GET is supported"));
    }

    let Some(cep) = query_param(target, "cep") else {
        return Ok(HttpResponse::plain_error(400, "malformed request target"));
    };
    tracing::debug!("{} {}", method, target);

    match handler.handle(cep.as_deref()).await {
        Ok(winner) => {
            tracing::info!("\n{}", winner.render_text());
            HttpResponse::json(200, &winner.to_view())
        }
        Err(e) => {
            tracing::warn!("❌ Lookup failed: {} ({:?})", e, e.category());
            HttpResponse::from_error(&e)
        }
    }
}

/// 外層 None 表示 target 無法解析；內層 None 表示沒有這個參數。
/// 接受 origin-form (`/?cep=`) 與 absolute-form (`http://host/?cep=`)
fn query_param(target: &str, key: &str) -> Option<Option<String>> {
    let url = if target.starts_with('/') {
        Url::parse(&format!("http://localhost{}", target)).ok()?
    } else {
        let url = Url::parse(target).ok()?;
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }
        url
    };
    Some(
        url.query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned()),
    )
}
