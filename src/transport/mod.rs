// ABOUTME: Resilient HTTP transport used beneath every API call.
// ABOUTME: Exposes the HttpSender seam, the reqwest sender, and the retry decorator.

mod error;
mod retry;
mod sender;

pub use error::{SendFailure, TransportError, TransportErrorKind};
pub use retry::{RetryPolicy, RetryingTransport, calculate_backoff, retry_after_delay};
pub use sender::{FormPart, HttpRequest, HttpResponse, HttpSender, ReqwestSender, RequestBody};
