//! 파이프라인 trait -- 모듈 확장 포인트 정의
//!
//! - [`Pipeline`]: start/stop/health_check 생명주기
//! - [`LogSink`]: 레코드를 영속화하는 싱크 (store/close)
//! - [`DynLogSink`]: `Box<dyn DynLogSink>`로 보관하기 위한 dyn-compatible 버전

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::error::{LogconvError, StorageError};
use crate::types::LogRecord;

/// `Send` 가능한 boxed future
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// 모듈 건강 상태
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// 정상 동작
    Healthy,
    /// 동작하지만 성능 저하 등 문제가 있음
    Degraded(String),
    /// 동작하지 않음
    Unhealthy(String),
}

impl HealthStatus {
    /// 정상 상태인지 확인합니다.
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// 비정상 상태인지 확인합니다.
    pub fn is_unhealthy(&self) -> bool {
        matches!(self, Self::Unhealthy(_))
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded(reason) => write!(f, "degraded: {reason}"),
            Self::Unhealthy(reason) => write!(f, "unhealthy: {reason}"),
        }
    }
}

/// 파이프라인 생명주기 trait
///
/// `logconv-daemon`은 이 trait으로 파이프라인을 시작/정지합니다.
pub trait Pipeline: Send + Sync {
    /// 파이프라인을 시작합니다. 이미 실행 중이면 에러를 반환합니다.
    fn start(&mut self) -> impl Future<Output = Result<(), LogconvError>> + Send;

    /// 파이프라인을 정지합니다. 실행 중이 아니면 에러를 반환합니다.
    fn stop(&mut self) -> impl Future<Output = Result<(), LogconvError>> + Send;

    /// 파이프라인의 건강 상태를 확인합니다.
    fn health_check(&self) -> impl Future<Output = HealthStatus> + Send;
}

/// 로그 레코드 영속화 싱크
///
/// 집계 루프가 단독으로 소유하므로 `&mut self`로 호출됩니다.
/// `close()`는 파이프라인 정지 시 정확히 한 번 호출됩니다.
///
/// # 구현 예시
/// ```ignore
/// struct CountingSink(u64);
///
/// impl LogSink for CountingSink {
///     fn name(&self) -> &str { "counting" }
///     async fn store(&mut self, _record: &LogRecord) -> Result<(), StorageError> {
///         self.0 += 1;
///         Ok(())
///     }
///     async fn close(&mut self) -> Result<(), StorageError> { Ok(()) }
/// }
/// ```
pub trait LogSink: Send + Sync {
    /// 싱크 이름 (로그용)
    fn name(&self) -> &str;

    /// 레코드 하나를 저장합니다.
    fn store(
        &mut self,
        record: &LogRecord,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// 싱크 연결을 닫고 버퍼를 비웁니다.
    fn close(&mut self) -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// dyn-compatible 싱크 trait
///
/// `LogSink`은 RPITIT를 사용하므로 `dyn LogSink`이 불가합니다.
/// `LogSink`을 구현한 타입은 자동으로 `DynLogSink`도 구현됩니다.
pub trait DynLogSink: Send + Sync {
    /// 싱크 이름
    fn name(&self) -> &str;

    /// 레코드 하나를 저장합니다.
    fn store<'a>(&'a mut self, record: &'a LogRecord) -> BoxFuture<'a, Result<(), StorageError>>;

    /// 싱크를 닫습니다.
    fn close(&mut self) -> BoxFuture<'_, Result<(), StorageError>>;
}

impl<T: LogSink> DynLogSink for T {
    fn name(&self) -> &str {
        LogSink::name(self)
    }

    fn store<'a>(&'a mut self, record: &'a LogRecord) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(LogSink::store(self, record))
    }

    fn close(&mut self) -> BoxFuture<'_, Result<(), StorageError>> {
        Box::pin(LogSink::close(self))
    }
}
