//! 파일 테일 생산자
//!
//! 로그 파일을 감시하며 새로운 라인이 추가되면 파싱하여 전달합니다.
//! `tail -f`와 유사한 동작을 폴링 기반 비동기 방식으로 구현합니다.
//!
//! # 동작
//! - `follow = false`: 현재 EOF까지 읽고 종료 (마지막 미완성 라인도 전달)
//! - `follow = true`: EOF에서 `poll_interval`만큼 대기 후 다시 읽음
//! - 파일 크기 축소(truncation) 감지 시 처음부터 다시 읽음
//! - 경로가 다른 파일로 교체되면(로테이션) 기존 파일의 남은 라인을 읽은 뒤 새 파일을 처음부터 읽음
//! - follow 중 파일이 삭제되면 종료
//! - 취소 토큰이 취소되면 즉시 종료

use std::io::SeekFrom;
use std::os::unix::fs::MetadataExt;
use std::path::PathBuf;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use logconv_core::metrics as m;
use logconv_core::types::LogRecord;

use super::{TailOptions, TailSummary};
use crate::error::LogPipelineError;
use crate::parser::parse_line;

/// 파일 하나를 테일링하는 생산자
///
/// [`run`](FileTailer::run)을 `tokio::spawn`으로 별도 태스크에서 실행합니다.
pub struct FileTailer {
    /// 감시할 파일 경로
    path: PathBuf,
    /// 경로 문자열 (레코드/에러에 기록)
    path_str: String,
    /// 형식 태그
    format: String,
    /// 테일링 옵션
    options: TailOptions,
    /// 레코드 전송 채널
    record_tx: mpsc::Sender<LogRecord>,
    /// 에러 전송 채널
    error_tx: mpsc::Sender<LogPipelineError>,
    /// 종료 신호
    cancel: CancellationToken,
}

impl FileTailer {
    /// 새 생산자를 생성합니다.
    pub fn new(
        path: impl Into<PathBuf>,
        format: impl Into<String>,
        options: TailOptions,
        record_tx: mpsc::Sender<LogRecord>,
        error_tx: mpsc::Sender<LogPipelineError>,
        cancel: CancellationToken,
    ) -> Self {
        let path = path.into();
        let path_str = path.display().to_string();
        Self {
            path,
            path_str,
            format: format.into(),
            options,
            record_tx,
            error_tx,
            cancel,
        }
    }

    /// 테일링을 실행합니다.
    ///
    /// 파일 끝에 도달하고 `follow`가 꺼져 있거나, 취소되거나, 채널이 닫히면 반환합니다.
    /// 시작 실패 시 에러 채널로 [`LogPipelineError::TailStart`]를 한 번 보내고 반환합니다.
    pub async fn run(self) -> TailSummary {
        tracing::info!(
            path = %self.path_str,
            format = %self.format,
            follow = self.options.follow,
            "starting tailing and converting file"
        );

        let mut summary = TailSummary::default();

        let file = match self.open().await {
            Ok(Some(file)) => file,
            Ok(None) => return summary,
            Err(e) => {
                metrics::counter!(m::PIPELINE_TAIL_START_FAILURES_TOTAL).increment(1);
                tracing::error!(path = %self.path_str, error = %e, "tail start failed");
                let _ = self.error_tx.send(e).await;
                return summary;
            }
        };

        let mut reader = BufReader::new(file);
        let mut offset: u64 = 0;
        let mut pending: Vec<u8> = Vec::new();
        // 경로가 새 파일로 교체됨 (기존 핸들을 EOF까지 읽은 뒤 전환)
        let mut rotated = false;

        loop {
            if self.cancel.is_cancelled() {
                tracing::debug!(path = %self.path_str, "tailer cancelled");
                break;
            }

            let read = match reader.read_until(b'\n', &mut pending).await {
                Ok(read) => read,
                Err(e) => {
                    let err = LogPipelineError::Collector {
                        path: self.path_str.clone(),
                        reason: e.to_string(),
                    };
                    tracing::error!(path = %self.path_str, error = %e, "failed to read file");
                    let _ = self.error_tx.send(err).await;
                    break;
                }
            };

            if read > 0 {
                offset += read as u64;
                if pending.last() == Some(&b'\n') {
                    let raw = std::mem::take(&mut pending);
                    if !self.handle_line(&raw, &mut summary).await {
                        break;
                    }
                }
                // 개행이 없으면 미완성 라인이므로 다음 읽기에서 이어 붙인다
                continue;
            }

            // EOF
            if !self.options.follow || rotated {
                if !pending.is_empty() {
                    let raw = std::mem::take(&mut pending);
                    if !self.handle_line(&raw, &mut summary).await {
                        break;
                    }
                }
                if !rotated {
                    break;
                }

                match File::open(&self.path).await {
                    Ok(file) => {
                        tracing::info!(path = %self.path_str, "file rotated, following the new file");
                        reader = BufReader::new(file);
                        offset = 0;
                        rotated = false;
                        continue;
                    }
                    Err(e) => {
                        tracing::info!(
                            path = %self.path_str,
                            error = %e,
                            "rotated file is gone, stopping tailer"
                        );
                        break;
                    }
                }
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.options.poll_interval) => {}
            }

            match self.file_state(reader.get_ref(), offset).await {
                Ok(FileState::Unchanged) => {}
                Ok(FileState::Truncated { size }) => {
                    tracing::warn!(
                        path = %self.path_str,
                        previous_offset = offset,
                        current_size = size,
                        "file truncated, reading from the beginning"
                    );
                    if let Err(e) = reader.seek(SeekFrom::Start(0)).await {
                        tracing::error!(path = %self.path_str, error = %e, "failed to rewind file");
                        break;
                    }
                    offset = 0;
                    pending.clear();
                }
                Ok(FileState::Replaced) => {
                    tracing::debug!(path = %self.path_str, "path now points to a different file");
                    rotated = true;
                }
                Ok(FileState::Removed) => {
                    tracing::info!(path = %self.path_str, "file removed, stopping tailer");
                    break;
                }
                Err(e) => {
                    tracing::warn!(path = %self.path_str, error = %e, "failed to stat file");
                }
            }
        }

        tracing::info!(
            path = %self.path_str,
            lines = summary.lines,
            records = summary.records,
            parse_errors = summary.parse_errors,
            "tailer finished"
        );
        summary
    }

    /// 파일을 엽니다.
    ///
    /// `must_exist`가 꺼져 있고 파일이 없으면, follow 모드에서는 생성될 때까지 대기하고
    /// 그렇지 않으면 `Ok(None)`을 반환합니다.
    async fn open(&self) -> Result<Option<File>, LogPipelineError> {
        loop {
            match File::open(&self.path).await {
                Ok(file) => {
                    let meta = file.metadata().await.map_err(|e| self.start_error(&e))?;
                    if !meta.is_file() {
                        return Err(LogPipelineError::TailStart {
                            path: self.path_str.clone(),
                            reason: "not a regular file".to_owned(),
                        });
                    }
                    return Ok(Some(file));
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound && !self.options.must_exist => {
                    if !self.options.follow {
                        tracing::warn!(path = %self.path_str, "file does not exist, nothing to tail");
                        return Ok(None);
                    }
                    tracing::debug!(path = %self.path_str, "waiting for file to appear");
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => return Ok(None),
                        _ = tokio::time::sleep(self.options.poll_interval) => {}
                    }
                }
                Err(e) => return Err(self.start_error(&e)),
            }
        }
    }

    /// 열린 핸들과 경로를 비교하여 파일 상태를 판별합니다.
    ///
    /// 크기 비교는 열린 핸들 기준이고, 교체 여부는 경로와 핸들의 (dev, inode)로 판단합니다.
    async fn file_state(&self, file: &File, offset: u64) -> std::io::Result<FileState> {
        let path_meta = match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(FileState::Removed),
            Err(e) => return Err(e),
        };
        let handle_meta = file.metadata().await?;

        if (path_meta.dev(), path_meta.ino()) != (handle_meta.dev(), handle_meta.ino()) {
            return Ok(FileState::Replaced);
        }
        if handle_meta.len() < offset {
            return Ok(FileState::Truncated {
                size: handle_meta.len(),
            });
        }
        Ok(FileState::Unchanged)
    }

    fn start_error(&self, e: &std::io::Error) -> LogPipelineError {
        LogPipelineError::TailStart {
            path: self.path_str.clone(),
            reason: e.to_string(),
        }
    }

    /// 라인 하나를 파싱하여 해당 채널로 보냅니다.
    ///
    /// 취소되었거나 수신측이 닫혀 더 이상 진행할 수 없으면 `false`를 반환합니다.
    async fn handle_line(&self, raw: &[u8], summary: &mut TailSummary) -> bool {
        summary.lines += 1;
        let line = decode_line(raw);

        tracing::debug!(path = %self.path_str, line = summary.lines, "line tailed");

        match parse_line(&self.path_str, &line, &self.format, summary.lines) {
            Ok(record) => {
                let sent = tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => false,
                    res = self.record_tx.send(record) => res.is_ok(),
                };
                if sent {
                    summary.records += 1;
                }
                sent
            }
            Err(e) => {
                summary.parse_errors += 1;
                metrics::counter!(m::PIPELINE_PARSE_ERRORS_TOTAL, m::LABEL_ERROR_KIND => e.kind.label())
                    .increment(1);
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => false,
                    res = self.error_tx.send(e.into()) => res.is_ok(),
                }
            }
        }
    }
}

/// follow 중 폴링마다 판별하는 파일 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileState {
    Unchanged,
    /// 같은 파일이 읽은 위치보다 짧아짐
    Truncated { size: u64 },
    /// 경로가 다른 파일을 가리킴 (rename 후 재생성)
    Replaced,
    Removed,
}

/// 줄 끝(`\n`, `\r\n`)을 제거하고 UTF-8로 디코딩합니다 (잘못된 바이트는 대체 문자).
fn decode_line(raw: &[u8]) -> String {
    let mut end = raw.len();
    if end > 0 && raw[end - 1] == b'\n' {
        end -= 1;
    }
    if end > 0 && raw[end - 1] == b'\r' {
        end -= 1;
    }
    String::from_utf8_lossy(&raw[..end]).into_owned()
}
