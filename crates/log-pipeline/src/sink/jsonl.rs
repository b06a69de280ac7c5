//! JSON Lines 파일 싱크
//!
//! 레코드 하나를 JSON 객체 한 줄로 `{output_dir}/{collection}.jsonl`에 추가합니다.
//! 필드 이름은 [`LogRecord`]의 serde 표현(`log_time`, `log_msg`, `file_name`, `log_format`)을 따릅니다.

use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};

use logconv_core::config::StorageConfig;
use logconv_core::error::StorageError;
use logconv_core::pipeline::LogSink;
use logconv_core::types::LogRecord;

/// JSON Lines 파일 싱크
pub struct JsonLinesSink {
    /// 컬렉션 파일 경로
    path: PathBuf,
    /// 열린 파일 (close 이후 None)
    writer: Option<BufWriter<File>>,
}

impl JsonLinesSink {
    /// 저장소 설정으로 싱크를 엽니다.
    ///
    /// 출력 디렉토리가 없으면 생성하고, `drop_collection`이 켜져 있으면
    /// 기존 컬렉션 파일을 비운 뒤 엽니다.
    pub async fn open(config: &StorageConfig) -> Result<Self, StorageError> {
        let path = config.collection_path();
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| open_error(dir, &e))?;
        }

        if config.drop_collection {
            Self::drop_collection(&path).await?;
        }

        Self::open_path(path).await
    }

    /// 지정한 파일 경로에 추가 모드로 싱크를 엽니다.
    pub async fn open_path(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| open_error(&path, &e))?;

        tracing::info!(path = %path.display(), "json lines sink opened");

        Ok(Self {
            path,
            writer: Some(BufWriter::new(file)),
        })
    }

    /// 컬렉션 파일을 삭제합니다. 파일이 없으면 아무것도 하지 않습니다.
    pub async fn drop_collection(path: &Path) -> Result<(), StorageError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                tracing::info!(path = %path.display(), "dropped existing collection");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(open_error(path, &e)),
        }
    }

    /// 컬렉션 파일 경로를 반환합니다.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn open_error(path: &Path, e: &std::io::Error) -> StorageError {
    StorageError::Open {
        target: path.display().to_string(),
        reason: e.to_string(),
    }
}

impl LogSink for JsonLinesSink {
    fn name(&self) -> &str {
        "jsonl"
    }

    async fn store(&mut self, record: &LogRecord) -> Result<(), StorageError> {
        let writer = self.writer.as_mut().ok_or(StorageError::Closed)?;

        let mut line =
            serde_json::to_vec(record).map_err(|e| StorageError::Write(e.to_string()))?;
        line.push(b'\n');

        writer
            .write_all(&line)
            .await
            .map_err(|e| StorageError::Write(e.to_string()))?;
        writer
            .flush()
            .await
            .map_err(|e| StorageError::Write(e.to_string()))?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), StorageError> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };
        writer
            .shutdown()
            .await
            .map_err(|e| StorageError::Close(e.to_string()))?;
        tracing::info!(path = %self.path.display(), "json lines sink closed");
        Ok(())
    }
}
