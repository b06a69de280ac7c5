//! 설정 관리 -- logconv.toml 파싱 및 런타임 설정
//!
//! [`LogconvConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`LOGCONV_TAIL_FOLLOW=false` 형식)
//! 3. 설정 파일 (`logconv.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), logconv_core::error::LogconvError> {
//! use logconv_core::config::LogconvConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = LogconvConfig::load("logconv.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = LogconvConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, LogconvError};

/// logconv 통합 설정
///
/// `logconv.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogconvConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 감시할 파일 목록 (파일 경로 -> 형식 태그)
    #[serde(default)]
    pub files: BTreeMap<String, String>,
    /// 테일링 설정
    #[serde(default)]
    pub tail: TailConfig,
    /// 파이프라인 설정
    #[serde(default)]
    pub pipeline: PipelineSection,
    /// 스토리지(싱크) 설정
    #[serde(default)]
    pub storage: StorageConfig,
}

impl LogconvConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LogconvError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 및 검증 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, LogconvError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LogconvError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LogconvError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, LogconvError> {
        toml::from_str(toml_str).map_err(|e| {
            LogconvError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOGCONV_{SECTION}_{FIELD}`
    /// 파일 목록은 `LOGCONV_FILES_JSON`에 JSON 객체(`{"경로":"태그"}`)로 지정합니다.
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "LOGCONV_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LOGCONV_GENERAL_LOG_FORMAT");

        // Files
        override_file_map(&mut self.files, "LOGCONV_FILES_JSON");

        // Tail
        override_bool(&mut self.tail.must_exist, "LOGCONV_TAIL_MUST_EXIST");
        override_bool(&mut self.tail.follow, "LOGCONV_TAIL_FOLLOW");
        override_u64(
            &mut self.tail.poll_interval_ms,
            "LOGCONV_TAIL_POLL_INTERVAL_MS",
        );

        // Pipeline
        override_usize(
            &mut self.pipeline.channel_capacity,
            "LOGCONV_PIPELINE_CHANNEL_CAPACITY",
        );
        override_u64(
            &mut self.pipeline.store_timeout_ms,
            "LOGCONV_PIPELINE_STORE_TIMEOUT_MS",
        );

        // Storage
        override_string(&mut self.storage.output_dir, "LOGCONV_STORAGE_OUTPUT_DIR");
        override_string(&mut self.storage.collection, "LOGCONV_STORAGE_COLLECTION");
        override_bool(
            &mut self.storage.drop_collection,
            "LOGCONV_STORAGE_DROP_COLLECTION",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// 형식 태그의 등록 여부는 파이프라인 크레이트가 별도로 검증합니다.
    pub fn validate(&self) -> Result<(), LogconvError> {
        const MAX_POLL_INTERVAL_MS: u64 = 60_000;
        const MAX_CHANNEL_CAPACITY: usize = 1_000_000;

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.files.is_empty() {
            return Err(invalid("files", "at least one file must be configured"));
        }

        for (path, tag) in &self.files {
            if path.trim().is_empty() {
                return Err(invalid("files", "file path must not be empty"));
            }
            if tag.trim().is_empty() {
                return Err(invalid(
                    "files",
                    format!("format tag for '{path}' must not be empty"),
                ));
            }
        }

        if self.tail.poll_interval_ms == 0 || self.tail.poll_interval_ms > MAX_POLL_INTERVAL_MS {
            return Err(invalid(
                "tail.poll_interval_ms",
                format!("must be 1-{MAX_POLL_INTERVAL_MS}"),
            ));
        }

        if self.pipeline.channel_capacity == 0
            || self.pipeline.channel_capacity > MAX_CHANNEL_CAPACITY
        {
            return Err(invalid(
                "pipeline.channel_capacity",
                format!("must be 1-{MAX_CHANNEL_CAPACITY}"),
            ));
        }

        if self.storage.collection.trim().is_empty() {
            return Err(invalid("storage.collection", "must not be empty"));
        }

        if self.storage.collection.contains(['/', '\\']) {
            return Err(invalid(
                "storage.collection",
                "must not contain path separators",
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> LogconvError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.into(),
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 테일링 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TailConfig {
    /// 파일이 없으면 즉시 실패
    pub must_exist: bool,
    /// EOF 이후에도 추가되는 라인을 계속 감시
    pub follow: bool,
    /// 파일 증가 확인 주기 (밀리초)
    pub poll_interval_ms: u64,
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            must_exist: false,
            follow: true,
            poll_interval_ms: 250,
        }
    }
}

/// 파이프라인 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSection {
    /// 생산자 -> 집계 루프 채널 용량 (가득 차면 생산자가 대기)
    pub channel_capacity: usize,
    /// 싱크 저장 타임아웃 (밀리초, 0이면 무제한)
    pub store_timeout_ms: u64,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
            store_timeout_ms: 0,
        }
    }
}

/// 스토리지 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// 컬렉션 파일을 저장할 디렉토리
    pub output_dir: String,
    /// 컬렉션 이름 (`{output_dir}/{collection}.jsonl`)
    pub collection: String,
    /// 시작 시 기존 컬렉션 삭제
    pub drop_collection: bool,
}

impl StorageConfig {
    /// 컬렉션 파일 경로를 반환합니다.
    pub fn collection_path(&self) -> PathBuf {
        Path::new(&self.output_dir).join(format!("{}.jsonl", self.collection))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: "/var/lib/logconv".to_owned(),
            collection: "logs".to_owned(),
            drop_collection: false,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_file_map(target: &mut BTreeMap<String, String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match serde_json::from_str::<BTreeMap<String, String>>(&val) {
            Ok(parsed) => *target = parsed,
            Err(e) => warn!(
                env_key,
                error = %e,
                "failed to parse file map JSON from env var, ignoring"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn with_one_file() -> LogconvConfig {
        let mut config = LogconvConfig::default();
        config
            .files
            .insert("/var/log/app.log".to_owned(), "first".to_owned());
        config
    }

    #[test]
    fn default_config_has_sane_values() {
        let config = LogconvConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert!(config.tail.follow);
        assert!(!config.tail.must_exist);
        assert_eq!(config.pipeline.channel_capacity, 1024);
        assert_eq!(config.pipeline.store_timeout_ms, 0);
        assert!(config.files.is_empty());
    }

    #[test]
    fn default_config_requires_files() {
        let err = LogconvConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("files"));
        with_one_file().validate().unwrap();
    }

    #[test]
    fn from_str_full_toml() {
        let toml = r#"
[general]
log_level = "debug"
log_format = "json"

[files]
"/var/log/a.log" = "first"
"/var/log/b.log" = "second_format"

[tail]
must_exist = true
follow = false
poll_interval_ms = 50

[pipeline]
channel_capacity = 16
store_timeout_ms = 2000

[storage]
output_dir = "/tmp/logconv"
collection = "events"
drop_collection = true
"#;
        let config = LogconvConfig::parse(toml).unwrap();
        config.validate().unwrap();
        assert_eq!(config.files.len(), 2);
        assert_eq!(config.files["/var/log/b.log"], "second_format");
        assert!(config.tail.must_exist);
        assert!(!config.tail.follow);
        assert_eq!(config.pipeline.store_timeout_ms, 2000);
        assert_eq!(
            config.storage.collection_path(),
            PathBuf::from("/tmp/logconv/events.jsonl")
        );
    }

    #[test]
    fn from_str_partial_toml_merges_with_defaults() {
        let config = LogconvConfig::parse("[tail]\nfollow = false\n").unwrap();
        assert!(!config.tail.follow);
        assert_eq!(config.tail.poll_interval_ms, 250);
        assert_eq!(config.general.log_format, "pretty");
    }

    #[test]
    fn from_str_invalid_toml_returns_error() {
        let err = LogconvConfig::parse("invalid = [[[toml").unwrap_err();
        assert!(matches!(
            err,
            LogconvError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = with_one_file();
        config.general.log_level = "verbose".to_owned();
        assert!(config.validate().unwrap_err().to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_zero_poll_interval() {
        let mut config = with_one_file();
        config.tail.poll_interval_ms = 0;
        assert!(
            config
                .validate()
                .unwrap_err()
                .to_string()
                .contains("poll_interval_ms")
        );
    }

    #[test]
    fn validate_rejects_zero_channel_capacity() {
        let mut config = with_one_file();
        config.pipeline.channel_capacity = 0;
        assert!(
            config
                .validate()
                .unwrap_err()
                .to_string()
                .contains("channel_capacity")
        );
    }

    #[test]
    fn validate_rejects_collection_with_separator() {
        let mut config = with_one_file();
        config.storage.collection = "../escape".to_owned();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_format_tag() {
        let mut config = LogconvConfig::default();
        config.files.insert("/var/log/x.log".to_owned(), " ".to_owned());
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn env_override_file_map_json() {
        let mut config = with_one_file();
        // SAFETY: serial 테스트로 실행되므로 환경변수 조작이 안전합니다.
        unsafe {
            std::env::set_var(
                "LOGCONV_FILES_JSON",
                r#"{"/tmp/one.log":"first_format","/tmp/two.log":"second"}"#,
            )
        };
        config.apply_env_overrides();
        unsafe { std::env::remove_var("LOGCONV_FILES_JSON") };

        assert_eq!(config.files.len(), 2);
        assert_eq!(config.files["/tmp/one.log"], "first_format");
    }

    #[test]
    #[serial]
    fn env_override_invalid_json_keeps_original() {
        let mut config = with_one_file();
        // SAFETY: serial 테스트로 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("LOGCONV_FILES_JSON", "not json") };
        config.apply_env_overrides();
        unsafe { std::env::remove_var("LOGCONV_FILES_JSON") };

        assert_eq!(config.files.len(), 1);
        assert!(config.files.contains_key("/var/log/app.log"));
    }

    #[test]
    #[serial]
    fn env_override_bool_and_numbers() {
        let mut config = with_one_file();
        // SAFETY: serial 테스트로 실행되므로 환경변수 조작이 안전합니다.
        unsafe {
            std::env::set_var("LOGCONV_TAIL_FOLLOW", "false");
            std::env::set_var("LOGCONV_PIPELINE_CHANNEL_CAPACITY", "64");
            std::env::set_var("LOGCONV_TAIL_POLL_INTERVAL_MS", "not-a-number");
        }
        config.apply_env_overrides();
        unsafe {
            std::env::remove_var("LOGCONV_TAIL_FOLLOW");
            std::env::remove_var("LOGCONV_PIPELINE_CHANNEL_CAPACITY");
            std::env::remove_var("LOGCONV_TAIL_POLL_INTERVAL_MS");
        }

        assert!(!config.tail.follow);
        assert_eq!(config.pipeline.channel_capacity, 64);
        assert_eq!(config.tail.poll_interval_ms, 250); // 원래 값 유지
    }

    #[test]
    fn config_serialize_roundtrip() {
        let config = with_one_file();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = LogconvConfig::parse(&toml_str).unwrap();
        assert_eq!(config.files, parsed.files);
        assert_eq!(config.storage.collection, parsed.storage.collection);
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let err = LogconvConfig::from_file("/nonexistent/path/logconv.toml")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LogconvError::Config(ConfigError::FileNotFound { .. })
        ));
    }

    #[tokio::test]
    #[serial]
    async fn load_reads_file_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logconv.toml");
        std::fs::write(&path, "[files]\n\"/tmp/app.log\" = \"first\"\n").unwrap();

        let config = LogconvConfig::load(&path).await.unwrap();
        assert_eq!(config.files["/tmp/app.log"], "first");
    }
}
