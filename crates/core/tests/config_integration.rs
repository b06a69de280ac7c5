//! logconv.toml 통합 설정 테스트
//!
//! - logconv.toml.example 파싱 테스트
//! - 부분 설정 (일부 섹션만) 로딩 테스트
//! - 환경변수 우선순위 테스트
//! - 빈 파일 / 잘못된 형식 에러 테스트

use logconv_core::config::LogconvConfig;
use logconv_core::error::{ConfigError, LogconvError};

const EXAMPLE: &str = include_str!("../../../logconv.toml.example");

/// 검증을 통과하기 위한 최소 파일 목록
const FILES: &str = r#"
[files]
"/var/log/app.log" = "first"
"#;

// =============================================================================
// logconv.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let config = LogconvConfig::parse(EXAMPLE).expect("example config should parse");

    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.general.log_format, "json");
    assert_eq!(config.storage.output_dir, "/var/lib/logconv");
    assert_eq!(config.storage.collection, "logs");
}

#[test]
fn example_config_passes_validation() {
    let config = LogconvConfig::parse(EXAMPLE).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

#[test]
fn example_config_lists_both_formats() {
    let config = LogconvConfig::parse(EXAMPLE).expect("should parse");

    assert_eq!(config.files.len(), 2);
    assert_eq!(
        config.files.get("/var/log/app/first.log").map(String::as_str),
        Some("first_format")
    );
    assert_eq!(
        config.files.get("/var/log/app/second.log").map(String::as_str),
        Some("second_format")
    );
}

#[test]
fn example_config_matches_defaults() {
    let config = LogconvConfig::parse(EXAMPLE).expect("should parse");
    let defaults = LogconvConfig::default();

    assert_eq!(config.tail.must_exist, defaults.tail.must_exist);
    assert_eq!(config.tail.follow, defaults.tail.follow);
    assert_eq!(config.tail.poll_interval_ms, defaults.tail.poll_interval_ms);
    assert_eq!(
        config.pipeline.channel_capacity,
        defaults.pipeline.channel_capacity
    );
    assert_eq!(
        config.pipeline.store_timeout_ms,
        defaults.pipeline.store_timeout_ms
    );
    assert_eq!(
        config.storage.drop_collection,
        defaults.storage.drop_collection
    );
}

// =============================================================================
// 부분 설정 테스트
// =============================================================================

#[test]
fn partial_config_files_only() {
    let config = LogconvConfig::parse(FILES).expect("should parse");
    config.validate().expect("should validate");

    // 나머지 섹션은 기본값
    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.general.log_format, "pretty");
    assert!(config.tail.follow);
    assert_eq!(config.pipeline.channel_capacity, 1024);
    assert_eq!(config.storage.collection, "logs");
}

#[test]
fn partial_config_tail_fields_merge_with_defaults() {
    let toml = format!(
        r#"{FILES}
[tail]
follow = false
"#
    );
    let config = LogconvConfig::parse(&toml).expect("should parse");
    config.validate().expect("should validate");

    assert!(!config.tail.follow);
    // 생략된 필드는 기본값
    assert!(!config.tail.must_exist);
    assert_eq!(config.tail.poll_interval_ms, 250);
}

#[test]
fn partial_config_storage_only() {
    let toml = format!(
        r#"{FILES}
[storage]
collection = "converted"
drop_collection = true
"#
    );
    let config = LogconvConfig::parse(&toml).expect("should parse");
    config.validate().expect("should validate");

    assert_eq!(config.storage.collection, "converted");
    assert!(config.storage.drop_collection);
    assert_eq!(config.storage.output_dir, "/var/lib/logconv");
    assert!(
        config
            .storage
            .collection_path()
            .ends_with("converted.jsonl")
    );
}

// =============================================================================
// 환경변수 우선순위 테스트
// =============================================================================

#[test]
#[serial_test::serial]
fn env_override_takes_precedence_over_toml() {
    let original = std::env::var("LOGCONV_GENERAL_LOG_LEVEL").ok();
    // SAFETY: serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("LOGCONV_GENERAL_LOG_LEVEL", "error");
    }

    let mut config = LogconvConfig::parse(EXAMPLE).expect("should parse");
    config.apply_env_overrides();
    let result = config.general.log_level.clone();

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("LOGCONV_GENERAL_LOG_LEVEL", val),
            None => std::env::remove_var("LOGCONV_GENERAL_LOG_LEVEL"),
        }
    }

    assert_eq!(result, "error");
}

#[test]
#[serial_test::serial]
fn env_file_map_replaces_toml_files() {
    // SAFETY: serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var(
            "LOGCONV_FILES_JSON",
            r#"{"/srv/one.log":"second","/srv/two.log":"first"}"#,
        );
    }

    let mut config = LogconvConfig::parse(EXAMPLE).expect("should parse");
    config.apply_env_overrides();

    // SAFETY: 테스트 정리
    unsafe {
        std::env::remove_var("LOGCONV_FILES_JSON");
    }

    assert_eq!(config.files.len(), 2);
    assert!(config.files.contains_key("/srv/one.log"));
    assert!(!config.files.contains_key("/var/log/app/first.log"));
}

#[test]
#[serial_test::serial]
fn env_override_invalid_value_is_ignored() {
    // SAFETY: serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("LOGCONV_TAIL_POLL_INTERVAL_MS", "soon");
    }

    let mut config = LogconvConfig::parse(EXAMPLE).expect("should parse");
    config.apply_env_overrides();

    // SAFETY: 테스트 정리
    unsafe {
        std::env::remove_var("LOGCONV_TAIL_POLL_INTERVAL_MS");
    }

    assert_eq!(config.tail.poll_interval_ms, 250);
}

// =============================================================================
// 빈 파일 / 잘못된 형식 테스트
// =============================================================================

#[test]
fn empty_string_parses_with_defaults_but_needs_files() {
    let config = LogconvConfig::parse("").expect("empty string should parse");
    assert_eq!(config.general.log_level, "info");
    assert!(matches!(
        config.validate(),
        Err(LogconvError::Config(ConfigError::InvalidValue { .. }))
    ));
}

#[test]
fn comments_only_parses_with_defaults() {
    let toml = r#"
# 주석만 있는 파일
# 모든 줄이 주석입니다
"#;
    let config = LogconvConfig::parse(toml).expect("comments-only should parse");
    assert!(config.files.is_empty());
}

#[test]
fn malformed_toml_returns_parse_error() {
    let err = LogconvConfig::parse("[invalid toml").unwrap_err();
    assert!(matches!(
        err,
        LogconvError::Config(ConfigError::ParseFailed { .. })
    ));
}

#[test]
fn wrong_type_for_numeric_field() {
    let toml = r#"
[pipeline]
channel_capacity = "one thousand"
"#;
    assert!(matches!(
        LogconvConfig::parse(toml).unwrap_err(),
        LogconvError::Config(ConfigError::ParseFailed { .. })
    ));
}

#[test]
fn file_map_values_must_be_strings() {
    let toml = r#"
[files]
"/var/log/app.log" = 1
"#;
    assert!(LogconvConfig::parse(toml).is_err());
}

#[tokio::test]
async fn from_file_nonexistent_returns_file_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let result = LogconvConfig::from_file(dir.path().join("missing.toml")).await;
    assert!(matches!(
        result.unwrap_err(),
        LogconvError::Config(ConfigError::FileNotFound { .. })
    ));
}

#[tokio::test]
#[serial_test::serial]
async fn load_example_config_from_disk() {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let example_path = format!("{}/../../logconv.toml.example", manifest_dir);

    let config = LogconvConfig::load(&example_path)
        .await
        .expect("example should load and validate");
    assert_eq!(config.files.len(), 2);
}

// =============================================================================
// 직렬화 라운드트립 테스트
// =============================================================================

#[test]
fn example_config_serialize_roundtrip() {
    let config = LogconvConfig::parse(EXAMPLE).expect("should parse");
    let serialized = toml::to_string_pretty(&config).expect("should serialize");
    let reparsed = LogconvConfig::parse(&serialized).expect("should reparse");
    reparsed.validate().expect("should validate");

    assert_eq!(config.files, reparsed.files);
    assert_eq!(config.storage.collection, reparsed.storage.collection);
}
