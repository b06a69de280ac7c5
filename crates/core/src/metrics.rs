//! 메트릭 상수
//!
//! 모든 메트릭의 이름을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()` 매크로를 호출합니다.
//! 레코더가 설치되지 않으면 호출은 아무 동작도 하지 않습니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `logconv_`
//! - 모듈명: `pipeline_`
//! - 접미어: `_total` (counter)
//!
//! # 사용 예시
//!
//! ```ignore
//! metrics::counter!(logconv_core::metrics::PIPELINE_RECORDS_RECEIVED_TOTAL).increment(1);
//! ```

/// 형식 태그 레이블 키
pub const LABEL_FORMAT: &str = "format";

/// 파싱 에러 종류 레이블 키 (structure, format, timestamp)
pub const LABEL_ERROR_KIND: &str = "kind";

/// 집계 루프가 수신한 전체 레코드 수 (counter)
pub const PIPELINE_RECORDS_RECEIVED_TOTAL: &str = "logconv_pipeline_records_received_total";

/// 싱크 저장에 성공한 레코드 수 (counter)
pub const PIPELINE_RECORDS_STORED_TOTAL: &str = "logconv_pipeline_records_stored_total";

/// 싱크 저장에 실패한 레코드 수 (counter)
pub const PIPELINE_STORE_FAILURES_TOTAL: &str = "logconv_pipeline_store_failures_total";

/// 파싱 에러 수 (counter, label: kind)
pub const PIPELINE_PARSE_ERRORS_TOTAL: &str = "logconv_pipeline_parse_errors_total";

/// 테일링 시작 실패 수 (counter)
pub const PIPELINE_TAIL_START_FAILURES_TOTAL: &str =
    "logconv_pipeline_tail_start_failures_total";

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 레코더가 설치되지 않았으면 아무 동작도 하지 않습니다.
/// `logconv-daemon` 시작 시점에 한 번 호출합니다.
pub fn describe_all() {
    use metrics::describe_counter;

    describe_counter!(
        PIPELINE_RECORDS_RECEIVED_TOTAL,
        "Total number of records received by the aggregation loop"
    );
    describe_counter!(
        PIPELINE_RECORDS_STORED_TOTAL,
        "Total number of records stored by the sink"
    );
    describe_counter!(
        PIPELINE_STORE_FAILURES_TOTAL,
        "Total number of records the sink failed to store"
    );
    describe_counter!(
        PIPELINE_PARSE_ERRORS_TOTAL,
        "Total number of lines that failed to parse (by kind)"
    );
    describe_counter!(
        PIPELINE_TAIL_START_FAILURES_TOTAL,
        "Total number of files that could not be tailed"
    );
}
