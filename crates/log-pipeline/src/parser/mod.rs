//! 라인 파서 -- 원시 로그 한 줄을 [`LogRecord`]로 변환합니다.
//!
//! 라인 구조는 `<timestamp> | <message>` 입니다. 타임스탬프 레이아웃은
//! 파일별 형식 태그로 [`format`] 레지스트리에서 조회합니다.
//!
//! # 처리 순서
//! 1. 첫 번째 구분자(`" | "`) 기준으로 타임스탬프 필드와 메시지를 분리
//! 2. 구분자가 없으면 구조 에러
//! 3. 형식 태그로 레이아웃 조회 (미등록 태그는 형식 에러)
//! 4. 타임스탬프 파싱 (불일치 시 타임스탬프 에러)
//! 5. 메시지는 첫 구분자 이후 전체를 원문 그대로 사용 (메시지 내부의 구분자 보존)
//!
//! # 사용 예시
//! ```
//! use logconv_pipeline::parser::parse_line;
//!
//! let record = parse_line("app.log", "2021-01-02 15:04:05 | a | b", "first", 1).unwrap();
//! assert_eq!(record.message, "a | b");
//! ```

pub mod format;

pub use format::{FORMATS, Layout, layout_for};

use logconv_core::types::LogRecord;

use crate::error::{LineParseError, ParseErrorKind};

/// 타임스탬프와 메시지를 나누는 구분자
pub const SEPARATOR: &str = " | ";

/// 원시 라인 하나를 파싱합니다.
///
/// 실패 시 파일, 라인 번호, 원시 라인, 원인을 담은 [`LineParseError`]를 반환합니다.
pub fn parse_line(
    source_file: &str,
    raw_line: &str,
    format: &str,
    line_number: u64,
) -> Result<LogRecord, LineParseError> {
    let fail = |kind: ParseErrorKind| LineParseError {
        source_file: source_file.to_owned(),
        line_number,
        raw_line: raw_line.to_owned(),
        kind,
    };

    // splitn(2)이므로 메시지 안의 구분자는 잘리지 않고 그대로 남는다
    let mut fields = raw_line.splitn(2, SEPARATOR);
    let (time_field, message) = match (fields.next(), fields.next()) {
        (Some(time_field), Some(message)) => (time_field, message),
        _ => return Err(fail(ParseErrorKind::MalformedStructure)),
    };

    let layout = layout_for(format).map_err(fail)?;

    let timestamp = layout.parse(time_field).map_err(|source| {
        fail(ParseErrorKind::InvalidTimestamp {
            value: time_field.to_owned(),
            format: format.to_owned(),
            source,
        })
    })?;

    Ok(LogRecord {
        timestamp,
        message: message.to_owned(),
        source_file: source_file.to_owned(),
        format: format.to_owned(),
    })
}
