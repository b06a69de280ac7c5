//! 시간 형식 레지스트리 -- 형식 태그를 타임스탬프 레이아웃으로 매핑합니다.
//!
//! 지원 형식은 빌드 시점에 고정됩니다. 새 형식을 추가하려면
//! [`FORMATS`] 테이블에 태그/레이아웃 한 줄을 추가하면 되며,
//! 파싱 로직은 변경하지 않습니다.
//!
//! | 태그 | 별칭 | 레이아웃 | 예시 |
//! |------|------|----------|------|
//! | `first` | `first_format` | `%Y-%m-%d %H:%M:%S` | `2021-01-02 15:04:05` |
//! | `second` | `second_format` | `%Y-%m-%dT%H:%M:%SZ` | `2021-01-02T15:04:05Z` |

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::ParseErrorKind;

/// 타임스탬프 레이아웃
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// 정규 형식 태그
    pub tag: &'static str,
    /// 기존 설정 파일에서 쓰이던 별칭
    pub alias: &'static str,
    /// chrono strftime 패턴
    pub pattern: &'static str,
}

impl Layout {
    /// 타임스탬프 문자열을 이 레이아웃으로 파싱합니다.
    ///
    /// 레이아웃에 타임존 정보가 없으므로 UTC로 해석합니다.
    pub fn parse(&self, value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        NaiveDateTime::parse_from_str(value, self.pattern).map(|naive| naive.and_utc())
    }
}

/// 등록된 형식 테이블
pub const FORMATS: &[Layout] = &[
    Layout {
        tag: "first",
        alias: "first_format",
        pattern: "%Y-%m-%d %H:%M:%S",
    },
    Layout {
        tag: "second",
        alias: "second_format",
        pattern: "%Y-%m-%dT%H:%M:%SZ",
    },
];

/// 형식 태그에 해당하는 레이아웃을 조회합니다.
///
/// 정규 태그와 별칭 모두 허용합니다. 등록되지 않은 태그는
/// 기본값으로 대체하지 않고 [`ParseErrorKind::UnknownFormat`]을 반환합니다.
pub fn layout_for(tag: &str) -> Result<&'static Layout, ParseErrorKind> {
    FORMATS
        .iter()
        .find(|layout| layout.tag == tag || layout.alias == tag)
        .ok_or_else(|| ParseErrorKind::UnknownFormat(tag.to_owned()))
}

/// 형식 태그가 등록되어 있는지 확인합니다.
pub fn is_registered(tag: &str) -> bool {
    layout_for(tag).is_ok()
}

/// 등록된 정규 태그 목록을 반환합니다.
pub fn registered_tags() -> Vec<&'static str> {
    FORMATS.iter().map(|layout| layout.tag).collect()
}
