//! 실행 통계 -- 수신/저장/저장 실패 카운터와 종료 보고서
//!
//! 카운터는 집계 루프만 갱신하므로 잠금 없이 소유 값으로 관리합니다.
//! 집계 루프가 끝나면 [`RunStatistics`]가 파이프라인으로 반환됩니다.
//!
//! 불변식: `stored + failed == total` (집계 루프 종료 시점)

use std::fmt;

use serde::{Deserialize, Serialize};

/// 보고서 제목
const REPORT_TITLE: &str = "Execution statistics:";

/// 보고서 컬럼 헤더
const REPORT_HEADERS: [&str; 3] = ["Total records received", "Stored", "Failed to store"];

/// 컬럼 구분자
const COLUMN_SEPARATOR: &str = " | ";

/// 한 번의 실행 동안 누적된 레코드 카운터
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatistics {
    /// 집계 루프가 수신한 레코드 수
    pub total: u64,
    /// 싱크 저장에 성공한 레코드 수
    pub stored: u64,
    /// 싱크 저장에 실패한 레코드 수
    pub failed: u64,
}

impl RunStatistics {
    /// 레코드 수신을 기록합니다.
    pub fn record_received(&mut self) {
        self.total += 1;
    }

    /// 저장 성공을 기록합니다.
    pub fn record_stored(&mut self) {
        self.stored += 1;
    }

    /// 저장 실패를 기록합니다.
    pub fn record_failed(&mut self) {
        self.failed += 1;
    }

    /// 수신한 모든 레코드의 처리 결과가 집계되었는지 확인합니다.
    pub fn is_settled(&self) -> bool {
        self.stored + self.failed == self.total
    }

    /// 사람이 읽는 표 형식의 보고서를 생성합니다.
    ///
    /// ```text
    /// Execution statistics:
    /// Total records received | Stored | Failed to store
    ///                      8 |      8 |               0
    /// ```
    ///
    /// 값은 컬럼 폭에 맞춰 오른쪽 정렬되며, 값이 헤더보다 길면 컬럼이 넓어집니다.
    pub fn render_report(&self) -> String {
        let values = [
            self.total.to_string(),
            self.stored.to_string(),
            self.failed.to_string(),
        ];

        let widths: Vec<usize> = REPORT_HEADERS
            .iter()
            .zip(values.iter())
            .map(|(header, value)| header.len().max(value.len()))
            .collect();

        let header_row = REPORT_HEADERS
            .iter()
            .zip(widths.iter())
            .map(|(header, width)| format!("{header:>width$}"))
            .collect::<Vec<_>>()
            .join(COLUMN_SEPARATOR);

        let value_row = values
            .iter()
            .zip(widths.iter())
            .map(|(value, width)| format!("{value:>width$}"))
            .collect::<Vec<_>>()
            .join(COLUMN_SEPARATOR);

        format!("{REPORT_TITLE}\n{header_row}\n{value_row}\n")
    }
}

impl fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total={} stored={} failed={}",
            self.total, self.stored, self.failed
        )
    }
}
