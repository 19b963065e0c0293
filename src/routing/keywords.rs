//! 키워드/패턴 테이블
//!
//! 도메인별 가중치 키워드 사전과 정규식 패턴 목록입니다.
//! 라우터 생성 시 한 번 구성되고 이후에는 읽기 전용입니다.
//!
//! - 법령: 관세법 조문 질의
//! - 규제: 수출입 허용/금지/요건
//! - 상담: 통관 절차, 민원 사례
//! - 동식물: 수입 의도 패턴 + 품목 목록

use regex::Regex;

// ============================================================================
// KeywordTable
// ============================================================================

/// 키워드 → 가중치 테이블
///
/// 입력 순서를 유지합니다. 키워드는 정규화된 쿼리와 비교하므로 소문자로 저장합니다.
#[derive(Debug, Clone, Default)]
pub struct KeywordTable {
    entries: Vec<(String, f32)>,
}

impl KeywordTable {
    pub fn new<K: Into<String>>(entries: impl IntoIterator<Item = (K, f32)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, w)| (k.into().to_lowercase(), w))
                .collect(),
        }
    }

    /// 쿼리에 부분 문자열로 포함된 키워드의 가중치 합
    pub fn weight_sum(&self, text: &str) -> f32 {
        self.entries
            .iter()
            .filter(|(keyword, _)| text.contains(keyword.as_str()))
            .map(|(_, weight)| weight)
            .sum()
    }

    /// 쿼리에 포함된 키워드 목록 (테이블 순서)
    pub fn matches<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .map(|(keyword, _)| keyword.as_str())
            .filter(move |keyword| text.contains(keyword))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// PatternList
// ============================================================================

/// 정규식 패턴 목록
///
/// 매칭되는 패턴마다 고정 점수(`increment`)를 더합니다.
#[derive(Debug, Clone)]
pub struct PatternList {
    patterns: Vec<Regex>,
    increment: f32,
}

impl PatternList {
    pub fn new(patterns: &[&str], increment: f32) -> Result<Self, regex::Error> {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            patterns,
            increment,
        })
    }

    /// 내장 패턴 컴파일 (상수 패턴 전용)
    fn builtin(patterns: &[&str], increment: f32) -> Self {
        Self::new(patterns, increment).expect("builtin routing patterns are valid")
    }

    /// 매칭된 패턴 수 × increment
    pub fn bonus(&self, text: &str) -> f32 {
        let hits = self.patterns.iter().filter(|re| re.is_match(text)).count();
        hits as f32 * self.increment
    }

    pub fn increment(&self) -> f32 {
        self.increment
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

// ============================================================================
// ProductList
// ============================================================================

/// 동식물 품목 목록
#[derive(Debug, Clone, Default)]
pub struct ProductList {
    products: Vec<String>,
}

impl ProductList {
    pub fn new<P: Into<String>>(products: impl IntoIterator<Item = P>) -> Self {
        Self {
            products: products
                .into_iter()
                .map(|p| p.into().to_lowercase())
                .collect(),
        }
    }

    /// 첫 번째로 포함된 품목 (short-circuit)
    pub fn first_match(&self, text: &str) -> Option<&str> {
        self.products
            .iter()
            .map(String::as_str)
            .find(|product| text.contains(product))
    }

    /// 포함된 모든 품목 (테이블 순서)
    pub fn all_matches(&self, text: &str) -> Vec<String> {
        self.products
            .iter()
            .filter(|product| text.contains(product.as_str()))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

// ============================================================================
// DomainTables
// ============================================================================

/// 법령 패턴 점수
pub const LAW_PATTERN_BONUS: f32 = 0.4;
/// 수입 의도 패턴 점수
pub const IMPORT_PATTERN_BONUS: f32 = 0.4;
/// 규제/상담 패턴 점수
pub const DOMAIN_PATTERN_BONUS: f32 = 0.3;

/// 라우터가 사용하는 전체 테이블 묶음
#[derive(Debug, Clone)]
pub struct DomainTables {
    pub law_keywords: KeywordTable,
    pub law_patterns: PatternList,
    pub import_patterns: PatternList,
    pub products: ProductList,
    pub regulation_keywords: KeywordTable,
    pub regulation_patterns: PatternList,
    pub consultation_keywords: KeywordTable,
    pub consultation_patterns: PatternList,
}

impl Default for DomainTables {
    fn default() -> Self {
        Self::builtin()
    }
}

impl DomainTables {
    /// 내장 테이블
    pub fn builtin() -> Self {
        Self {
            law_keywords: KeywordTable::new([
                ("관세법", 0.5),
                ("시행령", 0.3),
                ("시행규칙", 0.3),
                ("조문", 0.3),
                ("조항", 0.3),
                ("법령", 0.3),
                ("법률", 0.2),
                ("고시", 0.2),
                ("훈령", 0.2),
                ("별표", 0.2),
            ]),
            law_patterns: PatternList::builtin(
                &[
                    r"관세법.*제.*조",
                    r"제\s*\d+\s*조",
                    r"(시행령|시행규칙).*제.*조",
                    r"관세법.*(내용|규정|조항|조문)",
                    r"제\s*\d+\s*항",
                ],
                LAW_PATTERN_BONUS,
            ),
            import_patterns: PatternList::builtin(
                &[
                    r"(어느|어떤|무슨)\s*나라.*수입",
                    r"수입.*(가능|허용|금지|되나|돼)",
                    r"수입해야",
                    r"(수입|반입).*(국가|나라|지역)",
                    r"들여\s*(오|와)",
                ],
                IMPORT_PATTERN_BONUS,
            ),
            products: ProductList::new([
                "딸기", "사과", "바나나", "망고", "오렌지", "포도", "체리", "키위", "레몬",
                "파인애플", "아보카도", "감자", "양파", "마늘", "고추", "당근", "버섯",
                "인삼", "쌀", "옥수수", "대두", "참깨", "소고기", "쇠고기",
                "돼지고기", "닭고기", "양고기", "계란", "우유", "치즈", "꿀", "연어",
                "새우", "생선", "종자", "묘목", "화훼", "꽃",
            ]),
            regulation_keywords: KeywordTable::new([
                ("규제", 0.3),
                ("금지", 0.3),
                ("허용", 0.2),
                ("제한", 0.2),
                ("수입요건", 0.3),
                ("요건", 0.2),
                ("검역", 0.3),
                ("허가", 0.2),
                ("승인", 0.2),
                ("인증", 0.2),
                ("동식물", 0.3),
                ("수출입", 0.2),
                ("무역", 0.1),
                ("관세율", 0.2),
                ("hs코드", 0.3),
                ("품목분류", 0.3),
                ("원산지", 0.2),
            ]),
            regulation_patterns: PatternList::builtin(
                &[
                    r"(수입|수출).*(허용|금지|제한)",
                    r"(검역|인증|허가|승인).*(필요|요건|대상)",
                    r"(허용|금지).*(국가|지역|품목)",
                    r"hs\s*코드|품목\s*분류",
                    r"관세율.*(얼마|몇)",
                ],
                DOMAIN_PATTERN_BONUS,
            ),
            consultation_keywords: KeywordTable::new([
                ("통관", 0.3),
                ("절차", 0.3),
                ("방법", 0.2),
                ("어떻게", 0.2),
                ("신고", 0.2),
                ("사례", 0.3),
                ("상담", 0.3),
                ("문의", 0.2),
                ("경험", 0.2),
                ("해외직구", 0.3),
                ("직구", 0.2),
                ("개인통관", 0.3),
                ("배송", 0.2),
                ("택배", 0.2),
                ("세금", 0.2),
                ("면세", 0.2),
                ("반품", 0.2),
                ("서류", 0.2),
            ]),
            consultation_patterns: PatternList::builtin(
                &[
                    r"어떻게\s*(해야|하나요|되나요|하면|하죠)",
                    r"(절차|방법).*(알려|궁금|무엇|뭐)",
                    r"(해외\s*직구|개인\s*통관)",
                    r"(신고|통관).*(절차|방법|서류)",
                    r"(사례|경험).*(있|알려)",
                ],
                DOMAIN_PATTERN_BONUS,
            ),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_weight_sum() {
        let table = KeywordTable::new([("통관", 0.3), ("절차", 0.3), ("세금", 0.2)]);
        let sum = table.weight_sum("통관 절차");
        assert!((sum - 0.6).abs() < 1e-6);
        assert_eq!(table.weight_sum("무관한 문장"), 0.0);
    }

    #[test]
    fn test_keyword_lowercased() {
        let table = KeywordTable::new([("HS코드", 0.3)]);
        assert!((table.weight_sum("hs코드 조회") - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_keyword_matches_in_table_order() {
        let table = KeywordTable::new([("절차", 0.3), ("통관", 0.3)]);
        let found: Vec<&str> = table.matches("통관 절차").collect();
        assert_eq!(found, vec!["절차", "통관"]);
    }

    #[test]
    fn test_pattern_bonus_counts_each_match() {
        let list = PatternList::new(&[r"관세법.*제.*조", r"제\s*\d+\s*조"], 0.4).unwrap();
        assert!((list.bonus("관세법 제1조") - 0.8).abs() < 1e-6);
        assert_eq!(list.bonus("통관"), 0.0);
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        assert!(PatternList::new(&["(unclosed"], 0.3).is_err());
    }

    #[test]
    fn test_product_first_and_all() {
        let products = ProductList::new(["딸기", "사과", "포도"]);
        assert_eq!(products.first_match("포도와 딸기"), Some("딸기"));
        assert_eq!(products.all_matches("포도와 딸기"), vec!["딸기", "포도"]);
        assert_eq!(products.first_match("통관"), None);
    }

    #[test]
    fn test_builtin_tables_compile() {
        let tables = DomainTables::builtin();
        assert!(!tables.law_keywords.is_empty());
        assert_eq!(tables.law_patterns.increment(), LAW_PATTERN_BONUS);
        assert_eq!(tables.import_patterns.increment(), IMPORT_PATTERN_BONUS);
        assert_eq!(tables.regulation_patterns.increment(), DOMAIN_PATTERN_BONUS);
        assert!(tables.products.len() > 10);
    }
}
