//! 메타데이터 필터 빌더
//!
//! 평면 `{필드: 값}` 매핑을 ChromaDB `where` 조건으로 변환합니다.
//!
//! - 지원 필드 0개 → 필터 없음
//! - 1개 → `{"field": {"$eq": value}}`
//! - 2개 이상 → `{"$and": [{...}, {...}]}` (입력 순서 유지)
//!
//! ChromaDB는 최상위에 키가 여러 개인 where 객체를 거부하므로
//! 조건이 둘 이상이면 반드시 `$and`로 감쌉니다.
//! ref: https://docs.trychroma.com/docs/querying-collections/metadata-filtering

use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};

/// 필터에 사용할 수 있는 메타데이터 필드
///
/// 목록에 없는 필드는 조용히 버려집니다.
pub const SUPPORTED_FIELDS: &[&str] = &[
    "data_type",
    "data_source",
    "product_name",
    "country",
    "hs_code",
    "regulation_type",
];

/// 필드 지원 여부
pub fn is_supported_field(field: &str) -> bool {
    SUPPORTED_FIELDS.contains(&field)
}

// ============================================================================
// WhereCondition
// ============================================================================

/// 벡터 검색 where 조건
#[derive(Debug, Clone, PartialEq)]
pub enum WhereCondition {
    /// 단일 필드 일치
    Eq { field: String, value: Value },
    /// 모든 조건 충족
    And(Vec<WhereCondition>),
}

impl WhereCondition {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        WhereCondition::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// ChromaDB where JSON
    pub fn to_json(&self) -> Value {
        match self {
            WhereCondition::Eq { field, value } => {
                let mut obj = Map::new();
                obj.insert(field.clone(), json!({ "$eq": value }));
                Value::Object(obj)
            }
            WhereCondition::And(conditions) => {
                json!({ "$and": conditions.iter().map(WhereCondition::to_json).collect::<Vec<_>>() })
            }
        }
    }

    /// 조건에 등장하는 필드 (순서대로)
    pub fn fields(&self) -> Vec<&str> {
        match self {
            WhereCondition::Eq { field, .. } => vec![field.as_str()],
            WhereCondition::And(conditions) => {
                conditions.iter().flat_map(WhereCondition::fields).collect()
            }
        }
    }

    /// 문서 메타데이터가 조건을 만족하는지 (인메모리 검색용)
    pub fn matches(&self, metadata: &Map<String, Value>) -> bool {
        match self {
            WhereCondition::Eq { field, value } => metadata.get(field) == Some(value),
            WhereCondition::And(conditions) => conditions.iter().all(|c| c.matches(metadata)),
        }
    }
}

impl Serialize for WhereCondition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

// ============================================================================
// Builder
// ============================================================================

/// 평면 필터 → where 조건
///
/// 지원하지 않는 필드, 스칼라가 아닌 값(배열/객체/null), 중복 필드는 제외합니다.
pub fn build_filter<K, V, I>(flat: I) -> Option<WhereCondition>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<Value>,
{
    let mut conditions: Vec<WhereCondition> = Vec::new();

    for (key, value) in flat {
        let field = key.as_ref();
        let value: Value = value.into();

        if !is_supported_field(field) {
            tracing::debug!("Dropping unsupported filter field: {}", field);
            continue;
        }
        if !is_scalar(&value) {
            tracing::debug!("Dropping non-scalar filter value for field: {}", field);
            continue;
        }
        if conditions.iter().any(|c| c.fields() == [field]) {
            tracing::debug!("Dropping duplicate filter field: {}", field);
            continue;
        }

        conditions.push(WhereCondition::Eq {
            field: field.to_string(),
            value,
        });
    }

    match conditions.len() {
        0 => None,
        1 => conditions.pop(),
        _ => Some(WhereCondition::And(conditions)),
    }
}

/// JSON 객체 형태의 평면 필터
pub fn build_filter_from_map(flat: &Map<String, Value>) -> Option<WhereCondition> {
    build_filter(flat.iter().map(|(k, v)| (k, v.clone())))
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn to_json(cond: Option<WhereCondition>) -> Option<Value> {
        cond.map(|c| c.to_json())
    }

    #[test]
    fn test_empty_filter_is_none() {
        let empty: Vec<(&str, &str)> = vec![];
        assert_eq!(build_filter(empty), None);
    }

    #[test]
    fn test_single_field() {
        let cond = build_filter([("data_type", "trade_regulation")]);
        assert_eq!(
            to_json(cond),
            Some(json!({"data_type": {"$eq": "trade_regulation"}}))
        );
    }

    #[test]
    fn test_two_fields_wrapped_in_and() {
        let cond = build_filter([
            ("data_type", "trade_regulation"),
            ("data_source", "동식물허용금지지역"),
        ]);
        assert_eq!(
            to_json(cond),
            Some(json!({"$and": [
                {"data_type": {"$eq": "trade_regulation"}},
                {"data_source": {"$eq": "동식물허용금지지역"}}
            ]}))
        );
    }

    #[test]
    fn test_never_produces_flat_multi_key_object() {
        let cond = build_filter([("data_type", "a"), ("country", "b"), ("hs_code", "c")]).unwrap();
        let v = cond.to_json();
        let obj = v.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert_eq!(obj["$and"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_unsupported_fields_dropped_silently() {
        // 오타 필드(data_tpye)도 에러 없이 버려짐
        let cond = build_filter([("data_tpye", "x"), ("data_source", "관세법")]);
        assert_eq!(to_json(cond), Some(json!({"data_source": {"$eq": "관세법"}})));

        let all_bad = build_filter([("foo", "x"), ("bar", "y")]);
        assert_eq!(all_bad, None);
    }

    #[test]
    fn test_input_order_preserved() {
        let cond = build_filter([("data_source", "a"), ("data_type", "b")]).unwrap();
        assert_eq!(cond.fields(), vec!["data_source", "data_type"]);
    }

    #[test]
    fn test_non_scalar_and_duplicate_dropped() {
        let cond = build_filter(vec![
            ("data_type".to_string(), json!(["a", "b"])),
            ("country".to_string(), json!("CN")),
            ("country".to_string(), json!("US")),
            ("hs_code".to_string(), Value::Null),
        ]);
        assert_eq!(to_json(cond), Some(json!({"country": {"$eq": "CN"}})));
    }

    #[test]
    fn test_from_map() {
        let map = json!({"data_type": "consultation_case", "unknown": 1});
        let cond = build_filter_from_map(map.as_object().unwrap());
        assert_eq!(
            to_json(cond),
            Some(json!({"data_type": {"$eq": "consultation_case"}}))
        );
    }

    #[test]
    fn test_numeric_values_allowed() {
        let cond = build_filter([("hs_code", json!(810100))]);
        assert_eq!(to_json(cond), Some(json!({"hs_code": {"$eq": 810100}})));
    }

    #[test]
    fn test_matches_metadata() {
        let cond = build_filter([("data_type", "trade_regulation"), ("country", "CN")]).unwrap();
        let meta = json!({"data_type": "trade_regulation", "country": "CN", "x": 1});
        assert!(cond.matches(meta.as_object().unwrap()));

        let other = json!({"data_type": "trade_regulation", "country": "US"});
        assert!(!cond.matches(other.as_object().unwrap()));
    }

    #[test]
    fn test_serialize_matches_to_json() {
        let cond = WhereCondition::eq("data_type", "customs_law");
        assert_eq!(serde_json::to_value(&cond).unwrap(), cond.to_json());
    }
}
