use serde::{Deserialize, Serialize};

use super::field::{Field, Operator};

/// 单个检索条件：字段 + 匹配方式 + 检索词
///
/// 检索词不做任何校验，由远端服务自行解释。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    field: Field,
    operator: Operator,
    term: String,
}

impl Criterion {
    pub fn new(field: Field, operator: Operator, term: impl Into<String>) -> Self {
        Self {
            field,
            operator,
            term: term.into(),
        }
    }

    pub fn field(&self) -> Field {
        self.field
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn term(&self) -> &str {
        &self.term
    }
}

impl std::fmt::Display for Criterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {:?}", self.field, self.operator, self.term)
    }
}
