//! 查询模型
//!
//! 一个查询最多包含 3 个有序条件，插入顺序决定提交表单时的槽位（1/2/3）。
//!
//! ```
//! use directory_harvest::models::Query;
//!
//! let mut query = Query::new();
//! query
//!     .criterion()
//!     .last_name()
//!     .equals("Smith")
//!     .unwrap()
//!     .criterion()
//!     .department()
//!     .contains("Computer")
//!     .unwrap();
//! assert_eq!(query.len(), 2);
//! ```

use tracing::warn;

use super::criterion::Criterion;
use super::field::{Field, Operator};
use super::wire::{WireQuery, WireSlot};
use crate::error::QueryError;

/// 单个查询的条件上限
pub const MAX_CRITERIA: usize = 3;

/// 查询
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    criteria: Vec<Criterion>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// 开始构建一个条件
    pub fn criterion(&mut self) -> CriterionBuilder<'_> {
        CriterionBuilder { query: self }
    }

    /// 添加条件
    ///
    /// 已满 3 个时条件不会被添加，返回 `CriterionLimitExceeded`，查询本身保持不变。
    pub fn add_criterion(&mut self, criterion: Criterion) -> Result<&mut Self, QueryError> {
        if self.criteria.len() >= MAX_CRITERIA {
            warn!("⚠️ 条件数量已达上限 {}，忽略条件: {}", MAX_CRITERIA, criterion);
            return Err(QueryError::CriterionLimitExceeded {
                limit: MAX_CRITERIA,
            });
        }
        self.criteria.push(criterion);
        Ok(self)
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    /// 转换为提交格式
    ///
    /// 第 1 槽位必填；第 2、3 槽位仅在对应条件存在时输出。
    pub fn to_wire(&self) -> Result<WireQuery, QueryError> {
        self.to_wire_at(0)
    }

    /// 同 [`Query::to_wire`]，错误中携带查询在队列中的位置
    pub(crate) fn to_wire_at(&self, index: usize) -> Result<WireQuery, QueryError> {
        let first = self
            .criteria
            .first()
            .ok_or(QueryError::EmptyQuery { index })?;

        let mut wire = WireQuery::new(WireSlot::from(first));
        if self.criteria.len() >= 2 {
            wire.set_slot2(WireSlot::from(&self.criteria[1]));
        }
        if self.criteria.len() >= 3 {
            wire.set_slot3(WireSlot::from(&self.criteria[2]));
        }
        Ok(wire)
    }
}

impl TryFrom<Vec<Criterion>> for Query {
    type Error = QueryError;

    fn try_from(criteria: Vec<Criterion>) -> Result<Self, Self::Error> {
        let mut query = Query::new();
        for criterion in criteria {
            query.add_criterion(criterion)?;
        }
        Ok(query)
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.criteria.iter().map(|c| c.to_string()).collect();
        write!(f, "[{}]", parts.join(" AND "))
    }
}

/// 条件构建器（尚未选择字段）
///
/// 只能先选字段，选完字段后才能调用匹配方式。
pub struct CriterionBuilder<'q> {
    query: &'q mut Query,
}

/// 条件构建器（已选择字段）
///
/// 再次选择字段会覆盖之前的选择。
pub struct FieldSelected<'q> {
    query: &'q mut Query,
    field: Field,
}

macro_rules! field_selectors {
    ($lt:lifetime; $($method:ident => $field:expr),* $(,)?) => {
        $(
            pub fn $method(self) -> FieldSelected<$lt> {
                self.select($field)
            }
        )*
    };
}

impl<'q> CriterionBuilder<'q> {
    pub fn select(self, field: Field) -> FieldSelected<'q> {
        FieldSelected {
            query: self.query,
            field,
        }
    }

    field_selectors! {
        'q;
        first_name => Field::FirstName,
        last_name => Field::LastName,
        title => Field::Title,
        department => Field::Department,
        major => Field::Major,
        class => Field::Class,
        email => Field::Email,
        phone => Field::Phone,
        office => Field::Office,
    }
}

impl<'q> FieldSelected<'q> {
    pub fn select(mut self, field: Field) -> FieldSelected<'q> {
        self.field = field;
        self
    }

    field_selectors! {
        'q;
        first_name => Field::FirstName,
        last_name => Field::LastName,
        title => Field::Title,
        department => Field::Department,
        major => Field::Major,
        class => Field::Class,
        email => Field::Email,
        phone => Field::Phone,
        office => Field::Office,
    }

    /// 以指定匹配方式完成条件
    pub fn matching(
        self,
        operator: Operator,
        term: impl Into<String>,
    ) -> Result<&'q mut Query, QueryError> {
        self.query
            .add_criterion(Criterion::new(self.field, operator, term))
    }

    pub fn contains(self, term: impl Into<String>) -> Result<&'q mut Query, QueryError> {
        self.matching(Operator::Contains, term)
    }

    pub fn equals(self, term: impl Into<String>) -> Result<&'q mut Query, QueryError> {
        self.matching(Operator::Equals, term)
    }

    pub fn begins_with(self, term: impl Into<String>) -> Result<&'q mut Query, QueryError> {
        self.matching(Operator::BeginsWith, term)
    }

    pub fn ends_with(self, term: impl Into<String>) -> Result<&'q mut Query, QueryError> {
        self.matching(Operator::EndsWith, term)
    }

    pub fn sounds_like(self, term: impl Into<String>) -> Result<&'q mut Query, QueryError> {
        self.matching(Operator::SoundsLike, term)
    }
}
