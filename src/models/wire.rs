//! 提交格式
//!
//! 远端表单按槽位编号接收条件：`fld{N}_criteria` / `fld{N}_operator` / `fld{N}_search_term`。

use serde::Serialize;

use super::criterion::Criterion;
use super::field::{Field, Operator};

/// 一个槽位的三元组（全部是远端 token）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireSlot {
    pub criteria: String,
    pub operator: String,
    pub search_term: String,
}

impl From<&Criterion> for WireSlot {
    fn from(criterion: &Criterion) -> Self {
        Self {
            criteria: criterion.field().token().to_string(),
            operator: criterion.operator().token().to_string(),
            search_term: criterion.term().to_string(),
        }
    }
}

impl WireSlot {
    /// 还原为条件，token 无法识别时返回 None
    pub fn to_criterion(&self) -> Option<Criterion> {
        Some(Criterion::new(
            Field::from_token(&self.criteria)?,
            Operator::from_token(&self.operator)?,
            self.search_term.clone(),
        ))
    }
}

/// 表单控件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    /// 文本输入框
    Text,
    /// 下拉选择框
    Choice,
}

/// 一个待填写的表单字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireField<'a> {
    /// 控件 id，同时也是字段名
    pub name: String,
    pub value: &'a str,
}

impl WireField<'_> {
    /// 按字段名判断控件类型
    pub fn kind(&self) -> ControlKind {
        if self.name.ends_with("search_term") {
            ControlKind::Text
        } else {
            ControlKind::Choice
        }
    }

    /// 控件的 CSS 选择器
    pub fn selector(&self) -> String {
        match self.kind() {
            ControlKind::Text => format!("input[id='{}']", self.name),
            ControlKind::Choice => format!("select[id='{}']", self.name),
        }
    }
}

/// 扁平化后的查询
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireQuery {
    slot1: WireSlot,
    #[serde(skip_serializing_if = "Option::is_none")]
    slot2: Option<WireSlot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    slot3: Option<WireSlot>,
}

impl WireQuery {
    pub(crate) fn new(slot1: WireSlot) -> Self {
        Self {
            slot1,
            slot2: None,
            slot3: None,
        }
    }

    pub(crate) fn set_slot2(&mut self, slot: WireSlot) {
        self.slot2 = Some(slot);
    }

    pub(crate) fn set_slot3(&mut self, slot: WireSlot) {
        self.slot3 = Some(slot);
    }

    pub fn slot1(&self) -> &WireSlot {
        &self.slot1
    }

    pub fn slot2(&self) -> Option<&WireSlot> {
        self.slot2.as_ref()
    }

    pub fn slot3(&self) -> Option<&WireSlot> {
        self.slot3.as_ref()
    }

    /// 已填充的槽位（按槽位顺序）
    pub fn slots(&self) -> impl Iterator<Item = &WireSlot> {
        std::iter::once(&self.slot1)
            .chain(self.slot2.as_ref())
            .chain(self.slot3.as_ref())
    }

    pub fn slot_count(&self) -> usize {
        self.slots().count()
    }

    /// 按提交顺序展开为表单字段
    pub fn fields(&self) -> Vec<WireField<'_>> {
        let mut fields = Vec::with_capacity(self.slot_count() * 3);
        for (i, slot) in self.slots().enumerate() {
            let n = i + 1;
            fields.push(WireField {
                name: format!("fld{}_criteria", n),
                value: &slot.criteria,
            });
            fields.push(WireField {
                name: format!("fld{}_operator", n),
                value: &slot.operator,
            });
            fields.push(WireField {
                name: format!("fld{}_search_term", n),
                value: &slot.search_term,
            });
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Query;

    #[test]
    fn test_fields_follow_slot_order() {
        let mut query = Query::new();
        query
            .criterion()
            .last_name()
            .equals("Smith")
            .unwrap()
            .criterion()
            .phone()
            .begins_with("662")
            .unwrap();

        let wire = query.to_wire().unwrap();
        let fields = wire.fields();
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "fld1_criteria",
                "fld1_operator",
                "fld1_search_term",
                "fld2_criteria",
                "fld2_operator",
                "fld2_search_term",
            ]
        );
        assert_eq!(fields[0].value, "lname");
        assert_eq!(fields[4].value, "begin");
        assert_eq!(fields[5].value, "662");
    }

    #[test]
    fn test_control_kind_and_selector() {
        let text = WireField {
            name: "fld1_search_term".into(),
            value: "x",
        };
        let choice = WireField {
            name: "fld1_operator".into(),
            value: "equal",
        };
        assert_eq!(text.kind(), ControlKind::Text);
        assert_eq!(text.selector(), "input[id='fld1_search_term']");
        assert_eq!(choice.kind(), ControlKind::Choice);
        assert_eq!(choice.selector(), "select[id='fld1_operator']");
    }

    #[test]
    fn test_slot_decodes_back_to_criterion() {
        let criterion = Criterion::new(Field::Major, Operator::SoundsLike, "Fizzics");
        let slot = WireSlot::from(&criterion);
        assert_eq!(slot.to_criterion(), Some(criterion));

        let bogus = WireSlot {
            criteria: "nope".into(),
            operator: "equal".into(),
            search_term: String::new(),
        };
        assert_eq!(bogus.to_criterion(), None);
    }

    #[test]
    fn test_serialized_shape_omits_missing_slots() {
        let mut query = Query::new();
        query.criterion().email().contains("@msstate").unwrap();
        let json = serde_json::to_value(query.to_wire().unwrap()).unwrap();
        assert_eq!(json["slot1"]["criteria"], "email");
        assert!(json.get("slot2").is_none());
        assert!(json.get("slot3").is_none());
    }
}
