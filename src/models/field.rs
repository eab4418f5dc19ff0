//! 检索字段与匹配方式
//!
//! 远端目录服务只认固定的 token，这里维护枚举与 token 之间的双向映射表。

use phf::phf_map;
use serde::{Deserialize, Serialize};

/// 可检索字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// 名
    FirstName,
    /// 姓
    LastName,
    /// 职称
    Title,
    /// 部门
    Department,
    /// 专业
    Major,
    /// 年级
    Class,
    /// 邮箱
    Email,
    /// 电话
    Phone,
    /// 办公室
    Office,
}

static FIELD_BY_TOKEN: phf::Map<&'static str, Field> = phf_map! {
    "fname" => Field::FirstName,
    "lname" => Field::LastName,
    "title" => Field::Title,
    "dept" => Field::Department,
    "major" => Field::Major,
    "class" => Field::Class,
    "email" => Field::Email,
    "lphone" => Field::Phone,
    "office" => Field::Office,
};

impl Field {
    /// 全部字段
    pub const ALL: [Field; 9] = [
        Field::FirstName,
        Field::LastName,
        Field::Title,
        Field::Department,
        Field::Major,
        Field::Class,
        Field::Email,
        Field::Phone,
        Field::Office,
    ];

    /// 获取远端 token
    pub fn token(self) -> &'static str {
        match self {
            Field::FirstName => "fname",
            Field::LastName => "lname",
            Field::Title => "title",
            Field::Department => "dept",
            Field::Major => "major",
            Field::Class => "class",
            Field::Email => "email",
            Field::Phone => "lphone",
            Field::Office => "office",
        }
    }

    /// 从远端 token 解析字段
    pub fn from_token(token: &str) -> Option<Self> {
        FIELD_BY_TOKEN.get(token).copied()
    }

    /// 从名称解析（接受 snake_case 名称或远端 token）
    pub fn find(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::from_token(s).or_else(|| {
            Self::ALL
                .into_iter()
                .find(|f| f.name().eq_ignore_ascii_case(s))
        })
    }

    /// snake_case 名称
    pub fn name(self) -> &'static str {
        match self {
            Field::FirstName => "first_name",
            Field::LastName => "last_name",
            Field::Title => "title",
            Field::Department => "department",
            Field::Major => "major",
            Field::Class => "class",
            Field::Email => "email",
            Field::Phone => "phone",
            Field::Office => "office",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 匹配方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// 包含
    Contains,
    /// 等于
    Equals,
    /// 开头是
    BeginsWith,
    /// 结尾是
    EndsWith,
    /// 读音相近
    SoundsLike,
}

static OPERATOR_BY_TOKEN: phf::Map<&'static str, Operator> = phf_map! {
    "contain" => Operator::Contains,
    "equal" => Operator::Equals,
    "begin" => Operator::BeginsWith,
    "end" => Operator::EndsWith,
    "sounds" => Operator::SoundsLike,
};

impl Operator {
    pub const ALL: [Operator; 5] = [
        Operator::Contains,
        Operator::Equals,
        Operator::BeginsWith,
        Operator::EndsWith,
        Operator::SoundsLike,
    ];

    /// 获取远端 token
    pub fn token(self) -> &'static str {
        match self {
            Operator::Contains => "contain",
            Operator::Equals => "equal",
            Operator::BeginsWith => "begin",
            Operator::EndsWith => "end",
            Operator::SoundsLike => "sounds",
        }
    }

    /// 从远端 token 解析
    pub fn from_token(token: &str) -> Option<Self> {
        OPERATOR_BY_TOKEN.get(token).copied()
    }

    pub fn find(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::from_token(s).or_else(|| {
            Self::ALL
                .into_iter()
                .find(|op| op.name().eq_ignore_ascii_case(s))
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Operator::Contains => "contains",
            Operator::Equals => "equals",
            Operator::BeginsWith => "begins_with",
            Operator::EndsWith => "ends_with",
            Operator::SoundsLike => "sounds_like",
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_field_tokens_round_trip() {
        let tokens: HashSet<_> = Field::ALL.iter().map(|f| f.token()).collect();
        assert_eq!(tokens.len(), Field::ALL.len(), "token 不能重复");
        assert_eq!(FIELD_BY_TOKEN.len(), Field::ALL.len());

        for field in Field::ALL {
            assert_eq!(Field::from_token(field.token()), Some(field));
        }
    }

    #[test]
    fn test_operator_tokens_round_trip() {
        let tokens: HashSet<_> = Operator::ALL.iter().map(|op| op.token()).collect();
        assert_eq!(tokens.len(), Operator::ALL.len());
        assert_eq!(OPERATOR_BY_TOKEN.len(), Operator::ALL.len());

        for op in Operator::ALL {
            assert_eq!(Operator::from_token(op.token()), Some(op));
        }
    }

    #[test]
    fn test_unknown_token() {
        assert_eq!(Field::from_token("phone"), None);
        assert_eq!(Operator::from_token("like"), None);
    }

    #[test]
    fn test_find_accepts_name_or_token() {
        assert_eq!(Field::find("lphone"), Some(Field::Phone));
        assert_eq!(Field::find("phone"), Some(Field::Phone));
        assert_eq!(Field::find("Last_Name"), Some(Field::LastName));
        assert_eq!(Operator::find("begins_with"), Some(Operator::BeginsWith));
        assert_eq!(Operator::find("sounds"), Some(Operator::SoundsLike));
        assert_eq!(Operator::find("nope"), None);
    }
}
