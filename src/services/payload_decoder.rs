//! 响应内容解码
//!
//! 把 XML 响应转换为紧凑的 JSON 树：
//! - 元素名作为父对象的键，同名兄弟元素合并为数组
//! - 属性放在 `_attributes` 下，文本放在 `_text` 下，CDATA 放在 `_cdata` 下
//! - XML 声明放在 `_declaration._attributes` 下
//! - 不保留任何源码位置信息

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

const ATTRIBUTES_KEY: &str = "_attributes";
const TEXT_KEY: &str = "_text";
const CDATA_KEY: &str = "_cdata";
const DECLARATION_KEY: &str = "_declaration";

/// 解码 XML 为紧凑树
///
/// 错误以字符串返回，调用方负责附加 URL 等上下文。
pub fn decode_compact(xml: &str) -> Result<Value, String> {
    let mut reader = Reader::from_str(xml);

    // 栈底是文档根对象
    let mut stack: Vec<(String, Map<String, Value>)> = vec![(String::new(), Map::new())];
    let mut has_root = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| format!("位置 {}: {}", reader.buffer_position(), e))?;

        match event {
            Event::Start(e) => {
                let (name, node) = open_element(&e)?;
                stack.push((name, node));
            }
            Event::Empty(e) => {
                let (name, node) = open_element(&e)?;
                let parent = current(&mut stack)?;
                insert_child(parent, name, Value::Object(node));
                has_root |= stack.len() == 1;
            }
            Event::End(_) => {
                if stack.len() < 2 {
                    return Err("多余的结束标签".to_string());
                }
                if let Some((name, node)) = stack.pop() {
                    let parent = current(&mut stack)?;
                    insert_child(parent, name, Value::Object(node));
                    has_root |= stack.len() == 1;
                }
            }
            Event::Text(e) => {
                let text = e.unescape().map_err(|e| e.to_string())?;
                // 元素之间的纯空白不是内容
                if !text.trim().is_empty() && stack.len() > 1 {
                    append_text(current(&mut stack)?, TEXT_KEY, &text);
                }
            }
            Event::CData(e) => {
                let data = String::from_utf8_lossy(&e.into_inner()).into_owned();
                if stack.len() > 1 {
                    append_text(current(&mut stack)?, CDATA_KEY, &data);
                }
            }
            Event::Decl(e) => {
                let mut attributes = Map::new();
                let version = e.version().map_err(|e| e.to_string())?;
                attributes.insert(
                    "version".to_string(),
                    Value::String(String::from_utf8_lossy(&version).into_owned()),
                );
                if let Some(encoding) = e.encoding() {
                    let encoding = encoding.map_err(|e| e.to_string())?;
                    attributes.insert(
                        "encoding".to_string(),
                        Value::String(String::from_utf8_lossy(&encoding).into_owned()),
                    );
                }
                let mut declaration = Map::new();
                declaration.insert(ATTRIBUTES_KEY.to_string(), Value::Object(attributes));
                current(&mut stack)?
                    .insert(DECLARATION_KEY.to_string(), Value::Object(declaration));
            }
            Event::Eof => break,
            // 注释、处理指令、DOCTYPE 不进入结果
            _ => {}
        }
    }

    if stack.len() != 1 {
        return Err(format!("元素未闭合: {}", stack.len() - 1));
    }
    if !has_root {
        return Err("没有根元素".to_string());
    }

    let (_, document) = stack.remove(0);
    Ok(Value::Object(document))
}

fn open_element(e: &BytesStart<'_>) -> Result<(String, Map<String, Value>), String> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut node = Map::new();

    let mut attributes = Map::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| e.to_string())?;
        attributes.insert(key, Value::String(value.into_owned()));
    }
    if !attributes.is_empty() {
        node.insert(ATTRIBUTES_KEY.to_string(), Value::Object(attributes));
    }

    Ok((name, node))
}

fn current(
    stack: &mut [(String, Map<String, Value>)],
) -> Result<&mut Map<String, Value>, String> {
    stack
        .last_mut()
        .map(|(_, node)| node)
        .ok_or_else(|| "解析栈为空".to_string())
}

/// 同名子元素第二次出现时转为数组
fn insert_child(parent: &mut Map<String, Value>, name: String, child: Value) {
    match parent.get_mut(&name) {
        Some(Value::Array(items)) => items.push(child),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, child]);
        }
        None => {
            parent.insert(name, child);
        }
    }
}

/// 被子元素隔开的文本各自保留，第二段出现时转为数组
fn append_text(node: &mut Map<String, Value>, key: &str, text: &str) {
    insert_child(node, key.to_string(), Value::String(text.to_string()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simple_document() {
        let value = decode_compact("<r><x>1</x></r>").unwrap();
        assert_eq!(value, json!({ "r": { "x": { "_text": "1" } } }));
    }

    #[test]
    fn test_attributes_and_repeated_siblings() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<people count="2">
    <person id="a1"><name>Ann &amp; Bo</name></person>
    <person id="b2"><name>Cy</name><phone/></person>
</people>"#;
        let value = decode_compact(xml).unwrap();

        assert_eq!(
            value["_declaration"]["_attributes"],
            json!({ "version": "1.0", "encoding": "UTF-8" })
        );
        assert_eq!(value["people"]["_attributes"]["count"], "2");

        let people = value["people"]["person"].as_array().unwrap();
        assert_eq!(people.len(), 2);
        assert_eq!(people[0]["_attributes"]["id"], "a1");
        assert_eq!(people[0]["name"]["_text"], "Ann & Bo");
        assert_eq!(people[1]["phone"], json!({}));
    }

    #[test]
    fn test_cdata() {
        let value = decode_compact("<r><![CDATA[<b>raw</b>]]></r>").unwrap();
        assert_eq!(value["r"]["_cdata"], "<b>raw</b>");
    }

    #[test]
    fn test_text_split_by_child_stays_separate() {
        let value = decode_compact("<office>Room 123<br/> Butler Hall</office>").unwrap();
        assert_eq!(
            value,
            json!({ "office": { "_text": ["Room 123", " Butler Hall"], "br": {} } })
        );
    }

    #[test]
    fn test_text_whitespace_is_kept() {
        let value = decode_compact("<n> Jo Ann </n>").unwrap();
        assert_eq!(value, json!({ "n": { "_text": " Jo Ann " } }));

        // 元素之间的缩进不产生文本
        let value = decode_compact("<r>\n  <x>1</x>\n</r>").unwrap();
        assert_eq!(value, json!({ "r": { "x": { "_text": "1" } } }));
    }

    #[test]
    fn test_malformed_documents_fail() {
        assert!(decode_compact("<r><x>1</r>").is_err());
        assert!(decode_compact("<r>").is_err());
        assert!(decode_compact("").is_err());
        assert!(decode_compact("just text").is_err());
    }
}
