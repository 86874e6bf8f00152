use serde_json::{Map, Value};

use super::error::{StoreError, StoreResult};

/// 指向存储文档内部某个位置的路径
///
/// 字符串形式支持点号与方括号段（`a.b[0].c`），也可以直接传入已拆分的段序列。
/// `raw` 保存调用方给出的原始键，时间戳与事件名都使用它，而不是规范化后的段。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPath {
    raw: String,
    segments: Vec<String>,
}

impl KeyPath {
    /// 解析字符串路径：取出所有不含 `.`、`[`、`]` 的最长连续片段
    pub fn parse(raw: &str) -> Self {
        let segments = raw
            .split(['.', '[', ']'])
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            raw: raw.to_string(),
            segments,
        }
    }

    /// 使用已拆分的段，原样保留；原始键为各段以逗号连接
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        Self {
            raw: segments.join(","),
            segments,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl std::fmt::Display for KeyPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for KeyPath {
    fn from(raw: &str) -> Self {
        KeyPath::parse(raw)
    }
}

impl From<String> for KeyPath {
    fn from(raw: String) -> Self {
        KeyPath::parse(&raw)
    }
}

impl From<&String> for KeyPath {
    fn from(raw: &String) -> Self {
        KeyPath::parse(raw)
    }
}

impl From<Vec<String>> for KeyPath {
    fn from(segments: Vec<String>) -> Self {
        KeyPath::from_segments(segments)
    }
}

impl From<&[&str]> for KeyPath {
    fn from(segments: &[&str]) -> Self {
        KeyPath::from_segments(segments.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for KeyPath {
    fn from(segments: [&str; N]) -> Self {
        KeyPath::from_segments(segments)
    }
}

impl From<&KeyPath> for KeyPath {
    fn from(path: &KeyPath) -> Self {
        path.clone()
    }
}

/// JSON 值的类型名称，用于错误信息
pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// 只接受规范的十进制下标，"01"、"+1" 之类不算
fn array_index(segment: &str) -> Option<usize> {
    segment
        .parse::<usize>()
        .ok()
        .filter(|index| index.to_string() == segment)
}

fn mismatch(path: &KeyPath, segment: &str, found: &Value) -> StoreError {
    StoreError::TypeMismatch {
        path: path.raw.clone(),
        segment: segment.to_string(),
        found: value_kind(found).to_string(),
    }
}

/// 读取路径上的值，路径无法解析时返回 None
pub(crate) fn get_value<'a>(root: &'a Value, path: &KeyPath) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }

    path.segments
        .iter()
        .try_fold(root, |node, segment| match node {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => array_index(segment).and_then(|index| items.get(index)),
            _ => None,
        })
}

/// 在路径上写入值
///
/// 缺失的中间段会被创建为空对象，最后一段无条件覆盖。
/// 途经标量或 null 时返回 `TypeMismatch`。
/// 数组上的非数字段同样返回 `TypeMismatch`，不会静默丢弃该写入。
pub(crate) fn set_value(root: &mut Value, path: &KeyPath, value: Value) -> StoreResult<()> {
    let (last, parents) = path
        .segments
        .split_last()
        .ok_or_else(|| StoreError::InvalidPath(path.raw.clone()))?;

    let mut node = root;
    for segment in parents {
        node = child_or_insert(node, segment, path)?;
    }

    match node {
        Value::Object(map) => {
            map.insert(last.clone(), value);
            Ok(())
        }
        Value::Array(items) => {
            let index = array_index(last)
                .ok_or_else(|| mismatch(path, last, &Value::Array(Vec::new())))?;
            if index >= items.len() {
                items.resize(index + 1, Value::Null);
            }
            items[index] = value;
            Ok(())
        }
        other => Err(mismatch(path, last, other)),
    }
}

fn child_or_insert<'a>(
    node: &'a mut Value,
    segment: &str,
    path: &KeyPath,
) -> StoreResult<&'a mut Value> {
    match node {
        Value::Object(map) => Ok(map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()))),
        Value::Array(items) => {
            let index = array_index(segment)
                .ok_or_else(|| mismatch(path, segment, &Value::Array(Vec::new())))?;
            if index >= items.len() {
                // 越界下标之前的空位补 null，目标位置新建对象
                items.resize(index + 1, Value::Null);
                items[index] = Value::Object(Map::new());
            }
            Ok(&mut items[index])
        }
        other => Err(mismatch(path, segment, other)),
    }
}

/// 递归移除所有值为 null 的对象字段
///
/// 数组中的 null 元素保留，以保持元素位置不变。
pub(crate) fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, child)| !child.is_null())
                .map(|(key, child)| (key, strip_nulls(child)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_dotted_and_bracketed() {
        let path = KeyPath::parse("a.b[0].c");
        assert_eq!(path.segments(), ["a", "b", "0", "c"]);
        assert_eq!(path.raw(), "a.b[0].c");

        let path = KeyPath::parse("..a[[1]]..");
        assert_eq!(path.segments(), ["a", "1"]);

        assert!(KeyPath::parse("").is_empty());
        assert!(KeyPath::parse(".[]").is_empty());
    }

    #[test]
    fn test_segments_keep_raw_joined() {
        let path = KeyPath::from(["a", "b.c"]);
        assert_eq!(path.segments(), ["a", "b.c"]);
        assert_eq!(path.raw(), "a,b.c");
    }

    #[test]
    fn test_set_creates_intermediate_objects() {
        let mut root = json!({});
        set_value(&mut root, &KeyPath::parse("a.b.c"), json!(1)).unwrap();
        assert_eq!(root, json!({"a": {"b": {"c": 1}}}));

        // 最后一段无条件覆盖
        set_value(&mut root, &KeyPath::parse("a.b"), json!("x")).unwrap();
        assert_eq!(root, json!({"a": {"b": "x"}}));
    }

    #[test]
    fn test_set_through_arrays() {
        let mut root = json!({"list": [1]});
        set_value(&mut root, &KeyPath::parse("list[0]"), json!("first")).unwrap();
        set_value(&mut root, &KeyPath::parse("list[2].name"), json!("third")).unwrap();
        assert_eq!(root, json!({"list": ["first", null, {"name": "third"}]}));
    }

    #[test]
    fn test_set_through_scalar_fails() {
        let mut root = json!({"a": "text"});
        let err = set_value(&mut root, &KeyPath::parse("a.b"), json!(1)).unwrap_err();
        assert!(matches!(err, StoreError::TypeMismatch { ref found, .. } if found == "string"));

        let err = set_value(&mut root, &KeyPath::parse(""), json!(1)).unwrap_err();
        assert_eq!(err, StoreError::InvalidPath(String::new()));
    }

    #[test]
    fn test_named_segment_on_array_fails() {
        let mut root = json!({"list": [1]});

        let err = set_value(&mut root, &KeyPath::parse("list.x"), json!(1)).unwrap_err();
        assert_eq!(
            err,
            StoreError::TypeMismatch {
                path: "list.x".to_string(),
                segment: "x".to_string(),
                found: "array".to_string(),
            }
        );

        let err = set_value(&mut root, &KeyPath::parse("list.x.y"), json!(1)).unwrap_err();
        assert!(matches!(err, StoreError::TypeMismatch { ref segment, .. } if segment == "x"));
        assert_eq!(root, json!({"list": [1]}));
    }

    #[test]
    fn test_get_value() {
        let root = json!({"a": {"b": [10, {"c": null}]}});
        assert_eq!(get_value(&root, &KeyPath::parse("a.b[0]")), Some(&json!(10)));
        assert_eq!(get_value(&root, &KeyPath::parse("a.b[1].c")), Some(&Value::Null));
        assert_eq!(get_value(&root, &KeyPath::parse("a.b[5]")), None);
        assert_eq!(get_value(&root, &KeyPath::parse("a.b[0].x")), None);
        assert_eq!(get_value(&root, &KeyPath::parse("")), None);
    }

    #[test]
    fn test_strip_nulls_keeps_array_slots() {
        let value = json!({"a": null, "b": {"c": null, "d": 1}, "e": [null, 2]});
        assert_eq!(strip_nulls(value), json!({"b": {"d": 1}, "e": [null, 2]}));
    }
}
