//! Human-readable settings files.
//!
//! A text settings file is a JSON object with one member per section:
//!
//! ```json
//! {
//!   "config_version": 5,
//!   "application": { "config/name": "Demo", "run/main_scene": "project://main.scn" },
//!   "display": { "window/size/width": 1280 }
//! }
//! ```
//!
//! A setting's name is `section/key`. Names without a `/` live in the `""`
//! section; top-level members that are not objects are also read as
//! section-less settings.

use std::collections::BTreeMap;

use serde_json::{Map, Number, Value as Json};
use strata_types::Value;

use crate::document::SettingsDocument;
use crate::error::{CodecError, CodecResult};
use crate::SettingsCodec;

/// Top-level member holding the format version.
pub const VERSION_KEY: &str = "config_version";

#[derive(Clone, Copy, Debug, Default)]
pub struct TextCodec;

impl SettingsCodec for TextCodec {
    fn name(&self) -> &'static str {
        "text"
    }

    fn decode(&self, bytes: &[u8]) -> CodecResult<SettingsDocument> {
        let root: Json = serde_json::from_slice(bytes)?;
        let Json::Object(root) = root else {
            return Err(CodecError::Malformed("top level is not an object".into()));
        };

        let mut doc = SettingsDocument::default();
        for (key, member) in root {
            if key == VERSION_KEY {
                let version = member
                    .as_u64()
                    .and_then(|v| u32::try_from(v).ok())
                    .ok_or_else(|| CodecError::Malformed(format!("{VERSION_KEY} is not a version number")))?;
                doc.version = Some(version);
                continue;
            }
            match member {
                Json::Object(section) => {
                    for (name, value) in section {
                        doc.push(join_name(&key, &name), from_json(value));
                    }
                }
                other => doc.push(key, from_json(other)),
            }
        }
        Ok(doc)
    }

    fn encode(&self, doc: &SettingsDocument) -> CodecResult<Vec<u8>> {
        let mut root = Map::new();
        if let Some(version) = doc.version {
            root.insert(VERSION_KEY.into(), Json::from(version));
        }
        for (name, value) in &doc.entries {
            let (section, key) = split_name(name);
            let slot = root
                .entry(section.to_string())
                .or_insert_with(|| Json::Object(Map::new()));
            let Json::Object(section) = slot else {
                return Err(CodecError::Malformed(format!(
                    "section {section:?} collides with {VERSION_KEY}"
                )));
            };
            section.insert(key.to_string(), to_json(value)?);
        }
        let mut out = serde_json::to_vec_pretty(&Json::Object(root))?;
        out.push(b'\n');
        Ok(out)
    }
}

fn split_name(name: &str) -> (&str, &str) {
    match name.split_once('/') {
        Some((section, key)) => (section, key),
        None => ("", name),
    }
}

fn join_name(section: &str, key: &str) -> String {
    if section.is_empty() {
        key.to_string()
    } else {
        format!("{section}/{key}")
    }
}

fn from_json(json: Json) -> Value {
    match json {
        Json::Null => Value::Nil,
        Json::Bool(b) => Value::Bool(b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Json::String(s) => Value::String(s),
        Json::Array(items) => Value::Array(items.into_iter().map(from_json).collect()),
        Json::Object(map) => Value::Dictionary(
            map.into_iter()
                .map(|(k, v)| (k, from_json(v)))
                .collect::<BTreeMap<_, _>>(),
        ),
    }
}

fn to_json(value: &Value) -> CodecResult<Json> {
    Ok(match value {
        Value::Nil => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::from(*i),
        Value::Float(f) => Number::from_f64(*f)
            .map(Json::Number)
            .ok_or_else(|| CodecError::Malformed(format!("float {f} has no JSON form")))?,
        Value::String(s) => Json::String(s.clone()),
        Value::Array(items) => Json::Array(items.iter().map(to_json).collect::<CodecResult<_>>()?),
        Value::Dictionary(map) => {
            let mut obj = Map::new();
            for (k, v) in map {
                obj.insert(k.clone(), to_json(v)?);
            }
            Json::Object(obj)
        }
    })
}
