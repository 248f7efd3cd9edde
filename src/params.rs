/*
 fiware-stack
 Copyright 2025 Peter Pearson.
 Licensed under the Apache License, Version 2.0 (the "License");
 You may not use this file except in compliance with the License.
 You may obtain a copy of the License at
 http://www.apache.org/licenses/LICENSE-2.0
 Unless required by applicable law or agreed to in writing, software
 distributed under the License is distributed on an "AS IS" BASIS,
 WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 See the License for the specific language governing permissions and
 limitations under the License.
 ---------
*/

use std::collections::BTreeMap;
use std::fmt;
use std::convert::From;
use std::path::Path;

use yaml_rust::{Yaml, YamlLoader};

use crate::common::FileLoadError;

#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    Unknown,
    Bool(bool),
    Int(i64),
    Str(String),
    Array(Vec<ParamValue>),
    Map(BTreeMap<String, ParamValue>)
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            ParamValue::Unknown => write!(f, "Unknown"),
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::Str(s) => write!(f, "'{}'", s),
            ParamValue::Array(arr) => {
                write!(f, "array [{}] = {{", arr.len())?;
                for it in arr {
                    write!(f, " {},", it)?;
                }
                write!(f, " }}")
            },
            ParamValue::Map(map) => {
                write!(f, "{{")?;
                for (key, val) in map {
                    write!(f, " {}: {}, ", key, val)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<Yaml> for ParamValue {
    fn from(item: Yaml) -> Self {
        match item {
            Yaml::Boolean(v) => ParamValue::Bool(v),
            Yaml::Integer(v) => ParamValue::Int(v),
            Yaml::String(v) => ParamValue::Str(v),
            // keep floats (e.g. "14.04") as their original text
            Yaml::Real(v) => ParamValue::Str(v),
            Yaml::Array(v) => {
                ParamValue::Array(v.into_iter().map(ParamValue::from).collect())
            },
            Yaml::Hash(v) => {
                let mut new_map = BTreeMap::new();
                for (key, val) in v {
                    if let Some(key_string) = yaml_key_as_string(&key) {
                        new_map.insert(key_string, ParamValue::from(val));
                    }
                }
                ParamValue::Map(new_map)
            },
            _ => ParamValue::Unknown
        }
    }
}

fn yaml_key_as_string(key: &Yaml) -> Option<String> {
    match key {
        Yaml::String(s) => Some(s.clone()),
        Yaml::Integer(i) => Some(i.to_string()),
        _ => None
    }
}

/// Flat key -> value settings, as loaded from the top level of a YAML document
/// or from `key: value` lines.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Params {
    pub values:     BTreeMap<String, ParamValue>,
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Params: ({}) {{", self.values.len())?;
        for (key, val) in &self.values {
            writeln!(f, " {}: {}", key, val)?;
        }
        write!(f, "}}")
    }
}

impl Params {
    pub fn new() -> Params {
        Params { values: BTreeMap::new() }
    }

    pub fn from_yaml_file(path: &Path) -> Result<Params, FileLoadError> {
        let bytes = std::fs::read(path)?;
        let content = std::str::from_utf8(&bytes)?;
        Params::from_yaml_str(content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Params, FileLoadError> {
        let documents = YamlLoader::load_from_str(content)
            .map_err(|e| FileLoadError::CustomError(format!("Error parsing YAML: {}", e)))?;

        let doc = match documents.into_iter().next() {
            Some(doc) => doc,
            None => return Ok(Params::new())
        };

        match ParamValue::from(doc) {
            ParamValue::Map(values) => Ok(Params { values }),
            _ => Err(FileLoadError::CustomError("Expected a map of values at the top level of the YAML document.".to_string()))
        }
    }

    // Ignores empty lines and '#' comments. Only the first ':' splits, so urls can be values.
    pub fn from_key_value_lines(content: &str) -> Result<Params, FileLoadError> {
        let mut params = Params::new();

        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (key, value) = line.split_once(':')
                .ok_or_else(|| FileLoadError::CustomError(format!("Unexpected line {}: '{}'", index + 1, line)))?;

            params.values.insert(key.trim().to_string(), ParamValue::Str(value.trim().to_string()));
        }

        Ok(params)
    }

    pub fn has_value(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    // YAML is really annoying with numbers (flavor "2", release "14.04"), so accept either.
    pub fn get_string_or_int_value_as_string(&self, key: &str) -> Option<String> {
        match self.values.get(key) {
            Some(ParamValue::Str(str_val)) => Some(str_val.to_string()),
            Some(ParamValue::Int(int_val)) => Some(int_val.to_string()),
            _ => None
        }
    }

    pub fn get_value_as_int(&self, key: &str) -> Option<i64> {
        match self.values.get(key) {
            Some(ParamValue::Int(val)) => Some(*val),
            Some(ParamValue::Str(str_val)) => str_val.trim().parse().ok(),
            _ => None
        }
    }

    /// Strings from an array value. A single string (which may be comma-separated,
    /// as in the `key: value` format) is returned as an array too.
    pub fn get_values_as_vec_of_strings(&self, key: &str) -> Vec<String> {
        match self.values.get(key) {
            Some(ParamValue::Array(vec)) => {
                vec.iter()
                    .filter_map(|it| match it {
                        ParamValue::Str(s) => Some(s.clone()),
                        ParamValue::Int(i) => Some(i.to_string()),
                        _ => None
                    })
                    .collect()
            },
            Some(ParamValue::Str(s)) => {
                s.split(',').map(|v| v.trim().to_string()).filter(|v| !v.is_empty()).collect()
            },
            _ => Vec::new()
        }
    }

    pub fn get_raw_value(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }
}
