//! CloudFormation template model.
//!
//! Resources and outputs are kept in declaration order, and serialize in that
//! order, so a template can be read top to bottom the same way the stack was
//! built.

use std::collections::BTreeSet;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;

pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

/// A string property that is either a literal or a CloudFormation intrinsic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrVal {
    Val(String),
    Ref(String),
    GetAtt { logical_id: String, attribute: String },
    Sub(String),
}

impl Default for StrVal {
    fn default() -> Self {
        StrVal::Val(String::new())
    }
}

impl From<&str> for StrVal {
    fn from(value: &str) -> Self {
        StrVal::Val(value.to_string())
    }
}

impl From<String> for StrVal {
    fn from(value: String) -> Self {
        StrVal::Val(value)
    }
}

impl Serialize for StrVal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StrVal::Val(s) => serializer.serialize_str(s),
            StrVal::Ref(id) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Ref", id)?;
                map.end()
            }
            StrVal::GetAtt { logical_id, attribute } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Fn::GetAtt", &[logical_id, attribute])?;
                map.end()
            }
            StrVal::Sub(s) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Fn::Sub", s)?;
                map.end()
            }
        }
    }
}

pub fn get_ref(logical_id: &str) -> StrVal {
    StrVal::Ref(logical_id.to_string())
}

pub fn get_att(logical_id: &str, attribute: &str) -> StrVal {
    StrVal::GetAtt {
        logical_id: logical_id.to_string(),
        attribute: attribute.to_string(),
    }
}

/// Implemented by the property structs of every resource we know how to emit.
pub trait CfnResource: Serialize {
    fn type_string(&self) -> &'static str;

    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedResource {
    #[serde(rename = "Type")]
    pub ty: String,
    #[serde(rename = "Properties")]
    pub properties: Value,
    #[serde(rename = "DependsOn", skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceOutput {
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Value")]
    pub value: Value,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Template {
    pub description: Option<String>,
    resources: Vec<(String, SavedResource)>,
    outputs: Vec<(String, ResourceOutput)>,
}

/// serializes a list of pairs as a map without reordering it.
struct Ordered<'a, T>(&'a [(String, T)]);

impl<T: Serialize> Serialize for Ordered<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl Serialize for Template {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("AWSTemplateFormatVersion", TEMPLATE_FORMAT_VERSION)?;
        if let Some(description) = &self.description {
            map.serialize_entry("Description", description)?;
        }
        map.serialize_entry("Resources", &Ordered(&self.resources))?;
        if !self.outputs.is_empty() {
            map.serialize_entry("Outputs", &Ordered(&self.outputs))?;
        }
        map.end()
    }
}

impl Template {
    pub fn contains(&self, logical_id: &str) -> bool {
        self.resources.iter().any(|(id, _)| id == logical_id)
    }

    pub(crate) fn push_resource(&mut self, logical_id: String, resource: SavedResource) {
        self.resources.push((logical_id, resource));
    }

    pub(crate) fn push_output(&mut self, name: String, output: ResourceOutput) {
        self.outputs.push((name, output));
    }

    pub fn resource(&self, logical_id: &str) -> Option<&SavedResource> {
        self.resources
            .iter()
            .find(|(id, _)| id == logical_id)
            .map(|(_, r)| r)
    }

    pub fn resource_ids(&self) -> impl Iterator<Item = &str> {
        self.resources.iter().map(|(id, _)| id.as_str())
    }

    pub fn resources_of_type<'a>(&'a self, ty: &'a str) -> impl Iterator<Item = (&'a str, &'a SavedResource)> {
        self.resources
            .iter()
            .filter(move |(_, r)| r.ty == ty)
            .map(|(id, r)| (id.as_str(), r))
    }

    /// position of a resource in declaration order.
    pub fn declaration_index(&self, logical_id: &str) -> Option<usize> {
        self.resources.iter().position(|(id, _)| id == logical_id)
    }

    pub fn output(&self, name: &str) -> Option<&ResourceOutput> {
        self.outputs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, o)| o)
    }

    pub fn output_names(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(|(n, _)| n.as_str())
    }

    /// every logical id a resource depends on, either explicitly or through
    /// an intrinsic inside its properties.
    pub fn references(&self, logical_id: &str) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        if let Some(resource) = self.resource(logical_id) {
            collect_references(&resource.properties, &mut out);
            out.extend(resource.depends_on.iter().cloned());
        }
        out
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// walks a property value looking for `Ref`, `Fn::GetAtt` and `${..}`
/// placeholders in `Fn::Sub`. pseudo parameters (`AWS::Region` etc.) are
/// skipped.
pub fn collect_references(value: &Value, out: &mut BTreeSet<String>) {
    match value {
        Value::Object(map) => {
            if map.len() == 1 {
                if let Some(Value::String(id)) = map.get("Ref") {
                    if !id.starts_with("AWS::") {
                        out.insert(id.clone());
                    }
                    return;
                }
                if let Some(Value::Array(parts)) = map.get("Fn::GetAtt") {
                    if let Some(Value::String(id)) = parts.first() {
                        out.insert(id.clone());
                    }
                    return;
                }
                if let Some(Value::String(s)) = map.get("Fn::Sub") {
                    sub_references(s, out);
                    return;
                }
            }
            for v in map.values() {
                collect_references(v, out);
            }
        }
        Value::Array(items) => {
            for v in items {
                collect_references(v, out);
            }
        }
        _ => {}
    }
}

fn sub_references(s: &str, out: &mut BTreeSet<String>) {
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        rest = &rest[start + 2..];
        let end = match rest.find('}') {
            Some(e) => e,
            None => return,
        };
        let var = &rest[..end];
        rest = &rest[end + 1..];
        // ${!Literal} is an escape, not a reference
        if var.starts_with('!') || var.starts_with("AWS::") {
            continue;
        }
        let id = var.split('.').next().unwrap_or(var);
        if !id.is_empty() {
            out.insert(id.to_string());
        }
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn intrinsics_serialize_in_cfn_form() {
        assert_eq!(serde_json::to_value(StrVal::from("plain")).unwrap(), json!("plain"));
        assert_eq!(serde_json::to_value(get_ref("Bucket")).unwrap(), json!({"Ref": "Bucket"}));
        assert_eq!(
            serde_json::to_value(get_att("Dist", "DomainName")).unwrap(),
            json!({"Fn::GetAtt": ["Dist", "DomainName"]})
        );
        assert_eq!(
            serde_json::to_value(StrVal::Sub("arn:aws:s3:::${Bucket}/*".into())).unwrap(),
            json!({"Fn::Sub": "arn:aws:s3:::${Bucket}/*"})
        );
    }

    #[test]
    fn finds_references_through_nested_properties() {
        let props = json!({
            "Bucket": {"Ref": "SiteBucket"},
            "Region": {"Ref": "AWS::Region"},
            "Origins": [{"DomainName": {"Fn::GetAtt": ["SiteBucket2", "DomainName"]}}],
            "Resource": {"Fn::Sub": "arn:${AWS::Partition}:s3:::${SiteBucket3.Arn}/${!Literal}"},
        });
        let mut out = BTreeSet::new();
        collect_references(&props, &mut out);
        let expected: BTreeSet<String> = ["SiteBucket", "SiteBucket2", "SiteBucket3"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn resources_keep_declaration_order() {
        let mut template = Template::default();
        for id in ["Zeta", "Alpha", "Mid"] {
            template.push_resource(id.to_string(), SavedResource {
                ty: "AWS::S3::Bucket".into(),
                properties: json!({}),
                depends_on: vec![],
            });
        }
        let text = template.to_json_pretty().unwrap();
        let zeta = text.find("\"Zeta\"").unwrap();
        let alpha = text.find("\"Alpha\"").unwrap();
        let mid = text.find("\"Mid\"").unwrap();
        assert!(zeta < alpha && alpha < mid);
        assert_eq!(template.declaration_index("Mid"), Some(2));
        assert!(!text.contains("Outputs"));
    }
}
