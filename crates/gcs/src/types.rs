//! JSON API resource shapes
//!
//! Only the fields gsz reads are typed; bucket metadata keeps every other
//! field in `extra` so `bucket info` can show the whole resource.

use gsz_core::ObjectInfo;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Principal granted public read access
pub const ALL_USERS: &str = "allUsers";

/// Role bound to [`ALL_USERS`] for a public bucket
pub const OBJECT_VIEWER_ROLE: &str = "roles/storage.objectViewer";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectResource {
    pub name: String,
    #[serde(default)]
    pub bucket: String,
    /// Decimal string in the wire format
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub etag: Option<String>,
    #[serde(default)]
    pub md5_hash: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub storage_class: Option<String>,
}

impl From<ObjectResource> for ObjectInfo {
    fn from(resource: ObjectResource) -> Self {
        let size = resource.size.as_deref().and_then(|s| s.parse::<u64>().ok());
        let mut info = match size {
            Some(size) => ObjectInfo::file(resource.name, size),
            None => ObjectInfo {
                size_bytes: None,
                size_human: None,
                ..ObjectInfo::file(resource.name, 0)
            },
        };
        info.last_modified = resource
            .updated
            .as_deref()
            .and_then(|t| t.parse::<Timestamp>().ok());
        info.etag = resource.etag;
        info.md5_hash = resource.md5_hash;
        info.content_type = resource.content_type;
        info.storage_class = resource.storage_class;
        info
    }
}

/// One page of `objects.list`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectList {
    #[serde(default)]
    pub items: Vec<ObjectResource>,
    #[serde(default)]
    pub prefixes: Vec<String>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketResource {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cors: Vec<CorsRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<Website>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<BucketResource> for ObjectInfo {
    fn from(resource: BucketResource) -> Self {
        let mut info = ObjectInfo::bucket(resource.name);
        info.last_modified = resource
            .time_created
            .as_deref()
            .and_then(|t| t.parse::<Timestamp>().ok());
        info.storage_class = resource.storage_class;
        info
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketList {
    #[serde(default)]
    pub items: Vec<BucketResource>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Bucket metadata merged with its IAM policy
#[derive(Debug, Clone, Serialize)]
pub struct BucketDetails {
    #[serde(flatten)]
    pub bucket: BucketResource,
    pub iam: IamPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IamPolicy {
    #[serde(default)]
    pub bindings: Vec<Binding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub role: String,
    #[serde(default)]
    pub members: Vec<String>,
}

impl IamPolicy {
    /// Whether `allUsers` can read objects
    pub fn is_public(&self) -> bool {
        self.bindings
            .iter()
            .any(|b| b.role == OBJECT_VIEWER_ROLE && b.members.iter().any(|m| m == ALL_USERS))
    }

    /// Grant `allUsers` the object viewer role; false when already granted
    pub fn add_public_binding(&mut self) -> bool {
        if self.is_public() {
            return false;
        }
        match self.bindings.iter_mut().find(|b| b.role == OBJECT_VIEWER_ROLE) {
            Some(binding) => binding.members.push(ALL_USERS.to_string()),
            None => self.bindings.push(Binding {
                role: OBJECT_VIEWER_ROLE.to_string(),
                members: vec![ALL_USERS.to_string()],
            }),
        }
        true
    }

    /// Revoke the public grant, dropping the binding if nobody is left in
    /// it; false when there was nothing to revoke
    pub fn remove_public_binding(&mut self) -> bool {
        if !self.is_public() {
            return false;
        }
        for binding in self
            .bindings
            .iter_mut()
            .filter(|b| b.role == OBJECT_VIEWER_ROLE)
        {
            binding.members.retain(|m| m != ALL_USERS);
        }
        self.bindings
            .retain(|b| b.role != OBJECT_VIEWER_ROLE || !b.members.is_empty());
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorsRule {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub origin: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub method: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub response_header: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age_seconds: Option<u64>,
}

impl CorsRule {
    /// True when every origin, method and header of `wanted` is covered here
    /// and the max age agrees (when `wanted` sets one)
    pub fn covers(&self, wanted: &CorsRule) -> bool {
        let contains = |have: &[String], want: &[String]| {
            want.iter()
                .all(|w| have.iter().any(|h| h.eq_ignore_ascii_case(w)))
        };
        contains(&self.origin, &wanted.origin)
            && contains(&self.method, &wanted.method)
            && contains(&self.response_header, &wanted.response_header)
            && (wanted.max_age_seconds.is_none() || wanted.max_age_seconds == self.max_age_seconds)
    }
}

/// Whether any configured rule covers `wanted`
pub fn cors_matches(configured: &[CorsRule], wanted: &CorsRule) -> bool {
    configured.iter().any(|rule| rule.covers(wanted))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Website {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_page_suffix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_found_page: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_resource_conversion() {
        let resource: ObjectResource = serde_json::from_value(serde_json::json!({
            "name": "docs/a.txt",
            "bucket": "b",
            "size": "2048",
            "updated": "2024-03-01T10:00:00.123Z",
            "md5Hash": "abc==",
            "contentType": "text/plain",
            "storageClass": "STANDARD"
        }))
        .unwrap();

        let info = ObjectInfo::from(resource);
        assert_eq!(info.key, "docs/a.txt");
        assert_eq!(info.size_bytes, Some(2048));
        assert_eq!(info.size_human.as_deref(), Some("2 KiB"));
        assert_eq!(info.md5_hash.as_deref(), Some("abc=="));
        assert_eq!(info.content_type.as_deref(), Some("text/plain"));
        assert!(info.last_modified.is_some());
        assert!(!info.is_dir);
    }

    #[test]
    fn test_non_numeric_size() {
        let resource = ObjectResource {
            name: "x".into(),
            size: Some("lots".into()),
            ..Default::default()
        };
        let info = ObjectInfo::from(resource);
        assert_eq!(info.size_bytes, None);
        assert_eq!(info.size_human, None);
    }

    #[test]
    fn test_bucket_keeps_unknown_fields() {
        let bucket: BucketResource = serde_json::from_value(serde_json::json!({
            "name": "site",
            "location": "US",
            "versioning": {"enabled": true},
            "website": {"mainPageSuffix": "index.html"}
        }))
        .unwrap();
        assert_eq!(bucket.location.as_deref(), Some("US"));
        assert!(bucket.extra.contains_key("versioning"));
        assert_eq!(
            bucket.website.and_then(|w| w.main_page_suffix).as_deref(),
            Some("index.html")
        );
    }

    #[test]
    fn test_add_public_binding() {
        let mut policy = IamPolicy::default();
        assert!(!policy.is_public());
        assert!(policy.add_public_binding());
        assert!(policy.is_public());
        assert!(!policy.add_public_binding());
        assert_eq!(policy.bindings.len(), 1);
    }

    #[test]
    fn test_add_public_binding_extends_existing_role() {
        let mut policy = IamPolicy {
            bindings: vec![Binding {
                role: OBJECT_VIEWER_ROLE.into(),
                members: vec!["user:a@example.com".into()],
            }],
            etag: None,
        };
        assert!(policy.add_public_binding());
        assert_eq!(policy.bindings.len(), 1);
        assert_eq!(policy.bindings[0].members.len(), 2);
    }

    #[test]
    fn test_remove_public_binding() {
        let mut policy = IamPolicy {
            bindings: vec![
                Binding {
                    role: OBJECT_VIEWER_ROLE.into(),
                    members: vec![ALL_USERS.into()],
                },
                Binding {
                    role: "roles/storage.admin".into(),
                    members: vec!["user:a@example.com".into()],
                },
            ],
            etag: None,
        };
        assert!(policy.remove_public_binding());
        assert_eq!(policy.bindings.len(), 1);
        assert_eq!(policy.bindings[0].role, "roles/storage.admin");
        assert!(!policy.remove_public_binding());
    }

    #[test]
    fn test_cors_matches() {
        let configured = vec![CorsRule {
            origin: vec!["https://example.com".into(), "https://other.com".into()],
            method: vec!["GET".into(), "HEAD".into()],
            response_header: vec!["Content-Type".into()],
            max_age_seconds: Some(3600),
        }];
        let wanted = CorsRule {
            origin: vec!["https://example.com".into()],
            method: vec!["get".into()],
            ..Default::default()
        };
        assert!(cors_matches(&configured, &wanted));

        let post = CorsRule {
            method: vec!["POST".into()],
            ..wanted.clone()
        };
        assert!(!cors_matches(&configured, &post));
        assert!(!cors_matches(&[], &wanted));
    }
}
