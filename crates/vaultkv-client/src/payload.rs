//! Request body adaptation.

use serde_json::{Map, Value};

use crate::mount::MountInfo;
use crate::path::{LogicalOperation, adjust_path};

/// Path and body of a logical request after adaptation to its mount.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptedRequest {
    pub final_path: String,
    pub body: Option<Value>,
}

/// Nest a write body under `data` for a v2 engine; pass it through otherwise.
pub fn wrap_for_write(engine_version: u32, body: Value) -> Value {
    if engine_version == 2 {
        let mut wrapped = Map::with_capacity(1);
        wrapped.insert("data".to_owned(), body);
        Value::Object(wrapped)
    } else {
        body
    }
}

/// Rewrite path and body of one logical request for `mount`.
///
/// Only write bodies are wrapped; any other payload (for instance the
/// `versions` list of a version operation) is sent as given.
pub fn adapt(
    mount: &MountInfo,
    path: &str,
    operation: LogicalOperation,
    payload: Option<Value>,
) -> AdaptedRequest {
    let final_path = adjust_path(path, mount, operation);
    let body = match operation {
        LogicalOperation::Write => payload.map(|b| wrap_for_write(mount.engine_version(), b)),
        _ => payload,
    };
    AdaptedRequest { final_path, body }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn v2_wraps_under_data() {
        let wrapped = wrap_for_write(2, json!({"k": "v"}));
        assert_eq!(wrapped["data"], json!({"k": "v"}));
        assert_eq!(wrapped.as_object().map(Map::len), Some(1));
    }

    #[test]
    fn v1_passes_through() {
        let body = wrap_for_write(1, json!({"k": "v"}));
        assert_eq!(body, json!({"k": "v"}));
        assert!(body.get("data").is_none());
    }

    #[test]
    fn adapt_v2_write() {
        let adapted = adapt(
            &MountInfo::new("secret", 2),
            "secret/app",
            LogicalOperation::Write,
            Some(json!({"password": "hunter2"})),
        );
        assert_eq!(adapted.final_path, "secret/data/app");
        assert_eq!(adapted.body, Some(json!({"data": {"password": "hunter2"}})));
    }

    #[test]
    fn adapt_v1_leaves_everything_alone() {
        let adapted = adapt(
            &MountInfo::new("secret", 1),
            "secret/app",
            LogicalOperation::Write,
            Some(json!({"password": "hunter2"})),
        );
        assert_eq!(adapted.final_path, "secret/app");
        assert_eq!(adapted.body, Some(json!({"password": "hunter2"})));
    }

    #[test]
    fn adapt_version_operation_keeps_body() {
        let adapted = adapt(
            &MountInfo::new("secret", 2),
            "secret/app",
            LogicalOperation::VersionDestroy,
            Some(json!({"versions": [1, 2]})),
        );
        assert_eq!(adapted.final_path, "secret/destroy/app");
        assert_eq!(adapted.body, Some(json!({"versions": [1, 2]})));
    }

    #[test]
    fn adapt_list_has_no_body() {
        let adapted = adapt(&MountInfo::new("secret", 2), "secret/", LogicalOperation::List, None);
        assert_eq!(adapted.final_path, "secret/metadata/?list=true");
        assert!(adapted.body.is_none());
    }
}
