//! Batch operations and the `$batch` multipart codec.
//!
//! Each chunk is sent as one `$batch` request holding a single changeset.
//! The tenant answers with one embedded HTTP response per operation, or a
//! single response when the whole changeset was rejected.

use uuid::Uuid;

use crate::remote::{RemoteError, RemoteResult};

/// One "set parameter value" operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOperation {
    pub artifact_id: String,
    pub version: String,
    pub key: String,
    pub value: String,
}

/// Result of one operation inside a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationOutcome {
    pub key: String,
    pub status: u16,
    pub error: Option<String>,
}

impl OperationOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && (200..300).contains(&self.status)
    }
}

/// Split operations into chunks of at most `chunk_size` (minimum 1).
pub fn partition(operations: &[BatchOperation], chunk_size: usize) -> Vec<&[BatchOperation]> {
    operations.chunks(chunk_size.max(1)).collect()
}

/// Quote a value for use inside an OData key predicate.
pub fn odata_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Resource path of a single configuration parameter, relative to `/api/v1/`.
pub fn configuration_path(artifact_id: &str, version: &str, key: &str) -> String {
    format!(
        "IntegrationDesigntimeArtifacts(Id={},Version={})/$links/Configurations({})",
        odata_literal(artifact_id),
        odata_literal(version),
        odata_literal(key)
    )
}

/// An encoded `$batch` request body and its boundary.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub boundary: String,
    pub body: String,
}

impl BatchRequest {
    pub fn content_type(&self) -> String {
        format!("multipart/mixed; boundary={}", self.boundary)
    }
}

/// Encode one chunk as a `$batch` body with a single changeset.
pub fn encode_chunk(chunk: &[BatchOperation]) -> RemoteResult<BatchRequest> {
    let id = Uuid::new_v4().simple().to_string();
    let boundary = format!("batch_{id}");
    let changeset = format!("changeset_{id}");

    let mut body = String::new();
    body.push_str(&format!("--{boundary}\r\n"));
    body.push_str(&format!(
        "Content-Type: multipart/mixed; boundary={changeset}\r\n\r\n"
    ));

    for (index, op) in chunk.iter().enumerate() {
        let payload = serde_json::json!({ "ParameterValue": op.value });
        let payload =
            serde_json::to_string(&payload).map_err(|e| RemoteError::Decode(e.to_string()))?;

        body.push_str(&format!("--{changeset}\r\n"));
        body.push_str("Content-Type: application/http\r\n");
        body.push_str("Content-Transfer-Encoding: binary\r\n");
        body.push_str(&format!("Content-ID: param_{index}\r\n\r\n"));
        body.push_str(&format!(
            "PUT {} HTTP/1.1\r\n",
            configuration_path(&op.artifact_id, &op.version, &op.key)
        ));
        body.push_str("Content-Type: application/json\r\n");
        body.push_str("Accept: application/json\r\n\r\n");
        body.push_str(&payload);
        body.push_str("\r\n\r\n");
    }

    body.push_str(&format!("--{changeset}--\r\n\r\n"));
    body.push_str(&format!("--{boundary}--\r\n"));

    Ok(BatchRequest { boundary, body })
}

/// Decode the embedded responses of a `$batch` reply for `chunk`.
pub fn decode_chunk(chunk: &[BatchOperation], body: &str) -> RemoteResult<Vec<OperationOutcome>> {
    let statuses: Vec<(u16, String)> = body
        .lines()
        .filter_map(|line| line.trim().strip_prefix("HTTP/1.1 "))
        .filter_map(|rest| {
            let mut parts = rest.splitn(2, ' ');
            let code = parts.next()?.trim().parse::<u16>().ok()?;
            let reason = parts.next().unwrap_or_default().trim().to_string();
            Some((code, reason))
        })
        .collect();

    let status_for = |index: usize| -> Option<&(u16, String)> {
        match statuses.len() {
            n if n == chunk.len() => statuses.get(index),
            // A rejected changeset yields a single response for all of it.
            1 => statuses.first(),
            _ => None,
        }
    };

    chunk
        .iter()
        .enumerate()
        .map(|(index, op)| {
            let (status, reason) = status_for(index).ok_or_else(|| {
                RemoteError::Decode(format!(
                    "batch reply holds {} responses for {} operations",
                    statuses.len(),
                    chunk.len()
                ))
            })?;
            let error = if (200..300).contains(status) {
                None
            } else {
                Some(format!("HTTP {status} {reason}").trim_end().to_string())
            };
            Ok(OperationOutcome {
                key: op.key.clone(),
                status: *status,
                error,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ops(n: usize) -> Vec<BatchOperation> {
        (0..n)
            .map(|i| BatchOperation {
                artifact_id: "DEV_Flow1".into(),
                version: "active".into(),
                key: format!("Key{i}"),
                value: format!("value \"{i}\""),
            })
            .collect()
    }

    #[test]
    fn test_partition_sizes() {
        let operations = ops(5);
        let sizes: Vec<_> = partition(&operations, 2).iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);

        let sizes: Vec<_> = partition(&operations, 90).iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![5]);

        assert!(partition(&[], 3).is_empty());
    }

    #[test]
    fn test_configuration_path_escapes_quotes() {
        assert_eq!(
            configuration_path("Flow1", "active", "O'Brien"),
            "IntegrationDesigntimeArtifacts(Id='Flow1',Version='active')/$links/Configurations('O''Brien')"
        );
    }

    #[test]
    fn test_encode_chunk() {
        let chunk = ops(2);
        let request = encode_chunk(&chunk).unwrap();

        assert!(request.content_type().starts_with("multipart/mixed; boundary=batch_"));
        assert_eq!(request.body.matches("PUT IntegrationDesigntimeArtifacts").count(), 2);
        assert!(request.body.contains("Content-ID: param_1"));
        assert!(request.body.contains(r#"{"ParameterValue":"value \"0\""}"#));
        assert!(request.body.ends_with(&format!("--{}--\r\n", request.boundary)));
    }

    #[test]
    fn test_decode_per_operation_statuses() {
        let chunk = ops(2);
        let reply = "--batchresponse\r\nContent-Type: application/http\r\n\r\nHTTP/1.1 204 No Content\r\n\r\n\
                     --batchresponse\r\nContent-Type: application/http\r\n\r\nHTTP/1.1 400 Bad Request\r\n\r\n";

        let outcomes = decode_chunk(&chunk, reply).unwrap();
        assert!(outcomes[0].is_success());
        assert!(!outcomes[1].is_success());
        assert_eq!(outcomes[1].key, "Key1");
        assert_eq!(outcomes[1].error.as_deref(), Some("HTTP 400 Bad Request"));
    }

    #[test]
    fn test_decode_rejected_changeset_applies_to_all() {
        let chunk = ops(3);
        let outcomes = decode_chunk(&chunk, "HTTP/1.1 500 Internal Server Error\r\n").unwrap();
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(|o| o.status == 500));
    }

    #[test]
    fn test_decode_mismatched_reply_is_error() {
        let chunk = ops(3);
        let reply = "HTTP/1.1 204 No Content\r\nHTTP/1.1 204 No Content\r\n";
        assert!(matches!(decode_chunk(&chunk, reply), Err(RemoteError::Decode(_))));
    }
}
