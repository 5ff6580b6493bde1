//! Converts each engine's typed output into a [`CanonicalResult`].

use serde_json::{Map, Value};

use super::canonical::{CanonicalResult, Dataset, ResultMeta};
use super::ports::{RecordSets, RemoteDataset, RemoteReturn};

const DEFAULT_STATUS: u16 = 200;
const DEFAULT_MESSAGE: &str = "Success";

fn field<'a>(row: &'a Map<String, Value>, pascal: &str, camel: &str) -> Option<&'a Value> {
    row.get(pascal).or_else(|| row.get(camel))
}

fn status_from(value: &Value) -> Option<u16> {
    let code = match value {
        Value::Number(number) => number.as_u64()?,
        Value::String(text) => text.trim().parse().ok()?,
        _ => return None,
    };
    u16::try_from(code).ok().and_then(http_status)
}

/// `code` when it is a usable HTTP status.
fn http_status(code: u16) -> Option<u16> {
    (100..=599).contains(&code).then_some(code)
}

fn build(status_code: u16, message: String, dataset: Dataset, meta: ResultMeta) -> CanonicalResult {
    CanonicalResult {
        status_code,
        success: CanonicalResult::is_success_status(status_code),
        message,
        dataset,
        meta,
    }
}

/// Normalise relational record-sets.
///
/// The first record of the first set may carry `StatusCode`/`Message`
/// (`statusCode`/`message` also accepted); every set is kept, named
/// `table1…tableN` in server order.
pub fn normalize_relational(record_sets: RecordSets, meta: ResultMeta) -> CanonicalResult {
    let sets = record_sets.into_inner();
    let status_row = sets
        .first()
        .and_then(|set| set.first())
        .and_then(Value::as_object);

    let status_code = status_row
        .and_then(|row| field(row, "StatusCode", "statusCode"))
        .and_then(status_from)
        .unwrap_or(DEFAULT_STATUS);
    let message = status_row
        .and_then(|row| field(row, "Message", "message"))
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_MESSAGE)
        .to_owned();

    build(status_code, message, Dataset::from_positional(sets), meta)
}

/// Normalise a decoded remote reply.
///
/// Envelopes pass through, except that a status outside 100..=599 becomes
/// 200 as on the relational path. A raw array becomes the rows of
/// `table1`; `null` becomes an empty `table1`; any other value becomes its
/// single row.
pub fn normalize_remote(reply: RemoteReturn, meta: ResultMeta) -> CanonicalResult {
    match reply {
        RemoteReturn::Envelope(envelope) => {
            let dataset = match envelope.dataset {
                RemoteDataset::Positional(sets) => Dataset::from_positional(sets),
                RemoteDataset::Named(sets) => Dataset::from_named(sets),
                RemoteDataset::Empty => Dataset::default(),
            };
            let message = envelope
                .message
                .unwrap_or_else(|| DEFAULT_MESSAGE.to_owned());
            let status_code = http_status(envelope.status_code).unwrap_or(DEFAULT_STATUS);
            build(status_code, message, dataset, meta)
        }
        RemoteReturn::Raw(value) => {
            let rows = match value {
                Value::Array(rows) => rows,
                Value::Null => Vec::new(),
                other => vec![other],
            };
            build(
                DEFAULT_STATUS,
                DEFAULT_MESSAGE.to_owned(),
                Dataset::from_positional(vec![rows]),
                meta,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::canonical::Engine;
    use crate::domain::names::{ProcedureName, ProjectName};
    use crate::domain::ports::RemoteEnvelope;
    use rstest::{fixture, rstest};
    use serde_json::json;

    #[fixture]
    fn meta() -> ResultMeta {
        ResultMeta {
            project: ProjectName::new("ecom").expect("project"),
            backend: Engine::Sql,
            procedure: ProcedureName::new("GetOrders").expect("procedure"),
            database: None,
            duration_ms: 3,
        }
    }

    #[rstest]
    fn two_record_sets_keep_their_order(meta: ResultMeta) {
        let sets = RecordSets(vec![
            vec![json!({"StatusCode": 200, "Message": "OK"}), json!({"id": 2})],
            vec![json!({"total": 9})],
        ]);

        let result = normalize_relational(sets, meta);
        let names: Vec<_> = result.dataset.iter().map(|set| set.name()).collect();

        assert_eq!(names, ["table1", "table2"]);
        assert_eq!(result.dataset.get("table1").map(|set| set.rows().len()), Some(2));
        assert_eq!(result.message, "OK");
    }

    #[rstest]
    #[case(json!({"StatusCode": 409, "Message": "Duplicate order"}), 409, "Duplicate order", false)]
    #[case(json!({"statusCode": 201, "message": "Created"}), 201, "Created", true)]
    #[case(json!({"StatusCode": "404"}), 404, "Success", false)]
    #[case(json!({"id": 1}), 200, "Success", true)]
    #[case(json!({"StatusCode": 70000}), 200, "Success", true)]
    fn status_comes_from_the_first_record(
        meta: ResultMeta,
        #[case] first: Value,
        #[case] code: u16,
        #[case] message: &str,
        #[case] success: bool,
    ) {
        let result = normalize_relational(RecordSets(vec![vec![first]]), meta);
        assert_eq!(result.status_code, code);
        assert_eq!(result.message, message);
        assert_eq!(result.success, success);
    }

    #[rstest]
    fn no_record_sets_is_a_plain_success(meta: ResultMeta) {
        let result = normalize_relational(RecordSets::default(), meta);
        assert_eq!(result.status_code, 200);
        assert!(result.dataset.is_empty());
    }

    #[rstest]
    fn envelopes_pass_through(meta: ResultMeta) {
        let reply = RemoteReturn::Envelope(RemoteEnvelope {
            status_code: 422,
            message: Some("Invalid state".to_owned()),
            dataset: RemoteDataset::Named(vec![("orders".to_owned(), vec![json!({"id": 1})])]),
        });

        let result = normalize_remote(reply, meta);
        assert_eq!(result.status_code, 422);
        assert!(!result.success);
        assert!(result.dataset.get("orders").is_some());
    }

    #[rstest]
    #[case(json!([{"id": 1}, {"id": 2}]), 2)]
    #[case(json!({"id": 1}), 1)]
    #[case(json!(5), 1)]
    #[case(Value::Null, 0)]
    fn raw_values_become_table1(meta: ResultMeta, #[case] raw: Value, #[case] rows: usize) {
        let result = normalize_remote(RemoteReturn::Raw(raw), meta);
        assert_eq!(result.status_code, 200);
        assert_eq!(result.dataset.len(), 1);
        assert_eq!(result.dataset.get("table1").map(|set| set.rows().len()), Some(rows));
    }

    #[rstest]
    #[case(0, 200, true)]
    #[case(42, 200, true)]
    #[case(999, 200, true)]
    #[case(100, 100, true)]
    #[case(599, 599, false)]
    fn envelope_status_outside_http_range_falls_back(
        meta: ResultMeta,
        #[case] raw: u16,
        #[case] code: u16,
        #[case] success: bool,
    ) {
        let reply = RemoteReturn::Envelope(RemoteEnvelope {
            status_code: raw,
            message: None,
            dataset: RemoteDataset::Empty,
        });

        let result = normalize_remote(reply, meta);
        assert_eq!(result.status_code, code);
        assert_eq!(result.success, success);
        assert_eq!(result.message, "Success");
    }
}
