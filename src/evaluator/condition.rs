use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::codegen::{GuardLiteral, RouteBranch, RouteGuard, RouteTable, DATETIME_FORMAT};
use crate::model::RouteSource;

use super::operators::compare_ordered;

/// Evaluate the branches in declared order and return the first whose guard
/// matches, or `None` when no branch is taken.
pub fn select_branch<'a>(
    table: &'a RouteTable,
    headers: &HashMap<String, String>,
    params: &HashMap<String, String>,
) -> Option<&'a RouteBranch> {
    table
        .branches
        .iter()
        .find(|branch| evaluate_guard(&branch.guard, headers, params))
}

/// Evaluate one guard. The left-hand value is extracted from the request and
/// coerced to the declared type with the original engine's lenient defaults:
/// an absent or unparseable operand becomes `0`, `0.0`, the empty string or
/// the epoch instead of failing the request.
pub fn evaluate_guard(
    guard: &RouteGuard,
    headers: &HashMap<String, String>,
    params: &HashMap<String, String>,
) -> bool {
    let left = extract_left(guard.source, &guard.key, headers, params);

    match &guard.literal {
        GuardLiteral::String(right) => {
            compare_ordered(left.unwrap_or(""), guard.op, right.as_str())
        }
        GuardLiteral::Integer(right) => {
            let left = left.and_then(|v| v.trim().parse::<i64>().ok()).unwrap_or(0);
            compare_ordered(left, guard.op, *right)
        }
        GuardLiteral::Double(right) => {
            let left = left
                .and_then(|v| v.trim().parse::<f64>().ok())
                .unwrap_or(0.0);
            compare_ordered(left, guard.op, *right)
        }
        GuardLiteral::Datetime(right) => {
            let left = left
                .and_then(|v| NaiveDateTime::parse_from_str(v.trim(), DATETIME_FORMAT).ok())
                .unwrap_or_else(epoch);
            // The literal was proven parseable at generation time.
            let right =
                NaiveDateTime::parse_from_str(right, DATETIME_FORMAT).ok().unwrap_or_else(epoch);
            compare_ordered(left, guard.op, right)
        }
    }
}

fn epoch() -> NaiveDateTime {
    chrono::DateTime::<chrono::Utc>::UNIX_EPOCH.naive_utc()
}

fn extract_left<'a>(
    source: RouteSource,
    key: &str,
    headers: &'a HashMap<String, String>,
    params: &'a HashMap<String, String>,
) -> Option<&'a str> {
    match source {
        // Header maps are normalized to lowercase keys by the executor.
        RouteSource::ReqHeader => headers.get(&key.to_ascii_lowercase()).map(String::as_str),
        RouteSource::ReqParam => params.get(key).map(String::as_str),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RouteOp;

    fn guard(
        source: RouteSource,
        key: &str,
        op: RouteOp,
        literal: GuardLiteral,
    ) -> RouteGuard {
        RouteGuard {
            source,
            key: key.into(),
            op,
            literal,
        }
    }

    fn branch(port: &str, target: &str, g: RouteGuard) -> RouteBranch {
        RouteBranch {
            port_id: port.into(),
            guard: g,
            target_node_id: target.into(),
        }
    }

    fn params(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_integer_guard_with_param() {
        let g = guard(
            RouteSource::ReqParam,
            "age",
            RouteOp::Ge,
            GuardLiteral::Integer(18),
        );
        assert!(evaluate_guard(&g, &HashMap::new(), &params(&[("age", "20")])));
        assert!(!evaluate_guard(&g, &HashMap::new(), &params(&[("age", "10")])));
        // Missing param coerces to 0.
        assert!(!evaluate_guard(&g, &HashMap::new(), &HashMap::new()));
        // Garbage coerces to 0 as well.
        assert!(!evaluate_guard(&g, &HashMap::new(), &params(&[("age", "x")])));
    }

    #[test]
    fn test_header_lookup_is_case_insensitive_on_key() {
        let g = guard(
            RouteSource::ReqHeader,
            "X-Tenant",
            RouteOp::Eq,
            GuardLiteral::String("acme".into()),
        );
        let headers = params(&[("x-tenant", "acme")]);
        assert!(evaluate_guard(&g, &headers, &HashMap::new()));
    }

    #[test]
    fn test_datetime_guard() {
        let g = guard(
            RouteSource::ReqParam,
            "since",
            RouteOp::Gt,
            GuardLiteral::Datetime("2024-01-01 00:00:00".into()),
        );
        assert!(evaluate_guard(
            &g,
            &HashMap::new(),
            &params(&[("since", "2024-06-01 10:00:00")])
        ));
        // Unparseable left operand falls back to the epoch.
        assert!(!evaluate_guard(
            &g,
            &HashMap::new(),
            &params(&[("since", "tomorrow")])
        ));
    }

    #[test]
    fn test_first_true_guard_wins() {
        let table = RouteTable {
            branches: vec![
                branch(
                    "p1",
                    "end_a",
                    guard(
                        RouteSource::ReqParam,
                        "v",
                        RouteOp::Gt,
                        GuardLiteral::Integer(100),
                    ),
                ),
                branch(
                    "p2",
                    "end_b",
                    guard(
                        RouteSource::ReqParam,
                        "v",
                        RouteOp::Gt,
                        GuardLiteral::Integer(10),
                    ),
                ),
                branch(
                    "p3",
                    "end_c",
                    guard(
                        RouteSource::ReqParam,
                        "v",
                        RouteOp::Gt,
                        GuardLiteral::Integer(1),
                    ),
                ),
            ],
        };
        // Guards evaluate [false, true, true]: the second branch is selected.
        let selected = select_branch(&table, &HashMap::new(), &params(&[("v", "50")])).unwrap();
        assert_eq!(selected.target_node_id, "end_b");
    }

    #[test]
    fn test_no_branch_taken() {
        let table = RouteTable {
            branches: vec![branch(
                "p1",
                "end_a",
                guard(
                    RouteSource::ReqParam,
                    "v",
                    RouteOp::Gt,
                    GuardLiteral::Integer(100),
                ),
            )],
        };
        assert!(select_branch(&table, &HashMap::new(), &params(&[("v", "5")])).is_none());
    }
}
