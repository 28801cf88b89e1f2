//! HTTP span helpers.

use uuid::Uuid;

/// Processor-assigned payment intent ids, e.g. `pi_3Mtw...`.
const PAYMENT_INTENT_PREFIX: &str = "pi_";

#[derive(Debug, Clone)]
pub(super) struct RequestSpanName {
    pub(super) otel_path: String,
    pub(super) otel_span_name: String,
}

pub(super) fn request_span_name(method: &str, path: &str) -> RequestSpanName {
    let otel_path = normalise_path_for_span_name(path);
    let otel_span_name = format!("{method} {otel_path}");

    RequestSpanName {
        otel_path,
        otel_span_name,
    }
}

/// Replace identifiers with placeholders so routes have bounded cardinality.
fn normalise_path_for_span_name(path: &str) -> String {
    if path == "/" {
        return "/".to_owned();
    }

    let segments: Vec<&str> = path
        .trim_start_matches('/')
        .split('/')
        .map(|segment| {
            if Uuid::parse_str(segment).is_ok() {
                "{uuid}"
            } else if segment.starts_with(PAYMENT_INTENT_PREFIX) {
                "{intent}"
            } else {
                segment
            }
        })
        .collect();

    format!("/{}", segments.join("/"))
}
