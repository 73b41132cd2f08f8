use actix_web::HttpResponse;
use join_status::JoinStatus;
use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounterVec, Opts, TextEncoder};

static JOIN_STATUS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "membership_service_join_status_total",
            "Join statuses resolved by membership-service",
        ),
        &["kind", "status"],
    )
    .expect("failed to create membership_service_join_status_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register membership_service_join_status_total");
    counter
});

/// Which flow resolved the status
#[derive(Debug, Clone, Copy)]
pub enum ResolutionKind {
    Stream,
    ChatSpace,
}

impl ResolutionKind {
    fn as_str(&self) -> &'static str {
        match self {
            ResolutionKind::Stream => "stream",
            ResolutionKind::ChatSpace => "chat_space",
        }
    }
}

pub fn record_resolution(kind: ResolutionKind, status: JoinStatus) {
    JOIN_STATUS_TOTAL
        .with_label_values(&[kind.as_str(), status.as_str()])
        .inc();
}

pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_resolution_increments() {
        let before = JOIN_STATUS_TOTAL
            .with_label_values(&["stream", "ATTENDED"])
            .get();
        record_resolution(ResolutionKind::Stream, JoinStatus::Attended);
        let after = JOIN_STATUS_TOTAL
            .with_label_values(&["stream", "ATTENDED"])
            .get();
        assert_eq!(after, before + 1);
    }
}
