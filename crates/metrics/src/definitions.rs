//! Metric name and label definitions.

/// Inbound messages and command dispatch
pub mod commands {
    /// Inbound messages seen by the router
    pub const MESSAGES_RECEIVED_TOTAL: &str = "paperbot_messages_received_total";
    /// Recognized commands, labelled by `command`
    pub const RECEIVED_TOTAL: &str = "paperbot_commands_received_total";
    /// Commands rejected with a usage or reference error
    pub const USER_ERRORS_TOTAL: &str = "paperbot_command_user_errors_total";
    /// Failures caught at the per-message boundary
    pub const HANDLER_FAILURES_TOTAL: &str = "paperbot_command_handler_failures_total";
}

/// Repository search/detail API
pub mod repository {
    /// Requests sent, labelled by `operation` (search/detail)
    pub const REQUESTS_TOTAL: &str = "paperbot_repository_requests_total";
    /// Failed requests, labelled by `operation`
    pub const ERRORS_TOTAL: &str = "paperbot_repository_errors_total";
    /// Request duration in seconds
    pub const REQUEST_DURATION_SECONDS: &str = "paperbot_repository_request_duration_seconds";
}

/// Document pipeline
pub mod pipeline {
    /// Runs started, labelled by `source` (index/url/attachment)
    pub const RUNS_TOTAL: &str = "paperbot_pipeline_runs_total";
    /// Runs aborted, labelled by `stage`
    pub const ABORTS_TOTAL: &str = "paperbot_pipeline_aborts_total";
    /// End-to-end run duration in seconds
    pub const RUN_DURATION_SECONDS: &str = "paperbot_pipeline_run_duration_seconds";
    /// Extracted characters before truncation
    pub const EXTRACTED_CHARS: &str = "paperbot_pipeline_extracted_chars";
}

/// Summarization API
pub mod summarizer {
    pub const REQUESTS_TOTAL: &str = "paperbot_summarizer_requests_total";
    pub const ERRORS_TOTAL: &str = "paperbot_summarizer_errors_total";
    pub const REQUEST_DURATION_SECONDS: &str = "paperbot_summarizer_request_duration_seconds";
}

/// WhatsApp sidecar transport
pub mod whatsapp {
    pub const MESSAGES_RECEIVED_TOTAL: &str = "paperbot_whatsapp_messages_received_total";
    pub const MESSAGES_SENT_TOTAL: &str = "paperbot_whatsapp_messages_sent_total";
    pub const SEND_ERRORS_TOTAL: &str = "paperbot_whatsapp_send_errors_total";
    pub const MEDIA_DOWNLOADS_TOTAL: &str = "paperbot_whatsapp_media_downloads_total";
    /// Events that waited for room in a full queue
    pub const EVENTS_DEFERRED_TOTAL: &str = "paperbot_whatsapp_events_deferred_total";
    /// Events lost because no runtime could hold them
    pub const EVENTS_DROPPED_TOTAL: &str = "paperbot_whatsapp_events_dropped_total";
}

/// Common label keys
pub mod labels {
    pub const COMMAND: &str = "command";
    pub const OPERATION: &str = "operation";
    pub const SOURCE: &str = "source";
    pub const STAGE: &str = "stage";
    pub const STATUS: &str = "status";
    pub const MODEL: &str = "model";
}

/// Histogram buckets
pub mod buckets {
    /// Repository/summarizer HTTP calls
    pub const HTTP_DURATION: [f64; 10] = [0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0];
    /// Full pipeline runs (download + extract + summarize)
    pub const PIPELINE_DURATION: [f64; 9] = [1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0, 120.0, 300.0];
}
