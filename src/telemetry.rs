//! Tracing setup.
//!
//! - LOG_LEVEL: EnvFilter directives; falls back to `DEFAULT_FILTER`.
//! - LOG_FORMAT: "json" for JSON lines, anything else for the pretty format.
//!
//! Domain events log under the `generation`, `store` and `export` targets;
//! per-request spans come from tower-http's TraceLayer.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str =
    "info,edtest_backend=debug,generation=debug,store=debug,export=debug,tower_http=info,axum=info";

fn wants_json(format: Option<&str>) -> bool {
    matches!(format.map(str::trim), Some(f) if f.eq_ignore_ascii_case("json"))
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    // The two builders have different types, so each branch initializes its own.
    if wants_json(std::env::var("LOG_FORMAT").ok().as_deref()) {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_json_selects_json_output() {
        assert!(wants_json(Some("json")));
        assert!(wants_json(Some(" JSON ")));
        assert!(!wants_json(Some("pretty")));
        assert!(!wants_json(None));
    }

    #[test]
    fn default_filter_parses() {
        assert!(DEFAULT_FILTER.parse::<EnvFilter>().is_ok());
    }
}
