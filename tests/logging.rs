// tests/logging.rs

use taskexplorer::cli::LogLevel;
use taskexplorer::logging::build_filter;
use tracing_subscriber::filter::LevelFilter;

#[test]
fn cli_flag_overrides_the_environment() {
    let filter = build_filter(Some(LogLevel::Debug), Some("error"));
    assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
}

#[test]
fn environment_directives_allow_per_module_levels() {
    let filter = build_filter(None, Some("warn,taskexplorer::watch=trace"));
    assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));
}

#[test]
fn missing_or_garbled_environment_falls_back_to_info() {
    for env in [None, Some(""), Some("   "), Some("taskexplorer=loud")] {
        let filter = build_filter(None, env);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO), "env {env:?}");
    }
}
