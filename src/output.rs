use std::sync::OnceLock;

/// Environment variable silencing all user-facing output
pub const QUIET_ENV: &str = "KEMIST_QUIET";

static QUIET: OnceLock<bool> = OnceLock::new();

pub fn is_quiet() -> bool {
    *QUIET.get_or_init(|| {
        std::env::var(QUIET_ENV)
            .map(|v| parse_flag(&v))
            .unwrap_or(false)
    })
}

fn parse_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
