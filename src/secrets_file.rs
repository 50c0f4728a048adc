//! Reading `secrets.local.rs`. Compiled into `build.rs`; the crate only builds it for tests.

/// Value of `pub const NAME: &str = "...";` in `src`, with `\"`, `\\`, `\n` and `\t` decoded.
pub fn extract_rust_str_const(src: &str, name: &str) -> Option<String> {
    let needle = format!("pub const {}:", name);
    for line in src.lines() {
        let trimmed = line.trim();
        if !trimmed.starts_with(&needle) {
            continue;
        }
        let start = trimmed.find('"')?;
        return decode_str_literal(&trimmed[start + 1..]);
    }
    None
}

/// Decode a string literal body up to its closing quote. `None` when it is never closed.
fn decode_str_literal(rest: &str) -> Option<String> {
    let mut value = String::new();
    let mut chars = rest.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => return Some(value),
            '\\' => match chars.next()? {
                'n' => value.push('\n'),
                't' => value.push('\t'),
                'r' => value.push('\r'),
                other => value.push(other),
            },
            other => value.push(other),
        }
    }
    None
}

/// Reject values that `Config::from_build_env` could not parse on the device.
pub fn validate(key: &str, value: &str) -> Result<(), String> {
    if value.contains('\n') || value.contains('\r') {
        // would break the `cargo:rustc-env` line
        return Err(format!("{} must be a single line", key));
    }
    match key {
        "OPENCLAW_HOST" if value.is_empty() => Err(format!("{} must not be empty", key)),
        "OPENCLAW_PORT" if value.parse::<u16>().is_err() => {
            Err(format!("{} must be a port number (0-65535), got {:?}", key, value))
        }
        "OPENCLAW_USE_TLS" if value != "0" && value != "1" => {
            Err(format!("{} must be 0 or 1, got {:?}", key, value))
        }
        "OPENCLAW_HTTP_TIMEOUT_MS" if value.parse::<u64>().is_err() => {
            Err(format!("{} must be a number of milliseconds, got {:?}", key, value))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_value() {
        let src = "pub const WIFI_SSID: &str = \"lab-net\";\n";
        assert_eq!(extract_rust_str_const(src, "WIFI_SSID").as_deref(), Some("lab-net"));
        assert_eq!(extract_rust_str_const(src, "WIFI_PASS"), None);
    }

    #[test]
    fn test_escaped_quotes_and_trailing_comment() {
        let src = r#"pub const OPENCLAW_BUTTON_PROMPT: &str = "Say \"hi\""; // "quoted" note"#;
        assert_eq!(
            extract_rust_str_const(src, "OPENCLAW_BUTTON_PROMPT").as_deref(),
            Some("Say \"hi\"")
        );
    }

    #[test]
    fn test_backslash_and_control_escapes() {
        let src = r#"pub const WIFI_PASS: &str = "a\\b\tc";"#;
        assert_eq!(extract_rust_str_const(src, "WIFI_PASS").as_deref(), Some("a\\b\tc"));
    }

    #[test]
    fn test_commented_out_and_prefix_names_are_skipped() {
        let src = "// pub const WIFI_SSID: &str = \"old\";\n\
                   pub const WIFI_SSID_2G: &str = \"other\";\n\
                   pub const WIFI_SSID: &str = \"new\";\n";
        assert_eq!(extract_rust_str_const(src, "WIFI_SSID").as_deref(), Some("new"));
    }

    #[test]
    fn test_unterminated_literal() {
        let src = r#"pub const WIFI_SSID: &str = "lab"#;
        assert_eq!(extract_rust_str_const(src, "WIFI_SSID"), None);
    }

    #[test]
    fn test_validate_rejects_what_the_device_cannot_parse() {
        assert!(validate("OPENCLAW_PORT", "70000").is_err());
        assert!(validate("OPENCLAW_PORT", "18789").is_ok());
        assert!(validate("OPENCLAW_USE_TLS", "2").is_err());
        assert!(validate("OPENCLAW_USE_TLS", "1").is_ok());
        assert!(validate("OPENCLAW_HOST", "").is_err());
        assert!(validate("OPENCLAW_HTTP_TIMEOUT_MS", "45s").is_err());
        assert!(validate("OPENCLAW_TOKEN", "").is_ok());
        assert!(validate("OPENCLAW_BUTTON_PROMPT", "two\nlines").is_err());
    }
}
