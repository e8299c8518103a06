//! Human and JSON rendering for command results.

/// A command result that can be printed for people or for scripts.
pub trait Outputable {
    fn to_json(&self) -> serde_json::Value;

    fn to_human(&self) -> String;
}

/// Render `value` as pretty JSON when `json` is set, otherwise as text.
pub fn render<T: Outputable>(value: &T, json: bool) -> String {
    if !json {
        return value.to_human();
    }
    match serde_json::to_string_pretty(&value.to_json()) {
        Ok(rendered) => rendered,
        Err(e) => serde_json::json!({ "error": format!("failed to serialize: {e}") }).to_string(),
    }
}

pub fn print_output<T: Outputable>(value: &T, json: bool) {
    println!("{}", render(value, json));
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Held(u64);

    impl Outputable for Held {
        fn to_json(&self) -> serde_json::Value {
            serde_json::json!({ "token": self.0 })
        }

        fn to_human(&self) -> String {
            format!("held with token {}", self.0)
        }
    }

    #[test]
    fn test_render_picks_format() {
        assert_eq!(render(&Held(7), false), "held with token 7");

        let parsed: serde_json::Value = serde_json::from_str(&render(&Held(7), true)).unwrap();
        assert_eq!(parsed["token"], 7);
    }
}
