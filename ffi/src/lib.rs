use jni::JNIEnv;
use jni::objects::{JClass, JString};
use jni::sys::jstring;
use onemore_engine::api::{SimulationConfig, simulate_battle, simulate_many};
use serde::{Deserialize, Serialize};
use serde_json::json;

const VERSION: &str = concat!("onemore-ffi ", env!("CARGO_PKG_VERSION"));

fn ok(value: serde_json::Value) -> String {
    json!({ "ok": true, "result": value }).to_string()
}

fn err(e: impl std::fmt::Display) -> String {
    json!({ "ok": false, "error": e.to_string() }).to_string()
}

fn envelope<T: Serialize>(result: anyhow::Result<T>) -> String {
    match result.and_then(|r| Ok(serde_json::to_value(r)?)) {
        Ok(value) => ok(value),
        Err(e) => err(format!("{:#}", e)),
    }
}

/// Null on allocation failure; the JVM has a pending exception in that case.
fn to_java(env: &JNIEnv, text: &str) -> jstring {
    match env.new_string(text) {
        Ok(s) => s.into_raw(),
        Err(_) => std::ptr::null_mut(),
    }
}

fn read_input(env: &mut JNIEnv, json: &JString) -> Result<String, String> {
    env.get_string(json)
        .map(String::from)
        .map_err(|e| err(format!("invalid_input: {}", e)))
}

#[derive(Deserialize)]
struct ManyRequest {
    #[serde(default = "default_samples")]
    samples: u32,
    #[serde(flatten)]
    config: SimulationConfig,
}

fn default_samples() -> u32 {
    100
}

/// `{"encounter": "shadow_ambush", "seed": 7}` in, `{"ok": .., "result": ..}` out.
pub fn simulate_battle_json(input: &str) -> String {
    let cfg: SimulationConfig = match serde_json::from_str(input) {
        Ok(c) => c,
        Err(e) => return err(format!("invalid_config: {}", e)),
    };
    envelope(simulate_battle(cfg))
}

/// Same as [`simulate_battle_json`] plus an optional `samples` count (default 100).
pub fn simulate_many_json(input: &str) -> String {
    let req: ManyRequest = match serde_json::from_str(input) {
        Ok(r) => r,
        Err(e) => return err(format!("invalid_config: {}", e)),
    };
    envelope(simulate_many(req.config, req.samples))
}

#[no_mangle]
pub extern "system" fn Java_com_onemore_Ffi_version<'local>(
    env: JNIEnv<'local>,
    _class: JClass<'local>,
) -> jstring {
    to_java(&env, VERSION)
}

#[no_mangle]
pub extern "system" fn Java_com_onemore_Ffi_simulateBattleJson(
    mut env: JNIEnv,
    _class: JClass,
    json: JString,
) -> jstring {
    let out = match read_input(&mut env, &json) {
        Ok(input) => simulate_battle_json(&input),
        Err(e) => e,
    };
    to_java(&env, &out)
}

#[no_mangle]
pub extern "system" fn Java_com_onemore_Ffi_simulateManyJson(
    mut env: JNIEnv,
    _class: JClass,
    json: JString,
) -> jstring {
    let out = match read_input(&mut env, &json) {
        Ok(input) => simulate_many_json(&input),
        Err(e) => e,
    };
    to_java(&env, &out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn parse(s: &str) -> Value {
        serde_json::from_str(s).unwrap()
    }

    #[test]
    fn battle_json_wraps_the_result() {
        let out = parse(&simulate_battle_json(r#"{"encounter":"shadow_ambush","seed":11}"#));
        assert_eq!(out["ok"], true);
        assert!(out["result"]["rounds"].as_u64().unwrap() > 0);
        assert!(out["result"]["log"].as_array().is_some_and(|l| !l.is_empty()));
    }

    #[test]
    fn many_json_counts_samples() {
        let out = parse(&simulate_many_json(r#"{"encounter":"gatekeeper","samples":4}"#));
        assert_eq!(out["ok"], true);
        assert_eq!(out["result"]["samples"], 4);
    }

    #[test]
    fn errors_come_back_as_json() {
        let bad = parse(&simulate_battle_json("not json"));
        assert_eq!(bad["ok"], false);
        assert!(bad["error"].as_str().unwrap().starts_with("invalid_config"));

        let unknown = parse(&simulate_battle_json(r#"{"encounter":"nowhere"}"#));
        assert_eq!(unknown["ok"], false);
        assert!(unknown["error"].as_str().unwrap().contains("nowhere"));
    }

    #[test]
    fn version_names_the_crate() {
        assert!(VERSION.starts_with("onemore-ffi "));
    }
}
