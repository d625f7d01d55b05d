// i18n.rs
//
// Runtime string tables for overlays, captions and log lines:
// - Built-in tables are embedded from assets/i18n.json (en, fr, es, ar)
// - Optional overrides on disk:
//   A) assets/i18n/<lang>.json        ({ "key": "value" })
//   B) assets/i18n.json next to the exe ({ "<lang>": { "key": "value" } })
// - Lookup order: selected lang (disk, then built-in) -> "en" -> key itself
// - tr("key") / tr_with("key", &[("name", ..)]) with {name} placeholders

use once_cell::sync::{Lazy, OnceCell};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::RwLock,
};

pub const FALLBACK_LANG: &str = "en";

/// Languages shipped in the embedded table, with their display names.
pub const SUPPORTED_LANGS: [(&str, &str); 4] = [
    ("en", "English"),
    ("fr", "Français"),
    ("es", "Español"),
    ("ar", "العربية"),
];

type Table = HashMap<String, String>;

static BUILTIN: Lazy<HashMap<String, Table>> = Lazy::new(|| {
    serde_json::from_str(include_str!("../assets/i18n.json")).unwrap_or_else(|e| {
        log::error!("embedded i18n table is invalid: {e}");
        HashMap::new()
    })
});

#[derive(Debug, Clone)]
pub struct I18n {
    pub lang: String,
    map: Table,
    fallback_map: Table,
}

static I18N: OnceCell<RwLock<I18n>> = OnceCell::new();

fn load_json_map(path: &Path) -> Option<Table> {
    let text = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&text).ok()
}

fn load_multi_lang_json(path: &Path, lang: &str) -> Option<Table> {
    let text = std::fs::read_to_string(path).ok()?;
    let mut all: HashMap<String, Table> = serde_json::from_str(&text).ok()?;
    all.remove(lang)
}

/// <exe_dir>/assets/<rel> first, then ./assets/<rel>.
fn find_asset(rel: &Path) -> Option<PathBuf> {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));

    exe_dir
        .into_iter()
        .chain(std::iter::once(PathBuf::new()))
        .map(|dir| dir.join("assets").join(rel))
        .find(|p| p.exists())
}

fn load_lang(lang: &str) -> Table {
    let mut table = BUILTIN.get(lang).cloned().unwrap_or_default();

    let from_disk = find_asset(&Path::new("i18n").join(format!("{lang}.json")))
        .and_then(|p| load_json_map(&p))
        .or_else(|| find_asset(Path::new("i18n.json")).and_then(|p| load_multi_lang_json(&p, lang)));

    if let Some(overrides) = from_disk {
        table.extend(overrides);
    }
    table
}

/// Initialize global i18n. Safe to call multiple times; later calls replace the tables.
pub fn init(lang: impl Into<String>) {
    let lang = lang.into();

    let map = load_lang(&lang);
    let fallback_map = if lang == FALLBACK_LANG {
        map.clone()
    } else {
        load_lang(FALLBACK_LANG)
    };

    let i = I18n {
        lang,
        map,
        fallback_map,
    };

    if let Some(lock) = I18N.get() {
        if let Ok(mut w) = lock.write() {
            *w = i;
        }
    } else if let Err(lock) = I18N.set(RwLock::new(i)) {
        // 并发初始化时另一方先写入：用我们的值覆盖
        if let (Some(current), Ok(ours)) = (I18N.get(), lock.into_inner()) {
            if let Ok(mut w) = current.write() {
                *w = ours;
            }
        }
    }
}

pub fn current_lang() -> String {
    I18N.get()
        .and_then(|l| l.read().ok().map(|i| i.lang.clone()))
        .unwrap_or_else(|| FALLBACK_LANG.to_string())
}

/// Arabic is the only right-to-left language in the table.
pub fn is_rtl(lang: &str) -> bool {
    lang == "ar" || lang.starts_with("ar-")
}

/// Get localized text by key. If key missing everywhere, returns key itself.
pub fn tr(key: &str) -> String {
    if let Some(i) = I18N.get().and_then(|l| l.read().ok()) {
        if let Some(v) = i.map.get(key).or_else(|| i.fallback_map.get(key)) {
            return v.clone();
        }
    }

    // 未初始化（测试、库调用方）时退回内置英文
    BUILTIN
        .get(FALLBACK_LANG)
        .and_then(|t| t.get(key))
        .cloned()
        .unwrap_or_else(|| key.to_string())
}

/// Get localized text and substitute `{name}` placeholders.
/// Any placeholder not provided is kept as-is.
pub fn tr_with(key: &str, args: &[(&str, String)]) -> String {
    let mut s = tr(key);
    for (k, v) in args {
        let placeholder = format!("{{{}}}", k);
        s = s.replace(&placeholder, v);
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_covers_every_supported_lang() {
        for (code, _) in SUPPORTED_LANGS {
            let table = BUILTIN.get(code).expect("missing builtin language");
            assert!(table.contains_key("overlay.caption"), "{code} lacks caption");
            assert!(table.contains_key("error.load_failed"), "{code} lacks load error");
        }
    }

    #[test]
    fn unknown_key_returns_key() {
        assert_eq!(tr("no.such.key"), "no.such.key");
    }

    #[test]
    fn placeholders_are_substituted_and_unknown_ones_kept() {
        let s = tr_with("log.panorama_loaded", &[("w", "4096".into()), ("h", "2048".into())]);
        assert!(s.contains("4096x2048"), "{s}");

        let kept = tr_with("log.panorama_loaded", &[("w", "1".into())]);
        assert!(kept.contains("{h}"), "{kept}");
    }

    #[test]
    fn rtl_detection() {
        assert!(is_rtl("ar"));
        assert!(is_rtl("ar-MA"));
        assert!(!is_rtl("fr"));
    }
}
