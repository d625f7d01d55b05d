// fonts.rs — 为非拉丁语言（阿拉伯语）寻找系统字体并注册给 egui
//
// egui 自带字体只覆盖拉丁/西里尔等；阿拉伯语需要运行时从系统字体目录或
// ./assets/fonts 里找一个。ab_glyph 解析失败的文件（部分 .ttc）直接跳过。

use std::path::PathBuf;

/// Languages whose script the egui default fonts do not cover.
pub fn needs_extended_font(lang: &str) -> bool {
    crate::i18n::is_rtl(lang)
}

pub fn font_candidates() -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();

    if cfg!(windows) {
        let win_fonts = PathBuf::from(r"C:\Windows\Fonts");
        for f in ["segoeui.ttf", "tahoma.ttf", "arial.ttf", "arialuni.ttf"] {
            candidates.push(win_fonts.join(f));
        }
    } else if cfg!(target_os = "macos") {
        for p in [
            "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
            "/System/Library/Fonts/Supplemental/Arial.ttf",
            "/Library/Fonts/NotoSansArabic-Regular.ttf",
        ] {
            candidates.push(PathBuf::from(p));
        }
    } else if cfg!(unix) {
        for p in [
            "/usr/share/fonts/truetype/noto/NotoSansArabic-Regular.ttf",
            "/usr/share/fonts/truetype/noto/NotoNaskhArabic-Regular.ttf",
            "/usr/share/fonts/opentype/noto/NotoSansArabic-Regular.otf",
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        ] {
            candidates.push(PathBuf::from(p));
        }
        if let Ok(home) = std::env::var("HOME") {
            let home = PathBuf::from(home);
            candidates.push(home.join(".local/share/fonts/NotoSansArabic-Regular.ttf"));
            candidates.push(home.join(".fonts/NotoSansArabic-Regular.ttf"));
        }
    }

    let asset_files = ["NotoSansArabic-Regular.ttf", "NotoNaskhArabic-Regular.ttf"];
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            for f in asset_files {
                candidates.push(dir.join("assets").join("fonts").join(f));
            }
        }
    }
    for f in asset_files {
        candidates.push(PathBuf::from("assets").join("fonts").join(f));
    }

    candidates
}

fn load_font(path: &std::path::Path) -> Option<Vec<u8>> {
    let bytes = std::fs::read(path).ok()?;
    ab_glyph::FontRef::try_from_slice(&bytes).ok()?;
    Some(bytes)
}

/// Registers a fallback font for `lang` if one is needed and can be found.
/// Returns whether a font was installed.
pub fn setup_fonts(ctx: &egui::Context, lang: &str) -> bool {
    if !needs_extended_font(lang) {
        return false;
    }

    let Some((font_path, font_bytes)) = font_candidates()
        .into_iter()
        .find_map(|p| load_font(&p).map(|bytes| (p, bytes)))
    else {
        log::warn!("{}", crate::i18n::tr("font.not_found"));
        return false;
    };

    log::info!(
        "{}",
        crate::i18n::tr_with("font.using", &[("path", font_path.display().to_string())])
    );

    let mut fonts = egui::FontDefinitions::default();
    fonts
        .font_data
        .insert("script".to_owned(), egui::FontData::from_owned(font_bytes));
    // 作为后备字体追加，拉丁字符仍走 egui 默认字体
    for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
        if let Some(list) = fonts.families.get_mut(&family) {
            list.push("script".to_owned());
        }
    }
    ctx.set_fonts(fonts);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin_languages_skip_font_search() {
        let ctx = egui::Context::default();
        assert!(!setup_fonts(&ctx, "en"));
        assert!(!setup_fonts(&ctx, "fr"));
    }

    #[test]
    fn candidates_include_bundled_assets() {
        let c = font_candidates();
        assert!(c.iter().any(|p| p.ends_with("assets/fonts/NotoSansArabic-Regular.ttf")));
    }

    #[test]
    fn non_font_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.ttf");
        std::fs::write(&path, b"definitely not a font").unwrap();
        assert!(load_font(&path).is_none());
    }
}
