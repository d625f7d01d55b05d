// overlay.rs — 覆盖层：加载提示、错误信息、操作说明

use crate::viewer::LoadStatus;

/// Snapshot of what the overlays should say this frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlay {
    pub status_text: Option<StatusText>,
    pub caption: String,
    pub rtl: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusText {
    Loading(String),
    Error(String),
}

impl Overlay {
    pub fn from_status(status: &LoadStatus) -> Self {
        let status_text = match (&status.error, status.loading) {
            (Some(err), _) => Some(StatusText::Error(err.clone())),
            (None, true) => Some(StatusText::Loading(crate::i18n::tr("overlay.loading"))),
            (None, false) => None,
        };

        Self {
            status_text,
            caption: crate::i18n::tr("overlay.caption"),
            rtl: crate::i18n::is_rtl(&crate::i18n::current_lang()),
        }
    }

    pub fn draw(&self, ctx: &egui::Context) {
        if let Some(status) = &self.status_text {
            let (text, color) = match status {
                StatusText::Loading(t) => (t, egui::Color32::from_white_alpha(153)),
                StatusText::Error(t) => (t, egui::Color32::from_rgb(252, 165, 165)),
            };

            egui::Area::new("tour_status")
                .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
                .interactable(false)
                .show(ctx, |ui| {
                    ui.label(egui::RichText::new(text.as_str()).color(color).size(14.0));
                });
        }

        // RTL 语言放到右下角
        let (align, offset) = if self.rtl {
            (egui::Align2::RIGHT_BOTTOM, egui::vec2(-12.0, -12.0))
        } else {
            (egui::Align2::LEFT_BOTTOM, egui::vec2(12.0, -12.0))
        };

        egui::Area::new("tour_caption")
            .anchor(align, offset)
            .interactable(false)
            .show(ctx, |ui| {
                egui::Frame::none()
                    .fill(egui::Color32::from_black_alpha(153))
                    .stroke(egui::Stroke::new(1.0, egui::Color32::from_white_alpha(51)))
                    .rounding(2.0)
                    .inner_margin(egui::Margin::symmetric(12.0, 8.0))
                    .show(ui, |ui| {
                        ui.label(
                            egui::RichText::new(&self.caption)
                                .color(egui::Color32::from_white_alpha(204))
                                .size(12.0),
                        );
                    });
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loading_without_error_shows_loading_text() {
        let o = Overlay::from_status(&LoadStatus {
            loading: true,
            error: None,
        });
        assert!(matches!(o.status_text, Some(StatusText::Loading(_))));
        assert!(!o.caption.is_empty());
    }

    #[test]
    fn error_wins_over_loading() {
        let o = Overlay::from_status(&LoadStatus {
            loading: true,
            error: Some("boom".into()),
        });
        assert_eq!(o.status_text, Some(StatusText::Error("boom".into())));
    }

    #[test]
    fn loaded_scene_only_shows_caption() {
        let o = Overlay::from_status(&LoadStatus {
            loading: false,
            error: None,
        });
        assert_eq!(o.status_text, None);
    }
}
