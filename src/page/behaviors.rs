//! Host page behaviors that have a static-document effect.
//!
//! Each one corresponds to an independent listener on the live page. At
//! render time there is no viewport and no user, so only the part of each
//! behavior that changes markup is applied.

use chrono::{DateTime, Datelike, FixedOffset};

use crate::dom::{Document, NodeId};
use crate::error::BehaviorError;

use super::PageContext;

pub trait Behavior {
    fn name(&self) -> &str;

    fn install(&self, document: &mut Document, ctx: &PageContext<'_>) -> Result<(), BehaviorError>;
}

// ================================
// Clock
// ================================

const WEEKDAYS_ID: [&str; 7] = [
    "Senin", "Selasa", "Rabu", "Kamis", "Jumat", "Sabtu", "Minggu",
];

const MONTHS_ID: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

/// Fills `#clock` and `#date` with the current time in the page's zone.
#[derive(Debug, Default)]
pub struct Clock;

impl Clock {
    pub fn local_time(
        millis: i64,
        utc_offset_hours: i32,
    ) -> Result<DateTime<FixedOffset>, BehaviorError> {
        let offset = utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                BehaviorError::TimeError(format!("invalid UTC offset: {} hours", utc_offset_hours))
            })?;
        let utc = DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| BehaviorError::TimeError(format!("timestamp out of range: {}", millis)))?;
        Ok(utc.with_timezone(&offset))
    }

    /// `HH.MM.SS`, 24-hour.
    pub fn format_time(time: &DateTime<FixedOffset>) -> String {
        time.format("%H.%M.%S").to_string()
    }

    /// `Senin, 19 Oktober 2026`.
    pub fn format_date(time: &DateTime<FixedOffset>) -> String {
        format!(
            "{}, {} {} {}",
            WEEKDAYS_ID[time.weekday().num_days_from_monday() as usize],
            time.day(),
            MONTHS_ID[time.month0() as usize],
            time.year()
        )
    }
}

impl Behavior for Clock {
    fn name(&self) -> &str {
        "clock"
    }

    fn install(&self, document: &mut Document, ctx: &PageContext<'_>) -> Result<(), BehaviorError> {
        let clock = document.get_element_by_id("clock");
        let date = document.get_element_by_id("date");
        if clock.is_none() && date.is_none() {
            return Ok(());
        }

        let now = Self::local_time(ctx.time.now_millis(), ctx.config.utc_offset_hours)?;
        if let Some(clock) = clock {
            document.set_text_content(clock, &Self::format_time(&now));
        }
        if let Some(date) = date {
            document.set_text_content(date, &Self::format_date(&now));
        }
        Ok(())
    }
}

// ================================
// Theme
// ================================

pub const THEME_KEY: &str = "theme";
const THEME_TOGGLE_ID: &str = "darkModeToggle";

/// Applies the persisted theme to the root element when the page has a toggle.
#[derive(Debug, Default)]
pub struct ThemePreference;

impl Behavior for ThemePreference {
    fn name(&self) -> &str {
        "theme"
    }

    fn install(&self, document: &mut Document, ctx: &PageContext<'_>) -> Result<(), BehaviorError> {
        if document.get_element_by_id(THEME_TOGGLE_ID).is_none() {
            return Ok(());
        }
        let root = document
            .document_element()
            .ok_or_else(|| BehaviorError::MissingElement("html".to_string()))?;
        let saved = ctx
            .storage
            .get::<String>(THEME_KEY)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "light".to_string());
        document.set_attr(root, "data-theme", &saved);
        Ok(())
    }
}

/// Flip `data-theme` between light and dark and persist the choice.
pub fn toggle_theme(
    document: &mut Document,
    storage: &crate::storage::Storage,
) -> Result<String, BehaviorError> {
    let root = document
        .document_element()
        .ok_or_else(|| BehaviorError::MissingElement("html".to_string()))?;
    let next = match document.attr(root, "data-theme") {
        Some("dark") => "light",
        _ => "dark",
    };
    document.set_attr(root, "data-theme", next);
    storage.set(THEME_KEY, next);
    Ok(next.to_string())
}

// ================================
// Lazy images / reveal animations
// ================================

/// Without a viewport every deferred image is due: `data-src` becomes `src`.
#[derive(Debug, Default)]
pub struct LazyImages;

impl Behavior for LazyImages {
    fn name(&self) -> &str {
        "lazy-images"
    }

    fn install(&self, document: &mut Document, _ctx: &PageContext<'_>) -> Result<(), BehaviorError> {
        let images: Vec<NodeId> = document
            .select_by_attribute("data-src")
            .into_iter()
            .filter(|id| document.is_element_named(*id, "img"))
            .collect();
        for image in images {
            if let Some(src) = document.remove_attr(image, "data-src") {
                document.set_attr(image, "src", &src);
            }
        }
        Ok(())
    }
}

/// Without a viewport every `[data-animate]` element counts as revealed.
#[derive(Debug, Default)]
pub struct RevealAnimations;

impl Behavior for RevealAnimations {
    fn name(&self) -> &str {
        "reveal-animations"
    }

    fn install(&self, document: &mut Document, _ctx: &PageContext<'_>) -> Result<(), BehaviorError> {
        for element in document.select_by_attribute("data-animate") {
            document.add_class(element, "animate-in");
        }
        Ok(())
    }
}

// ================================
// Form validation
// ================================

/// Check required fields of `form`, flagging empty ones with class `error`.
pub fn validate_form(document: &mut Document, form: NodeId) -> bool {
    let fields: Vec<NodeId> = document
        .descendants(form)
        .into_iter()
        .filter(|id| {
            (document.is_element_named(*id, "input") || document.is_element_named(*id, "textarea"))
                && document.has_attr(*id, "required")
        })
        .collect();

    let mut valid = true;
    for field in fields {
        let value = if document.is_element_named(field, "textarea") {
            document.text_content(field)
        } else {
            document.attr(field, "value").unwrap_or_default().to_string()
        };
        if value.trim().is_empty() {
            valid = false;
            document.add_class(field, "error");
        } else {
            document.remove_class(field, "error");
        }
    }

    if valid {
        tracing::info!("Form valid, submitting...");
    } else {
        tracing::info!("Form has errors");
    }
    valid
}

/// Validate every `form[data-validate]`, in document order.
pub fn validate_forms(document: &mut Document) -> Vec<(NodeId, bool)> {
    let forms: Vec<NodeId> = document
        .select_by_attribute("data-validate")
        .into_iter()
        .filter(|id| document.is_element_named(*id, "form"))
        .collect();
    forms
        .into_iter()
        .map(|form| (form, validate_form(document, form)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PageConfig;
    use crate::page::time::FakeTimeProvider;
    use crate::storage::Storage;

    // 2026-10-19T07:05:09Z
    const MONDAY_MORNING_UTC: i64 = 1_792_393_509_000;
    // 2026-10-19T20:00:00Z, already Tuesday in WIB
    const MONDAY_EVENING_UTC: i64 = 1_792_440_000_000;

    fn install(behavior: &dyn Behavior, doc: &mut Document, storage: &Storage, millis: i64) {
        let time = FakeTimeProvider::new(millis);
        let config = PageConfig::default();
        let ctx = PageContext {
            storage,
            time: &time,
            config: &config,
        };
        behavior.install(doc, &ctx).unwrap();
    }

    #[test]
    fn test_clock_formats_wib() {
        let mut doc = Document::parse(r#"<span id="clock"></span><span id="date"></span>"#);
        install(&Clock, &mut doc, &Storage::in_memory(), MONDAY_MORNING_UTC);
        let clock = doc.get_element_by_id("clock").unwrap();
        let date = doc.get_element_by_id("date").unwrap();
        assert_eq!(doc.text_content(clock), "14.05.09");
        assert_eq!(doc.text_content(date), "Senin, 19 Oktober 2026");
    }

    #[test]
    fn test_clock_date_rolls_over_in_local_zone() {
        let mut doc = Document::parse(r#"<span id="date"></span>"#);
        install(&Clock, &mut doc, &Storage::in_memory(), MONDAY_EVENING_UTC);
        let date = doc.get_element_by_id("date").unwrap();
        assert_eq!(doc.text_content(date), "Selasa, 20 Oktober 2026");
    }

    #[test]
    fn test_clock_rejects_bad_offset() {
        assert!(matches!(
            Clock::local_time(0, 99),
            Err(BehaviorError::TimeError(_))
        ));
        assert!(matches!(
            Clock::local_time(0, i32::MAX),
            Err(BehaviorError::TimeError(_))
        ));
        assert!(matches!(
            Clock::local_time(0, i32::MIN),
            Err(BehaviorError::TimeError(_))
        ));
    }

    #[test]
    fn test_theme_applied_only_with_toggle() {
        let storage = Storage::in_memory();
        storage.set(THEME_KEY, "dark");

        let mut without = Document::parse("<p>no toggle</p>");
        install(&ThemePreference, &mut without, &storage, 0);
        let root = without.document_element().unwrap();
        assert_eq!(without.attr(root, "data-theme"), None);

        let mut with = Document::parse(r#"<button id="darkModeToggle"></button>"#);
        install(&ThemePreference, &mut with, &storage, 0);
        let root = with.document_element().unwrap();
        assert_eq!(with.attr(root, "data-theme"), Some("dark"));
    }

    #[test]
    fn test_theme_defaults_to_light_and_toggles() {
        let storage = Storage::in_memory();
        let mut doc = Document::parse(r#"<button id="darkModeToggle"></button>"#);
        install(&ThemePreference, &mut doc, &storage, 0);
        let root = doc.document_element().unwrap();
        assert_eq!(doc.attr(root, "data-theme"), Some("light"));

        assert_eq!(toggle_theme(&mut doc, &storage).unwrap(), "dark");
        assert_eq!(storage.get::<String>(THEME_KEY).as_deref(), Some("dark"));
        assert_eq!(toggle_theme(&mut doc, &storage).unwrap(), "light");
        assert_eq!(doc.attr(root, "data-theme"), Some("light"));
    }

    #[test]
    fn test_lazy_images() {
        let mut doc = Document::parse(
            r#"<img id="a" data-src="/img/a.png"><div id="d" data-src="/not-an-image"></div>"#,
        );
        install(&LazyImages, &mut doc, &Storage::in_memory(), 0);
        let a = doc.get_element_by_id("a").unwrap();
        let d = doc.get_element_by_id("d").unwrap();
        assert_eq!(doc.attr(a, "src"), Some("/img/a.png"));
        assert!(!doc.has_attr(a, "data-src"));
        assert!(doc.has_attr(d, "data-src"));
    }

    #[test]
    fn test_reveal_animations() {
        let mut doc = Document::parse(r#"<section id="s" class="card" data-animate></section>"#);
        install(&RevealAnimations, &mut doc, &Storage::in_memory(), 0);
        let s = doc.get_element_by_id("s").unwrap();
        assert_eq!(doc.attr(s, "class"), Some("card animate-in"));
    }

    #[test]
    fn test_validate_forms() {
        let mut doc = Document::parse(
            r#"<form id="f" data-validate>
                <input id="name" required value="  ">
                <input id="mail" required class="error" value="a@b.c">
                <textarea id="msg" required>hello</textarea>
                <input id="opt">
            </form>
            <form id="plain"><input required></form>"#,
        );
        let results = validate_forms(&mut doc);
        assert_eq!(results.len(), 1);
        assert!(!results[0].1);

        let name = doc.get_element_by_id("name").unwrap();
        let mail = doc.get_element_by_id("mail").unwrap();
        let msg = doc.get_element_by_id("msg").unwrap();
        assert!(doc.has_class(name, "error"));
        assert!(!doc.has_class(mail, "error"));
        assert!(!doc.has_class(msg, "error"));

        doc.set_attr(name, "value", "Ada");
        let form = doc.get_element_by_id("f").unwrap();
        assert!(validate_form(&mut doc, form));
        assert!(!doc.has_class(name, "error"));
    }
}
