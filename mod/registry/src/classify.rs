//! Required/extra certification classification.
//!
//! Given a student's certifications and the configured required-code
//! list, pick one representative certification per required code (the
//! most recently issued), collect everything else as "extras", and
//! report overall completion. Pure logic over owned data — the service
//! layer supplies the certifications and the required-course lookup.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::RegistryConfig;
use crate::model::{Certification, Course};

/// One card on the detail view: a required code and whatever the
/// student holds for it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredRow {
    /// The required course code.
    pub code: String,

    /// Display name: the course name when the course exists, else the
    /// raw code.
    pub name: String,

    /// The matched certification, most recent first by issue date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert: Option<Certification>,

    /// Course artwork, shown when the certification has no badge.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_image: Option<String>,

    /// Configured static fallback badge URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_badge: Option<String>,
}

/// Classifier output for one student.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    /// One row per required code, preserving the configured order.
    pub required: Vec<RequiredRow>,

    /// Certifications matching no required code after alias
    /// normalization (including records with no code at all).
    pub extras: Vec<Certification>,

    /// True iff every required code has a matching certification.
    pub complete: bool,
}

/// Sort key for "most recent": a missing issue date is treated as the
/// earliest possible value, so dated certifications always win.
fn issued_key(cert: &Certification) -> NaiveDate {
    cert.issued_at.unwrap_or(NaiveDate::MIN)
}

/// Partition a student's certifications against the required-code list.
///
/// `courses` maps required codes to their course records for display
/// names and image fallbacks; missing entries fall back to the raw code.
pub fn classify(
    certs: &[Certification],
    courses: &HashMap<String, Course>,
    config: &RegistryConfig,
) -> Classification {
    // Best match per canonical required code, latest issue date wins.
    let mut by_code: HashMap<String, Certification> = HashMap::new();
    let mut extras = Vec::new();

    for cert in certs {
        let canonical = cert
            .effective_code()
            .map(|code| config.canonical_code(&code).to_string());

        match canonical {
            Some(code) if config.is_required(&code) => {
                let newer = by_code
                    .get(&code)
                    .is_none_or(|cur| issued_key(cert) > issued_key(cur));
                if newer {
                    by_code.insert(code, cert.clone());
                }
            }
            _ => extras.push(cert.clone()),
        }
    }

    let complete = config
        .required_certs
        .iter()
        .all(|code| by_code.contains_key(code));

    let required = config
        .required_certs
        .iter()
        .map(|code| {
            let course = courses.get(code);
            RequiredRow {
                code: code.clone(),
                name: course
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| code.clone()),
                cert: by_code.remove(code),
                course_image: course.and_then(|c| c.image_url.clone()),
                fallback_badge: config.badge_fallbacks.get(code).cloned(),
            }
        })
        .collect();

    Classification {
        required,
        extras,
        complete,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RegistryConfig {
        RegistryConfig::with_required(["IC", "CBHC"])
    }

    fn cert(id: &str, course_code: Option<&str>, cert_type: &str, issued: Option<(i32, u32, u32)>) -> Certification {
        Certification {
            id: id.into(),
            student_id: "s1".into(),
            course_code: course_code.map(String::from),
            cert_type: cert_type.into(),
            credly_url: None,
            issued_at: issued.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            badge_image_path: None,
            badge_image_url: None,
            created_at: None,
        }
    }

    fn course(code: &str, name: &str) -> Course {
        Course {
            code: code.into(),
            name: name.into(),
            slug: crate::slug::slugify(&format!("{name}-{code}")),
            description: None,
            image_url: None,
            active: true,
            created_at: None,
            updated_at: None,
        }
    }

    fn courses(list: &[(&str, &str)]) -> HashMap<String, Course> {
        list.iter()
            .map(|(code, name)| (code.to_string(), course(code, name)))
            .collect()
    }

    #[test]
    fn complete_when_every_required_code_matched() {
        let certs = vec![
            cert("a", Some("IC"), "", None),
            cert("b", None, "CBHC", None),
        ];
        let out = classify(&certs, &HashMap::new(), &config());
        assert!(out.complete);
        assert!(out.extras.is_empty());
    }

    #[test]
    fn incomplete_when_one_required_code_missing() {
        let certs = vec![cert("a", Some("IC"), "", None)];
        let out = classify(&certs, &HashMap::new(), &config());
        assert!(!out.complete);
        assert!(out.required[0].cert.is_some());
        assert!(out.required[1].cert.is_none());
    }

    #[test]
    fn latest_issue_date_wins_per_code() {
        let certs = vec![
            cert("old", Some("IC"), "", Some((2023, 1, 1))),
            cert("new", Some("IC"), "", Some((2025, 6, 30))),
        ];
        let out = classify(&certs, &HashMap::new(), &config());
        assert_eq!(out.required[0].cert.as_ref().unwrap().id, "new");
    }

    #[test]
    fn undated_loses_to_any_dated() {
        let certs = vec![
            cert("dated", Some("IC"), "", Some((2020, 1, 1))),
            cert("undated", Some("IC"), "", None),
        ];
        let out = classify(&certs, &HashMap::new(), &config());
        assert_eq!(out.required[0].cert.as_ref().unwrap().id, "dated");

        // Order of arrival doesn't matter.
        let reversed = vec![
            cert("undated", Some("IC"), "", None),
            cert("dated", Some("IC"), "", Some((2020, 1, 1))),
        ];
        let out = classify(&reversed, &HashMap::new(), &config());
        assert_eq!(out.required[0].cert.as_ref().unwrap().id, "dated");
    }

    #[test]
    fn non_required_lands_in_extras() {
        let certs = vec![
            cert("a", Some("IC"), "", None),
            cert("x", None, "Python Essentials", None),
        ];
        let out = classify(&certs, &HashMap::new(), &config());
        assert_eq!(out.extras.len(), 1);
        assert_eq!(out.extras[0].id, "x");
        assert!(out.required.iter().all(|row| {
            row.cert.as_ref().map(|c| c.id.as_str()) != Some("x")
        }));
    }

    #[test]
    fn codeless_certification_is_always_extra() {
        let certs = vec![cert("blank", None, "", None)];
        let out = classify(&certs, &HashMap::new(), &config());
        assert_eq!(out.extras.len(), 1);
        assert!(!out.complete);
    }

    #[test]
    fn alias_normalization_matches_required() {
        let mut config = config();
        config
            .cert_aliases
            .insert("Intro to Cybersecurity".into(), "IC".into());

        let certs = vec![
            cert("a", None, "Intro to Cybersecurity", None),
            cert("b", Some("CBHC"), "", None),
        ];
        let out = classify(&certs, &HashMap::new(), &config);
        assert!(out.complete);
        assert_eq!(out.required[0].cert.as_ref().unwrap().id, "a");
    }

    #[test]
    fn rows_preserve_configured_order_and_fall_back_to_code() {
        let courses = courses(&[("CBHC", "Cybersecurity Basics")]);
        let out = classify(&[], &courses, &config());
        assert_eq!(out.required.len(), 2);
        assert_eq!(out.required[0].code, "IC");
        assert_eq!(out.required[0].name, "IC"); // no course record
        assert_eq!(out.required[1].code, "CBHC");
        assert_eq!(out.required[1].name, "Cybersecurity Basics");
        assert!(!out.complete);
    }

    #[test]
    fn fallback_badge_comes_from_config() {
        let mut config = config();
        config
            .badge_fallbacks
            .insert("IC".into(), "https://img.example.com/ic.png".into());
        let out = classify(&[], &HashMap::new(), &config);
        assert_eq!(
            out.required[0].fallback_badge.as_deref(),
            Some("https://img.example.com/ic.png")
        );
        assert!(out.required[1].fallback_badge.is_none());
    }
}
